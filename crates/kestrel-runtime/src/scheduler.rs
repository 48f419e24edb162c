// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Deferred work drained once per tick.
//!
//! Tasks travel through a bounded channel. A drain first counts what is
//! queued and takes exactly that many tasks, so anything a task appends while
//! the batch runs stays in the channel for the next drain.

/// A one-shot unit of work that receives the scheduler's owner.
pub trait DeferredTask<O: ?Sized>: Send {
    /// Runs the task, consuming it.
    fn run(self: Box<Self>, owner: &mut O);
}

impl<O: ?Sized, F> DeferredTask<O> for F
where
    F: FnOnce(&mut O) + Send,
{
    fn run(self: Box<Self>, owner: &mut O) {
        (*self)(owner)
    }
}

type BoxedTask<O> = Box<dyn DeferredTask<O>>;

/// Default number of tasks that may wait for a drain.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Why a task was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The queue already holds its capacity.
    #[error("frame scheduler is full ({capacity} tasks pending)")]
    Full {
        /// Queue capacity.
        capacity: usize,
    },
}

/// A FIFO queue of [`DeferredTask`]s.
pub struct FrameScheduler<O: ?Sized + 'static> {
    sender: flume::Sender<BoxedTask<O>>,
    receiver: flume::Receiver<BoxedTask<O>>,
    capacity: usize,
}

impl<O: ?Sized + 'static> FrameScheduler<O> {
    /// Creates a scheduler holding at most `capacity` pending tasks.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Queues `task` for the next drain.
    pub fn append<T>(&self, task: T) -> Result<(), SchedulerError>
    where
        T: DeferredTask<O> + 'static,
    {
        self.sender
            .try_send(Box::new(task))
            .map_err(|_| SchedulerError::Full {
                capacity: self.capacity,
            })
    }

    /// Number of tasks waiting.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Takes every task queued right now.
    pub fn take_batch(&self) -> Batch<O> {
        let count = self.receiver.len();
        let tasks = self.receiver.try_iter().take(count).collect();
        Batch { tasks }
    }

    /// Drains one batch against `owner`. Returns how many tasks ran.
    pub fn run(&self, owner: &mut O) -> usize {
        self.take_batch().run(owner)
    }
}

impl<O: ?Sized + 'static> Default for FrameScheduler<O> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<O: ?Sized + 'static> std::fmt::Debug for FrameScheduler<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Tasks detached from the queue, ready to run.
///
/// Detaching first lets the owner of the scheduler run the batch against
/// itself.
#[must_use = "a batch does nothing until it is run"]
pub struct Batch<O: ?Sized + 'static> {
    tasks: Vec<BoxedTask<O>>,
}

impl<O: ?Sized + 'static> Batch<O> {
    /// Number of tasks in the batch.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// `true` when the batch holds no task.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs every task in queue order.
    pub fn run(self, owner: &mut O) -> usize {
        let count = self.tasks.len();
        for task in self.tasks {
            task.run(owner);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// An owner that holds its own scheduler, like the runtime does.
    struct Host {
        scheduler: Arc<FrameScheduler<Host>>,
        log: Vec<&'static str>,
    }

    impl Host {
        fn new() -> Self {
            Self {
                scheduler: Arc::new(FrameScheduler::default()),
                log: Vec::new(),
            }
        }

        fn drain(&mut self) -> usize {
            let batch = self.scheduler.take_batch();
            batch.run(self)
        }
    }

    #[test]
    fn runs_in_fifo_order() {
        let mut host = Host::new();
        host.scheduler.append(|h: &mut Host| h.log.push("first")).unwrap();
        host.scheduler.append(|h: &mut Host| h.log.push("second")).unwrap();
        host.scheduler.append(|h: &mut Host| h.log.push("third")).unwrap();

        assert_eq!(host.drain(), 3);
        assert_eq!(host.log, vec!["first", "second", "third"]);
        assert_eq!(host.scheduler.pending(), 0);
    }

    #[test]
    fn tasks_appended_during_a_drain_wait_for_the_next_one() {
        let mut host = Host::new();
        host.scheduler
            .append(|h: &mut Host| {
                h.log.push("outer");
                let scheduler = Arc::clone(&h.scheduler);
                scheduler
                    .append(|h: &mut Host| h.log.push("inner"))
                    .unwrap();
            })
            .unwrap();

        assert_eq!(host.drain(), 1);
        assert_eq!(host.log, vec!["outer"]);
        assert_eq!(host.scheduler.pending(), 1);

        assert_eq!(host.drain(), 1);
        assert_eq!(host.log, vec!["outer", "inner"]);
    }

    #[test]
    fn self_rescheduling_task_terminates_each_drain() {
        fn again(h: &mut Host) {
            h.log.push("tick");
            let scheduler = Arc::clone(&h.scheduler);
            scheduler.append(again).unwrap();
        }

        let mut host = Host::new();
        host.scheduler.append(again).unwrap();
        for _ in 0..5 {
            assert_eq!(host.drain(), 1);
        }
        assert_eq!(host.log.len(), 5);
    }

    #[test]
    fn empty_drain_runs_nothing() {
        let mut host = Host::new();
        let batch = host.scheduler.take_batch();
        assert!(batch.is_empty());
        assert_eq!(batch.run(&mut host), 0);
    }

    #[test]
    fn full_queue_rejects_tasks() {
        let scheduler: FrameScheduler<Vec<u8>> = FrameScheduler::with_capacity(2);
        scheduler.append(|v: &mut Vec<u8>| v.push(1)).unwrap();
        scheduler.append(|v: &mut Vec<u8>| v.push(2)).unwrap();

        assert_eq!(
            scheduler.append(|v: &mut Vec<u8>| v.push(3)),
            Err(SchedulerError::Full { capacity: 2 })
        );

        let mut out = Vec::new();
        assert_eq!(scheduler.run(&mut out), 2);
        assert_eq!(out, vec![1, 2]);
    }
}
