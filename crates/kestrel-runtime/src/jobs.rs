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

//! Single-slot background job delegation.
//!
//! Authoring builds can hand one piece of script work (plugin collection, in
//! practice) to a worker thread running an isolated VM. The slot is an
//! `Option<PendingJob>`: starting a new job takes and finalizes whatever is
//! in it first, so two jobs are never in flight at once.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError};
use kestrel_core::script::{IsolatedJob, ScriptListener};

/// A finished job whose result still has to reach its listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedJob {
    /// Who asked for the result.
    pub listener: ScriptListener,
    /// The job's output. Empty output is reported as `None`.
    pub result: Option<String>,
}

/// What [`BackgroundJobChannel::start`] did with the new job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// No listener was given, so the job ran to completion before returning.
    Completed(Option<String>),
    /// The job is running; its result will be finalized on a later tick.
    Pending,
}

struct PendingJob {
    worker: Option<thread::JoinHandle<()>>,
    result: Receiver<Option<String>>,
    listener: ScriptListener,
}

/// Runs at most one [`IsolatedJob`] at a time on a worker thread.
pub struct BackgroundJobChannel {
    runner: Arc<dyn IsolatedJob>,
    slot: Option<PendingJob>,
}

impl BackgroundJobChannel {
    /// Creates an idle channel that will run jobs with `runner`.
    pub fn new(runner: Arc<dyn IsolatedJob>) -> Self {
        Self { runner, slot: None }
    }

    /// `true` while a job is outstanding.
    pub fn is_busy(&self) -> bool {
        self.slot.is_some()
    }

    /// Starts a job with `argument`.
    ///
    /// Any outstanding job is finalized first, blocking until it is done, and
    /// handed to `deliver` before the new worker is spawned.
    pub fn start<D>(&mut self, argument: &str, listener: Option<ScriptListener>, deliver: D) -> JobResult
    where
        D: FnOnce(FinishedJob),
    {
        if let Some(previous) = self.finalize() {
            deliver(previous);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let runner = Arc::clone(&self.runner);
        let owned_argument = argument.to_owned();
        let spawned = thread::Builder::new()
            .name("kestrel-job".into())
            .spawn(move || {
                log::debug!("Background job thread started.");
                let result = runner.run(&owned_argument);
                // Disconnected only when the channel was dropped mid-job.
                let _ = tx.send(result);
            });

        let worker = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Could not spawn a background job thread ({e}); running inline.");
                let (inline_tx, inline_rx) = crossbeam_channel::bounded(1);
                let _ = inline_tx.send(self.runner.run(argument));
                return self.settle(None, inline_rx, listener);
            }
        };

        self.settle(worker, rx, listener)
    }

    fn settle(
        &mut self,
        worker: Option<thread::JoinHandle<()>>,
        result: Receiver<Option<String>>,
        listener: Option<ScriptListener>,
    ) -> JobResult {
        match listener {
            Some(listener) => {
                self.slot = Some(PendingJob {
                    worker,
                    result,
                    listener,
                });
                JobResult::Pending
            }
            None => JobResult::Completed(Self::join(worker, &result)),
        }
    }

    /// Finalizes the outstanding job if its worker has produced a result.
    pub fn finalize_if_ready(&mut self) -> Option<FinishedJob> {
        let ready = match self.slot.as_ref()?.result.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => None,
        };

        let job = self.slot.take()?;
        let listener = job.listener;
        Self::join_worker(job.worker);
        Some(FinishedJob {
            listener,
            result: non_empty(ready.flatten()),
        })
    }

    /// Blocks until the outstanding job, if any, is done and finalizes it.
    pub fn finalize(&mut self) -> Option<FinishedJob> {
        let job = self.slot.take()?;
        let result = Self::join(job.worker, &job.result);
        Some(FinishedJob {
            listener: job.listener,
            result,
        })
    }

    /// Waits for the outstanding job and throws its result away.
    pub fn discard(&mut self) {
        if let Some(job) = self.slot.take() {
            log::debug!("Discarding background job result for {:?}.", job.listener);
            Self::join(job.worker, &job.result);
        }
    }

    fn join(
        worker: Option<thread::JoinHandle<()>>,
        result: &Receiver<Option<String>>,
    ) -> Option<String> {
        let result = result.recv().ok().flatten();
        Self::join_worker(worker);
        non_empty(result)
    }

    fn join_worker(worker: Option<thread::JoinHandle<()>>) {
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::warn!("Background job thread panicked.");
            }
        }
    }
}

fn non_empty(result: Option<String>) -> Option<String> {
    result.filter(|s| !s.is_empty())
}

impl Drop for BackgroundJobChannel {
    fn drop(&mut self) {
        self.discard();
    }
}

impl std::fmt::Debug for BackgroundJobChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundJobChannel")
            .field("busy", &self.is_busy())
            .finish()
    }
}
