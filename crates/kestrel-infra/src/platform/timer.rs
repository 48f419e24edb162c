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

//! A [`PlatformTimer`] driven by a [`TimeSource`].

use std::sync::Arc;
use std::time::Duration;

use kestrel_core::platform::PlatformTimer;
use kestrel_core::time::{SystemTimeSource, TimeSource};

/// Fires once per interval while running.
///
/// A poll that arrives more than one interval late fires once and re-arms
/// from the current time; missed intervals are not replayed in a burst.
pub struct IntervalTimer {
    source: Arc<dyn TimeSource>,
    interval: Duration,
    next_fire: Option<Duration>,
}

impl IntervalTimer {
    /// Creates a stopped timer reading the wall clock.
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource::new()))
    }

    /// Creates a stopped timer reading `source`.
    pub fn with_time_source(source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            interval: Duration::ZERO,
            next_fire: None,
        }
    }
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformTimer for IntervalTimer {
    fn start(&mut self) {
        self.next_fire = Some(self.source.now() + self.interval);
    }

    fn stop(&mut self) {
        self.next_fire = None;
    }

    fn set_interval(&mut self, interval_ms: u32) {
        self.interval = Duration::from_millis(u64::from(interval_ms));
        if self.next_fire.is_some() {
            self.start();
        }
    }

    fn interval_ms(&self) -> u32 {
        u32::try_from(self.interval.as_millis()).unwrap_or(u32::MAX)
    }

    fn is_running(&self) -> bool {
        self.next_fire.is_some()
    }

    fn poll(&mut self) -> bool {
        let Some(deadline) = self.next_fire else {
            return false;
        };
        let now = self.source.now();
        if now < deadline {
            return false;
        }
        let next = deadline + self.interval;
        self.next_fire = Some(if next <= now { now + self.interval } else { next });
        true
    }
}

impl std::fmt::Debug for IntervalTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalTimer")
            .field("interval", &self.interval)
            .field("next_fire", &self.next_fire)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::time::ManualTimeSource;

    fn timer() -> (ManualTimeSource, IntervalTimer) {
        let clock = ManualTimeSource::new();
        let timer = IntervalTimer::with_time_source(Arc::new(clock.clone()));
        (clock, timer)
    }

    #[test]
    fn stopped_timer_never_fires() {
        let (clock, mut timer) = timer();
        timer.set_interval(10);
        clock.advance_ms(100);
        assert!(!timer.is_running());
        assert!(!timer.poll());
    }

    #[test]
    fn fires_once_per_interval() {
        let (clock, mut timer) = timer();
        timer.set_interval(33);
        timer.start();
        assert!(timer.is_running());

        clock.advance_ms(20);
        assert!(!timer.poll());
        clock.advance_ms(13);
        assert!(timer.poll());
        assert!(!timer.poll(), "the same interval must not fire twice");
        clock.advance_ms(33);
        assert!(timer.poll());
    }

    #[test]
    fn late_poll_does_not_burst() {
        let (clock, mut timer) = timer();
        timer.set_interval(10);
        timer.start();
        clock.advance_ms(55);
        assert!(timer.poll());
        assert!(!timer.poll());
        clock.advance_ms(10);
        assert!(timer.poll());
    }

    #[test]
    fn stop_and_restart_rearm_from_now() {
        let (clock, mut timer) = timer();
        timer.set_interval(16);
        timer.start();
        timer.stop();
        clock.advance_ms(100);
        assert!(!timer.poll());

        timer.start();
        clock.advance_ms(15);
        assert!(!timer.poll());
        clock.advance_ms(1);
        assert!(timer.poll());
    }

    #[test]
    fn reports_interval_in_milliseconds() {
        let (_, mut timer) = timer();
        timer.set_interval(17);
        assert_eq!(timer.interval_ms(), 17);
    }
}
