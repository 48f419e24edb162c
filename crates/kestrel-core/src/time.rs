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

//! Monotonic time sources.
//!
//! The runtime never reads the wall clock directly. It asks a [`TimeSource`]
//! for "time since some fixed origin", which lets tests drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic clock expressed as an offset from an arbitrary origin.
pub trait TimeSource: Send + Sync {
    /// Time elapsed since the source's origin. Never decreases.
    fn now(&self) -> Duration;
}

/// A [`TimeSource`] backed by [`Instant`], with its origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Creates a source whose origin is the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A [`TimeSource`] that only moves when told to.
///
/// Clones share the same underlying counter, so a test can keep one handle
/// and hand another to the runtime.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    nanos: Arc<AtomicU64>,
}

impl ManualTimeSource {
    /// Creates a source frozen at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Convenience for [`advance`](Self::advance) in whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn system_source_moves_forward() {
        let source = SystemTimeSource::new();
        let first = source.now();
        thread::sleep(Duration::from_millis(5));
        let second = source.now();
        assert!(second >= first + Duration::from_millis(5));
    }

    #[test]
    fn manual_source_only_moves_on_advance() {
        let source = ManualTimeSource::new();
        assert_eq!(source.now(), Duration::ZERO);

        source.advance_ms(250);
        assert_eq!(source.now(), Duration::from_millis(250));
        assert_eq!(source.now(), Duration::from_millis(250));
    }

    #[test]
    fn manual_source_clones_share_state() {
        let source = ManualTimeSource::new();
        let handle: Arc<dyn TimeSource> = Arc::new(source.clone());

        source.advance(Duration::from_micros(1500));
        assert_eq!(handle.now(), Duration::from_micros(1500));
    }
}
