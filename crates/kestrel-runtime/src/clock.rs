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

//! Application time that excludes suspended intervals.

use std::sync::Arc;
use std::time::Duration;

use kestrel_core::time::TimeSource;

/// Elapsed application time.
///
/// `elapsed = (frozen or now) - start - correction`, where `correction` is
/// the total time spent suspended and `frozen` is the instant the current
/// suspension began. The result saturates at zero.
pub struct ElapsedClock {
    source: Arc<dyn TimeSource>,
    start: Duration,
    correction: Duration,
    frozen_at: Option<Duration>,
}

impl ElapsedClock {
    /// Starts a clock at the source's current time.
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        let start = source.now();
        Self {
            source,
            start,
            correction: Duration::ZERO,
            frozen_at: None,
        }
    }

    /// Application time elapsed since the clock started.
    pub fn elapsed(&self) -> Duration {
        let now = self.frozen_at.unwrap_or_else(|| self.source.now());
        now.saturating_sub(self.start)
            .saturating_sub(self.correction)
    }

    /// [`elapsed`](Self::elapsed) in fractional milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_nanos() as f64 / 1_000_000.0
    }

    /// Freezes the clock. A second call before resuming keeps the first instant.
    pub fn on_suspend_begin(&mut self) {
        if self.frozen_at.is_none() {
            self.frozen_at = Some(self.source.now());
        }
    }

    /// Unfreezes the clock and adds the frozen interval to the correction.
    pub fn on_resume_begin(&mut self) {
        if let Some(frozen_at) = self.frozen_at.take() {
            self.correction += self.source.now().saturating_sub(frozen_at);
        }
    }

    /// Total time spent suspended so far.
    pub fn correction(&self) -> Duration {
        self.correction
    }

    /// `true` between `on_suspend_begin` and `on_resume_begin`.
    pub fn is_frozen(&self) -> bool {
        self.frozen_at.is_some()
    }
}

impl std::fmt::Debug for ElapsedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElapsedClock")
            .field("start", &self.start)
            .field("correction", &self.correction)
            .field("frozen_at", &self.frozen_at)
            .finish()
    }
}
