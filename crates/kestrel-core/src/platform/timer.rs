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

/// The trigger that drives frames.
///
/// Timers are polled: the host loop calls [`poll`](PlatformTimer::poll) and
/// ticks the runtime whenever it reports that an interval has elapsed.
pub trait PlatformTimer {
    /// Starts (or restarts) counting from now.
    fn start(&mut self);

    /// Stops firing until the next [`start`](Self::start).
    fn stop(&mut self);

    /// Sets the firing interval in milliseconds.
    fn set_interval(&mut self, interval_ms: u32);

    /// The current firing interval in milliseconds.
    fn interval_ms(&self) -> u32;

    /// `true` between `start` and `stop`.
    fn is_running(&self) -> bool;

    /// Returns `true` once per elapsed interval while running.
    fn poll(&mut self) -> bool;
}
