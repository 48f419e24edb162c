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

//! The audio player contract.
//!
//! Mixing and decoding are the player's business; the runtime only tells it
//! when to configure itself, when to go quiet and when to come back.

/// Tuning read from the application configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioSettings {
    /// Requested output sample rate in Hz.
    pub play_frequency: Option<u32>,
    /// Upper bound on simultaneously playing sources.
    pub max_sources: Option<u32>,
}

/// An audio output the runtime suspends and resumes with the application.
pub trait AudioPlayer {
    /// Applies configuration. Called before [`attach`](Self::attach).
    fn configure(&mut self, settings: &AudioSettings);

    /// Binds the player to the running application.
    fn attach(&mut self);

    /// Pauses output while the application is in the background.
    fn suspend(&mut self);

    /// Restarts output after [`suspend`](Self::suspend).
    fn resume(&mut self);

    /// `true` between `suspend` and `resume`.
    fn is_suspended(&self) -> bool;

    /// `true` when output was cut by the system (a call, another app).
    fn is_in_interruption(&self) -> bool;

    /// Recovers from a system interruption.
    fn end_interruption(&mut self);

    /// Last call before the player is released.
    fn runtime_will_terminate(&mut self);
}
