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

//! An audio player that produces no sound but keeps the lifecycle honest.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kestrel_core::audio::{AudioPlayer, AudioSettings};

/// Sample rate used when the configuration does not request one.
pub const DEFAULT_PLAY_FREQUENCY: u32 = 44_100;
/// Source limit used when the configuration does not request one.
pub const DEFAULT_MAX_SOURCES: u32 = 32;

/// Lets the host signal that the system took the audio session away.
#[derive(Debug, Clone, Default)]
pub struct InterruptionHandle(Arc<AtomicBool>);

impl InterruptionHandle {
    /// Marks the session as interrupted.
    pub fn begin(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// `true` until the player recovers.
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A [`AudioPlayer`] that mixes into the void.
#[derive(Debug)]
pub struct SilentAudioPlayer {
    play_frequency: u32,
    max_sources: u32,
    attached: bool,
    suspended: bool,
    interruption: InterruptionHandle,
}

impl SilentAudioPlayer {
    /// Creates an unattached player with default settings.
    pub fn new() -> Self {
        Self {
            play_frequency: DEFAULT_PLAY_FREQUENCY,
            max_sources: DEFAULT_MAX_SOURCES,
            attached: false,
            suspended: false,
            interruption: InterruptionHandle::default(),
        }
    }

    /// Handle the host uses to report interruptions.
    pub fn interruption_handle(&self) -> InterruptionHandle {
        self.interruption.clone()
    }

    /// Output sample rate in Hz.
    pub fn play_frequency(&self) -> u32 {
        self.play_frequency
    }

    /// Maximum simultaneous sources.
    pub fn max_sources(&self) -> u32 {
        self.max_sources
    }

    /// `true` after `attach` until `runtime_will_terminate`.
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl Default for SilentAudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlayer for SilentAudioPlayer {
    fn configure(&mut self, settings: &AudioSettings) {
        if let Some(frequency) = settings.play_frequency.filter(|f| *f > 0) {
            self.play_frequency = frequency;
        }
        if let Some(sources) = settings.max_sources.filter(|s| *s > 0) {
            self.max_sources = sources;
        }
    }

    fn attach(&mut self) {
        log::debug!(
            "Silent audio attached at {} Hz with {} sources",
            self.play_frequency,
            self.max_sources
        );
        self.attached = true;
    }

    fn suspend(&mut self) {
        self.suspended = true;
    }

    fn resume(&mut self) {
        self.suspended = false;
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn is_in_interruption(&self) -> bool {
        self.interruption.is_active()
    }

    fn end_interruption(&mut self) {
        if self.interruption.is_active() {
            log::info!("Audio session recovered from interruption");
            self.interruption.clear();
        }
    }

    fn runtime_will_terminate(&mut self) {
        self.attached = false;
        self.suspended = false;
    }
}
