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

//! A display that renders nowhere.
//!
//! Useful for servers, CI and tools: it honours the full display lifecycle,
//! tracks orientation and content size, and counts the frames it was asked
//! to draw.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kestrel_core::display::{DisplaySettings, DisplaySubsystem};
use kestrel_core::platform::DeviceOrientation;

/// Shared view of how many frames a [`HeadlessDisplay`] rendered.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter(Arc<AtomicU64>);

impl FrameCounter {
    /// Frames rendered so far.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// A [`DisplaySubsystem`] without a surface.
#[derive(Debug)]
pub struct HeadlessDisplay {
    surface: (i32, i32),
    settings: Option<DisplaySettings>,
    orientation: DeviceOrientation,
    started: bool,
    resources_loaded: bool,
    updates: u64,
    rendered: FrameCounter,
}

impl HeadlessDisplay {
    /// Creates a display whose virtual surface is `width` x `height`.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            surface: (width.max(0), height.max(0)),
            settings: None,
            orientation: DeviceOrientation::Upright,
            started: false,
            resources_loaded: false,
            updates: 0,
            rendered: FrameCounter::default(),
        }
    }

    /// A handle that keeps counting after the display is boxed away.
    pub fn frame_counter(&self) -> FrameCounter {
        self.rendered.clone()
    }

    /// Resizes the virtual surface.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.surface = (width.max(0), height.max(0));
        self.window_size_changed();
    }

    /// `true` between `start` and `teardown`.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Frames advanced through `update`.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// The orientation content is currently laid out in.
    pub fn orientation(&self) -> DeviceOrientation {
        self.orientation
    }

    fn authored_size(&self) -> (i32, i32) {
        match &self.settings {
            Some(s) if s.content_width > 0 && s.content_height > 0 => {
                (s.content_width, s.content_height)
            }
            _ => self.surface,
        }
    }

    fn authored_landscape(&self) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|s| s.orientation.is_landscape())
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new(320, 480)
    }
}

impl DisplaySubsystem for HeadlessDisplay {
    fn initialize(&mut self, settings: &DisplaySettings) -> bool {
        if settings.backend.is_empty() {
            log::warn!("Headless display refused an empty backend name");
            return false;
        }
        log::info!(
            "Headless display initialized ({}x{}, backend '{}', aa={})",
            settings.content_width,
            settings.content_height,
            settings.backend,
            settings.antialias
        );
        self.orientation = settings.orientation;
        self.settings = Some(settings.clone());
        self.resources_loaded = true;
        true
    }

    fn start(&mut self) {
        self.started = true;
    }

    fn update(&mut self) {
        if self.started {
            self.updates += 1;
        }
    }

    fn render(&mut self) {
        if self.started && self.resources_loaded {
            self.rendered.increment();
        }
    }

    fn teardown(&mut self) {
        self.started = false;
        self.resources_loaded = false;
        log::debug!("Headless display torn down after {} frames", self.rendered.get());
    }

    fn set_content_orientation(&mut self, orientation: DeviceOrientation) {
        self.orientation = orientation;
    }

    fn window_did_rotate(&mut self, orientation: DeviceOrientation, supported: bool) {
        if supported {
            self.orientation = orientation;
        }
    }

    fn window_size_changed(&mut self) {
        log::trace!("Headless surface is now {}x{}", self.surface.0, self.surface.1);
    }

    fn restart(&mut self) {
        self.resources_loaded = true;
    }

    fn unload_resources(&mut self) {
        self.resources_loaded = false;
    }

    fn reload_resources(&mut self) {
        self.resources_loaded = true;
    }

    fn viewable_content_width(&self) -> i32 {
        let (w, h) = self.authored_size();
        if self.orientation.is_landscape() != self.authored_landscape() {
            h
        } else {
            w
        }
    }

    fn viewable_content_height(&self) -> i32 {
        let (w, h) = self.authored_size();
        if self.orientation.is_landscape() != self.authored_landscape() {
            w
        } else {
            h
        }
    }
}
