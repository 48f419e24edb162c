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

//! Flag words and small value types describing a runtime.

use kestrel_core::kestrel_bitflags;
use kestrel_core::platform::DeviceOrientation;

kestrel_bitflags! {
    /// Boolean feature properties of a [`Runtime`](crate::Runtime).
    pub struct RuntimeProperties: u32 {
        /// Content orientation may not follow the device.
        const ORIENTATION_LOCKED = 1 << 0;
        /// A debugger was attached at launch.
        const DEBUGGER_CONNECTED = 1 << 1;
        /// `load_application` succeeded.
        const APPLICATION_LOADED = 1 << 2;
        /// The main file has started running.
        const APPLICATION_EXECUTING = 1 << 3;
        /// Unhandled script errors request an exit.
        const EXIT_ON_ERROR = 1 << 5;
        /// Script errors are surfaced to the host.
        const SHOW_RUNTIME_ERRORS = 1 << 6;
        /// Source files (not only bytecode) may be loaded.
        const SCRIPT_PARSER_AVAILABLE = 1 << 7;
        /// `begin_run_loop` does not tick immediately.
        const DEFER_UPDATE = 1 << 9;
        /// The host calls `render` itself.
        const RENDER_ASYNC = 1 << 10;
        /// Sources are read from the resource directory, not an archive.
        const APPLICATION_NOT_ARCHIVED = 1 << 11;
        /// Running inside an authoring tool.
        const SIMULATOR_EXTENSION = 1 << 13;
        /// The configuration set `showRuntimeErrors` explicitly.
        const SHOW_RUNTIME_ERRORS_SET = 1 << 14;
    }
}

kestrel_bitflags! {
    /// How the host asks the application to start.
    pub struct LaunchOptions: u32 {
        /// Wait for and attach a debugger.
        const CONNECT_TO_DEBUGGER = 1 << 0;
        /// Run the bootstrap shell before main.
        const LAUNCH_DEVICE_SHELL = 1 << 1;
        /// Start without audio.
        const DISABLE_AUDIO = 1 << 2;
        /// Skip feature gating.
        const UNLOCK_FEATURES = 1 << 3;
    }
}

kestrel_bitflags! {
    /// Subsystems taking part in the next suspend.
    ///
    /// The empty set means "suspend everything". A non-empty set restricts
    /// the next suspend to the named subsystems and leaves the core running.
    /// The mask is consumed by the following resume.
    pub struct SuspendOverrides: u32 {
        /// Audio output.
        const BACKGROUND_AUDIO = 1 << 0;
        /// Location updates.
        const BACKGROUND_LOCATION = 1 << 1;
        /// Voice-over-IP sessions.
        const BACKGROUND_VOIP = 1 << 3;
    }
}

impl SuspendOverrides {
    /// Every subsystem is suspended.
    pub const SUSPEND_ALL: Self = Self::EMPTY;
}

/// Whether the core is ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuspendState {
    /// The run loop has not started yet.
    #[default]
    NotStarted,
    /// The timer is driving ticks.
    Running,
    /// The timer is stopped and the clock frozen.
    Suspended,
}

/// The externally visible lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePhase {
    /// Nothing has been loaded yet.
    Uninitialized,
    /// Loading started but has not succeeded.
    Loading,
    /// Loaded and not suspended.
    Running,
    /// Loaded and suspended.
    Suspended,
    /// Torn down.
    Destroyed,
}

/// Outcome of [`Runtime::load_application`](crate::Runtime::load_application).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// The application is loaded and main is scheduled.
    Success,
    /// The archive or entry point could not be resolved.
    GeneralFailure,
    /// The dependency check refused to run the application.
    SecurityIssue,
}

impl LoadResult {
    /// Numeric code for hosts that report exit statuses.
    pub const fn code(self) -> i32 {
        match self {
            LoadResult::Success => 0,
            LoadResult::GeneralFailure => 1,
            LoadResult::SecurityIssue => 2,
        }
    }

    /// `true` for [`LoadResult::Success`].
    pub const fn is_success(self) -> bool {
        matches!(self, LoadResult::Success)
    }
}

/// Arguments to [`Runtime::load_application`](crate::Runtime::load_application).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadParameters {
    /// Launch behaviour.
    pub launch_options: LaunchOptions,
    /// Initial content orientation.
    pub orientation: DeviceOrientation,
    /// Content width override; applied only together with a positive height.
    pub content_width: i32,
    /// Content height override; applied only together with a positive width.
    pub content_height: i32,
}

impl Default for LoadParameters {
    fn default() -> Self {
        Self {
            launch_options: LaunchOptions::EMPTY,
            orientation: DeviceOrientation::Upright,
            content_width: -1,
            content_height: -1,
        }
    }
}

impl LoadParameters {
    /// The content-size override, when both dimensions are positive.
    pub fn content_size(&self) -> Option<(i32, i32)> {
        (self.content_width > 0 && self.content_height > 0)
            .then_some((self.content_width, self.content_height))
    }
}
