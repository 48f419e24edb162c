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

//! Abstractions over the host platform.
//!
//! The runtime talks to the operating system only through
//! [`PlatformEnvironment`] (directories, suspend/resume of host resources,
//! the runtime guard) and [`PlatformTimer`] (the frame trigger).

mod timer;

pub use timer::PlatformTimer;

use std::path::PathBuf;

use crate::kestrel_bitflags;

/// Physical orientation of the device or of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceOrientation {
    /// Orientation could not be determined.
    Unknown,
    /// Portrait, home button at the bottom.
    #[default]
    Upright,
    /// Landscape, rotated clockwise.
    SidewaysRight,
    /// Portrait, upside down.
    UpsideDown,
    /// Landscape, rotated counter-clockwise.
    SidewaysLeft,
    /// Lying flat, screen up.
    FaceUp,
    /// Lying flat, screen down.
    FaceDown,
}

impl DeviceOrientation {
    /// `true` for the two landscape orientations.
    pub const fn is_landscape(self) -> bool {
        matches!(
            self,
            DeviceOrientation::SidewaysRight | DeviceOrientation::SidewaysLeft
        )
    }
}

/// Well-known directories a file can be resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directory {
    /// The application's bundled, read-only resources.
    Resource,
    /// Resources shipped by the runtime itself (archives, shells).
    SystemResource,
    /// Persistent, user-writable storage.
    Documents,
    /// Scratch space that may be purged between launches.
    Temporary,
}

kestrel_bitflags! {
    /// Modifiers for [`PlatformEnvironment::path_for_file`].
    pub struct PathFlags: u32 {
        /// Return `None` unless the resolved file exists.
        const TEST_FILE_EXISTS = 1 << 0;
    }
}

/// Errors the runtime reports to the host instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// A mandatory subsystem could not be created.
    #[error("out of memory: could not allocate the {subsystem}")]
    OutOfMemory {
        /// Which subsystem is missing.
        subsystem: &'static str,
    },
    /// A script failed and the host asked to see runtime errors.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Host services the runtime depends on.
pub trait PlatformEnvironment {
    /// Resolves `filename` inside `directory`.
    ///
    /// With [`PathFlags::TEST_FILE_EXISTS`] the result is `None` when the
    /// file is not on disk.
    fn path_for_file(&self, filename: &str, directory: Directory, flags: PathFlags)
        -> Option<PathBuf>;

    /// Releases host resources while the application is in the background.
    fn suspend(&mut self);

    /// Reacquires what [`suspend`](Self::suspend) released.
    fn resume(&mut self);

    /// Entered before the runtime calls into the script context.
    fn begin_runtime(&self) {}

    /// Left after the runtime returns from the script context.
    fn end_runtime(&self) {}

    /// Creates the frame timer, `None` when the host cannot provide one.
    fn create_timer(&mut self) -> Option<Box<dyn PlatformTimer>>;

    /// Reports an error the runtime recovered from.
    fn raise_error(&self, error: &PlatformError) {
        log::error!("{error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_orientations() {
        assert!(DeviceOrientation::SidewaysLeft.is_landscape());
        assert!(DeviceOrientation::SidewaysRight.is_landscape());
        assert!(!DeviceOrientation::Upright.is_landscape());
        assert!(!DeviceOrientation::FaceUp.is_landscape());
        assert_eq!(DeviceOrientation::default(), DeviceOrientation::Upright);
    }

    #[test]
    fn out_of_memory_message_names_the_subsystem() {
        let err = PlatformError::OutOfMemory { subsystem: "timer" };
        assert_eq!(err.to_string(), "out of memory: could not allocate the timer");
    }
}
