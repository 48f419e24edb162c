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

//! The display/render subsystem contract.

use crate::platform::DeviceOrientation;

/// Name of the rendering backend used when the host does not choose one.
pub const DEFAULT_BACKEND: &str = "glBackend";

/// Everything the display needs to come up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Authored content width in points, `0` to follow the surface.
    pub content_width: i32,
    /// Authored content height in points, `0` to follow the surface.
    pub content_height: i32,
    /// Request a multisampled surface.
    pub antialias: bool,
    /// Orientation the content was authored for.
    pub orientation: DeviceOrientation,
    /// Rendering backend identifier.
    pub backend: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            content_width: 0,
            content_height: 0,
            antialias: false,
            orientation: DeviceOrientation::Upright,
            backend: DEFAULT_BACKEND.to_string(),
        }
    }
}

/// A display/render subsystem driven by the runtime.
///
/// The runtime calls `initialize` once while loading, `start` when the run
/// loop begins, `update` + `render` on every unsuspended tick and
/// `teardown` exactly once before dropping it.
pub trait DisplaySubsystem {
    /// Prepares the surface. Returns `false` if the display is unusable.
    fn initialize(&mut self, settings: &DisplaySettings) -> bool;

    /// Begins presenting.
    fn start(&mut self);

    /// Advances scene state for one frame.
    fn update(&mut self);

    /// Draws the current frame.
    fn render(&mut self);

    /// Releases every GPU/window resource.
    fn teardown(&mut self);

    /// Changes the orientation the content is laid out in.
    fn set_content_orientation(&mut self, orientation: DeviceOrientation);

    /// The surface rotated to `orientation`.
    fn window_did_rotate(&mut self, orientation: DeviceOrientation, supported: bool);

    /// The surface was resized by the host.
    fn window_size_changed(&mut self);

    /// Recreates the renderer, keeping scene state.
    fn restart(&mut self);

    /// Frees GPU-side copies of textures and buffers.
    fn unload_resources(&mut self);

    /// Re-uploads what `unload_resources` freed.
    fn reload_resources(&mut self);

    /// Visible content width after scaling.
    fn viewable_content_width(&self) -> i32;

    /// Visible content height after scaling.
    fn viewable_content_height(&self) -> i32;
}
