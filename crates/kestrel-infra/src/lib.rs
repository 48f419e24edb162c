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

//! Concrete implementations of the collaborator traits declared in
//! `kestrel-core`.
//!
//! Everything here runs without a window, a sound card or a script VM, which
//! makes these backends suitable for desktop hosts, CI and tooling. Each
//! family sits behind a cargo feature so embedders can swap in their own.

#![warn(missing_docs)]

#[cfg(feature = "audio")]
pub mod audio;
#[cfg(feature = "display")]
pub mod display;
#[cfg(feature = "physics")]
pub mod physics;
#[cfg(feature = "platform")]
pub mod platform;
#[cfg(feature = "script")]
pub mod script;

#[cfg(feature = "audio")]
pub use audio::SilentAudioPlayer;
#[cfg(feature = "display")]
pub use display::HeadlessDisplay;
#[cfg(feature = "physics")]
pub use physics::FixedStepPhysics;
#[cfg(feature = "platform")]
pub use platform::{HostEnvironment, IntervalTimer};
#[cfg(feature = "script")]
pub use script::{NativeJob, NativeScriptContext};
