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

//! # Kestrel Core
//!
//! Foundational crate containing the collaborator traits, event types and
//! configuration contracts that the application runtime is built against.
//! Nothing in here owns a thread or a window; concrete implementations live
//! in `kestrel-infra`.

#![warn(missing_docs)]

pub mod audio;
pub mod config;
pub mod delegate;
pub mod display;
pub mod event;
pub mod physics;
pub mod platform;
pub mod script;
pub mod time;
pub mod utils;

pub use audio::AudioPlayer;
pub use config::{ApplicationConfig, ConfigError, ContentConfig};
pub use delegate::RuntimeDelegate;
pub use display::DisplaySubsystem;
pub use event::{EventBus, RuntimeEvent, SystemEvent};
pub use physics::PhysicsWorld;
pub use platform::{PlatformEnvironment, PlatformError, PlatformTimer};
pub use script::{IsolatedJob, ScriptContext, ScriptError};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
