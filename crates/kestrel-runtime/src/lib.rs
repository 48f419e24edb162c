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

//! # Kestrel Runtime
//!
//! The application runtime: it loads an application's configuration and
//! entry point, drives it frame by frame from a platform timer, suspends and
//! resumes it with the host, and tears the whole assembly down in a fixed
//! order.
//!
//! The building blocks are usable on their own:
//! - [`ElapsedClock`]: application time that stands still while suspended.
//! - [`FrameScheduler`]: deferred work drained once per tick.
//! - [`ResourceCache`]: keyed, reference-counted handles in MRU order.
//! - [`BackgroundJobChannel`]: one background job at a time (`simulator`).

pub mod cache;
pub mod clock;
mod error;
#[cfg(feature = "simulator")]
pub mod jobs;
mod loader;
pub mod properties;
mod runtime;
pub mod scheduler;
mod suspend;

#[cfg(test)]
mod testing;

pub use cache::{ResourceCache, ResourceId};
pub use clock::ElapsedClock;
pub use error::RuntimeError;
#[cfg(feature = "simulator")]
pub use jobs::{BackgroundJobChannel, FinishedJob, JobResult};
pub use properties::{
    LaunchOptions, LoadParameters, LoadResult, RuntimePhase, RuntimeProperties, SuspendOverrides,
    SuspendState,
};
pub use runtime::{ResourceHandle, Runtime, RuntimeBuilder};
pub use scheduler::{DeferredTask, FrameScheduler, SchedulerError};
