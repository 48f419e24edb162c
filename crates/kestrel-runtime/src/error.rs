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

use kestrel_core::config::ConfigError;
use kestrel_core::script::ScriptError;

use crate::scheduler::SchedulerError;

/// Failures inside the runtime's own steps.
///
/// None of these cross the public lifecycle API; they are logged and turned
/// into a [`LoadResult`](crate::LoadResult) or a degraded subsystem.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The script context reported an error.
    #[error(transparent)]
    Script(#[from] ScriptError),
    /// The configuration file could not be used.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A deferred task could not be queued.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    /// The entry point was not found.
    #[error("main file '{0}' not found")]
    MainNotFound(String),
}
