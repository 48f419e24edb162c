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

//! The script execution context contract.
//!
//! The runtime is agnostic to the scripting language. It loads the entry
//! point, forwards lifecycle events and asks for garbage collection; the
//! context owns everything else.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::event::{EventScope, SystemEvent};

/// Arguments handed to the main chunk on launch.
pub type LaunchArgs = BTreeMap<String, String>;

/// An opaque reference to a script-side callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptListener(pub u32);

/// A chunk of script source executed before the main file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapChunk {
    /// Name used in diagnostics.
    pub name: String,
    /// Raw source or bytecode.
    pub source: Vec<u8>,
}

/// What a bootstrap chunk decided about the main file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Load main on the next tick.
    ScheduleMain,
    /// The shell will ask for main itself, later.
    Deferred,
}

/// Failures reported by a [`ScriptContext`].
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The file to execute does not exist.
    #[error("script not found: {0}")]
    NotFound(PathBuf),
    /// A chunk raised an error while running.
    #[error("error running '{chunk}': {message}")]
    Runtime {
        /// The chunk or file that failed.
        chunk: String,
        /// Message produced by the context.
        message: String,
    },
    /// The context was used after [`ScriptContext::delete`].
    #[error("script context has been deleted")]
    Deleted,
}

/// A script virtual machine owned by the runtime.
pub trait ScriptContext {
    /// Boots the VM. Called once, first.
    fn initialize(&mut self) -> Result<(), ScriptError>;

    /// Runs a source file.
    fn do_file(&mut self, path: &Path, args: &LaunchArgs) -> Result<(), ScriptError>;

    /// Runs a named resource out of a packaged archive.
    fn do_archive_resource(
        &mut self,
        archive: &Path,
        name: &str,
        args: &LaunchArgs,
    ) -> Result<(), ScriptError>;

    /// Runs an in-memory chunk and reports what it wants done with main.
    fn do_buffer(&mut self, chunk: &BootstrapChunk) -> Result<BootstrapOutcome, ScriptError>;

    /// Delivers a lifecycle event to listeners in `scope`.
    fn dispatch_event(&mut self, event: SystemEvent, scope: EventScope)
        -> Result<(), ScriptError>;

    /// Calls `listener` with the outcome of a background job.
    fn dispatch_job_result(
        &mut self,
        listener: ScriptListener,
        result: Option<&str>,
    ) -> Result<(), ScriptError>;

    /// Runs a full garbage collection cycle.
    fn collect(&mut self);

    /// Destroys the VM. Every later call must fail with [`ScriptError::Deleted`].
    fn delete(&mut self);
}

/// Work run on a background thread inside its own, isolated VM.
///
/// It shares nothing with the main [`ScriptContext`], so it must be safe to
/// call from any thread.
pub trait IsolatedJob: Send + Sync {
    /// Runs the job and returns its textual result, if any.
    fn run(&self, argument: &str) -> Option<String>;
}

impl<F> IsolatedJob for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn run(&self, argument: &str) -> Option<String> {
        self(argument)
    }
}
