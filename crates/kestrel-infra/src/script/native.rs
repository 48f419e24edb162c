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

//! A [`ScriptContext`] whose chunks are Rust closures.
//!
//! Files and archive resources are resolved by stem: `main.lua`, `main.js`
//! and the archive entry `main` all run the chunk registered as `"main"`.
//! Chunks get a [`NativeScope`] to register lifecycle and job listeners,
//! which is how an application written against this context reacts to
//! suspend, resume and exit.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use kestrel_core::event::{EventScope, SystemEvent};
use kestrel_core::script::{
    BootstrapChunk, BootstrapOutcome, IsolatedJob, LaunchArgs, ScriptContext, ScriptError,
    ScriptListener,
};

type ChunkFn = Box<dyn FnMut(&mut NativeScope<'_>, &LaunchArgs) -> Result<(), String>>;
type BootstrapFn = Box<dyn FnMut(&[u8]) -> Result<BootstrapOutcome, String>>;
type EventFn = Box<dyn FnMut(SystemEvent) -> Result<(), String>>;
type JobFn = Box<dyn FnMut(Option<&str>) -> Result<(), String>>;

#[derive(Default)]
struct Listeners {
    events: Vec<(SystemEvent, EventScope, EventFn)>,
    jobs: HashMap<ScriptListener, JobFn>,
    next_job: u32,
}

impl Listeners {
    fn add_job(&mut self, callback: JobFn) -> ScriptListener {
        self.next_job += 1;
        let listener = ScriptListener(self.next_job);
        self.jobs.insert(listener, callback);
        listener
    }
}

/// Registration surface handed to a running chunk.
pub struct NativeScope<'a> {
    listeners: &'a mut Listeners,
}

impl NativeScope<'_> {
    /// Calls `callback` whenever `event` is dispatched in `scope`.
    pub fn on_event(
        &mut self,
        event: SystemEvent,
        scope: EventScope,
        callback: impl FnMut(SystemEvent) -> Result<(), String> + 'static,
    ) {
        self.listeners
            .events
            .push((event, scope, Box::new(callback)));
    }

    /// Registers a job-result callback and returns its listener id.
    pub fn on_job_result(
        &mut self,
        callback: impl FnMut(Option<&str>) -> Result<(), String> + 'static,
    ) -> ScriptListener {
        self.listeners.add_job(Box::new(callback))
    }
}

/// A [`ScriptContext`] backed by registered closures.
#[derive(Default)]
pub struct NativeScriptContext {
    chunks: HashMap<String, ChunkFn>,
    bootstraps: HashMap<String, BootstrapFn>,
    listeners: Listeners,
    initialized: bool,
    deleted: bool,
    collections: u64,
}

impl NativeScriptContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the chunk that runs for files and resources named `stem`.
    pub fn with_chunk(
        mut self,
        stem: impl Into<String>,
        chunk: impl FnMut(&mut NativeScope<'_>, &LaunchArgs) -> Result<(), String> + 'static,
    ) -> Self {
        self.chunks.insert(stem.into(), Box::new(chunk));
        self
    }

    /// Registers how the in-memory chunk called `name` decides about main.
    pub fn with_bootstrap(
        mut self,
        name: impl Into<String>,
        bootstrap: impl FnMut(&[u8]) -> Result<BootstrapOutcome, String> + 'static,
    ) -> Self {
        self.bootstraps.insert(name.into(), Box::new(bootstrap));
        self
    }

    /// Registers a job-result callback from outside any chunk.
    pub fn add_job_listener(
        &mut self,
        callback: impl FnMut(Option<&str>) -> Result<(), String> + 'static,
    ) -> ScriptListener {
        self.listeners.add_job(Box::new(callback))
    }

    /// Full collection cycles requested so far.
    pub fn collections(&self) -> u64 {
        self.collections
    }

    /// `true` once [`delete`](ScriptContext::delete) ran.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn ensure_alive(&self) -> Result<(), ScriptError> {
        if self.deleted {
            Err(ScriptError::Deleted)
        } else {
            Ok(())
        }
    }

    fn run_chunk(
        &mut self,
        stem: &str,
        missing: &Path,
        args: &LaunchArgs,
    ) -> Result<(), ScriptError> {
        self.ensure_alive()?;
        let Some(mut chunk) = self.chunks.remove(stem) else {
            return Err(ScriptError::NotFound(missing.to_path_buf()));
        };
        let result = chunk(
            &mut NativeScope {
                listeners: &mut self.listeners,
            },
            args,
        );
        self.chunks.insert(stem.to_string(), chunk);
        result.map_err(|message| ScriptError::Runtime {
            chunk: stem.to_string(),
            message,
        })
    }
}

impl ScriptContext for NativeScriptContext {
    fn initialize(&mut self) -> Result<(), ScriptError> {
        self.ensure_alive()?;
        self.initialized = true;
        log::debug!("Native script context ready with {} chunk(s)", self.chunks.len());
        Ok(())
    }

    fn do_file(&mut self, path: &Path, args: &LaunchArgs) -> Result<(), ScriptError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        self.run_chunk(&stem, path, args)
    }

    fn do_archive_resource(
        &mut self,
        archive: &Path,
        name: &str,
        args: &LaunchArgs,
    ) -> Result<(), ScriptError> {
        if !archive.exists() {
            return Err(ScriptError::NotFound(archive.to_path_buf()));
        }
        self.run_chunk(name, &archive.join(name), args)
    }

    fn do_buffer(&mut self, chunk: &BootstrapChunk) -> Result<BootstrapOutcome, ScriptError> {
        self.ensure_alive()?;
        match self.bootstraps.get_mut(&chunk.name) {
            Some(bootstrap) => bootstrap(&chunk.source).map_err(|message| ScriptError::Runtime {
                chunk: chunk.name.clone(),
                message,
            }),
            None => Ok(BootstrapOutcome::ScheduleMain),
        }
    }

    fn dispatch_event(&mut self, event: SystemEvent, scope: EventScope) -> Result<(), ScriptError> {
        self.ensure_alive()?;
        let mut first_error = None;
        for (wanted, wanted_scope, callback) in self.listeners.events.iter_mut() {
            if *wanted != event || *wanted_scope != scope {
                continue;
            }
            if let Err(message) = callback(event) {
                first_error.get_or_insert(message);
            }
        }
        match first_error {
            Some(message) => Err(ScriptError::Runtime {
                chunk: event.name().to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    fn dispatch_job_result(
        &mut self,
        listener: ScriptListener,
        result: Option<&str>,
    ) -> Result<(), ScriptError> {
        self.ensure_alive()?;
        let Some(callback) = self.listeners.jobs.get_mut(&listener) else {
            log::debug!("No job listener {listener:?}; result dropped");
            return Ok(());
        };
        callback(result).map_err(|message| ScriptError::Runtime {
            chunk: format!("job listener {}", listener.0),
            message,
        })
    }

    fn collect(&mut self) {
        if !self.deleted {
            self.collections += 1;
        }
    }

    fn delete(&mut self) {
        self.deleted = true;
        self.initialized = false;
        self.chunks.clear();
        self.bootstraps.clear();
        self.listeners = Listeners::default();
    }
}

impl std::fmt::Debug for NativeScriptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeScriptContext")
            .field("chunks", &self.chunks.keys().collect::<Vec<_>>())
            .field("event_listeners", &self.listeners.events.len())
            .field("job_listeners", &self.listeners.jobs.len())
            .field("initialized", &self.initialized)
            .field("deleted", &self.deleted)
            .finish()
    }
}

type JobHandler = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// An [`IsolatedJob`] that routes `"name:payload"` arguments to handlers.
///
/// An argument without a colon is routed with an empty payload. Unknown
/// names produce no result.
#[derive(Default, Clone)]
pub struct NativeJob {
    handlers: HashMap<String, JobHandler>,
}

impl NativeJob {
    /// Creates a job with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes arguments named `name` to `handler`.
    pub fn with_handler(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }
}

impl IsolatedJob for NativeJob {
    fn run(&self, argument: &str) -> Option<String> {
        let (name, payload) = argument.split_once(':').unwrap_or((argument, ""));
        match self.handlers.get(name) {
            Some(handler) => handler(payload),
            None => {
                log::warn!("Background job '{name}' has no handler");
                None
            }
        }
    }
}

impl std::fmt::Debug for NativeJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeJob")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
