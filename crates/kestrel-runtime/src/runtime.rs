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

//! The runtime aggregate and its builder.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use kestrel_core::audio::AudioPlayer;
use kestrel_core::config::ApplicationConfig;
use kestrel_core::delegate::RuntimeDelegate;
use kestrel_core::display::{DisplaySubsystem, DEFAULT_BACKEND};
use kestrel_core::event::{EventBus, EventScope, RuntimeEvent, SystemEvent};
use kestrel_core::physics::PhysicsWorld;
use kestrel_core::platform::{DeviceOrientation, PlatformEnvironment, PlatformError, PlatformTimer};
use kestrel_core::script::{BootstrapChunk, LaunchArgs, ScriptContext, ScriptError};
use kestrel_core::time::{SystemTimeSource, TimeSource};

#[cfg(feature = "simulator")]
use kestrel_core::script::{IsolatedJob, ScriptListener};

use crate::cache::{ResourceCache, ResourceId};
use crate::clock::ElapsedClock;
#[cfg(feature = "simulator")]
use crate::jobs::{BackgroundJobChannel, FinishedJob, JobResult};
use crate::properties::{RuntimePhase, RuntimeProperties, SuspendOverrides, SuspendState};
use crate::scheduler::{self, DeferredTask, FrameScheduler, SchedulerError};

/// Opaque handle stored in the runtime's resource cache.
pub type ResourceHandle = Arc<dyn Any + Send + Sync>;

/// Frame rate used unless the configuration asks for 60.
pub const DEFAULT_FPS: u8 = 30;
/// The only alternative frame rate a configuration may select.
pub const HIGH_FPS: u8 = 60;
/// Name of the configuration file in the resource directory.
pub const CONFIG_FILE: &str = "config.json";
/// Name of the packaged application archive.
pub const ARCHIVE_FILE: &str = "resource.car";
/// Default entry point.
pub const MAIN_FILE: &str = "main.lua";

/// Collects collaborators and settings for a [`Runtime`].
pub struct RuntimeBuilder {
    platform: Box<dyn PlatformEnvironment>,
    script: Option<Box<dyn ScriptContext>>,
    display: Option<Box<dyn DisplaySubsystem>>,
    audio: Option<Box<dyn AudioPlayer>>,
    physics: Option<Box<dyn PhysicsWorld>>,
    delegate: Option<Box<dyn RuntimeDelegate>>,
    time_source: Option<Arc<dyn TimeSource>>,
    bootstrap: Option<BootstrapChunk>,
    launch_args: LaunchArgs,
    properties: RuntimeProperties,
    main_file: String,
    backend: String,
    scheduler_capacity: usize,
    #[cfg(feature = "simulator")]
    job_runner: Option<Arc<dyn IsolatedJob>>,
}

impl RuntimeBuilder {
    fn new(platform: Box<dyn PlatformEnvironment>) -> Self {
        #[cfg(feature = "simulator")]
        let properties = RuntimeProperties::APPLICATION_NOT_ARCHIVED
            | RuntimeProperties::SCRIPT_PARSER_AVAILABLE
            | RuntimeProperties::SHOW_RUNTIME_ERRORS;
        #[cfg(not(feature = "simulator"))]
        let properties = RuntimeProperties::EMPTY;

        Self {
            platform,
            script: None,
            display: None,
            audio: None,
            physics: None,
            delegate: None,
            time_source: None,
            bootstrap: None,
            launch_args: LaunchArgs::new(),
            properties,
            main_file: MAIN_FILE.to_string(),
            backend: DEFAULT_BACKEND.to_string(),
            scheduler_capacity: scheduler::DEFAULT_CAPACITY,
            #[cfg(feature = "simulator")]
            job_runner: None,
        }
    }

    /// Sets the script context. Without one the runtime runs degraded.
    pub fn script(mut self, script: Box<dyn ScriptContext>) -> Self {
        self.script = Some(script);
        self
    }

    /// Sets the display subsystem.
    pub fn display(mut self, display: Box<dyn DisplaySubsystem>) -> Self {
        self.display = Some(display);
        self
    }

    /// Sets the audio player.
    pub fn audio(mut self, audio: Box<dyn AudioPlayer>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Sets the physics world.
    pub fn physics(mut self, physics: Box<dyn PhysicsWorld>) -> Self {
        self.physics = Some(physics);
        self
    }

    /// Installs the owner's lifecycle hooks.
    pub fn delegate(mut self, delegate: Box<dyn RuntimeDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Replaces the wall clock, mostly for tests.
    pub fn time_source(mut self, source: Arc<dyn TimeSource>) -> Self {
        self.time_source = Some(source);
        self
    }

    /// Chunk run instead of main when launched with the device shell.
    pub fn bootstrap(mut self, chunk: BootstrapChunk) -> Self {
        self.bootstrap = Some(chunk);
        self
    }

    /// Adds an argument passed to the main file.
    pub fn launch_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.launch_args.insert(key.into(), value.into());
        self
    }

    /// Raises or clears an initial property.
    pub fn property(mut self, property: RuntimeProperties, value: bool) -> Self {
        self.properties.set(property, value);
        self
    }

    /// Overrides the entry point file name.
    pub fn main_file(mut self, name: impl Into<String>) -> Self {
        self.main_file = name.into();
        self
    }

    /// Overrides the rendering backend name handed to the display.
    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Bounds the number of deferred tasks waiting for a tick.
    pub fn scheduler_capacity(mut self, capacity: usize) -> Self {
        self.scheduler_capacity = capacity;
        self
    }

    /// Enables background jobs, run by `runner`.
    #[cfg(feature = "simulator")]
    pub fn job_runner(mut self, runner: Arc<dyn IsolatedJob>) -> Self {
        self.job_runner = Some(runner);
        self
    }

    /// Assembles the runtime.
    ///
    /// A missing script context or timer is reported through
    /// [`PlatformEnvironment::raise_error`]; the runtime is still returned.
    pub fn build(self) -> Runtime {
        let mut platform = self.platform;

        let timer = platform.create_timer();
        if timer.is_none() {
            platform.raise_error(&PlatformError::OutOfMemory { subsystem: "timer" });
        }
        if self.script.is_none() {
            platform.raise_error(&PlatformError::OutOfMemory {
                subsystem: "script context",
            });
        }

        let time_source = self
            .time_source
            .unwrap_or_else(|| Arc::new(SystemTimeSource::new()));

        log::info!("Runtime created.");

        Runtime {
            platform,
            timer,
            script: self.script,
            display: self.display,
            audio: self.audio,
            physics: self.physics,
            delegate: self.delegate,
            clock: ElapsedClock::new(time_source),
            scheduler: FrameScheduler::with_capacity(self.scheduler_capacity),
            resources: ResourceCache::new(),
            #[cfg(feature = "simulator")]
            jobs: self.job_runner.map(BackgroundJobChannel::new),
            events: EventBus::new(),
            properties: self.properties,
            suspend_state: SuspendState::NotStarted,
            suspend_overrides: SuspendOverrides::SUSPEND_ALL,
            platform_suspended: false,
            frame: 0,
            fps: DEFAULT_FPS,
            config: ApplicationConfig::default(),
            orientation: DeviceOrientation::Upright,
            launch_args: self.launch_args,
            bootstrap: self.bootstrap,
            main_file: self.main_file,
            backend: self.backend,
            archive: None,
            load_attempted: false,
            exit_requested: false,
            destroyed: false,
        }
    }
}

/// One running application instance.
///
/// The runtime is single-threaded: everything here runs on the thread that
/// polls the timer. The only other thread is the background job worker.
///
/// Dropping the runtime (or calling [`destroy`](Self::destroy)) tears it
/// down in order: owner notification, exit event, audio, timer, display
/// teardown, script context, physics, background job, resource cache.
pub struct Runtime {
    pub(crate) platform: Box<dyn PlatformEnvironment>,
    pub(crate) timer: Option<Box<dyn PlatformTimer>>,
    pub(crate) script: Option<Box<dyn ScriptContext>>,
    pub(crate) display: Option<Box<dyn DisplaySubsystem>>,
    pub(crate) audio: Option<Box<dyn AudioPlayer>>,
    pub(crate) physics: Option<Box<dyn PhysicsWorld>>,
    pub(crate) delegate: Option<Box<dyn RuntimeDelegate>>,
    pub(crate) clock: ElapsedClock,
    scheduler: FrameScheduler<Runtime>,
    resources: ResourceCache<ResourceHandle>,
    #[cfg(feature = "simulator")]
    jobs: Option<BackgroundJobChannel>,
    events: EventBus<RuntimeEvent>,
    pub(crate) properties: RuntimeProperties,
    pub(crate) suspend_state: SuspendState,
    pub(crate) suspend_overrides: SuspendOverrides,
    pub(crate) platform_suspended: bool,
    frame: u64,
    pub(crate) fps: u8,
    pub(crate) config: ApplicationConfig,
    pub(crate) orientation: DeviceOrientation,
    pub(crate) launch_args: LaunchArgs,
    pub(crate) bootstrap: Option<BootstrapChunk>,
    pub(crate) main_file: String,
    pub(crate) backend: String,
    pub(crate) archive: Option<std::path::PathBuf>,
    pub(crate) load_attempted: bool,
    exit_requested: bool,
    destroyed: bool,
}

impl Runtime {
    /// Starts building a runtime on top of `platform`.
    pub fn builder(platform: Box<dyn PlatformEnvironment>) -> RuntimeBuilder {
        RuntimeBuilder::new(platform)
    }

    // --- State ---

    /// Where the runtime is in its lifecycle.
    pub fn phase(&self) -> RuntimePhase {
        if self.destroyed {
            RuntimePhase::Destroyed
        } else if !self.load_attempted {
            RuntimePhase::Uninitialized
        } else if !self.properties.contains(RuntimeProperties::APPLICATION_LOADED) {
            RuntimePhase::Loading
        } else if self.suspend_state == SuspendState::Suspended {
            RuntimePhase::Suspended
        } else {
            RuntimePhase::Running
        }
    }

    /// Tri-state suspension flag.
    pub fn suspend_state(&self) -> SuspendState {
        self.suspend_state
    }

    /// `true` while the core is suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspend_state == SuspendState::Suspended
    }

    /// Current feature properties.
    pub fn properties(&self) -> RuntimeProperties {
        self.properties
    }

    /// Raises or clears a feature property.
    pub fn set_property(&mut self, property: RuntimeProperties, value: bool) {
        self.properties.set(property, value);
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Configured frames per second, 30 or 60.
    pub fn fps(&self) -> u8 {
        self.fps
    }

    /// Seconds per frame.
    pub fn frame_interval(&self) -> f64 {
        1.0 / f64::from(self.fps)
    }

    /// Timer period in whole milliseconds.
    pub fn timer_interval_ms(&self) -> u32 {
        1000 / u32::from(self.fps)
    }

    /// Application time, excluding suspended intervals.
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// [`elapsed`](Self::elapsed) in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed_ms()
    }

    /// Configuration in effect after loading.
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Lifecycle notifications for the embedder.
    pub fn events(&self) -> &EventBus<RuntimeEvent> {
        &self.events
    }

    /// `true` once a script error occurred with `exitOnError` set.
    pub fn is_exit_requested(&self) -> bool {
        self.exit_requested
    }

    // --- Deferred tasks ---

    /// Queues `task` for the next tick.
    pub fn schedule<T>(&self, task: T) -> Result<(), SchedulerError>
    where
        T: DeferredTask<Runtime> + 'static,
    {
        self.scheduler.append(task)
    }

    /// Tasks waiting for the next tick.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub(crate) fn run_scheduler(&mut self) -> usize {
        let batch = self.scheduler.take_batch();
        batch.run(self)
    }

    // --- Run loop ---

    /// Starts driving frames.
    ///
    /// Initializes physics with the frame interval, starts the display, starts
    /// the timer if it never ran, then ticks once unless
    /// [`RuntimeProperties::DEFER_UPDATE`] is set. Does nothing until the
    /// application has loaded.
    pub fn begin_run_loop(&mut self) {
        if !self.properties.contains(RuntimeProperties::APPLICATION_LOADED) {
            log::warn!("begin_run_loop called before the application loaded; ignoring.");
            return;
        }

        let interval_ms = self.timer_interval_ms();
        let frame_interval = self.frame_interval();
        if let Some(physics) = self.physics.as_mut() {
            physics.initialize(frame_interval);
        }
        if let Some(display) = self.display.as_mut() {
            display.start();
        }

        if let Some(timer) = self.timer.as_mut() {
            timer.set_interval(interval_ms);
        }
        if self.suspend_state == SuspendState::NotStarted {
            if let Some(timer) = self.timer.as_mut() {
                timer.start();
            }
            self.suspend_state = SuspendState::Running;
            log::info!("Run loop started at {} fps ({interval_ms} ms).", self.fps);
        }

        if !self.properties.contains(RuntimeProperties::DEFER_UPDATE) {
            self.tick();
        }
    }

    /// Polls the timer and ticks if it fired. Returns whether it ticked.
    pub fn pump(&mut self) -> bool {
        let fired = self.timer.as_mut().is_some_and(|timer| timer.poll());
        if fired {
            self.tick();
        }
        fired
    }

    /// One frame.
    ///
    /// Drains the scheduler; unless a drained task moved the runtime into
    /// suspension, steps physics, updates the display, advances the frame
    /// counter and renders. A runtime that was already suspended still
    /// produces the frame.
    pub fn tick(&mut self) {
        if self.destroyed {
            return;
        }

        self.platform.begin_runtime();
        let was_suspended = self.is_suspended();
        self.run_scheduler();

        if !was_suspended && self.is_suspended() {
            log::trace!("Suspended during tick; skipping frame {}.", self.frame);
        } else {
            #[cfg(feature = "simulator")]
            self.finalize_background_job();

            let elapsed_ms = self.elapsed_ms();
            if let Some(physics) = self.physics.as_mut() {
                physics.step_world(elapsed_ms);
            }
            if let Some(display) = self.display.as_mut() {
                display.update();
            }
            self.frame += 1;

            if !self.properties.contains(RuntimeProperties::RENDER_ASYNC) {
                self.render_frame();
            }
        }

        self.platform.end_runtime();
    }

    /// Draws the current frame, for hosts that set
    /// [`RuntimeProperties::RENDER_ASYNC`].
    pub fn render(&mut self) {
        self.platform.begin_runtime();
        self.render_frame();
        self.platform.end_runtime();
    }

    fn render_frame(&mut self) {
        if let Some(display) = self.display.as_mut() {
            display.render();
        }
    }

    // --- Events ---

    /// Delivers a system event raised by the host.
    pub fn on_system_event(&mut self, event: SystemEvent) {
        self.dispatch_system_event(event, EventScope::Application);
    }

    /// Application-scope events are only delivered once the application is
    /// loaded; internal ones always are.
    pub(crate) fn dispatch_system_event(&mut self, event: SystemEvent, scope: EventScope) {
        if scope == EventScope::Application
            && !self.properties.contains(RuntimeProperties::APPLICATION_LOADED)
        {
            log::trace!("Dropping {event} before the application loaded.");
            return;
        }

        self.events.publish(RuntimeEvent::System { event, scope });

        let Some(script) = self.script.as_mut() else {
            return;
        };
        self.platform.begin_runtime();
        let outcome = script.dispatch_event(event, scope);
        self.platform.end_runtime();

        if let Err(e) = outcome {
            self.report_script_error(&e);
        }
    }

    pub(crate) fn report_script_error(&mut self, error: &ScriptError) {
        log::warn!("Script error: {error}");
        if self.properties.contains(RuntimeProperties::SHOW_RUNTIME_ERRORS) {
            self.platform
                .raise_error(&PlatformError::Runtime(error.to_string()));
        }
        if self.properties.contains(RuntimeProperties::EXIT_ON_ERROR) && !self.exit_requested {
            log::info!("exitOnError is set; requesting exit.");
            self.exit_requested = true;
        }
    }

    // --- Background jobs ---

    /// Runs `argument` through the background job runner.
    ///
    /// Without a listener this blocks and returns the result. With one it
    /// returns [`JobResult::Pending`] and the result is dispatched to the
    /// listener on a later tick. `None` when no runner is installed.
    #[cfg(feature = "simulator")]
    pub fn start_background_job(
        &mut self,
        argument: &str,
        listener: Option<ScriptListener>,
    ) -> Option<JobResult> {
        let Some(mut jobs) = self.jobs.take() else {
            log::warn!("No background job runner installed.");
            return None;
        };
        let result = jobs.start(argument, listener, |done| self.deliver_job(done));
        self.jobs = Some(jobs);
        Some(result)
    }

    #[cfg(feature = "simulator")]
    fn finalize_background_job(&mut self) {
        if let Some(done) = self.jobs.as_mut().and_then(BackgroundJobChannel::finalize_if_ready) {
            self.deliver_job(done);
        }
    }

    #[cfg(feature = "simulator")]
    fn deliver_job(&mut self, done: FinishedJob) {
        log::debug!("Delivering background job result to {:?}.", done.listener);
        self.events.publish(RuntimeEvent::JobFinished {
            result: done.result.clone(),
        });

        let Some(script) = self.script.as_mut() else {
            return;
        };
        self.platform.begin_runtime();
        let outcome = script.dispatch_job_result(done.listener, done.result.as_deref());
        self.platform.end_runtime();

        if let Err(e) = outcome {
            self.report_script_error(&e);
        }
    }

    // --- Resources ---

    /// The resource cache, read-only.
    pub fn resources(&self) -> &ResourceCache<ResourceHandle> {
        &self.resources
    }

    /// The handle registered under `key`.
    pub fn lookup_resource(&self, key: &str) -> Option<ResourceHandle> {
        self.resources.lookup(key).cloned()
    }

    /// Registers `resource` under `key`, or removes the entry with `None`.
    pub fn set_resource(&mut self, resource: Option<ResourceHandle>, key: &str) -> Option<ResourceId> {
        self.resources.set_resource(resource, key)
    }

    /// Moves `id` to the front of the MRU order.
    pub fn mark_recently_used(&mut self, id: ResourceId) -> bool {
        self.resources.touch(id)
    }

    /// Adds a reference to a cached resource.
    pub fn retain_resource(&mut self, id: ResourceId) -> bool {
        self.resources.retain(id)
    }

    /// Drops a reference; at zero the resource leaves the cache.
    pub fn release_resource(&mut self, id: ResourceId) -> Option<ResourceHandle> {
        self.resources.release(id)
    }

    // --- Display pass-throughs ---

    /// Changes the content orientation.
    pub fn set_content_orientation(&mut self, orientation: DeviceOrientation) {
        self.orientation = orientation;
        if let Some(display) = self.display.as_mut() {
            display.set_content_orientation(orientation);
        }
    }

    /// The host surface rotated.
    pub fn window_did_rotate(&mut self, orientation: DeviceOrientation, supported: bool) {
        if let Some(display) = self.display.as_mut() {
            display.window_did_rotate(orientation, supported);
        }
    }

    /// The host surface was resized.
    pub fn window_size_changed(&mut self) {
        if let Some(display) = self.display.as_mut() {
            display.window_size_changed();
        }
    }

    /// Recreates the renderer.
    pub fn restart_renderer(&mut self) {
        if let Some(display) = self.display.as_mut() {
            display.restart();
        }
    }

    /// Frees GPU-side resources, typically before going to the background.
    pub fn unload_resources(&mut self) {
        if let Some(display) = self.display.as_mut() {
            display.unload_resources();
        }
    }

    /// Restores what [`unload_resources`](Self::unload_resources) freed.
    pub fn reload_resources(&mut self) {
        if let Some(display) = self.display.as_mut() {
            display.reload_resources();
        }
    }

    /// Visible content width, `0` without a display.
    pub fn viewable_content_width(&self) -> i32 {
        self.display
            .as_ref()
            .map_or(0, |display| display.viewable_content_width())
    }

    /// Visible content height, `0` without a display.
    pub fn viewable_content_height(&self) -> i32 {
        self.display
            .as_ref()
            .map_or(0, |display| display.viewable_content_height())
    }

    /// Asks the script context for a full garbage collection.
    pub fn collect(&mut self) {
        if let Some(script) = self.script.as_mut() {
            script.collect();
        }
    }

    // --- Teardown ---

    /// Tears the runtime down. Equivalent to dropping it.
    pub fn destroy(self) {
        drop(self);
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        log::info!("Runtime shutting down...");

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.will_destroy();
        }
        self.dispatch_system_event(SystemEvent::AppExit, EventScope::Application);

        if let Some(mut audio) = self.audio.take() {
            audio.runtime_will_terminate();
        }
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }

        if let Some(display) = self.display.as_mut() {
            display.teardown();
        }
        if let Some(mut script) = self.script.take() {
            script.delete();
        }
        self.properties
            .remove(RuntimeProperties::APPLICATION_EXECUTING);

        if let Some(physics) = self.physics.as_mut() {
            physics.will_destroy_display();
        }
        self.display = None;
        if let Some(mut physics) = self.physics.take() {
            physics.stop_world();
        }

        #[cfg(feature = "simulator")]
        if let Some(mut jobs) = self.jobs.take() {
            jobs.discard();
        }

        let released = self.resources.clear();
        log::debug!("Released {} cached resources.", released.len());

        self.destroyed = true;
        log::info!("Runtime destroyed after {} frames.", self.frame);
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("phase", &self.phase())
            .field("suspend_state", &self.suspend_state)
            .field("properties", &self.properties)
            .field("frame", &self.frame)
            .field("fps", &self.fps)
            .field("clock", &self.clock)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{LoadParameters, LoadResult};
    use crate::testing::Harness;

    fn loaded(harness: &Harness) -> Runtime {
        let mut runtime = harness.builder().delegate(harness.delegate(true)).build();
        assert_eq!(
            runtime.load_application(&LoadParameters::default()),
            LoadResult::Success
        );
        runtime
    }

    #[test]
    fn begin_run_loop_starts_everything_then_ticks() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        harness.clear();

        runtime.begin_run_loop();
        harness.assert_order(&[
            "physics.initialize 0.0333",
            "display.start",
            "timer.interval 33",
            "timer.start",
            "physics.step",
            "display.update",
            "display.render",
        ]);
        assert_eq!(runtime.frame(), 1);
        assert_eq!(runtime.phase(), RuntimePhase::Running);
        assert_eq!(runtime.suspend_state(), SuspendState::Running);
    }

    #[test]
    fn timer_starts_only_once() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);

        runtime.begin_run_loop();
        runtime.begin_run_loop();
        assert_eq!(harness.timer.lock().unwrap().starts, 1);
        assert_eq!(runtime.frame(), 2);
    }

    #[test]
    fn deferred_update_skips_the_first_tick() {
        let harness = Harness::new();
        let mut runtime = harness
            .builder()
            .property(RuntimeProperties::DEFER_UPDATE, true)
            .build();
        runtime.load_application(&LoadParameters::default());

        runtime.begin_run_loop();
        assert_eq!(runtime.frame(), 0);
        assert!(!harness.contains("display.update"));
        assert_eq!(runtime.pending_tasks(), 1);
    }

    #[test]
    fn render_async_leaves_rendering_to_the_host() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        runtime.set_property(RuntimeProperties::RENDER_ASYNC, true);

        runtime.begin_run_loop();
        assert!(harness.contains("display.update"));
        assert!(!harness.contains("display.render"));

        runtime.render();
        assert_eq!(harness.count("display.render"), 1);
    }

    #[test]
    fn pump_ticks_when_the_timer_fires() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        runtime.begin_run_loop();

        assert!(!runtime.pump());
        assert_eq!(runtime.frame(), 1);

        harness.timer.lock().unwrap().fires = 2;
        assert!(runtime.pump());
        assert!(runtime.pump());
        assert!(!runtime.pump());
        assert_eq!(runtime.frame(), 3);
    }

    #[test]
    fn tasks_queued_during_a_tick_run_on_the_next() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        runtime.begin_run_loop();

        runtime
            .schedule(|rt: &mut Runtime| {
                rt.set_property(RuntimeProperties::ORIENTATION_LOCKED, true);
                rt.schedule(|rt: &mut Runtime| rt.collect()).unwrap();
            })
            .unwrap();

        runtime.tick();
        assert!(runtime.properties().contains(RuntimeProperties::ORIENTATION_LOCKED));
        assert!(!harness.contains("script.collect"));
        assert_eq!(runtime.pending_tasks(), 1);

        runtime.tick();
        assert!(harness.contains("script.collect"));
        assert_eq!(runtime.pending_tasks(), 0);
    }

    #[test]
    fn suspending_during_the_drain_skips_the_frame() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        runtime.begin_run_loop();
        harness.clear();

        runtime.schedule(|rt: &mut Runtime| rt.suspend()).unwrap();
        runtime.tick();

        assert_eq!(runtime.frame(), 1);
        assert!(runtime.is_suspended());
        assert!(!harness.contains("display.update"));
        assert!(!harness.contains("display.render"));
        assert!(!harness.contains("physics.step"));
    }

    #[test]
    fn ticking_an_already_suspended_runtime_still_draws() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        runtime.begin_run_loop();
        runtime.suspend();
        harness.clear();

        runtime.tick();

        assert!(runtime.is_suspended());
        assert_eq!(runtime.frame(), 2);
        harness.assert_order(&["display.update", "display.render"]);
    }

    #[test]
    fn physics_steps_with_application_time() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        runtime.begin_run_loop();

        harness.time.advance_ms(100);
        runtime.suspend();
        harness.time.advance_ms(1_000);
        assert_eq!(runtime.elapsed(), Duration::from_millis(100));

        runtime.resume();
        harness.time.advance_ms(50);
        assert_eq!(runtime.elapsed(), Duration::from_millis(150));
        assert_eq!(runtime.elapsed_ms(), 150.0);
    }

    #[test]
    fn system_events_wait_for_the_application() {
        let harness = Harness::new();
        let mut runtime = harness.builder().build();

        runtime.on_system_event(SystemEvent::AppResume);
        assert!(!harness.contains("script.event applicationResume Application"));
        assert!(runtime.events().is_empty());

        runtime.load_application(&LoadParameters::default());
        runtime.on_system_event(SystemEvent::AppResume);
        assert!(harness.contains("script.event applicationResume Application"));
        assert_eq!(
            runtime.events().drain(),
            vec![RuntimeEvent::System {
                event: SystemEvent::AppResume,
                scope: EventScope::Application,
            }]
        );
    }

    #[test]
    fn resources_are_owned_by_the_runtime() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);

        let atlas: ResourceHandle = Arc::new(String::from("atlas"));
        let font: ResourceHandle = Arc::new(42u32);
        let atlas_id = runtime.set_resource(Some(atlas), "atlas").unwrap();
        runtime.set_resource(Some(font), "font");

        let found = runtime.lookup_resource("atlas").unwrap();
        assert_eq!(found.downcast_ref::<String>().map(String::as_str), Some("atlas"));

        assert!(runtime.mark_recently_used(atlas_id));
        let order: Vec<_> = runtime.resources().iter_mru().map(|(id, _)| id).collect();
        assert_eq!(order.first(), Some(&atlas_id));

        runtime.set_resource(None, "font");
        assert!(runtime.lookup_resource("font").is_none());

        assert!(runtime.retain_resource(atlas_id));
        assert!(runtime.release_resource(atlas_id).is_none());
        assert!(runtime.release_resource(atlas_id).is_some());
        assert!(runtime.lookup_resource("atlas").is_none());
    }

    #[test]
    fn display_pass_throughs() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        harness.clear();

        runtime.set_content_orientation(DeviceOrientation::SidewaysRight);
        runtime.window_did_rotate(DeviceOrientation::SidewaysRight, true);
        runtime.window_size_changed();
        runtime.unload_resources();
        runtime.reload_resources();
        runtime.restart_renderer();

        assert_eq!(
            harness.entries(),
            vec![
                "display.orientation SidewaysRight",
                "display.rotate SidewaysRight true",
                "display.resize",
                "display.unload",
                "display.reload",
                "display.restart",
            ]
        );
    }

    #[test]
    fn destroy_tears_down_in_order() {
        let harness = Harness::new();
        let mut runtime = loaded(&harness);
        runtime.begin_run_loop();
        runtime.set_resource(Some(Arc::new(1u8)), "one");
        harness.clear();

        runtime.destroy();
        assert_eq!(
            harness.entries(),
            vec![
                "delegate.will_destroy",
                "script.event applicationExit Application",
                "audio.terminate",
                "timer.stop",
                "display.teardown",
                "script.delete",
                "physics.will_destroy_display",
                "physics.stop",
            ]
        );
        assert!(harness.script.lock().unwrap().deleted);
    }

    #[test]
    fn destroying_an_unloaded_runtime_skips_the_exit_event() {
        let harness = Harness::new();
        let runtime = harness.builder().build();
        drop(runtime);

        assert!(!harness.contains("script.event applicationExit Application"));
        assert!(harness.contains("display.teardown"));
        assert!(harness.contains("script.delete"));
    }

    #[cfg(feature = "simulator")]
    #[test]
    fn background_job_result_reaches_the_listener_on_a_later_tick() {
        use kestrel_core::script::ScriptListener;
        use std::time::Instant;

        let harness = Harness::new();
        let mut runtime = harness
            .builder()
            .job_runner(Arc::new(|arg: &str| Some(format!("collected {arg}"))))
            .build();
        runtime.load_application(&LoadParameters::default());
        runtime.begin_run_loop();

        let started = runtime.start_background_job("plugins", Some(ScriptListener(5)));
        assert_eq!(started, Some(JobResult::Pending));

        let deadline = Instant::now() + Duration::from_secs(5);
        while !harness.contains("script.job 5 Some(\"collected plugins\")") {
            assert!(Instant::now() < deadline, "job result never delivered");
            std::thread::sleep(Duration::from_millis(1));
            runtime.tick();
        }
        assert!(runtime.events().drain().contains(&RuntimeEvent::JobFinished {
            result: Some("collected plugins".into())
        }));
    }

    #[cfg(feature = "simulator")]
    #[test]
    fn background_job_without_listener_blocks() {
        let harness = Harness::new();
        let mut runtime = harness
            .builder()
            .job_runner(Arc::new(|_: &str| None))
            .build();

        assert_eq!(
            runtime.start_background_job("plugins", None),
            Some(JobResult::Completed(None))
        );
    }

    #[cfg(feature = "simulator")]
    #[test]
    fn background_jobs_need_a_runner() {
        let harness = Harness::new();
        let mut runtime = harness.builder().build();
        assert_eq!(runtime.start_background_job("plugins", None), None);
    }
}
