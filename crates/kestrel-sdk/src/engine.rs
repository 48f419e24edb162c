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

//! Engine assembly and the blocking frame loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use kestrel_core::delegate::RuntimeDelegate;
use kestrel_core::platform::{DeviceOrientation, Directory};
use kestrel_core::script::{LaunchArgs, ScriptListener};
use kestrel_core::time::{SystemTimeSource, TimeSource};
use kestrel_infra::audio::{InterruptionHandle, SilentAudioPlayer};
use kestrel_infra::display::{FrameCounter, HeadlessDisplay};
use kestrel_infra::physics::FixedStepPhysics;
use kestrel_infra::platform::HostEnvironment;
use kestrel_infra::script::{NativeJob, NativeScope, NativeScriptContext};
use kestrel_runtime::{
    JobResult, LaunchOptions, LoadParameters, LoadResult, Runtime, RuntimeProperties,
};

/// How long the loop sleeps when the frame timer has not fired.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Collects everything needed to launch an application.
pub struct EngineBuilder {
    resource_dir: PathBuf,
    system_resource_dir: Option<PathBuf>,
    script: NativeScriptContext,
    job: Option<NativeJob>,
    delegate: Option<Box<dyn RuntimeDelegate>>,
    params: LoadParameters,
    surface: (i32, i32),
    launch_args: LaunchArgs,
    properties: Vec<(RuntimeProperties, bool)>,
    time_source: Arc<dyn TimeSource>,
}

impl EngineBuilder {
    /// Starts a builder for the application stored in `resource_dir`.
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            system_resource_dir: None,
            script: NativeScriptContext::new(),
            job: None,
            delegate: None,
            params: LoadParameters::default(),
            surface: (320, 480),
            launch_args: LaunchArgs::new(),
            properties: Vec::new(),
            time_source: Arc::new(SystemTimeSource::new()),
        }
    }

    /// Where packaged archives are looked up. Defaults to the resource dir.
    pub fn system_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_resource_dir = Some(dir.into());
        self
    }

    /// Registers the chunk run for files named `stem` (`"main"` for the entry point).
    pub fn chunk(
        mut self,
        stem: impl Into<String>,
        chunk: impl FnMut(&mut NativeScope<'_>, &LaunchArgs) -> Result<(), String> + 'static,
    ) -> Self {
        self.script = self.script.with_chunk(stem, chunk);
        self
    }

    /// Registers a callback for background job results and returns the
    /// listener to pass to [`Engine::start_job`].
    pub fn add_job_listener(
        &mut self,
        callback: impl FnMut(Option<&str>) -> Result<(), String> + 'static,
    ) -> ScriptListener {
        self.script.add_job_listener(callback)
    }

    /// Routes background jobs named `name` to `handler`.
    pub fn job_handler(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        let job = self.job.take().unwrap_or_default();
        self.job = Some(job.with_handler(name, handler));
        self
    }

    /// Installs lifecycle hooks.
    pub fn delegate(mut self, delegate: impl RuntimeDelegate + 'static) -> Self {
        self.delegate = Some(Box::new(delegate));
        self
    }

    /// Adds launch options.
    pub fn launch_options(mut self, options: LaunchOptions) -> Self {
        self.params.launch_options |= options;
        self
    }

    /// Adds an argument handed to the main chunk.
    pub fn launch_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.launch_args.insert(key.into(), value.into());
        self
    }

    /// Initial content orientation.
    pub fn orientation(mut self, orientation: DeviceOrientation) -> Self {
        self.params.orientation = orientation;
        self
    }

    /// Overrides the configured content size.
    pub fn content_size(mut self, width: i32, height: i32) -> Self {
        self.params.content_width = width;
        self.params.content_height = height;
        self
    }

    /// Size of the headless surface.
    pub fn surface_size(mut self, width: i32, height: i32) -> Self {
        self.surface = (width, height);
        self
    }

    /// Forces a runtime property on or off before loading.
    pub fn property(mut self, property: RuntimeProperties, value: bool) -> Self {
        self.properties.push((property, value));
        self
    }

    /// Clock used by the runtime and its frame timer.
    pub fn time_source(mut self, source: Arc<dyn TimeSource>) -> Self {
        self.time_source = source;
        self
    }

    /// Builds, loads and starts the application.
    pub fn launch(self) -> Result<Engine> {
        Engine::launch(self)
    }
}

/// A loaded application and the loop that drives it.
pub struct Engine {
    runtime: Runtime,
    frames: FrameCounter,
    interruption: InterruptionHandle,
}

impl Engine {
    /// Builds the runtime from `builder`, loads the application and begins
    /// the run loop.
    pub fn launch(builder: EngineBuilder) -> Result<Self> {
        log::info!(
            "Kestrel SDK: launching application from {}",
            builder.resource_dir.display()
        );

        let mut host = HostEnvironment::new(&builder.resource_dir)
            .with_time_source(builder.time_source.clone());
        if let Some(dir) = builder.system_resource_dir {
            host = host.with_directory(Directory::SystemResource, dir);
        }

        let display = HeadlessDisplay::new(builder.surface.0, builder.surface.1);
        let frames = display.frame_counter();
        let audio = SilentAudioPlayer::new();
        let interruption = audio.interruption_handle();

        let mut runtime_builder = Runtime::builder(Box::new(host))
            .script(Box::new(builder.script))
            .display(Box::new(display))
            .audio(Box::new(audio))
            .physics(Box::new(FixedStepPhysics::new()))
            .time_source(builder.time_source);
        if let Some(delegate) = builder.delegate {
            runtime_builder = runtime_builder.delegate(delegate);
        }
        if let Some(job) = builder.job {
            runtime_builder = runtime_builder.job_runner(Arc::new(job));
        }
        for (key, value) in builder.launch_args {
            runtime_builder = runtime_builder.launch_arg(key, value);
        }
        for (property, value) in builder.properties {
            runtime_builder = runtime_builder.property(property, value);
        }

        let mut runtime = runtime_builder.build();
        match runtime.load_application(&builder.params) {
            LoadResult::Success => {}
            other => bail!("application failed to load ({other:?}, code {})", other.code()),
        }
        runtime.begin_run_loop();

        Ok(Self {
            runtime,
            frames,
            interruption,
        })
    }

    /// The underlying runtime.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// The underlying runtime, mutably.
    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    /// Frames the display actually rendered.
    pub fn rendered_frames(&self) -> u64 {
        self.frames.get()
    }

    /// Drives the loop for `duration` of wall time or until the application
    /// asks to exit. Returns the number of ticks taken.
    pub fn run_for(&mut self, duration: Duration) -> u64 {
        let deadline = Instant::now() + duration;
        let mut ticks = 0;
        while Instant::now() < deadline && !self.runtime.is_exit_requested() {
            if self.runtime.pump() {
                ticks += 1;
            } else {
                std::thread::sleep(IDLE_SLEEP);
            }
        }
        ticks
    }

    /// Drives the loop until `count` more frames ran.
    ///
    /// Stops early when the application asks to exit or is suspended, since
    /// neither will produce frames.
    pub fn run_frames(&mut self, count: u64) -> u64 {
        let target = self.runtime.frame() + count;
        while self.runtime.frame() < target {
            if self.runtime.is_exit_requested() || self.runtime.is_suspended() {
                break;
            }
            if !self.runtime.pump() {
                std::thread::sleep(IDLE_SLEEP);
            }
        }
        count - target.saturating_sub(self.runtime.frame())
    }

    /// Sends the application to the background.
    pub fn suspend(&mut self) {
        self.runtime.suspend();
    }

    /// Brings the application back.
    pub fn resume(&mut self) {
        self.runtime.resume();
    }

    /// Simulates the system taking the audio session away.
    pub fn interrupt_audio(&self) {
        self.interruption.begin();
    }

    /// `true` while an audio interruption has not been recovered.
    pub fn audio_interrupted(&self) -> bool {
        self.interruption.is_active()
    }

    /// Starts a background job; see [`Runtime::start_background_job`].
    pub fn start_job(
        &mut self,
        argument: &str,
        listener: Option<ScriptListener>,
    ) -> Result<JobResult> {
        match self.runtime.start_background_job(argument, listener) {
            Some(result) => Ok(result),
            None => bail!("no background job handlers registered"),
        }
    }

    /// Tears the application down.
    pub fn shutdown(self) {
        log::info!("Kestrel SDK: shutting down after {} frames", self.runtime.frame());
        self.runtime.destroy();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("runtime", &self.runtime)
            .field("rendered_frames", &self.frames.get())
            .finish()
    }
}
