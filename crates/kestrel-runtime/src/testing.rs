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

//! Recording collaborators shared by the runtime's tests.
//!
//! Every fake appends to one journal so tests can assert cross-subsystem
//! ordering. Probes expose the state a test needs to poke or inspect.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use kestrel_core::audio::{AudioPlayer, AudioSettings};
use kestrel_core::config::ApplicationConfig;
use kestrel_core::delegate::RuntimeDelegate;
use kestrel_core::display::{DisplaySettings, DisplaySubsystem};
use kestrel_core::event::{EventScope, SystemEvent};
use kestrel_core::physics::PhysicsWorld;
use kestrel_core::platform::{
    DeviceOrientation, Directory, PathFlags, PlatformEnvironment, PlatformError, PlatformTimer,
};
use kestrel_core::script::{
    BootstrapChunk, BootstrapOutcome, LaunchArgs, ScriptContext, ScriptError, ScriptListener,
};
use kestrel_core::time::ManualTimeSource;

use crate::properties::RuntimeProperties;
use crate::runtime::{Runtime, RuntimeBuilder};

pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

#[derive(Debug, Default)]
pub(crate) struct TimerProbe {
    pub running: bool,
    pub starts: u32,
    pub stops: u32,
    pub interval_ms: u32,
    pub fires: u32,
}

#[derive(Debug, Default)]
pub(crate) struct AudioProbe {
    pub attached: bool,
    pub suspended: bool,
    pub interrupted: bool,
}

#[derive(Debug)]
pub(crate) struct ScriptProbe {
    pub fail_main: bool,
    pub bootstrap: BootstrapOutcome,
    pub deleted: bool,
}

impl Default for ScriptProbe {
    fn default() -> Self {
        Self {
            fail_main: false,
            bootstrap: BootstrapOutcome::ScheduleMain,
            deleted: false,
        }
    }
}

struct FakePlatform {
    journal: Journal,
    root: PathBuf,
    timer: Option<Arc<Mutex<TimerProbe>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl PlatformEnvironment for FakePlatform {
    fn path_for_file(&self, filename: &str, directory: Directory, flags: PathFlags) -> Option<PathBuf> {
        let dir = match directory {
            Directory::Resource => self.root.join("resources"),
            Directory::SystemResource => self.root.join("system"),
            Directory::Documents => self.root.join("documents"),
            Directory::Temporary => self.root.join("tmp"),
        };
        let path = dir.join(filename);
        if flags.contains(PathFlags::TEST_FILE_EXISTS) && !path.exists() {
            return None;
        }
        Some(path)
    }

    fn suspend(&mut self) {
        record(&self.journal, "platform.suspend");
    }

    fn resume(&mut self) {
        record(&self.journal, "platform.resume");
    }

    fn create_timer(&mut self) -> Option<Box<dyn PlatformTimer>> {
        let probe = self.timer.clone()?;
        Some(Box::new(FakeTimer {
            journal: Arc::clone(&self.journal),
            probe,
        }))
    }

    fn raise_error(&self, error: &PlatformError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

struct FakeTimer {
    journal: Journal,
    probe: Arc<Mutex<TimerProbe>>,
}

impl PlatformTimer for FakeTimer {
    fn start(&mut self) {
        let mut probe = self.probe.lock().unwrap();
        probe.running = true;
        probe.starts += 1;
        record(&self.journal, "timer.start");
    }

    fn stop(&mut self) {
        let mut probe = self.probe.lock().unwrap();
        probe.running = false;
        probe.stops += 1;
        record(&self.journal, "timer.stop");
    }

    fn set_interval(&mut self, interval_ms: u32) {
        self.probe.lock().unwrap().interval_ms = interval_ms;
        record(&self.journal, format!("timer.interval {interval_ms}"));
    }

    fn interval_ms(&self) -> u32 {
        self.probe.lock().unwrap().interval_ms
    }

    fn is_running(&self) -> bool {
        self.probe.lock().unwrap().running
    }

    fn poll(&mut self) -> bool {
        let mut probe = self.probe.lock().unwrap();
        if probe.running && probe.fires > 0 {
            probe.fires -= 1;
            true
        } else {
            false
        }
    }
}

struct FakeDisplay {
    journal: Journal,
    size: (i32, i32),
}

impl DisplaySubsystem for FakeDisplay {
    fn initialize(&mut self, settings: &DisplaySettings) -> bool {
        self.size = (settings.content_width, settings.content_height);
        record(
            &self.journal,
            format!(
                "display.initialize {}x{} aa={} {:?}",
                settings.content_width, settings.content_height, settings.antialias, settings.orientation
            ),
        );
        true
    }

    fn start(&mut self) {
        record(&self.journal, "display.start");
    }

    fn update(&mut self) {
        record(&self.journal, "display.update");
    }

    fn render(&mut self) {
        record(&self.journal, "display.render");
    }

    fn teardown(&mut self) {
        record(&self.journal, "display.teardown");
    }

    fn set_content_orientation(&mut self, orientation: DeviceOrientation) {
        record(&self.journal, format!("display.orientation {orientation:?}"));
    }

    fn window_did_rotate(&mut self, orientation: DeviceOrientation, supported: bool) {
        record(&self.journal, format!("display.rotate {orientation:?} {supported}"));
    }

    fn window_size_changed(&mut self) {
        record(&self.journal, "display.resize");
    }

    fn restart(&mut self) {
        record(&self.journal, "display.restart");
    }

    fn unload_resources(&mut self) {
        record(&self.journal, "display.unload");
    }

    fn reload_resources(&mut self) {
        record(&self.journal, "display.reload");
    }

    fn viewable_content_width(&self) -> i32 {
        self.size.0
    }

    fn viewable_content_height(&self) -> i32 {
        self.size.1
    }
}

struct FakeAudio {
    journal: Journal,
    probe: Arc<Mutex<AudioProbe>>,
}

impl AudioPlayer for FakeAudio {
    fn configure(&mut self, settings: &AudioSettings) {
        record(
            &self.journal,
            format!("audio.configure {:?} {:?}", settings.play_frequency, settings.max_sources),
        );
    }

    fn attach(&mut self) {
        self.probe.lock().unwrap().attached = true;
        record(&self.journal, "audio.attach");
    }

    fn suspend(&mut self) {
        self.probe.lock().unwrap().suspended = true;
        record(&self.journal, "audio.suspend");
    }

    fn resume(&mut self) {
        self.probe.lock().unwrap().suspended = false;
        record(&self.journal, "audio.resume");
    }

    fn is_suspended(&self) -> bool {
        self.probe.lock().unwrap().suspended
    }

    fn is_in_interruption(&self) -> bool {
        self.probe.lock().unwrap().interrupted
    }

    fn end_interruption(&mut self) {
        self.probe.lock().unwrap().interrupted = false;
        record(&self.journal, "audio.end_interruption");
    }

    fn runtime_will_terminate(&mut self) {
        record(&self.journal, "audio.terminate");
    }
}

struct FakePhysics {
    journal: Journal,
}

impl PhysicsWorld for FakePhysics {
    fn initialize(&mut self, frame_interval: f64) {
        record(&self.journal, format!("physics.initialize {frame_interval:.4}"));
    }

    fn step_world(&mut self, _elapsed_ms: f64) {
        record(&self.journal, "physics.step");
    }

    fn will_destroy_display(&mut self) {
        record(&self.journal, "physics.will_destroy_display");
    }

    fn stop_world(&mut self) {
        record(&self.journal, "physics.stop");
    }
}

struct FakeScript {
    journal: Journal,
    probe: Arc<Mutex<ScriptProbe>>,
}

impl FakeScript {
    fn check(&self) -> Result<(), ScriptError> {
        if self.probe.lock().unwrap().deleted {
            Err(ScriptError::Deleted)
        } else {
            Ok(())
        }
    }
}

impl ScriptContext for FakeScript {
    fn initialize(&mut self) -> Result<(), ScriptError> {
        record(&self.journal, "script.initialize");
        Ok(())
    }

    fn do_file(&mut self, path: &Path, args: &LaunchArgs) -> Result<(), ScriptError> {
        self.check()?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        record(&self.journal, format!("script.do_file {name} args={}", args.len()));
        if self.probe.lock().unwrap().fail_main {
            return Err(ScriptError::Runtime {
                chunk: name,
                message: "boom".into(),
            });
        }
        Ok(())
    }

    fn do_archive_resource(&mut self, _archive: &Path, name: &str, _args: &LaunchArgs) -> Result<(), ScriptError> {
        self.check()?;
        record(&self.journal, format!("script.do_archive {name}"));
        Ok(())
    }

    fn do_buffer(&mut self, chunk: &BootstrapChunk) -> Result<BootstrapOutcome, ScriptError> {
        self.check()?;
        record(&self.journal, format!("script.do_buffer {}", chunk.name));
        Ok(self.probe.lock().unwrap().bootstrap)
    }

    fn dispatch_event(&mut self, event: SystemEvent, scope: EventScope) -> Result<(), ScriptError> {
        self.check()?;
        record(&self.journal, format!("script.event {event} {scope:?}"));
        Ok(())
    }

    fn dispatch_job_result(&mut self, listener: ScriptListener, result: Option<&str>) -> Result<(), ScriptError> {
        self.check()?;
        record(&self.journal, format!("script.job {} {result:?}", listener.0));
        Ok(())
    }

    fn collect(&mut self) {
        record(&self.journal, "script.collect");
    }

    fn delete(&mut self) {
        self.probe.lock().unwrap().deleted = true;
        record(&self.journal, "script.delete");
    }
}

pub(crate) struct FakeDelegate {
    journal: Journal,
    pub dependencies_ok: bool,
}

impl RuntimeDelegate for FakeDelegate {
    fn initialize_config(&mut self, _config: &mut ApplicationConfig) {
        record(&self.journal, "delegate.initialize_config");
    }

    fn will_load_config(&mut self, _config: &ApplicationConfig) {
        record(&self.journal, "delegate.will_load_config");
    }

    fn did_load_config(&mut self, _config: &ApplicationConfig) {
        record(&self.journal, "delegate.did_load_config");
    }

    fn has_dependencies(&self) -> bool {
        self.dependencies_ok
    }

    fn will_load_main(&mut self) {
        record(&self.journal, "delegate.will_load_main");
    }

    fn did_load_main(&mut self) {
        record(&self.journal, "delegate.did_load_main");
    }

    fn will_suspend(&mut self) {
        record(&self.journal, "delegate.will_suspend");
    }

    fn did_suspend(&mut self) {
        record(&self.journal, "delegate.did_suspend");
    }

    fn will_resume(&mut self) {
        record(&self.journal, "delegate.will_resume");
    }

    fn did_resume(&mut self) {
        record(&self.journal, "delegate.did_resume");
    }

    fn will_destroy(&mut self) {
        record(&self.journal, "delegate.will_destroy");
    }
}

/// A fully faked runtime environment rooted in a temporary directory.
pub(crate) struct Harness {
    pub journal: Journal,
    pub time: ManualTimeSource,
    pub timer: Arc<Mutex<TimerProbe>>,
    pub audio: Arc<Mutex<AudioProbe>>,
    pub script: Arc<Mutex<ScriptProbe>>,
    pub errors: Arc<Mutex<Vec<String>>>,
    root: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("temp dir");
        for dir in ["resources", "system", "documents", "tmp"] {
            fs::create_dir_all(root.path().join(dir)).expect("create dir");
        }
        let harness = Self {
            journal: Journal::default(),
            time: ManualTimeSource::new(),
            timer: Arc::default(),
            audio: Arc::default(),
            script: Arc::default(),
            errors: Arc::default(),
            root,
        };
        harness.write_resource("main.lua", "-- entry point");
        harness
    }

    pub fn write_resource(&self, name: &str, contents: &str) {
        fs::write(self.root.path().join("resources").join(name), contents).expect("write resource");
    }

    pub fn write_system(&self, name: &str, contents: &str) {
        fs::write(self.root.path().join("system").join(name), contents).expect("write system file");
    }

    pub fn write_config(&self, json: &str) {
        self.write_resource("config.json", json);
    }

    fn platform(&self, with_timer: bool) -> Box<FakePlatform> {
        Box::new(FakePlatform {
            journal: Arc::clone(&self.journal),
            root: self.root.path().to_path_buf(),
            timer: with_timer.then(|| Arc::clone(&self.timer)),
            errors: Arc::clone(&self.errors),
        })
    }

    /// A builder with only the platform (and its timer) installed.
    pub fn bare_builder(&self, with_timer: bool) -> RuntimeBuilder {
        Runtime::builder(self.platform(with_timer))
            .time_source(Arc::new(self.time.clone()))
            .property(RuntimeProperties::APPLICATION_NOT_ARCHIVED, true)
            .property(RuntimeProperties::SHOW_RUNTIME_ERRORS, true)
    }

    /// A builder with every collaborator faked.
    pub fn builder(&self) -> RuntimeBuilder {
        self.bare_builder(true)
            .script(Box::new(FakeScript {
                journal: Arc::clone(&self.journal),
                probe: Arc::clone(&self.script),
            }))
            .display(Box::new(FakeDisplay {
                journal: Arc::clone(&self.journal),
                size: (0, 0),
            }))
            .audio(Box::new(FakeAudio {
                journal: Arc::clone(&self.journal),
                probe: Arc::clone(&self.audio),
            }))
            .physics(Box::new(FakePhysics {
                journal: Arc::clone(&self.journal),
            }))
    }

    pub fn delegate(&self, dependencies_ok: bool) -> Box<FakeDelegate> {
        Box::new(FakeDelegate {
            journal: Arc::clone(&self.journal),
            dependencies_ok,
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.journal.lock().unwrap().clear();
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    /// Index of the first `entry`, panicking when it is missing.
    pub fn position(&self, entry: &str) -> usize {
        let entries = self.entries();
        entries
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("'{entry}' not in journal: {entries:#?}"))
    }

    /// Asserts that `expected` appear in the journal in this relative order.
    pub fn assert_order(&self, expected: &[&str]) {
        let positions: Vec<usize> = expected.iter().map(|e| self.position(e)).collect();
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "out of order: {expected:?} at {positions:?} in {:#?}",
            self.entries()
        );
    }
}
