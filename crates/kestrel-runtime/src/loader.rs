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

//! Loading an application: archive resolution, configuration, subsystem
//! initialization and the main task.

use kestrel_core::audio::AudioSettings;
use kestrel_core::config::ApplicationConfig;
use kestrel_core::display::DisplaySettings;
use kestrel_core::event::{EventScope, SystemEvent};
use kestrel_core::platform::{Directory, PathFlags};
use kestrel_core::script::BootstrapOutcome;

use crate::error::RuntimeError;
use crate::properties::{LaunchOptions, LoadParameters, LoadResult, RuntimeProperties};
use crate::runtime::{Runtime, ARCHIVE_FILE, CONFIG_FILE, DEFAULT_FPS, HIGH_FPS};

impl Runtime {
    /// Loads the application.
    ///
    /// Reads `config.json` (defaults when absent or malformed), applies the
    /// content-size override from `params`, initializes the display, then
    /// audio unless disabled, then either runs the bootstrap shell or
    /// schedules the main file for the next tick.
    ///
    /// [`RuntimeProperties::APPLICATION_LOADED`] is raised only on success.
    ///
    /// Without a [`RuntimeDelegate`](kestrel_core::RuntimeDelegate) the
    /// dependency check passes and loading proceeds. Hosts that must refuse
    /// unlicensed applications have to install a delegate whose
    /// `has_dependencies` says so; otherwise nothing fails the load.
    pub fn load_application(&mut self, params: &LoadParameters) -> LoadResult {
        if self.properties.contains(RuntimeProperties::APPLICATION_LOADED) {
            log::warn!("Application is already loaded.");
            return LoadResult::GeneralFailure;
        }
        self.load_attempted = true;
        log::info!("Loading application ({:?}).", params.launch_options);

        if !self.properties.contains(RuntimeProperties::APPLICATION_NOT_ARCHIVED) {
            match self
                .platform
                .path_for_file(ARCHIVE_FILE, Directory::SystemResource, PathFlags::TEST_FILE_EXISTS)
            {
                Some(archive) => self.archive = Some(archive),
                None => {
                    log::error!("Application archive '{ARCHIVE_FILE}' not found.");
                    return LoadResult::GeneralFailure;
                }
            }
        }

        if let Some(script) = self.script.as_mut() {
            if let Err(e) = script.initialize() {
                log::error!("Failed to initialize the script context: {e}");
                return LoadResult::GeneralFailure;
            }
        }

        let mut config = self.read_config();
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.initialize_config(&mut config);
        }
        if let Some((width, height)) = params.content_size() {
            log::debug!("Content size overridden to {width}x{height}.");
            config.content.width = width;
            config.content.height = height;
        }
        self.apply_config(&config);

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.will_load_config(&config);
        }

        self.orientation = params.orientation;
        let settings = DisplaySettings {
            content_width: config.content.width,
            content_height: config.content.height,
            antialias: config.content.multisample,
            orientation: params.orientation,
            backend: self.backend.clone(),
        };
        if let Some(display) = self.display.as_mut() {
            if !display.initialize(&settings) {
                log::warn!("Display failed to initialize; continuing without one.");
                self.display = None;
            }
        }

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_load_config(&config);
        }

        self.init_audio(&config, params.launch_options);
        self.properties.set(
            RuntimeProperties::DEBUGGER_CONNECTED,
            params
                .launch_options
                .contains(LaunchOptions::CONNECT_TO_DEBUGGER),
        );
        self.config = config;

        let result = if self.delegate.as_ref().map_or(true, |d| d.has_dependencies()) {
            self.start_application(params.launch_options)
        } else {
            log::error!("Dependency check failed; refusing to run the application.");
            LoadResult::SecurityIssue
        };

        if result.is_success() {
            self.properties.insert(RuntimeProperties::APPLICATION_LOADED);
            log::info!("Application loaded at {} fps.", self.fps);
        }
        result
    }

    /// Queues the main file for the next tick.
    ///
    /// Called by [`load_application`](Self::load_application), and by hosts
    /// whose bootstrap shell deferred main.
    pub fn schedule_main(&mut self) {
        let queued = self.schedule(|runtime: &mut Runtime| {
            if let Err(e) = runtime.load_main() {
                runtime.report_main_error(e);
            }
        });
        if let Err(e) = queued {
            log::error!("Could not schedule main: {e}");
        }
    }

    fn start_application(&mut self, options: LaunchOptions) -> LoadResult {
        if !options.contains(LaunchOptions::LAUNCH_DEVICE_SHELL) {
            self.schedule_main();
            return LoadResult::Success;
        }

        let Some(chunk) = self.bootstrap.take() else {
            log::warn!("Device shell requested without a bootstrap chunk; loading main.");
            self.schedule_main();
            return LoadResult::Success;
        };
        let Some(script) = self.script.as_mut() else {
            return LoadResult::GeneralFailure;
        };

        self.platform.begin_runtime();
        let outcome = script.do_buffer(&chunk);
        self.platform.end_runtime();

        match outcome {
            Ok(BootstrapOutcome::ScheduleMain) => {
                self.schedule_main();
                LoadResult::Success
            }
            Ok(BootstrapOutcome::Deferred) => {
                log::debug!("Bootstrap '{}' deferred main.", chunk.name);
                LoadResult::Success
            }
            Err(e) => {
                log::error!("Bootstrap '{}' failed: {e}", chunk.name);
                self.report_script_error(&e);
                LoadResult::GeneralFailure
            }
        }
    }

    fn load_main(&mut self) -> Result<(), RuntimeError> {
        self.properties
            .insert(RuntimeProperties::APPLICATION_EXECUTING);
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.will_load_main();
        }

        let outcome = self.run_main();

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_load_main();
        }
        self.dispatch_system_event(SystemEvent::AppStart, EventScope::Application);
        outcome
    }

    fn run_main(&mut self) -> Result<(), RuntimeError> {
        let Some(script) = self.script.as_mut() else {
            return Ok(());
        };

        let outcome = match self.archive.as_deref() {
            Some(archive) => {
                let name = self
                    .main_file
                    .rsplit_once('.')
                    .map_or(self.main_file.as_str(), |(stem, _)| stem);
                script.do_archive_resource(archive, name, &self.launch_args)
            }
            None => {
                let path = self
                    .platform
                    .path_for_file(&self.main_file, Directory::Resource, PathFlags::TEST_FILE_EXISTS)
                    .ok_or_else(|| RuntimeError::MainNotFound(self.main_file.clone()))?;
                log::info!("Running {}.", path.display());
                script.do_file(&path, &self.launch_args)
            }
        };
        outcome.map_err(RuntimeError::from)
    }

    fn report_main_error(&mut self, error: RuntimeError) {
        match error {
            RuntimeError::Script(e) => self.report_script_error(&e),
            other => log::error!("{other}"),
        }
    }

    fn read_config(&self) -> ApplicationConfig {
        match self.load_config_file() {
            Ok(Some(config)) => config,
            Ok(None) => {
                log::debug!("No {CONFIG_FILE}; using defaults.");
                ApplicationConfig::default()
            }
            Err(e) => {
                log::warn!("Ignoring {CONFIG_FILE}: {e}");
                ApplicationConfig::default()
            }
        }
    }

    fn load_config_file(&self) -> Result<Option<ApplicationConfig>, RuntimeError> {
        let Some(path) =
            self.platform
                .path_for_file(CONFIG_FILE, Directory::Resource, PathFlags::TEST_FILE_EXISTS)
        else {
            return Ok(None);
        };
        Ok(Some(ApplicationConfig::load(&path)?))
    }

    fn apply_config(&mut self, config: &ApplicationConfig) {
        if let Some(show) = config.show_runtime_errors {
            self.properties
                .set(RuntimeProperties::SHOW_RUNTIME_ERRORS, show);
            self.properties
                .insert(RuntimeProperties::SHOW_RUNTIME_ERRORS_SET);
        }

        // The frame rate is fixed once the application has loaded.
        if !self.properties.contains(RuntimeProperties::APPLICATION_LOADED) {
            self.fps = match config.content.fps {
                Some(requested) => supported_fps(requested).unwrap_or_else(|| {
                    log::warn!("Unsupported fps {requested}; using {DEFAULT_FPS}.");
                    DEFAULT_FPS
                }),
                None => DEFAULT_FPS,
            };
        }

        self.properties
            .set(RuntimeProperties::EXIT_ON_ERROR, config.content.exit_on_error);
    }

    fn init_audio(&mut self, config: &ApplicationConfig, options: LaunchOptions) {
        if options.contains(LaunchOptions::DISABLE_AUDIO) {
            if self.audio.take().is_some() {
                log::info!("Audio disabled by launch options.");
            }
            return;
        }

        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        let settings = AudioSettings {
            play_frequency: config
                .content
                .audio_play_frequency
                .and_then(|hz| u32::try_from(hz).ok()),
            max_sources: config
                .content
                .max_sources
                .and_then(|n| u32::try_from(n).ok()),
        };
        audio.configure(&settings);
        audio.attach();
    }
}

/// The frame rate a configured `fps` selects, `None` when unsupported.
fn supported_fps(requested: i64) -> Option<u8> {
    [DEFAULT_FPS, HIGH_FPS]
        .into_iter()
        .find(|fps| i64::from(*fps) == requested)
}
