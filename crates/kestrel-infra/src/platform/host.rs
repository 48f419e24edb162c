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

//! A [`PlatformEnvironment`] backed by plain directories on disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use kestrel_core::platform::{
    Directory, PathFlags, PlatformEnvironment, PlatformError, PlatformTimer,
};
use kestrel_core::time::{SystemTimeSource, TimeSource};

use super::IntervalTimer;

/// Host services for desktop builds and tooling.
///
/// Both resource directories default to the application directory, documents
/// to a `Documents` folder inside it and temporary files to the system
/// temporary directory.
pub struct HostEnvironment {
    resource_dir: PathBuf,
    system_resource_dir: PathBuf,
    documents_dir: PathBuf,
    temporary_dir: PathBuf,
    time_source: Arc<dyn TimeSource>,
    suspended: bool,
    runtime_depth: AtomicU32,
}

impl HostEnvironment {
    /// Creates an environment rooted at `resource_dir`.
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        let resource_dir = resource_dir.into();
        Self {
            system_resource_dir: resource_dir.clone(),
            documents_dir: resource_dir.join("Documents"),
            temporary_dir: std::env::temp_dir(),
            resource_dir,
            time_source: Arc::new(SystemTimeSource::new()),
            suspended: false,
            runtime_depth: AtomicU32::new(0),
        }
    }

    /// Overrides where `directory` resolves to.
    pub fn with_directory(mut self, directory: Directory, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match directory {
            Directory::Resource => self.resource_dir = path,
            Directory::SystemResource => self.system_resource_dir = path,
            Directory::Documents => self.documents_dir = path,
            Directory::Temporary => self.temporary_dir = path,
        }
        self
    }

    /// Clock handed to every timer this environment creates.
    pub fn with_time_source(mut self, source: Arc<dyn TimeSource>) -> Self {
        self.time_source = source;
        self
    }

    /// The root `directory` resolves to.
    pub fn directory(&self, directory: Directory) -> &Path {
        match directory {
            Directory::Resource => &self.resource_dir,
            Directory::SystemResource => &self.system_resource_dir,
            Directory::Documents => &self.documents_dir,
            Directory::Temporary => &self.temporary_dir,
        }
    }

    /// `true` between `suspend` and `resume`.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// `true` while the runtime is inside a script call.
    pub fn in_runtime(&self) -> bool {
        self.runtime_depth.load(Ordering::Acquire) > 0
    }
}

impl PlatformEnvironment for HostEnvironment {
    fn path_for_file(
        &self,
        filename: &str,
        directory: Directory,
        flags: PathFlags,
    ) -> Option<PathBuf> {
        let root = self.directory(directory);
        let path = if filename.is_empty() {
            root.to_path_buf()
        } else {
            root.join(filename)
        };
        if flags.contains(PathFlags::TEST_FILE_EXISTS) && !path.exists() {
            return None;
        }
        Some(path)
    }

    fn suspend(&mut self) {
        if !self.suspended {
            log::debug!("Host resources released for background");
            self.suspended = true;
        }
    }

    fn resume(&mut self) {
        if self.suspended {
            log::debug!("Host resources reacquired");
            self.suspended = false;
        }
    }

    fn begin_runtime(&self) {
        self.runtime_depth.fetch_add(1, Ordering::AcqRel);
    }

    fn end_runtime(&self) {
        let _ = self
            .runtime_depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |depth| {
                depth.checked_sub(1)
            });
    }

    fn create_timer(&mut self) -> Option<Box<dyn PlatformTimer>> {
        Some(Box::new(IntervalTimer::with_time_source(
            self.time_source.clone(),
        )))
    }

    fn raise_error(&self, error: &PlatformError) {
        log::error!("[host] {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::time::ManualTimeSource;
    use std::fs;

    #[test]
    fn resolves_against_the_configured_roots() {
        let root = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let host = HostEnvironment::new(root.path()).with_directory(Directory::Documents, docs.path());

        assert_eq!(
            host.path_for_file("main.lua", Directory::Resource, PathFlags::EMPTY),
            Some(root.path().join("main.lua"))
        );
        assert_eq!(
            host.path_for_file("save.json", Directory::Documents, PathFlags::EMPTY),
            Some(docs.path().join("save.json"))
        );
        assert_eq!(
            host.path_for_file("", Directory::SystemResource, PathFlags::EMPTY),
            Some(root.path().to_path_buf())
        );
    }

    #[test]
    fn existence_test_filters_missing_files() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("config.json"), "{}").unwrap();
        let host = HostEnvironment::new(root.path());

        assert!(host
            .path_for_file("config.json", Directory::Resource, PathFlags::TEST_FILE_EXISTS)
            .is_some());
        assert!(host
            .path_for_file("resource.car", Directory::Resource, PathFlags::TEST_FILE_EXISTS)
            .is_none());
    }

    #[test]
    fn suspend_and_resume_are_idempotent() {
        let mut host = HostEnvironment::new(".");
        host.suspend();
        host.suspend();
        assert!(host.is_suspended());
        host.resume();
        assert!(!host.is_suspended());
        host.resume();
        assert!(!host.is_suspended());
    }

    #[test]
    fn runtime_guard_nests_and_never_underflows() {
        let host = HostEnvironment::new(".");
        host.end_runtime();
        assert!(!host.in_runtime());

        host.begin_runtime();
        host.begin_runtime();
        host.end_runtime();
        assert!(host.in_runtime());
        host.end_runtime();
        assert!(!host.in_runtime());
    }

    #[test]
    fn timers_share_the_host_clock() {
        let clock = ManualTimeSource::new();
        let mut host = HostEnvironment::new(".").with_time_source(Arc::new(clock.clone()));
        let mut timer = host.create_timer().unwrap();
        timer.set_interval(10);
        timer.start();
        assert!(!timer.poll());
        clock.advance_ms(10);
        assert!(timer.poll());
    }
}
