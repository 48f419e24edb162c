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

//! Hooks an embedder can install to observe and steer the lifecycle.

use crate::config::ApplicationConfig;

/// Callbacks the runtime invokes around lifecycle transitions.
///
/// Every method has a no-op default; implement only what you need.
pub trait RuntimeDelegate {
    /// Last chance to amend the parsed configuration before it is read.
    fn initialize_config(&mut self, _config: &mut ApplicationConfig) {}

    /// Configuration is about to be applied.
    fn will_load_config(&mut self, _config: &ApplicationConfig) {}

    /// Configuration has been applied and the display initialized.
    fn did_load_config(&mut self, _config: &ApplicationConfig) {}

    /// Whether everything the application needs is available and licensed.
    /// Returning `false` makes loading fail with a security issue.
    fn has_dependencies(&self) -> bool {
        true
    }

    /// The main file is about to run.
    fn will_load_main(&mut self) {}

    /// The main file finished running.
    fn did_load_main(&mut self) {}

    /// A suspend request arrived.
    fn will_suspend(&mut self) {}

    /// The runtime is now suspended.
    fn did_suspend(&mut self) {}

    /// A resume request arrived.
    fn will_resume(&mut self) {}

    /// The runtime is running again.
    fn did_resume(&mut self) {}

    /// The runtime is being destroyed.
    fn will_destroy(&mut self) {}
}
