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

//! The public-facing SDK for Kestrel.
//!
//! Wires the desktop backends from `kestrel-infra` into a
//! [`Runtime`](kestrel_runtime::Runtime) and drives its frame loop, so an
//! application only has to register its chunks and call
//! [`Engine::launch`].

mod engine;

pub use engine::{Engine, EngineBuilder};

/// Everything an application typically needs, in one import.
pub mod prelude {
    pub use crate::{init_logging, Engine, EngineBuilder};
    pub use kestrel_core::event::{EventScope, RuntimeEvent, SystemEvent};
    pub use kestrel_core::platform::DeviceOrientation;
    pub use kestrel_core::script::{LaunchArgs, ScriptListener};
    pub use kestrel_core::{ApplicationConfig, ContentConfig, RuntimeDelegate};
    pub use kestrel_infra::script::NativeScope;
    pub use kestrel_runtime::{
        JobResult, LaunchOptions, LoadResult, Runtime, RuntimeProperties, SuspendOverrides,
    };
}

/// Installs `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
