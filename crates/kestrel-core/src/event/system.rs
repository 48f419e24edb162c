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

use std::fmt;

/// An application lifecycle notification.
///
/// These are the events the runtime raises on its own, as opposed to input
/// or scene events which belong to the script world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemEvent {
    /// The main script finished loading.
    AppStart,
    /// The runtime is being destroyed.
    AppExit,
    /// The application is about to stop receiving ticks.
    AppSuspend,
    /// The application is receiving ticks again.
    AppResume,
}

impl SystemEvent {
    /// The name script listeners register under.
    pub const fn name(self) -> &'static str {
        match self {
            SystemEvent::AppStart => "applicationStart",
            SystemEvent::AppExit => "applicationExit",
            SystemEvent::AppSuspend => "applicationSuspend",
            SystemEvent::AppResume => "applicationResume",
        }
    }
}

impl fmt::Display for SystemEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who a system event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventScope {
    /// User-visible listeners inside the script context.
    Application,
    /// Runtime-internal listeners (plugins, host glue).
    Internal,
}

/// Everything the runtime publishes on its [`EventBus`](super::EventBus).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A system event was dispatched in the given scope.
    System {
        /// Event kind.
        event: SystemEvent,
        /// Audience it was dispatched to.
        scope: EventScope,
    },
    /// The runtime entered the suspended state.
    Suspended,
    /// The runtime left the suspended state.
    Resumed,
    /// A background job finished and its result was handed to the listener.
    JobFinished {
        /// The job's output, `None` when it produced nothing.
        result: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_event_names() {
        assert_eq!(SystemEvent::AppStart.to_string(), "applicationStart");
        assert_eq!(SystemEvent::AppExit.name(), "applicationExit");
        assert_eq!(SystemEvent::AppSuspend.name(), "applicationSuspend");
        assert_eq!(SystemEvent::AppResume.name(), "applicationResume");
    }
}
