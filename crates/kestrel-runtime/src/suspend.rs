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

//! Suspend/resume coordination.
//!
//! On suspend the owner hears about it first, then the application, then
//! the subsystems go quiet. Resume runs the other way round: subsystems,
//! then internal listeners, then the application, then the owner.

use kestrel_core::event::{EventScope, RuntimeEvent, SystemEvent};

use crate::properties::{SuspendOverrides, SuspendState};
use crate::runtime::Runtime;

impl Runtime {
    /// Suspends the runtime, notifying listeners.
    pub fn suspend(&mut self) {
        self.suspend_with(true);
    }

    /// Suspends the runtime.
    ///
    /// With the override mask at [`SuspendOverrides::SUSPEND_ALL`] the timer
    /// stops, the clock freezes, audio is suspended and then the platform.
    /// A restricted mask suspends only the subsystems it names and leaves
    /// the core running. `send_events = false` skips the system events.
    ///
    /// Owner hooks and events fire only when the runtime was running, so a
    /// repeated suspend, or one before the run loop started, is silent.
    pub fn suspend_with(&mut self, send_events: bool) {
        let was_running = self.suspend_state == SuspendState::Running;

        if was_running {
            if let Some(delegate) = self.delegate.as_mut() {
                delegate.will_suspend();
            }
        }
        if send_events && was_running {
            self.dispatch_system_event(SystemEvent::AppSuspend, EventScope::Application);
            self.dispatch_system_event(SystemEvent::AppSuspend, EventScope::Internal);
        }

        let overrides = self.suspend_overrides;
        if overrides == SuspendOverrides::SUSPEND_ALL {
            self.suspend_core();
            self.suspend_audio();
            if !self.platform_suspended {
                self.platform.suspend();
                self.platform_suspended = true;
            }
        } else {
            log::debug!("Restricted suspend: {overrides:?}.");
            if overrides.contains(SuspendOverrides::BACKGROUND_AUDIO) {
                self.suspend_audio();
            }
        }

        if was_running && self.suspend_state == SuspendState::Suspended {
            if send_events {
                self.events().publish(RuntimeEvent::Suspended);
            }
            if let Some(delegate) = self.delegate.as_mut() {
                delegate.did_suspend();
            }
            log::info!("Runtime suspended at {:.0} ms.", self.elapsed_ms());
        }
    }

    /// Resumes the runtime, notifying listeners.
    pub fn resume(&mut self) {
        self.resume_with(true);
    }

    /// Resumes the runtime.
    ///
    /// Rolls the clock's correction forward by the suspended interval,
    /// restarts the timer, resumes audio and the platform, and resets the
    /// override mask to [`SuspendOverrides::SUSPEND_ALL`]. Owner hooks and
    /// events fire only when the runtime was actually suspended.
    pub fn resume_with(&mut self, send_events: bool) {
        let was_suspended = self.suspend_state == SuspendState::Suspended;

        if was_suspended {
            if let Some(delegate) = self.delegate.as_mut() {
                delegate.will_resume();
            }
        }

        self.resume_core();
        if let Some(audio) = self.audio.as_mut() {
            if audio.is_suspended() {
                audio.resume();
            } else if audio.is_in_interruption() {
                audio.end_interruption();
            }
        }
        if self.platform_suspended {
            self.platform.resume();
            self.platform_suspended = false;
        }

        self.suspend_overrides = SuspendOverrides::SUSPEND_ALL;

        if send_events && was_suspended {
            self.dispatch_system_event(SystemEvent::AppResume, EventScope::Internal);
            self.dispatch_system_event(SystemEvent::AppResume, EventScope::Application);
            self.events().publish(RuntimeEvent::Resumed);
        }
        if was_suspended {
            if let Some(delegate) = self.delegate.as_mut() {
                delegate.did_resume();
            }
            log::info!("Runtime resumed; {:?} spent suspended.", self.clock.correction());
        }
    }

    /// Mask applied to the next suspend.
    pub fn suspend_overrides(&self) -> SuspendOverrides {
        self.suspend_overrides
    }

    /// Restricts the next suspend to `overrides`. Reset by the next resume.
    pub fn set_suspend_overrides(&mut self, overrides: SuspendOverrides) {
        self.suspend_overrides = overrides;
    }

    fn suspend_core(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            if timer.is_running() {
                timer.stop();
            }
        }
        if self.suspend_state != SuspendState::Suspended {
            self.suspend_state = SuspendState::Suspended;
            self.clock.on_suspend_begin();
        }
    }

    fn suspend_audio(&mut self) {
        if let Some(audio) = self.audio.as_mut() {
            audio.suspend();
        }
    }

    fn resume_core(&mut self) {
        if self.suspend_state != SuspendState::Suspended {
            return;
        }
        self.clock.on_resume_begin();
        if let Some(timer) = self.timer.as_mut() {
            timer.start();
        }
        self.suspend_state = SuspendState::Running;
    }
}
