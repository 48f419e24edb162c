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

//! A fixed-timestep integrator driven by application time.

use kestrel_core::physics::PhysicsWorld;

/// Upper bound on sub-steps taken for a single `step_world` call.
pub const MAX_SUBSTEPS: u32 = 8;

type StepCallback = Box<dyn FnMut(f64) + Send>;

/// Converts the runtime's elapsed time into whole, fixed-size steps.
///
/// Time the world could not catch up on within [`MAX_SUBSTEPS`] is dropped,
/// so a long stall never turns into a spiral of catch-up work.
pub struct FixedStepPhysics {
    step_ms: f64,
    accumulator: f64,
    last_elapsed: Option<f64>,
    steps: u64,
    running: bool,
    on_step: Option<StepCallback>,
}

impl FixedStepPhysics {
    /// Creates a stopped world. It starts on `initialize`.
    pub fn new() -> Self {
        Self {
            step_ms: 0.0,
            accumulator: 0.0,
            last_elapsed: None,
            steps: 0,
            running: false,
            on_step: None,
        }
    }

    /// Called with the step size in seconds for every step taken.
    pub fn with_step_callback(mut self, callback: impl FnMut(f64) + Send + 'static) -> Self {
        self.on_step = Some(Box::new(callback));
        self
    }

    /// Total steps taken.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// `true` between `initialize` and `stop_world`.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for FixedStepPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld for FixedStepPhysics {
    fn initialize(&mut self, frame_interval: f64) {
        self.step_ms = frame_interval * 1000.0;
        self.accumulator = 0.0;
        self.last_elapsed = None;
        self.running = self.step_ms > 0.0;
        log::debug!("Physics stepping every {:.3} ms", self.step_ms);
    }

    fn step_world(&mut self, elapsed_ms: f64) {
        if !self.running {
            return;
        }
        let Some(last) = self.last_elapsed.replace(elapsed_ms) else {
            return;
        };
        self.accumulator += (elapsed_ms - last).max(0.0);

        let mut taken = 0;
        while self.accumulator >= self.step_ms && taken < MAX_SUBSTEPS {
            self.accumulator -= self.step_ms;
            self.steps += 1;
            taken += 1;
            if let Some(callback) = self.on_step.as_mut() {
                callback(self.step_ms / 1000.0);
            }
        }
        if taken == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }
    }

    fn will_destroy_display(&mut self) {
        self.on_step = None;
    }

    fn stop_world(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
    }
}

impl std::fmt::Debug for FixedStepPhysics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedStepPhysics")
            .field("step_ms", &self.step_ms)
            .field("steps", &self.steps)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}
