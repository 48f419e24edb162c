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

//! The physics world contract.

/// A physics world stepped once per rendered frame.
pub trait PhysicsWorld {
    /// Called when the run loop starts, with the frame period in seconds.
    fn initialize(&mut self, frame_interval: f64);

    /// Advances the simulation to `elapsed_ms` of application time.
    fn step_world(&mut self, elapsed_ms: f64);

    /// The display is about to be torn down; drop anything tied to it.
    fn will_destroy_display(&mut self);

    /// Stops the simulation for good.
    fn stop_world(&mut self);
}
