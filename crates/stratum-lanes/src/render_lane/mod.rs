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

//! Scene compilation lanes - hot path from entity state to device commands

mod build_lane;
mod draw_list_lane;
mod shaders;
mod sort_lane;
mod submit_lane;
mod tag_filter;

pub use build_lane::*;
pub use draw_list_lane::*;
pub use shaders::*;
pub use sort_lane::*;
pub use submit_lane::*;
pub use tag_filter::*;

/// A trait implemented by every stage of scene compilation.
///
/// Lanes are stateless strategies: their inputs (the entity pool, the resource
/// caches, a device) are passed in by the agent that drives the cascade, so a
/// single lane value can be reused across scenes.
pub trait RenderLane {
    /// A stable name for the lane, used in logs and scheduler statistics.
    fn lane_name(&self) -> &'static str;
}
