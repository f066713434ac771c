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

//! The public-facing SDK for Stratum.
//!
//! An [`Engine`] owns a graphics device and any number of [`Scene`]s. Client
//! code spawns entities from state cores, replaces cores as the scene
//! changes, and drives frames either by calling [`Engine::tick`] directly or by
//! handing a [`FramePump`] to [`Engine::run`].

#![warn(missing_docs)]

pub mod config;
mod engine;
mod logging;
mod scene;

pub use engine::*;
pub use logging::init_logging;
pub use scene::*;

/// Types most applications need.
pub mod prelude {
    pub use crate::{Engine, FixedFramePump, FramePump, Scene, SceneEvent, SceneId, TickEvent};
    pub use stratum_agents::{PickHit, PickOptions, RenderOptions};
    pub use stratum_core::math::{Aabb, Mat4, Vec3};
    pub use stratum_core::renderer::{EntityId, RenderTargetId, TextureId};
    pub use stratum_core::state::*;
    pub use stratum_core::RendererSettings;
}
