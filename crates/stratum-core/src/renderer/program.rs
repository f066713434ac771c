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

//! Program source generation contracts.

use crate::state::{
    ClipPlanesCore, FlagsCore, GeometryCore, LightsCore, MorphCore, ShaderCore, TexturesCore,
};
use std::fmt::Debug;

/// Source text for one vertex + fragment program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderSource {
    /// Vertex stage.
    pub vertex: String,
    /// Fragment stage.
    pub fragment: String,
}

/// The two variants compiled for every program: one for normal drawing and
/// one that writes pick colors (or packed depth, in ray-pick mode).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramSource {
    /// Drawing variant.
    pub draw: ShaderSource,
    /// Picking variant.
    pub pick: ShaderSource,
}

/// Borrowed view of the shader-relevant cores of one entity.
#[derive(Debug, Clone, Copy)]
pub struct StateSnapshot<'a> {
    /// Geometry layout.
    pub geometry: &'a GeometryCore,
    /// Enable flags.
    pub flags: &'a FlagsCore,
    /// Lights.
    pub lights: &'a LightsCore,
    /// Clip planes.
    pub clip_planes: &'a ClipPlanesCore,
    /// Morph targets.
    pub morph: &'a MorphCore,
    /// Texture layers.
    pub textures: &'a TexturesCore,
    /// Custom shader.
    pub shader: &'a ShaderCore,
}

/// Generates program source from an entity's state.
///
/// Implementations must be pure: the same `hash` always yields the same
/// source, because programs are shared by every entity with that hash.
pub trait ProgramSourceFactory: Debug + Send {
    /// Returns both program variants for `hash`.
    fn source(&self, hash: &str, snapshot: &StateSnapshot<'_>) -> ProgramSource;
}
