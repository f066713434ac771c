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

use stratum_core::renderer::{ChunkId, EntityId, ProgramId, StateSnapshot, SLOT_COUNT};
use stratum_core::state::{
    ClipPlanesCore, CoreRef, CoreValue, FlagsCore, GeometryCore, LightsCore, MorphCore,
    ShaderCore, StateAspect, StateCore, TexturesCore, ASPECT_COUNT, PROGRAM_ASPECTS,
};

/// Sort key of entities that cannot be drawn. Sorts after everything else.
pub const SORT_KEY_EXCLUDED: u64 = u64::MAX;

/// One drawable surface: its bound cores plus everything derived from them.
#[derive(Debug)]
pub struct RenderEntity {
    id: EntityId,
    cores: [StateCore; ASPECT_COUNT],
    program_hash: String,
    /// Program bound by the last successful build.
    pub program: Option<ProgramId>,
    /// Chunk per stage slot, indexed by [`StageSlot::index`](stratum_core::renderer::StageSlot::index).
    pub chunks: [Option<ChunkId>; SLOT_COUNT],
    /// Key computed by the sort-key lane.
    pub sort_key: u64,
    needs_build: bool,
}

impl RenderEntity {
    /// Creates an entity with default cores, then binds `cores` over them.
    pub fn new(id: EntityId, cores: impl IntoIterator<Item = StateCore>) -> Self {
        let mut entity = Self {
            id,
            cores: StateAspect::ALL.map(StateCore::default_for),
            program_hash: String::new(),
            program: None,
            chunks: [None; SLOT_COUNT],
            sort_key: SORT_KEY_EXCLUDED,
            needs_build: true,
        };
        for core in cores {
            let index = core.aspect().index();
            entity.cores[index] = core;
        }
        entity.program_hash = entity.derive_program_hash();
        entity
    }

    /// The entity's id.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The bound core of `aspect`.
    pub fn core(&self, aspect: StateAspect) -> &StateCore {
        &self.cores[aspect.index()]
    }

    /// The bound core of type `T`.
    pub fn get<T: CoreValue>(&self) -> CoreRef<T> {
        match T::unwrap(&self.cores[T::ASPECT.index()]) {
            Some(core) => core.clone(),
            None => T::default_core(),
        }
    }

    /// Replaces one core. Returns `false` when `core` is already bound.
    ///
    /// Any replacement schedules a rebuild, since chunks are keyed by core
    /// identity; the program hash is only re-derived for shader aspects.
    pub fn set_core(&mut self, core: StateCore) -> bool {
        let aspect = core.aspect();
        let slot = &mut self.cores[aspect.index()];
        if slot.state_id() == core.state_id() {
            return false;
        }
        *slot = core;
        if aspect.affects_program() {
            self.program_hash = self.derive_program_hash();
        }
        self.needs_build = true;
        true
    }

    /// `;`-joined hashes of the shader aspects, in fixed order.
    pub fn program_hash(&self) -> &str {
        &self.program_hash
    }

    /// Whether the program and chunks must be (re)acquired.
    pub fn needs_build(&self) -> bool {
        self.needs_build
    }

    /// Records that a build attempt finished, successful or not.
    pub fn mark_built(&mut self) {
        self.needs_build = false;
    }

    /// The chunk bound to `slot`.
    pub fn chunk(&self, slot: usize) -> Option<ChunkId> {
        self.chunks.get(slot).copied().flatten()
    }

    /// Owned handles to the shader cores, from which a [`StateSnapshot`] borrows.
    pub fn shader_cores(&self) -> ShaderCores {
        ShaderCores {
            geometry: self.get(),
            flags: self.get(),
            lights: self.get(),
            clip_planes: self.get(),
            morph: self.get(),
            textures: self.get(),
            shader: self.get(),
        }
    }

    fn derive_program_hash(&self) -> String {
        PROGRAM_ASPECTS
            .iter()
            .map(|aspect| self.cores[aspect.index()].hash())
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// The shader cores of one entity, held while its program is generated.
#[derive(Debug, Clone)]
pub struct ShaderCores {
    geometry: CoreRef<GeometryCore>,
    flags: CoreRef<FlagsCore>,
    lights: CoreRef<LightsCore>,
    clip_planes: CoreRef<ClipPlanesCore>,
    morph: CoreRef<MorphCore>,
    textures: CoreRef<TexturesCore>,
    shader: CoreRef<ShaderCore>,
}

impl ShaderCores {
    /// Borrows the cores as a snapshot.
    pub fn snapshot(&self) -> StateSnapshot<'_> {
        StateSnapshot {
            geometry: &self.geometry,
            flags: &self.flags,
            lights: &self.lights,
            clip_planes: &self.clip_planes,
            morph: &self.morph,
            textures: &self.textures,
            shader: &self.shader,
        }
    }
}
