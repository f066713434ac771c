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

use crate::cache::program_cache::Program;
use crate::pool::RenderEntity;
use ahash::AHashMap;
use slotmap::SlotMap;
use stratum_core::renderer::pick::encode_pick_id;
use stratum_core::renderer::{
    ChunkId, DeviceCommand, DeviceProgramId, FrameContext, GraphicsDevice, ProgramId, StageSlot,
};
use stratum_core::state::{
    ClipPlanesCore, CoreRef, DrawModeCore, GeometryCore, LightsCore, MaterialCore, MorphCore,
    NameCore, RendererCore, ShaderCore, StateId, TexturesCore, TransformCore, ViewCore,
};

/// Identity of a chunk: the slot, the program it feeds, and the core(s) it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    /// Stage slot.
    pub slot: StageSlot,
    /// Owning program.
    pub program: ProgramId,
    /// Primary core, [`StateId::NONE`] for the program slot.
    pub state: StateId,
    /// Secondary core (morph data for the geometry slot).
    pub state2: Option<StateId>,
}

/// What a chunk applies, one variant per stage slot.
#[derive(Debug, Clone)]
pub enum ChunkState {
    /// Binds the program variants.
    Program {
        /// Drawing variant.
        draw: DeviceProgramId,
        /// Picking variant.
        pick: DeviceProgramId,
    },
    /// Renderer toggles.
    Renderer(CoreRef<RendererCore>),
    /// Draw-mode toggles.
    DrawMode(CoreRef<DrawModeCore>),
    /// Camera.
    View(CoreRef<ViewCore>),
    /// Model matrix.
    Transform(CoreRef<TransformCore>),
    /// Lights.
    Lights(CoreRef<LightsCore>),
    /// Clip planes.
    ClipPlanes(CoreRef<ClipPlanesCore>),
    /// Material.
    Material(CoreRef<MaterialCore>),
    /// Texture layers.
    Textures(CoreRef<TexturesCore>),
    /// Custom uniforms.
    Shader(CoreRef<ShaderCore>),
    /// Pick name.
    Name(CoreRef<NameCore>),
    /// Geometry plus its morph data.
    Geometry {
        /// Geometry.
        geometry: CoreRef<GeometryCore>,
        /// Morph targets.
        morph: CoreRef<MorphCore>,
    },
}

impl ChunkState {
    /// Builds the state for `slot` from an entity's cores.
    pub fn for_slot(slot: StageSlot, entity: &RenderEntity, program: &Program) -> Self {
        match slot {
            StageSlot::Program => ChunkState::Program {
                draw: program.draw,
                pick: program.pick,
            },
            StageSlot::Renderer => ChunkState::Renderer(entity.get()),
            StageSlot::DrawMode => ChunkState::DrawMode(entity.get()),
            StageSlot::View => ChunkState::View(entity.get()),
            StageSlot::Transform => ChunkState::Transform(entity.get()),
            StageSlot::Lights => ChunkState::Lights(entity.get()),
            StageSlot::ClipPlanes => ChunkState::ClipPlanes(entity.get()),
            StageSlot::Material => ChunkState::Material(entity.get()),
            StageSlot::Textures => ChunkState::Textures(entity.get()),
            StageSlot::Shader => ChunkState::Shader(entity.get()),
            StageSlot::Name => ChunkState::Name(entity.get()),
            StageSlot::Geometry => ChunkState::Geometry {
                geometry: entity.get(),
                morph: entity.get(),
            },
        }
    }

    /// The slot this state belongs to.
    pub fn slot(&self) -> StageSlot {
        match self {
            ChunkState::Program { .. } => StageSlot::Program,
            ChunkState::Renderer(_) => StageSlot::Renderer,
            ChunkState::DrawMode(_) => StageSlot::DrawMode,
            ChunkState::View(_) => StageSlot::View,
            ChunkState::Transform(_) => StageSlot::Transform,
            ChunkState::Lights(_) => StageSlot::Lights,
            ChunkState::ClipPlanes(_) => StageSlot::ClipPlanes,
            ChunkState::Material(_) => StageSlot::Material,
            ChunkState::Textures(_) => StageSlot::Textures,
            ChunkState::Shader(_) => StageSlot::Shader,
            ChunkState::Name(_) => StageSlot::Name,
            ChunkState::Geometry { .. } => StageSlot::Geometry,
        }
    }

    fn state_ids(&self) -> (StateId, Option<StateId>) {
        match self {
            ChunkState::Program { .. } => (StateId::NONE, None),
            ChunkState::Renderer(c) => (c.id(), None),
            ChunkState::DrawMode(c) => (c.id(), None),
            ChunkState::View(c) => (c.id(), None),
            ChunkState::Transform(c) => (c.id(), None),
            ChunkState::Lights(c) => (c.id(), None),
            ChunkState::ClipPlanes(c) => (c.id(), None),
            ChunkState::Material(c) => (c.id(), None),
            ChunkState::Textures(c) => (c.id(), None),
            ChunkState::Shader(c) => (c.id(), None),
            ChunkState::Name(c) => (c.id(), None),
            ChunkState::Geometry { geometry, morph } => (geometry.id(), Some(morph.id())),
        }
    }

    /// The cache key for this state under `program`.
    pub fn key(&self, program: ProgramId) -> ChunkKey {
        let (state, state2) = self.state_ids();
        ChunkKey {
            slot: self.slot(),
            program,
            state,
            state2,
        }
    }
}

/// A cached unit of device-state application.
#[derive(Debug)]
pub struct Chunk {
    key: ChunkKey,
    state: ChunkState,
    uses: u32,
}

impl Chunk {
    /// The chunk's key.
    pub fn key(&self) -> &ChunkKey {
        &self.key
    }

    /// The slot it fills.
    pub fn slot(&self) -> StageSlot {
        self.key.slot
    }

    /// Unique chunks are never deduplicated in a list.
    pub fn is_unique(&self) -> bool {
        self.key.slot.is_unique()
    }

    /// The applied state.
    pub fn state(&self) -> &ChunkState {
        &self.state
    }

    /// Applies the chunk during the draw pass.
    pub fn apply_draw(&self, ctx: &mut FrameContext, device: &mut dyn GraphicsDevice) {
        match &self.state {
            ChunkState::Program { draw, .. } => {
                device.use_program(*draw);
                ctx.program = Some(*draw);
                ctx.texture_unit = 0;
            }
            ChunkState::Renderer(core) => device.apply(DeviceCommand::Renderer(core), ctx),
            ChunkState::DrawMode(core) => device.apply(DeviceCommand::DrawMode(core), ctx),
            ChunkState::View(core) => {
                ctx.view = core.view;
                ctx.projection = core.projection;
                device.apply(DeviceCommand::View(core), ctx);
            }
            ChunkState::Transform(core) => {
                ctx.model = core.model;
                device.apply(DeviceCommand::Transform(core), ctx);
            }
            ChunkState::Lights(core) => {
                ctx.ambient = core.ambient();
                let ambient = ctx.ambient;
                device.apply(
                    DeviceCommand::Lights {
                        lights: core,
                        ambient,
                    },
                    ctx,
                );
            }
            ChunkState::ClipPlanes(core) => device.apply(DeviceCommand::ClipPlanes(core), ctx),
            ChunkState::Material(core) => device.apply(DeviceCommand::Material(core), ctx),
            ChunkState::Textures(core) => {
                ctx.texture_unit = 0;
                for layer in &core.layers {
                    let unit = ctx.next_texture_unit();
                    device.apply(DeviceCommand::Texture { unit, layer }, ctx);
                }
            }
            ChunkState::Shader(core) => {
                if !core.uniforms.is_empty() {
                    device.apply(DeviceCommand::Uniforms(&core.uniforms), ctx);
                }
            }
            ChunkState::Name(_) => {}
            ChunkState::Geometry { geometry, morph } => {
                device.draw(geometry, morph, ctx);
                ctx.draw_calls += 1;
            }
        }
    }

    /// Applies the chunk during a pick or ray-pick pass.
    ///
    /// Only state that affects coverage and depth is applied; shading state is
    /// skipped. Name chunks write `ctx.pick_id` as the fragment color.
    pub fn apply_pick(&self, ctx: &mut FrameContext, device: &mut dyn GraphicsDevice) {
        match &self.state {
            ChunkState::Program { pick, .. } => {
                device.use_program(*pick);
                ctx.program = Some(*pick);
            }
            ChunkState::Name(_) => {
                device.apply(DeviceCommand::PickColor(encode_pick_id(ctx.pick_id)), ctx);
            }
            ChunkState::Lights(_)
            | ChunkState::Material(_)
            | ChunkState::Textures(_)
            | ChunkState::Shader(_) => {}
            ChunkState::Renderer(_)
            | ChunkState::DrawMode(_)
            | ChunkState::View(_)
            | ChunkState::Transform(_)
            | ChunkState::ClipPlanes(_)
            | ChunkState::Geometry { .. } => self.apply_draw(ctx, device),
        }
    }
}

/// Reference-counted map from [`ChunkKey`] to chunk.
///
/// Draw-list deduplication compares [`ChunkId`]s, so every entity asking for
/// the same key must get the same chunk.
#[derive(Debug, Default)]
pub struct ChunkFactory {
    chunks: SlotMap<ChunkId, Chunk>,
    by_key: AHashMap<ChunkKey, ChunkId>,
}

impl ChunkFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chunk for `state` under `program`, creating it on a miss.
    pub fn acquire(&mut self, program: ProgramId, state: ChunkState) -> ChunkId {
        let key = state.key(program);
        if let Some(&id) = self.by_key.get(&key) {
            if let Some(chunk) = self.chunks.get_mut(id) {
                chunk.uses += 1;
                return id;
            }
        }
        let id = self.chunks.insert(Chunk {
            key,
            state,
            uses: 1,
        });
        self.by_key.insert(key, id);
        id
    }

    /// Drops one use. Returns `true` if the chunk was evicted.
    pub fn release(&mut self, id: ChunkId) -> bool {
        let Some(chunk) = self.chunks.get_mut(id) else {
            log::warn!("Release of unknown chunk {id:?}.");
            return false;
        };
        chunk.uses = chunk.uses.saturating_sub(1);
        if chunk.uses > 0 {
            return false;
        }
        if let Some(chunk) = self.chunks.remove(id) {
            self.by_key.remove(&chunk.key);
        }
        true
    }

    /// Looks up a live chunk.
    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// Current use count, 0 for evicted chunks.
    pub fn use_count(&self, id: ChunkId) -> u32 {
        self.chunks.get(id).map_or(0, |chunk| chunk.uses)
    }

    /// Number of live chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk is live.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Drops every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.by_key.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::state::Core;

    fn program_id() -> ProgramId {
        let mut arena = SlotMap::<ProgramId, ()>::with_key();
        arena.insert(())
    }

    #[test]
    fn same_key_returns_same_chunk() {
        let mut factory = ChunkFactory::new();
        let program = program_id();
        let material = Core::new(MaterialCore::default());

        let a = factory.acquire(program, ChunkState::Material(material.clone()));
        let b = factory.acquire(program, ChunkState::Material(material));
        let other = factory.acquire(program, ChunkState::Material(Core::new(MaterialCore::default())));

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(factory.len(), 2);
        assert_eq!(factory.use_count(a), 2);
    }

    #[test]
    fn geometry_key_includes_morph() {
        let program = program_id();
        let geometry = Core::new(GeometryCore::default());
        let a = ChunkState::Geometry {
            geometry: geometry.clone(),
            morph: Core::new(MorphCore::default()),
        };
        let b = ChunkState::Geometry {
            geometry,
            morph: Core::new(MorphCore::default()),
        };
        assert_ne!(a.key(program), b.key(program));
        assert_eq!(a.key(program).slot, StageSlot::Geometry);
    }

    #[test]
    fn release_evicts_at_zero() {
        let mut factory = ChunkFactory::new();
        let program = program_id();
        let view = Core::new(ViewCore::default());
        let id = factory.acquire(program, ChunkState::View(view.clone()));
        factory.acquire(program, ChunkState::View(view.clone()));

        assert!(!factory.release(id));
        assert!(factory.release(id));
        assert!(factory.get(id).is_none());
        assert_eq!(factory.use_count(id), 0);
        assert!(!factory.release(id));

        let again = factory.acquire(program, ChunkState::View(view));
        assert_ne!(again, id);
    }
}
