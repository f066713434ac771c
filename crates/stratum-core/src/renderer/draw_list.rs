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

//! The compiled output of the draw-list lane.

use crate::renderer::ids::{ChunkId, EntityId};
use crate::state::{CoreRef, RenderTargetCore, ViewCore};

/// Number of stage slots. Every per-slot tracking array is sized by it.
pub const SLOT_COUNT: usize = 12;

/// The chunk slots of a render entity, in emission order.
///
/// The program is bound first and geometry is drawn last; everything between
/// configures the program for that draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageSlot {
    /// Binds the program.
    Program,
    /// Renderer toggles.
    Renderer,
    /// Draw-mode toggles.
    DrawMode,
    /// Camera matrices.
    View,
    /// Model matrix.
    Transform,
    /// Lights.
    Lights,
    /// Clip planes.
    ClipPlanes,
    /// Material.
    Material,
    /// Texture layers.
    Textures,
    /// Custom shader uniforms.
    Shader,
    /// Pick name. Emitted into the pick list only.
    Name,
    /// Draws the geometry.
    Geometry,
}

impl StageSlot {
    /// Every slot, in emission order.
    pub const ALL: [StageSlot; SLOT_COUNT] = [
        StageSlot::Program,
        StageSlot::Renderer,
        StageSlot::DrawMode,
        StageSlot::View,
        StageSlot::Transform,
        StageSlot::Lights,
        StageSlot::ClipPlanes,
        StageSlot::Material,
        StageSlot::Textures,
        StageSlot::Shader,
        StageSlot::Name,
        StageSlot::Geometry,
    ];

    /// Position of the slot in [`StageSlot::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unique chunks are emitted for every entity, never deduplicated.
    pub fn is_unique(self) -> bool {
        self == StageSlot::Geometry
    }

    /// Whether the slot is emitted into the draw list.
    pub fn in_draw_list(self) -> bool {
        self != StageSlot::Name
    }
}

/// One command of a compiled list.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Redirects subsequent draws into offscreen targets.
    BindRenderTarget(CoreRef<RenderTargetCore>),
    /// Returns to the on-screen target.
    BindDefaultTarget,
    /// Applies a chunk.
    Apply(ChunkId),
    /// Applies a name chunk and sets the pick color for the following draw.
    PickName {
        /// The name chunk.
        chunk: ChunkId,
        /// Index into [`DrawList::pick_entries`] plus one.
        pick_id: u32,
    },
}

/// What a pick id resolves to.
#[derive(Debug, Clone)]
pub struct PickEntry {
    /// The named entity.
    pub entity: EntityId,
    /// Its pick name.
    pub name: String,
    /// The camera it was drawn with, for unprojection.
    pub view: CoreRef<ViewCore>,
}

/// The two command lists produced by one compilation.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    /// Normal drawing.
    pub draw: Vec<DrawCommand>,
    /// Picking.
    pub pick: Vec<DrawCommand>,
    /// Pick entries, indexed by `pick_id - 1`.
    pub pick_entries: Vec<PickEntry>,
    /// Clear color requested by the first on-screen entity's renderer core.
    pub clear_color: Option<[f32; 4]>,
}

impl DrawList {
    /// Resolves a decoded pick id. Id 0 is "no hit".
    pub fn pick_entry(&self, pick_id: u32) -> Option<&PickEntry> {
        let index = (pick_id as usize).checked_sub(1)?;
        self.pick_entries.get(index)
    }

    /// Whether nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.draw.is_empty()
    }

    /// Chunk ids applied by the draw list, in order.
    pub fn applied_chunks(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.draw.iter().filter_map(|cmd| match cmd {
            DrawCommand::Apply(chunk) => Some(*chunk),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Core, ViewCore};

    #[test]
    fn slot_table_matches_slot_count() {
        assert_eq!(StageSlot::ALL.len(), SLOT_COUNT);
        for (i, slot) in StageSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
        assert_eq!(StageSlot::ALL[0], StageSlot::Program);
        assert_eq!(StageSlot::ALL[SLOT_COUNT - 1], StageSlot::Geometry);
    }

    #[test]
    fn only_geometry_is_unique() {
        let unique: Vec<_> = StageSlot::ALL.iter().filter(|s| s.is_unique()).collect();
        assert_eq!(unique, vec![&StageSlot::Geometry]);
        assert!(!StageSlot::Name.in_draw_list());
    }

    #[test]
    fn pick_id_zero_is_no_hit() {
        let list = DrawList {
            pick_entries: vec![PickEntry {
                entity: EntityId(1),
                name: "a".into(),
                view: Core::new(ViewCore::default()),
            }],
            ..Default::default()
        };
        assert!(list.pick_entry(0).is_none());
        assert_eq!(list.pick_entry(1).map(|e| e.entity), Some(EntityId(1)));
        assert!(list.pick_entry(2).is_none());
    }
}
