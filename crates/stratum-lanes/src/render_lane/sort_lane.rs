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

//! State-sort keys.
//!
//! Layout of the 64-bit key, most significant first:
//!
//! | bits | field |
//! |------|-------|
//! | 8    | stage priority + 128, clamped to `0..=255` |
//! | 1    | transparency |
//! | 15   | layer priority + 16384, clamped to `0..=32767` |
//! | 20   | program identity (cache slot index) |
//! | 20   | primary texture identity (0 without texture layers) |
//!
//! Entities without a program get [`SORT_KEY_EXCLUDED`] and sort last.

use super::RenderLane;
use stratum_core::state::{FlagsCore, LayerCore, StageCore, TexturesCore};
use stratum_data::{EntityPool, ProgramCache, RenderEntity, SORT_KEY_EXCLUDED};

const IDENTITY_BITS: u32 = 20;
const IDENTITY_MASK: u64 = (1 << IDENTITY_BITS) - 1;
const STAGE_BIAS: i64 = 128;
const STAGE_MAX: i64 = 255;
const LAYER_BIAS: i64 = 16_384;
const LAYER_MAX: i64 = (1 << 15) - 1;

/// Packs the ordering fields into a key.
pub fn pack_sort_key(
    stage_priority: i32,
    transparent: bool,
    layer_priority: i32,
    program: u64,
    texture: u64,
) -> u64 {
    let stage = (stage_priority as i64 + STAGE_BIAS).clamp(0, STAGE_MAX) as u64;
    let layer = (layer_priority as i64 + LAYER_BIAS).clamp(0, LAYER_MAX) as u64;
    (stage << 56)
        | ((transparent as u64) << 55)
        | (layer << 40)
        | ((program & IDENTITY_MASK) << 20)
        | (texture & IDENTITY_MASK)
}

/// Computes the key of one entity.
pub fn compute_sort_key(entity: &RenderEntity, programs: &ProgramCache) -> u64 {
    let Some(program) = entity.program.and_then(|id| programs.get(id)) else {
        return SORT_KEY_EXCLUDED;
    };
    let stage = entity.get::<StageCore>();
    let layer = entity.get::<LayerCore>();
    let flags = entity.get::<FlagsCore>();
    let textures = entity.get::<TexturesCore>();
    let texture = if textures.layers.is_empty() {
        0
    } else {
        textures.id().0
    };
    pack_sort_key(
        stage.priority,
        flags.transparent,
        layer.priority,
        u64::from(program.id.slot_index()),
        texture,
    )
}

/// Computes sort keys and orders the pool's flat list.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortKeyLane;

impl SortKeyLane {
    /// Creates the lane.
    pub fn new() -> Self {
        Self
    }

    /// Recomputes every entity's key.
    pub fn compute_keys(&self, pool: &mut EntityPool, programs: &ProgramCache) {
        for entity in pool.iter_mut() {
            entity.sort_key = compute_sort_key(entity, programs);
        }
    }

    /// Sorts the flat list by `(key, entity id)`.
    pub fn sort(&self, pool: &mut EntityPool) {
        let mut order = pool.order().to_vec();
        order.sort_by_key(|id| (pool.get(*id).map_or(SORT_KEY_EXCLUDED, |e| e.sort_key), *id));
        pool.set_order(order);
    }
}

impl RenderLane for SortKeyLane {
    fn lane_name(&self) -> &'static str {
        "sort_keys"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_order_by_significance() {
        let base = pack_sort_key(0, false, 0, 5, 5);
        assert!(pack_sort_key(1, false, 0, 0, 0) > pack_sort_key(0, true, 9_000, 999, 999));
        assert!(pack_sort_key(0, true, 0, 0, 0) > pack_sort_key(0, false, 9_000, 999, 999));
        assert!(pack_sort_key(0, false, 1, 0, 0) > base);
        assert!(pack_sort_key(0, false, 0, 6, 0) > base);
        assert!(pack_sort_key(0, false, 0, 5, 6) > base);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert!(pack_sort_key(-1, false, 0, 0, 0) < pack_sort_key(0, false, 0, 0, 0));
        assert!(pack_sort_key(-128, false, 0, 0, 0) < pack_sort_key(-5, false, 0, 0, 0));
        assert_eq!(pack_sort_key(-500, false, 0, 0, 0), pack_sort_key(-128, false, 0, 0, 0));
        assert_eq!(pack_sort_key(999, false, 0, 0, 0), pack_sort_key(127, false, 0, 0, 0));
        assert!(pack_sort_key(126, false, 0, 0, 0) < pack_sort_key(127, false, 0, 0, 0));
        assert!(pack_sort_key(0, false, -16_384, 0, 0) < pack_sort_key(0, false, -1, 0, 0));
        assert_eq!(
            pack_sort_key(0, false, i32::MIN, 0, 0),
            pack_sort_key(0, false, -16_384, 0, 0)
        );
        assert_eq!(
            pack_sort_key(0, false, i32::MAX, 0, 0),
            pack_sort_key(0, false, 16_383, 0, 0)
        );
    }

    #[test]
    fn identities_are_masked_to_their_fields() {
        assert_eq!(
            pack_sort_key(0, false, 0, u64::MAX, 0) >> 40,
            pack_sort_key(0, false, 0, 0, 0) >> 40
        );
        assert_eq!(pack_sort_key(0, false, 0, 0, u64::MAX) >> 20, (128 << 36) | (16_384 << 20));
    }
}
