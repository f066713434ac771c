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

//! Compiles the sorted pool into the draw and pick lists.

use super::{RenderLane, TagFilter};
use ahash::AHashMap;
use stratum_core::graph::topological_sort;
use stratum_core::renderer::pick::MAX_PICK_ID;
use stratum_core::renderer::{ChunkId, DrawCommand, DrawList, PickEntry, StageSlot, SLOT_COUNT};
use stratum_core::state::{
    CoreRef, FlagsCore, LayerCore, NameCore, RendererCore, RenderTargetCore, StageCore, StateId, TagCore,
    TexturesCore, ViewCore,
};
use stratum_data::{EntityPool, RenderEntity};

/// Last chunk emitted per slot. Reset whenever the bound target changes.
type SlotTracker = [Option<ChunkId>; SLOT_COUNT];

struct TargetBin<'a> {
    target: CoreRef<RenderTargetCore>,
    entities: Vec<&'a RenderEntity>,
}

/// Builds a [`DrawList`] from the pool's current (sorted) order.
#[derive(Debug, Clone, Copy)]
pub struct DrawListLane {
    pick_capacity: u32,
}

impl Default for DrawListLane {
    fn default() -> Self {
        Self {
            pick_capacity: MAX_PICK_ID,
        }
    }
}

impl DrawListLane {
    /// Creates the lane.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of pick entries per list, never above [`MAX_PICK_ID`].
    pub fn with_pick_capacity(mut self, capacity: u32) -> Self {
        self.pick_capacity = capacity.min(MAX_PICK_ID);
        self
    }

    /// Culls, partitions by render target, and emits both lists.
    ///
    /// Offscreen bins come first, ordered so that a bin writing a target
    /// precedes every bin sampling it, followed by a single
    /// [`DrawCommand::BindDefaultTarget`] and the on-screen entities. Only
    /// on-screen entities are pickable.
    pub fn compile(&self, pool: &EntityPool, filter: Option<&TagFilter>) -> DrawList {
        let mut bins: Vec<TargetBin<'_>> = Vec::new();
        let mut bin_of: AHashMap<StateId, usize> = AHashMap::new();
        let mut on_screen: Vec<&RenderEntity> = Vec::new();

        for entity in pool.iter_ordered() {
            if !Self::is_visible(entity, filter) {
                continue;
            }
            let target = entity.get::<RenderTargetCore>();
            if !target.is_offscreen() {
                on_screen.push(entity);
                continue;
            }
            let index = *bin_of.entry(target.id()).or_insert_with(|| {
                bins.push(TargetBin {
                    target: target.clone(),
                    entities: Vec::new(),
                });
                bins.len() - 1
            });
            bins[index].entities.push(entity);
        }

        let mut list = DrawList::default();
        for index in Self::bin_order(&bins) {
            let bin = &bins[index];
            list.draw.push(DrawCommand::BindRenderTarget(bin.target.clone()));
            let mut draw_last: SlotTracker = [None; SLOT_COUNT];
            for entity in &bin.entities {
                Self::emit_draw(entity, &mut draw_last, &mut list.draw);
            }
        }
        if !bins.is_empty() {
            list.draw.push(DrawCommand::BindDefaultTarget);
        }

        let mut draw_last: SlotTracker = [None; SLOT_COUNT];
        let mut pick_last: SlotTracker = [None; SLOT_COUNT];
        let mut unregistered = 0usize;
        list.clear_color = on_screen
            .iter()
            .find_map(|entity| entity.get::<RendererCore>().clear_color);
        for entity in on_screen {
            Self::emit_draw(entity, &mut draw_last, &mut list.draw);
            if Self::is_pickable(entity) && !self.emit_pick(entity, &mut pick_last, &mut list) {
                unregistered += 1;
            }
        }
        if unregistered > 0 {
            log::warn!(
                "Pick list is full ({} entries); {unregistered} named entities cannot be picked.",
                self.pick_capacity
            );
        }

        log::trace!(
            "Compiled draw list: {} draw, {} pick commands, {} pick entries.",
            list.draw.len(),
            list.pick.len(),
            list.pick_entries.len()
        );
        list
    }

    fn is_visible(entity: &RenderEntity, filter: Option<&TagFilter>) -> bool {
        if entity.program.is_none() {
            return false;
        }
        if !entity.get::<FlagsCore>().enabled || !entity.get::<LayerCore>().enabled {
            return false;
        }
        match filter {
            Some(filter) => filter.accepts(entity.get::<TagCore>().tag.as_deref()),
            None => true,
        }
    }

    fn is_pickable(entity: &RenderEntity) -> bool {
        entity.get::<StageCore>().pickable && entity.get::<FlagsCore>().picking
    }

    /// Producer bins before consumer bins; first-appearance order otherwise.
    fn bin_order(bins: &[TargetBin<'_>]) -> Vec<usize> {
        let mut edges = Vec::new();
        for (producer, bin) in bins.iter().enumerate() {
            for (consumer, other) in bins.iter().enumerate() {
                if producer == consumer {
                    continue;
                }
                let samples_producer = other.entities.iter().any(|entity| {
                    entity
                        .get::<TexturesCore>()
                        .sampled_targets()
                        .any(|target| bin.target.targets.contains(&target))
                });
                if samples_producer {
                    edges.push((producer, consumer));
                }
            }
        }
        match topological_sort(0..bins.len(), edges) {
            Ok(order) => order,
            Err(_) => {
                log::warn!(
                    "Render targets sample each other in a cycle; using declaration order."
                );
                (0..bins.len()).collect()
            }
        }
    }

    fn emit_draw(entity: &RenderEntity, last: &mut SlotTracker, out: &mut Vec<DrawCommand>) {
        for slot in StageSlot::ALL {
            if !slot.in_draw_list() {
                continue;
            }
            let Some(chunk) = entity.chunks[slot.index()] else {
                continue;
            };
            if slot.is_unique() || last[slot.index()] != Some(chunk) {
                out.push(DrawCommand::Apply(chunk));
                last[slot.index()] = Some(chunk);
            }
        }
    }

    /// Emits one entity into the pick list. The name is emitted for every
    /// entity, even when the Name chunk is shared, so each entity gets its own
    /// pick id. Returns `false` if a named entity found the list full.
    fn emit_pick(
        &self,
        entity: &RenderEntity,
        last: &mut SlotTracker,
        list: &mut DrawList,
    ) -> bool {
        let mut registered = true;
        for slot in StageSlot::ALL {
            let Some(chunk) = entity.chunks[slot.index()] else {
                continue;
            };
            if slot == StageSlot::Name {
                let pick_id = match &entity.get::<NameCore>().name {
                    Some(_) if list.pick_entries.len() >= self.pick_capacity as usize => {
                        registered = false;
                        0
                    }
                    Some(name) => {
                        list.pick_entries.push(PickEntry {
                            entity: entity.id(),
                            name: name.clone(),
                            view: entity.get::<ViewCore>(),
                        });
                        list.pick_entries.len() as u32
                    }
                    None => 0,
                };
                last[slot.index()] = Some(chunk);
                list.pick.push(DrawCommand::PickName { chunk, pick_id });
                continue;
            }
            if !slot.is_unique() && last[slot.index()] == Some(chunk) {
                continue;
            }
            last[slot.index()] = Some(chunk);
            list.pick.push(DrawCommand::Apply(chunk));
        }
        registered
    }
}

impl RenderLane for DrawListLane {
    fn lane_name(&self) -> &'static str {
        "draw_list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::{DefaultProgramSourceFactory, EntityBuildLane, SortKeyLane};
    use stratum_core::renderer::RenderTargetId;
    use stratum_core::state::{
        Core, MapKind, MaterialCore, StateCore, TextureLayer, TextureSource,
    };
    use stratum_data::ResourceCaches;
    use stratum_infra::HeadlessDevice;

    struct Fixture {
        pool: EntityPool,
        caches: ResourceCaches,
        device: HeadlessDevice,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                pool: EntityPool::new(),
                caches: ResourceCaches::new(),
                device: HeadlessDevice::new(16, 16),
            }
        }

        fn compile(&mut self, filter: Option<&TagFilter>) -> DrawList {
            EntityBuildLane::new("test").run(
                &mut self.pool,
                &mut self.caches,
                &DefaultProgramSourceFactory,
                &mut self.device,
            );
            let sort = SortKeyLane::new();
            sort.compute_keys(&mut self.pool, &self.caches.programs);
            sort.sort(&mut self.pool);
            DrawListLane::new().compile(&self.pool, filter)
        }
    }

    fn core<T: stratum_core::state::CoreValue>(value: T) -> StateCore {
        StateCore::from_core(Core::new(value))
    }

    fn offscreen(target: u32) -> CoreRef<RenderTargetCore> {
        Core::new(RenderTargetCore {
            targets: vec![RenderTargetId(target)],
        })
    }

    fn sampling(target: u32) -> StateCore {
        core(TexturesCore {
            layers: vec![TextureLayer::new(
                TextureSource::RenderTarget(RenderTargetId(target)),
                MapKind::BaseColor,
            )],
        })
    }

    fn bound_targets(list: &DrawList) -> Vec<Option<RenderTargetId>> {
        list.draw
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::BindRenderTarget(core) => Some(core.targets.first().copied()),
                DrawCommand::BindDefaultTarget => Some(None),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn shared_state_is_emitted_once_but_geometry_every_time() {
        let mut fx = Fixture::new();
        fx.pool.insert([]);
        fx.pool.insert([]);
        let list = fx.compile(None);

        // Name never reaches the draw list: 11 slots for the first entity,
        // then only the unique geometry chunk for the second.
        assert_eq!(list.draw.len(), SLOT_COUNT - 1 + 1);
        assert!(matches!(list.draw.last(), Some(DrawCommand::Apply(_))));
        let chunks: Vec<_> = list.applied_chunks().collect();
        assert_eq!(chunks[chunks.len() - 1], chunks[chunks.len() - 2]);
    }

    #[test]
    fn disabled_and_filtered_entities_are_culled() {
        let mut fx = Fixture::new();
        fx.pool.insert([core(FlagsCore {
            enabled: false,
            ..Default::default()
        })]);
        fx.pool.insert([core(LayerCore {
            enabled: false,
            ..Default::default()
        })]);
        fx.pool.insert([core(TagCore {
            tag: Some("hidden".into()),
        })]);
        let kept = fx.pool.insert([core(TagCore {
            tag: Some("shown".into()),
        })]);
        let untagged = fx.pool.insert([]);

        let filter = TagFilter::parse("shown").unwrap();
        let list = fx.compile(Some(&filter));
        let geometry_draws = list
            .applied_chunks()
            .filter(|id| {
                [kept, untagged]
                    .iter()
                    .any(|e| fx.pool.get(*e).unwrap().chunks[StageSlot::Geometry.index()] == Some(*id))
            })
            .count();
        // The two visible entities share one geometry chunk, drawn twice.
        assert_eq!(geometry_draws, 2);
        assert_eq!(list.applied_chunks().count(), SLOT_COUNT - 1 + 1);
    }

    #[test]
    fn entity_without_program_is_excluded() {
        let mut fx = Fixture::new();
        fx.device.fail_compiles_matching("gt");
        fx.pool.insert([]);
        let list = fx.compile(None);
        assert!(list.is_empty());
        assert!(list.pick.is_empty());
    }

    #[test]
    fn producer_targets_render_before_consumers() {
        let mut fx = Fixture::new();
        let target_a = offscreen(1);
        let target_b = offscreen(2);
        // Declared consumer-first: B samples A's output.
        fx.pool.insert([StateCore::from_core(target_b), sampling(1)]);
        fx.pool.insert([StateCore::from_core(target_a)]);
        fx.pool.insert([sampling(2)]);

        let list = fx.compile(None);
        assert_eq!(
            bound_targets(&list),
            vec![Some(RenderTargetId(1)), Some(RenderTargetId(2)), None]
        );
    }

    #[test]
    fn target_cycle_falls_back_to_declaration_order() {
        let mut fx = Fixture::new();
        fx.pool.insert([StateCore::from_core(offscreen(1)), sampling(2)]);
        fx.pool.insert([StateCore::from_core(offscreen(2)), sampling(1)]);
        let list = fx.compile(None);
        assert_eq!(
            bound_targets(&list),
            vec![Some(RenderTargetId(1)), Some(RenderTargetId(2)), None]
        );
    }

    #[test]
    fn no_offscreen_bins_means_no_default_bind() {
        let mut fx = Fixture::new();
        fx.pool.insert([]);
        let list = fx.compile(None);
        assert!(bound_targets(&list).is_empty());
    }

    #[test]
    fn dedup_restarts_after_a_target_switch() {
        let mut fx = Fixture::new();
        let material = core(MaterialCore::default());
        fx.pool.insert([StateCore::from_core(offscreen(1)), material.clone()]);
        fx.pool.insert([material]);
        let list = fx.compile(None);
        // Both bins re-emit every draw slot.
        assert_eq!(list.applied_chunks().count(), 2 * (SLOT_COUNT - 1));
    }

    #[test]
    fn pick_list_names_and_filters() {
        let mut fx = Fixture::new();
        let named = fx.pool.insert([core(NameCore {
            name: Some("door".into()),
        })]);
        fx.pool.insert([]);
        fx.pool.insert([
            core(NameCore {
                name: Some("ghost".into()),
            }),
            core(FlagsCore {
                picking: false,
                ..Default::default()
            }),
        ]);
        fx.pool.insert([
            core(NameCore {
                name: Some("sky".into()),
            }),
            core(StageCore {
                priority: 3,
                pickable: false,
            }),
        ]);
        fx.pool.insert([
            StateCore::from_core(offscreen(4)),
            core(NameCore {
                name: Some("mirror".into()),
            }),
        ]);

        let list = fx.compile(None);
        assert_eq!(list.pick_entries.len(), 1);
        assert_eq!(list.pick_entries[0].entity, named);
        assert_eq!(list.pick_entries[0].name, "door");

        let names: Vec<u32> = list
            .pick
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::PickName { pick_id, .. } => Some(*pick_id),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec![1, 0]);
        assert!(list
            .pick
            .iter()
            .all(|cmd| !matches!(cmd, DrawCommand::BindRenderTarget(_))));
    }

    fn pick_ids(list: &DrawList) -> Vec<u32> {
        list.pick
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::PickName { pick_id, .. } => Some(*pick_id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn entities_sharing_a_name_core_get_their_own_pick_ids() {
        let mut fx = Fixture::new();
        let name = StateCore::from_core(Core::new(NameCore {
            name: Some("crate".into()),
        }));
        let first = fx.pool.insert([name.clone()]);
        let second = fx.pool.insert([name]);

        let list = fx.compile(None);
        assert_eq!(pick_ids(&list), vec![1, 2]);
        let entities: Vec<_> = list.pick_entries.iter().map(|e| e.entity).collect();
        assert_eq!(entities, vec![first, second]);
        assert!(list.pick_entries.iter().all(|e| e.name == "crate"));
    }

    #[test]
    fn full_pick_list_stops_registering_names() {
        let mut fx = Fixture::new();
        for name in ["a", "b", "c"] {
            fx.pool.insert([core(NameCore {
                name: Some(name.into()),
            })]);
        }
        EntityBuildLane::new("test").run(
            &mut fx.pool,
            &mut fx.caches,
            &DefaultProgramSourceFactory,
            &mut fx.device,
        );
        let list = DrawListLane::new()
            .with_pick_capacity(2)
            .compile(&fx.pool, None);
        assert_eq!(list.pick_entries.len(), 2);
        assert_eq!(pick_ids(&list), vec![1, 2, 0]);
    }
}
