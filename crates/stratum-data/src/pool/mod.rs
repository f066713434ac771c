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

//! The render-entity pool.

mod entity;

pub use self::entity::{RenderEntity, ShaderCores, SORT_KEY_EXCLUDED};

use std::collections::BTreeMap;
use stratum_core::renderer::EntityId;
use stratum_core::state::StateCore;

/// All render entities of one scene, plus the flat draw order derived from them.
///
/// The pool only stores; it never touches the device. Removing an entity hands
/// it back so the caller can release its program and chunks.
#[derive(Debug, Default)]
pub struct EntityPool {
    entities: BTreeMap<EntityId, RenderEntity>,
    order: Vec<EntityId>,
    next_id: u64,
}

impl EntityPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new entity with the given cores (defaults for the rest).
    pub fn insert(&mut self, cores: impl IntoIterator<Item = StateCore>) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.entities.insert(id, RenderEntity::new(id, cores));
        log::trace!("Inserted {id}.");
        id
    }

    /// Replaces one core of an entity.
    ///
    /// Returns `true` if the entity changed. Unknown entities are logged and ignored.
    pub fn set_core(&mut self, id: EntityId, core: StateCore) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => entity.set_core(core),
            None => {
                log::warn!("Ignoring {:?} core for unknown {id}.", core.aspect());
                false
            }
        }
    }

    /// Removes an entity and hands it back for resource release.
    pub fn remove(&mut self, id: EntityId) -> Option<RenderEntity> {
        let entity = self.entities.remove(&id)?;
        self.order.retain(|other| *other != id);
        log::trace!("Removed {id}.");
        Some(entity)
    }

    /// Removes every entity.
    pub fn drain(&mut self) -> Vec<RenderEntity> {
        self.order.clear();
        std::mem::take(&mut self.entities).into_values().collect()
    }

    /// Looks up an entity.
    pub fn get(&self, id: EntityId) -> Option<&RenderEntity> {
        self.entities.get(&id)
    }

    /// Looks up an entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut RenderEntity> {
        self.entities.get_mut(&id)
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Resets the flat order to id (insertion) order.
    pub fn flatten(&mut self) {
        self.order.clear();
        self.order.extend(self.entities.keys().copied());
    }

    /// The current flat order.
    pub fn order(&self) -> &[EntityId] {
        &self.order
    }

    /// Replaces the flat order. Ids not in the pool are dropped.
    pub fn set_order(&mut self, order: Vec<EntityId>) {
        self.order = order;
        let entities = &self.entities;
        self.order.retain(|id| entities.contains_key(id));
    }

    /// Entities in the current flat order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &RenderEntity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderEntity> {
        self.entities.values()
    }

    /// Entities in id order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RenderEntity> {
        self.entities.values_mut()
    }

    /// Ids of entities waiting for a build.
    pub fn pending(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| entity.needs_build())
            .map(RenderEntity::id)
            .collect()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::state::{Core, MaterialCore};

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut pool = EntityPool::new();
        let a = pool.insert([]);
        let b = pool.insert([]);
        pool.remove(b);
        let c = pool.insert([]);
        assert!(a < b && b < c);
    }

    #[test]
    fn flatten_lists_entities_in_insertion_order() {
        let mut pool = EntityPool::new();
        let ids: Vec<_> = (0..4).map(|_| pool.insert([])).collect();
        pool.remove(ids[1]);
        pool.flatten();
        assert_eq!(pool.order(), &[ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn set_core_on_unknown_entity_is_ignored() {
        let mut pool = EntityPool::new();
        let core = StateCore::from_core(Core::new(MaterialCore::default()));
        assert!(!pool.set_core(EntityId(42), core));
    }

    #[test]
    fn pending_tracks_rebuilds() {
        let mut pool = EntityPool::new();
        let a = pool.insert([]);
        let b = pool.insert([]);
        assert_eq!(pool.pending(), vec![a, b]);
        for entity in pool.iter_mut() {
            entity.mark_built();
        }
        assert!(pool.pending().is_empty());
        pool.set_core(b, StateCore::from_core(Core::new(MaterialCore::default())));
        assert_eq!(pool.pending(), vec![b]);
    }

    #[test]
    fn set_order_drops_dead_ids() {
        let mut pool = EntityPool::new();
        let a = pool.insert([]);
        let b = pool.insert([]);
        pool.set_order(vec![b, EntityId(99), a]);
        assert_eq!(pool.order(), &[b, a]);
    }
}
