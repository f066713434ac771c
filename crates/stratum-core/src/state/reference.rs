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

use super::{CoreRef, CoreValue, StateCore, StateId};
use std::collections::HashMap;

/// A core given either directly or by the id of a previously registered core.
///
/// Resolved exactly once, when assigned to an entity.
#[derive(Debug, Clone)]
pub enum Ref<T: CoreValue> {
    /// The core itself.
    Direct(CoreRef<T>),
    /// A lookup key into a [`CoreRegistry`].
    ById(StateId),
}

impl<T: CoreValue> Ref<T> {
    /// Resolves to a concrete core.
    ///
    /// Unknown ids, and ids naming a core of another aspect, are logged and
    /// resolve to the aspect's shared default core.
    pub fn resolve(&self, registry: &CoreRegistry) -> CoreRef<T> {
        match self {
            Ref::Direct(core) => core.clone(),
            Ref::ById(id) => match registry.get(*id) {
                Some(core) => match T::unwrap(core) {
                    Some(typed) => typed.clone(),
                    None => {
                        log::warn!(
                            "Core {id} is a {:?} core, expected {:?}; using the default.",
                            core.aspect(),
                            T::ASPECT
                        );
                        T::default_core()
                    }
                },
                None => {
                    log::warn!(
                        "Unknown {:?} core {id}; using the default.",
                        T::ASPECT
                    );
                    T::default_core()
                }
            },
        }
    }
}

impl<T: CoreValue> From<CoreRef<T>> for Ref<T> {
    fn from(core: CoreRef<T>) -> Self {
        Ref::Direct(core)
    }
}

impl<T: CoreValue> From<StateId> for Ref<T> {
    fn from(id: StateId) -> Self {
        Ref::ById(id)
    }
}

/// Lookup table for cores shared by id.
#[derive(Debug, Default)]
pub struct CoreRegistry {
    cores: HashMap<StateId, StateCore>,
}

impl CoreRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a core under its own id and returns that id.
    pub fn register<T: CoreValue>(&mut self, core: CoreRef<T>) -> StateId {
        let id = core.id();
        self.cores.insert(id, T::wrap(core));
        id
    }

    /// Looks up a core of any aspect.
    pub fn get(&self, id: StateId) -> Option<&StateCore> {
        self.cores.get(&id)
    }

    /// Drops a registration. Entities already resolved keep their core.
    pub fn unregister(&mut self, id: StateId) -> Option<StateCore> {
        self.cores.remove(&id)
    }

    /// Number of registered cores.
    pub fn len(&self) -> usize {
        self.cores.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Core, MaterialCore, TagCore};

    #[test]
    fn direct_resolves_to_itself() {
        let core = Core::new(MaterialCore::default());
        let resolved = Ref::from(core.clone()).resolve(&CoreRegistry::new());
        assert_eq!(resolved.id(), core.id());
    }

    #[test]
    fn by_id_resolves_through_registry() {
        let mut registry = CoreRegistry::new();
        let core = Core::new(MaterialCore {
            alpha: 0.5,
            ..Default::default()
        });
        let id = registry.register(core.clone());
        let resolved: CoreRef<MaterialCore> = Ref::ById(id).resolve(&registry);
        assert_eq!(resolved.id(), core.id());
        assert_eq!(resolved.alpha, 0.5);
    }

    #[test]
    fn unknown_id_falls_back_to_default() {
        let resolved: CoreRef<MaterialCore> = Ref::ById(StateId(u64::MAX)).resolve(&CoreRegistry::new());
        assert_eq!(resolved.id(), MaterialCore::default_core().id());
    }

    #[test]
    fn wrong_aspect_falls_back_to_default() {
        let mut registry = CoreRegistry::new();
        let id = registry.register(Core::new(TagCore::default()));
        let resolved: CoreRef<MaterialCore> = Ref::ById(id).resolve(&registry);
        assert_eq!(resolved.id(), MaterialCore::default_core().id());
    }
}
