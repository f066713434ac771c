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

use super::{Core, CoreRef, CoreValue, StateAspect};

/// Receives each replacement core of one aspect.
pub trait AspectObserver<T: CoreValue>: Send {
    /// Called after the observed value has been replaced.
    fn on_changed(&mut self, core: &CoreRef<T>);
}

impl<T: CoreValue, F: FnMut(&CoreRef<T>) + Send> AspectObserver<T> for F {
    fn on_changed(&mut self, core: &CoreRef<T>) {
        self(core)
    }
}

/// Token returned by [`Observable::on_changed`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    aspect: StateAspect,
}

impl SubscriptionHandle {
    /// Creates a handle for an observer registry keyed by `id`.
    pub fn new(id: u64, aspect: StateAspect) -> Self {
        Self { id, aspect }
    }

    /// Registry-local observer id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Aspect of the observed value.
    pub fn aspect(&self) -> StateAspect {
        self.aspect
    }
}

/// A replaceable core with typed change notification.
///
/// This is the component-side half of core ingestion: a component owns an
/// `Observable`, and every [`replace`](Self::replace) publishes a new core to
/// its observers (typically the scene that feeds the entity pool).
pub struct Observable<T: CoreValue> {
    current: CoreRef<T>,
    observers: Vec<(u64, Box<dyn AspectObserver<T>>)>,
    next_id: u64,
}

impl<T: CoreValue> Observable<T> {
    /// Wraps an initial value.
    pub fn new(value: T) -> Self {
        Self::from_core(Core::new(value))
    }

    /// Wraps an existing core.
    pub fn from_core(core: CoreRef<T>) -> Self {
        Self {
            current: core,
            observers: Vec::new(),
            next_id: 0,
        }
    }

    /// The current core.
    pub fn get(&self) -> &CoreRef<T> {
        &self.current
    }

    /// Publishes a new core built from `value` and returns it.
    pub fn replace(&mut self, value: T) -> CoreRef<T> {
        let core = Core::new(value);
        self.set_core(core.clone());
        core
    }

    /// Publishes an existing core. Setting the current core again is a no-op.
    pub fn set_core(&mut self, core: CoreRef<T>) {
        if core.id() == self.current.id() {
            return;
        }
        self.current = core;
        for (_, observer) in &mut self.observers {
            observer.on_changed(&self.current);
        }
    }

    /// Registers an observer.
    pub fn on_changed(&mut self, observer: impl AspectObserver<T> + 'static) -> SubscriptionHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        SubscriptionHandle::new(id, T::ASPECT)
    }

    /// Removes an observer. Returns `false` if the handle was not registered here.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        if handle.aspect != T::ASPECT {
            return false;
        }
        let before = self.observers.len();
        self.observers.retain(|(id, _)| *id != handle.id);
        self.observers.len() != before
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl<T: CoreValue> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("current", &self.current)
            .field("observers", &self.observers.len())
            .finish()
    }
}
