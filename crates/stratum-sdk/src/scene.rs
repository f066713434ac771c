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

//! Scenes: the client-facing handle over one [`SceneRenderer`].

use std::fmt;
use std::marker::PhantomData;
use stratum_agents::{FrameReport, PickHit, PickOptions, RenderOptions, SceneRenderer};
use stratum_core::event::EventBus;
use stratum_core::renderer::{EntityId, GraphicsDevice, PickError, RenderError};
use stratum_core::state::{
    AspectObserver, Core, CoreRef, CoreRegistry, CoreValue, Ref, StateCore, SubscriptionHandle,
};
use stratum_core::RendererSettings;

/// Identifier of a scene within its [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// Delivered to tick listeners once per frame, before any scene compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// The scene receiving the event.
    pub scene: SceneId,
}

/// Structural changes queued through [`Scene::event_sender`].
///
/// Events are applied in send order at the start of the next tick.
#[derive(Debug, Clone)]
pub enum SceneEvent {
    /// Replace one core of an entity.
    SetCore {
        /// Target entity.
        entity: EntityId,
        /// The new core.
        core: StateCore,
    },
    /// Remove an entity.
    Remove(EntityId),
    /// Recompute sort keys.
    MarkOrderDirty,
    /// Replace the tag filter (`None` clears it).
    SetTagFilter(Option<String>),
}

trait CoreListener: Send {
    fn notify(&mut self, core: &StateCore);
}

struct TypedListener<T, O> {
    observer: O,
    _aspect: PhantomData<fn() -> T>,
}

impl<T: CoreValue, O: AspectObserver<T>> CoreListener for TypedListener<T, O> {
    fn notify(&mut self, core: &StateCore) {
        if let Some(typed) = T::unwrap(core) {
            self.observer.on_changed(typed);
        }
    }
}

struct Subscription {
    handle: SubscriptionHandle,
    entity: EntityId,
    listener: Box<dyn CoreListener>,
}

type TickListener = Box<dyn FnMut(&TickEvent) + Send>;

/// A retained scene: a set of entities built from state cores.
pub struct Scene {
    id: SceneId,
    renderer: SceneRenderer,
    events: EventBus<SceneEvent>,
    registry: CoreRegistry,
    tick_listeners: Vec<TickListener>,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("renderer", &self.renderer)
            .field("pending_events", &self.events.pending())
            .field("tick_listeners", &self.tick_listeners.len())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl Scene {
    pub(crate) fn new(id: SceneId, name: &str, settings: RendererSettings) -> Self {
        Self {
            id,
            renderer: SceneRenderer::new(name, settings),
            events: EventBus::new(),
            registry: CoreRegistry::new(),
            tick_listeners: Vec::new(),
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The scene id.
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// The scene name.
    pub fn name(&self) -> &str {
        self.renderer.name()
    }

    /// The underlying renderer, for inspection.
    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    /// Cores shared by id within this scene.
    pub fn registry(&self) -> &CoreRegistry {
        &self.registry
    }

    /// Mutable access to the shared-core registry.
    pub fn registry_mut(&mut self) -> &mut CoreRegistry {
        &mut self.registry
    }

    /// Starts building a new entity.
    pub fn spawn(&mut self) -> EntityBuilder<'_> {
        EntityBuilder {
            scene: self,
            cores: Vec::new(),
        }
    }

    /// Inserts an entity from ready-made cores.
    pub fn insert(&mut self, cores: impl IntoIterator<Item = StateCore>) -> EntityId {
        self.renderer.insert(cores)
    }

    /// Whether `entity` is alive.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.renderer.entity(entity).is_some()
    }

    /// The current core of aspect `T` on `entity`.
    pub fn get<T: CoreValue>(&self, entity: EntityId) -> Option<CoreRef<T>> {
        self.renderer.entity(entity).map(|e| e.get::<T>())
    }

    /// Replaces one core and notifies observers. Returns `false` when the
    /// entity is unknown or already holds that core.
    pub fn set_core(&mut self, entity: EntityId, core: StateCore) -> bool {
        if !self.renderer.set_core(entity, core.clone()) {
            return false;
        }
        let aspect = core.aspect();
        for subscription in &mut self.subscriptions {
            if subscription.entity == entity && subscription.handle.aspect() == aspect {
                subscription.listener.notify(&core);
            }
        }
        true
    }

    /// Replaces the `T` core of `entity` with a fresh core holding `value`.
    pub fn set<T: CoreValue>(&mut self, entity: EntityId, value: T) -> bool {
        self.set_core(entity, T::wrap(Core::new(value)))
    }

    /// Assigns a core given directly or by registry id.
    pub fn assign<T: CoreValue>(&mut self, entity: EntityId, core: impl Into<Ref<T>>) -> bool {
        let resolved = core.into().resolve(&self.registry);
        self.set_core(entity, T::wrap(resolved))
    }

    /// Removes an entity, releasing its device resources immediately.
    pub fn remove(&mut self, entity: EntityId, device: &mut dyn GraphicsDevice) -> bool {
        let removed = self.renderer.remove(entity, device);
        if removed {
            self.subscriptions.retain(|s| s.entity != entity);
        }
        removed
    }

    /// Forces sort keys to be recomputed next frame.
    pub fn mark_order_dirty(&mut self) {
        self.renderer.mark_order_dirty();
    }

    /// Sets or clears the tag filter. Malformed patterns are logged and ignored.
    pub fn set_tag_filter(&mut self, pattern: Option<&str>) {
        self.renderer.set_tag_filter(pattern);
    }

    /// Registers a listener called at the start of every frame.
    pub fn on_tick(&mut self, listener: impl FnMut(&TickEvent) + Send + 'static) {
        self.tick_listeners.push(Box::new(listener));
    }

    /// Observes replacements of the `T` core of `entity`.
    pub fn observe<T: CoreValue>(
        &mut self,
        entity: EntityId,
        observer: impl AspectObserver<T> + 'static,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new(self.next_subscription, T::ASPECT);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            handle,
            entity,
            listener: Box::new(TypedListener {
                observer,
                _aspect: PhantomData,
            }),
        });
        handle
    }

    /// Removes an observer. Returns `false` for unknown handles.
    pub fn unobserve(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.handle != handle);
        self.subscriptions.len() != before
    }

    /// A sender for queuing [`SceneEvent`]s, usable from any thread.
    pub fn event_sender(&self) -> flume::Sender<SceneEvent> {
        self.events.sender()
    }

    /// Applies every queued event. Returns the number applied.
    pub fn process_events(&mut self, device: &mut dyn GraphicsDevice) -> usize {
        let events = self.events.drain();
        let count = events.len();
        for event in events {
            match event {
                SceneEvent::SetCore { entity, core } => {
                    self.set_core(entity, core);
                }
                SceneEvent::Remove(entity) => {
                    if !self.remove(entity, device) {
                        log::warn!("Scene '{}': cannot remove unknown {entity}.", self.name());
                    }
                }
                SceneEvent::MarkOrderDirty => self.mark_order_dirty(),
                SceneEvent::SetTagFilter(pattern) => self.set_tag_filter(pattern.as_deref()),
            }
        }
        count
    }

    /// Applies queued events and compiles stale stages without submitting.
    /// Returns whether the scene's image is stale.
    pub fn prepare(&mut self, device: &mut dyn GraphicsDevice) -> bool {
        self.process_events(device);
        self.renderer.compile(device);
        self.renderer.needs_image()
    }

    /// Renders one frame of this scene, applying queued events first.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        options: RenderOptions,
    ) -> Result<FrameReport, RenderError> {
        self.process_events(device);
        self.renderer.render(device, options)
    }

    /// Resolves the entity drawn at `(x, y)`, applying queued events first.
    pub fn pick(
        &mut self,
        device: &mut dyn GraphicsDevice,
        x: u32,
        y: u32,
        options: PickOptions,
    ) -> Result<Option<PickHit>, PickError> {
        self.process_events(device);
        self.renderer.pick(device, x, y, options)
    }

    /// Releases every entity and device program of the scene.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.events.drain();
        self.subscriptions.clear();
        self.tick_listeners.clear();
        self.renderer.destroy(device);
    }

    pub(crate) fn notify_tick(&mut self, frame: u64) {
        let event = TickEvent {
            frame,
            scene: self.id,
        };
        for listener in &mut self.tick_listeners {
            listener(&event);
        }
    }
}

/// Collects cores for a new entity. Aspects left unset use their defaults.
pub struct EntityBuilder<'a> {
    scene: &'a mut Scene,
    cores: Vec<StateCore>,
}

impl EntityBuilder<'_> {
    /// Adds a fresh core holding `value`.
    pub fn with<T: CoreValue>(mut self, value: T) -> Self {
        self.cores.push(T::wrap(Core::new(value)));
        self
    }

    /// Adds a core given directly or by registry id.
    pub fn with_ref<T: CoreValue>(mut self, core: impl Into<Ref<T>>) -> Self {
        let resolved = core.into().resolve(&self.scene.registry);
        self.cores.push(T::wrap(resolved));
        self
    }

    /// Adds an existing core.
    pub fn with_core(mut self, core: StateCore) -> Self {
        self.cores.push(core);
        self
    }

    /// Inserts the entity.
    pub fn build(self) -> EntityId {
        self.scene.insert(self.cores)
    }
}
