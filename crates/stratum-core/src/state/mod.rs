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

//! Render-state cores: the immutable value bags that describe one aspect of an
//! entity's render state (material, geometry, lights, and so on).
//!
//! A core is never mutated in place once the renderer has seen it. Components
//! publish a *new* core instead, and the owning entity re-derives its program
//! hash and chunks from the replacement. Every core carries a process-wide
//! unique [`StateId`] and a hash string that is a pure function of the fields
//! that influence shader generation.

mod cores;
mod observer;
mod reference;

pub use self::cores::*;
pub use self::observer::{AspectObserver, Observable, SubscriptionHandle};
pub use self::reference::{CoreRegistry, Ref};

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Process-wide unique identity of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StateId(pub u64);

impl StateId {
    /// Reserved id meaning "no core". Never returned by [`StateId::next`].
    pub const NONE: StateId = StateId(0);

    /// Allocates a fresh id.
    pub fn next() -> StateId {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StateId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle to an immutable core.
pub type CoreRef<T> = Arc<Core<T>>;

/// An immutable core value together with its identity and shader hash.
#[derive(Debug)]
pub struct Core<T> {
    id: StateId,
    hash: String,
    value: T,
}

impl<T: CoreValue> Core<T> {
    /// Wraps `value` in a new core with a fresh [`StateId`].
    pub fn new(value: T) -> CoreRef<T> {
        let hash = value.shader_hash();
        Arc::new(Self {
            id: StateId::next(),
            hash,
            value,
        })
    }
}

impl<T> Core<T> {
    /// The core's identity.
    pub fn id(&self) -> StateId {
        self.id
    }

    /// The shader-relevant hash. Empty for aspects that never affect shader text.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for Core<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Computes the part of a core that influences generated shader source.
pub trait ShaderHash {
    /// Returns a short string that is equal for any two values producing the
    /// same shader text. The default is empty (no influence).
    fn shader_hash(&self) -> String {
        String::new()
    }
}

/// Implemented by every core value type; ties it to its [`StateAspect`] and
/// its [`StateCore`] variant.
pub trait CoreValue: fmt::Debug + Default + ShaderHash + Send + Sync + Sized + 'static {
    /// The aspect this value describes.
    const ASPECT: StateAspect;

    /// Wraps a typed core in the tagged union.
    fn wrap(core: CoreRef<Self>) -> StateCore;

    /// Extracts a typed core from the tagged union, if the variant matches.
    fn unwrap(core: &StateCore) -> Option<&CoreRef<Self>>;

    /// The shared default core for this aspect.
    fn default_core() -> CoreRef<Self> {
        match Self::unwrap(&StateCore::default_for(Self::ASPECT)) {
            Some(core) => core.clone(),
            None => Core::new(Self::default()),
        }
    }
}

/// Number of distinct state aspects.
pub const ASPECT_COUNT: usize = 17;

macro_rules! state_aspects {
    ($($(#[$doc:meta])* $aspect:ident => $core:ty),* $(,)?) => {
        /// The kinds of render state an entity carries, one core per kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum StateAspect {
            $($(#[$doc])* $aspect),*
        }

        impl StateAspect {
            /// Every aspect, in declaration order.
            pub const ALL: [StateAspect; ASPECT_COUNT] = [$(StateAspect::$aspect),*];
        }

        /// A core of any aspect. Cloning is cheap (one `Arc` increment).
        #[derive(Debug, Clone)]
        pub enum StateCore {
            $($(#[$doc])* $aspect(CoreRef<$core>)),*
        }

        impl StateCore {
            /// The aspect of the wrapped core.
            pub fn aspect(&self) -> StateAspect {
                match self {
                    $(StateCore::$aspect(_) => StateAspect::$aspect),*
                }
            }

            /// The identity of the wrapped core.
            pub fn state_id(&self) -> StateId {
                match self {
                    $(StateCore::$aspect(c) => c.id()),*
                }
            }

            /// The shader hash of the wrapped core.
            pub fn hash(&self) -> &str {
                match self {
                    $(StateCore::$aspect(c) => c.hash()),*
                }
            }

            fn fresh_default(aspect: StateAspect) -> StateCore {
                match aspect {
                    $(StateAspect::$aspect => StateCore::$aspect(Core::new(<$core>::default()))),*
                }
            }
        }

        $(
            impl CoreValue for $core {
                const ASPECT: StateAspect = StateAspect::$aspect;

                fn wrap(core: CoreRef<Self>) -> StateCore {
                    StateCore::$aspect(core)
                }

                fn unwrap(core: &StateCore) -> Option<&CoreRef<Self>> {
                    match core {
                        StateCore::$aspect(c) => Some(c),
                        _ => None,
                    }
                }
            }
        )*
    };
}

state_aspects! {
    /// Render stage: coarse draw ordering and pickability.
    Stage => StageCore,
    /// Render layer: fine draw ordering and visibility.
    Layer => LayerCore,
    /// Offscreen render targets the entity draws into.
    RenderTarget => RenderTargetCore,
    /// Texture layers.
    Textures => TexturesCore,
    /// Drawable geometry.
    Geometry => GeometryCore,
    /// Enable flags (visibility, picking, clipping, transparency).
    Flags => FlagsCore,
    /// Draw-mode flags (culling, depth, blending).
    DrawMode => DrawModeCore,
    /// Tag used by scene tag filters.
    Tag => TagCore,
    /// Surface material.
    Material => MaterialCore,
    /// Light sources.
    Lights => LightsCore,
    /// User clip planes.
    ClipPlanes => ClipPlanesCore,
    /// Morph target data.
    Morph => MorphCore,
    /// Renderer flags (line width, point size, clear color).
    Renderer => RendererCore,
    /// Camera view and projection.
    View => ViewCore,
    /// Model transform.
    Transform => TransformCore,
    /// Custom shader source and uniforms.
    Shader => ShaderCore,
    /// Pick name.
    Name => NameCore,
}

impl StateCore {
    /// Returns the shared default core for `aspect`.
    ///
    /// Defaults are created once per process so that every entity falling back
    /// to a default shares one identity, and therefore one chunk.
    pub fn default_for(aspect: StateAspect) -> StateCore {
        static DEFAULTS: OnceLock<[StateCore; ASPECT_COUNT]> = OnceLock::new();
        DEFAULTS.get_or_init(|| StateAspect::ALL.map(StateCore::fresh_default))[aspect.index()]
            .clone()
    }

    /// Wraps a typed core.
    pub fn from_core<T: CoreValue>(core: CoreRef<T>) -> StateCore {
        T::wrap(core)
    }
}

impl StateAspect {
    /// Position of the aspect in [`StateAspect::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether cores of this aspect feed the program hash.
    pub fn affects_program(self) -> bool {
        PROGRAM_ASPECTS.contains(&self)
    }
}

/// Aspects whose hashes are concatenated, in this order, into an entity's
/// program hash.
pub const PROGRAM_ASPECTS: [StateAspect; 7] = [
    StateAspect::Geometry,
    StateAspect::Flags,
    StateAspect::Lights,
    StateAspect::ClipPlanes,
    StateAspect::Morph,
    StateAspect::Textures,
    StateAspect::Shader,
];
