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

//! Flattens the pool and builds entities whose state changed.

use super::RenderLane;
use stratum_core::renderer::{GraphicsDevice, ProgramSourceFactory};
use stratum_data::{EntityPool, ResourceCaches};

/// Outcome of one build pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildReport {
    /// Entities that now have a program and chunks.
    pub built: usize,
    /// Entities whose program failed to compile.
    pub failed: usize,
}

/// Acquires programs and chunks for pending entities.
#[derive(Debug, Clone)]
pub struct EntityBuildLane {
    scene: String,
}

impl EntityBuildLane {
    /// Creates the lane for the scene named `scene` (used in log messages).
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
        }
    }

    /// Resets the flat list to insertion order and builds every pending entity.
    ///
    /// Compile failures are logged and leave the entity excluded until its
    /// next state change; they never abort the pass.
    pub fn run(
        &self,
        pool: &mut EntityPool,
        caches: &mut ResourceCaches,
        factory: &dyn ProgramSourceFactory,
        device: &mut dyn GraphicsDevice,
    ) -> BuildReport {
        pool.flatten();
        let mut report = BuildReport::default();
        for id in pool.pending() {
            let Some(entity) = pool.get_mut(id) else {
                continue;
            };
            match caches.build_entity(entity, factory, device) {
                Ok(()) => report.built += 1,
                Err(err) => {
                    log::error!(
                        "Scene '{}': {id} excluded, program '{}' failed: {err}",
                        self.scene,
                        entity.program_hash()
                    );
                    report.failed += 1;
                }
            }
        }
        log::trace!(
            "Scene '{}': built {} entities ({} failed).",
            self.scene,
            report.built,
            report.failed
        );
        report
    }
}

impl RenderLane for EntityBuildLane {
    fn lane_name(&self) -> &'static str {
        "entity_build"
    }
}
