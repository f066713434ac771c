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

//! Reference-counted caches of compiled programs and resource chunks.

mod chunk_factory;
mod program_cache;

pub use self::chunk_factory::{Chunk, ChunkFactory, ChunkKey, ChunkState};
pub use self::program_cache::{Program, ProgramCache};

use crate::pool::RenderEntity;
use stratum_core::renderer::{GraphicsDevice, ProgramError, ProgramSourceFactory, StageSlot};

/// The program cache and chunk factory of one scene, managed together so an
/// entity's references are always taken and dropped as a set.
#[derive(Debug, Default)]
pub struct ResourceCaches {
    /// Compiled programs.
    pub programs: ProgramCache,
    /// Resource chunks.
    pub chunks: ChunkFactory,
}

impl ResourceCaches {
    /// Creates empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the program and every chunk for `entity`'s current cores.
    ///
    /// New references are taken before the previous ones are dropped, so state
    /// shared with the old binding is never evicted and recompiled. On failure
    /// the entity is left without a program or chunks.
    ///
    /// The entity is marked built in both cases; it is retried on its next
    /// state change.
    pub fn build_entity(
        &mut self,
        entity: &mut RenderEntity,
        factory: &dyn ProgramSourceFactory,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(), ProgramError> {
        let previous_program = entity.program.take();
        let previous_chunks = std::mem::take(&mut entity.chunks);
        entity.mark_built();

        let cores = entity.shader_cores();
        let hash = entity.program_hash().to_owned();
        let result = self
            .programs
            .acquire(&hash, &cores.snapshot(), factory, device);

        if let Ok(program_id) = result {
            if let Some(program) = self.programs.get(program_id).cloned() {
                for slot in StageSlot::ALL {
                    let state = ChunkState::for_slot(slot, entity, &program);
                    entity.chunks[slot.index()] = Some(self.chunks.acquire(program_id, state));
                }
                entity.program = Some(program_id);
            }
        }

        for chunk in previous_chunks.into_iter().flatten() {
            self.chunks.release(chunk);
        }
        if let Some(program) = previous_program {
            self.programs.release(program, device);
        }
        result.map(|_| ())
    }

    /// Drops every reference held by `entity`.
    pub fn release_entity(&mut self, entity: &mut RenderEntity, device: &mut dyn GraphicsDevice) {
        for chunk in std::mem::take(&mut entity.chunks).into_iter().flatten() {
            self.chunks.release(chunk);
        }
        if let Some(program) = entity.program.take() {
            self.programs.release(program, device);
        }
    }

    /// Drops everything, destroying device programs.
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        self.chunks.clear();
        self.programs.clear(device);
    }
}
