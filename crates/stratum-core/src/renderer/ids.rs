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

//! Identifiers shared across the pipeline.

use std::fmt;

slotmap::new_key_type! {
    /// Handle to a cached, compiled program.
    pub struct ProgramId;
    /// Handle to a cached resource chunk.
    pub struct ChunkId;
}

impl ProgramId {
    /// Arena slot of the program. Stable while the program is cached; a
    /// freed slot is reused by the next program, so the value stays bounded
    /// by the number of live programs.
    pub fn slot_index(self) -> u32 {
        slotmap::Key::data(&self).as_ffi() as u32
    }
}

/// Identity of a render entity. Allocated monotonically and never reused, so
/// ordering by id is ordering by insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// An offscreen color + depth render target owned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub u32);

/// A texture image owned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// A program object compiled and linked by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceProgramId(pub u64);
