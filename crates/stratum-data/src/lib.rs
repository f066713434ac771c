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

//! # Stratum Data
//!
//! Owns the mutable data of a scene renderer: the render-entity pool and the
//! two reference-counted caches (compiled programs and resource chunks) that
//! entities share.

#![warn(missing_docs)]

pub mod cache;
pub mod pool;

pub use cache::{Chunk, ChunkFactory, ChunkKey, ChunkState, Program, ProgramCache, ResourceCaches};
pub use pool::{EntityPool, RenderEntity, SORT_KEY_EXCLUDED};
