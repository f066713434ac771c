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

//! Acts as the agent for scene rendering.
//!
//! A [`SceneRenderer`] owns the entity pool and resource caches of one scene
//! and decides, from its [`DirtyScheduler`], which lanes must run this frame:
//! entity build, sort keys, sort, draw list compilation and submission. Pick
//! queries reuse the compiled pick list and refresh the pick buffers lazily.

mod agent;
mod dirty;
mod picking;

pub use agent::*;
pub use dirty::*;
pub use picking::*;
