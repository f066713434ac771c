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

//! Backend-agnostic rendering contracts for Stratum.
//!
//! This module is the common language between the compilation pipeline and a
//! graphics device: identifiers, the [`GraphicsDevice`] trait, the commands
//! chunks issue through a [`FrameContext`], the compiled [`DrawList`] and the
//! pick-buffer codec. Concrete devices live in `stratum-infra`; the pipeline
//! stages that produce these types live in `stratum-data`, `stratum-lanes`
//! and `stratum-agents`.

pub mod command;
pub mod draw_list;
pub mod error;
pub mod frame;
pub mod ids;
pub mod pick;
pub mod program;
pub mod traits;

pub use self::command::{DeviceCommand, Pixel};
pub use self::draw_list::{DrawCommand, DrawList, PickEntry, StageSlot, SLOT_COUNT};
pub use self::error::{PickError, ProgramError, RenderError, ResourceError};
pub use self::frame::{FrameContext, PassKind};
pub use self::ids::{ChunkId, DeviceProgramId, EntityId, ProgramId, RenderTargetId, TextureId};
pub use self::program::{ProgramSource, ProgramSourceFactory, ShaderSource, StateSnapshot};
pub use self::traits::GraphicsDevice;
