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

use crate::renderer::command::{DeviceCommand, Pixel};
use crate::renderer::error::{ProgramError, RenderError};
use crate::renderer::frame::{FrameContext, PassKind};
use crate::renderer::ids::{DeviceProgramId, RenderTargetId};
use crate::renderer::program::ShaderSource;
use crate::state::{GeometryCore, MorphCore};
use std::fmt::Debug;

/// The abstract graphics device the pipeline drives.
///
/// It compiles programs from source text, executes state commands and draws,
/// owns the on-screen, pick and ray-pick buffers plus any offscreen render
/// targets, and reads pixels back for picking.
pub trait GraphicsDevice: Debug + Send + 'static {
    /// Compiles and links a program.
    /// ## Errors
    /// * `ProgramError::CompilationFailed` - If the source is rejected.
    /// * `ProgramError::Resource` - If the device cannot allocate the program.
    fn compile_program(
        &mut self,
        label: &str,
        source: &ShaderSource,
    ) -> Result<DeviceProgramId, ProgramError>;

    /// Destroys a program. Unknown ids are ignored.
    fn destroy_program(&mut self, program: DeviceProgramId);

    /// Canvas size in pixels, `(width, height)`.
    fn canvas_size(&self) -> (u32, u32);

    /// Starts a pass on the buffer for `pass`, clearing it to `clear` when set.
    fn begin_pass(&mut self, pass: PassKind, clear: Option<[f32; 4]>) -> Result<(), RenderError>;

    /// Ends the current pass.
    fn end_pass(&mut self, pass: PassKind);

    /// Number of passes begun on the buffer for `pass` so far.
    ///
    /// Renderers sharing one device record this after writing a buffer; a
    /// different value later means someone else has written it since.
    fn pass_generation(&self, pass: PassKind) -> u64;

    /// Redirects subsequent draws into the given offscreen targets and clears them.
    /// ## Errors
    /// * `RenderError::TargetUnavailable` - If a target cannot be created or bound.
    fn bind_render_target(&mut self, targets: &[RenderTargetId]) -> Result<(), RenderError>;

    /// Returns to the buffer of the current pass.
    fn bind_default_target(&mut self) -> Result<(), RenderError>;

    /// Makes `program` current.
    fn use_program(&mut self, program: DeviceProgramId);

    /// Executes one state command.
    fn apply(&mut self, command: DeviceCommand<'_>, ctx: &FrameContext);

    /// Draws geometry with the current state.
    fn draw(&mut self, geometry: &GeometryCore, morph: &MorphCore, ctx: &FrameContext);

    /// Reads one pixel of the buffer for `pass`, `(0, 0)` being the top-left.
    /// Returns `None` outside the canvas.
    fn read_pixel(&mut self, pass: PassKind, x: u32, y: u32) -> Option<Pixel>;
}
