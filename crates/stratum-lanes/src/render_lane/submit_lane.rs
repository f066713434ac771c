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

//! Replays a compiled list onto a device.

use super::RenderLane;
use stratum_core::renderer::{
    DrawCommand, FrameContext, GraphicsDevice, PassKind, RenderError,
};
use stratum_data::ChunkFactory;

/// Outcome of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmitReport {
    /// Commands replayed.
    pub commands: usize,
    /// Draw calls issued.
    pub draw_calls: u32,
}

/// Executes a list inside one device pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubmitLane;

impl SubmitLane {
    /// Creates the lane.
    pub fn new() -> Self {
        Self
    }

    /// Begins `pass`, replays `commands`, and ends the pass even on error.
    ///
    /// The draw pass applies chunks with [`Chunk::apply_draw`](stratum_data::Chunk::apply_draw);
    /// both pick passes use [`Chunk::apply_pick`](stratum_data::Chunk::apply_pick).
    pub fn submit(
        &self,
        commands: &[DrawCommand],
        pass: PassKind,
        clear: Option<[f32; 4]>,
        chunks: &ChunkFactory,
        device: &mut dyn GraphicsDevice,
    ) -> Result<SubmitReport, RenderError> {
        device.begin_pass(pass, clear)?;
        let mut ctx = FrameContext::new(pass);
        let result = Self::replay(commands, &mut ctx, chunks, device);
        device.end_pass(pass);
        result?;
        Ok(SubmitReport {
            commands: commands.len(),
            draw_calls: ctx.draw_calls,
        })
    }

    fn replay(
        commands: &[DrawCommand],
        ctx: &mut FrameContext,
        chunks: &ChunkFactory,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(), RenderError> {
        for command in commands {
            match command {
                DrawCommand::BindRenderTarget(target) => {
                    device.bind_render_target(&target.targets)?;
                    ctx.reset_bindings();
                }
                DrawCommand::BindDefaultTarget => {
                    device.bind_default_target()?;
                    ctx.reset_bindings();
                }
                DrawCommand::Apply(id) => match chunks.get(*id) {
                    Some(chunk) if ctx.pass.is_pick() => chunk.apply_pick(ctx, device),
                    Some(chunk) => chunk.apply_draw(ctx, device),
                    None => log::warn!("Skipping released chunk {id:?}."),
                },
                DrawCommand::PickName { chunk, pick_id } => {
                    ctx.pick_id = *pick_id;
                    match chunks.get(*chunk) {
                        Some(chunk) => chunk.apply_pick(ctx, device),
                        None => log::warn!("Skipping released name chunk {chunk:?}."),
                    }
                }
            }
        }
        Ok(())
    }
}

impl RenderLane for SubmitLane {
    fn lane_name(&self) -> &'static str {
        "submit"
    }
}
