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

//! Per-pass mutable context threaded through chunk application.

use crate::math::Mat4;
use crate::renderer::ids::DeviceProgramId;

/// Which buffer a pass renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// The visible image.
    Draw,
    /// The color-index pick buffer.
    Pick,
    /// The packed-depth ray-pick buffer.
    RayPick,
}

impl PassKind {
    /// Number of pass kinds.
    pub const COUNT: usize = 3;

    /// Dense index of the pass kind, in declaration order.
    pub fn index(self) -> usize {
        match self {
            PassKind::Draw => 0,
            PassKind::Pick => 1,
            PassKind::RayPick => 2,
        }
    }

    /// Whether the pass replays the pick list.
    pub fn is_pick(self) -> bool {
        matches!(self, PassKind::Pick | PassKind::RayPick)
    }
}

/// State accumulated while replaying one list. Chunks read and update it; the
/// device reads it when executing commands.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    /// Current pass.
    pub pass: PassKind,
    /// Current world-to-view matrix.
    pub view: Mat4,
    /// Current view-to-clip matrix.
    pub projection: Mat4,
    /// Current object-to-world matrix.
    pub model: Mat4,
    /// Ambient color accumulated from the current lights.
    pub ambient: [f32; 3],
    /// Next free texture unit.
    pub texture_unit: u32,
    /// Pick id written by subsequent draws in the pick pass.
    pub pick_id: u32,
    /// Program currently in use.
    pub program: Option<DeviceProgramId>,
    /// Draw calls issued so far.
    pub draw_calls: u32,
}

impl FrameContext {
    /// A fresh context for `pass`.
    pub fn new(pass: PassKind) -> Self {
        Self {
            pass,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            ambient: [0.0; 3],
            texture_unit: 0,
            pick_id: 0,
            program: None,
            draw_calls: 0,
        }
    }

    /// Whether this is the color-index pick pass.
    pub fn is_pick(&self) -> bool {
        self.pass == PassKind::Pick
    }

    /// Whether this is the depth ray-pick pass.
    pub fn is_ray_pick(&self) -> bool {
        self.pass == PassKind::RayPick
    }

    /// Hands out the next texture unit.
    pub fn next_texture_unit(&mut self) -> u32 {
        let unit = self.texture_unit;
        self.texture_unit += 1;
        unit
    }

    /// Forgets all per-target state, as after binding a new render target.
    pub fn reset_bindings(&mut self) {
        *self = Self {
            draw_calls: self.draw_calls,
            ..Self::new(self.pass)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_units_count_up() {
        let mut ctx = FrameContext::new(PassKind::Draw);
        assert_eq!(ctx.next_texture_unit(), 0);
        assert_eq!(ctx.next_texture_unit(), 1);
        ctx.texture_unit = 0;
        assert_eq!(ctx.next_texture_unit(), 0);
    }

    #[test]
    fn reset_keeps_pass_and_draw_count() {
        let mut ctx = FrameContext::new(PassKind::RayPick);
        ctx.draw_calls = 4;
        ctx.pick_id = 9;
        ctx.program = Some(DeviceProgramId(3));
        ctx.reset_bindings();
        assert!(ctx.is_ray_pick());
        assert_eq!(ctx.draw_calls, 4);
        assert_eq!(ctx.pick_id, 0);
        assert_eq!(ctx.program, None);
    }
}
