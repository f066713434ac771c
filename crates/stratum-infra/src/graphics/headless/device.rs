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

use super::framebuffer::{to_rgba8, Coverage, Framebuffer};
use std::collections::{HashMap, HashSet};
use stratum_core::math::EPSILON;
use stratum_core::renderer::pick::encode_depth;
use stratum_core::renderer::{
    DeviceCommand, DeviceProgramId, FrameContext, GraphicsDevice, PassKind, Pixel, ProgramError,
    RenderError, RenderTargetId, ResourceError, ShaderSource,
};
use stratum_core::state::{BlendMode, GeometryCore, MorphCore, TextureSource};

/// Something the device was asked to do, recorded in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// A pass started.
    BeginPass(PassKind),
    /// A pass ended.
    EndPass(PassKind),
    /// Offscreen targets were bound.
    BindRenderTarget(Vec<RenderTargetId>),
    /// The pass buffer was re-bound.
    BindDefaultTarget,
    /// A program was made current.
    UseProgram(DeviceProgramId),
    /// A state command was applied; carries the command name.
    Apply(&'static str),
    /// A texture layer sampling a render target was bound.
    SampleTarget(RenderTargetId),
    /// The pick color was set.
    PickColor([u8; 4]),
    /// Geometry was drawn.
    Draw {
        /// Pass it was drawn in.
        pass: PassKind,
        /// First bound offscreen target, `None` for the pass buffer.
        target: Option<RenderTargetId>,
        /// Pixels that passed the depth test.
        pixels: u32,
    },
}

/// Counters accumulated since creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStats {
    /// Successful program compilations.
    pub programs_compiled: u64,
    /// Program destructions.
    pub programs_destroyed: u64,
    /// Passes begun.
    pub passes: u64,
    /// Draw calls.
    pub draw_calls: u64,
    /// State commands applied.
    pub commands_applied: u64,
    /// Offscreen target binds.
    pub target_binds: u64,
}

#[derive(Debug, Clone, Copy)]
struct RasterState {
    depth_test: bool,
    depth_write: bool,
    blend: BlendMode,
    color: [f32; 4],
    pick_color: [u8; 4],
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            blend: BlendMode::Opaque,
            color: [1.0, 1.0, 1.0, 1.0],
            pick_color: [0, 0, 0, 0],
        }
    }
}

/// A software [`GraphicsDevice`].
///
/// Geometry is rasterized as the screen rectangle covering its projected
/// bounds, at the depth of its nearest corner. That is coarse, but enough to
/// exercise ordering, depth testing, offscreen targets and both pick buffers.
///
/// It also records every call as a [`DeviceEvent`] and can be told to fail
/// program compilation, which makes it the device used throughout the tests.
#[derive(Debug)]
pub struct HeadlessDevice {
    width: u32,
    height: u32,
    color: Framebuffer,
    pick: Framebuffer,
    ray_pick: Framebuffer,
    targets: HashMap<RenderTargetId, Framebuffer>,
    cleared_targets: HashSet<RenderTargetId>,
    bound_targets: Vec<RenderTargetId>,
    pass: Option<PassKind>,
    generations: [u64; PassKind::COUNT],
    raster: RasterState,
    programs: HashMap<DeviceProgramId, String>,
    next_program: u64,
    current_program: Option<DeviceProgramId>,
    fail_pattern: Option<String>,
    program_limit: Option<usize>,
    events: Vec<DeviceEvent>,
    stats: DeviceStats,
}

impl HeadlessDevice {
    /// Creates a device with a `width` x `height` canvas.
    pub fn new(width: u32, height: u32) -> Self {
        log::debug!("HeadlessDevice created with a {width}x{height} canvas.");
        Self {
            width,
            height,
            color: Framebuffer::new(width, height),
            pick: Framebuffer::new(width, height),
            ray_pick: Framebuffer::new(width, height),
            targets: HashMap::new(),
            cleared_targets: HashSet::new(),
            bound_targets: Vec::new(),
            pass: None,
            generations: [0; PassKind::COUNT],
            raster: RasterState::default(),
            programs: HashMap::new(),
            next_program: 0,
            current_program: None,
            fail_pattern: None,
            program_limit: None,
            events: Vec::new(),
            stats: DeviceStats::default(),
        }
    }

    /// Makes every compilation whose label contains `pattern` fail.
    pub fn fail_compiles_matching(&mut self, pattern: &str) {
        self.fail_pattern = Some(pattern.to_owned());
    }

    /// Caps the number of live programs; further compiles report out of memory.
    pub fn set_program_limit(&mut self, limit: Option<usize>) {
        self.program_limit = limit;
    }

    /// Number of programs compiled and not yet destroyed.
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Counters.
    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Recorded calls, oldest first.
    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    /// Forgets recorded calls.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// A pixel of the visible image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        self.color.get(x, y)
    }

    /// The visible image as row-major RGBA8 bytes.
    pub fn image_bytes(&self) -> &[u8] {
        self.color.bytes()
    }

    /// A pixel of an offscreen target, if it has been rendered.
    pub fn target_pixel(&self, target: RenderTargetId, x: u32, y: u32) -> Option<Pixel> {
        self.targets.get(&target).and_then(|fb| fb.get(x, y))
    }

    fn framebuffer_mut(&mut self, pass: PassKind) -> &mut Framebuffer {
        match pass {
            PassKind::Draw => &mut self.color,
            PassKind::Pick => &mut self.pick,
            PassKind::RayPick => &mut self.ray_pick,
        }
    }

    fn coverage(&self, geometry: &GeometryCore, ctx: &FrameContext) -> Option<Coverage> {
        let mvp = ctx.projection * ctx.view * ctx.model;
        let (mut min_x, mut min_y, mut min_z) = (f32::MAX, f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        let mut visible = false;

        for corner in geometry.bounds.corners() {
            let clip = mvp * corner.extend(1.0);
            if clip.w <= EPSILON {
                continue;
            }
            let Some(ndc) = clip.project() else {
                continue;
            };
            visible = true;
            min_x = min_x.min(ndc.x);
            max_x = max_x.max(ndc.x);
            min_y = min_y.min(ndc.y);
            max_y = max_y.max(ndc.y);
            min_z = min_z.min(ndc.z);
        }

        if !visible || min_x > 1.0 || max_x < -1.0 || min_y > 1.0 || max_y < -1.0 || min_z > 1.0 {
            return None;
        }

        let (w, h) = (self.width as f32, self.height as f32);
        let to_x = |ndc: f32| ((ndc.clamp(-1.0, 1.0) + 1.0) * 0.5 * w) as u32;
        let to_y = |ndc: f32| ((1.0 - ndc.clamp(-1.0, 1.0)) * 0.5 * h) as u32;
        Some(Coverage {
            x0: to_x(min_x),
            x1: to_x(max_x),
            y0: to_y(max_y),
            y1: to_y(min_y),
            depth: (min_z.max(-1.0) + 1.0) * 0.5,
        })
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn compile_program(
        &mut self,
        label: &str,
        source: &ShaderSource,
    ) -> Result<DeviceProgramId, ProgramError> {
        if let Some(pattern) = &self.fail_pattern {
            if label.contains(pattern.as_str()) {
                return Err(ProgramError::CompilationFailed {
                    label: label.to_owned(),
                    details: format!("rejected by pattern '{pattern}'"),
                });
            }
        }
        if source.vertex.is_empty() || source.fragment.is_empty() {
            return Err(ProgramError::CompilationFailed {
                label: label.to_owned(),
                details: "empty shader stage".to_owned(),
            });
        }
        if self
            .program_limit
            .is_some_and(|limit| self.programs.len() >= limit)
        {
            return Err(ProgramError::Resource(ResourceError::OutOfMemory));
        }

        self.next_program += 1;
        let id = DeviceProgramId(self.next_program);
        self.programs.insert(id, label.to_owned());
        self.stats.programs_compiled += 1;
        log::trace!("Compiled program {label} as {id:?}.");
        Ok(id)
    }

    fn destroy_program(&mut self, program: DeviceProgramId) {
        if self.programs.remove(&program).is_some() {
            self.stats.programs_destroyed += 1;
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_pass(&mut self, pass: PassKind, clear: Option<[f32; 4]>) -> Result<(), RenderError> {
        if let Some(active) = self.pass {
            return Err(RenderError::Internal(format!(
                "{pass:?} pass begun while {active:?} pass is active"
            )));
        }
        self.pass = Some(pass);
        self.generations[pass.index()] += 1;
        self.raster = RasterState::default();
        self.bound_targets.clear();
        self.cleared_targets.clear();
        match (pass, clear) {
            (PassKind::Draw, Some(color)) => self.color.clear(to_rgba8(color)),
            (PassKind::Draw, None) => {}
            // Pick buffers always start empty: id 0, depth 0.
            (_, _) => self.framebuffer_mut(pass).clear([0, 0, 0, 0]),
        }
        self.stats.passes += 1;
        self.events.push(DeviceEvent::BeginPass(pass));
        Ok(())
    }

    fn end_pass(&mut self, pass: PassKind) {
        self.pass = None;
        self.bound_targets.clear();
        self.events.push(DeviceEvent::EndPass(pass));
    }

    fn pass_generation(&self, pass: PassKind) -> u64 {
        self.generations[pass.index()]
    }

    fn bind_render_target(&mut self, targets: &[RenderTargetId]) -> Result<(), RenderError> {
        let Some(&first) = targets.first() else {
            return Err(RenderError::Internal(
                "bind_render_target called without targets".to_owned(),
            ));
        };
        for &target in targets {
            let (w, h) = (self.width, self.height);
            let fb = self
                .targets
                .entry(target)
                .or_insert_with(|| Framebuffer::new(w, h));
            if self.cleared_targets.insert(target) {
                fb.clear([0, 0, 0, 0]);
            }
        }
        self.bound_targets = targets.to_vec();
        self.stats.target_binds += 1;
        self.events.push(DeviceEvent::BindRenderTarget(targets.to_vec()));
        log::trace!("Bound render target {}.", first.0);
        Ok(())
    }

    fn bind_default_target(&mut self) -> Result<(), RenderError> {
        self.bound_targets.clear();
        self.events.push(DeviceEvent::BindDefaultTarget);
        Ok(())
    }

    fn use_program(&mut self, program: DeviceProgramId) {
        self.current_program = Some(program);
        self.events.push(DeviceEvent::UseProgram(program));
    }

    fn apply(&mut self, command: DeviceCommand<'_>, _ctx: &FrameContext) {
        self.stats.commands_applied += 1;
        let name = match command {
            DeviceCommand::Renderer(_) => "renderer",
            DeviceCommand::DrawMode(mode) => {
                self.raster.depth_test = mode.depth_test;
                self.raster.depth_write = mode.depth_write;
                self.raster.blend = mode.blend;
                "draw_mode"
            }
            DeviceCommand::View(_) => "view",
            DeviceCommand::Transform(_) => "transform",
            DeviceCommand::Lights { .. } => "lights",
            DeviceCommand::ClipPlanes(_) => "clip_planes",
            DeviceCommand::Material(material) => {
                let [r, g, b] = material.base_color;
                self.raster.color = [r, g, b, material.alpha];
                "material"
            }
            DeviceCommand::Texture { layer, .. } => {
                if let TextureSource::RenderTarget(target) = layer.source {
                    self.events.push(DeviceEvent::SampleTarget(target));
                }
                "texture"
            }
            DeviceCommand::Uniforms(_) => "uniforms",
            DeviceCommand::PickColor(rgba) => {
                self.raster.pick_color = rgba;
                self.events.push(DeviceEvent::PickColor(rgba));
                "pick_color"
            }
        };
        self.events.push(DeviceEvent::Apply(name));
    }

    fn draw(&mut self, geometry: &GeometryCore, _morph: &MorphCore, ctx: &FrameContext) {
        let Some(pass) = self.pass else {
            log::warn!("Draw outside of a pass ignored.");
            return;
        };
        self.stats.draw_calls += 1;
        let target = self.bound_targets.first().copied();
        let Some(area) = self.coverage(geometry, ctx) else {
            self.events.push(DeviceEvent::Draw {
                pass,
                target,
                pixels: 0,
            });
            return;
        };

        let rgba = match pass {
            PassKind::Draw => to_rgba8(self.raster.color),
            PassKind::Pick => self.raster.pick_color,
            PassKind::RayPick => encode_depth(area.depth),
        };
        // Blended fragments never occlude; pick passes ignore blending.
        let depth_write =
            self.raster.depth_write && (pass.is_pick() || self.raster.blend == BlendMode::Opaque);
        let depth_test = self.raster.depth_test;

        let pixels = if self.bound_targets.is_empty() {
            self.framebuffer_mut(pass)
                .fill(area, rgba, depth_test, depth_write)
        } else {
            let mut pixels = 0;
            for target in &self.bound_targets {
                if let Some(fb) = self.targets.get_mut(target) {
                    pixels = fb.fill(area, rgba, depth_test, depth_write);
                }
            }
            pixels
        };
        self.events.push(DeviceEvent::Draw {
            pass,
            target,
            pixels,
        });
    }

    fn read_pixel(&mut self, pass: PassKind, x: u32, y: u32) -> Option<Pixel> {
        self.framebuffer_mut(pass).get(x, y)
    }
}
