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

//! Defines the SceneRenderer, the per-scene orchestrator of the compilation lanes.

use super::dirty::{DirtyFlags, DirtyScheduler, SchedulerStats};
use super::picking::{pick_ray, unproject, PickHit, PickOptions};
use stratum_core::renderer::pick::{decode_depth, decode_pick_id};
use stratum_core::renderer::{
    DrawList, EntityId, GraphicsDevice, PassKind, PickError, ProgramSourceFactory, RenderError,
};
use stratum_core::state::StateCore;
use stratum_core::RendererSettings;
use stratum_data::{EntityPool, RenderEntity, ResourceCaches};
use stratum_lanes::{
    BuildReport, DefaultProgramSourceFactory, DrawListLane, EntityBuildLane, RenderLane,
    SortKeyLane, SubmitLane, SubmitReport, TagFilter,
};

/// Options of one [`SceneRenderer::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Clear the canvas before drawing.
    pub clear: bool,
    /// Submit the draw list even when the image is up to date.
    pub force: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            clear: true,
            force: false,
        }
    }
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Stages that ran this frame.
    pub stages: DirtyFlags,
    /// Outcome of the entity build, if the pool stage ran.
    pub build: BuildReport,
    /// Outcome of the submission, if the draw list was submitted.
    pub submit: Option<SubmitReport>,
}

impl FrameReport {
    /// Whether the device received a draw pass.
    pub fn submitted(&self) -> bool {
        self.submit.is_some()
    }
}

/// The agent responsible for compiling and rendering one scene.
pub struct SceneRenderer {
    // Scene name, used in log messages.
    name: String,
    // Render entities and their flat (sorted) order.
    pool: EntityPool,
    // Programs and chunks referenced by the pool.
    caches: ResourceCaches,
    // Which stages are stale.
    scheduler: DirtyScheduler,
    // Source generator for cache misses.
    factory: Box<dyn ProgramSourceFactory>,
    // Active tag filter, `None` lets everything through.
    tag_filter: Option<TagFilter>,
    // Output of the last draw list compilation.
    draw_list: DrawList,
    settings: RendererSettings,
    // --- Lanes ---
    build_lane: EntityBuildLane,
    sort_lane: SortKeyLane,
    draw_list_lane: DrawListLane,
    submit_lane: SubmitLane,
    // Device generation of each pick buffer right after this scene wrote it.
    pick_generations: [Option<u64>; PassKind::COUNT],
    // Set once the program count exceeded `settings.max_programs`.
    warned_program_limit: bool,
    // Frames rendered since creation.
    frame_count: u64,
}

impl std::fmt::Debug for SceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRenderer")
            .field("name", &self.name)
            .field("entities", &self.pool.len())
            .field("programs", &self.caches.programs.len())
            .field("chunks", &self.caches.chunks.len())
            .field("dirty", &self.scheduler.flags())
            .finish()
    }
}

impl SceneRenderer {
    /// Creates a renderer using the built-in program sources.
    ///
    /// A malformed `settings.tag_filter` is logged and ignored.
    pub fn new(name: impl Into<String>, settings: RendererSettings) -> Self {
        let name = name.into();
        let mut renderer = Self {
            build_lane: EntityBuildLane::new(name.clone()),
            name,
            pool: EntityPool::new(),
            caches: ResourceCaches::new(),
            scheduler: DirtyScheduler::new(),
            factory: Box::new(DefaultProgramSourceFactory),
            tag_filter: None,
            draw_list: DrawList::default(),
            settings,
            sort_lane: SortKeyLane::new(),
            draw_list_lane: DrawListLane::new(),
            submit_lane: SubmitLane::new(),
            pick_generations: [None; PassKind::COUNT],
            warned_program_limit: false,
            frame_count: 0,
        };
        let initial = renderer.settings.tag_filter.clone();
        renderer.set_tag_filter(initial.as_deref());
        renderer
    }

    /// Replaces the program source factory. Only affects programs compiled
    /// after the call.
    pub fn with_factory(mut self, factory: Box<dyn ProgramSourceFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// The scene name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The settings this renderer was created with.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// The entity pool.
    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    /// The program and chunk caches.
    pub fn caches(&self) -> &ResourceCaches {
        &self.caches
    }

    /// The last compiled lists.
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Currently stale stages.
    pub fn dirty(&self) -> DirtyFlags {
        self.scheduler.flags()
    }

    /// Stage execution counters.
    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Frames rendered since creation.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The entity with `id`, if alive.
    pub fn entity(&self, id: EntityId) -> Option<&RenderEntity> {
        self.pool.get(id)
    }

    /// Adds an entity. Aspects missing from `cores` use their default core.
    pub fn insert(&mut self, cores: impl IntoIterator<Item = StateCore>) -> EntityId {
        let id = self.pool.insert(cores);
        self.scheduler.mark(DirtyFlags::POOL);
        id
    }

    /// Replaces one core of an entity. Returns `false` for unknown entities.
    pub fn set_core(&mut self, id: EntityId, core: StateCore) -> bool {
        let changed = self.pool.set_core(id, core);
        if changed {
            self.scheduler.mark(DirtyFlags::POOL);
        }
        changed
    }

    /// Removes an entity, releasing its program and chunks immediately.
    pub fn remove(&mut self, id: EntityId, device: &mut dyn GraphicsDevice) -> bool {
        let Some(mut entity) = self.pool.remove(id) else {
            return false;
        };
        self.caches.release_entity(&mut entity, device);
        self.scheduler.mark(DirtyFlags::POOL);
        true
    }

    /// Forces sort keys to be recomputed on the next frame.
    pub fn mark_order_dirty(&mut self) {
        self.scheduler.mark(DirtyFlags::ORDER);
    }

    /// Forces the draw list to be submitted on the next frame.
    pub fn invalidate_image(&mut self) {
        self.scheduler.mark(DirtyFlags::IMAGE);
    }

    /// Sets or clears the tag filter.
    ///
    /// A malformed pattern is logged and the current filter is kept.
    pub fn set_tag_filter(&mut self, pattern: Option<&str>) {
        let filter = match pattern.map(TagFilter::parse).transpose() {
            Ok(filter) => filter,
            Err(err) => {
                log::warn!("Scene '{}': ignoring tag filter: {err}", self.name);
                return;
            }
        };
        if filter != self.tag_filter {
            self.tag_filter = filter;
            self.scheduler.mark(DirtyFlags::DRAW_LIST);
        }
    }

    /// The active tag filter.
    pub fn tag_filter(&self) -> Option<&TagFilter> {
        self.tag_filter.as_ref()
    }

    /// Runs every stale stage up to and including draw list compilation.
    pub fn compile(&mut self, device: &mut dyn GraphicsDevice) -> FrameReport {
        let mut report = FrameReport::default();

        if self.scheduler.is_dirty(DirtyFlags::POOL) {
            report.build = self
                .build_lane
                .run(&mut self.pool, &mut self.caches, self.factory.as_ref(), device);
            self.check_program_limit();
            self.finish(DirtyFlags::POOL, self.build_lane.lane_name(), &mut report);
        }
        if self.scheduler.is_dirty(DirtyFlags::ORDER) {
            self.sort_lane
                .compute_keys(&mut self.pool, &self.caches.programs);
            self.finish(DirtyFlags::ORDER, self.sort_lane.lane_name(), &mut report);
        }
        if self.scheduler.is_dirty(DirtyFlags::SORT) {
            self.sort_lane.sort(&mut self.pool);
            self.finish(DirtyFlags::SORT, self.sort_lane.lane_name(), &mut report);
        }
        if self.scheduler.is_dirty(DirtyFlags::DRAW_LIST) {
            self.draw_list = self
                .draw_list_lane
                .compile(&self.pool, self.tag_filter.as_ref());
            self.finish(
                DirtyFlags::DRAW_LIST,
                self.draw_list_lane.lane_name(),
                &mut report,
            );
        }
        report
    }

    /// Whether the next [`render`](Self::render) would submit without `force`.
    pub fn needs_image(&self) -> bool {
        self.scheduler.is_dirty(DirtyFlags::IMAGE)
    }

    /// Walks the cascade and submits the draw list if the image is stale or
    /// `options.force` is set.
    ///
    /// On a submission error the image stays dirty and is retried next frame.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        options: RenderOptions,
    ) -> Result<FrameReport, RenderError> {
        let mut report = self.compile(device);
        if options.force || self.scheduler.is_dirty(DirtyFlags::IMAGE) {
            let clear = options
                .clear
                .then(|| self.draw_list.clear_color.unwrap_or(self.settings.clear_color));
            let submitted = self.submit_lane.submit(
                &self.draw_list.draw,
                PassKind::Draw,
                clear,
                &self.caches.chunks,
                device,
            )?;
            report.submit = Some(submitted);
            self.finish(DirtyFlags::IMAGE, self.submit_lane.lane_name(), &mut report);
        }
        self.frame_count += 1;
        Ok(report)
    }

    /// Resolves the entity drawn at canvas position `(x, y)`.
    ///
    /// Stale lists and pick buffers are rebuilt first. Returns `Ok(None)` when
    /// no pickable entity covers the pixel.
    pub fn pick(
        &mut self,
        device: &mut dyn GraphicsDevice,
        x: u32,
        y: u32,
        options: PickOptions,
    ) -> Result<Option<PickHit>, PickError> {
        if !self.settings.picking_enabled {
            return Err(PickError::Disabled);
        }
        let (width, height) = device.canvas_size();
        if x >= width || y >= height {
            return Err(PickError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }

        self.compile(device);
        self.refresh_pick_buffer(device, PassKind::Pick)?;
        let Some(pixel) = device.read_pixel(PassKind::Pick, x, y) else {
            return Ok(None);
        };
        let pick_id = decode_pick_id(pixel);
        let Some(entry) = self.draw_list.pick_entry(pick_id) else {
            if pick_id != 0 {
                log::debug!("Scene '{}': pick id {pick_id} has no entry.", self.name);
            }
            return Ok(None);
        };
        let (entity, name, view) = (entry.entity, entry.name.clone(), entry.view.clone());

        let world_pos = if options.ray_surface {
            self.refresh_pick_buffer(device, PassKind::RayPick)?;
            device
                .read_pixel(PassKind::RayPick, x, y)
                .map(decode_depth)
                .and_then(|depth| unproject(&view, x, y, depth, (width, height)))
        } else {
            None
        };

        Ok(Some(PickHit {
            pick_id,
            entity,
            name,
            canvas_pos: (x, y),
            world_pos,
            ray: pick_ray(&view, x, y, (width, height)),
        }))
    }

    /// Releases every entity and cached device program.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for mut entity in self.pool.drain() {
            self.caches.release_entity(&mut entity, device);
        }
        self.caches.clear(device);
        self.draw_list = DrawList::default();
        self.pick_generations = [None; PassKind::COUNT];
        self.scheduler.mark(DirtyFlags::POOL);
        log::debug!("Scene '{}' destroyed.", self.name);
    }

    fn refresh_pick_buffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        pass: PassKind,
    ) -> Result<(), RenderError> {
        let stage = match pass {
            PassKind::RayPick => DirtyFlags::RAY_PICK_BUFFER,
            _ => DirtyFlags::PICK_BUFFER,
        };
        // Another renderer on the same device may have overwritten the buffer.
        let ours = self.pick_generations[pass.index()] == Some(device.pass_generation(pass));
        if ours && !self.scheduler.is_dirty(stage) {
            return Ok(());
        }
        self.submit_lane.submit(
            &self.draw_list.pick,
            pass,
            None,
            &self.caches.chunks,
            device,
        )?;
        self.pick_generations[pass.index()] = Some(device.pass_generation(pass));
        self.scheduler.complete(stage);
        log::trace!("Scene '{}': refreshed {pass:?} buffer.", self.name);
        Ok(())
    }

    fn check_program_limit(&mut self) {
        let programs = self.caches.programs.len();
        if programs > self.settings.max_programs && !self.warned_program_limit {
            log::warn!(
                "Scene '{}' holds {programs} programs (limit {}).",
                self.name,
                self.settings.max_programs
            );
            self.warned_program_limit = true;
        }
    }

    fn finish(&mut self, stage: DirtyFlags, lane: &str, report: &mut FrameReport) {
        self.scheduler.complete(stage);
        report.stages |= stage;
        log::trace!("Scene '{}': {lane} ran.", self.name);
    }
}
