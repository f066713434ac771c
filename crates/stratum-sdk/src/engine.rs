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

//! The engine context and frame pumps.

use crate::scene::{Scene, SceneId};
use std::collections::BTreeMap;
use stratum_agents::{PickHit, PickOptions, RenderOptions};
use stratum_core::renderer::{EntityId, GraphicsDevice, PickError};
use stratum_core::RendererSettings;
use stratum_infra::HeadlessDevice;

/// Drives [`Engine::run`]: decides whether another frame happens and how it
/// is rendered.
pub trait FramePump {
    /// Called before frame `frame`. `Ok(None)` stops the loop.
    fn next_frame(&mut self, frame: u64) -> anyhow::Result<Option<RenderOptions>>;
}

/// Runs a fixed number of frames with the same options.
#[derive(Debug, Clone, Copy)]
pub struct FixedFramePump {
    remaining: u64,
    options: RenderOptions,
}

impl FixedFramePump {
    /// Pumps `frames` frames with default options.
    pub fn new(frames: u64) -> Self {
        Self {
            remaining: frames,
            options: RenderOptions::default(),
        }
    }

    /// Uses `options` for every frame.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }
}

impl FramePump for FixedFramePump {
    fn next_frame(&mut self, _frame: u64) -> anyhow::Result<Option<RenderOptions>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.options))
    }
}

/// Summary of one [`Engine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// The frame number.
    pub frame: u64,
    /// Scenes whose draw list was submitted.
    pub submitted: usize,
    /// Scenes whose frame failed.
    pub failed: usize,
}

/// Owns the graphics device and every scene.
///
/// All mutation goes through `&mut self`, so scenes are never touched by two
/// writers at once.
#[derive(Debug)]
pub struct Engine {
    device: Box<dyn GraphicsDevice>,
    scenes: BTreeMap<SceneId, Scene>,
    settings: RendererSettings,
    next_scene: u32,
    frame: u64,
}

impl Engine {
    /// Creates an engine rendering to `device`.
    pub fn new(device: Box<dyn GraphicsDevice>, settings: RendererSettings) -> Self {
        let (width, height) = device.canvas_size();
        log::info!("Engine created with a {width}x{height} canvas.");
        Self {
            device,
            scenes: BTreeMap::new(),
            settings,
            next_scene: 0,
            frame: 0,
        }
    }

    /// Creates an engine over a [`HeadlessDevice`].
    pub fn headless(width: u32, height: u32, settings: RendererSettings) -> Self {
        Self::new(Box::new(HeadlessDevice::new(width, height)), settings)
    }

    /// Engine-wide settings, inherited by new scenes.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// The graphics device.
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// Mutable access to the graphics device.
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Registers a new, empty scene.
    pub fn create_scene(&mut self, name: &str) -> SceneId {
        let id = SceneId(self.next_scene);
        self.next_scene += 1;
        self.scenes
            .insert(id, Scene::new(id, name, self.settings.clone()));
        log::debug!("Registered {id} '{name}'.");
        id
    }

    /// The scene with `id`.
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    /// Mutable access to the scene with `id`.
    pub fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.get_mut(&id)
    }

    /// Ids of the live scenes, in creation order.
    pub fn scene_ids(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.scenes.keys().copied()
    }

    /// Destroys a scene, releasing its device programs.
    pub fn destroy_scene(&mut self, id: SceneId) -> bool {
        let Some(mut scene) = self.scenes.remove(&id) else {
            return false;
        };
        scene.destroy(self.device.as_mut());
        log::debug!("Destroyed {id} '{}'.", scene.name());
        true
    }

    /// Removes an entity from a scene.
    pub fn remove_entity(&mut self, scene: SceneId, entity: EntityId) -> bool {
        match self.scenes.get_mut(&scene) {
            Some(s) => s.remove(entity, self.device.as_mut()),
            None => false,
        }
    }

    /// Picks in one scene. Unknown scenes never hit.
    pub fn pick(
        &mut self,
        scene: SceneId,
        x: u32,
        y: u32,
        options: PickOptions,
    ) -> Result<Option<PickHit>, PickError> {
        match self.scenes.get_mut(&scene) {
            Some(s) => s.pick(self.device.as_mut(), x, y, options),
            None => {
                log::warn!("Pick on unknown {scene}.");
                Ok(None)
            }
        }
    }

    /// Runs one frame: every scene's tick listeners first, then every scene's
    /// cascade. A failing scene is logged and does not stop the others.
    ///
    /// Scenes share the canvas and are layered in creation order. If any
    /// scene's image is stale (or `options.force` is set), every scene is
    /// resubmitted and only the first one clears, so an idle scene is never
    /// wiped by a busy one.
    pub fn tick(&mut self, options: RenderOptions) -> TickReport {
        let mut report = TickReport {
            frame: self.frame,
            ..Default::default()
        };
        for scene in self.scenes.values_mut() {
            scene.notify_tick(self.frame);
        }
        let mut stale = options.force;
        for scene in self.scenes.values_mut() {
            stale |= scene.prepare(self.device.as_mut());
        }
        if stale {
            let mut clear = options.clear;
            for (id, scene) in &mut self.scenes {
                let layer = RenderOptions { clear, force: true };
                match scene.render(self.device.as_mut(), layer) {
                    Ok(frame) if frame.submitted() => report.submitted += 1,
                    Ok(_) => {}
                    Err(err) => {
                        log::error!(
                            "Frame {} of {id} '{}' failed: {err}",
                            self.frame,
                            scene.name()
                        );
                        report.failed += 1;
                    }
                }
                clear = false;
            }
        }
        self.frame += 1;
        report
    }

    /// Ticks until `pump` stops. Returns the number of frames run.
    pub fn run(&mut self, pump: &mut dyn FramePump) -> anyhow::Result<u64> {
        let start = self.frame;
        while let Some(options) = pump.next_frame(self.frame)? {
            self.tick(options);
        }
        let frames = self.frame - start;
        log::info!("Frame pump stopped after {frames} frames.");
        Ok(frames)
    }

    /// Destroys every scene.
    pub fn shutdown(&mut self) {
        let ids: Vec<_> = self.scenes.keys().copied().collect();
        for id in ids {
            self.destroy_scene(id);
        }
    }
}
