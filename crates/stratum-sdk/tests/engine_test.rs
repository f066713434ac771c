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

use stratum_core::renderer::PassKind;
use stratum_sdk::prelude::*;

fn red_or_blue(frame: u64) -> MaterialCore {
    let base_color = if frame % 2 == 0 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };
    MaterialCore {
        base_color,
        ..Default::default()
    }
}

#[test]
fn tick_listeners_run_before_compilation() {
    let mut engine = Engine::headless(16, 16, RendererSettings::default());
    let id = engine.create_scene("main");
    let scene = engine.scene_mut(id).unwrap();
    let entity = scene.spawn().build();
    let sender = scene.event_sender();
    scene.on_tick(move |tick| {
        let _ = sender.send(SceneEvent::SetCore {
            entity,
            core: MaterialCore::wrap(Core::new(red_or_blue(tick.frame))),
        });
    });

    let report = engine.tick(RenderOptions::default());
    assert_eq!(report.submitted, 1);
    let pixel = engine.device_mut().read_pixel(PassKind::Draw, 8, 8).unwrap();
    assert_eq!(pixel.to_rgba(), [255, 0, 0, 255]);

    engine.tick(RenderOptions::default());
    let pixel = engine.device_mut().read_pixel(PassKind::Draw, 8, 8).unwrap();
    assert_eq!(pixel.to_rgba(), [0, 0, 255, 255]);
}

#[test]
fn idle_frames_submit_nothing() {
    let mut engine = Engine::headless(16, 16, RendererSettings::default());
    let id = engine.create_scene("main");
    engine.scene_mut(id).unwrap().spawn().build();
    assert_eq!(engine.tick(RenderOptions::default()).submitted, 1);
    assert_eq!(engine.tick(RenderOptions::default()).submitted, 0);
    let forced = RenderOptions {
        clear: true,
        force: true,
    };
    assert_eq!(engine.tick(forced).submitted, 1);
}

#[test]
fn picking_through_the_engine() {
    let mut engine = Engine::headless(16, 16, RendererSettings::default());
    let id = engine.create_scene("main");
    let entity = engine
        .scene_mut(id)
        .unwrap()
        .spawn()
        .with(NameCore {
            name: Some("box".into()),
        })
        .build();

    let hit = engine.pick(id, 8, 8, PickOptions::default()).unwrap().unwrap();
    assert_eq!(hit.entity, entity);
    assert_eq!(hit.name, "box");

    assert!(engine.remove_entity(id, entity));
    assert!(engine.pick(id, 8, 8, PickOptions::default()).unwrap().is_none());
}

#[test]
fn scenes_inherit_the_engine_tag_filter() {
    let settings = RendererSettings {
        tag_filter: Some("world".into()),
        ..Default::default()
    };
    let mut engine = Engine::headless(16, 16, settings);
    let id = engine.create_scene("main");
    let scene = engine.scene_mut(id).unwrap();
    scene
        .spawn()
        .with(TagCore {
            tag: Some("hud".into()),
        })
        .build();
    engine.tick(RenderOptions::default());
    assert!(engine.scene(id).unwrap().renderer().draw_list().is_empty());
}

#[test]
fn shutdown_destroys_every_scene() {
    let mut engine = Engine::headless(16, 16, RendererSettings::default());
    for name in ["a", "b"] {
        let id = engine.create_scene(name);
        engine.scene_mut(id).unwrap().spawn().build();
    }
    engine.run(&mut FixedFramePump::new(2)).unwrap();
    engine.shutdown();
    assert_eq!(engine.scene_ids().count(), 0);
}

fn colored_box(
    engine: &mut Engine,
    scene: SceneId,
    name: &str,
    x: f32,
    color: [f32; 3],
) -> EntityId {
    engine
        .scene_mut(scene)
        .unwrap()
        .spawn()
        .with(NameCore {
            name: Some(name.into()),
        })
        .with(TransformCore {
            model: Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
        })
        .with(MaterialCore {
            base_color: color,
            ..Default::default()
        })
        .build()
}

/// A 32x32 canvas where scene "a" draws red over x < 16 and scene "b" draws
/// green over x >= 16.
fn side_by_side() -> (Engine, SceneId, SceneId) {
    let mut engine = Engine::headless(32, 32, RendererSettings::default());
    let a = engine.create_scene("a");
    let b = engine.create_scene("b");
    colored_box(&mut engine, a, "a", -0.5, [1.0, 0.0, 0.0]);
    colored_box(&mut engine, b, "b", 0.5, [0.0, 1.0, 0.0]);
    (engine, a, b)
}

fn canvas(engine: &mut Engine, x: u32, y: u32) -> [u8; 4] {
    engine
        .device_mut()
        .read_pixel(PassKind::Draw, x, y)
        .unwrap()
        .to_rgba()
}

#[test]
fn every_scene_stays_visible_on_the_shared_canvas() {
    let (mut engine, _, b) = side_by_side();
    assert_eq!(engine.tick(RenderOptions::default()).submitted, 2);
    assert_eq!(canvas(&mut engine, 8, 16), [255, 0, 0, 255]);
    assert_eq!(canvas(&mut engine, 24, 16), [0, 255, 0, 255]);

    // Only "b" changes, but "a" is layered again so the clear cannot erase it.
    let entity = engine.scene(b).unwrap().renderer().pool().order()[0];
    engine.scene_mut(b).unwrap().set(
        entity,
        MaterialCore {
            base_color: [0.0, 0.0, 1.0],
            ..Default::default()
        },
    );
    assert_eq!(engine.tick(RenderOptions::default()).submitted, 2);
    assert_eq!(canvas(&mut engine, 8, 16), [255, 0, 0, 255]);
    assert_eq!(canvas(&mut engine, 24, 16), [0, 0, 255, 255]);

    assert_eq!(engine.tick(RenderOptions::default()).submitted, 0);
    assert_eq!(canvas(&mut engine, 8, 16), [255, 0, 0, 255]);
}

#[test]
fn picks_do_not_leak_between_scenes() {
    let (mut engine, a, b) = side_by_side();
    let opts = PickOptions::default();
    assert!(engine.pick(a, 24, 16, opts).unwrap().is_none());
    assert_eq!(engine.pick(b, 24, 16, opts).unwrap().unwrap().name, "b");
    // "b" rewrote the shared pick buffer; "a" must render its own again.
    assert!(engine.pick(a, 24, 16, opts).unwrap().is_none());
    assert_eq!(engine.pick(a, 8, 16, opts).unwrap().unwrap().name, "a");
    assert!(engine.pick(b, 8, 16, opts).unwrap().is_none());

    let surface = PickOptions { ray_surface: true };
    let hit = engine.pick(a, 8, 16, surface).unwrap().unwrap();
    assert!(hit.world_pos.is_some());
    assert!(engine.pick(b, 8, 16, surface).unwrap().is_none());
}
