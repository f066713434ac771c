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

use stratum_agents::{DirtyFlags, RenderOptions, SceneRenderer};
use stratum_core::renderer::{GraphicsDevice, PassKind};
use stratum_core::state::{Core, GeometryCore, MaterialCore, Primitive, StateCore};
use stratum_core::RendererSettings;
use stratum_infra::HeadlessDevice;

fn setup() -> (SceneRenderer, HeadlessDevice) {
    let mut scene = SceneRenderer::new("cascade", RendererSettings::default());
    let mut device = HeadlessDevice::new(16, 16);
    scene.insert([]);
    scene.insert([StateCore::from_core(Core::new(MaterialCore {
        base_color: [1.0, 0.0, 0.0],
        ..Default::default()
    }))]);
    scene.render(&mut device, RenderOptions::default()).unwrap();
    (scene, device)
}

#[test]
fn clean_scene_skips_every_stage() {
    let (mut scene, mut device) = setup();
    let stats = scene.stats();
    let passes = device.stats().passes;

    let report = scene.render(&mut device, RenderOptions::default()).unwrap();
    assert!(report.stages.is_empty());
    assert!(!report.submitted());
    assert_eq!(scene.stats(), stats);
    assert_eq!(device.stats().passes, passes);
}

#[test]
fn forced_frame_resubmits_without_recompiling() {
    let (mut scene, mut device) = setup();
    let list_runs = scene.stats().draw_list_runs;
    let report = scene
        .render(
            &mut device,
            RenderOptions {
                clear: true,
                force: true,
            },
        )
        .unwrap();
    assert!(report.submitted());
    assert_eq!(report.stages, DirtyFlags::IMAGE);
    assert_eq!(scene.stats().draw_list_runs, list_runs);
}

#[test]
fn order_dirty_skips_the_pool_and_keeps_the_list() {
    let (mut scene, mut device) = setup();
    let before: Vec<_> = scene.draw_list().applied_chunks().collect();
    let builds = scene.stats().pool_runs;

    scene.mark_order_dirty();
    let report = scene.render(&mut device, RenderOptions::default()).unwrap();
    assert_eq!(
        report.stages,
        DirtyFlags::ORDER | DirtyFlags::SORT | DirtyFlags::DRAW_LIST | DirtyFlags::IMAGE
    );
    assert_eq!(scene.stats().pool_runs, builds);
    let after: Vec<_> = scene.draw_list().applied_chunks().collect();
    assert_eq!(after, before);
}

#[test]
fn core_change_runs_the_whole_cascade() {
    let (mut scene, mut device) = setup();
    let id = scene.pool().order()[0];
    scene.set_core(
        id,
        StateCore::from_core(Core::new(MaterialCore {
            base_color: [0.0, 0.0, 1.0],
            ..Default::default()
        })),
    );
    let report = scene.render(&mut device, RenderOptions::default()).unwrap();
    for stage in DirtyFlags::CHAIN {
        assert!(report.stages.contains(stage));
    }
    assert_eq!(report.build.built, 1);
}

#[test]
fn failed_program_is_excluded_then_retried() {
    let (mut scene, mut device) = setup();
    device.fail_compiles_matching("gl");
    let lines = scene.insert([StateCore::from_core(Core::new(GeometryCore {
        primitive: Primitive::Lines,
        ..Default::default()
    }))]);

    let report = scene.render(&mut device, RenderOptions::default()).unwrap();
    assert_eq!(report.build.failed, 1);
    assert!(scene.entity(lines).unwrap().program.is_none());

    // The next state change retries the build.
    scene.set_core(
        lines,
        StateCore::from_core(Core::new(GeometryCore::default())),
    );
    let report = scene.render(&mut device, RenderOptions::default()).unwrap();
    assert_eq!(report.build.failed, 0);
    assert!(scene.entity(lines).unwrap().program.is_some());
}

#[test]
fn submission_errors_keep_the_image_dirty() {
    let (mut scene, mut device) = setup();
    scene.invalidate_image();
    // A pass left open by another client makes the next begin_pass fail.
    device.begin_pass(PassKind::Pick, None).unwrap();
    assert!(scene.render(&mut device, RenderOptions::default()).is_err());
    assert!(scene.dirty().contains(DirtyFlags::IMAGE));

    device.end_pass(PassKind::Pick);
    let report = scene.render(&mut device, RenderOptions::default()).unwrap();
    assert!(report.submitted());
}
