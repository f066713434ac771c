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

use stratum_core::renderer::{DrawCommand, DrawList, PassKind, StageSlot};
use stratum_core::state::{
    Core, CoreValue, FlagsCore, GeometryCore, MaterialCore, MorphCore, Primitive, StageCore,
    StateCore,
};
use stratum_core::renderer::EntityId;
use stratum_data::{EntityPool, ResourceCaches};
use stratum_infra::HeadlessDevice;
use stratum_lanes::{
    DefaultProgramSourceFactory, DrawListLane, EntityBuildLane, SortKeyLane, SubmitLane,
};

fn core<T: CoreValue>(value: T) -> StateCore {
    StateCore::from_core(Core::new(value))
}

struct Scene {
    pool: EntityPool,
    caches: ResourceCaches,
    device: HeadlessDevice,
}

impl Scene {
    fn new() -> Self {
        Self {
            pool: EntityPool::new(),
            caches: ResourceCaches::new(),
            device: HeadlessDevice::new(32, 32),
        }
    }

    fn build(&mut self) {
        let report = EntityBuildLane::new("integration").run(
            &mut self.pool,
            &mut self.caches,
            &DefaultProgramSourceFactory,
            &mut self.device,
        );
        assert_eq!(report.failed, 0);
    }

    fn sort(&mut self) {
        let lane = SortKeyLane::new();
        lane.compute_keys(&mut self.pool, &self.caches.programs);
        lane.sort(&mut self.pool);
    }

    fn compile(&mut self) -> DrawList {
        self.build();
        self.sort();
        DrawListLane::new().compile(&self.pool, None)
    }
}

#[test]
fn stage_then_transparency_then_program() {
    let mut scene = Scene::new();
    let lines = core(GeometryCore {
        primitive: Primitive::Lines,
        ..Default::default()
    });
    // Inserted in reverse so the order below comes from the keys alone.
    let e3 = scene
        .pool
        .insert([core(StageCore { priority: 1, pickable: true }), lines]);
    let e2 = scene.pool.insert([core(FlagsCore {
        transparent: true,
        ..Default::default()
    })]);
    let e1 = scene.pool.insert([]);

    let list = scene.compile();
    assert_eq!(scene.pool.order(), &[e1, e2, e3]);

    let program_of = |id: EntityId| scene.pool.get(id).unwrap().program.unwrap();
    assert_eq!(program_of(e1), program_of(e2));
    assert_ne!(program_of(e1), program_of(e3));

    let program_slot = StageSlot::Program.index();
    let p1_chunk = scene.pool.get(e1).unwrap().chunks[program_slot].unwrap();
    let p2_chunk = scene.pool.get(e3).unwrap().chunks[program_slot].unwrap();
    let applied: Vec<_> = list.applied_chunks().collect();
    assert_eq!(applied.first(), Some(&p1_chunk));
    assert_eq!(applied.iter().filter(|c| **c == p1_chunk).count(), 1);
    assert_eq!(applied.iter().filter(|c| **c == p2_chunk).count(), 1);

    // E2 shares every chunk with E1 except the per-draw geometry chunk.
    let geometry = StageSlot::Geometry.index();
    let e1_geometry = scene.pool.get(e1).unwrap().chunks[geometry].unwrap();
    let first_draw = applied.iter().position(|c| *c == e1_geometry).unwrap();
    assert_eq!(applied[first_draw + 1], e1_geometry);
    assert_eq!(applied[first_draw + 2], p2_chunk);
}

#[test]
fn sorting_is_idempotent_and_keeps_insertion_order_for_ties() {
    let mut scene = Scene::new();
    let ids: Vec<_> = (0..5).map(|_| scene.pool.insert([])).collect();
    scene.build();
    scene.sort();
    let first = scene.pool.order().to_vec();
    scene.sort();
    assert_eq!(scene.pool.order(), first.as_slice());
    assert_eq!(first, ids);
}

#[test]
fn submitted_list_draws_the_material_color() {
    let mut scene = Scene::new();
    scene.pool.insert([core(MaterialCore {
        base_color: [0.0, 1.0, 0.0],
        ..Default::default()
    })]);
    let list = scene.compile();

    let report = SubmitLane::new()
        .submit(
            &list.draw,
            PassKind::Draw,
            Some([0.0, 0.0, 0.0, 1.0]),
            &scene.caches.chunks,
            &mut scene.device,
        )
        .unwrap();
    assert_eq!(report.draw_calls, 1);
    assert_eq!(report.commands, list.draw.len());
    assert_eq!(scene.device.pixel(16, 16).unwrap().to_rgba(), [0, 255, 0, 255]);
    assert_eq!(scene.device.pixel(0, 0).unwrap().to_rgba(), [0, 0, 0, 255]);
}

#[test]
fn removed_entities_leave_no_stale_commands() {
    let mut scene = Scene::new();
    let a = scene.pool.insert([]);
    scene.pool.insert([core(MaterialCore {
        alpha: 0.5,
        ..Default::default()
    })]);
    scene.compile();

    let mut entity = scene.pool.remove(a).unwrap();
    scene.caches.release_entity(&mut entity, &mut scene.device);
    let list = scene.compile();
    for command in &list.draw {
        if let DrawCommand::Apply(chunk) = command {
            assert!(scene.caches.chunks.get(*chunk).is_some());
        }
    }
}

#[test]
fn negative_stage_draws_before_stage_zero() {
    let mut scene = Scene::new();
    let default_stage = scene.pool.insert([]);
    let early_stage = scene.pool.insert([core(StageCore {
        priority: -1,
        pickable: true,
    })]);
    scene.compile();
    assert_eq!(scene.pool.order(), &[early_stage, default_stage]);
}

#[test]
fn program_identity_in_key_is_stable_across_recompiles() {
    let mut scene = Scene::new();
    let mut fields = Vec::new();
    for targets in 1..=4 {
        let id = scene.pool.insert([core(MorphCore {
            targets,
            factor: 0.5,
        })]);
        scene.build();
        scene.sort();
        let entity = scene.pool.get(id).unwrap();
        let program = entity.program.unwrap();
        let field = (entity.sort_key >> 20) & ((1 << 20) - 1);
        assert_eq!(field, u64::from(program.slot_index()));
        fields.push(field);

        let mut entity = scene.pool.remove(id).unwrap();
        scene.caches.release_entity(&mut entity, &mut scene.device);
    }
    // Every iteration compiled a fresh program into the freed slot.
    assert!(fields.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(scene.device.stats().programs_compiled >= 8);
}
