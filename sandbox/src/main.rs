use anyhow::Context;
use stratum_sdk::config::load_settings;
use stratum_sdk::init_logging;
use stratum_sdk::prelude::*;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const FRAMES: u64 = 120;

fn camera() -> ViewCore {
    ViewCore {
        view: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO, Vec3::Y),
        projection: Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_3,
            WIDTH as f32 / HEIGHT as f32,
            0.1,
            100.0,
        ),
    }
}

fn material(base_color: [f32; 3], alpha: f32) -> MaterialCore {
    MaterialCore {
        base_color,
        alpha,
        ..Default::default()
    }
}

fn at(x: f32, y: f32, z: f32) -> TransformCore {
    TransformCore {
        model: Mat4::from_translation(Vec3::new(x, y, z)),
    }
}

fn named(name: &str) -> NameCore {
    NameCore {
        name: Some(name.to_owned()),
    }
}

fn build_scene(scene: &mut Scene) -> EntityId {
    // Shared by every on-screen entity.
    let view = Core::new(camera());
    let view_id = scene.registry_mut().register(view);
    let lights = Core::new(LightsCore {
        lights: vec![
            Light::ambient([0.2, 0.2, 0.2]),
            Light::directional([1.0, 1.0, 1.0], Vec3::new(-0.3, -1.0, -0.5), LightSpace::World),
        ],
    });

    // Offscreen pass rendering into target 1, sampled by the monitor below.
    scene
        .spawn()
        .with(RenderTargetCore {
            targets: vec![RenderTargetId(1)],
        })
        .with(material([0.9, 0.6, 0.1], 1.0))
        .build();

    scene
        .spawn()
        .with_ref::<ViewCore>(view_id)
        .with_core(StateCore::from_core(lights.clone()))
        .with(named("floor"))
        .with(TransformCore {
            model: Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))
                * Mat4::from_scale(Vec3::new(8.0, 0.1, 8.0)),
        })
        .with(LayerCore {
            priority: -1,
            enabled: true,
        })
        .build();

    scene
        .spawn()
        .with_ref::<ViewCore>(view_id)
        .with(named("monitor"))
        .with(at(-1.5, 0.0, 0.0))
        .with(TexturesCore {
            layers: vec![TextureLayer::new(
                TextureSource::RenderTarget(RenderTargetId(1)),
                MapKind::BaseColor,
            )],
        })
        .build();

    scene
        .spawn()
        .with_ref::<ViewCore>(view_id)
        .with(named("glass"))
        .with(at(1.5, 0.0, 1.0))
        .with(material([0.4, 0.7, 1.0], 0.4))
        .with(FlagsCore {
            transparent: true,
            ..Default::default()
        })
        .with(DrawModeCore {
            blend: BlendMode::Alpha,
            depth_write: false,
            ..Default::default()
        })
        .build();

    scene
        .spawn()
        .with_ref::<ViewCore>(view_id)
        .with_core(StateCore::from_core(lights))
        .with(named("spinner"))
        .with(material([0.8, 0.1, 0.1], 1.0))
        .with(TagCore {
            tag: Some("world".into()),
        })
        .build()
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "stratum.ron".to_string());
    let settings = load_settings(&path).with_context(|| format!("loading {path}"))?;
    init_logging(&settings);

    let mut engine = Engine::headless(WIDTH, HEIGHT, settings);
    let scene_id = engine.create_scene("sandbox");
    let scene = engine
        .scene_mut(scene_id)
        .context("scene vanished after creation")?;
    let spinner = build_scene(scene);

    let sender = scene.event_sender();
    scene.on_tick(move |tick| {
        let height = (tick.frame as f32 * 0.1).sin() * 0.5;
        let _ = sender.send(SceneEvent::SetCore {
            entity: spinner,
            core: TransformCore::wrap(Core::new(at(0.0, height, 0.0))),
        });
    });
    scene.observe::<TransformCore>(spinner, |core: &CoreRef<TransformCore>| {
        log::trace!("spinner moved to {:?}", core.model.get(3, 1));
    });

    let frames = engine.run(&mut FixedFramePump::new(FRAMES))?;
    log::info!("Rendered {frames} frames.");

    for (x, y) in [(WIDTH / 2, HEIGHT / 2), (WIDTH / 4, HEIGHT / 2), (1, 1)] {
        match engine.pick(scene_id, x, y, PickOptions { ray_surface: true })? {
            Some(hit) => log::info!(
                "({x}, {y}) -> '{}' ({}) at {:?}",
                hit.name,
                hit.entity,
                hit.world_pos
            ),
            None => log::info!("({x}, {y}) -> nothing"),
        }
    }

    if let Some(scene) = engine.scene(scene_id) {
        let caches = scene.renderer().caches();
        log::info!(
            "{} programs, {} chunks, stats {:?}",
            caches.programs.len(),
            caches.chunks.len(),
            scene.renderer().stats()
        );
    }
    engine.shutdown();
    Ok(())
}
