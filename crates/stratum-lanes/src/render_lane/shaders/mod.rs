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

//! Built-in program sources.
//!
//! The GLSL templates are embedded at compile time. [`DefaultProgramSourceFactory`]
//! prepends a `#define` header derived from an entity's shader cores, so two
//! entities with the same program hash always get byte-identical source.

use stratum_core::renderer::{ProgramSource, ProgramSourceFactory, ShaderSource, StateSnapshot};
use stratum_core::state::{LightKind, LightSpace};
use std::fmt::Write;

/// Vertex stage shared by the draw and pick variants.
pub const DRAW_VERT_GLSL: &str = include_str!("draw.vert.glsl");

/// Fragment stage of the draw variant.
pub const DRAW_FRAG_GLSL: &str = include_str!("draw.frag.glsl");

/// Fragment stage of the pick variant.
pub const PICK_FRAG_GLSL: &str = include_str!("pick.frag.glsl");

const VERSION: &str = "#version 300 es\nprecision highp float;\n";

/// Generates GLSL from the built-in templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProgramSourceFactory;

impl DefaultProgramSourceFactory {
    fn header(hash: &str, snapshot: &StateSnapshot<'_>) -> String {
        let mut out = String::from(VERSION);
        let _ = writeln!(out, "// program {hash}");
        let mut define = |name: &str, on: bool| {
            if on {
                let _ = writeln!(out, "#define {name}");
            }
        };
        let geometry = snapshot.geometry;
        define("HAS_NORMALS", geometry.has_normals && geometry.primitive.is_surface());
        define("HAS_UVS", geometry.has_uvs);
        define("HAS_COLORS", geometry.has_colors);
        define("MORPHING", snapshot.morph.targets > 0);
        define("BACKFACE_LIGHTING", snapshot.flags.backface_lighting);
        define("SPECULAR", snapshot.flags.specular);

        let lights = snapshot
            .lights
            .lights
            .iter()
            .filter(|light| light.kind != LightKind::Ambient)
            .count();
        let world_lights = snapshot
            .lights
            .lights
            .iter()
            .any(|light| light.kind != LightKind::Ambient && light.space == LightSpace::World);
        let clips = if snapshot.flags.clipping {
            snapshot.clip_planes.active().count()
        } else {
            0
        };
        let _ = writeln!(out, "#define LIGHT_COUNT {lights}");
        if world_lights {
            let _ = writeln!(out, "#define WORLD_SPACE_LIGHTS");
        }
        let _ = writeln!(out, "#define CLIP_PLANE_COUNT {clips}");
        let _ = writeln!(
            out,
            "#define TEXTURE_LAYER_COUNT {}",
            snapshot.textures.layers.len()
        );
        out
    }
}

impl ProgramSourceFactory for DefaultProgramSourceFactory {
    fn source(&self, hash: &str, snapshot: &StateSnapshot<'_>) -> ProgramSource {
        let header = Self::header(hash, snapshot);
        let vertex = format!("{header}{DRAW_VERT_GLSL}");
        let draw = match &snapshot.shader.source {
            Some(custom) => ShaderSource {
                vertex: format!("{header}{}", custom.vertex),
                fragment: format!("{header}{}", custom.fragment),
            },
            None => ShaderSource {
                vertex: vertex.clone(),
                fragment: format!("{header}{DRAW_FRAG_GLSL}"),
            },
        };
        ProgramSource {
            draw,
            pick: ShaderSource {
                vertex,
                fragment: format!("{header}{PICK_FRAG_GLSL}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::math::Vec3;
    use stratum_core::state::{
        ClipPlanesCore, FlagsCore, GeometryCore, Light, LightsCore, MorphCore, ShaderCore,
        ShaderOverride, TexturesCore,
    };

    struct Cores {
        geometry: GeometryCore,
        flags: FlagsCore,
        lights: LightsCore,
        clip_planes: ClipPlanesCore,
        morph: MorphCore,
        textures: TexturesCore,
        shader: ShaderCore,
    }

    impl Cores {
        fn new() -> Self {
            Self {
                geometry: GeometryCore::default(),
                flags: FlagsCore::default(),
                lights: LightsCore::default(),
                clip_planes: ClipPlanesCore::default(),
                morph: MorphCore::default(),
                textures: TexturesCore::default(),
                shader: ShaderCore::default(),
            }
        }

        fn snapshot(&self) -> StateSnapshot<'_> {
            StateSnapshot {
                geometry: &self.geometry,
                flags: &self.flags,
                lights: &self.lights,
                clip_planes: &self.clip_planes,
                morph: &self.morph,
                textures: &self.textures,
                shader: &self.shader,
            }
        }
    }

    #[test]
    fn header_reflects_lights_and_features() {
        let mut cores = Cores::new();
        cores.lights.lights = vec![
            Light::ambient([0.2; 3]),
            Light::directional([1.0; 3], Vec3::Y, LightSpace::World),
        ];
        cores.morph.targets = 2;
        let source = DefaultProgramSourceFactory.source("h", &cores.snapshot());
        assert!(source.draw.fragment.contains("#define LIGHT_COUNT 1\n"));
        assert!(source.draw.fragment.contains("#define WORLD_SPACE_LIGHTS\n"));
        assert!(source.draw.vertex.contains("#define MORPHING\n"));
        assert!(source.pick.fragment.contains("u_pick_color"));
    }

    #[test]
    fn generation_is_deterministic() {
        let cores = Cores::new();
        let a = DefaultProgramSourceFactory.source("h", &cores.snapshot());
        let b = DefaultProgramSourceFactory.source("h", &cores.snapshot());
        assert_eq!(a, b);
    }

    #[test]
    fn custom_source_replaces_draw_variant_only() {
        let mut cores = Cores::new();
        cores.shader.source = Some(ShaderOverride {
            id: "toon".into(),
            vertex: "void main() {}".into(),
            fragment: "void main() { /* toon */ }".into(),
        });
        let source = DefaultProgramSourceFactory.source("h", &cores.snapshot());
        assert!(source.draw.fragment.ends_with("/* toon */ }"));
        assert!(source.pick.fragment.contains("pack_depth"));
    }

    #[test]
    fn lines_do_not_take_normals() {
        let mut cores = Cores::new();
        cores.geometry.primitive = stratum_core::state::Primitive::Lines;
        let source = DefaultProgramSourceFactory.source("h", &cores.snapshot());
        assert!(!source.draw.vertex.contains("#define HAS_NORMALS"));
    }
}
