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

//! The concrete core value types, one per [`StateAspect`](super::StateAspect).

use super::ShaderHash;
use crate::math::{Aabb, Mat4, Vec3};
use crate::renderer::{RenderTargetId, TextureId};
use std::fmt::Write;

fn bit(flag: bool) -> char {
    if flag {
        '1'
    } else {
        '0'
    }
}

// --- Ordering & partitioning ---

/// Coarse draw ordering. Lower priorities draw first.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCore {
    /// Stage priority. Lower stages draw first; the sort key holds `-128..=127`.
    pub priority: i32,
    /// Whether entities in this stage may appear in the pick list.
    pub pickable: bool,
}

impl Default for StageCore {
    fn default() -> Self {
        Self {
            priority: 0,
            pickable: true,
        }
    }
}

impl ShaderHash for StageCore {}

/// Fine draw ordering within a stage, plus a visibility switch.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCore {
    /// Layer priority. May be negative.
    pub priority: i32,
    /// Disabled layers are culled.
    pub enabled: bool,
}

impl Default for LayerCore {
    fn default() -> Self {
        Self {
            priority: 0,
            enabled: true,
        }
    }
}

impl ShaderHash for LayerCore {}

/// Offscreen targets an entity renders into. Empty means the on-screen target.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderTargetCore {
    /// Color attachments, in binding order.
    pub targets: Vec<RenderTargetId>,
}

impl RenderTargetCore {
    /// Whether this core redirects drawing off screen.
    pub fn is_offscreen(&self) -> bool {
        !self.targets.is_empty()
    }
}

impl ShaderHash for RenderTargetCore {}

// --- Surface ---

/// Where a texture layer samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSource {
    /// A loaded image.
    Image(TextureId),
    /// The color output of an offscreen render target.
    RenderTarget(RenderTargetId),
}

/// The material channel a texture layer modulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    /// Base (diffuse) color.
    BaseColor,
    /// Specular intensity.
    Specular,
    /// Tangent-space normals.
    Normal,
    /// Emissive color.
    Emit,
    /// Opacity.
    Alpha,
}

impl MapKind {
    fn code(self) -> char {
        match self {
            MapKind::BaseColor => 'b',
            MapKind::Specular => 's',
            MapKind::Normal => 'n',
            MapKind::Emit => 'e',
            MapKind::Alpha => 'a',
        }
    }
}

/// One texture layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureLayer {
    /// Sampled source.
    pub source: TextureSource,
    /// Channel the layer applies to.
    pub apply_to: MapKind,
    /// Blend weight against the untextured value.
    pub blend_factor: f32,
}

impl TextureLayer {
    /// A fully weighted layer.
    pub fn new(source: TextureSource, apply_to: MapKind) -> Self {
        Self {
            source,
            apply_to,
            blend_factor: 1.0,
        }
    }
}

/// Texture layers, in sampling order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TexturesCore {
    /// The layers.
    pub layers: Vec<TextureLayer>,
}

impl TexturesCore {
    /// Render targets sampled by any layer.
    pub fn sampled_targets(&self) -> impl Iterator<Item = RenderTargetId> + '_ {
        self.layers.iter().filter_map(|layer| match layer.source {
            TextureSource::RenderTarget(target) => Some(target),
            TextureSource::Image(_) => None,
        })
    }
}

impl ShaderHash for TexturesCore {
    fn shader_hash(&self) -> String {
        let mut hash = String::from("t");
        for layer in &self.layers {
            hash.push(layer.apply_to.code());
        }
        hash
    }
}

/// Primitive assembly mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Primitive {
    /// Isolated points.
    Points,
    /// Line segments.
    Lines,
    /// Closed polyline.
    LineLoop,
    /// Open polyline.
    LineStrip,
    /// Independent triangles.
    #[default]
    Triangles,
    /// Triangle strip.
    TriangleStrip,
    /// Triangle fan.
    TriangleFan,
}

impl Primitive {
    fn code(self) -> char {
        match self {
            Primitive::Points => 'p',
            Primitive::Lines => 'l',
            Primitive::LineLoop => 'o',
            Primitive::LineStrip => 's',
            Primitive::Triangles => 't',
            Primitive::TriangleStrip => 'r',
            Primitive::TriangleFan => 'f',
        }
    }

    /// Whether the primitive covers area (and therefore takes lighting).
    pub fn is_surface(self) -> bool {
        matches!(
            self,
            Primitive::Triangles | Primitive::TriangleStrip | Primitive::TriangleFan
        )
    }
}

/// Drawable geometry. Vertex data itself lives on the device; the core
/// describes its layout and bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryCore {
    /// Assembly mode.
    pub primitive: Primitive,
    /// Object-space bounds.
    pub bounds: Aabb,
    /// Vertex normals present.
    pub has_normals: bool,
    /// Texture coordinates present.
    pub has_uvs: bool,
    /// Per-vertex colors present.
    pub has_colors: bool,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Number of indices, 0 for non-indexed geometry.
    pub index_count: u32,
}

impl Default for GeometryCore {
    fn default() -> Self {
        Self {
            primitive: Primitive::Triangles,
            bounds: Aabb::default(),
            has_normals: true,
            has_uvs: false,
            has_colors: false,
            vertex_count: 0,
            index_count: 0,
        }
    }
}

impl ShaderHash for GeometryCore {
    fn shader_hash(&self) -> String {
        format!(
            "g{}{}{}{}",
            self.primitive.code(),
            bit(self.has_normals),
            bit(self.has_uvs),
            bit(self.has_colors)
        )
    }
}

/// Enable flags.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagsCore {
    /// Disabled entities are culled.
    pub enabled: bool,
    /// Whether the entity may be picked.
    pub picking: bool,
    /// Whether clip planes apply.
    pub clipping: bool,
    /// Transparent entities sort after opaque ones within a stage.
    pub transparent: bool,
    /// Light back faces as well as front faces.
    pub backface_lighting: bool,
    /// Specular highlights.
    pub specular: bool,
}

impl Default for FlagsCore {
    fn default() -> Self {
        Self {
            enabled: true,
            picking: true,
            clipping: true,
            transparent: false,
            backface_lighting: true,
            specular: true,
        }
    }
}

impl ShaderHash for FlagsCore {
    fn shader_hash(&self) -> String {
        format!(
            "f{}{}{}",
            bit(self.clipping),
            bit(self.backface_lighting),
            bit(self.specular)
        )
    }
}

/// Winding of front faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontFace {
    /// Counter-clockwise.
    #[default]
    Ccw,
    /// Clockwise.
    Cw,
}

/// Color blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// No blending.
    #[default]
    Opaque,
    /// Source-alpha blending.
    Alpha,
    /// Additive.
    Additive,
}

/// Rasterizer and output-merger toggles.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawModeCore {
    /// Draw back faces (culling off).
    pub backfaces: bool,
    /// Front-face winding.
    pub front_face: FrontFace,
    /// Depth testing.
    pub depth_test: bool,
    /// Depth writes.
    pub depth_write: bool,
    /// Blend mode.
    pub blend: BlendMode,
}

impl Default for DrawModeCore {
    fn default() -> Self {
        Self {
            backfaces: true,
            front_face: FrontFace::Ccw,
            depth_test: true,
            depth_write: true,
            blend: BlendMode::Opaque,
        }
    }
}

impl ShaderHash for DrawModeCore {}

/// A free-form tag matched against the scene's tag filter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagCore {
    /// The tag. Untagged entities always pass the filter.
    pub tag: Option<String>,
}

impl ShaderHash for TagCore {}

/// Phong-style surface material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCore {
    /// Diffuse color.
    pub base_color: [f32; 3],
    /// Specular color.
    pub specular_color: [f32; 3],
    /// Specular intensity.
    pub specular: f32,
    /// Specular exponent.
    pub shine: f32,
    /// Opacity.
    pub alpha: f32,
    /// Emissive factor.
    pub emit: f32,
}

impl Default for MaterialCore {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0],
            specular_color: [1.0, 1.0, 1.0],
            specular: 1.0,
            shine: 40.0,
            alpha: 1.0,
            emit: 0.0,
        }
    }
}

impl ShaderHash for MaterialCore {}

// --- Lighting & clipping ---

/// Kind of light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Uniform ambient contribution.
    Ambient,
    /// Infinitely distant light.
    Directional,
    /// Point light.
    Point,
}

/// Coordinate space a light is specified in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightSpace {
    /// Fixed to the camera.
    View,
    /// Fixed in the world.
    World,
}

/// One light source.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Kind.
    pub kind: LightKind,
    /// Space.
    pub space: LightSpace,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Position, for point lights.
    pub position: Vec3,
    /// Direction, for directional lights.
    pub direction: Vec3,
}

impl Light {
    /// An ambient light.
    pub fn ambient(color: [f32; 3]) -> Self {
        Self {
            kind: LightKind::Ambient,
            space: LightSpace::View,
            color,
            position: Vec3::ZERO,
            direction: Vec3::ZERO,
        }
    }

    /// A directional light.
    pub fn directional(color: [f32; 3], direction: Vec3, space: LightSpace) -> Self {
        Self {
            kind: LightKind::Directional,
            space,
            color,
            position: Vec3::ZERO,
            direction: direction.normalize(),
        }
    }

    /// A point light.
    pub fn point(color: [f32; 3], position: Vec3, space: LightSpace) -> Self {
        Self {
            kind: LightKind::Point,
            space,
            color,
            position,
            direction: Vec3::ZERO,
        }
    }
}

/// Light sources affecting an entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightsCore {
    /// The lights.
    pub lights: Vec<Light>,
}

impl LightsCore {
    /// Sum of all ambient light colors in this core.
    pub fn ambient(&self) -> [f32; 3] {
        self.lights
            .iter()
            .filter(|light| light.kind == LightKind::Ambient)
            .fold([0.0; 3], |acc, light| {
                [
                    acc[0] + light.color[0],
                    acc[1] + light.color[1],
                    acc[2] + light.color[2],
                ]
            })
    }
}

impl ShaderHash for LightsCore {
    fn shader_hash(&self) -> String {
        let mut hash = String::from("l");
        for light in &self.lights {
            hash.push(match light.kind {
                LightKind::Ambient => 'a',
                LightKind::Directional => 'd',
                LightKind::Point => 'p',
            });
            hash.push(match light.space {
                LightSpace::View => 'v',
                LightSpace::World => 'w',
            });
        }
        hash
    }
}

/// Which side of a clip plane survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClipMode {
    /// Keep fragments on the normal side.
    #[default]
    Inside,
    /// Keep fragments on the opposite side.
    Outside,
    /// Plane ignored.
    Disabled,
}

/// One user clip plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlane {
    /// Plane normal.
    pub normal: Vec3,
    /// Signed distance from the origin along the normal.
    pub distance: f32,
    /// Mode.
    pub mode: ClipMode,
}

/// User clip planes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipPlanesCore {
    /// The planes.
    pub planes: Vec<ClipPlane>,
}

impl ClipPlanesCore {
    /// Planes that actually clip.
    pub fn active(&self) -> impl Iterator<Item = &ClipPlane> {
        self.planes
            .iter()
            .filter(|plane| plane.mode != ClipMode::Disabled)
    }
}

impl ShaderHash for ClipPlanesCore {
    fn shader_hash(&self) -> String {
        let mut hash = String::from("c");
        for plane in self.active() {
            hash.push(match plane.mode {
                ClipMode::Inside => 'i',
                ClipMode::Outside => 'o',
                ClipMode::Disabled => continue,
            });
        }
        hash
    }
}

/// Morph target blending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MorphCore {
    /// Number of morph targets carried by the geometry.
    pub targets: u32,
    /// Blend factor between base and target positions.
    pub factor: f32,
}

impl ShaderHash for MorphCore {
    fn shader_hash(&self) -> String {
        format!("m{}", bit(self.targets > 0))
    }
}

// --- Frame-level state ---

/// Renderer toggles.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererCore {
    /// Rasterized line width in pixels.
    pub line_width: f32,
    /// Rasterized point size in pixels.
    pub point_size: f32,
    /// Clear color override for the pass this entity draws into.
    pub clear_color: Option<[f32; 4]>,
}

impl Default for RendererCore {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            point_size: 1.0,
            clear_color: None,
        }
    }
}

impl ShaderHash for RendererCore {}

/// Camera matrices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewCore {
    /// World to view.
    pub view: Mat4,
    /// View to clip.
    pub projection: Mat4,
}

impl ViewCore {
    /// `projection * view`.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl ShaderHash for ViewCore {}

/// Model transform.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformCore {
    /// Object to world.
    pub model: Mat4,
}

impl ShaderHash for TransformCore {}

/// A uniform value supplied to custom shaders.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Scalar float.
    Float(f32),
    /// Scalar int.
    Int(i32),
    /// Boolean.
    Bool(bool),
    /// Three-component vector.
    Vec3(Vec3),
    /// 4x4 matrix.
    Mat4(Mat4),
}

/// Replacement shader source.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderOverride {
    /// Stable identifier; two overrides with the same id must carry the same source.
    pub id: String,
    /// Vertex stage source.
    pub vertex: String,
    /// Fragment stage source.
    pub fragment: String,
}

/// Custom shader source and uniforms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderCore {
    /// Replaces the generated draw program when set.
    pub source: Option<ShaderOverride>,
    /// Uniforms uploaded after the built-in ones.
    pub uniforms: Vec<(String, UniformValue)>,
}

impl ShaderHash for ShaderCore {
    fn shader_hash(&self) -> String {
        let mut hash = String::from("s");
        match &self.source {
            Some(source) => {
                let _ = write!(hash, "[{}]", source.id);
            }
            None => hash.push('-'),
        }
        hash
    }
}

/// Pick name attached to an entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NameCore {
    /// The name. `None` makes the entity anonymous to picking.
    pub name: Option<String>,
}

impl ShaderHash for NameCore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_hash_ignores_counts_and_bounds() {
        let a = GeometryCore {
            vertex_count: 3,
            ..Default::default()
        };
        let b = GeometryCore {
            vertex_count: 300,
            bounds: Aabb::from_center(Vec3::ONE, 4.0),
            ..Default::default()
        };
        assert_eq!(a.shader_hash(), b.shader_hash());
        let lines = GeometryCore {
            primitive: Primitive::Lines,
            ..Default::default()
        };
        assert_ne!(a.shader_hash(), lines.shader_hash());
    }

    #[test]
    fn flags_hash_only_tracks_shader_flags() {
        let base = FlagsCore::default();
        let hidden = FlagsCore {
            enabled: false,
            transparent: true,
            ..Default::default()
        };
        assert_eq!(base.shader_hash(), hidden.shader_hash());
        let flat = FlagsCore {
            specular: false,
            ..Default::default()
        };
        assert_ne!(base.shader_hash(), flat.shader_hash());
    }

    #[test]
    fn lights_accumulate_ambient() {
        let lights = LightsCore {
            lights: vec![
                Light::ambient([0.1, 0.2, 0.3]),
                Light::directional([1.0, 1.0, 1.0], Vec3::Y, LightSpace::World),
                Light::ambient([0.1, 0.0, 0.0]),
            ],
        };
        let ambient = lights.ambient();
        assert!((ambient[0] - 0.2).abs() < 1e-6);
        assert!((ambient[1] - 0.2).abs() < 1e-6);
        assert_eq!(lights.shader_hash(), "lavdwav");
    }

    #[test]
    fn disabled_clip_planes_do_not_affect_hash() {
        let plane = |mode| ClipPlane {
            normal: Vec3::Y,
            distance: 0.0,
            mode,
        };
        let one = ClipPlanesCore {
            planes: vec![plane(ClipMode::Inside)],
        };
        let one_plus_disabled = ClipPlanesCore {
            planes: vec![plane(ClipMode::Inside), plane(ClipMode::Disabled)],
        };
        assert_eq!(one.shader_hash(), one_plus_disabled.shader_hash());
        assert_eq!(one.active().count(), 1);
    }

    #[test]
    fn textures_report_sampled_targets() {
        let textures = TexturesCore {
            layers: vec![
                TextureLayer::new(TextureSource::Image(TextureId(4)), MapKind::BaseColor),
                TextureLayer::new(TextureSource::RenderTarget(RenderTargetId(2)), MapKind::Emit),
            ],
        };
        assert_eq!(
            textures.sampled_targets().collect::<Vec<_>>(),
            vec![RenderTargetId(2)]
        );
        assert_eq!(textures.shader_hash(), "tbe");
    }

    #[test]
    fn shader_override_id_drives_hash() {
        let custom = ShaderCore {
            source: Some(ShaderOverride {
                id: "toon".into(),
                vertex: String::new(),
                fragment: String::new(),
            }),
            uniforms: vec![("bands".into(), UniformValue::Int(4))],
        };
        assert_eq!(custom.shader_hash(), "s[toon]");
        assert_eq!(ShaderCore::default().shader_hash(), "s-");
    }
}
