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

//! Pick query types and canvas unprojection.

use stratum_core::math::{Ray, Vec3, Vec4};
use stratum_core::renderer::EntityId;
use stratum_core::state::ViewCore;

/// Options of one pick query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PickOptions {
    /// Also render the depth pick buffer and reconstruct the surface point.
    pub ray_surface: bool,
}

/// A resolved pick.
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    /// Id decoded from the pick buffer, always >= 1.
    pub pick_id: u32,
    /// The entity that drew the pixel.
    pub entity: EntityId,
    /// Name of the entity's name core.
    pub name: String,
    /// Queried canvas position.
    pub canvas_pos: (u32, u32),
    /// World-space surface point, when `ray_surface` was requested.
    pub world_pos: Option<Vec3>,
    /// World-space ray through the queried pixel.
    pub ray: Option<Ray>,
}

/// Maps a canvas position and a `[0, 1]` depth to clip space.
pub fn canvas_to_clip(x: u32, y: u32, depth: f32, canvas: (u32, u32)) -> Vec4 {
    let (w, h) = (canvas.0.max(1) as f32, canvas.1.max(1) as f32);
    Vec4::new(
        2.0 * x as f32 / w - 1.0,
        1.0 - 2.0 * y as f32 / h,
        2.0 * depth - 1.0,
        1.0,
    )
}

/// Reconstructs the world point under `(x, y)` at `depth`, seen through `view`.
///
/// Returns `None` when the view-projection matrix is singular.
pub fn unproject(view: &ViewCore, x: u32, y: u32, depth: f32, canvas: (u32, u32)) -> Option<Vec3> {
    let inverse = view.view_projection().inverse()?;
    (inverse * canvas_to_clip(x, y, depth, canvas)).project()
}

/// The ray from the near to the far plane through `(x, y)`.
pub fn pick_ray(view: &ViewCore, x: u32, y: u32, canvas: (u32, u32)) -> Option<Ray> {
    let near = unproject(view, x, y, 0.0, canvas)?;
    let far = unproject(view, x, y, 1.0, canvas)?;
    let direction = far - near;
    if direction.length() <= stratum_core::math::EPSILON {
        return None;
    }
    Some(Ray::new(near, direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use stratum_core::math::Mat4;

    #[test]
    fn canvas_corners_map_to_clip_corners() {
        let clip = canvas_to_clip(0, 0, 0.0, (100, 50));
        assert_abs_diff_eq!(clip, Vec4::new(-1.0, 1.0, -1.0, 1.0));
        let clip = canvas_to_clip(50, 25, 1.0, (100, 50));
        assert_abs_diff_eq!(clip, Vec4::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn identity_view_unprojects_to_ndc() {
        let view = ViewCore::default();
        let point = unproject(&view, 50, 25, 0.25, (100, 50)).unwrap();
        assert_abs_diff_eq!(point, Vec3::new(0.0, 0.0, -0.5), epsilon = 1e-5);
    }

    #[test]
    fn perspective_ray_points_into_the_scene() {
        let view = ViewCore {
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 1.0, 0.1, 100.0),
        };
        let ray = pick_ray(&view, 50, 50, (100, 100)).unwrap();
        assert_abs_diff_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-4);
        assert_abs_diff_eq!(ray.origin.z, 4.9, epsilon = 1e-3);
    }

    #[test]
    fn singular_view_has_no_ray() {
        let view = ViewCore {
            view: Mat4::from_scale(Vec3::ZERO),
            projection: Mat4::IDENTITY,
        };
        assert!(pick_ray(&view, 0, 0, (10, 10)).is_none());
    }
}
