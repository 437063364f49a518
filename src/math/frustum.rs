//! View frustum for culling

use crate::core::types::{Vec3, Vec4, Mat4};
use super::aabb::Aabb;
use super::convex::CullTestResult;

/// Depth range of clip space produced by the projection matrices in use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClipSpaceType {
    /// Depth in [0, 1] (wgpu, Vulkan, glam's `perspective_rh`)
    #[default]
    Positive,
    /// Depth in [-1, 1] (OpenGL style)
    StraddlingZero,
}

/// A plane defined by normal and distance from origin
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    fn from_vec4(plane: Vec4) -> Plane {
        let normal = Vec3::new(plane.x, plane.y, plane.z);
        let len = normal.length();
        if len > 0.0 {
            Plane { normal: normal / len, distance: plane.w / len }
        } else {
            // degenerate row; a plane that never culls
            Plane { normal: Vec3::ZERO, distance: 1.0 }
        }
    }
}

/// View frustum with 6 planes (Near, Far, Left, Right, Top, Bottom).
///
/// The planes live in whatever space the source matrix maps from, so a
/// frustum built from `cell_to_clip` tests cell-space boxes directly.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a clip-space matrix (Gribb/Hartmann)
    pub fn from_view_projection(vp: &Mat4, clip: ClipSpaceType) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let near = match clip {
            ClipSpaceType::Positive => rows[2],
            ClipSpaceType::StraddlingZero => rows[3] + rows[2],
        };

        Self {
            planes: [
                Plane::from_vec4(near),
                Plane::from_vec4(rows[3] - rows[2]), // far
                Plane::from_vec4(rows[3] + rows[0]), // left
                Plane::from_vec4(rows[3] - rows[0]), // right
                Plane::from_vec4(rows[3] - rows[1]), // top
                Plane::from_vec4(rows[3] + rows[1]), // bottom
            ],
        }
    }

    /// Check if point is inside frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Check if AABB intersects frustum (conservative test)
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // Find the corner most aligned with plane normal (p-vertex)
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            // If p-vertex is outside, AABB is completely outside
            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }

    /// Three-way classification used by hierarchical culling.
    ///
    /// `Culled` and the boolean `intersects_aabb` always agree; `Within`
    /// means every box contained in `aabb` also intersects.
    pub fn classify_aabb(&self, aabb: &Aabb) -> CullTestResult {
        let mut within = true;
        for plane in &self.planes {
            let (p, n) = plane_extremes(plane, aabb);
            if plane.distance_to_point(p) < 0.0 {
                return CullTestResult::Culled;
            }
            if plane.distance_to_point(n) < 0.0 {
                within = false;
            }
        }
        if within { CullTestResult::Within } else { CullTestResult::Boundary }
    }
}

/// (p-vertex, n-vertex) of a box relative to a plane
fn plane_extremes(plane: &Plane, aabb: &Aabb) -> (Vec3, Vec3) {
    let pick = |positive: bool, lo: f32, hi: f32| if positive { (hi, lo) } else { (lo, hi) };
    let (px, nx) = pick(plane.normal.x >= 0.0, aabb.min.x, aabb.max.x);
    let (py, ny) = pick(plane.normal.y >= 0.0, aabb.min.y, aabb.max.y);
    let (pz, nz) = pick(plane.normal.z >= 0.0, aabb.min.z, aabb.max.z);
    (Vec3::new(px, py, pz), Vec3::new(nx, ny, nz))
}

/// True when the box is entirely outside the clip volume of `local_to_clip`.
pub fn cull_aabb(local_to_clip: &Mat4, aabb: &Aabb, clip: ClipSpaceType) -> bool {
    !Frustum::from_view_projection(local_to_clip, clip).intersects_aabb(aabb)
}
