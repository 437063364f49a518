//! Arbitrary convex volumes used for volume queries and complex culling

use crate::core::types::{Affine3A, Mat4, Vec3};
use super::aabb::Aabb;
use super::frustum::{ClipSpaceType, Frustum, Plane};

/// Result of testing a box against a volume
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CullTestResult {
    Culled,
    Boundary,
    Within,
}

/// Intersection of half-spaces. Plane normals point inwards.
#[derive(Clone, Debug, Default)]
pub struct ConvexVolume {
    pub planes: Vec<Plane>,
}

impl ConvexVolume {
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    pub fn from_frustum(frustum: &Frustum) -> Self {
        Self { planes: frustum.planes.to_vec() }
    }

    pub fn from_view_projection(vp: &Mat4, clip: ClipSpaceType) -> Self {
        Self::from_frustum(&Frustum::from_view_projection(vp, clip))
    }

    /// Volume matching an axis-aligned box
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            planes: vec![
                Plane::new(Vec3::X, -aabb.min.x),
                Plane::new(Vec3::NEG_X, aabb.max.x),
                Plane::new(Vec3::Y, -aabb.min.y),
                Plane::new(Vec3::NEG_Y, aabb.max.y),
                Plane::new(Vec3::Z, -aabb.min.z),
                Plane::new(Vec3::NEG_Z, aabb.max.z),
            ],
        }
    }

    /// Test a box given in local space, mapped into volume space by `local_to_volume`.
    /// Exact for the transformed corners; conservative (never culls something inside).
    pub fn test_aabb(&self, local_to_volume: &Affine3A, aabb: &Aabb) -> CullTestResult {
        let corners = aabb.corners().map(|c| local_to_volume.transform_point3(c));
        let mut within = true;
        for plane in &self.planes {
            let inside = corners
                .iter()
                .filter(|c| plane.distance_to_point(**c) >= 0.0)
                .count();
            if inside == 0 {
                return CullTestResult::Culled;
            }
            if inside != corners.len() {
                within = false;
            }
        }
        if within { CullTestResult::Within } else { CullTestResult::Boundary }
    }

    pub fn test_world_aabb(&self, aabb: &Aabb) -> CullTestResult {
        self.test_aabb(&Affine3A::IDENTITY, aabb)
    }
}
