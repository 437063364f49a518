//! Ray segment type and operations

use crate::core::types::{Affine3A, Vec3};
use super::aabb::Aabb;

/// A finite ray running from `start` to `end`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaySegment {
    pub start: Vec3,
    pub end: Vec3,
}

impl RaySegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vec3 {
        self.end - self.start
    }

    /// Get point along the segment at parameter t (0 = start, 1 = end)
    pub fn at(&self, t: f32) -> Vec3 {
        self.start + self.direction() * t
    }

    /// Segment-AABB intersection using slab method.
    /// Returns Some((t_near, t_far)) clamped to [0, 1] if the segment touches the box.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let dir = self.direction();
        let mut t_near = 0.0f32;
        let mut t_far = 1.0f32;

        for axis in 0..3 {
            let origin = self.start[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
            if dir[axis].abs() < f32::EPSILON {
                // parallel to this slab
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir[axis];
            let mut t1 = (lo - origin) * inv;
            let mut t2 = (hi - origin) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_near = t_near.max(t1);
            t_far = t_far.min(t2);
            if t_near > t_far {
                return None;
            }
        }
        Some((t_near, t_far))
    }

    /// Transform both endpoints
    pub fn transform(&self, transform: &Affine3A) -> RaySegment {
        RaySegment {
            start: transform.transform_point3(self.start),
            end: transform.transform_point3(self.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at() {
        let ray = RaySegment::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(ray.at(0.5), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_intersects_aabb_hit() {
        let ray = RaySegment::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::new(8.0, 0.5, 0.5));
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let (t_near, t_far) = ray.intersects_aabb(&aabb).unwrap();
        assert!((t_near - 0.2).abs() < 0.001);
        assert!((t_far - 0.3).abs() < 0.001);
    }

    #[test]
    fn test_intersects_aabb_miss() {
        let ray = RaySegment::new(Vec3::new(-2.0, 5.0, 0.5), Vec3::new(8.0, 5.0, 0.5));
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_none());
    }

    #[test]
    fn test_segment_stops_short() {
        let ray = RaySegment::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.5, 0.5));
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersects_aabb(&aabb).is_none());
    }

    #[test]
    fn test_start_inside() {
        let ray = RaySegment::new(Vec3::splat(0.5), Vec3::splat(0.6));
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(ray.intersects_aabb(&aabb), Some((0.0, 1.0)));
    }

    #[test]
    fn test_transform() {
        let ray = RaySegment::new(Vec3::ZERO, Vec3::X);
        let moved = ray.transform(&Affine3A::from_translation(Vec3::Y));
        assert_eq!(moved.start, Vec3::Y);
        assert_eq!(moved.end, Vec3::new(1.0, 1.0, 0.0));
    }
}
