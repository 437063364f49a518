//! Axis-aligned bounding box

use bytemuck::{Pod, Zeroable};
use crate::core::types::{Affine3A, Vec3};

/// Axis-aligned bounding box defined by min and max corners.
///
/// This is also the on-disk bounding box record of a placements chunk, so the
/// layout is fixed: six little-endian `f32`s, min first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that contains nothing; `merged` with anything yields the other box.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(-f32::MAX),
    };

    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create AABB from center and half-extents
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get half-extents
    pub fn half_extent(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// False for `EMPTY` and any other inverted box
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Check if point is inside AABB
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if two AABBs intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Expand AABB to include point
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Return merged AABB containing both
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow every face outwards by `amount`
    pub fn inflated(&self, amount: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }

    /// The 8 corners, bit 0 = x, bit 1 = y, bit 2 = z selecting max
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| Vec3::new(
            if i & 1 != 0 { self.max.x } else { self.min.x },
            if i & 2 != 0 { self.max.y } else { self.min.y },
            if i & 4 != 0 { self.max.z } else { self.min.z },
        ))
    }

    /// Bounding box of this box after transformation.
    ///
    /// Uses the center/extent form, so the result is tight for the rotated box.
    pub fn transformed(&self, transform: &Affine3A) -> Aabb {
        if !self.is_valid() {
            return *self;
        }
        let center = transform.transform_point3(self.center());
        let m = transform.matrix3;
        let h = self.half_extent();
        let extent = Vec3::new(
            m.x_axis.x.abs() * h.x + m.y_axis.x.abs() * h.y + m.z_axis.x.abs() * h.z,
            m.x_axis.y.abs() * h.x + m.y_axis.y.abs() * h.y + m.z_axis.y.abs() * h.z,
            m.x_axis.z.abs() * h.x + m.y_axis.z.abs() * h.y + m.z_axis.z.abs() * h.z,
        );
        Aabb::from_center_half_extent(center, extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(aabb.center(), Vec3::splat(0.5));
        assert_eq!(aabb.size(), Vec3::ONE);
    }

    #[test]
    fn test_contains_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(!aabb.contains_point(Vec3::splat(2.0)));
    }

    #[test]
    fn test_intersects() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let c = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_empty_merge() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(!Aabb::EMPTY.is_valid());
        assert_eq!(Aabb::EMPTY.merged(&a), a);
    }

    #[test]
    fn test_transformed_translation_and_rotation() {
        let a = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let moved = a.transformed(&Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(moved.min, Vec3::new(9.0, -2.0, -3.0));
        assert_eq!(moved.max, Vec3::new(11.0, 2.0, 3.0));

        let turned = a.transformed(&Affine3A::from_rotation_z(std::f32::consts::FRAC_PI_2));
        assert!((turned.max.x - 2.0).abs() < 1e-5);
        assert!((turned.max.y - 1.0).abs() < 1e-5);
    }
}
