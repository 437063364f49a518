//! Mathematical utilities and data structures

pub mod aabb;
pub mod convex;
pub mod frustum;
pub mod ray;
pub mod transform;

pub use aabb::Aabb;
pub use convex::{ConvexVolume, CullTestResult};
pub use frustum::{ClipSpaceType, Frustum, Plane, cull_aabb};
pub use ray::RaySegment;
pub use transform::{Float3x4, affine_from_3x4, affine_to_3x4, decompose_rotation_scale};
