//! Core type aliases and re-exports

pub use glam::{
    Vec2, Vec3, Vec4,
    Mat3, Mat4,
    Quat, Affine3A,
};

/// Standard Result type for the placements system
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Identity of a cell: the 64-bit hash of its placements filename
pub type CellId = u64;

/// Globally unique identity of a placed object: `(cell filename hash, object guid)`
pub type PlacementGuid = (CellId, u64);
