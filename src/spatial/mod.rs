//! Spatial indexing over object bounding boxes

pub mod quad_tree;

pub use quad_tree::{CullMetrics, MAX_VIEWS, QuadTree, clamp_views};
