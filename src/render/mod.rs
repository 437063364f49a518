//! Visibility culling and drawables construction for placements

pub mod culling;
pub mod renderer;

pub use culling::{cull_cell, cull_cell_multi_view, cull_cell_volume, cull_linear, cull_linear_multi_view, cull_linear_volume};
pub use renderer::{PlacementsRenderer, SceneExecuteContext, ViewDesc};
