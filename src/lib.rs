//! Placements - streamed, culled and editable static object placements
//!
//! The world is split into cells, each backed by a placements chunk on disk.
//! Cells are loaded on demand into an LRU cache, culled per view through a
//! quad tree, and turned into instanced draws. Editor tooling can pick
//! objects and edit them transactionally through per-cell overlays.

pub mod core;
pub mod math;
pub mod config;
pub mod scaffold;
pub mod spatial;
pub mod scene;
pub mod cell;
pub mod cell_renderer;
pub mod streaming;
pub mod render;
pub mod intersections;
pub mod editor;
pub mod manager;

pub use cell::{PlacementCell, PlacementCellSet};
pub use config::{PlacementsConfig, WorldPlacementsConfig};
pub use crate::core::{Error, Result};
pub use editor::{ObjTransDef, PlacementsEditor, Transaction, TransactionFlags, TransactionType};
pub use intersections::PlacementsIntersections;
pub use manager::PlacementsManager;
pub use render::{PlacementsRenderer, SceneExecuteContext, ViewDesc};
pub use scaffold::PlacementsScaffold;
pub use streaming::PlacementsCache;
