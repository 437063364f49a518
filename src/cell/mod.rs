//! Registry of placement cells
//!
//! Cells are identified by the hash of their placements filename. The set
//! also owns the editor overlays that temporarily replace a cell's on-disk
//! content while it is being edited.

use std::collections::HashMap;

use crate::cell_renderer::EditorOverlayCellRenderer;
use crate::config::WorldPlacementsConfig;
use crate::core::hash::hash64;
use crate::core::types::{Affine3A, CellId, Vec2, Vec3};
use crate::math::Aabb;

/// One spatial partition of the world
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementCell {
    pub filename_hash: CellId,
    pub filename: String,
    pub cell_to_world: Affine3A,
    /// World-space bounds of the cell's objects
    pub aabb: Aabb,
    /// World-space XY rectangle claiming newly created objects
    pub capture_mins: Vec2,
    pub capture_maxs: Vec2,
}

impl PlacementCell {
    /// Capture rectangle defaults to the XY extent of `aabb`
    pub fn new(filename: impl Into<String>, cell_to_world: Affine3A, aabb: Aabb) -> Self {
        let filename = filename.into();
        Self {
            filename_hash: cell_id(&filename),
            filename,
            cell_to_world,
            aabb,
            capture_mins: aabb.min.truncate(),
            capture_maxs: aabb.max.truncate(),
        }
    }

    pub fn with_capture(mut self, mins: Vec2, maxs: Vec2) -> Self {
        self.capture_mins = mins;
        self.capture_maxs = maxs;
        self
    }

    /// Editor-only cells (filename starting with `[`) have no file on disk
    pub fn is_editor_only(&self) -> bool {
        is_editor_only(&self.filename)
    }

    /// Half-open test: `mins <= p < maxs` on x and y
    pub fn captures(&self, world_position: Vec3) -> bool {
        let p = world_position.truncate();
        p.cmpge(self.capture_mins).all() && p.cmplt(self.capture_maxs).all()
    }
}

pub fn cell_id(filename: &str) -> CellId {
    hash64(filename)
}

pub fn is_editor_only(filename: &str) -> bool {
    filename.starts_with('[')
}

/// All registered cells, sorted by filename hash, plus editing overrides
#[derive(Default)]
pub struct PlacementCellSet {
    cells: Vec<PlacementCell>,
    overrides: HashMap<CellId, EditorOverlayCellRenderer>,
}

impl PlacementCellSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cell, replacing any cell with the same filename
    pub fn add_cell(&mut self, cell: PlacementCell) -> CellId {
        let id = cell.filename_hash;
        match self.cells.binary_search_by_key(&id, |c| c.filename_hash) {
            Ok(index) => self.cells[index] = cell,
            Err(index) => self.cells.insert(index, cell),
        }
        id
    }

    pub fn add(&mut self, filename: &str, cell_to_world: Affine3A, aabb: Aabb) -> CellId {
        self.add_cell(PlacementCell::new(filename, cell_to_world, aabb))
    }

    /// Remove a cell and any override it had
    pub fn remove(&mut self, id: CellId) -> Option<PlacementCell> {
        self.overrides.remove(&id);
        let index = self.cells.binary_search_by_key(&id, |c| c.filename_hash).ok()?;
        Some(self.cells.remove(index))
    }

    pub fn cell(&self, id: CellId) -> Option<&PlacementCell> {
        self.cells
            .binary_search_by_key(&id, |c| c.filename_hash)
            .ok()
            .map(|index| &self.cells[index])
    }

    pub fn cell_by_name(&self, filename: &str) -> Option<&PlacementCell> {
        self.cell(cell_id(filename))
    }

    pub fn cell_to_world(&self, filename: &str) -> Option<Affine3A> {
        self.cell_by_name(filename).map(|c| c.cell_to_world)
    }

    pub fn cells(&self) -> &[PlacementCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First cell whose capture rectangle contains the point
    pub fn capturing_cell(&self, world_position: Vec3) -> Option<&PlacementCell> {
        self.cells.iter().find(|c| c.captures(world_position))
    }

    pub fn set_override(&mut self, id: CellId, overlay: EditorOverlayCellRenderer) {
        self.overrides.insert(id, overlay);
    }

    pub fn override_for(&self, id: CellId) -> Option<&EditorOverlayCellRenderer> {
        self.overrides.get(&id)
    }

    pub fn override_mut(&mut self, id: CellId) -> Option<&mut EditorOverlayCellRenderer> {
        self.overrides.get_mut(&id)
    }

    pub fn clear_override(&mut self, id: CellId) -> Option<EditorOverlayCellRenderer> {
        self.overrides.remove(&id)
    }

    pub fn override_ids(&self) -> Vec<CellId> {
        let mut ids: Vec<CellId> = self.overrides.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Register every cell of a world config, translated by `world_offset`
pub fn initialize_cell_set(cell_set: &mut PlacementCellSet, config: &WorldPlacementsConfig, world_offset: Vec3) {
    for c in &config.cells {
        let offset = world_offset + Vec3::from_array(c.offset);
        let mins = world_offset + Vec3::from_array(c.mins);
        let maxs = world_offset + Vec3::from_array(c.maxs);
        let cell = PlacementCell::new(c.native_file.as_str(), Affine3A::from_translation(offset), Aabb::new(mins, maxs))
            .with_capture(mins.truncate(), maxs.truncate());
        cell_set.add_cell(cell);
    }
    log::info!("Registered {} placement cells", config.cells.len());
}
