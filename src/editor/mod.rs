//! Editing placements in place
//!
//! The editor never mutates a loaded cell. The first edit to a cell copies
//! its current content into an [`EditorOverlayCellRenderer`] that the cell
//! set then uses instead of the on-disk version, for both drawing and
//! queries. `write_all_cells` flushes overlays back to disk.

pub mod transaction;

use std::path::Path;
use std::sync::Arc;

use crate::cell::{PlacementCell, PlacementCellSet};
use crate::cell_renderer::{CellContent, CellRenderer, EditorOverlayCellRenderer};
use crate::core::error::Error;
use crate::core::types::{Affine3A, CellId, PlacementGuid, Result, Vec2};
use crate::math::Aabb;
use crate::scaffold::disk_io::{cell_path, load_scaffold, save_scaffold};
use crate::scaffold::guid::random_guid32;
use crate::scene::{AssetState, ModelScene};
use crate::streaming::{PlacementsCache, poll_for};

pub use transaction::{ObjTransDef, Transaction, TransactionType};

/// Half height of the world box given to cells created by the editor
const CREATED_CELL_HALF_HEIGHT: f32 = 10000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionFlags {
    /// Match guids on their low 32 bits only. Slower, since the sort order
    /// can't be used.
    pub ignore_id_top_32_bits: bool,
}

/// Mutable view over the cell set. Borrowed from the manager.
pub struct PlacementsEditor<'a> {
    cells: &'a mut PlacementCellSet,
    cache: &'a mut PlacementsCache,
}

impl<'a> PlacementsEditor<'a> {
    pub fn new(cells: &'a mut PlacementCellSet, cache: &'a mut PlacementsCache) -> Self {
        Self { cells, cache }
    }

    pub fn cells(&self) -> &PlacementCellSet {
        &*self.cells
    }

    /// Start a transaction over the given objects. Objects that can't be
    /// found are recorded with [`TransactionType::Error`].
    pub fn create_transaction(&mut self, guids: &[PlacementGuid], flags: TransactionFlags) -> Transaction<'_, 'a> {
        Transaction::new(self, guids, flags)
    }

    /// Register an editor-created cell with an identity transform. The
    /// capture rectangle is `mins..maxs`.
    pub fn create_cell(&mut self, filename: &str, mins: Vec2, maxs: Vec2) -> CellId {
        let aabb = Aabb::new(mins.extend(-CREATED_CELL_HALF_HEIGHT), maxs.extend(CREATED_CELL_HALF_HEIGHT));
        let cell = PlacementCell::new(filename, Affine3A::IDENTITY, aabb).with_capture(mins, maxs);
        self.cells.add_cell(cell)
    }

    pub fn remove_cell(&mut self, id: CellId) -> bool {
        self.cache.invalidate(id);
        self.cells.remove(id).is_some()
    }

    /// Random low 32 bits for a new object id
    pub fn generate_object_guid(&self) -> u64 {
        random_guid32() as u64
    }

    /// Fill in the top 32 bits of guids that only carry the low 32 bits,
    /// by matching against the current content of each cell. Leaves the
    /// slice sorted.
    pub fn perform_guid_fixup(&mut self, guids: &mut [PlacementGuid]) {
        guids.sort_unstable();
        for group in guids.chunk_by_mut(|a, b| a.0 == b.0) {
            let Some(content) = self.content(group[0].0) else {
                continue;
            };
            let objects = content.get().objects();
            for guid in group.iter_mut() {
                if let Some(object) = objects.iter().find(|o| o.guid as u32 == guid.1 as u32) {
                    guid.1 = object.guid;
                }
            }
        }
        guids.sort_unstable();
    }

    /// Union of the cell-space bounds of every object in the cell.
    /// `Aabb::EMPTY` when the cell has no content.
    pub fn calculate_cell_boundary(&mut self, id: CellId) -> Aabb {
        match self.content(id) {
            Some(content) => content
                .get()
                .cell_space_boundaries()
                .iter()
                .fold(Aabb::EMPTY, |acc, b| acc.merged(b)),
            None => Aabb::EMPTY,
        }
    }

    /// Object counts per model/material configuration, then the cell boundary
    pub fn metrics_string(&mut self, id: CellId) -> String {
        let mut result = String::from("[Model Name] [Material Name] Count\n");
        {
            let Some(content) = self.content(id) else {
                return "Placements not found".to_string();
            };
            let scaffold = content.get().scaffold();
            let objects = scaffold.objects();
            let mut start = 0;
            while start < objects.len() {
                let first = &objects[start];
                let end = objects[start..]
                    .iter()
                    .position(|o| {
                        o.model_filename_offset != first.model_filename_offset
                            || o.material_filename_offset != first.material_filename_offset
                            || o.supplements_offset != first.supplements_offset
                    })
                    .map_or(objects.len(), |n| start + n);
                result.push_str(&format!(
                    "[{}] [{}] {}\n",
                    scaffold.model_name(first),
                    scaffold.material_name(first),
                    end - start
                ));
                start = end;
            }
        }

        let boundary = self.calculate_cell_boundary(id);
        result.push_str(&format!(
            "\nCell Mins: ({}, {}, {})\nCell Maxs: ({}, {}, {})\n",
            boundary.min.x, boundary.min.y, boundary.min.z, boundary.max.x, boundary.max.y, boundary.max.z
        ));
        result
    }

    /// Save every edited cell to its placements file, then drop the overlay
    /// so the cell is reloaded from disk. Editor-only cells have no file
    /// and keep their overlay.
    pub fn write_all_cells(&mut self) -> Result<()> {
        for id in self.cells.override_ids() {
            let Some(cell) = self.cells.cell(id) else {
                self.cells.clear_override(id);
                continue;
            };
            if cell.is_editor_only() {
                log::debug!("Not writing editor-only cell {}", cell.filename);
                continue;
            }
            let path = cell_path(&self.cache.config().data_root, &cell.filename);
            if let Some(overlay) = self.cells.override_for(id) {
                self.cache.stall(save_scaffold(&path, overlay.scaffold()))??;
            }
            self.cells.clear_override(id);
            self.cache.invalidate(id);
        }
        Ok(())
    }

    /// Save one edited cell to an arbitrary file
    pub fn write_cell(&self, id: CellId, destination: &Path) -> Result<()> {
        let overlay = self.cells.override_for(id).ok_or(Error::UnknownCell(id))?;
        self.cache.stall(save_scaffold(destination, overlay.scaffold()))?
    }

    /// Model bounds if the model has finished loading. Never blocks.
    pub fn model_bounding_box(&self, model: &str) -> Option<Aabb> {
        let scene = self.cache.scene();
        scene.model_info(scene.create_model(model)).ready().map(|info| info.bounding_box)
    }

    /// Model bounds, waiting for the model to load. None if it is invalid
    /// or doesn't load within the stall timeout.
    pub(crate) fn model_bounding_box_stall(&self, model: &str) -> Option<Aabb> {
        let scene = self.cache.scene().clone();
        let id = scene.create_model(model);
        let check = || match scene.model_info(id) {
            AssetState::Pending => None,
            AssetState::Ready(info) => Some(Some(info.bounding_box)),
            AssetState::Invalid(reason) => {
                log::warn!("Invalid model {model}: {reason}");
                Some(None)
            }
        };
        match self.cache.stall(poll_for(check, self.cache.config().poll_interval())) {
            Ok(bounding_box) => bounding_box,
            Err(e) => {
                log::warn!("Gave up waiting for model {model}: {e}");
                None
            }
        }
    }

    /// The overlay for a cell, creating it from the cell's current content
    /// on first use. None if the cell isn't registered or its placements
    /// couldn't be read within the stall timeout.
    pub(crate) fn overlay(&mut self, id: CellId) -> Option<&mut EditorOverlayCellRenderer> {
        if self.cells.override_for(id).is_none() {
            let overlay = self.read_for_edit(id)?;
            self.cells.set_override(id, overlay);
        }
        self.cells.override_mut(id)
    }

    /// Copy of a cell's placements to start editing from. Uses the loaded
    /// cell when it is resident, otherwise reads the file directly so that
    /// pending model renderers don't hold up the edit. Only a failed read
    /// starts from empty; a read that stalls refuses the edit.
    fn read_for_edit(&mut self, id: CellId) -> Option<EditorOverlayCellRenderer> {
        let cell = self.cells.cell(id)?;
        if cell.is_editor_only() {
            return Some(EditorOverlayCellRenderer::new());
        }
        if let Some(loaded) = self.cache.try_get_cell_renderer(id, &cell.filename) {
            return Some(EditorOverlayCellRenderer::from_cell(loaded.as_ref()));
        }

        let path = cell_path(&self.cache.config().data_root, &cell.filename);
        match self.cache.stall(load_scaffold(&path)) {
            Ok(Ok(scaffold)) => Some(EditorOverlayCellRenderer::from_scaffold(
                scaffold,
                self.cache.scene().as_ref(),
            )),
            Ok(Err(e)) => {
                log::warn!("Editing {} from empty: {e}", cell.filename);
                Some(EditorOverlayCellRenderer::new())
            }
            Err(e) => {
                log::warn!("Not editing {}: {e}", cell.filename);
                None
            }
        }
    }

    /// The overlay for a cell only if one has already been created
    pub(crate) fn existing_overlay(&mut self, id: CellId) -> Option<&mut EditorOverlayCellRenderer> {
        self.cells.override_mut(id)
    }

    /// Current content of a cell, waiting for it to load if needed. A cell
    /// whose renderers are still preparing is read into an overlay instead.
    pub(crate) fn content(&mut self, id: CellId) -> Option<CellContent<'_>> {
        if self.cells.override_for(id).is_none() {
            let cell = self.cells.cell(id)?;
            if cell.is_editor_only() {
                return None;
            }
            match self.cache.stall_for_cell(id, &cell.filename) {
                Ok(loaded) => return Some(CellContent::Loaded(loaded)),
                Err(Error::Timeout(timeout)) => {
                    log::debug!("Cell {} not ready after {timeout:?}, reading it for editing", cell.filename);
                    self.overlay(id)?;
                }
                Err(e) => {
                    log::debug!("No content for cell {}: {e}", cell.filename);
                    return None;
                }
            }
        }
        self.cells.override_for(id).map(CellContent::Overlay)
    }

    pub(crate) fn cell_to_world(&self, id: CellId) -> Option<Affine3A> {
        self.cells.cell(id).map(|c| c.cell_to_world)
    }

    pub(crate) fn scene(&self) -> Arc<dyn ModelScene> {
        self.cache.scene().clone()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;

    use crate::cell::PlacementCellSet;
    use crate::config::PlacementsConfig;
    use crate::core::types::{Affine3A, CellId, Vec3};
    use crate::math::Aabb;
    use crate::scaffold::{NascentPlacement, PlacementsScaffold, serialize_placements};
    use crate::scene::mock::MockScene;
    use crate::streaming::PlacementsCache;

    pub fn make_cache(dir: &Path) -> (PlacementsCache, Arc<MockScene>) {
        make_cache_with_timeout(dir, 2000)
    }

    pub fn make_cache_with_timeout(dir: &Path, stall_timeout_ms: u64) -> (PlacementsCache, Arc<MockScene>) {
        let scene = Arc::new(MockScene::new());
        let config = PlacementsConfig {
            stall_timeout_ms,
            ..PlacementsConfig::with_data_root(dir)
        };
        (PlacementsCache::new(config, scene.clone()).unwrap(), scene)
    }

    pub fn read_cell(dir: &Path, filename: &str) -> PlacementsScaffold {
        PlacementsScaffold::from_bytes(&std::fs::read(dir.join(filename)).unwrap()).unwrap()
    }

    /// A cell at the origin covering 0..100 on x and y, holding `count`
    /// trees spaced 10 apart along x
    pub fn write_cell(dir: &Path, cells: &mut PlacementCellSet, filename: &str, count: usize) -> CellId {
        let placements: Vec<_> = (0..count)
            .map(|i| {
                let p = Vec3::new(5.0 + 10.0 * i as f32, 5.0, 0.0);
                NascentPlacement {
                    model: "tree.mdl".to_string(),
                    material: "bark.mat".to_string(),
                    supplements: Vec::new(),
                    local_to_cell: Affine3A::from_translation(p),
                    cell_space_boundary: Aabb::from_center_half_extent(p, Vec3::ONE),
                    guid: None,
                }
            })
            .collect();
        std::fs::write(dir.join(filename), serialize_placements(&placements)).unwrap();
        cells.add(
            filename,
            Affine3A::IDENTITY,
            Aabb::new(Vec3::new(0.0, 0.0, -10.0), Vec3::new(100.0, 100.0, 10.0)),
        )
    }
}
