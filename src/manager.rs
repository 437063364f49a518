//! Top-level owner of the placements system

use std::path::Path;
use std::sync::Arc;

use crate::cell::{PlacementCellSet, initialize_cell_set};
use crate::config::{PlacementsConfig, WorldPlacementsConfig};
use crate::core::types::{Result, Vec3};
use crate::editor::PlacementsEditor;
use crate::intersections::PlacementsIntersections;
use crate::render::PlacementsRenderer;
use crate::scene::ModelScene;
use crate::streaming::PlacementsCache;

/// Owns the cell cache and its background runtime.
///
/// Renderer, intersection and editor access are short-lived borrows, so
/// only one of them can be active at a time. Cell sets are owned by the
/// caller and passed in.
pub struct PlacementsManager {
    cache: PlacementsCache,
}

impl PlacementsManager {
    pub fn new(config: PlacementsConfig, scene: Arc<dyn ModelScene>) -> Result<Self> {
        log::info!(
            "Placements manager: data root {}, cache capacity {}",
            config.data_root.display(),
            config.cache_capacity
        );
        Ok(Self { cache: PlacementsCache::new(config, scene)? })
    }

    /// Build a cell set from a world placements file
    pub fn load_world(&self, path: &Path, world_offset: Vec3) -> Result<PlacementCellSet> {
        let world = WorldPlacementsConfig::load(path)?;
        let mut cells = PlacementCellSet::new();
        initialize_cell_set(&mut cells, &world, world_offset);
        Ok(cells)
    }

    pub fn renderer(&mut self) -> PlacementsRenderer<'_> {
        PlacementsRenderer::new(&mut self.cache)
    }

    pub fn intersections(&mut self) -> PlacementsIntersections<'_> {
        PlacementsIntersections::new(&mut self.cache)
    }

    pub fn editor<'a>(&'a mut self, cells: &'a mut PlacementCellSet) -> PlacementsEditor<'a> {
        PlacementsEditor::new(cells, &mut self.cache)
    }

    pub fn cache(&mut self) -> &mut PlacementsCache {
        &mut self.cache
    }

    pub fn config(&self) -> &PlacementsConfig {
        self.cache.config()
    }
}
