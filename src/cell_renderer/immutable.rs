//! Cell content loaded from disk

use super::{CellRenderer, ModelRenderer, assign_renderers};
use crate::scaffold::PlacementsScaffold;
use crate::scene::ModelScene;
use crate::spatial::QuadTree;

/// Published once by the loader and never mutated afterwards
#[derive(Debug)]
pub struct ImmutableCellRenderer {
    scaffold: PlacementsScaffold,
    quad_tree: QuadTree,
    renderers: Vec<ModelRenderer>,
    object_renderers: Vec<u32>,
}

impl ImmutableCellRenderer {
    pub fn new(scaffold: PlacementsScaffold, scene: &dyn ModelScene, leaf_threshold: usize) -> Self {
        let quad_tree = QuadTree::new(scaffold.cell_space_boundaries(), leaf_threshold);
        let (renderers, object_renderers) = assign_renderers(&scaffold, scene);
        log::debug!(
            "Cell renderer: {} objects, {} renderers, {} quad tree nodes",
            scaffold.len(),
            renderers.len(),
            quad_tree.node_count()
        );
        Self { scaffold, quad_tree, renderers, object_renderers }
    }
}

impl CellRenderer for ImmutableCellRenderer {
    fn scaffold(&self) -> &PlacementsScaffold {
        &self.scaffold
    }

    fn quad_tree(&self) -> Option<&QuadTree> {
        Some(&self.quad_tree)
    }

    fn renderers(&self) -> &[ModelRenderer] {
        &self.renderers
    }

    fn object_renderers(&self) -> &[u32] {
        &self.object_renderers
    }
}
