//! In-memory content of a cell, ready for culling and drawing
//!
//! Two implementations share the [`CellRenderer`] interface: the immutable
//! form built by the background loader from a scaffold, and the editor
//! overlay that tooling mutates in place.

pub mod immutable;
pub mod overlay;

use std::collections::HashMap;
use std::sync::Arc;

use crate::math::Aabb;
use crate::scaffold::{ObjectReference, PlacementsScaffold};
use crate::scene::{ModelId, ModelScene, RendererId};
use crate::spatial::QuadTree;

pub use immutable::ImmutableCellRenderer;
pub use overlay::EditorOverlayCellRenderer;

/// Scene handles for one distinct model+material pair in a cell
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRenderer {
    pub model: ModelId,
    pub renderer: RendererId,
    pub model_name: String,
    pub material_name: String,
}

impl ModelRenderer {
    pub fn create(scene: &dyn ModelScene, model_name: &str, material_name: &str) -> Self {
        let model = scene.create_model(model_name);
        Self {
            model,
            renderer: scene.create_renderer(model, material_name),
            model_name: model_name.to_string(),
            material_name: material_name.to_string(),
        }
    }
}

pub trait CellRenderer: Send + Sync {
    fn scaffold(&self) -> &PlacementsScaffold;

    /// Only immutable cells carry a spatial index
    fn quad_tree(&self) -> Option<&QuadTree>;

    fn renderers(&self) -> &[ModelRenderer];

    /// Index into `renderers()` for every object
    fn object_renderers(&self) -> &[u32];

    fn objects(&self) -> &[ObjectReference] {
        self.scaffold().objects()
    }

    fn cell_space_boundaries(&self) -> &[Aabb] {
        self.scaffold().cell_space_boundaries()
    }

    fn find_object(&self, guid: u64) -> Option<usize> {
        self.scaffold().find_object(guid)
    }

    fn object_renderer(&self, index: usize) -> Option<&ModelRenderer> {
        let r = *self.object_renderers().get(index)?;
        self.renderers().get(r as usize)
    }
}

/// Current content of a cell: its editor overlay or its loaded renderer
pub(crate) enum CellContent<'c> {
    Overlay(&'c EditorOverlayCellRenderer),
    Loaded(Arc<ImmutableCellRenderer>),
}

impl CellContent<'_> {
    pub(crate) fn get(&self) -> &dyn CellRenderer {
        match self {
            CellContent::Overlay(overlay) => *overlay,
            CellContent::Loaded(cell) => cell.as_ref(),
        }
    }
}

/// Owned copy of one object together with the strings it references
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub object: ObjectReference,
    pub boundary: Aabb,
    pub model: String,
    pub material: String,
    pub supplements: Vec<u64>,
}

impl PlacedObject {
    pub fn from_cell(cell: &dyn CellRenderer, index: usize) -> Option<Self> {
        let scaffold = cell.scaffold();
        let object = *scaffold.objects().get(index)?;
        Some(Self {
            object,
            boundary: scaffold.cell_space_boundaries()[index],
            model: scaffold.model_name(&object).to_string(),
            material: scaffold.material_name(&object).to_string(),
            supplements: scaffold.supplements(&object).to_vec(),
        })
    }
}

/// One renderer per distinct model+material, numbered by first appearance
pub(crate) fn assign_renderers(scaffold: &PlacementsScaffold, scene: &dyn ModelScene) -> (Vec<ModelRenderer>, Vec<u32>) {
    let mut renderers = Vec::new();
    let mut by_strings: HashMap<(u32, u32), u32> = HashMap::new();
    let object_renderers = scaffold
        .objects()
        .iter()
        .map(|o| {
            *by_strings
                .entry((o.model_filename_offset, o.material_filename_offset))
                .or_insert_with(|| {
                    renderers.push(ModelRenderer::create(scene, scaffold.model_name(o), scaffold.material_name(o)));
                    (renderers.len() - 1) as u32
                })
        })
        .collect();
    (renderers, object_renderers)
}
