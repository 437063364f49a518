//! Mutable cell content owned by the editor

use super::{CellRenderer, ModelRenderer, PlacedObject, assign_renderers};
use crate::core::types::Affine3A;
use crate::math::Aabb;
use crate::scaffold::{ObjectReference, PlacementsScaffold};
use crate::scene::ModelScene;
use crate::spatial::QuadTree;

/// Editable copy of a cell. Has no quad tree, so it is culled linearly and
/// its instances are re-tested at draw time.
#[derive(Debug, Clone, Default)]
pub struct EditorOverlayCellRenderer {
    scaffold: PlacementsScaffold,
    renderers: Vec<ModelRenderer>,
    object_renderers: Vec<u32>,
}

impl EditorOverlayCellRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the current content of another cell renderer
    pub fn from_cell(cell: &dyn CellRenderer) -> Self {
        Self {
            scaffold: cell.scaffold().clone(),
            renderers: cell.renderers().to_vec(),
            object_renderers: cell.object_renderers().to_vec(),
        }
    }

    /// Start from a scaffold, creating its renderers
    pub fn from_scaffold(scaffold: PlacementsScaffold, scene: &dyn ModelScene) -> Self {
        let (renderers, object_renderers) = assign_renderers(&scaffold, scene);
        Self { scaffold, renderers, object_renderers }
    }

    pub fn has_object(&self, guid: u64) -> bool {
        self.scaffold.has_object(guid)
    }

    pub fn len(&self) -> usize {
        self.scaffold.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scaffold.is_empty()
    }

    fn renderer_index(&mut self, scene: &dyn ModelScene, model: &str, material: &str) -> u32 {
        if let Some(index) = self
            .renderers
            .iter()
            .position(|r| r.model_name == model && r.material_name == material)
        {
            return index as u32;
        }
        self.renderers.push(ModelRenderer::create(scene, model, material));
        (self.renderers.len() - 1) as u32
    }

    fn build_reference(
        &mut self,
        local_to_cell: &Affine3A,
        model: &str,
        material: &str,
        supplements: &[u64],
        guid: u64,
    ) -> ObjectReference {
        let mut object = ObjectReference {
            model_filename_offset: self.scaffold.add_string(model),
            material_filename_offset: self.scaffold.add_string(material),
            supplements_offset: self.scaffold.add_supplements(supplements),
            guid,
            ..Default::default()
        };
        object.set_local_to_cell(local_to_cell);
        object
    }

    /// Add an object in guid order. Returns its index, or None if the guid is taken.
    pub fn add_placement(
        &mut self,
        scene: &dyn ModelScene,
        local_to_cell: &Affine3A,
        cell_space_boundary: Aabb,
        model: &str,
        material: &str,
        supplements: &[u64],
        guid: u64,
    ) -> Option<usize> {
        if self.has_object(guid) {
            return None;
        }
        let object = self.build_reference(local_to_cell, model, material, supplements, guid);
        let renderer = self.renderer_index(scene, model, material);
        let index = self.scaffold.insert_object(object, cell_space_boundary)?;
        self.object_renderers.insert(index, renderer);
        Some(index)
    }

    /// Overwrite the object at `index` keeping its guid
    pub fn update_placement(
        &mut self,
        scene: &dyn ModelScene,
        index: usize,
        local_to_cell: &Affine3A,
        cell_space_boundary: Aabb,
        model: &str,
        material: &str,
        supplements: &[u64],
    ) {
        let guid = self.scaffold.objects()[index].guid;
        let object = self.build_reference(local_to_cell, model, material, supplements, guid);
        let renderer = self.renderer_index(scene, model, material);
        self.scaffold.replace_object(index, object, cell_space_boundary);
        self.object_renderers[index] = renderer;
    }

    pub fn remove_placement(&mut self, index: usize) -> PlacedObject {
        let snapshot = PlacedObject {
            object: self.scaffold.objects()[index],
            boundary: self.scaffold.cell_space_boundaries()[index],
            model: self.scaffold.model_name(&self.scaffold.objects()[index]).to_string(),
            material: self.scaffold.material_name(&self.scaffold.objects()[index]).to_string(),
            supplements: self.scaffold.supplements(&self.scaffold.objects()[index]).to_vec(),
        };
        self.scaffold.remove_object(index);
        self.object_renderers.remove(index);
        snapshot
    }

    /// Put back an exact copy of a previously captured object, replacing
    /// any object that currently has its guid.
    pub fn restore(&mut self, scene: &dyn ModelScene, placed: &PlacedObject) -> usize {
        let mut object = placed.object;
        object.model_filename_offset = self.scaffold.add_string(&placed.model);
        object.material_filename_offset = self.scaffold.add_string(&placed.material);
        object.supplements_offset = self.scaffold.add_supplements(&placed.supplements);
        let renderer = self.renderer_index(scene, &placed.model, &placed.material);
        match self.scaffold.find_object(object.guid) {
            Some(index) => {
                self.scaffold.replace_object(index, object, placed.boundary);
                self.object_renderers[index] = renderer;
                index
            }
            None => {
                let index = self.scaffold.insert_object(object, placed.boundary).unwrap_or_default();
                self.object_renderers.insert(index, renderer);
                index
            }
        }
    }

    pub fn into_scaffold(self) -> PlacementsScaffold {
        self.scaffold
    }
}

impl CellRenderer for EditorOverlayCellRenderer {
    fn scaffold(&self) -> &PlacementsScaffold {
        &self.scaffold
    }

    fn quad_tree(&self) -> Option<&QuadTree> {
        None
    }

    fn renderers(&self) -> &[ModelRenderer] {
        &self.renderers
    }

    fn object_renderers(&self) -> &[u32] {
        &self.object_renderers
    }
}
