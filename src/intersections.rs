//! Picking queries against placed objects
//!
//! Each query rejects whole cells using their bounds grown by the assumed
//! maximum object radius, then tests each object's cell-space box, then an
//! exact test in the object's local space once its model bounds are known.
//! Objects whose model is still loading are skipped, not waited for.

use crate::cell::{PlacementCell, PlacementCellSet};
use crate::cell_renderer::{CellContent, CellRenderer};
use crate::core::hash::hash64;
use crate::core::types::{Affine3A, Mat4, PlacementGuid, Vec3};
use crate::math::transform::to_local_point;
use crate::math::{Aabb, ClipSpaceType, Frustum, RaySegment, cull_aabb};
use crate::scene::{AssetState, ModelScene};
use crate::streaming::PlacementsCache;

/// What a query predicate gets to see about a candidate
#[derive(Clone, Debug)]
pub struct IntersectionDef {
    pub guid: PlacementGuid,
    pub local_to_world: Affine3A,
    pub local_space_bounding_box: Aabb,
    /// Hash of the model filename
    pub model: u64,
    /// Hash of the material filename
    pub material: u64,
}

/// Returns false to exclude a candidate
pub type IntersectionPredicate<'p> = &'p dyn Fn(&IntersectionDef) -> bool;

/// Model bounds of object `index`. None while the model is pending or
/// when it failed to load, which excludes just that object.
fn local_bounding_box(scene: &dyn ModelScene, content: &dyn CellRenderer, index: usize) -> Option<Aabb> {
    let renderer = content.object_renderer(index)?;
    match scene.model_info(renderer.model) {
        AssetState::Ready(info) => Some(info.bounding_box),
        AssetState::Pending => None,
        AssetState::Invalid(reason) => {
            log::warn!("Skipping object with invalid model {}: {reason}", renderer.model_name);
            None
        }
    }
}

fn make_def(cell: &PlacementCell, content: &dyn CellRenderer, index: usize, local_box: Aabb) -> IntersectionDef {
    let object = &content.objects()[index];
    let scaffold = content.scaffold();
    IntersectionDef {
        guid: (cell.filename_hash, object.guid),
        local_to_world: cell.cell_to_world * object.local_to_cell(),
        local_space_bounding_box: local_box,
        model: hash64(scaffold.model_name(object)),
        material: hash64(scaffold.material_name(object)),
    }
}

/// Borrowed from the manager for the duration of a query
pub struct PlacementsIntersections<'a> {
    cache: &'a mut PlacementsCache,
}

impl<'a> PlacementsIntersections<'a> {
    pub fn new(cache: &'a mut PlacementsCache) -> Self {
        Self { cache }
    }

    fn assumed_radius(&self) -> f32 {
        self.cache.config().assumed_max_object_radius
    }

    fn content<'c>(&mut self, cells: &'c PlacementCellSet, cell: &PlacementCell) -> Option<CellContent<'c>> {
        if let Some(overlay) = cells.override_for(cell.filename_hash) {
            return Some(CellContent::Overlay(overlay));
        }
        if cell.is_editor_only() {
            return None;
        }
        self.cache
            .try_get_cell_renderer(cell.filename_hash, &cell.filename)
            .map(CellContent::Loaded)
    }

    /// Run `per_cell` for every cell passing `rough` whose content is ready
    fn for_each_cell(
        &mut self,
        cells: &PlacementCellSet,
        rough: impl Fn(&PlacementCell, &Aabb) -> bool,
        mut per_cell: impl FnMut(&PlacementCell, &dyn CellRenderer, &mut Vec<PlacementGuid>),
    ) -> Vec<PlacementGuid> {
        let radius = self.assumed_radius();
        let mut result = Vec::new();
        for cell in cells.cells() {
            if !rough(cell, &cell.aabb.inflated(radius)) {
                continue;
            }
            let Some(content) = self.content(cells, cell) else {
                continue;
            };
            per_cell(cell, content.get(), &mut result);
        }
        result
    }

    /// Objects hit by the segment from `start` to `end`
    pub fn find_ray_intersections(
        &mut self,
        cells: &PlacementCellSet,
        start: Vec3,
        end: Vec3,
        predicate: Option<IntersectionPredicate<'_>>,
    ) -> Vec<PlacementGuid> {
        let scene = self.cache.scene().clone();
        let world_ray = RaySegment::new(start, end);
        self.for_each_cell(
            cells,
            |_, bounds| world_ray.intersects_aabb(bounds).is_some(),
            |cell, content, result| {
                let cell_ray = world_ray.transform(&cell.cell_to_world.inverse());
                let boundaries = content.cell_space_boundaries();
                for (index, object) in content.objects().iter().enumerate() {
                    if cell_ray.intersects_aabb(&boundaries[index]).is_none() {
                        continue;
                    }
                    let Some(local_box) = local_bounding_box(scene.as_ref(), content, index) else {
                        continue;
                    };
                    let (rotation, scale, translation) = (object.rotation(), object.scale(), object.translation());
                    let local_ray = RaySegment::new(
                        to_local_point(&rotation, scale, translation, cell_ray.start),
                        to_local_point(&rotation, scale, translation, cell_ray.end),
                    );
                    if local_ray.intersects_aabb(&local_box).is_none() {
                        continue;
                    }
                    if let Some(predicate) = predicate {
                        if !predicate(&make_def(cell, content, index, local_box)) {
                            continue;
                        }
                    }
                    result.push((cell.filename_hash, object.guid));
                }
            },
        )
    }

    /// Objects inside the clip volume of `world_to_projection`
    pub fn find_frustum_intersections(
        &mut self,
        cells: &PlacementCellSet,
        world_to_projection: &Mat4,
        clip_space: ClipSpaceType,
        predicate: Option<IntersectionPredicate<'_>>,
    ) -> Vec<PlacementGuid> {
        let scene = self.cache.scene().clone();
        let world_frustum = Frustum::from_view_projection(world_to_projection, clip_space);
        self.for_each_cell(
            cells,
            |_, bounds| world_frustum.intersects_aabb(bounds),
            |cell, content, result| {
                let cell_to_projection = *world_to_projection * Mat4::from(cell.cell_to_world);
                let boundaries = content.cell_space_boundaries();
                for (index, object) in content.objects().iter().enumerate() {
                    if cull_aabb(&cell_to_projection, &boundaries[index], clip_space) {
                        continue;
                    }
                    let Some(local_box) = local_bounding_box(scene.as_ref(), content, index) else {
                        continue;
                    };
                    let local_to_projection = cell_to_projection * Mat4::from(object.local_to_cell());
                    if cull_aabb(&local_to_projection, &local_box, clip_space) {
                        continue;
                    }
                    if let Some(predicate) = predicate {
                        if !predicate(&make_def(cell, content, index, local_box)) {
                            continue;
                        }
                    }
                    result.push((cell.filename_hash, object.guid));
                }
            },
        )
    }

    /// Objects whose cell-space bounds overlap a world-space box. Only the
    /// predicate path needs model bounds.
    pub fn find_box_intersections(
        &mut self,
        cells: &PlacementCellSet,
        world_box: &Aabb,
        predicate: Option<IntersectionPredicate<'_>>,
    ) -> Vec<PlacementGuid> {
        let scene = self.cache.scene().clone();
        self.for_each_cell(
            cells,
            |_, bounds| {
                world_box.max.x >= bounds.min.x
                    && world_box.max.y >= bounds.min.y
                    && world_box.min.x <= bounds.max.x
                    && world_box.min.y <= bounds.max.y
            },
            |cell, content, result| {
                let cell_box = world_box.transformed(&cell.cell_to_world.inverse());
                let boundaries = content.cell_space_boundaries();
                for (index, object) in content.objects().iter().enumerate() {
                    if !cell_box.intersects(&boundaries[index]) {
                        continue;
                    }
                    if let Some(predicate) = predicate {
                        let Some(local_box) = local_bounding_box(scene.as_ref(), content, index) else {
                            continue;
                        };
                        if !predicate(&make_def(cell, content, index, local_box)) {
                            continue;
                        }
                    }
                    result.push((cell.filename_hash, object.guid));
                }
            },
        )
    }
}
