//! Per-frame culling of placement cells and draw-list construction

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use super::culling::{cull_cell, cull_cell_multi_view, cull_cell_volume};
use crate::cell::{PlacementCell, PlacementCellSet, cell_id};
use crate::cell_renderer::{CellRenderer, ImmutableCellRenderer};
use crate::core::types::{Affine3A, CellId, Mat4, PlacementGuid};
use crate::math::{Aabb, ClipSpaceType, ConvexVolume, CullTestResult, Frustum, cull_aabb};
use crate::scene::{BuildMetrics, CommandListId, DrawablesBuilder, DrawablesPacket, ModelScene};
use crate::spatial::CullMetrics;
use crate::streaming::PlacementsCache;

/// One camera or shadow view
#[derive(Clone, Copy, Debug)]
pub struct ViewDesc {
    pub world_to_projection: Mat4,
    pub clip_space: ClipSpaceType,
}

impl ViewDesc {
    pub fn new(world_to_projection: Mat4) -> Self {
        Self { world_to_projection, clip_space: ClipSpaceType::default() }
    }

    fn frustum(&self, cell_to_world: &Affine3A) -> Frustum {
        Frustum::from_view_projection(&self.cell_to_clip(cell_to_world), self.clip_space)
    }

    fn cell_to_clip(&self, cell_to_world: &Affine3A) -> Mat4 {
        self.world_to_projection * Mat4::from(*cell_to_world)
    }
}

/// Inputs and outputs of one drawables build
pub struct SceneExecuteContext<'p> {
    /// With more than one view, instances carry a mask of the views they are visible in
    pub views: Vec<ViewDesc>,
    /// World-space volume; when set it replaces the frustum test of a single view
    pub complex_volume: Option<ConvexVolume>,
    pub packet: &'p mut dyn DrawablesPacket,
    /// Latest command list that must complete before the packet can be drawn
    pub completion_cmd_list: CommandListId,
    pub cull_metrics: CullMetrics,
    pub build_metrics: BuildMetrics,
}

impl<'p> SceneExecuteContext<'p> {
    pub fn new(view: ViewDesc, packet: &'p mut dyn DrawablesPacket) -> Self {
        Self::multi_view(vec![view], packet)
    }

    pub fn multi_view(views: Vec<ViewDesc>, packet: &'p mut dyn DrawablesPacket) -> Self {
        Self {
            views,
            complex_volume: None,
            packet,
            completion_cmd_list: 0,
            cull_metrics: CullMetrics::default(),
            build_metrics: BuildMetrics::default(),
        }
    }

    pub fn with_complex_volume(mut self, volume: ConvexVolume) -> Self {
        self.complex_volume = Some(volume);
        self
    }
}

/// Cheap world-space rejection of a whole cell
fn cell_may_be_visible(views: &[ViewDesc], volume: Option<&ConvexVolume>, cell: &PlacementCell) -> bool {
    if let Some(volume) = volume {
        if volume.test_world_aabb(&cell.aabb) == CullTestResult::Culled {
            return false;
        }
        if views.len() == 1 {
            return true;
        }
    }
    views
        .iter()
        .any(|v| Frustum::from_view_projection(&v.world_to_projection, v.clip_space).intersects_aabb(&cell.aabb))
}

/// Culls and draws placements through the cache. Borrowed from the manager
/// for the duration of a frame.
pub struct PlacementsRenderer<'a> {
    cache: &'a mut PlacementsCache,
    visible: Vec<u32>,
    visible_masks: Vec<(u32, u32)>,
}

/// Per-run scratch shared by the build loop
struct RunTarget<'b, 'a> {
    builder: &'b mut DrawablesBuilder<'a>,
    scene: &'b dyn ModelScene,
    cell_to_world: Affine3A,
    cell_to_clip: Mat4,
    clip_space: ClipSpaceType,
}

impl<'a> PlacementsRenderer<'a> {
    pub fn new(cache: &'a mut PlacementsCache) -> Self {
        Self { cache, visible: Vec::new(), visible_masks: Vec::new() }
    }

    /// Cull every cell and write instanced draws into the context's packet.
    /// Returns the completion command list.
    pub fn build_drawables(&mut self, ctx: &mut SceneExecuteContext<'_>, cells: &PlacementCellSet) -> CommandListId {
        self.build_internal(ctx, cells, None)
    }

    /// As [`build_drawables`](Self::build_drawables), drawing only objects in `filter`
    pub fn build_drawables_filtered(
        &mut self,
        ctx: &mut SceneExecuteContext<'_>,
        cells: &PlacementCellSet,
        filter: &[PlacementGuid],
    ) -> CommandListId {
        let mut sorted = filter.to_vec();
        sorted.sort_unstable();
        self.build_internal(ctx, cells, Some(&sorted))
    }

    fn build_internal(
        &mut self,
        ctx: &mut SceneExecuteContext<'_>,
        cells: &PlacementCellSet,
        filter: Option<&[PlacementGuid]>,
    ) -> CommandListId {
        if ctx.views.is_empty() {
            return ctx.completion_cmd_list;
        }
        let scene = self.cache.scene().clone();
        let views = &ctx.views;
        let volume = ctx.complex_volume.as_ref();
        let multi_view = views.len() > 1;
        let packet: &mut dyn DrawablesPacket = &mut *ctx.packet;
        let mut builder = DrawablesBuilder::new(scene.as_ref(), packet);
        let mut cull_metrics = CullMetrics::default();

        for cell in cells.cells() {
            let overlay = cells.override_for(cell.filename_hash);
            if overlay.is_none() && (cell.is_editor_only() || !cell_may_be_visible(views, volume, cell)) {
                continue;
            }
            let cached;
            let content: &dyn CellRenderer = match overlay {
                Some(overlay) => overlay,
                None => match self.cache.try_get_cell_renderer(cell.filename_hash, &cell.filename) {
                    Some(loaded) => {
                        cached = loaded;
                        cached.as_ref()
                    }
                    None => continue,
                },
            };

            let cell_filter = filter.map(|f| cell_guids(f, cell.filename_hash));
            let late_culling = content.quad_tree().is_none();
            let view = views[0];
            let mut target = RunTarget {
                builder: &mut builder,
                scene: scene.as_ref(),
                cell_to_world: cell.cell_to_world,
                cell_to_clip: view.cell_to_clip(&cell.cell_to_world),
                clip_space: view.clip_space,
            };

            if multi_view {
                let frustums: Vec<Frustum> = views.iter().map(|v| v.frustum(&cell.cell_to_world)).collect();
                self.visible_masks.clear();
                cull_cell_multi_view(
                    content,
                    &frustums,
                    volume.map(|v| (v, &cell.cell_to_world)),
                    &mut self.visible_masks,
                    &mut cull_metrics,
                );
                self.visible.clear();
                self.visible.extend(self.visible_masks.iter().map(|(i, _)| *i));
                let masks: Vec<u32> = self.visible_masks.iter().map(|(_, m)| *m).collect();
                dispatch_runs::<false>(content, &self.visible, Some(&masks), cell_filter, &mut target);
                continue;
            }

            self.visible.clear();
            match volume {
                Some(volume) => cull_cell_volume(content, volume, &cell.cell_to_world, &mut self.visible, &mut cull_metrics),
                None => cull_cell(content, &view.frustum(&cell.cell_to_world), &mut self.visible, &mut cull_metrics),
            }
            if late_culling && volume.is_none() {
                dispatch_runs::<true>(content, &self.visible, None, cell_filter, &mut target);
            } else {
                dispatch_runs::<false>(content, &self.visible, None, cell_filter, &mut target);
            }
        }

        ctx.completion_cmd_list = ctx.completion_cmd_list.max(builder.completion_cmd_list());
        let built = builder.metrics();
        ctx.build_metrics.instances_prepared += built.instances_prepared;
        ctx.build_metrics.unique_models_prepared += built.unique_models_prepared;
        ctx.cull_metrics.accumulate(&cull_metrics);
        log::debug!(
            "Placements build: {} node tests, {} payload tests, {} instances, {} models",
            cull_metrics.node_tests,
            cull_metrics.payload_tests,
            built.instances_prepared,
            built.unique_models_prepared
        );
        ctx.completion_cmd_list
    }

    /// Future resolving once every cell visible in `views` is loaded and its
    /// renderers are prepared. Starts the loads it needs.
    pub fn prepare_drawables(&mut self, views: &[ViewDesc], cells: &PlacementCellSet) -> BoxFuture<'static, ()> {
        let frustums: Vec<Frustum> = views
            .iter()
            .map(|v| Frustum::from_view_projection(&v.world_to_projection, v.clip_space))
            .collect();
        let pending: Vec<_> = cells
            .cells()
            .iter()
            .filter(|c| !c.is_editor_only() && cells.override_for(c.filename_hash).is_none())
            .filter(|c| frustums.iter().any(|f| f.intersects_aabb(&c.aabb)))
            .map(|c| self.cache.get_cell_renderer_future(c.filename_hash, &c.filename))
            .collect();
        futures::future::join_all(pending).map(|_| ()).boxed()
    }

    /// Loaded cells intersecting the view, with their cell-to-world transforms
    pub fn visible_quad_trees(
        &mut self,
        view: &ViewDesc,
        cells: &PlacementCellSet,
    ) -> Vec<(CellId, Affine3A, Arc<ImmutableCellRenderer>)> {
        let frustum = Frustum::from_view_projection(&view.world_to_projection, view.clip_space);
        cells
            .cells()
            .iter()
            .filter(|c| !c.is_editor_only() && frustum.intersects_aabb(&c.aabb))
            .filter_map(|c| {
                let loaded = self.cache.try_get_cell_renderer(c.filename_hash, &c.filename)?;
                Some((c.filename_hash, c.cell_to_world, loaded))
            })
            .collect()
    }

    /// Loaded content of a cell that carries a quad tree
    pub fn quad_tree(&mut self, cells: &PlacementCellSet, cell_name: &str) -> Option<Arc<ImmutableCellRenderer>> {
        let cell = cells.cell_by_name(cell_name)?;
        if cell.is_editor_only() {
            return None;
        }
        self.cache.try_get_cell_renderer(cell.filename_hash, &cell.filename)
    }

    /// Cell-space bounding boxes of a cell's objects, from its override if it has one
    pub fn object_bounding_boxes(&mut self, cells: &PlacementCellSet, cell_name: &str) -> Option<Vec<Aabb>> {
        let id = cell_id(cell_name);
        if let Some(overlay) = cells.override_for(id) {
            return Some(overlay.cell_space_boundaries().to_vec());
        }
        self.quad_tree(cells, cell_name).map(|c| c.cell_space_boundaries().to_vec())
    }
}

/// Object guids of one cell from a filter sorted by `(cell, guid)`
fn cell_guids(filter: &[PlacementGuid], cell: CellId) -> Vec<u64> {
    let start = filter.partition_point(|g| g.0 < cell);
    let end = filter.partition_point(|g| g.0 <= cell);
    filter[start..end].iter().map(|g| g.1).collect()
}

fn dispatch_runs<const DO_LATE_CULLING: bool>(
    content: &dyn CellRenderer,
    visible: &[u32],
    masks: Option<&[u32]>,
    filter: Option<Vec<u64>>,
    target: &mut RunTarget<'_, '_>,
) {
    match filter {
        Some(filter) => build_runs::<true, DO_LATE_CULLING>(content, visible, masks, &filter, target),
        None => build_runs::<false, DO_LATE_CULLING>(content, visible, masks, &[], target),
    }
}

/// Group the sorted visible list into runs sharing a renderer and submit
/// one instanced draw per run.
///
/// `DO_FILTER` merge-scans the sorted guid allow-list. `DO_LATE_CULLING`
/// re-tests each instance with its model's bounding box, for cells whose
/// stored boxes may be stale.
fn build_runs<const DO_FILTER: bool, const DO_LATE_CULLING: bool>(
    content: &dyn CellRenderer,
    visible: &[u32],
    masks: Option<&[u32]>,
    filter: &[u64],
    target: &mut RunTarget<'_, '_>,
) {
    let objects = content.objects();
    let boundaries = content.cell_space_boundaries();
    let object_renderers = content.object_renderers();
    let mut transforms = Vec::new();
    let mut run_masks = Vec::new();
    let mut filter_cursor = 0usize;

    let mut start = 0usize;
    while start < visible.len() {
        let renderer_index = object_renderers[visible[start] as usize];
        let run_len = visible[start..]
            .iter()
            .take_while(|&&o| object_renderers[o as usize] == renderer_index)
            .count();
        let end = start + run_len;
        let model_renderer = &content.renderers()[renderer_index as usize];

        if !target.builder.is_ready(model_renderer.renderer) {
            start = end;
            continue;
        }

        let model_box = if DO_LATE_CULLING {
            target.scene.model_info(model_renderer.model).ready().map(|info| info.bounding_box)
        } else {
            None
        };

        transforms.clear();
        run_masks.clear();
        for k in start..end {
            let index = visible[k] as usize;
            let object = &objects[index];

            if DO_FILTER {
                while filter_cursor < filter.len() && filter[filter_cursor] < object.guid {
                    filter_cursor += 1;
                }
                if filter.get(filter_cursor) != Some(&object.guid) {
                    continue;
                }
            }

            let local_to_cell = object.local_to_cell();
            if DO_LATE_CULLING {
                let culled = match model_box {
                    Some(local_box) => {
                        let local_to_clip = target.cell_to_clip * Mat4::from(local_to_cell);
                        cull_aabb(&local_to_clip, &local_box, target.clip_space)
                    }
                    None => cull_aabb(&target.cell_to_clip, &boundaries[index], target.clip_space),
                };
                if culled {
                    continue;
                }
            }

            transforms.push(target.cell_to_world * local_to_cell);
            if let Some(masks) = masks {
                run_masks.push(masks[k]);
            }
        }

        target
            .builder
            .add_instances(model_renderer.renderer, &transforms, masks.map(|_| run_masks.as_slice()));
        start = end;
    }
}
