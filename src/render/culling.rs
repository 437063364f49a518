//! CPU-side culling of a cell's objects
//!
//! Every variant returns object indices in ascending order. Cells with a
//! quad tree use it; others fall back to testing every box.

use crate::cell_renderer::CellRenderer;
use crate::core::types::Affine3A;
use crate::math::{Aabb, ConvexVolume, CullTestResult, Frustum};
use crate::spatial::{CullMetrics, clamp_views};

/// Indices of boxes intersecting the frustum, testing every box
pub fn cull_linear(boxes: &[Aabb], frustum: &Frustum, out: &mut Vec<u32>) {
    out.extend((0..boxes.len() as u32).filter(|&i| frustum.intersects_aabb(&boxes[i as usize])));
}

/// Indices of boxes not culled by the volume, testing every box
pub fn cull_linear_volume(boxes: &[Aabb], volume: &ConvexVolume, cell_to_volume: &Affine3A, out: &mut Vec<u32>) {
    out.extend(
        (0..boxes.len() as u32)
            .filter(|&i| volume.test_aabb(cell_to_volume, &boxes[i as usize]) != CullTestResult::Culled),
    );
}

/// `(index, view mask)` pairs, testing every box against every view
pub fn cull_linear_multi_view(
    boxes: &[Aabb],
    frustums: &[Frustum],
    volume: Option<(&ConvexVolume, &Affine3A)>,
    out: &mut Vec<(u32, u32)>,
) {
    let frustums = clamp_views(frustums);
    for (i, b) in boxes.iter().enumerate() {
        if let Some((volume, cell_to_volume)) = volume {
            if volume.test_aabb(cell_to_volume, b) == CullTestResult::Culled {
                continue;
            }
        }
        let mask = frustums
            .iter()
            .enumerate()
            .filter(|(_, f)| f.intersects_aabb(b))
            .fold(0u32, |mask, (v, _)| mask | (1 << v));
        if mask != 0 {
            out.push((i as u32, mask));
        }
    }
}

fn linear_metrics(metrics: &mut CullMetrics, count: usize) {
    metrics.payload_tests += count as u64;
    metrics.object_count += count as u64;
}

/// Objects of a cell visible in a cell-space frustum
pub fn cull_cell(cell: &dyn CellRenderer, frustum: &Frustum, out: &mut Vec<u32>, metrics: &mut CullMetrics) {
    let boxes = cell.cell_space_boundaries();
    match cell.quad_tree() {
        Some(tree) => tree.cull_frustum(boxes, frustum, out, metrics),
        None => {
            cull_linear(boxes, frustum, out);
            linear_metrics(metrics, boxes.len());
        }
    }
}

/// Objects of a cell not culled by a convex volume
pub fn cull_cell_volume(
    cell: &dyn CellRenderer,
    volume: &ConvexVolume,
    cell_to_volume: &Affine3A,
    out: &mut Vec<u32>,
    metrics: &mut CullMetrics,
) {
    let boxes = cell.cell_space_boundaries();
    match cell.quad_tree() {
        Some(tree) => tree.cull_volume(boxes, volume, cell_to_volume, out, metrics),
        None => {
            cull_linear_volume(boxes, volume, cell_to_volume, out);
            linear_metrics(metrics, boxes.len());
        }
    }
}

/// Objects of a cell with their masks of visible views
pub fn cull_cell_multi_view(
    cell: &dyn CellRenderer,
    frustums: &[Frustum],
    volume: Option<(&ConvexVolume, &Affine3A)>,
    out: &mut Vec<(u32, u32)>,
    metrics: &mut CullMetrics,
) {
    let boxes = cell.cell_space_boundaries();
    match cell.quad_tree() {
        Some(tree) => tree.cull_multi_view(boxes, frustums, volume, out, metrics),
        None => {
            cull_linear_multi_view(boxes, frustums, volume, out);
            linear_metrics(metrics, boxes.len() * frustums.len().max(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Mat4, Vec3};
    use crate::math::ClipSpaceType;
    use crate::spatial::QuadTree;
    use proptest::prelude::*;

    fn arb_box() -> impl Strategy<Value = Aabb> {
        (-200.0f32..200.0, -200.0f32..200.0, -50.0f32..50.0, 0.1f32..20.0, 0.1f32..20.0, 0.1f32..20.0)
            .prop_map(|(x, y, z, w, d, h)| Aabb::new(Vec3::new(x, y, z), Vec3::new(x + w, y + d, z + h)))
    }

    fn arb_frustum() -> impl Strategy<Value = Frustum> {
        (-150.0f32..150.0, -150.0f32..150.0, 10.0f32..80.0, -3.2f32..3.2, 0.3f32..1.5)
            .prop_map(|(x, y, height, yaw, fov)| {
                let eye = Vec3::new(x, y, height);
                let target = eye + Vec3::new(yaw.cos() * 50.0, yaw.sin() * 50.0, -height);
                let view = Mat4::look_at_rh(eye, target, Vec3::Z);
                let proj = Mat4::perspective_rh(fov, 1.5, 0.5, 400.0);
                Frustum::from_view_projection(&(proj * view), ClipSpaceType::Positive)
            })
    }

    #[test]
    fn test_views_beyond_mask_width_are_dropped() {
        let projection = Mat4::orthographic_rh(-100.0, 100.0, -100.0, 100.0, 1.0, 400.0);
        let look = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 200.0), Vec3::ZERO, Vec3::Y);
        let frustum = Frustum::from_view_projection(&(projection * look), ClipSpaceType::Positive);
        let frustums = vec![frustum; 40];
        let boxes: Vec<Aabb> = (0..20)
            .map(|i| Aabb::from_center_half_extent(Vec3::new(i as f32 * 5.0 - 50.0, 0.0, 0.0), Vec3::ONE))
            .collect();

        let tree = QuadTree::new(&boxes, 4);
        let mut fast = Vec::new();
        tree.cull_multi_view(&boxes, &frustums, None, &mut fast, &mut CullMetrics::default());
        let mut slow = Vec::new();
        cull_linear_multi_view(&boxes, &frustums, None, &mut slow);

        assert_eq!(fast.len(), boxes.len());
        assert!(fast.iter().all(|&(_, mask)| mask == u32::MAX));
        assert_eq!(fast, slow);
    }

    proptest! {
        #[test]
        fn test_quad_tree_matches_linear(
            boxes in prop::collection::vec(arb_box(), 0..300),
            frustum in arb_frustum(),
            leaf in 1usize..16,
        ) {
            let tree = QuadTree::new(&boxes, leaf);
            let mut fast = Vec::new();
            tree.cull_frustum(&boxes, &frustum, &mut fast, &mut CullMetrics::default());
            let mut slow = Vec::new();
            cull_linear(&boxes, &frustum, &mut slow);
            prop_assert_eq!(fast, slow);
        }

        #[test]
        fn test_multi_view_quad_tree_matches_linear(
            boxes in prop::collection::vec(arb_box(), 0..200),
            a in arb_frustum(),
            b in arb_frustum(),
        ) {
            let tree = QuadTree::new(&boxes, 12);
            let mut fast = Vec::new();
            tree.cull_multi_view(&boxes, &[a, b], None, &mut fast, &mut CullMetrics::default());
            let mut slow = Vec::new();
            cull_linear_multi_view(&boxes, &[a, b], None, &mut slow);
            prop_assert_eq!(fast, slow);
        }

        #[test]
        fn test_volume_quad_tree_matches_linear(
            boxes in prop::collection::vec(arb_box(), 0..200),
            region in arb_box(),
        ) {
            let volume = ConvexVolume::from_aabb(&region.inflated(30.0));
            let tree = QuadTree::new(&boxes, 12);
            let mut fast = Vec::new();
            tree.cull_volume(&boxes, &volume, &Affine3A::IDENTITY, &mut fast, &mut CullMetrics::default());
            let mut slow = Vec::new();
            cull_linear_volume(&boxes, &volume, &Affine3A::IDENTITY, &mut slow);
            prop_assert_eq!(fast, slow);
        }
    }
}
