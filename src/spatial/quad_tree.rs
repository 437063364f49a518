//! Quad tree over cell-space bounding boxes
//!
//! Built once per immutable cell. Nodes split on the XY centre of their
//! bounds; each node's box is the exact union of the boxes beneath it, so a
//! culled node culls everything below and a node fully inside a volume
//! accepts everything below without further tests.

use crate::core::types::Affine3A;
use crate::math::{Aabb, ConvexVolume, CullTestResult, Frustum};

/// Views a multi-view mask can hold
pub const MAX_VIEWS: usize = u32::BITS as usize;

/// The views that fit in a mask. Extra views are dropped with a warning.
pub fn clamp_views(frustums: &[Frustum]) -> &[Frustum] {
    if frustums.len() > MAX_VIEWS {
        log::warn!("Culling for {} views, only the first {MAX_VIEWS} are used", frustums.len());
        return &frustums[..MAX_VIEWS];
    }
    frustums
}

/// Counters gathered while culling
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullMetrics {
    pub node_tests: u64,
    pub payload_tests: u64,
    pub node_count: u64,
    pub object_count: u64,
}

impl CullMetrics {
    pub fn accumulate(&mut self, other: &CullMetrics) {
        self.node_tests += other.node_tests;
        self.payload_tests += other.payload_tests;
        self.node_count += other.node_count;
        self.object_count += other.object_count;
    }
}

#[derive(Clone, Debug)]
struct Node {
    bounds: Aabb,
    first_child: u32,
    child_count: u32,
    /// Range into `QuadTree::payload`, covering every object under this node
    payload_start: u32,
    payload_end: u32,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.child_count == 0
    }
}

/// Hierarchy over a slice of boxes. Queries take the same slice again.
#[derive(Clone, Debug)]
pub struct QuadTree {
    nodes: Vec<Node>,
    payload: Vec<u32>,
    object_count: usize,
}

impl QuadTree {
    /// Build over `boxes`; leaves hold at most `leaf_threshold` objects
    /// unless splitting stops making progress.
    pub fn new(boxes: &[Aabb], leaf_threshold: usize) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            payload: Vec::with_capacity(boxes.len()),
            object_count: boxes.len(),
        };
        if !boxes.is_empty() {
            let indices: Vec<u32> = (0..boxes.len() as u32).collect();
            tree.nodes.push(Self::placeholder());
            tree.build_node(0, indices, boxes, leaf_threshold.max(1));
        }
        tree
    }

    fn placeholder() -> Node {
        Node { bounds: Aabb::EMPTY, first_child: 0, child_count: 0, payload_start: 0, payload_end: 0 }
    }

    fn build_node(&mut self, node: usize, indices: Vec<u32>, boxes: &[Aabb], leaf_threshold: usize) {
        let bounds = indices
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| acc.merged(&boxes[i as usize]));
        let payload_start = self.payload.len() as u32;

        let mut quadrants: [Vec<u32>; 4] = Default::default();
        if indices.len() > leaf_threshold {
            let centre = bounds.center();
            for &i in &indices {
                let c = boxes[i as usize].center();
                let q = usize::from(c.x >= centre.x) | (usize::from(c.y >= centre.y) << 1);
                quadrants[q].push(i);
            }
        }
        let splits = quadrants.iter().filter(|q| !q.is_empty()).count();

        if splits < 2 {
            self.payload.extend_from_slice(&indices);
            self.nodes[node] = Node {
                bounds,
                first_child: 0,
                child_count: 0,
                payload_start,
                payload_end: self.payload.len() as u32,
            };
            return;
        }

        let first_child = self.nodes.len();
        self.nodes.extend((0..splits).map(|_| Self::placeholder()));
        let children = quadrants.into_iter().filter(|q| !q.is_empty());
        for (slot, child) in children.enumerate() {
            self.build_node(first_child + slot, child, boxes, leaf_threshold);
        }
        self.nodes[node] = Node {
            bounds,
            first_child: first_child as u32,
            child_count: splits as u32,
            payload_start,
            payload_end: self.payload.len() as u32,
        };
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Bounds of the whole tree
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map(|n| n.bounds).unwrap_or(Aabb::EMPTY)
    }

    /// Generic hierarchical query. `node_test` classifies node bounds,
    /// `payload_test` is only asked about objects under `Boundary` nodes.
    /// Output order is traversal order.
    fn traverse(
        &self,
        node_test: &mut dyn FnMut(&Aabb) -> CullTestResult,
        payload_test: &mut dyn FnMut(u32) -> bool,
        out: &mut Vec<u32>,
        metrics: &mut CullMetrics,
    ) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            metrics.node_tests += 1;
            match node_test(&node.bounds) {
                CullTestResult::Culled => {}
                CullTestResult::Within => {
                    out.extend_from_slice(&self.payload[node.payload_start as usize..node.payload_end as usize]);
                }
                CullTestResult::Boundary if node.is_leaf() => {
                    for &object in &self.payload[node.payload_start as usize..node.payload_end as usize] {
                        metrics.payload_tests += 1;
                        if payload_test(object) {
                            out.push(object);
                        }
                    }
                }
                CullTestResult::Boundary => {
                    let first = node.first_child as usize;
                    stack.extend(first..first + node.child_count as usize);
                }
            }
        }
    }

    /// Objects whose boxes intersect a cell-space frustum, ascending
    pub fn cull_frustum(&self, boxes: &[Aabb], frustum: &Frustum, out: &mut Vec<u32>, metrics: &mut CullMetrics) {
        let start = out.len();
        self.traverse(
            &mut |bounds| frustum.classify_aabb(bounds),
            &mut |i| frustum.intersects_aabb(&boxes[i as usize]),
            out,
            metrics,
        );
        out[start..].sort_unstable();
        metrics.node_count += self.nodes.len() as u64;
        metrics.object_count += self.object_count as u64;
    }

    /// Objects not culled by a convex volume, ascending
    pub fn cull_volume(
        &self,
        boxes: &[Aabb],
        volume: &ConvexVolume,
        cell_to_volume: &Affine3A,
        out: &mut Vec<u32>,
        metrics: &mut CullMetrics,
    ) {
        let start = out.len();
        self.traverse(
            &mut |bounds| volume.test_aabb(cell_to_volume, bounds),
            &mut |i| volume.test_aabb(cell_to_volume, &boxes[i as usize]) != CullTestResult::Culled,
            out,
            metrics,
        );
        out[start..].sort_unstable();
        metrics.node_count += self.nodes.len() as u64;
        metrics.object_count += self.object_count as u64;
    }

    /// Multi-view query: `(object, mask)` where bit `v` of the mask is set
    /// when the object intersects `frustums[v]`. With a volume, objects it
    /// culls are dropped. Sorted by object index.
    pub fn cull_multi_view(
        &self,
        boxes: &[Aabb],
        frustums: &[Frustum],
        volume: Option<(&ConvexVolume, &Affine3A)>,
        out: &mut Vec<(u32, u32)>,
        metrics: &mut CullMetrics,
    ) {
        let frustums = clamp_views(frustums);
        if self.nodes.is_empty() || frustums.is_empty() {
            return;
        }
        let all_views = if frustums.len() == MAX_VIEWS { u32::MAX } else { (1u32 << frustums.len()) - 1 };
        let start = out.len();

        // (node, views still possibly visible, views fully containing the node, volume contains node)
        let mut stack = vec![(0usize, all_views, 0u32, volume.is_none())];
        while let Some((index, mut active, mut inside, mut in_volume)) = stack.pop() {
            let node = &self.nodes[index];
            metrics.node_tests += 1;

            if !in_volume {
                if let Some((volume, cell_to_volume)) = volume {
                    match volume.test_aabb(cell_to_volume, &node.bounds) {
                        CullTestResult::Culled => continue,
                        CullTestResult::Within => in_volume = true,
                        CullTestResult::Boundary => {}
                    }
                }
            }
            for (v, frustum) in frustums.iter().enumerate() {
                let bit = 1u32 << v;
                if active & bit == 0 || inside & bit != 0 {
                    continue;
                }
                match frustum.classify_aabb(&node.bounds) {
                    CullTestResult::Culled => active &= !bit,
                    CullTestResult::Within => inside |= bit,
                    CullTestResult::Boundary => {}
                }
            }
            if active == 0 {
                continue;
            }

            let fully_decided = inside == active && in_volume;
            if fully_decided {
                let payload = &self.payload[node.payload_start as usize..node.payload_end as usize];
                out.extend(payload.iter().map(|&i| (i, inside)));
            } else if node.is_leaf() {
                for &i in &self.payload[node.payload_start as usize..node.payload_end as usize] {
                    metrics.payload_tests += 1;
                    let b = &boxes[i as usize];
                    if let Some((volume, cell_to_volume)) = volume.filter(|_| !in_volume) {
                        if volume.test_aabb(cell_to_volume, b) == CullTestResult::Culled {
                            continue;
                        }
                    }
                    let mut mask = inside;
                    for (v, frustum) in frustums.iter().enumerate() {
                        let bit = 1u32 << v;
                        if active & !inside & bit != 0 && frustum.intersects_aabb(b) {
                            mask |= bit;
                        }
                    }
                    if mask != 0 {
                        out.push((i, mask));
                    }
                }
            } else {
                let first = node.first_child as usize;
                stack.extend((first..first + node.child_count as usize).map(|c| (c, active, inside, in_volume)));
            }
        }
        out[start..].sort_unstable_by_key(|(i, _)| *i);
        metrics.node_count += self.nodes.len() as u64;
        metrics.object_count += self.object_count as u64;
    }
}
