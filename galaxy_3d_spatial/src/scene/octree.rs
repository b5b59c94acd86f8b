/// Octree: the primary spatial hierarchy of the scene.
///
/// Nodes live in a flat arena addressed by `NodeId` (root = 0). Children are
/// created on demand by `insert`, eight at a time, with a fixed octant layout:
/// bit 0 of the child index selects the upper half on X, bit 1 on Y, bit 2 on Z.
///
/// Every primitive is held twice:
/// - in `components` of exactly one node, the one reached by following the
///   child that contains the primitive's AABB center (down to the insert depth);
/// - in `overlapping` of every node whose bounds intersect its AABB, used by
///   raycasts and KD tree construction.
///
/// The octree stores keys only. Geometry is read from a `RenderableSource`.

use rustc_hash::FxHashMap;
use glam::Vec3;
use crate::config::OctreeConfig;
use crate::graphics_device::GraphicsDevice;
use crate::math::{AABB, Frustum, FrustumContainment};
use crate::primitive::{PrimitiveKey, RenderableSource};
use super::batch_compiler::{BatchNodeData, BatchRootData};
use super::kd_tree::KdTree;
use super::occlusion::RegionId;

/// Index of a node in the octree arena
pub type NodeId = usize;

/// Index of the root node
pub const ROOT: NodeId = 0;

/// Half-size given to fitted bounds around a single point
const MIN_FITTED_HALF_SIZE: f32 = 1.0;

// ============================================================================
// OCTREE NODE
// ============================================================================

pub struct OctreeNode {
    pub(crate) bounds: AABB,
    pub(crate) depth: u32,
    pub(crate) parent: Option<NodeId>,
    /// Octant index within the parent (0 for the root)
    pub(crate) octant: u8,
    pub(crate) children: Option<[NodeId; 8]>,
    pub(crate) components: Vec<PrimitiveKey>,
    pub(crate) overlapping: Vec<PrimitiveKey>,
    pub(crate) kd_tree: Option<KdTree>,
    pub(crate) batch: BatchNodeData,
}

impl OctreeNode {
    fn new(bounds: AABB, depth: u32, parent: Option<NodeId>, octant: u8) -> Self {
        Self {
            bounds,
            depth,
            parent,
            octant,
            children: None,
            components: Vec::new(),
            overlapping: Vec::new(),
            kd_tree: None,
            batch: BatchNodeData::default(),
        }
    }

    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn octant(&self) -> u8 {
        self.octant
    }

    pub fn children(&self) -> Option<&[NodeId; 8]> {
        self.children.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Primitives owned by this node
    pub fn components(&self) -> &[PrimitiveKey] {
        &self.components
    }

    /// Primitives whose AABB intersects this node's bounds
    pub fn overlapping_components(&self) -> &[PrimitiveKey] {
        &self.overlapping
    }

    pub fn kd_tree(&self) -> Option<&KdTree> {
        self.kd_tree.as_ref()
    }

    /// Draw ranges of this node's subtree
    pub fn batch(&self) -> &BatchNodeData {
        &self.batch
    }

    /// Occlusion region id derived from the node bounds
    pub fn region_id(&self) -> RegionId {
        RegionId::from_bounds(&self.bounds)
    }
}

// ============================================================================
// OCTREE
// ============================================================================

pub struct Octree {
    pub(crate) nodes: Vec<OctreeNode>,
    pub(crate) config: OctreeConfig,
    /// Primitive key → (owning node, world AABB at insertion)
    pub(crate) object_locations: FxHashMap<PrimitiveKey, (NodeId, AABB)>,
    /// Shared per-material, per-LOD geometry and GPU buffers
    pub(crate) batch_root: BatchRootData,
}

impl Octree {
    /// Create an empty octree covering `bounds`
    ///
    /// The configuration is sanitized (see `OctreeConfig::sanitized`).
    pub fn new(bounds: AABB, config: OctreeConfig) -> Self {
        Self {
            nodes: vec![OctreeNode::new(bounds, 0, None, 0)],
            config: config.sanitized(),
            object_locations: FxHashMap::default(),
            batch_root: BatchRootData::default(),
        }
    }

    pub fn bounds(&self) -> AABB {
        self.nodes[ROOT].bounds
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    pub fn node(&self, id: NodeId) -> Option<&OctreeNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    pub fn root(&self) -> &OctreeNode {
        &self.nodes[ROOT]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.object_locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_locations.is_empty()
    }

    /// Node owning `key` in its `components`
    pub fn location(&self, key: PrimitiveKey) -> Option<NodeId> {
        self.object_locations.get(&key).map(|&(node, _)| node)
    }

    /// Drop every node, primitive, KD tree and batch, keeping the configuration
    pub fn reset(&mut self, bounds: AABB) {
        self.nodes.clear();
        self.nodes.push(OctreeNode::new(bounds, 0, None, 0));
        self.object_locations.clear();
        self.batch_root = BatchRootData::default();
    }

    /// Reset the tree to the cubic hull of all primitive world AABBs
    ///
    /// Returns the new bounds. An empty source leaves the bounds unchanged.
    pub fn fit_bounds(&mut self, source: &mut dyn RenderableSource) -> AABB {
        let mut hull = AABB::EMPTY;
        for key in source.renderable_keys() {
            source.refresh_world_bounds(key);
            if let Some(renderable) = source.renderable(key) {
                hull = hull.union(&renderable.world_aabb());
            }
        }

        let bounds = if hull.is_empty() {
            self.bounds()
        } else {
            let cube = hull.to_cube();
            if cube.extents().max_element() > 0.0 {
                cube
            } else {
                AABB::from_center_extents(cube.center(), Vec3::splat(MIN_FITTED_HALF_SIZE))
            }
        };
        self.reset(bounds);
        bounds
    }

    /// Rebuild the tree from every primitive of `source`
    ///
    /// Each primitive's world AABB is refreshed, then the primitive is inserted
    /// down to `max_insert_depth` and registered in every overlapping node.
    pub fn build(&mut self, source: &mut dyn RenderableSource) {
        self.reset(self.bounds());
        let max_depth = self.config.max_insert_depth;

        for key in source.renderable_keys() {
            source.refresh_world_bounds(key);
            let Some(world_aabb) = source.renderable(key).map(|r| r.world_aabb()) else {
                continue;
            };
            self.insert(key, &world_aabb, max_depth);
            self.insert_overlapping(key, &world_aabb);
        }

        crate::engine_info!("galaxy3d::Octree",
            "Built octree: {} nodes, {} primitives", self.nodes.len(), self.object_locations.len());
    }

    /// Full rebuild: tree, KD trees, batches, draw ranges and GPU buffers
    ///
    /// Bounds are refitted to the primitives first. CPU geometry is released
    /// for every batch whose buffers were created.
    pub fn build_full(&mut self, source: &mut dyn RenderableSource, device: &mut dyn GraphicsDevice) {
        self.fit_bounds(source);
        self.build(source);
        self.build_kd_trees();
        self.build_batch_render_data(source);
        self.assign_all_draw_ranges();
        self.build_batch_buffers(device);
        self.clear_batch_datas();
    }

    // ===== INSERTION =====

    /// Insert `key` into the node chosen by center containment
    ///
    /// Splits leaves on the way down until `max_depth`. A primitive whose
    /// center lies in no child (outside the root) stays on the current node.
    /// Returns the node now owning the primitive.
    pub fn insert(&mut self, key: PrimitiveKey, world_aabb: &AABB, max_depth: u32) -> NodeId {
        if self.object_locations.contains_key(&key) {
            self.remove(key);
        }

        let center = world_aabb.center();
        if !self.nodes[ROOT].bounds.contains_point(center) {
            crate::engine_warn!("galaxy3d::Octree",
                "Primitive center {:?} outside octree bounds, kept at root", center);
        }

        let node = self.insert_at(ROOT, key, center, max_depth);
        self.object_locations.insert(key, (node, *world_aabb));
        node
    }

    fn insert_at(&mut self, start: NodeId, key: PrimitiveKey, center: Vec3, max_depth: u32) -> NodeId {
        let mut node_id = start;
        loop {
            if self.nodes[node_id].depth >= max_depth {
                self.nodes[node_id].components.push(key);
                return node_id;
            }

            let children = match self.nodes[node_id].children {
                Some(children) => children,
                None => self.split(node_id, max_depth),
            };

            let target = children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].bounds.contains_point(center));

            match target {
                Some(child) => node_id = child,
                None => {
                    self.nodes[node_id].components.push(key);
                    return node_id;
                }
            }
        }
    }

    /// Create the eight children of a leaf
    ///
    /// Children inherit the parent's overlapping primitives that intersect
    /// them, and components held by the leaf are re-inserted below it.
    fn split(&mut self, node_id: NodeId, max_depth: u32) -> [NodeId; 8] {
        let bounds = self.nodes[node_id].bounds;
        let depth = self.nodes[node_id].depth;
        let first = self.nodes.len();
        let children: [NodeId; 8] = std::array::from_fn(|i| first + i);

        for octant in 0..8 {
            let child_bounds = bounds.octant(octant);
            let mut child = OctreeNode::new(child_bounds, depth + 1, Some(node_id), octant as u8);
            child.overlapping = self.nodes[node_id]
                .overlapping
                .iter()
                .copied()
                .filter(|key| {
                    self.object_locations
                        .get(key)
                        .is_some_and(|(_, aabb)| aabb.intersects(&child_bounds))
                })
                .collect();
            self.nodes.push(child);
        }
        self.nodes[node_id].children = Some(children);

        let held = std::mem::take(&mut self.nodes[node_id].components);
        for key in held {
            if let Some(&(_, aabb)) = self.object_locations.get(&key) {
                let owner = self.insert_at(node_id, key, aabb.center(), max_depth);
                self.object_locations.insert(key, (owner, aabb));
            }
        }

        children
    }

    /// Register `key` in every node whose bounds intersect `world_aabb`
    ///
    /// Call after `insert` so later splits propagate the registration.
    pub fn insert_overlapping(&mut self, key: PrimitiveKey, world_aabb: &AABB) {
        let mut stack = vec![ROOT];
        while let Some(node_id) = stack.pop() {
            let node = &mut self.nodes[node_id];
            if !node.bounds.intersects(world_aabb) {
                continue;
            }
            node.overlapping.push(key);
            if let Some(children) = node.children {
                stack.extend_from_slice(&children);
            }
        }
    }

    /// Remove `key` from its owning node and every overlapping list
    ///
    /// KD trees and batches are not updated; rebuild them afterwards.
    pub fn remove(&mut self, key: PrimitiveKey) -> bool {
        let Some((node_id, _)) = self.object_locations.remove(&key) else {
            return false;
        };
        let components = &mut self.nodes[node_id].components;
        if let Some(pos) = components.iter().position(|&k| k == key) {
            components.remove(pos);
        }
        for node in &mut self.nodes {
            node.overlapping.retain(|&k| k != key);
        }
        true
    }

    // ===== QUERIES =====

    /// Primitives whose world AABB intersects the frustum
    ///
    /// `Contains` collects whole subtrees without further tests.
    pub fn query_frustum(&self, frustum: &Frustum) -> Vec<PrimitiveKey> {
        let mut results = Vec::new();
        self.query_frustum_node(ROOT, frustum, &mut results);
        results
    }

    fn query_frustum_node(&self, node_id: NodeId, frustum: &Frustum, results: &mut Vec<PrimitiveKey>) {
        let node = &self.nodes[node_id];
        match frustum.check_containment(&node.bounds) {
            FrustumContainment::Outside => {
                // Out-of-bounds primitives retained at the root still get tested
                if node_id == ROOT {
                    self.collect_intersecting(&node.components, |aabb| frustum.intersect(aabb), results);
                }
            }
            FrustumContainment::Contains => self.collect_subtree(node_id, results),
            FrustumContainment::Intersects => {
                self.collect_intersecting(&node.components, |aabb| frustum.intersect(aabb), results);
                if let Some(children) = node.children {
                    for child in children {
                        self.query_frustum_node(child, frustum, results);
                    }
                }
            }
        }
    }

    /// Primitives whose world AABB intersects `aabb`
    pub fn query_overlapping(&self, aabb: &AABB) -> Vec<PrimitiveKey> {
        let mut results = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            // Root components may lie outside the root bounds
            if node_id == ROOT || node.bounds.intersects(aabb) {
                self.collect_intersecting(&node.components, |other| other.intersects(aabb), &mut results);
            }
            if node.bounds.intersects(aabb) {
                if let Some(children) = node.children {
                    stack.extend_from_slice(&children);
                }
            }
        }
        results
    }

    fn collect_intersecting<F: Fn(&AABB) -> bool>(
        &self,
        keys: &[PrimitiveKey],
        test: F,
        results: &mut Vec<PrimitiveKey>,
    ) {
        for &key in keys {
            if let Some((_, world_aabb)) = self.object_locations.get(&key) {
                if test(world_aabb) {
                    results.push(key);
                }
            }
        }
    }

    fn collect_subtree(&self, node_id: NodeId, results: &mut Vec<PrimitiveKey>) {
        let node = &self.nodes[node_id];
        results.extend_from_slice(&node.components);
        if let Some(children) = node.children {
            for child in children {
                self.collect_subtree(child, results);
            }
        }
    }

    /// Bounds of every node up to `max_depth`, for debug drawing
    pub fn debug_bounds(&self, max_depth: u32) -> Vec<AABB> {
        self.nodes
            .iter()
            .filter(|node| node.depth <= max_depth)
            .map(|node| node.bounds)
            .collect()
    }

    // ===== KD TREES =====

    /// Build one KD tree per node at the KD cutoff depth
    ///
    /// Leaves shallower than the cutoff get one too. Each tree indexes the
    /// node's overlapping primitives.
    pub fn build_kd_trees(&mut self) {
        let cutoff = self.config.kd_cutoff_depth;
        let mut built = 0usize;

        for node_id in 0..self.nodes.len() {
            let node = &self.nodes[node_id];
            let is_kd_root = node.depth == cutoff || (node.depth < cutoff && node.is_leaf());
            if !is_kd_root {
                self.nodes[node_id].kd_tree = None;
                continue;
            }
            let items: Vec<(PrimitiveKey, AABB)> = node
                .overlapping
                .iter()
                .filter_map(|key| self.object_locations.get(key).map(|&(_, aabb)| (*key, aabb)))
                .collect();
            let tree = KdTree::build(&items);
            if !tree.is_empty() {
                built += 1;
            }
            self.nodes[node_id].kd_tree = Some(tree);
        }

        crate::engine_debug!("galaxy3d::Octree", "Built {} non-empty KD trees at depth {}", built, cutoff);
    }

    /// Drop every KD tree
    pub fn clear_kd_trees(&mut self) {
        for node in &mut self.nodes {
            node.kd_tree = None;
        }
    }
}

#[cfg(test)]
#[path = "octree_tests.rs"]
mod tests;
