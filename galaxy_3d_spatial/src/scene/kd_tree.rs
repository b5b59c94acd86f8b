/// KD tree over primitives for precise nearest-hit picking.
///
/// Median split on the centers of the primitive AABBs, cycling the split
/// axis X, Y, Z with depth. Every leaf holds exactly one primitive and every
/// internal node's bounds is the union of its children's. Leaves run the
/// primitive's precise ray test.

use crate::math::{AABB, Ray};
use crate::primitive::{PrimitiveFlags, PrimitiveKey, RenderableSource};

/// Closest primitive hit along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub key: PrimitiveKey,
    /// Distance from the ray origin
    pub distance: f32,
}

impl RaycastHit {
    /// Keep the closer of two optional hits
    pub fn closest(a: Option<RaycastHit>, b: Option<RaycastHit>) -> Option<RaycastHit> {
        match (a, b) {
            (Some(a), Some(b)) => Some(if b.distance < a.distance { b } else { a }),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

struct KdNode {
    bounds: AABB,
    /// Set on leaves only
    primitive: Option<PrimitiveKey>,
    split_axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Default)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

impl KdTree {
    /// Build from `(key, world AABB)` pairs
    pub fn build(items: &[(PrimitiveKey, AABB)]) -> Self {
        let mut tree = KdTree { nodes: Vec::with_capacity(items.len() * 2), root: None };
        if !items.is_empty() {
            let mut items = items.to_vec();
            tree.root = Some(tree.build_recursive(&mut items, 0));
        }
        tree
    }

    fn build_recursive(&mut self, items: &mut [(PrimitiveKey, AABB)], depth: usize) -> usize {
        let split_axis = depth % 3;

        if items.len() == 1 {
            let (key, bounds) = items[0];
            self.nodes.push(KdNode {
                bounds,
                primitive: Some(key),
                split_axis,
                left: None,
                right: None,
            });
            return self.nodes.len() - 1;
        }

        items.sort_by(|a, b| a.1.center()[split_axis].total_cmp(&b.1.center()[split_axis]));
        let mid = items.len() / 2;
        let (lower, upper) = items.split_at_mut(mid);
        let left = self.build_recursive(lower, depth + 1);
        let right = self.build_recursive(upper, depth + 1);

        self.nodes.push(KdNode {
            bounds: self.nodes[left].bounds.union(&self.nodes[right].bounds),
            primitive: None,
            split_axis,
            left: Some(left),
            right: Some(right),
        });
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of primitives (leaves)
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.primitive.is_some()).count()
    }

    pub fn bounds(&self) -> Option<AABB> {
        self.root.map(|root| self.nodes[root].bounds)
    }

    /// Number of levels (0 when empty)
    pub fn depth(&self) -> usize {
        fn walk(tree: &KdTree, node: Option<usize>) -> usize {
            match node {
                None => 0,
                Some(id) => {
                    let n = &tree.nodes[id];
                    1 + walk(tree, n.left).max(walk(tree, n.right))
                }
            }
        }
        walk(self, self.root)
    }

    /// Split axis of the root node
    pub fn root_split_axis(&self) -> Option<usize> {
        self.root.map(|root| self.nodes[root].split_axis)
    }

    /// Nearest pickable hit
    pub fn raycast(&self, ray: &Ray, source: &dyn RenderableSource) -> Option<RaycastHit> {
        let root = self.root?;
        let entry = ray.intersect_aabb(&self.nodes[root].bounds)?;
        self.raycast_node(root, entry, ray, source, None)
    }

    fn raycast_node(
        &self,
        node_id: usize,
        entry: f32,
        ray: &Ray,
        source: &dyn RenderableSource,
        best: Option<RaycastHit>,
    ) -> Option<RaycastHit> {
        if best.is_some_and(|hit| hit.distance < entry) {
            return best;
        }
        let node = &self.nodes[node_id];

        if let Some(key) = node.primitive {
            let hit = source
                .renderable(key)
                .filter(|r| r.flags().contains(PrimitiveFlags::PICKABLE))
                .and_then(|r| r.intersect_ray(ray))
                .map(|distance| RaycastHit { key, distance });
            return RaycastHit::closest(best, hit);
        }

        // Visit the child entered first, then the other one if it can still win
        let mut children: Vec<(usize, f32)> = [node.left, node.right]
            .into_iter()
            .flatten()
            .filter_map(|child| ray.intersect_aabb(&self.nodes[child].bounds).map(|t| (child, t)))
            .collect();
        children.sort_by(|a, b| a.1.total_cmp(&b.1));

        children
            .into_iter()
            .fold(best, |best, (child, t)| self.raycast_node(child, t, ray, source, best))
    }
}

#[cfg(test)]
#[path = "kd_tree_tests.rs"]
mod tests;
