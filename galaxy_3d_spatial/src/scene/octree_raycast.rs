//! Picking against the octree
//!
//! Two strategies, chosen by `OctreeConfig::raycast_strategy`:
//! - `Octree`: walk every node the ray enters and sphere-test the overlapping
//!   primitives of each leaf, keeping the globally closest hit;
//! - `Kd`: descend nearest-child-first down to the KD cutoff depth and return
//!   the first hit found by that node's KD tree.
//!
//! Both prune any subtree whose bounds the ray misses.

use crate::config::RaycastStrategy;
use crate::math::Ray;
use crate::primitive::{PrimitiveFlags, PrimitiveKey, Renderable, RenderableSource};
use super::kd_tree::RaycastHit;
use super::octree::{NodeId, Octree, ROOT};

impl Octree {
    /// Closest pickable primitive along `ray`
    ///
    /// Returns `None` for an empty tree, a degenerate ray or a miss.
    pub fn raycast(&self, ray: &Ray, source: &dyn RenderableSource) -> Option<RaycastHit> {
        if ray.is_degenerate() || self.is_empty() {
            return None;
        }

        // Primitives retained at the root may lie outside the root bounds
        let retained = self.nodes[ROOT]
            .components
            .iter()
            .fold(None, |best, &key| RaycastHit::closest(best, sphere_hit(key, ray, source)));

        let tree_hit = match self.config.raycast_strategy {
            RaycastStrategy::Octree => {
                let mut best = None;
                self.raycast_octree(ROOT, ray, source, &mut best);
                best
            }
            RaycastStrategy::Kd => self.raycast_kd(ROOT, ray, source),
        };

        RaycastHit::closest(retained, tree_hit)
    }

    fn raycast_octree(
        &self,
        node_id: NodeId,
        ray: &Ray,
        source: &dyn RenderableSource,
        best: &mut Option<RaycastHit>,
    ) {
        let node = &self.nodes[node_id];
        if ray.intersect_aabb(&node.bounds).is_none() {
            return;
        }

        match node.children {
            None => {
                for &key in &node.overlapping {
                    *best = RaycastHit::closest(*best, sphere_hit(key, ray, source));
                }
            }
            Some(children) => {
                for child in children {
                    self.raycast_octree(child, ray, source, best);
                }
            }
        }
    }

    fn raycast_kd(&self, node_id: NodeId, ray: &Ray, source: &dyn RenderableSource) -> Option<RaycastHit> {
        let node = &self.nodes[node_id];
        ray.intersect_aabb(&node.bounds)?;

        let children = match node.children {
            Some(children) if node.depth < self.config.kd_cutoff_depth => children,
            _ => {
                return match &node.kd_tree {
                    Some(tree) => tree.raycast(ray, source),
                    // KD trees not built: same precise test, linear scan
                    None => node.overlapping.iter().fold(None, |best, &key| {
                        RaycastHit::closest(best, precise_hit(key, ray, source))
                    }),
                };
            }
        };

        let mut ordered: Vec<(NodeId, f32)> = children
            .iter()
            .map(|&child| (child, self.nodes[child].bounds.center().distance_squared(ray.origin)))
            .collect();
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1));

        ordered
            .into_iter()
            .find_map(|(child, _)| self.raycast_kd(child, ray, source))
    }
}

fn pickable(key: PrimitiveKey, source: &dyn RenderableSource) -> Option<&dyn Renderable> {
    source
        .renderable(key)
        .filter(|r| r.flags().contains(PrimitiveFlags::PICKABLE))
}

fn sphere_hit(key: PrimitiveKey, ray: &Ray, source: &dyn RenderableSource) -> Option<RaycastHit> {
    let renderable = pickable(key, source)?;
    ray.intersect_sphere(&renderable.bounding_sphere())
        .map(|distance| RaycastHit { key, distance })
}

fn precise_hit(key: PrimitiveKey, ray: &Ray, source: &dyn RenderableSource) -> Option<RaycastHit> {
    let renderable = pickable(key, source)?;
    renderable.intersect_ray(ray).map(|distance| RaycastHit { key, distance })
}
