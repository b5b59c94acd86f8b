/// Eight independent KD trees, one per octant of the world bounds.
///
/// Each primitive is filed under the octant containing its AABB center.
/// A raycast only visits the trees whose own bounds the ray enters and keeps
/// the closest hit across them.

use crate::math::{AABB, Ray};
use crate::primitive::{PrimitiveKey, RenderableSource};
use super::kd_tree::{KdTree, RaycastHit};

pub struct KdForest {
    bounds: AABB,
    trees: [KdTree; 8],
}

impl KdForest {
    /// Partition `items` around the center of `bounds`
    pub fn build(bounds: AABB, items: &[(PrimitiveKey, AABB)]) -> Self {
        let mut buckets: [Vec<(PrimitiveKey, AABB)>; 8] = Default::default();
        for &(key, aabb) in items {
            buckets[bounds.octant_index(aabb.center())].push((key, aabb));
        }
        Self {
            bounds,
            trees: std::array::from_fn(|octant| KdTree::build(&buckets[octant])),
        }
    }

    /// Build over every primitive of `source`, bounded by their hull
    pub fn from_source(source: &dyn RenderableSource) -> Self {
        let items: Vec<(PrimitiveKey, AABB)> = source
            .renderable_keys()
            .into_iter()
            .filter_map(|key| source.renderable(key).map(|r| (key, r.world_aabb())))
            .collect();
        let bounds = items.iter().fold(AABB::EMPTY, |hull, (_, aabb)| hull.union(aabb));
        Self::build(bounds, &items)
    }

    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    pub fn tree(&self, octant: usize) -> Option<&KdTree> {
        self.trees.get(octant)
    }

    pub fn len(&self) -> usize {
        self.trees.iter().map(KdTree::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.iter().all(KdTree::is_empty)
    }

    /// Closest pickable hit across all octant trees
    pub fn raycast(&self, ray: &Ray, source: &dyn RenderableSource) -> Option<RaycastHit> {
        if ray.is_degenerate() {
            return None;
        }
        self.trees
            .iter()
            .filter(|tree| tree.bounds().is_some_and(|b| ray.intersect_aabb(&b).is_some()))
            .fold(None, |best, tree| RaycastHit::closest(best, tree.raycast(ray, source)))
    }
}

#[cfg(test)]
#[path = "kd_forest_tests.rs"]
mod tests;
