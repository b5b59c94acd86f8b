//! Axis-aligned bounding box and bounding sphere

use glam::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
///
/// Invariant: `min <= max` componentwise for every box built through `new`,
/// `from_center_extents`, `union` or `transformed`. `AABB::EMPTY` is the only
/// inverted box and acts as the identity for `union`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    /// Inverted box, identity element of `union`
    pub const EMPTY: AABB = AABB {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Build a box from two arbitrary corners
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Build a box from its center and half-size
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        let extents = extents.abs();
        Self { min: center - extents, max: center + extents }
    }

    /// Smallest box enclosing all `points` (EMPTY when there are none)
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(AABB::EMPTY, |acc, p| AABB {
            min: acc.min.min(p),
            max: acc.max.max(p),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size along each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Test if this box fully contains `other`
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if `point` lies inside or on the boundary
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Test if the two boxes overlap or touch
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    pub fn union(&self, other: &AABB) -> AABB {
        AABB { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Smallest cube sharing this box's center that encloses it
    pub fn to_cube(&self) -> AABB {
        let half = self.extents().max_element();
        AABB::from_center_extents(self.center(), Vec3::splat(half))
    }

    /// Transform this box by a matrix (Arvo's method, tight for affine matrices)
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }

    /// Bounds of child octant `index` (0..8)
    ///
    /// Bit 0 selects the upper half on X, bit 1 on Y, bit 2 on Z.
    pub fn octant(&self, index: usize) -> AABB {
        let center = self.center();
        let pick = |bit: usize, axis: usize| {
            if index & bit != 0 {
                (center[axis], self.max[axis])
            } else {
                (self.min[axis], center[axis])
            }
        };
        let (x0, x1) = pick(1, 0);
        let (y0, y1) = pick(2, 1);
        let (z0, z1) = pick(4, 2);
        AABB { min: Vec3::new(x0, y0, z0), max: Vec3::new(x1, y1, z1) }
    }

    /// Index of the octant whose half-spaces contain `point`
    ///
    /// Points on a splitting plane go to the upper half.
    pub fn octant_index(&self, point: Vec3) -> usize {
        let center = self.center();
        (point.x >= center.x) as usize
            | ((point.y >= center.y) as usize) << 1
            | ((point.z >= center.z) as usize) << 2
    }

    /// Sphere through the box corners
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere { center: self.center(), radius: self.extents().length() }
    }
}

impl Default for AABB {
    fn default() -> Self {
        AABB { min: Vec3::splat(-1.0), max: Vec3::splat(1.0) }
    }
}

/// Sphere enclosing a primitive, used by the approximate ray test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
