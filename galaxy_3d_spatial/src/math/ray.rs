//! Ray and ray/shape intersection tests used for picking

use glam::{Mat4, Vec2, Vec3};
use super::{AABB, BoundingSphere};

/// Axis components smaller than this are treated as parallel in the slab test
const PARALLEL_EPSILON: f32 = 1e-8;
/// Minimum accepted distance for triangle hits
const TRIANGLE_EPSILON: f32 = 1e-7;

/// Half-line `origin + t * direction`, `t >= 0`
///
/// `direction` is normalized on construction, so `t` is a world distance.
/// A zero direction yields a degenerate ray that hits nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    /// Picking ray through a point in normalized device coordinates
    ///
    /// `ndc` is in -1..1 on both axes (+Y up). The ray starts at the camera and
    /// passes through the unprojected far-plane point.
    pub fn from_screen(ndc: Vec2, inverse_view_projection: &Mat4, camera_position: Vec3) -> Self {
        let far_point = inverse_view_projection.project_point3(ndc.extend(1.0));
        Self::new(camera_position, far_point - camera_position)
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray expressed in another space (direction renormalized)
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray::new(matrix.transform_point3(self.origin), matrix.transform_vector3(self.direction))
    }

    /// Slab test
    ///
    /// Returns the entry distance, 0 when the origin is inside the box.
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<f32> {
        if self.is_degenerate() || aabb.is_empty() {
            return None;
        }

        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

            if direction.abs() < PARALLEL_EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }

    /// Nearest non-negative hit distance against a sphere
    ///
    /// When the origin is inside the sphere the exit distance is returned.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<f32> {
        if self.is_degenerate() {
            return None;
        }
        let oc = self.origin - sphere.center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - sphere.radius * sphere.radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + root;
        (far >= 0.0).then_some(far)
    }

    /// Möller-Trumbore ray/triangle test (double-sided)
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < TRIANGLE_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t > TRIANGLE_EPSILON).then_some(t)
    }
}

#[cfg(test)]
#[path = "ray_tests.rs"]
mod tests;
