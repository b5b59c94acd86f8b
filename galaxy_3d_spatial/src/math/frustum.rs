/// Frustum: six clipping planes extracted from a view-projection matrix.
///
/// Each plane is a Vec4 (A, B, C, D) with an inward-pointing normal: a point P
/// is inside when `A*x + B*y + C*z + D >= 0` for all six planes.
///
/// Plane extraction assumes the glam clip-space convention (depth in 0..1),
/// which is what `Mat4::perspective_rh` and `Mat4::orthographic_rh` produce.

use glam::{Mat4, Vec3, Vec4};
use super::AABB;

/// Tri-state classification of a box against the frustum
///
/// - `Outside` prunes the subtree
/// - `Intersects` keeps subdividing
/// - `Contains` accepts the whole subtree as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumContainment {
    Outside,
    Intersects,
    Contains,
}

/// Frustum plane indices
pub const PLANE_NEAR: usize = 0;
pub const PLANE_FAR: usize = 1;
pub const PLANE_LEFT: usize = 2;
pub const PLANE_RIGHT: usize = 3;
pub const PLANE_TOP: usize = 4;
pub const PLANE_BOTTOM: usize = 5;

/// Planes with a normal shorter than this are kept unnormalized
const MIN_NORMAL_LENGTH: f32 = 1e-8;

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: near, far, left, right, top, bottom
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the six planes (Gribb & Hartmann)
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();
        let row = |r: usize| Vec4::new(m[0][r], m[1][r], m[2][r], m[3][r]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let mut planes = [Vec4::ZERO; 6];
        // 0 <= z_clip: the near plane is row 2 alone
        planes[PLANE_NEAR] = r2;
        planes[PLANE_FAR] = r3 - r2;
        planes[PLANE_LEFT] = r3 + r0;
        planes[PLANE_RIGHT] = r3 - r0;
        planes[PLANE_TOP] = r3 - r1;
        planes[PLANE_BOTTOM] = r3 + r1;

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > MIN_NORMAL_LENGTH {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance from the box center and the box's projected radius on the plane normal
    #[inline]
    fn plane_distance(plane: &Vec4, center: Vec3, extents: Vec3) -> (f32, f32) {
        let normal = plane.truncate();
        let distance = normal.dot(center) + plane.w;
        let radius = extents.dot(normal.abs());
        (distance, radius)
    }

    /// Test if a box is at least partially inside
    ///
    /// Conservative: may keep boxes near frustum corners, never drops a visible one.
    pub fn intersect(&self, aabb: &AABB) -> bool {
        let center = aabb.center();
        let extents = aabb.extents();
        self.planes.iter().all(|plane| {
            let (distance, radius) = Self::plane_distance(plane, center, extents);
            distance + radius >= 0.0
        })
    }

    /// Classify a box as Outside, Intersects or Contains
    pub fn check_containment(&self, aabb: &AABB) -> FrustumContainment {
        let center = aabb.center();
        let extents = aabb.extents();
        let mut result = FrustumContainment::Contains;

        for plane in &self.planes {
            let (distance, radius) = Self::plane_distance(plane, center, extents);
            if distance + radius < 0.0 {
                return FrustumContainment::Outside;
            }
            if distance - radius < 0.0 {
                result = FrustumContainment::Intersects;
            }
        }

        result
    }

    /// Test if a point is inside all six planes
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
