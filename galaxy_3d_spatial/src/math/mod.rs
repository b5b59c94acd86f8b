//! Geometric primitives shared by every spatial structure

mod aabb;
mod frustum;
mod ray;

pub use aabb::{AABB, BoundingSphere};
pub use frustum::{
    Frustum, FrustumContainment,
    PLANE_NEAR, PLANE_FAR, PLANE_LEFT, PLANE_RIGHT, PLANE_TOP, PLANE_BOTTOM,
};
pub use ray::Ray;
