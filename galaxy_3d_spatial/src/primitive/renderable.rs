/// Capability traits between the object model and the spatial core

use glam::Mat4;
use crate::math::{AABB, BoundingSphere, Ray};
use super::{LodLevel, MeshRenderData, PrimitiveFlags, PrimitiveKey};

/// A primitive as seen by the spatial core
///
/// `mesh_render_data` returns `None` for primitives without geometry; those
/// are still indexed and pickable but never batched.
pub trait Renderable {
    fn world_aabb(&self) -> AABB;

    fn bounding_sphere(&self) -> BoundingSphere;

    fn world_transform(&self) -> Mat4;

    /// Local-space geometry for `lod`, after LOD fallback
    fn mesh_render_data(&self, lod: LodLevel) -> Option<&MeshRenderData>;

    fn flags(&self) -> PrimitiveFlags;

    /// Precise hit distance along `ray` (world space)
    fn intersect_ray(&self, ray: &Ray) -> Option<f32>;
}

/// Enumerable set of renderables owned by the object model
pub trait RenderableSource {
    /// Every primitive to index, in a stable order
    fn renderable_keys(&self) -> Vec<PrimitiveKey>;

    fn renderable(&self, key: PrimitiveKey) -> Option<&dyn Renderable>;

    /// Recompute the world AABB of `key` from its transform
    fn refresh_world_bounds(&mut self, key: PrimitiveKey);
}
