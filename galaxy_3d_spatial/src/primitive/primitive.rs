//! Concrete primitive type used by `PrimitiveStore`

use std::sync::Arc;
use bitflags::bitflags;
use glam::Mat4;
use crate::math::{AABB, BoundingSphere, Ray};
use super::{LodLevel, MeshRenderData, Renderable, StaticMesh};

bitflags! {
    /// Per-primitive behavior flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PrimitiveFlags: u32 {
        /// Batched and drawn
        const VISIBLE  = 1 << 0;
        /// Returned by raycasts
        const PICKABLE = 1 << 1;
    }
}

impl Default for PrimitiveFlags {
    fn default() -> Self {
        PrimitiveFlags::VISIBLE | PrimitiveFlags::PICKABLE
    }
}

/// What a primitive is made of
#[derive(Debug, Clone)]
pub enum PrimitiveShape {
    /// Mesh geometry shared between primitives
    Mesh(Arc<StaticMesh>),
    /// Bounds only (triggers, lights, placeholders)
    Bounds,
}

/// A placed renderable
#[derive(Debug, Clone)]
pub struct Primitive {
    name: String,
    shape: PrimitiveShape,
    local_aabb: AABB,
    world_transform: Mat4,
    world_aabb: AABB,
    flags: PrimitiveFlags,
}

impl Primitive {
    pub fn from_mesh(name: &str, mesh: Arc<StaticMesh>, world_transform: Mat4) -> Self {
        let local_aabb = mesh.local_aabb();
        Self::with_shape(name, PrimitiveShape::Mesh(mesh), local_aabb, world_transform)
    }

    pub fn from_bounds(name: &str, local_aabb: AABB, world_transform: Mat4) -> Self {
        Self::with_shape(name, PrimitiveShape::Bounds, local_aabb, world_transform)
    }

    fn with_shape(name: &str, shape: PrimitiveShape, local_aabb: AABB, world_transform: Mat4) -> Self {
        Self {
            name: name.to_string(),
            shape,
            local_aabb,
            world_transform,
            world_aabb: local_aabb.transformed(&world_transform),
            flags: PrimitiveFlags::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &PrimitiveShape {
        &self.shape
    }

    pub fn local_aabb(&self) -> AABB {
        self.local_aabb
    }

    /// Move the primitive (world AABB is refreshed by `update_world_aabb`)
    pub fn set_world_transform(&mut self, world_transform: Mat4) {
        self.world_transform = world_transform;
    }

    pub fn update_world_aabb(&mut self) {
        self.world_aabb = self.local_aabb.transformed(&self.world_transform);
    }

    pub fn set_flags(&mut self, flags: PrimitiveFlags) {
        self.flags = flags;
    }

    pub fn mesh(&self) -> Option<&StaticMesh> {
        match &self.shape {
            PrimitiveShape::Mesh(mesh) => Some(mesh.as_ref()),
            PrimitiveShape::Bounds => None,
        }
    }

    /// Closest world-space triangle hit of LOD0
    fn intersect_ray_triangles(&self, mesh: &StaticMesh, ray: &Ray) -> Option<f32> {
        let data = mesh.lod(LodLevel::Lod0)?;
        let vertices = data.vertices();
        let world = |i: u32| self.world_transform.transform_point3(vertices[i as usize].position());

        data.indices()
            .chunks_exact(3)
            .filter_map(|tri| ray.intersect_triangle(world(tri[0]), world(tri[1]), world(tri[2])))
            .min_by(f32::total_cmp)
    }
}

impl Renderable for Primitive {
    fn world_aabb(&self) -> AABB {
        self.world_aabb
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        self.world_aabb.bounding_sphere()
    }

    fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    fn mesh_render_data(&self, lod: LodLevel) -> Option<&MeshRenderData> {
        self.mesh().and_then(|mesh| mesh.lod(lod))
    }

    fn flags(&self) -> PrimitiveFlags {
        self.flags
    }

    fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let entry = ray.intersect_aabb(&self.world_aabb)?;
        match &self.shape {
            PrimitiveShape::Mesh(mesh) => self.intersect_ray_triangles(mesh, ray),
            PrimitiveShape::Bounds => Some(entry),
        }
    }
}

#[cfg(test)]
#[path = "primitive_tests.rs"]
mod tests;
