//! Mesh data supplied by the asset pipeline
//!
//! A `StaticMesh` carries up to three precomputed LOD variants. Each variant
//! is a vertex array, a u32 index array and the material subsets that slice
//! the index array.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use crate::error::{Error, Result};
use crate::math::AABB;

/// Number of LOD levels
pub const LOD_COUNT: usize = 3;

/// Discrete level of detail (0 = full detail)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LodLevel {
    Lod0,
    Lod1,
    Lod2,
}

impl LodLevel {
    pub const ALL: [LodLevel; LOD_COUNT] = [LodLevel::Lod0, LodLevel::Lod1, LodLevel::Lod2];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<LodLevel> {
        Self::ALL.get(index).copied()
    }
}

/// Vertex layout of batched geometry
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self { position: position.to_array(), normal: normal.to_array(), uv }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Slice of a mesh's index array drawn with one material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSubset {
    pub material: String,
    pub index_start: u32,
    pub index_count: u32,
}

// ============================================================================
// MESH RENDER DATA
// ============================================================================

/// One LOD variant: vertices, indices and material subsets
#[derive(Debug, Clone)]
pub struct MeshRenderData {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    material_subsets: Vec<MaterialSubset>,
}

impl MeshRenderData {
    /// Build a variant, checking that every index and subset is in range
    pub fn new(
        vertices: Vec<MeshVertex>,
        indices: Vec<u32>,
        material_subsets: Vec<MaterialSubset>,
    ) -> Result<Self> {
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::InvalidResource(format!(
                "index {} out of range ({} vertices)", bad, vertices.len()
            )));
        }
        for subset in &material_subsets {
            let end = subset.index_start as u64 + subset.index_count as u64;
            if end > indices.len() as u64 {
                return Err(Error::InvalidResource(format!(
                    "material subset '{}' ends at {} past {} indices",
                    subset.material, end, indices.len()
                )));
            }
        }
        Ok(Self { vertices, indices, material_subsets })
    }

    /// Variant whose whole index array uses one material
    pub fn with_single_material(
        material: &str,
        vertices: Vec<MeshVertex>,
        indices: Vec<u32>,
    ) -> Result<Self> {
        let subset = MaterialSubset {
            material: material.to_string(),
            index_start: 0,
            index_count: indices.len() as u32,
        };
        Self::new(vertices, indices, vec![subset])
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn material_subsets(&self) -> &[MaterialSubset] {
        &self.material_subsets
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space bounds of the vertex positions
    pub fn local_aabb(&self) -> AABB {
        AABB::from_points(self.vertices.iter().map(MeshVertex::position))
    }
}

// ============================================================================
// STATIC MESH
// ============================================================================

/// Named mesh with up to `LOD_COUNT` variants
///
/// LOD0 is mandatory. A missing coarser level resolves to the next finer one.
#[derive(Debug, Clone)]
pub struct StaticMesh {
    name: String,
    lods: [Option<MeshRenderData>; LOD_COUNT],
}

impl StaticMesh {
    pub fn new(name: &str, lod0: MeshRenderData) -> Self {
        Self { name: name.to_string(), lods: [Some(lod0), None, None] }
    }

    /// Set a coarser variant
    pub fn with_lod(mut self, level: LodLevel, data: MeshRenderData) -> Self {
        self.lods[level.index()] = Some(data);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant for `level`, falling back toward LOD0
    pub fn lod(&self, level: LodLevel) -> Option<&MeshRenderData> {
        self.lods[..=level.index()].iter().rev().find_map(Option::as_ref)
    }

    /// True if `level` is stored rather than resolved by fallback
    pub fn has_lod(&self, level: LodLevel) -> bool {
        self.lods[level.index()].is_some()
    }

    pub fn local_aabb(&self) -> AABB {
        self.lod(LodLevel::Lod0).map(MeshRenderData::local_aabb).unwrap_or(AABB::EMPTY)
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
