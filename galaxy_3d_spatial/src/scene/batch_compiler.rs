//! Batch compiler: turns a built octree into GPU-ready shared geometry.
//!
//! One vertex/index array pair exists per material per LOD, owned by the
//! tree (the "batch root"). Every node records, per material and LOD, the
//! `DrawRange` of that shared index array covering its whole subtree.
//!
//! Passes, in order:
//! 1. `build_batch_render_data`: post-order walk appending each visible
//!    primitive's geometry (positions in world space) to the shared arrays
//!    and summing index counts up the tree;
//! 2. `assign_all_draw_ranges`: top-down cursor walk in child order 0..7,
//!    a node's own components occupying the tail of its range;
//! 3. `build_batch_buffers`: one GPU buffer pair per non-empty material/LOD;
//! 4. `clear_batch_datas`: release CPU arrays whose buffers exist.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::graphics_device::{create_buffer_with_data, Buffer, BufferUsage, GraphicsDevice};
use crate::primitive::{
    LodLevel, LOD_COUNT, MaterialSubset, MeshRenderData, MeshVertex, PrimitiveFlags,
    PrimitiveKey, RenderableSource,
};
use super::octree::{NodeId, Octree, ROOT};

/// Interned material name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Contiguous slice `[index_start, index_start + index_count)` of a shared index array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawRange {
    pub index_start: u32,
    pub index_count: u32,
}

impl DrawRange {
    pub fn end(&self) -> u32 {
        self.index_start + self.index_count
    }

    pub fn is_empty(&self) -> bool {
        self.index_count == 0
    }
}

// ============================================================================
// ROOT DATA
// ============================================================================

/// Shared geometry and GPU buffers of one material at one LOD
#[derive(Default)]
pub struct LodBatch {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    /// Totals survive `clear_batch_datas`
    vertex_count: u32,
    index_count: u32,
    vertex_buffer: Option<Arc<dyn Buffer>>,
    index_buffer: Option<Arc<dyn Buffer>>,
}

impl LodBatch {
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_buffer(&self) -> Option<&Arc<dyn Buffer>> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&Arc<dyn Buffer>> {
        self.index_buffer.as_ref()
    }

    pub fn has_buffers(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    /// Append one material subset, renumbering its indices into this batch
    ///
    /// Each referenced vertex is transformed and stored once. Returns the
    /// number of indices appended.
    fn append_subset(&mut self, data: &MeshRenderData, subset: &MaterialSubset, transform: &glam::Mat4) -> u32 {
        let start = subset.index_start as usize;
        let end = start + subset.index_count as usize;
        let source_vertices = data.vertices();
        let vertices = &mut self.vertices;
        let mut remap: FxHashMap<u32, u32> = FxHashMap::default();

        for &old in &data.indices()[start..end] {
            let new = *remap.entry(old).or_insert_with(|| {
                let mut vertex = source_vertices[old as usize];
                vertex.position = transform.transform_point3(vertex.position()).to_array();
                vertices.push(vertex);
                (vertices.len() - 1) as u32
            });
            self.indices.push(new);
        }

        self.vertex_count = self.vertices.len() as u32;
        self.index_count += subset.index_count;
        subset.index_count
    }
}

struct MaterialBatch {
    name: String,
    lods: [LodBatch; LOD_COUNT],
}

/// Batch data owned by the tree root
#[derive(Default)]
pub struct BatchRootData {
    material_ids: BTreeMap<String, MaterialId>,
    materials: Vec<MaterialBatch>,
}

impl BatchRootData {
    fn intern(&mut self, name: &str) -> MaterialId {
        if let Some(&id) = self.material_ids.get(name) {
            return id;
        }
        let id = MaterialId(self.materials.len() as u32);
        self.material_ids.insert(name.to_string(), id);
        self.materials.push(MaterialBatch { name: name.to_string(), lods: Default::default() });
        id
    }

    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.material_ids.get(name).copied()
    }

    pub fn material_name(&self, id: MaterialId) -> Option<&str> {
        self.materials.get(id.0 as usize).map(|m| m.name.as_str())
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Materials in name order
    pub fn materials(&self) -> impl Iterator<Item = (&str, MaterialId)> {
        self.material_ids.iter().map(|(name, &id)| (name.as_str(), id))
    }

    pub fn lod_batch(&self, material: MaterialId, lod: LodLevel) -> Option<&LodBatch> {
        self.materials.get(material.0 as usize).map(|m| &m.lods[lod.index()])
    }

    /// True while a non-empty batch lacks its GPU buffers
    pub fn has_pending_buffers(&self) -> bool {
        self.materials
            .iter()
            .flat_map(|m| m.lods.iter())
            .any(|batch| batch.index_count > 0 && !batch.has_buffers())
    }
}

// ============================================================================
// NODE DATA
// ============================================================================

/// Per-node draw ranges, per material and LOD
#[derive(Debug, Clone, Default)]
pub struct BatchNodeData {
    ranges: BTreeMap<MaterialId, [DrawRange; LOD_COUNT]>,
}

impl BatchNodeData {
    /// Range for `material` at `lod` (empty when the subtree has none)
    pub fn draw_range(&self, material: MaterialId, lod: LodLevel) -> DrawRange {
        self.ranges
            .get(&material)
            .map(|ranges| ranges[lod.index()])
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &[DrawRange; LOD_COUNT])> {
        self.ranges.iter().map(|(&id, ranges)| (id, ranges))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

type LodCounts = BTreeMap<MaterialId, [u32; LOD_COUNT]>;

// ============================================================================
// COMPILER PASSES
// ============================================================================

impl Octree {
    pub fn batch_root(&self) -> &BatchRootData {
        &self.batch_root
    }

    /// Bottom-up accumulation of every visible primitive into the shared arrays
    ///
    /// Replaces any previous batch data and GPU buffers. Ranges hold subtree
    /// index counts only until `assign_all_draw_ranges` runs.
    pub fn build_batch_render_data(&mut self, source: &dyn RenderableSource) {
        self.batch_root = BatchRootData::default();
        for node in &mut self.nodes {
            node.batch = BatchNodeData::default();
        }

        self.accumulate_node(ROOT, source);

        for (name, id) in self.batch_root.materials() {
            for lod in LodLevel::ALL {
                if let Some(batch) = self.batch_root.lod_batch(id, lod) {
                    crate::engine_debug!("galaxy3d::BatchCompiler",
                        "Material '{}' {:?}: {} vertices, {} indices",
                        name, lod, batch.vertex_count, batch.index_count);
                }
            }
        }
    }

    fn accumulate_node(&mut self, node_id: NodeId, source: &dyn RenderableSource) {
        let mut counts = LodCounts::new();

        if let Some(children) = self.nodes[node_id].children {
            for child in children {
                self.accumulate_node(child, source);
                for (material, ranges) in self.nodes[child].batch.iter() {
                    let entry = counts.entry(material).or_default();
                    for lod in 0..LOD_COUNT {
                        entry[lod] += ranges[lod].index_count;
                    }
                }
            }
        }

        for i in 0..self.nodes[node_id].components.len() {
            let key = self.nodes[node_id].components[i];
            self.append_primitive(key, source, &mut counts);
        }

        self.nodes[node_id].batch.ranges = counts
            .into_iter()
            .map(|(material, lods)| {
                (material, lods.map(|index_count| DrawRange { index_start: 0, index_count }))
            })
            .collect();
    }

    fn append_primitive(&mut self, key: PrimitiveKey, source: &dyn RenderableSource, counts: &mut LodCounts) {
        let Some(renderable) = source.renderable(key) else {
            return;
        };
        if !renderable.flags().contains(PrimitiveFlags::VISIBLE) {
            return;
        }
        let transform = renderable.world_transform();

        for lod in LodLevel::ALL {
            let Some(data) = renderable.mesh_render_data(lod) else {
                continue;
            };
            for subset in data.material_subsets() {
                if subset.index_count == 0 {
                    continue;
                }
                let material = self.batch_root.intern(&subset.material);
                let batch = &mut self.batch_root.materials[material.0 as usize].lods[lod.index()];
                let added = batch.append_subset(data, subset, &transform);
                counts.entry(material).or_default()[lod.index()] += added;
            }
        }
    }

    /// Top-down assignment of every node's `index_start`
    ///
    /// Children get consecutive ranges in child order starting at the parent's
    /// start; the parent's own components fill the rest of its range.
    pub fn assign_all_draw_ranges(&mut self) {
        self.assign_ranges(ROOT, &LodCounts::new());
    }

    fn assign_ranges(&mut self, node_id: NodeId, starts: &LodCounts) {
        let node = &mut self.nodes[node_id];
        for (material, ranges) in node.batch.ranges.iter_mut() {
            let start = starts.get(material).copied().unwrap_or_default();
            for lod in 0..LOD_COUNT {
                ranges[lod].index_start = start[lod];
            }
        }

        let Some(children) = node.children else {
            return;
        };
        let mut cursor: LodCounts = node
            .batch
            .ranges
            .iter()
            .map(|(&material, ranges)| (material, ranges.map(|r| r.index_start)))
            .collect();

        for child in children {
            let child_starts = cursor.clone();
            for (material, ranges) in self.nodes[child].batch.iter() {
                if let Some(position) = cursor.get_mut(&material) {
                    for lod in 0..LOD_COUNT {
                        position[lod] += ranges[lod].index_count;
                    }
                }
            }
            self.assign_ranges(child, &child_starts);
        }
    }

    /// Create the GPU buffers of every non-empty batch still lacking them
    ///
    /// Failures are logged and skipped; the batch is retried on the next call.
    /// Returns the number of batches whose buffer pair is now complete.
    pub fn build_batch_buffers(&mut self, device: &mut dyn GraphicsDevice) -> usize {
        let mut created = 0;

        for material in &mut self.batch_root.materials {
            for (lod, batch) in material.lods.iter_mut().enumerate() {
                if batch.index_count == 0 || batch.has_buffers() {
                    continue;
                }
                if batch.vertex_buffer.is_none() {
                    match create_buffer_with_data(device, BufferUsage::Vertex, bytemuck::cast_slice(&batch.vertices)) {
                        Ok(buffer) => batch.vertex_buffer = Some(buffer),
                        Err(err) => {
                            crate::engine_error!("galaxy3d::BatchCompiler",
                                "Vertex buffer for '{}' LOD{} failed: {}", material.name, lod, err);
                            continue;
                        }
                    }
                }
                if batch.index_buffer.is_none() {
                    match create_buffer_with_data(device, BufferUsage::Index, bytemuck::cast_slice(&batch.indices)) {
                        Ok(buffer) => batch.index_buffer = Some(buffer),
                        Err(err) => {
                            crate::engine_error!("galaxy3d::BatchCompiler",
                                "Index buffer for '{}' LOD{} failed: {}", material.name, lod, err);
                            continue;
                        }
                    }
                }
                created += 1;
            }
        }

        if created > 0 {
            crate::engine_debug!("galaxy3d::BatchCompiler", "Created {} batch buffer pairs", created);
        }
        created
    }

    /// Release CPU geometry of every batch whose buffers exist
    pub fn clear_batch_datas(&mut self) {
        for material in &mut self.batch_root.materials {
            for batch in material.lods.iter_mut().filter(|b| b.has_buffers()) {
                batch.vertices = Vec::new();
                batch.indices = Vec::new();
            }
        }
    }

    /// One line per node (up to `max_depth`) and non-empty range, depth-first
    pub fn dump_draw_ranges(&self, max_depth: u32) -> String {
        let mut out = String::new();
        self.dump_node(ROOT, max_depth, &mut out);
        out
    }

    fn dump_node(&self, node_id: NodeId, max_depth: u32, out: &mut String) {
        let node = &self.nodes[node_id];
        if node.depth > max_depth {
            return;
        }
        for (material, ranges) in node.batch.iter() {
            let name = self.batch_root.material_name(material).unwrap_or("?");
            for (lod, range) in ranges.iter().enumerate().filter(|(_, r)| !r.is_empty()) {
                let _ = writeln!(out, "{:indent$}node {} depth {} '{}' LOD{} [{}, {})",
                    "", node_id, node.depth, name, lod, range.index_start, range.end(),
                    indent = node.depth as usize * 2);
            }
        }
        if let Some(children) = node.children {
            for child in children {
                self.dump_node(child, max_depth, out);
            }
        }
    }
}

#[cfg(test)]
#[path = "batch_compiler_tests.rs"]
mod tests;
