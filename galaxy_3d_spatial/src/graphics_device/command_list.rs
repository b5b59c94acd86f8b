/// Command list trait for recording draw commands

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Buffer, OcclusionQuery};

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit unsigned integer indices
    U16,
    /// 32-bit unsigned integer indices
    U32,
}

impl IndexType {
    /// Size of one index in bytes
    pub fn size_bytes(&self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Command list for recording GPU commands
///
/// The spatial core records, per (material, LOD) group, one material bind,
/// one vertex/index buffer bind and one indexed draw per selected node.
pub trait CommandList {
    /// Bind the pipeline and resources of a material, resolved by name
    fn bind_material(&mut self, material: &str) -> Result<()>;

    /// Bind a vertex buffer
    ///
    /// # Arguments
    ///
    /// * `buffer` - Vertex buffer to bind
    /// * `offset` - Byte offset into the buffer
    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()>;

    /// Bind an index buffer
    ///
    /// # Arguments
    ///
    /// * `buffer` - Index buffer to bind
    /// * `offset` - Byte offset into the buffer
    /// * `index_type` - Type of indices (U16 or U32)
    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw indexed primitives
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Start counting samples into `query`
    fn begin_occlusion_query(&mut self, query: &Arc<dyn OcclusionQuery>) -> Result<()>;

    /// Stop counting samples into `query`
    fn end_occlusion_query(&mut self, query: &Arc<dyn OcclusionQuery>) -> Result<()>;
}
