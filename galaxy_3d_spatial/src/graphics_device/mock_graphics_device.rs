/// Mock graphics device for unit tests (no GPU required)
///
/// Every mock records what it was asked to do so tests can assert on buffer
/// contents, bind/draw ordering and query traffic.

use std::sync::{Arc, Mutex};
use crate::error::Result;
use crate::engine_bail;
use crate::graphics_device::{
    Buffer, BufferDesc, BufferUsage, CommandList, GraphicsDevice, IndexType, OcclusionQuery,
};

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub size: u64,
    pub usage: BufferUsage,
    pub data: Mutex<Vec<u8>>,
}

impl MockBuffer {
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self { size, usage, data: Mutex::new(vec![0; size as usize]) }
    }

    /// Uploaded contents reinterpreted as u32 (index buffers)
    pub fn as_u32(&self) -> Vec<u32> {
        let data = self.data.lock().unwrap();
        data.chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset + data.len() as u64;
        if end > self.size {
            engine_bail!("galaxy3d::mock",
                "buffer update out of range ({} > {})", end, self.size);
        }
        let mut storage = self.data.lock().unwrap();
        storage[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }
}

// ============================================================================
// Mock Occlusion Query
// ============================================================================

/// Query whose readback is scripted by the test
#[derive(Debug, Default)]
pub struct MockOcclusionQuery {
    pub result: Mutex<Option<u64>>,
    pub reads: Mutex<u32>,
}

impl MockOcclusionQuery {
    /// Make the next readbacks return `samples` (`None` = still pending)
    pub fn set_result(&self, samples: Option<u64>) {
        *self.result.lock().unwrap() = samples;
    }
}

impl OcclusionQuery for MockOcclusionQuery {
    fn try_read_samples(&self) -> Option<u64> {
        *self.reads.lock().unwrap() += 1;
        *self.result.lock().unwrap()
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

#[derive(Default)]
pub struct MockGraphicsDevice {
    pub buffers: Vec<Arc<MockBuffer>>,
    pub queries: Vec<Arc<MockOcclusionQuery>>,
    /// Buffer creation of this usage fails while set
    pub fail_usage: Option<BufferUsage>,
    /// Result every newly created query starts with
    pub default_query_result: Option<u64>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffers_of(&self, usage: BufferUsage) -> Vec<Arc<MockBuffer>> {
        self.buffers.iter().filter(|b| b.usage == usage).cloned().collect()
    }

    /// Script every query created so far
    pub fn set_all_query_results(&self, samples: Option<u64>) {
        for query in &self.queries {
            query.set_result(samples);
        }
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        if self.fail_usage == Some(desc.usage) {
            engine_bail!("galaxy3d::mock", "{:?} buffer creation disabled", desc.usage);
        }
        let buffer = Arc::new(MockBuffer::new(desc.size, desc.usage));
        self.buffers.push(buffer.clone());
        Ok(buffer)
    }

    fn create_occlusion_query(&mut self) -> Result<Arc<dyn OcclusionQuery>> {
        let query = Arc::new(MockOcclusionQuery::default());
        query.set_result(self.default_query_result);
        self.queries.push(query.clone());
        Ok(query)
    }
}

// ============================================================================
// Mock Command List
// ============================================================================

pub struct MockCommandList {
    pub commands: Vec<String>,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    /// Recorded commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl CommandList for MockCommandList {
    fn bind_material(&mut self, material: &str) -> Result<()> {
        self.commands.push(format!("bind_material({})", material));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.commands.push(format!("bind_vertex_buffer({}, {})", buffer.size(), offset));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()> {
        self.commands.push(format!("bind_index_buffer({}, {}, {:?})", buffer.size(), offset, index_type));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.commands.push(format!("draw_indexed({}, {}, {})", index_count, first_index, vertex_offset));
        Ok(())
    }

    fn begin_occlusion_query(&mut self, _query: &Arc<dyn OcclusionQuery>) -> Result<()> {
        self.commands.push("begin_occlusion_query".to_string());
        Ok(())
    }

    fn end_occlusion_query(&mut self, _query: &Arc<dyn OcclusionQuery>) -> Result<()> {
        self.commands.push("end_occlusion_query".to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
