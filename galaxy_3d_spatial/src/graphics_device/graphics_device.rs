/// Graphics device trait: factory for the GPU resources the spatial core needs

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Buffer, BufferDesc, OcclusionQuery};

/// GPU resource factory
///
/// Implemented by backend-specific devices. Creation failures are reported
/// through `Result`; the spatial core logs them and skips the affected batch.
pub trait GraphicsDevice {
    /// Create an uninitialized buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer size and usage
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create an occlusion query object
    fn create_occlusion_query(&mut self) -> Result<Arc<dyn OcclusionQuery>>;
}

/// Create a buffer of `usage` and upload `data` into it
pub fn create_buffer_with_data(
    device: &mut dyn GraphicsDevice,
    usage: crate::graphics_device::BufferUsage,
    data: &[u8],
) -> Result<Arc<dyn Buffer>> {
    let buffer = device.create_buffer(BufferDesc { size: data.len() as u64, usage })?;
    buffer.update(0, data)?;
    Ok(buffer)
}
