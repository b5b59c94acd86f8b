/// Graphics device module - the GPU collaborator consumed by the spatial core
///
/// Backends implement these traits. The core only creates vertex/index
/// buffers and occlusion queries, and records binds, indexed draws and
/// query brackets into a command list.

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod command_list;
pub mod occlusion_query;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use command_list::*;
pub use occlusion_query::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
