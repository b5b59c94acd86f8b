/*!
# Galaxy 3D Spatial

Spatial indexing and render batching core of the Galaxy 3D engine.

Scene primitives are partitioned into an octree whose nodes share
per-material, per-LOD GPU buffers. Each frame, nodes are selected with
tri-state frustum culling and a cache of hardware occlusion queries, and
drawn with one indexed draw per node range, bound once per buffer pair.
KD trees built under the octree answer precise picking rays.

## Architecture

- **Octree**: arena hierarchy, batch compiler and draw range layout
- **OctreeRenderer**: per-frame selection, sorted draws and occlusion queries
- **OcclusionCache**: temporal cache of per-region visibility queries
- **KdTree / KdForest**: median-split picking indexes
- **GraphicsDevice / CommandList**: the GPU collaborator implemented by backends
*/

// Internal modules
mod error;
mod engine;
pub mod config;
pub mod log;
pub mod math;
pub mod graphics_device;
pub mod primitive;
pub mod scene;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, format_entry};
    }

    pub mod config {
        pub use crate::config::*;
    }

    pub mod math {
        pub use crate::math::*;
    }

    pub mod primitive {
        pub use crate::primitive::*;
    }

    // GPU collaborator traits
    pub mod render {
        pub use crate::graphics_device::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
