//! Spatial scene structures
//!
//! The octree partitions primitives, compiles their geometry into shared
//! per-material/per-LOD buffers and answers frustum, overlap and ray queries.
//! `OctreeRenderer` turns it into batched draw calls each frame, guided by
//! the occlusion cache.

mod octree;
mod octree_raycast;
mod batch_compiler;
mod kd_tree;
mod kd_forest;
mod occlusion;
mod render_selector;
mod octree_renderer;

pub use octree::{Octree, OctreeNode, NodeId, ROOT};
pub use batch_compiler::{BatchNodeData, BatchRootData, DrawRange, LodBatch, MaterialId};
pub use kd_tree::{KdTree, RaycastHit};
pub use kd_forest::KdForest;
pub use occlusion::{OcclusionCache, OcclusionStats, RegionId, RegionState};
pub use render_selector::{
    build_draw_list, select, submit, DrawCommand, DrawUnit, Selection, SubmitStats,
};
pub use octree_renderer::{OctreeRenderer, RenderStats};
