/// Renderable primitives consumed by the spatial core
///
/// The octree only holds `PrimitiveKey`s. Geometry and transforms are read
/// through the `Renderable` / `RenderableSource` capability traits, which
/// `PrimitiveStore` implements for applications without their own object model.

mod mesh;
mod primitive;
mod primitive_store;
mod renderable;

pub use mesh::{LodLevel, LOD_COUNT, MaterialSubset, MeshRenderData, MeshVertex, StaticMesh};
pub use primitive::{Primitive, PrimitiveFlags, PrimitiveShape};
pub use primitive_store::{PrimitiveKey, PrimitiveStore};
pub use renderable::{Renderable, RenderableSource};
