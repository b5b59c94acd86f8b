use glam::Vec3;
use super::*;

fn vertex(x: f32, y: f32, z: f32) -> MeshVertex {
    MeshVertex::new(Vec3::new(x, y, z), Vec3::Z, [0.0, 0.0])
}

fn triangle(material: &str) -> MeshRenderData {
    MeshRenderData::with_single_material(
        material,
        vec![vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(0.0, 1.0, 0.0)],
        vec![0, 1, 2],
    )
    .unwrap()
}

// ============================================================================
// LOD LEVEL
// ============================================================================

#[test]
fn test_lod_level_index_roundtrip() {
    for (i, level) in LodLevel::ALL.iter().enumerate() {
        assert_eq!(level.index(), i);
        assert_eq!(LodLevel::from_index(i), Some(*level));
    }
    assert_eq!(LodLevel::from_index(LOD_COUNT), None);
}

// ============================================================================
// MESH RENDER DATA
// ============================================================================

#[test]
fn test_mesh_vertex_is_pod() {
    let v = vertex(1.0, 2.0, 3.0);
    let bytes: &[u8] = bytemuck::bytes_of(&v);
    assert_eq!(bytes.len(), 32);
    assert_eq!(v.position(), Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn test_render_data_rejects_out_of_range_index() {
    let result = MeshRenderData::with_single_material("M", vec![vertex(0.0, 0.0, 0.0)], vec![0, 1, 0]);
    assert!(matches!(result, Err(crate::error::Error::InvalidResource(_))));
}

#[test]
fn test_render_data_rejects_overlong_subset() {
    let subsets = vec![MaterialSubset { material: "M".to_string(), index_start: 2, index_count: 3 }];
    let result = MeshRenderData::new(
        vec![vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(0.0, 1.0, 0.0)],
        vec![0, 1, 2],
        subsets,
    );
    assert!(result.is_err());
}

#[test]
fn test_render_data_accessors() {
    let data = triangle("stone");
    assert_eq!(data.triangle_count(), 1);
    assert_eq!(data.material_subsets()[0].material, "stone");
    assert_eq!(data.material_subsets()[0].index_count, 3);
    let aabb = data.local_aabb();
    assert_eq!(aabb.min, Vec3::ZERO);
    assert_eq!(aabb.max, Vec3::new(1.0, 1.0, 0.0));
}

// ============================================================================
// STATIC MESH LOD FALLBACK
// ============================================================================

#[test]
fn test_missing_lods_fall_back_to_lod0() {
    let mesh = StaticMesh::new("tri", triangle("A"));
    for level in LodLevel::ALL {
        let data = mesh.lod(level).unwrap();
        assert_eq!(data.material_subsets()[0].material, "A");
    }
    assert!(mesh.has_lod(LodLevel::Lod0));
    assert!(!mesh.has_lod(LodLevel::Lod2));
}

#[test]
fn test_missing_lod2_falls_back_to_lod1() {
    let mesh = StaticMesh::new("tri", triangle("A")).with_lod(LodLevel::Lod1, triangle("B"));
    assert_eq!(mesh.lod(LodLevel::Lod0).unwrap().material_subsets()[0].material, "A");
    assert_eq!(mesh.lod(LodLevel::Lod1).unwrap().material_subsets()[0].material, "B");
    assert_eq!(mesh.lod(LodLevel::Lod2).unwrap().material_subsets()[0].material, "B");
}

#[test]
fn test_static_mesh_local_aabb_uses_lod0() {
    let mesh = StaticMesh::new("tri", triangle("A"));
    assert_eq!(mesh.name(), "tri");
    assert_eq!(mesh.local_aabb().max, Vec3::new(1.0, 1.0, 0.0));
}
