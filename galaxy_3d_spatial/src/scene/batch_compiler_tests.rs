use std::sync::Arc;
use glam::{Mat4, Vec3};
use super::*;
use crate::config::OctreeConfig;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::math::AABB;
use crate::primitive::{MaterialSubset, Primitive, PrimitiveStore, Renderable, StaticMesh};

// ============================================================================
// TEST HELPERS
// ============================================================================

fn quad_vertices() -> Vec<MeshVertex> {
    [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
        .iter()
        .map(|&(x, y)| MeshVertex::new(Vec3::new(x, y, 0.0), Vec3::Z, [0.0, 0.0]))
        .collect()
}

/// Two-triangle quad drawn with material `M`
fn quad_mesh() -> Arc<StaticMesh> {
    let data = MeshRenderData::with_single_material("M", quad_vertices(), vec![0, 1, 2, 0, 2, 3]).unwrap();
    Arc::new(StaticMesh::new("quad", data))
}

/// Quad whose triangles use `A` and `B`, with a one-triangle LOD1 in `A`
fn two_material_mesh() -> Arc<StaticMesh> {
    let subsets = vec![
        MaterialSubset { material: "B".to_string(), index_start: 0, index_count: 3 },
        MaterialSubset { material: "A".to_string(), index_start: 3, index_count: 3 },
    ];
    let lod0 = MeshRenderData::new(quad_vertices(), vec![0, 1, 2, 0, 2, 3], subsets).unwrap();
    let lod1 = MeshRenderData::with_single_material("A", quad_vertices(), vec![0, 1, 2]).unwrap();
    Arc::new(StaticMesh::new("split", lod0).with_lod(LodLevel::Lod1, lod1))
}

fn add(store: &mut PrimitiveStore, mesh: &Arc<StaticMesh>, position: Vec3) -> PrimitiveKey {
    store.insert(Primitive::from_mesh("quad", mesh.clone(), Mat4::from_translation(position)))
}

fn config() -> OctreeConfig {
    OctreeConfig { max_insert_depth: 3, ..OctreeConfig::default() }
}

/// Fitted, built and compiled octree (no GPU buffers)
fn compiled(store: &mut PrimitiveStore) -> Octree {
    let mut octree = Octree::new(AABB::default(), config());
    octree.fit_bounds(store);
    octree.build(store);
    octree.build_batch_render_data(&*store);
    octree.assign_all_draw_ranges();
    octree
}

fn scattered(store: &mut PrimitiveStore, mesh: &Arc<StaticMesh>) {
    for position in [
        Vec3::new(-5.0, -5.0, -5.0),
        Vec3::new(5.0, -5.0, 3.0),
        Vec3::new(-3.0, 4.0, 5.0),
        Vec3::new(5.0, 5.0, -5.0),
        Vec3::new(4.0, 4.0, 4.0),
        Vec3::new(-4.0, -3.0, 2.0),
    ] {
        add(store, mesh, position);
    }
}

fn assert_tiled(octree: &Octree, node_id: NodeId, material: MaterialId, lod: LodLevel) {
    let node = octree.node(node_id).unwrap();
    let range = node.batch().draw_range(material, lod);
    let Some(children) = node.children() else {
        return;
    };
    let mut cursor = range.index_start;
    for &child in children {
        let child_range = octree.node(child).unwrap().batch().draw_range(material, lod);
        if !child_range.is_empty() {
            assert_eq!(child_range.index_start, cursor, "child {} of node {}", child, node_id);
        }
        cursor += child_range.index_count;
        assert_tiled(octree, child, material, lod);
    }
    assert!(cursor <= range.end());
}

// ============================================================================
// ACCUMULATION
// ============================================================================

#[test]
fn test_root_range_covers_everything() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    let octree = compiled(&mut store);

    let material = octree.batch_root().material_id("M").unwrap();
    for lod in LodLevel::ALL {
        let range = octree.root().batch().draw_range(material, lod);
        assert_eq!(range, DrawRange { index_start: 0, index_count: 36 });
        assert_eq!(octree.batch_root().lod_batch(material, lod).unwrap().index_count(), 36);
    }
}

#[test]
fn test_vertices_deduplicated_and_renumbered() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    let octree = compiled(&mut store);

    let material = octree.batch_root().material_id("M").unwrap();
    let batch = octree.batch_root().lod_batch(material, LodLevel::Lod0).unwrap();
    assert_eq!(batch.vertex_count(), 24);
    assert_eq!(batch.vertices().len(), 24);

    let mut bases: Vec<u32> = batch
        .indices()
        .chunks_exact(6)
        .map(|quad| {
            let b = quad[0];
            assert_eq!(quad, &[b, b + 1, b + 2, b, b + 2, b + 3]);
            b
        })
        .collect();
    bases.sort_unstable();
    assert_eq!(bases, vec![0, 4, 8, 12, 16, 20]);
}

#[test]
fn test_vertices_in_world_space() {
    let mut store = PrimitiveStore::new();
    add(&mut store, &quad_mesh(), Vec3::new(10.0, 0.0, 0.0));
    let octree = compiled(&mut store);

    let material = octree.batch_root().material_id("M").unwrap();
    let batch = octree.batch_root().lod_batch(material, LodLevel::Lod0).unwrap();
    for vertex in batch.vertices() {
        assert!(vertex.position[0] == 9.0 || vertex.position[0] == 11.0);
    }
    assert_eq!(batch.vertices()[0].normal, [0.0, 0.0, 1.0]);
}

#[test]
fn test_invisible_primitives_skipped() {
    let mut store = PrimitiveStore::new();
    let mesh = quad_mesh();
    add(&mut store, &mesh, Vec3::new(-5.0, 0.0, 0.0));
    let hidden = add(&mut store, &mesh, Vec3::new(5.0, 0.0, 0.0));
    store.get_mut(hidden).unwrap().set_flags(PrimitiveFlags::PICKABLE);
    let octree = compiled(&mut store);

    let material = octree.batch_root().material_id("M").unwrap();
    assert_eq!(octree.root().batch().draw_range(material, LodLevel::Lod0).index_count, 6);
}

#[test]
fn test_bounds_only_primitives_contribute_nothing() {
    let mut store = PrimitiveStore::new();
    store.insert(Primitive::from_bounds("b", AABB::default(), Mat4::IDENTITY));
    let octree = compiled(&mut store);

    assert_eq!(octree.batch_root().material_count(), 0);
    assert!(octree.root().batch().is_empty());
}

#[test]
fn test_materials_and_lods_kept_apart() {
    let mut store = PrimitiveStore::new();
    let mesh = two_material_mesh();
    add(&mut store, &mesh, Vec3::new(-5.0, 0.0, 0.0));
    add(&mut store, &mesh, Vec3::new(5.0, 0.0, 0.0));
    let octree = compiled(&mut store);
    let root = octree.batch_root();

    assert_eq!(root.material_count(), 2);
    let names: Vec<&str> = root.materials().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["A", "B"]);

    let a = root.material_id("A").unwrap();
    let b = root.material_id("B").unwrap();
    assert_eq!(root.material_name(b), Some("B"));

    let ranges = octree.root().batch();
    assert_eq!(ranges.draw_range(a, LodLevel::Lod0).index_count, 6);
    assert_eq!(ranges.draw_range(b, LodLevel::Lod0).index_count, 6);
    // LOD1 only draws A; LOD2 falls back to LOD1
    assert_eq!(ranges.draw_range(a, LodLevel::Lod1).index_count, 6);
    assert_eq!(ranges.draw_range(b, LodLevel::Lod1).index_count, 0);
    assert_eq!(ranges.draw_range(a, LodLevel::Lod2).index_count, 6);

    // Only the three vertices a subset references are stored
    assert_eq!(root.lod_batch(b, LodLevel::Lod0).unwrap().vertex_count(), 6);
}

#[test]
fn test_rebuild_replaces_batches() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    let mut octree = compiled(&mut store);

    octree.build_batch_render_data(&store);
    octree.assign_all_draw_ranges();

    let material = octree.batch_root().material_id("M").unwrap();
    assert_eq!(octree.root().batch().draw_range(material, LodLevel::Lod0).index_count, 36);
}

// ============================================================================
// DRAW RANGES
// ============================================================================

#[test]
fn test_children_tile_parent_range() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    scattered(&mut store, &two_material_mesh());
    let octree = compiled(&mut store);

    for (_, material) in octree.batch_root().materials() {
        for lod in LodLevel::ALL {
            assert_tiled(&octree, ROOT, material, lod);
        }
    }
}

/// Triangle fan of `triangles` triangles drawn with material `M`
fn fan_mesh(triangles: u32) -> Arc<StaticMesh> {
    let mut vertices = vec![MeshVertex::new(Vec3::ZERO, Vec3::Z, [0.0, 0.0])];
    for i in 0..=triangles {
        let angle = i as f32 * std::f32::consts::PI / triangles as f32;
        vertices.push(MeshVertex::new(Vec3::new(angle.cos(), angle.sin(), 0.0), Vec3::Z, [0.0, 0.0]));
    }
    let indices = (0..triangles).flat_map(|i| [0, i + 1, i + 2]).collect();
    let data = MeshRenderData::with_single_material("M", vertices, indices).unwrap();
    Arc::new(StaticMesh::new("fan", data))
}

#[test]
fn test_three_and_five_triangles_share_one_material_array() {
    let mut store = PrimitiveStore::new();
    let first = add(&mut store, &fan_mesh(3), Vec3::new(-5.0, -5.0, -5.0));
    let second = add(&mut store, &fan_mesh(5), Vec3::new(5.0, 5.0, 5.0));
    let octree = compiled(&mut store);
    let material = octree.batch_root().material_id("M").unwrap();

    assert_eq!(octree.batch_root().material_count(), 1);
    assert_eq!(octree.batch_root().lod_batch(material, LodLevel::Lod0).unwrap().index_count(), 24);

    let leaf_range = |key: PrimitiveKey| {
        let node = octree.node(octree.location(key).unwrap()).unwrap();
        assert!(node.is_leaf());
        node.batch().draw_range(material, LodLevel::Lod0)
    };
    assert_eq!(leaf_range(first), DrawRange { index_start: 0, index_count: 9 });
    assert_eq!(leaf_range(second), DrawRange { index_start: 9, index_count: 15 });
}

#[test]
fn test_leaf_range_holds_its_primitive() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    let octree = compiled(&mut store);
    let material = octree.batch_root().material_id("M").unwrap();
    let batch = octree.batch_root().lod_batch(material, LodLevel::Lod0).unwrap();

    for (key, primitive) in store.iter() {
        let node = octree.node(octree.location(key).unwrap()).unwrap();
        let range = node.batch().draw_range(material, LodLevel::Lod0);
        assert_eq!(range.index_count, 6);

        let world = primitive.world_aabb();
        for &index in &batch.indices()[range.index_start as usize..range.end() as usize] {
            assert!(world.contains_point(batch.vertices()[index as usize].position()));
        }
    }
}

#[test]
fn test_own_components_take_range_tail() {
    let mut store = PrimitiveStore::new();
    let mesh = quad_mesh();
    add(&mut store, &mesh, Vec3::new(2.0, 2.0, 0.0));
    add(&mut store, &mesh, Vec3::new(50.0, 0.0, 0.0));

    // Fixed bounds: the second quad stays on the root
    let mut octree = Octree::new(AABB::new(Vec3::splat(-8.0), Vec3::splat(8.0)), config());
    octree.build(&mut store);
    octree.build_batch_render_data(&store);
    octree.assign_all_draw_ranges();

    let material = octree.batch_root().material_id("M").unwrap();
    let root_range = octree.root().batch().draw_range(material, LodLevel::Lod0);
    assert_eq!(root_range.index_count, 12);

    let batch = octree.batch_root().lod_batch(material, LodLevel::Lod0).unwrap();
    for &index in &batch.indices()[6..12] {
        assert!(batch.vertices()[index as usize].position[0] >= 49.0);
    }
}

#[test]
fn test_dump_draw_ranges() {
    let mut store = PrimitiveStore::new();
    add(&mut store, &quad_mesh(), Vec3::new(-5.0, 0.0, 0.0));
    add(&mut store, &quad_mesh(), Vec3::new(5.0, 0.0, 0.0));
    let octree = compiled(&mut store);

    let dump = octree.dump_draw_ranges(0);
    assert!(dump.contains("node 0 depth 0 'M' LOD0 [0, 12)"));
    assert_eq!(dump.lines().count(), 3);

    let deeper = octree.dump_draw_ranges(1);
    assert!(deeper.lines().count() > 3);
}

// ============================================================================
// GPU BUFFERS
// ============================================================================

#[test]
fn test_build_batch_buffers_uploads_geometry() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    let mut octree = compiled(&mut store);
    let mut device = MockGraphicsDevice::new();

    let material = octree.batch_root().material_id("M").unwrap();
    let expected = octree.batch_root().lod_batch(material, LodLevel::Lod0).unwrap().indices().to_vec();

    assert_eq!(octree.build_batch_buffers(&mut device), 3);
    assert!(!octree.batch_root().has_pending_buffers());

    let index_buffers = device.buffers_of(BufferUsage::Index);
    assert_eq!(index_buffers.len(), 3);
    assert_eq!(index_buffers[0].as_u32(), expected);
    let vertex_buffers = device.buffers_of(BufferUsage::Vertex);
    assert_eq!(vertex_buffers[0].size, 24 * std::mem::size_of::<MeshVertex>() as u64);

    // Already built
    assert_eq!(octree.build_batch_buffers(&mut device), 0);
    assert_eq!(device.buffers.len(), 6);
}

#[test]
fn test_clear_batch_datas_keeps_counts() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    let mut octree = compiled(&mut store);
    let mut device = MockGraphicsDevice::new();
    octree.build_batch_buffers(&mut device);

    octree.clear_batch_datas();

    let material = octree.batch_root().material_id("M").unwrap();
    let batch = octree.batch_root().lod_batch(material, LodLevel::Lod0).unwrap();
    assert!(batch.indices().is_empty());
    assert!(batch.vertices().is_empty());
    assert_eq!(batch.index_count(), 36);
    assert!(batch.has_buffers());
}

#[test]
fn test_failed_buffers_retried_later() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    let mut octree = compiled(&mut store);
    let mut device = MockGraphicsDevice::new();
    device.fail_usage = Some(BufferUsage::Index);

    assert_eq!(octree.build_batch_buffers(&mut device), 0);
    assert!(octree.batch_root().has_pending_buffers());

    // CPU data survives while buffers are missing
    octree.clear_batch_datas();
    let material = octree.batch_root().material_id("M").unwrap();
    assert_eq!(octree.batch_root().lod_batch(material, LodLevel::Lod0).unwrap().indices().len(), 36);

    device.fail_usage = None;
    assert_eq!(octree.build_batch_buffers(&mut device), 3);
    assert!(!octree.batch_root().has_pending_buffers());
    // Vertex buffers from the first attempt are reused
    assert_eq!(device.buffers_of(BufferUsage::Vertex).len(), 3);
}

#[test]
fn test_empty_tree_has_no_batches() {
    let mut store = PrimitiveStore::new();
    let mut octree = compiled(&mut store);
    let mut device = MockGraphicsDevice::new();

    assert_eq!(octree.batch_root().material_count(), 0);
    assert!(!octree.batch_root().has_pending_buffers());
    assert_eq!(octree.build_batch_buffers(&mut device), 0);
    assert!(octree.dump_draw_ranges(8).is_empty());
}

#[test]
fn test_build_full_releases_cpu_data() {
    let mut store = PrimitiveStore::new();
    scattered(&mut store, &quad_mesh());
    let mut octree = Octree::new(AABB::default(), config());
    let mut device = MockGraphicsDevice::new();

    octree.build_full(&mut store, &mut device);

    let material = octree.batch_root().material_id("M").unwrap();
    let batch = octree.batch_root().lod_batch(material, LodLevel::Lod1).unwrap();
    assert!(batch.has_buffers());
    assert!(batch.indices().is_empty());
    assert_eq!(octree.root().batch().draw_range(material, LodLevel::Lod1).index_count, 36);
    assert!(octree.nodes().iter().any(|n| n.kd_tree().is_some()));
}
