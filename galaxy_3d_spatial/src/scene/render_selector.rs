/// Per-frame render selection over a batched octree.
///
/// `select` walks the tree with tri-state frustum culling and the occlusion
/// cache and picks whole nodes as drawable units, each with a LOD chosen by
/// camera distance. `build_draw_list` expands the units into one draw
/// command per material and sorts them by (material, LOD) so `submit` binds
/// every shared buffer pair once per frame.

use glam::Vec3;
use rdst::{RadixKey, RadixSort};
use crate::config::{LodConfig, OctreeConfig, SpatialConfig};
use crate::error::Result;
use crate::graphics_device::{CommandList, IndexType};
use crate::math::{Frustum, FrustumContainment};
use crate::primitive::LodLevel;
use super::batch_compiler::{DrawRange, MaterialId};
use super::occlusion::{OcclusionCache, RegionId};
use super::octree::{NodeId, Octree, ROOT};

/// A node drawn as a whole at one LOD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawUnit {
    pub node: NodeId,
    pub lod: LodLevel,
}

/// Result of one selection pass
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub units: Vec<DrawUnit>,
    /// Regions to (re)query this frame: drawable nodes, occluded or drawn
    pub query_candidates: Vec<(RegionId, NodeId)>,
    pub nodes_visited: u32,
    pub culled_frustum: u32,
    pub culled_occlusion: u32,
}

/// One indexed draw of a node's range in a shared material/LOD buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    pub material: MaterialId,
    pub lod: LodLevel,
    pub node: NodeId,
    pub range: DrawRange,
}

impl DrawCommand {
    /// Material in the high bits, then LOD, then node id
    pub fn sort_key(&self) -> u64 {
        ((self.material.0 as u64) << 40) | ((self.lod.index() as u64) << 32) | (self.node as u32 as u64)
    }
}

impl RadixKey for DrawCommand {
    const LEVELS: usize = 8;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.sort_key() >> (level * 8)) as u8
    }
}

/// Counters of one `submit`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitStats {
    pub buffer_binds: u32,
    pub draw_calls: u32,
    pub indices_drawn: u64,
}

// ============================================================================
// SELECTION
// ============================================================================

/// Choose the nodes to draw this frame
///
/// A node is a candidate when the frustum contains it, when it reaches
/// `max_render_depth`, or when it is a leaf. Candidates reported occluded
/// are pruned but still reported as query candidates; the others are
/// emitted once at or below `min_render_depth` (leaves at any depth).
/// Nodes without batch data emit nothing.
///
/// The draw band comes from `config.octree` and the LOD thresholds from
/// `config.lod`; the settings the octree was built with are not consulted.
pub fn select(
    octree: &Octree,
    frustum: &Frustum,
    camera_position: Vec3,
    occlusion: &OcclusionCache,
    config: &SpatialConfig,
) -> Selection {
    let mut selection = Selection::default();
    select_node(octree, ROOT, frustum, camera_position, occlusion, &config.octree, &config.lod, &mut selection);
    selection
}

fn select_node(
    octree: &Octree,
    node_id: NodeId,
    frustum: &Frustum,
    camera_position: Vec3,
    occlusion: &OcclusionCache,
    band: &OctreeConfig,
    lod: &LodConfig,
    selection: &mut Selection,
) {
    let node = &octree.nodes[node_id];
    selection.nodes_visited += 1;

    let containment = frustum.check_containment(&node.bounds);
    if containment == FrustumContainment::Outside {
        selection.culled_frustum += 1;
        return;
    }

    let candidate = containment == FrustumContainment::Contains
        || node.depth >= band.max_render_depth
        || node.is_leaf();

    if candidate {
        let region = node.region_id();
        let drawable = (node.depth >= band.min_render_depth || node.is_leaf()) && !node.batch.is_empty();
        if !occlusion.is_region_visible(region) {
            // Still re-queried
            if drawable {
                selection.query_candidates.push((region, node_id));
            }
            selection.culled_occlusion += 1;
            return;
        }
        if node.depth >= band.min_render_depth || node.is_leaf() {
            if drawable {
                let distance = camera_position.distance(node.bounds.center());
                selection.units.push(DrawUnit { node: node_id, lod: lod.select_lod(distance) });
                selection.query_candidates.push((region, node_id));
            }
            return;
        }
    }

    if let Some(children) = node.children {
        for child in children {
            select_node(octree, child, frustum, camera_position, occlusion, band, lod, selection);
        }
    }
}

// ============================================================================
// DRAW LIST
// ============================================================================

/// Expand units into draw commands sorted by (material, LOD, node)
///
/// Empty ranges and batches without GPU buffers are skipped.
pub fn build_draw_list(octree: &Octree, units: &[DrawUnit]) -> Vec<DrawCommand> {
    let root = octree.batch_root();
    let mut commands = Vec::with_capacity(units.len());

    for unit in units {
        let Some(node) = octree.node(unit.node) else {
            continue;
        };
        for (material, ranges) in node.batch.iter() {
            let range = ranges[unit.lod.index()];
            if range.is_empty() {
                continue;
            }
            let ready = root.lod_batch(material, unit.lod).is_some_and(|b| b.has_buffers());
            if !ready {
                continue;
            }
            commands.push(DrawCommand { material, lod: unit.lod, node: unit.node, range });
        }
    }

    commands.radix_sort_unstable();
    commands
}

/// Record binds and draws for a sorted command list
///
/// Material and buffers are bound once per (material, LOD) group.
///
/// # Errors
///
/// The first command recording error.
pub fn submit(octree: &Octree, commands: &[DrawCommand], cmd: &mut dyn CommandList) -> Result<SubmitStats> {
    let root = octree.batch_root();
    let mut stats = SubmitStats::default();
    let mut bound: Option<(MaterialId, LodLevel)> = None;

    for command in commands {
        let group = (command.material, command.lod);
        if bound != Some(group) {
            let Some(batch) = root.lod_batch(command.material, command.lod) else {
                continue;
            };
            let (Some(vertex_buffer), Some(index_buffer)) = (batch.vertex_buffer(), batch.index_buffer()) else {
                continue;
            };
            cmd.bind_material(root.material_name(command.material).unwrap_or_default())?;
            cmd.bind_vertex_buffer(vertex_buffer, 0)?;
            cmd.bind_index_buffer(index_buffer, 0, IndexType::U32)?;
            stats.buffer_binds += 1;
            bound = Some(group);
        }

        cmd.draw_indexed(command.range.index_count, command.range.index_start, 0)?;
        stats.draw_calls += 1;
        stats.indices_drawn += command.range.index_count as u64;
    }

    Ok(stats)
}

#[cfg(test)]
#[path = "render_selector_tests.rs"]
mod tests;
