/// Frame entry point: culling, LOD selection, batched draws and occlusion queries.

use glam::{Mat4, Vec3};
use crate::config::SpatialConfig;
use crate::error::Result;
use crate::graphics_device::{CommandList, GraphicsDevice};
use crate::math::{AABB, Frustum};
use super::occlusion::OcclusionCache;
use super::octree::Octree;
use super::render_selector::{build_draw_list, select, submit};

/// Counters of one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub nodes_visited: u32,
    pub nodes_culled_frustum: u32,
    pub nodes_culled_occlusion: u32,
    pub drawable_units: u32,
    pub buffer_binds: u32,
    pub draw_calls: u32,
    pub indices_drawn: u64,
    pub queries_issued: u32,
}

/// Renders a batched octree frame after frame
///
/// Owns the occlusion cache, so visibility history survives octree rebuilds
/// over the same region bounds.
pub struct OctreeRenderer {
    config: SpatialConfig,
    occlusion: OcclusionCache,
}

impl OctreeRenderer {
    /// The configuration is sanitized (see `SpatialConfig::sanitized`).
    pub fn new(config: SpatialConfig) -> Self {
        let config = config.sanitized();
        Self {
            config,
            occlusion: OcclusionCache::new(config.occlusion),
        }
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Replace the draw band, LOD and occlusion settings, keeping the cached regions
    pub fn set_config(&mut self, config: SpatialConfig) {
        self.config = config.sanitized();
        self.occlusion.set_config(self.config.occlusion);
    }

    pub fn occlusion(&self) -> &OcclusionCache {
        &self.occlusion
    }

    pub fn occlusion_mut(&mut self) -> &mut OcclusionCache {
        &mut self.occlusion
    }

    /// Render one frame of `octree` seen through `view_projection`
    ///
    /// Batches still lacking GPU buffers are retried first. Visible units are
    /// drawn sorted by (material, LOD); then occlusion queries are issued for
    /// the drawn regions, `draw_proxy` rasterizing each region's bounds inside
    /// the query bracket. Results are read back at the end of the frame
    /// without blocking.
    ///
    /// # Errors
    ///
    /// Command recording errors. The frame's occlusion readback is skipped.
    pub fn render(
        &mut self,
        octree: &mut Octree,
        view_projection: &Mat4,
        camera_position: Vec3,
        device: &mut dyn GraphicsDevice,
        cmd: &mut dyn CommandList,
        draw_proxy: &mut dyn FnMut(&AABB, &mut dyn CommandList) -> Result<()>,
    ) -> Result<RenderStats> {
        self.occlusion.begin_frame();

        if octree.batch_root().has_pending_buffers() {
            octree.build_batch_buffers(device);
            octree.clear_batch_datas();
        }

        let frustum = Frustum::from_view_projection(view_projection);
        let selection = select(octree, &frustum, camera_position, &self.occlusion, &self.config);
        let commands = build_draw_list(octree, &selection.units);
        let submitted = submit(octree, &commands, cmd)?;

        if self.occlusion.is_enabled() {
            for &(region, node_id) in &selection.query_candidates {
                let bounds = octree.nodes[node_id].bounds;
                self.occlusion.query_region(region, &bounds, device, cmd, draw_proxy)?;
            }
        }

        self.occlusion.end_frame();

        let stats = RenderStats {
            nodes_visited: selection.nodes_visited,
            nodes_culled_frustum: selection.culled_frustum,
            nodes_culled_occlusion: selection.culled_occlusion,
            drawable_units: selection.units.len() as u32,
            buffer_binds: submitted.buffer_binds,
            draw_calls: submitted.draw_calls,
            indices_drawn: submitted.indices_drawn,
            queries_issued: self.occlusion.stats().queries_issued,
        };
        crate::engine_trace!("galaxy3d::OctreeRenderer",
            "Frame {}: {} units, {} draws, {} culled (frustum), {} culled (occlusion)",
            self.occlusion.frame(), stats.drawable_units, stats.draw_calls,
            stats.nodes_culled_frustum, stats.nodes_culled_occlusion);
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "octree_renderer_tests.rs"]
mod tests;
