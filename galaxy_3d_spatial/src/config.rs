//! Tunables for the spatial core
//!
//! All values travel explicitly: `Octree::new` takes an `OctreeConfig`, the
//! renderer takes a `SpatialConfig`, and the occlusion cache takes an
//! `OcclusionConfig`. Several scenes can run side by side with independent
//! settings.

use crate::error::{Error, Result};
use crate::primitive::LodLevel;

/// Raycast strategy used by `Octree::raycast`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaycastStrategy {
    /// Walk the octree and sphere-test overlapping primitives at leaves
    Octree,
    /// Descend to the KD cutoff depth and delegate to the node's KD tree
    Kd,
}

/// Octree build and traversal settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    /// Depth at which `insert` stops splitting
    pub max_insert_depth: u32,
    /// Shallowest depth a node may be drawn as one unit
    pub min_render_depth: u32,
    /// Depth at which intersecting nodes are accepted without further recursion
    pub max_render_depth: u32,
    /// Depth at which KD trees are built and raycasts delegate to them
    pub kd_cutoff_depth: u32,
    /// Picking strategy
    pub raycast_strategy: RaycastStrategy,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_insert_depth: 5,
            min_render_depth: 1,
            max_render_depth: 2,
            kd_cutoff_depth: 4,
            raycast_strategy: RaycastStrategy::Kd,
        }
    }
}

/// Camera distance thresholds for LOD selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodConfig {
    /// Below this distance LOD0 is used
    pub near_distance: f32,
    /// At or beyond this distance LOD2 is used
    pub far_distance: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            near_distance: 30.0,
            far_distance: 60.0,
        }
    }
}

impl LodConfig {
    /// Pick the LOD level for a node whose center is `distance` away from the camera
    pub fn select_lod(&self, distance: f32) -> LodLevel {
        if distance < self.near_distance {
            LodLevel::Lod0
        } else if distance < self.far_distance {
            LodLevel::Lod1
        } else {
            LodLevel::Lod2
        }
    }
}

/// Occlusion query cache settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionConfig {
    /// When false every region is treated as visible and no query is issued
    pub enabled: bool,
    /// Frames between two queries of the same region
    pub query_interval: u64,
    /// Frames after which a cached result is ignored and the region assumed visible
    pub fallback_max_age: u64,
    /// A region is visible when its sample count is strictly above this value
    pub sample_threshold: u64,
}

impl Default for OcclusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query_interval: 4,
            fallback_max_age: 10,
            sample_threshold: 0,
        }
    }
}

/// Complete spatial core configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpatialConfig {
    pub octree: OctreeConfig,
    pub lod: LodConfig,
    pub occlusion: OcclusionConfig,
}

impl SpatialConfig {
    /// Check every constraint between the tunables
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` naming the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let octree = &self.octree;
        if octree.min_render_depth > octree.max_render_depth {
            return Err(Error::InvalidConfig(format!(
                "min_render_depth ({}) > max_render_depth ({})",
                octree.min_render_depth, octree.max_render_depth
            )));
        }
        if octree.max_render_depth > octree.max_insert_depth {
            return Err(Error::InvalidConfig(format!(
                "max_render_depth ({}) > max_insert_depth ({})",
                octree.max_render_depth, octree.max_insert_depth
            )));
        }
        if self.occlusion.query_interval == 0 {
            return Err(Error::InvalidConfig("query_interval must be at least 1".to_string()));
        }
        let lod = &self.lod;
        if !(lod.near_distance >= 0.0 && lod.near_distance < lod.far_distance) {
            return Err(Error::InvalidConfig(format!(
                "LOD distances must ascend: near {} far {}",
                lod.near_distance, lod.far_distance
            )));
        }
        Ok(())
    }

    /// Return a copy with every violated constraint repaired
    ///
    /// Each repair is logged at WARN severity.
    pub fn sanitized(&self) -> Self {
        let mut config = *self;
        config.octree = config.octree.sanitized();

        if config.occlusion.query_interval == 0 {
            crate::engine_warn!("galaxy3d::Config", "query_interval 0 clamped to 1");
            config.occlusion.query_interval = 1;
        }

        let lod = &mut config.lod;
        if !(lod.near_distance >= 0.0) {
            crate::engine_warn!("galaxy3d::Config",
                "near_distance {} clamped to 0", lod.near_distance);
            lod.near_distance = 0.0;
        }
        if lod.far_distance < lod.near_distance {
            crate::engine_warn!("galaxy3d::Config",
                "LOD distances swapped (near {} far {})", lod.near_distance, lod.far_distance);
            std::mem::swap(&mut lod.near_distance, &mut lod.far_distance);
        }
        config
    }
}

impl OctreeConfig {
    /// Return a copy with the draw band ordered and inside the insert depth
    pub fn sanitized(&self) -> Self {
        let mut config = *self;
        if config.min_render_depth > config.max_render_depth {
            crate::engine_warn!("galaxy3d::Config",
                "draw band {}..={} inverted, swapping",
                config.min_render_depth, config.max_render_depth);
            std::mem::swap(&mut config.min_render_depth, &mut config.max_render_depth);
        }
        if config.max_render_depth > config.max_insert_depth {
            crate::engine_warn!("galaxy3d::Config",
                "max_render_depth {} clamped to max_insert_depth {}",
                config.max_render_depth, config.max_insert_depth);
            config.max_render_depth = config.max_insert_depth;
            config.min_render_depth = config.min_render_depth.min(config.max_render_depth);
        }
        config
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
