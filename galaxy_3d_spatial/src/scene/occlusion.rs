//! Per-region GPU occlusion query cache.
//!
//! Regions are octree node bounds, identified by a hash of their quantized
//! coordinates so the identity survives a rebuild over the same bounds.
//! Queries are issued at most once every `query_interval` frames per region
//! and read back without blocking at the end of the frame. A region is
//! reported occluded only while its last readback is fresh and found no
//! samples above the threshold. Regions no frame has asked about for
//! `REGION_EVICTION_FACTOR` times the longer of the query interval and the
//! fallback age are dropped with their query objects.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use rustc_hash::{FxHashMap, FxHasher};
use crate::config::OcclusionConfig;
use crate::error::Result;
use crate::graphics_device::{CommandList, GraphicsDevice, OcclusionQuery};
use crate::math::AABB;

/// Quantization step of region coordinates (1 / 100 world unit)
const REGION_QUANTIZATION: f32 = 100.0;

/// Multiple of the longer of query interval and fallback age after which idle regions are evicted
const REGION_EVICTION_FACTOR: u64 = 4;

/// Stable identity of an octree region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

impl RegionId {
    pub fn from_bounds(bounds: &AABB) -> Self {
        let mut hasher = FxHasher::default();
        for value in bounds.min.to_array().into_iter().chain(bounds.max.to_array()) {
            ((value * REGION_QUANTIZATION).round() as i64).hash(&mut hasher);
        }
        RegionId(hasher.finish())
    }
}

/// Cached knowledge about a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Never queried
    Unknown,
    /// Query in flight, no result read yet
    Pending,
    Visible,
    Occluded,
}

struct RegionEntry {
    bounds: AABB,
    query: Option<Arc<dyn OcclusionQuery>>,
    visible: bool,
    pending: bool,
    last_query_frame: Option<u64>,
    last_valid_frame: Option<u64>,
    last_used_frame: u64,
}

impl RegionEntry {
    fn new(bounds: AABB, frame: u64) -> Self {
        Self {
            bounds,
            query: None,
            visible: true,
            pending: false,
            last_query_frame: None,
            last_valid_frame: None,
            last_used_frame: frame,
        }
    }
}

/// Per-frame query counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OcclusionStats {
    pub queries_issued: u32,
    pub results_read: u32,
    pub results_pending: u32,
    pub regions_evicted: u32,
}

pub struct OcclusionCache {
    config: OcclusionConfig,
    regions: FxHashMap<RegionId, RegionEntry>,
    frame: u64,
    stats: OcclusionStats,
}

impl OcclusionCache {
    pub fn new(config: OcclusionConfig) -> Self {
        Self {
            config,
            regions: FxHashMap::default(),
            frame: 0,
            stats: OcclusionStats::default(),
        }
    }

    pub fn config(&self) -> &OcclusionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OcclusionConfig) {
        self.config = config;
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Current frame number (0 before the first `begin_frame`)
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stats(&self) -> OcclusionStats {
        self.stats
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Advance the frame counter and reset the per-frame counters
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        self.stats = OcclusionStats::default();
    }

    /// Issue a query for `id` if it is due
    ///
    /// The query object is created on first use. Issuing brackets
    /// `draw_proxy` (which draws a cheap stand-in of `bounds`) with
    /// begin/end query commands. Returns whether a query was recorded;
    /// failing to create a query object is logged and yields `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Command recording errors from `cmd` or `draw_proxy`.
    pub fn query_region(
        &mut self,
        id: RegionId,
        bounds: &AABB,
        device: &mut dyn GraphicsDevice,
        cmd: &mut dyn CommandList,
        draw_proxy: &mut dyn FnMut(&AABB, &mut dyn CommandList) -> Result<()>,
    ) -> Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }

        let frame = self.frame;
        let interval = self.config.query_interval;
        let entry = self.regions.entry(id).or_insert_with(|| RegionEntry::new(*bounds, frame));
        entry.bounds = *bounds;
        entry.last_used_frame = frame;

        let due = entry.last_query_frame.map_or(true, |last| frame.saturating_sub(last) >= interval);
        if !due {
            return Ok(false);
        }

        let query = match &entry.query {
            Some(query) => query.clone(),
            None => match device.create_occlusion_query() {
                Ok(query) => {
                    entry.query = Some(query.clone());
                    query
                }
                Err(err) => {
                    crate::engine_error!("galaxy3d::OcclusionCache",
                        "Occlusion query creation failed for region {:?}: {}", id, err);
                    return Ok(false);
                }
            },
        };

        cmd.begin_occlusion_query(&query)?;
        draw_proxy(bounds, cmd)?;
        cmd.end_occlusion_query(&query)?;

        entry.pending = true;
        entry.last_query_frame = Some(frame);
        self.stats.queries_issued += 1;
        Ok(true)
    }

    /// Read back every pending query without blocking, then evict idle regions
    pub fn end_frame(&mut self) {
        let threshold = self.config.sample_threshold;
        for entry in self.regions.values_mut().filter(|e| e.pending) {
            let samples = entry.query.as_ref().and_then(|q| q.try_read_samples());
            match samples {
                Some(samples) => {
                    entry.visible = samples > threshold;
                    entry.pending = false;
                    entry.last_valid_frame = Some(self.frame);
                    self.stats.results_read += 1;
                }
                None => self.stats.results_pending += 1,
            }
        }

        let frame = self.frame;
        let max_idle = REGION_EVICTION_FACTOR * self.config.query_interval.max(self.config.fallback_max_age);
        let before = self.regions.len();
        self.regions.retain(|_, entry| frame.saturating_sub(entry.last_used_frame) <= max_idle);
        let evicted = (before - self.regions.len()) as u32;
        if evicted > 0 {
            self.stats.regions_evicted += evicted;
            crate::engine_debug!("galaxy3d::OcclusionCache",
                "Frame {}: evicted {} idle regions, {} left", frame, evicted, self.regions.len());
        }

        crate::engine_trace!("galaxy3d::OcclusionCache",
            "Frame {}: {} issued, {} read, {} pending",
            self.frame, self.stats.queries_issued, self.stats.results_read, self.stats.results_pending);
    }

    /// Whether a region must be drawn
    ///
    /// True when the cache is disabled, the region has no result yet, or its
    /// last result is older than `fallback_max_age` frames.
    pub fn is_region_visible(&self, id: RegionId) -> bool {
        if !self.config.enabled {
            return true;
        }
        let Some(entry) = self.regions.get(&id) else {
            return true;
        };
        match entry.last_valid_frame {
            Some(valid) if self.frame.saturating_sub(valid) <= self.config.fallback_max_age => entry.visible,
            _ => true,
        }
    }

    pub fn region_state(&self, id: RegionId) -> RegionState {
        match self.regions.get(&id) {
            None => RegionState::Unknown,
            Some(entry) if entry.last_valid_frame.is_none() => {
                if entry.pending { RegionState::Pending } else { RegionState::Unknown }
            }
            Some(entry) if entry.visible => RegionState::Visible,
            Some(_) => RegionState::Occluded,
        }
    }

    /// Bounds last registered for `id`
    pub fn region_bounds(&self, id: RegionId) -> Option<AABB> {
        self.regions.get(&id).map(|e| e.bounds)
    }

    pub fn forget_region(&mut self, id: RegionId) -> bool {
        self.regions.remove(&id).is_some()
    }

    /// Drop every region and its query object
    pub fn clear(&mut self) {
        self.regions.clear();
    }
}

#[cfg(test)]
#[path = "occlusion_tests.rs"]
mod tests;
