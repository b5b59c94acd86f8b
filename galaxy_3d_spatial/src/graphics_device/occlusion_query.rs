/// Hardware occlusion query handle

/// A GPU sample-count query
///
/// Recorded between `CommandList::begin_occlusion_query` and
/// `CommandList::end_occlusion_query`. Results arrive frames later.
pub trait OcclusionQuery: Send + Sync {
    /// Non-blocking readback of the number of samples that passed
    ///
    /// Returns `None` while the GPU has not produced the result yet.
    fn try_read_samples(&self) -> Option<u64>;
}
