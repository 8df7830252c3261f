//! Pool statistics

/// Snapshot of pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Successful allocations performed
    pub total_allocs: u64,
    /// Chunks returned through `free`
    pub total_frees: u64,
    /// Allocations refused because the pool was exhausted
    pub failed_allocs: u64,
    /// Frees rejected by the bounds check
    pub rejected_frees: u64,
    /// Highest number of chunks allocated at the same time
    pub peak_allocated: usize,
    /// Currently allocated chunks
    pub allocated_chunks: usize,
    /// Currently free chunks
    pub free_chunks: usize,
    /// Size of each chunk in bytes
    pub chunk_size: usize,
    /// Total number of chunks
    pub chunk_count: usize,
}

impl PoolStats {
    /// Fraction of chunks currently allocated, in `0.0..=1.0`
    pub fn utilization(&self) -> f64 {
        if self.chunk_count == 0 {
            0.0
        } else {
            self.allocated_chunks as f64 / self.chunk_count as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) total_allocs: u64,
    pub(crate) total_frees: u64,
    pub(crate) failed_allocs: u64,
    pub(crate) rejected_frees: u64,
    pub(crate) peak_allocated: usize,
}
