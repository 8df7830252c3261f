//! Pool configuration

/// Configuration for a chunk pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern byte for freed chunks (for debugging)
    ///
    /// Only the bytes after the free-list node are filled; the node itself
    /// always holds the link to the next free chunk.
    pub dealloc_pattern: Option<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
        }
    }
}

impl PoolConfig {
    /// Production configuration - no bookkeeping beyond the free list
    #[must_use]
    pub fn production() -> Self {
        Self {
            track_stats: false,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - statistics and poisoned freed chunks
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Enables or disables statistics tracking
    #[must_use = "builder methods must be chained or built"]
    pub fn with_stats(mut self, track_stats: bool) -> Self {
        self.track_stats = track_stats;
        self
    }

    /// Sets the byte written over freed chunks
    #[must_use = "builder methods must be chained or built"]
    pub fn with_dealloc_pattern(mut self, pattern: Option<u8>) -> Self {
        self.dealloc_pattern = pattern;
        self
    }
}
