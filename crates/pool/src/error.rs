//! Error types for chunk-pool
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.
//!
//! Errors fall into two groups:
//! - construction errors (`InvalidAlignment`, `ChunkTooSmall`, `BufferTooSmall`,
//!   `SizeOverflow`, `InvalidLayout`) mean the caller misused the API
//! - runtime errors (`PoolExhausted`, `OutOfBounds`) are ordinary outcomes the
//!   caller is expected to handle

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Pool allocator errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // --- Construction Errors ---
    #[error("Invalid alignment: {alignment} is not a power of two")]
    InvalidAlignment { alignment: usize },

    #[error("Chunk size {chunk_size} cannot hold a free-list node ({min_size} bytes)")]
    ChunkTooSmall { chunk_size: usize, min_size: usize },

    #[error("Buffer too small: {usable} usable bytes after alignment, chunk size {chunk_size}")]
    BufferTooSmall { usable: usize, chunk_size: usize },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: &'static str },

    #[error(
        "Layout of {size} bytes aligned to {align} does not fit a {chunk_size}-byte chunk aligned to {alignment}"
    )]
    InvalidLayout {
        size: usize,
        align: usize,
        chunk_size: usize,
        alignment: usize,
    },

    // --- Runtime Errors ---
    #[error("Pool exhausted: all {chunk_count} chunks are allocated")]
    PoolExhausted { chunk_count: usize },

    #[error("Address {addr:#x} is outside the pool region [{start:#x}, {end:#x})")]
    OutOfBounds { addr: usize, start: usize, end: usize },
}

impl PoolError {
    /// Returns `true` for errors the caller is expected to handle at runtime
    ///
    /// Construction errors are programming mistakes and return `false`.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. } | Self::OutOfBounds { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAlignment { .. } => "POOL:INIT:ALIGN",
            Self::ChunkTooSmall { .. } => "POOL:INIT:CHUNK",
            Self::BufferTooSmall { .. } => "POOL:INIT:BUFFER",
            Self::SizeOverflow { .. } => "POOL:INIT:OVERFLOW",
            Self::InvalidLayout { .. } => "POOL:ALLOC:LAYOUT",
            Self::PoolExhausted { .. } => "POOL:ALLOC:EXHAUSTED",
            Self::OutOfBounds { .. } => "POOL:FREE:BOUNDS",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(alignment, "alignment is not a power of two");

        Self::InvalidAlignment { alignment }
    }

    /// Create chunk too small error
    pub fn chunk_too_small(chunk_size: usize, min_size: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(chunk_size, min_size, "chunk cannot hold a free-list node");

        Self::ChunkTooSmall {
            chunk_size,
            min_size,
        }
    }

    /// Create buffer too small error
    pub fn buffer_too_small(usable: usize, chunk_size: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(usable, chunk_size, "buffer cannot hold a single chunk");

        Self::BufferTooSmall { usable, chunk_size }
    }

    /// Create invalid layout error for a typed allocation
    pub fn invalid_layout(size: usize, align: usize, chunk_size: usize, alignment: usize) -> Self {
        Self::InvalidLayout {
            size,
            align,
            chunk_size,
            alignment,
        }
    }

    /// Create pool exhausted error
    pub fn pool_exhausted(chunk_count: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(chunk_count, "memory pool exhausted");

        Self::PoolExhausted { chunk_count }
    }

    /// Create out of bounds error
    pub fn out_of_bounds(addr: usize, start: usize, end: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(addr, start, end, "free of an address outside the pool");

        Self::OutOfBounds { addr, start, end }
    }
}
