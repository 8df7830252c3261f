//! Fixed-size chunk pool
//!
//! A pool allocator that slices a borrowed buffer into equal chunks and
//! serves them through an intrusive LIFO free list.
//!
//! ## Modules
//! - `allocator` - `Pool` implementation and free-list iterator
//! - `config` - Configuration presets (production, debug)
//! - `stats` - Statistics snapshot type

pub mod allocator;
pub mod config;
pub mod stats;

pub use allocator::{FreeChunks, NODE_SIZE, Pool};
pub use config::PoolConfig;
pub use stats::PoolStats;
