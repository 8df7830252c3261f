//! # chunk-pool
//!
//! Fixed-chunk-size memory pool over a caller-supplied buffer.
//!
//! The pool partitions a borrowed byte buffer into equal, aligned chunks and
//! serves O(1) allocate/free through an intrusive free list threaded through
//! the unused chunks. It never allocates, grows or releases memory itself:
//! the caller owns the buffer and the pool borrows it for its lifetime.
//!
//! ## Quick Start
//!
//! ```rust
//! use chunk_pool::{Pool, PoolError};
//!
//! let mut buffer = vec![0u8; 4096];
//! let mut pool = Pool::new(&mut buffer, 64)?;
//!
//! let record = pool.alloc()?;            // 64 zeroed bytes
//! assert!(pool.contains(record.as_ptr()));
//!
//! // SAFETY: `record` came from this pool and is freed once
//! unsafe { pool.free(record.as_ptr())? };
//!
//! // Runtime failures are ordinary results
//! while pool.alloc().is_ok() {}
//! assert!(matches!(pool.alloc(), Err(PoolError::PoolExhausted { .. })));
//!
//! pool.free_all();
//! assert!(pool.is_empty());
//! # Ok::<(), PoolError>(())
//! ```
//!
//! ## Features
//!
//! - `logging` (default): structured events through `tracing`
//!
//! ## Limitations
//!
//! - **Single-threaded**: mutation needs `&mut Pool`
//! - **Best-effort validation**: `free` checks bounds only; double frees and
//!   misaligned addresses are excluded by its safety contract, not detected

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod align;
pub mod error;
pub mod pool;

pub use crate::align::DEFAULT_ALIGNMENT;
pub use crate::error::{PoolError, PoolResult};
pub use crate::pool::{FreeChunks, Pool, PoolConfig, PoolStats};
