//! Allocates a handful of integers from a pool, frees some of them and shows
//! how the freed chunks are reused.
//!
//! Run with `RUST_LOG=chunk_pool=trace cargo run --example walkthrough` to see
//! every pool event.

#![allow(unsafe_code)]

use chunk_pool::{DEFAULT_ALIGNMENT, Pool, PoolConfig, PoolResult};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn read(chunk: std::ptr::NonNull<u8>) -> i32 {
    // SAFETY: every chunk is at least 64 bytes and pointer aligned
    unsafe { chunk.cast::<i32>().read() }
}

fn main() -> PoolResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut backing_buffer = [0u8; 1024];
    let mut pool = Pool::with_config(
        &mut backing_buffer,
        64,
        DEFAULT_ALIGNMENT,
        PoolConfig::production(),
    )?;
    info!(chunks = pool.chunk_count(), chunk_size = pool.chunk_size(), "pool ready");

    let mut chunks = Vec::new();
    for value in [5, 10, 15, 20, 25, 30] {
        let chunk = pool.alloc()?;
        // SAFETY: freshly allocated, 64 zeroed bytes
        unsafe { chunk.cast::<i32>().write(value) };
        chunks.push(chunk);
    }
    for (name, chunk) in ["a", "b", "c", "d", "e", "f"].iter().zip(&chunks) {
        info!(chunk = *name, value = read(*chunk), "stored");
    }

    let &[a, b, c, d, e, f] = &chunks[..] else {
        unreachable!("six chunks allocated above");
    };

    // SAFETY: each chunk came from this pool and is freed once
    unsafe {
        pool.free(b.as_ptr())?;
        pool.free(c.as_ptr())?;
        pool.free(d.as_ptr())?;
        pool.free(f.as_ptr())?;
    }
    info!(a = read(a), e = read(e), free = pool.free_count(), "b, c, d, f returned");

    let reused = pool.alloc()?;
    info!(same_as_f = (reused == f), "allocated again");

    // SAFETY: a and reused are live chunks of this pool
    unsafe {
        pool.free(a.as_ptr())?;
        let a = pool.alloc()?;
        pool.free(a.as_ptr())?;
        pool.free(reused.as_ptr())?;
        pool.free(e.as_ptr())?;
    }
    info!(free = pool.free_count(), "all chunks returned");

    Ok(())
}
