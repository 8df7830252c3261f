//! Chunk pool over a borrowed buffer
//!
//! # Safety
//!
//! The pool threads an intrusive free list through the chunks it does not
//! hand out:
//! - The buffer is borrowed for `'buf`; the pool never allocates or frees it
//! - A free chunk's first bytes hold a `FreeNode` linking to the next free chunk
//! - Node reads and writes are unaligned, so alignments below a pointer's are valid
//! - A chunk is never reachable from `free_head` while the caller owns it
//!
//! ## Invariants
//!
//! - `chunk_size` is a multiple of `alignment` and at least `NODE_SIZE`
//! - `[start, start + len)` lies inside the borrowed buffer, `len % chunk_size == 0`
//! - Every chunk is either on the free list exactly once or allocated
//! - `free_count` equals the length of the free list while callers honor `free`'s contract

use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::stats::Counters;
use super::{PoolConfig, PoolStats};
use crate::align::{DEFAULT_ALIGNMENT, align_address, align_size, is_power_of_two};
use crate::error::{PoolError, PoolResult};

/// Node in the free list
///
/// When a chunk is free, its first bytes store the address of the next free
/// chunk, forming a singly linked list.
#[repr(C)]
#[derive(Clone, Copy)]
struct FreeNode {
    next: Option<NonNull<u8>>,
}

/// Bytes a chunk must provide to hold its free-list link
pub const NODE_SIZE: usize = size_of::<FreeNode>();

/// Fixed-size chunk allocator over a caller-supplied buffer
///
/// The pool slices the buffer into equal chunks and serves them in O(1)
/// from a LIFO free list. It never owns the buffer: `'buf` ties the pool to
/// the borrow it was built from.
///
/// # Memory Layout
/// ```text
/// buffer:  [pad][Chunk0][Chunk1][Chunk2] ... [ChunkN-1][tail]
///                  ↑                              ↑
///                start                     free_head after init
///
/// free list after init: ChunkN-1 → ChunkN-2 → ... → Chunk0 → none
/// ```
///
/// `pad` is lost to aligning the first chunk and `tail` is the remainder
/// smaller than one chunk.
///
/// # Example
///
/// ```rust
/// use chunk_pool::Pool;
///
/// let mut buffer = [0u8; 1024];
/// let mut pool = Pool::new(&mut buffer, 64)?;
///
/// let chunk = pool.alloc()?;
/// // SAFETY: the chunk is 64 zeroed bytes aligned for a pointer
/// unsafe { chunk.cast::<u32>().write(7) };
///
/// // SAFETY: the chunk came from this pool and is freed once
/// unsafe { pool.free(chunk.as_ptr())? };
/// # Ok::<(), chunk_pool::PoolError>(())
/// ```
pub struct Pool<'buf> {
    /// First aligned chunk address
    start: NonNull<u8>,

    /// Usable bytes, a multiple of `chunk_size`
    len: usize,

    /// Size of each chunk, already rounded to `alignment`
    chunk_size: usize,

    /// Alignment every chunk start satisfies
    alignment: usize,

    /// Total number of chunks
    chunk_count: usize,

    /// Head of the free list
    free_head: Option<NonNull<u8>>,

    /// Number of chunks on the free list
    free_count: usize,

    config: PoolConfig,
    counters: Counters,

    _buffer: PhantomData<&'buf mut [u8]>,
}

// SAFETY: Pool<'buf> stands in for an exclusive `&'buf mut [u8]`.
// - All mutation goes through `&mut self`
// - No thread-local state; raw pointers only address the borrowed buffer
// - Chunk addresses handed out are raw pointers, which are not Send themselves
unsafe impl Send for Pool<'_> {}

impl<'buf> Pool<'buf> {
    /// Creates a pool over `buffer` with pointer alignment and default configuration
    pub fn new(buffer: &'buf mut [u8], chunk_size: usize) -> PoolResult<Self> {
        Self::with_alignment(buffer, chunk_size, DEFAULT_ALIGNMENT)
    }

    /// Creates a pool with an explicit chunk alignment
    pub fn with_alignment(
        buffer: &'buf mut [u8],
        chunk_size: usize,
        alignment: usize,
    ) -> PoolResult<Self> {
        Self::with_config(buffer, chunk_size, alignment, PoolConfig::default())
    }

    /// Creates a pool with custom configuration
    ///
    /// # Parameters
    /// - `buffer`: backing storage, borrowed for the pool's whole lifetime
    /// - `chunk_size`: requested chunk size, rounded up to `alignment`
    /// - `alignment`: chunk alignment (must be a power of two)
    /// - `config`: statistics and debug fill settings
    ///
    /// # Errors
    /// Returns an error if:
    /// - `alignment` is not a power of two
    /// - the rounded chunk cannot hold a free-list link
    /// - the buffer cannot hold one chunk after alignment padding, including
    ///   a `chunk_size` that rounds past `usize::MAX`
    pub fn with_config(
        buffer: &'buf mut [u8],
        chunk_size: usize,
        alignment: usize,
        config: PoolConfig,
    ) -> PoolResult<Self> {
        let len = buffer.len();
        let ptr = NonNull::from(buffer).cast::<u8>();

        // SAFETY: ptr/len describe a live slice exclusively borrowed for 'buf,
        // and the PhantomData in Self keeps that borrow alive.
        unsafe { Self::from_raw_parts(ptr, len, chunk_size, alignment, config) }
    }

    /// Creates a pool sized and aligned for values of type `T`
    ///
    /// Chunks are at least [`NODE_SIZE`] bytes even when `T` is smaller.
    pub fn for_type<T>(buffer: &'buf mut [u8]) -> PoolResult<Self> {
        let chunk_size = size_of::<T>().max(NODE_SIZE);
        Self::with_alignment(buffer, chunk_size, align_of::<T>())
    }

    /// Creates a pool over a raw memory region
    ///
    /// # Safety
    ///
    /// Caller must ensure:
    /// - `ptr` is valid for reads and writes of `len` bytes for `'buf`
    /// - Nothing else reads or writes the region while the pool is alive,
    ///   except through chunk addresses the pool hands out
    /// - The pool is not used after the region is released
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        len: usize,
        chunk_size: usize,
        alignment: usize,
        config: PoolConfig,
    ) -> PoolResult<Self> {
        if !is_power_of_two(alignment) {
            return Err(PoolError::invalid_alignment(alignment));
        }

        let initial = ptr.as_ptr().addr();
        let padding = align_address(initial, alignment)? - initial;
        let usable = len.saturating_sub(padding);

        // A request that rounds past usize::MAX fits no buffer
        let chunk_size = align_size(chunk_size, alignment)
            .map_err(|_| PoolError::buffer_too_small(usable, usize::MAX))?;
        if chunk_size < NODE_SIZE {
            return Err(PoolError::chunk_too_small(chunk_size, NODE_SIZE));
        }

        let len = (usable / chunk_size) * chunk_size;
        if len < chunk_size {
            return Err(PoolError::buffer_too_small(usable, chunk_size));
        }

        // SAFETY: at least one chunk fits after the padding, so
        // ptr + padding is inside the region.
        let start = unsafe { ptr.add(padding) };

        let mut pool = Self {
            start,
            len,
            chunk_size,
            alignment,
            chunk_count: len / chunk_size,
            free_head: None,
            free_count: 0,
            config,
            counters: Counters::default(),
            _buffer: PhantomData,
        };

        #[cfg(feature = "logging")]
        debug!(
            chunk_size,
            alignment,
            chunk_count = pool.chunk_count,
            padding,
            wasted_tail = usable - len,
            "chunk pool created"
        );

        pool.free_all();

        Ok(pool)
    }

    /// Returns the size of each chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the alignment of each chunk
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Returns the total number of chunks in the pool
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Returns the usable length in bytes (`chunk_count * chunk_size`)
    pub fn usable_len(&self) -> usize {
        self.len
    }

    /// Returns the address of the first chunk
    pub fn start(&self) -> NonNull<u8> {
        self.start
    }

    /// Returns the number of free chunks
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Returns the number of allocated chunks
    pub fn allocated_count(&self) -> usize {
        self.chunk_count.saturating_sub(self.free_count)
    }

    /// Checks if the pool is full (no free chunks)
    pub fn is_full(&self) -> bool {
        self.free_head.is_none()
    }

    /// Checks if the pool is empty (all chunks free)
    pub fn is_empty(&self) -> bool {
        self.allocated_count() == 0
    }

    /// Returns the configuration the pool was created with
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Checks if an address lies inside the pool region
    pub fn contains(&self, ptr: *const u8) -> bool {
        let addr = ptr.addr();
        let start = self.start.as_ptr().addr();
        addr >= start && addr - start < self.len
    }

    /// Returns the index of the chunk starting at `ptr`
    ///
    /// `None` if `ptr` is outside the pool or not on a chunk boundary.
    pub fn chunk_index(&self, ptr: *const u8) -> Option<usize> {
        if !self.contains(ptr) {
            return None;
        }
        let offset = ptr.addr() - self.start.as_ptr().addr();
        offset
            .is_multiple_of(self.chunk_size)
            .then_some(offset / self.chunk_size)
    }

    /// Returns the chunk the next [`alloc`](Self::alloc) will hand out
    pub fn free_head(&self) -> Option<NonNull<u8>> {
        self.free_head
    }

    /// Iterates over free chunk addresses in allocation order
    ///
    /// The first item is the current head. The walk stops after
    /// `chunk_count` items, so a list corrupted by a double free cannot loop
    /// forever.
    pub fn free_list(&self) -> FreeChunks<'_> {
        FreeChunks {
            next: self.free_head,
            remaining: self.chunk_count,
            _pool: PhantomData,
        }
    }

    /// Allocates one zeroed chunk
    ///
    /// This is a **O(1)** operation; the returned chunk is `chunk_size`
    /// zeroed bytes aligned to [`alignment`](Self::alignment). The caller
    /// owns the chunk until it passes the address back to
    /// [`free`](Self::free).
    ///
    /// # Errors
    /// [`PoolError::PoolExhausted`] if no chunk is free. The free list is
    /// left untouched.
    pub fn alloc(&mut self) -> PoolResult<NonNull<u8>> {
        let Some(chunk) = self.free_head else {
            if self.config.track_stats {
                self.counters.failed_allocs += 1;
            }
            return Err(PoolError::pool_exhausted(self.chunk_count));
        };

        // SAFETY: chunk is the free-list head, so its leading bytes hold a
        // FreeNode written by push(); the read is unaligned-tolerant.
        let node = unsafe { chunk.cast::<FreeNode>().as_ptr().read_unaligned() };
        self.free_head = node.next;
        self.free_count = self.free_count.saturating_sub(1);

        // SAFETY: chunk is a chunk boundary inside the buffer, valid for
        // chunk_size bytes, and no longer reachable from the free list.
        unsafe { ptr::write_bytes(chunk.as_ptr(), 0, self.chunk_size) };

        if self.config.track_stats {
            self.counters.total_allocs += 1;
            self.counters.peak_allocated = self.counters.peak_allocated.max(self.allocated_count());
        }

        #[cfg(feature = "logging")]
        trace!(chunk = ?chunk, free = self.free_count, "chunk allocated");

        Ok(chunk)
    }

    /// Allocates one zeroed chunk typed as `T`
    ///
    /// # Errors
    /// - [`PoolError::InvalidLayout`] if `T` is larger than a chunk or needs
    ///   a stricter alignment than the pool provides
    /// - [`PoolError::PoolExhausted`] if no chunk is free
    pub fn alloc_as<T>(&mut self) -> PoolResult<NonNull<T>> {
        let size = size_of::<T>();
        let align = align_of::<T>();
        if size > self.chunk_size || align > self.alignment {
            return Err(PoolError::invalid_layout(
                size,
                align,
                self.chunk_size,
                self.alignment,
            ));
        }
        self.alloc().map(NonNull::cast)
    }

    /// Returns a chunk to the free list
    ///
    /// This is a **O(1)** operation. A null `ptr` is a no-op. The chunk
    /// becomes the new head, so it is the next one [`alloc`](Self::alloc)
    /// returns.
    ///
    /// # Errors
    /// [`PoolError::OutOfBounds`] if `ptr` lies outside the pool region; the
    /// free list is left untouched.
    ///
    /// # Safety
    ///
    /// Caller must ensure, for a non-null in-bounds `ptr`:
    /// - `ptr` was returned by [`alloc`](Self::alloc) on this pool
    /// - `ptr` has not been freed since (no double free)
    /// - No reads or writes through `ptr` happen until it is allocated again
    ///
    /// None of these are checked; only the bounds test is.
    pub unsafe fn free(&mut self, ptr: *mut u8) -> PoolResult<()> {
        let Some(chunk) = NonNull::new(ptr) else {
            return Ok(());
        };

        if !self.contains(ptr) {
            if self.config.track_stats {
                self.counters.rejected_frees += 1;
            }
            let start = self.start.as_ptr().addr();
            return Err(PoolError::out_of_bounds(ptr.addr(), start, start + self.len));
        }

        debug_assert!(
            self.chunk_index(ptr).is_some(),
            "freed address is not on a chunk boundary"
        );

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: ptr is a chunk of this pool (caller contract), so the
            // chunk_size - NODE_SIZE bytes after the node are inside it.
            unsafe {
                ptr::write_bytes(ptr.add(NODE_SIZE), pattern, self.chunk_size - NODE_SIZE);
            }
        }

        // SAFETY: ptr is an allocated chunk of this pool (caller contract).
        unsafe { self.push(chunk) };
        self.free_count += 1;

        if self.config.track_stats {
            self.counters.total_frees += 1;
        }

        #[cfg(feature = "logging")]
        trace!(chunk = ?chunk, free = self.free_count, "chunk freed");

        Ok(())
    }

    /// Returns every chunk to the free list
    ///
    /// Chunks are pushed in ascending order, so the next
    /// [`alloc`](Self::alloc) returns the last chunk in the buffer and
    /// allocation proceeds towards the start. This is **O(chunk_count)**.
    ///
    /// All outstanding chunk addresses become invalid; using one afterwards
    /// corrupts the free list.
    pub fn free_all(&mut self) {
        self.free_head = None;

        for index in 0..self.chunk_count {
            // SAFETY: index < chunk_count, so the offset stays inside the
            // usable region; every chunk is being reclaimed.
            unsafe {
                let chunk = self.start.add(index * self.chunk_size);
                self.push(chunk);
            }
        }

        self.free_count = self.chunk_count;

        #[cfg(feature = "logging")]
        debug!(chunk_count = self.chunk_count, "all chunks returned to the pool");
    }

    /// Get statistics (if tracking is enabled)
    pub fn stats(&self) -> Option<PoolStats> {
        if !self.config.track_stats {
            return None;
        }

        Some(PoolStats {
            total_allocs: self.counters.total_allocs,
            total_frees: self.counters.total_frees,
            failed_allocs: self.counters.failed_allocs,
            rejected_frees: self.counters.rejected_frees,
            peak_allocated: self.counters.peak_allocated,
            allocated_chunks: self.allocated_count(),
            free_chunks: self.free_count,
            chunk_size: self.chunk_size,
            chunk_count: self.chunk_count,
        })
    }

    /// Pushes `chunk` on the front of the free list
    ///
    /// # Safety
    ///
    /// `chunk` must be a chunk of this pool that is not on the free list.
    unsafe fn push(&mut self, chunk: NonNull<u8>) {
        let node = FreeNode {
            next: self.free_head,
        };
        // SAFETY: chunk is valid for chunk_size >= NODE_SIZE bytes.
        unsafe { chunk.cast::<FreeNode>().as_ptr().write_unaligned(node) };
        self.free_head = Some(chunk);
    }
}

impl fmt::Debug for Pool<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("chunk_size", &self.chunk_size)
            .field("alignment", &self.alignment)
            .field("chunk_count", &self.chunk_count)
            .field("free_count", &self.free_count)
            .field("free_head", &self.free_head)
            .finish_non_exhaustive()
    }
}

/// Iterator over the free list of a [`Pool`]
///
/// Created by [`Pool::free_list`].
pub struct FreeChunks<'a> {
    next: Option<NonNull<u8>>,
    remaining: usize,
    _pool: PhantomData<&'a ()>,
}

impl Iterator for FreeChunks<'_> {
    type Item = NonNull<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let chunk = self.next?;
        self.remaining -= 1;

        // SAFETY: chunk is reachable from the free list of the pool borrowed
        // for 'a, so its leading bytes hold a FreeNode.
        let node = unsafe { chunk.cast::<FreeNode>().as_ptr().read_unaligned() };
        self.next = node.next;

        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(64))]
    struct Backing([u8; 1024]);

    impl Backing {
        fn new() -> Self {
            Self([0xAA; 1024])
        }
    }

    fn addr(ptr: NonNull<u8>) -> usize {
        ptr.as_ptr().addr()
    }

    #[test]
    fn test_init_partitions_buffer() {
        let mut backing = Backing::new();
        let base = backing.0.as_ptr().addr();
        let pool = Pool::new(&mut backing.0, 64).unwrap();

        assert_eq!(pool.chunk_size(), 64);
        assert_eq!(pool.chunk_count(), 16);
        assert_eq!(pool.usable_len(), 1024);
        assert_eq!(pool.free_count(), 16);
        assert_eq!(addr(pool.start()), base);
        assert!(pool.is_empty());
        assert!(!pool.is_full());
    }

    #[test]
    fn test_chunk_size_rounded_to_alignment() {
        let mut backing = Backing::new();
        let pool = Pool::with_alignment(&mut backing.0, 20, 16).unwrap();

        assert_eq!(pool.chunk_size(), 32);
        assert_eq!(pool.chunk_count(), 32);
    }

    #[test]
    fn test_misaligned_buffer_loses_padding() {
        let mut backing = Backing::new();
        let base = backing.0.as_ptr().addr();
        // Starts one byte past a 64-byte boundary
        let pool = Pool::with_alignment(&mut backing.0[1..], 64, 64).unwrap();

        assert_eq!(addr(pool.start()), base + 64);
        // 1023 bytes - 63 padding = 960 = 15 chunks
        assert_eq!(pool.usable_len(), 960);
        assert_eq!(pool.chunk_count(), 15);
    }

    #[test]
    fn test_trailing_remainder_truncated() {
        let mut backing = Backing::new();
        let pool = Pool::new(&mut backing.0[..1000], 64).unwrap();

        assert_eq!(pool.chunk_count(), 15);
        assert_eq!(pool.usable_len(), 960);
    }

    #[test]
    fn test_init_errors() {
        let mut backing = Backing::new();

        assert_eq!(
            Pool::with_alignment(&mut backing.0, 64, 3).unwrap_err(),
            PoolError::InvalidAlignment { alignment: 3 }
        );
        assert_eq!(
            Pool::with_alignment(&mut backing.0, 64, 0).unwrap_err(),
            PoolError::InvalidAlignment { alignment: 0 }
        );
        assert_eq!(
            Pool::with_alignment(&mut backing.0, 2, 2).unwrap_err(),
            PoolError::ChunkTooSmall {
                chunk_size: 2,
                min_size: NODE_SIZE
            }
        );
        assert_eq!(
            Pool::new(&mut backing.0, 0).unwrap_err(),
            PoolError::ChunkTooSmall {
                chunk_size: 0,
                min_size: NODE_SIZE
            }
        );
        assert_eq!(
            Pool::new(&mut backing.0[..63], 64).unwrap_err(),
            PoolError::BufferTooSmall {
                usable: 63,
                chunk_size: 64
            }
        );
        assert!(matches!(
            Pool::new(&mut [], 64),
            Err(PoolError::BufferTooSmall { usable: 0, .. })
        ));
    }

    #[test]
    fn test_oversized_chunk_size() {
        let mut backing = Backing::new();
        assert_eq!(
            Pool::new(&mut backing.0, usize::MAX - 3).unwrap_err(),
            PoolError::BufferTooSmall {
                usable: 1024,
                chunk_size: usize::MAX
            }
        );
    }

    #[cfg(feature = "logging")]
    #[test]
    fn test_invalid_alignment_logged_once() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut backing = Backing::new();
        tracing::subscriber::with_default(subscriber, || {
            assert!(align_size(64, 12).is_err());
            assert!(align_address(64, 0).is_err());
            assert!(Pool::with_alignment(&mut backing.0, 64, 12).is_err());
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("alignment is not a power of two").count(), 1);
    }

    #[test]
    fn test_padding_larger_than_buffer() {
        let mut backing = Backing::new();
        let err = Pool::with_alignment(&mut backing.0[1..10], 8, 64).unwrap_err();
        assert_eq!(
            err,
            PoolError::BufferTooSmall {
                usable: 0,
                chunk_size: 64
            }
        );
    }

    #[test]
    fn test_alloc_order_is_descending() {
        let mut backing = Backing::new();
        let mut pool = Pool::new(&mut backing.0, 64).unwrap();

        let mut previous = usize::MAX;
        for expected_index in (0..16).rev() {
            let chunk = pool.alloc().unwrap();
            assert_eq!(pool.chunk_index(chunk.as_ptr()), Some(expected_index));
            assert!(addr(chunk) < previous);
            previous = addr(chunk);
        }
        assert!(pool.is_full());
    }

    #[test]
    fn test_alloc_zeroes_chunk() {
        let mut backing = Backing::new();
        let mut pool = Pool::with_config(&mut backing.0, 64, 8, PoolConfig::debug()).unwrap();

        let chunk = pool.alloc().unwrap();
        unsafe {
            ptr::write_bytes(chunk.as_ptr(), 0x5A, 64);
            pool.free(chunk.as_ptr()).unwrap();
        }

        let again = pool.alloc().unwrap();
        assert_eq!(again, chunk);
        let bytes = unsafe { core::slice::from_raw_parts(again.as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_exhaustion_leaves_state_unchanged() {
        let mut backing = Backing::new();
        let mut pool = Pool::with_config(&mut backing.0[..128], 64, 8, PoolConfig::debug()).unwrap();

        pool.alloc().unwrap();
        pool.alloc().unwrap();

        assert_eq!(
            pool.alloc().unwrap_err(),
            PoolError::PoolExhausted { chunk_count: 2 }
        );
        assert_eq!(pool.free_head(), None);
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.stats().unwrap().failed_allocs, 1);
    }

    #[test]
    fn test_free_null_is_noop() {
        let mut backing = Backing::new();
        let mut pool = Pool::new(&mut backing.0, 64).unwrap();
        let head = pool.free_head();

        unsafe { pool.free(ptr::null_mut()).unwrap() };
        assert_eq!(pool.free_head(), head);
        assert_eq!(pool.free_count(), 16);
    }

    #[test]
    fn test_free_out_of_bounds() {
        let mut backing = Backing::new();
        let base = backing.0.as_mut_ptr();
        let mut pool = Pool::with_config(&mut backing.0[..512], 64, 8, PoolConfig::debug()).unwrap();
        pool.alloc().unwrap();
        let head = pool.free_head();

        let mut outside = [0u8; 64];
        let err = unsafe { pool.free(outside.as_mut_ptr()) }.unwrap_err();
        assert!(matches!(err, PoolError::OutOfBounds { .. }));

        // One past the usable region
        let end = base.wrapping_add(512);
        let err = unsafe { pool.free(end) }.unwrap_err();
        assert_eq!(
            err,
            PoolError::OutOfBounds {
                addr: end.addr(),
                start: base.addr(),
                end: base.addr() + 512,
            }
        );

        assert_eq!(pool.free_head(), head);
        assert_eq!(pool.free_count(), 7);
        assert_eq!(pool.stats().unwrap().rejected_frees, 2);
    }

    #[test]
    fn test_free_below_start() {
        let mut backing = Backing::new();
        let base = backing.0.as_mut_ptr();
        let mut pool = Pool::with_config(&mut backing.0[64..], 64, 8, PoolConfig::debug()).unwrap();
        let start = pool.start().as_ptr();
        assert_eq!(start.addr(), base.addr() + 64);
        let head = pool.free_head();

        let before = start.wrapping_sub(1);
        let err = unsafe { pool.free(before) }.unwrap_err();
        assert_eq!(
            err,
            PoolError::OutOfBounds {
                addr: before.addr(),
                start: start.addr(),
                end: start.addr() + 960,
            }
        );

        // Bytes in front of the pool region still belong to the caller
        let err = unsafe { pool.free(base) }.unwrap_err();
        assert!(matches!(err, PoolError::OutOfBounds { addr, .. } if addr == base.addr()));

        assert_eq!(pool.free_head(), head);
        assert_eq!(pool.free_count(), 15);
        assert_eq!(pool.stats().unwrap().rejected_frees, 2);
    }

    #[test]
    fn test_dealloc_pattern_skips_node() {
        let mut backing = Backing::new();
        let config = PoolConfig::production().with_dealloc_pattern(Some(0xDD));
        let mut pool = Pool::with_config(&mut backing.0, 64, 8, config).unwrap();

        let chunk = pool.alloc().unwrap();
        unsafe { pool.free(chunk.as_ptr()).unwrap() };

        let bytes = unsafe { core::slice::from_raw_parts(chunk.as_ptr(), 64) };
        assert!(bytes[NODE_SIZE..].iter().all(|&b| b == 0xDD));
        assert_eq!(pool.free_head(), Some(chunk));
        assert_eq!(pool.free_list().count(), 16);
    }

    #[test]
    fn test_small_alignment() {
        let mut backing = Backing::new();
        let mut pool = Pool::with_alignment(&mut backing.0[1..], NODE_SIZE + 1, 1).unwrap();

        assert_eq!(pool.chunk_size(), NODE_SIZE + 1);
        let count = pool.chunk_count();
        assert_eq!(pool.free_list().count(), count);

        let a = pool.alloc().unwrap();
        let b = pool.alloc().unwrap();
        unsafe {
            pool.free(a.as_ptr()).unwrap();
            pool.free(b.as_ptr()).unwrap();
        }
        assert_eq!(pool.free_head(), Some(b));
        assert_eq!(pool.free_list().count(), count);
    }

    #[test]
    fn test_free_all_restores_every_chunk() {
        let mut backing = Backing::new();
        let mut pool = Pool::new(&mut backing.0, 64).unwrap();
        let initial_head = pool.free_head();

        for _ in 0..10 {
            pool.alloc().unwrap();
        }
        assert_eq!(pool.allocated_count(), 10);

        pool.free_all();
        assert!(pool.is_empty());
        assert_eq!(pool.free_head(), initial_head);
        assert_eq!(pool.free_list().count(), 16);
    }

    #[test]
    fn test_for_type() {
        #[repr(C, align(16))]
        struct Entity {
            id: u64,
            pos: [f32; 3],
        }

        let mut backing = Backing::new();
        let mut pool = Pool::for_type::<Entity>(&mut backing.0).unwrap();
        assert_eq!(pool.alignment(), 16);
        assert_eq!(pool.chunk_size(), 32);

        let entity = pool.alloc_as::<Entity>().unwrap();
        assert_eq!(entity.as_ptr().addr() % 16, 0);
        unsafe {
            entity.write(Entity {
                id: 9,
                pos: [1.0, 2.0, 3.0],
            });
            assert_eq!((*entity.as_ptr()).id, 9);
            assert_eq!((*entity.as_ptr()).pos[2], 3.0);
        }

        assert_eq!(
            pool.alloc_as::<[u64; 8]>().unwrap_err(),
            PoolError::InvalidLayout {
                size: 64,
                align: 8,
                chunk_size: 32,
                alignment: 16
            }
        );
    }

    #[test]
    fn test_stats() {
        let mut backing = Backing::new();
        let mut pool = Pool::with_config(&mut backing.0, 64, 8, PoolConfig::debug()).unwrap();

        let a = pool.alloc().unwrap();
        let _b = pool.alloc().unwrap();
        unsafe { pool.free(a.as_ptr()).unwrap() };

        let stats = pool.stats().unwrap();
        assert_eq!(stats.total_allocs, 2);
        assert_eq!(stats.total_frees, 1);
        assert_eq!(stats.peak_allocated, 2);
        assert_eq!(stats.allocated_chunks, 1);
        assert_eq!(stats.free_chunks, 15);
        assert_eq!(stats.chunk_count, 16);
        assert!((stats.utilization() - 1.0 / 16.0).abs() < f64::EPSILON);

        let mut backing = Backing::new();
        let pool = Pool::with_config(&mut backing.0, 64, 8, PoolConfig::production()).unwrap();
        assert!(pool.stats().is_none());
    }

    #[test]
    fn test_chunk_index() {
        let mut backing = Backing::new();
        let pool = Pool::new(&mut backing.0, 64).unwrap();
        let start = pool.start().as_ptr();

        assert_eq!(pool.chunk_index(start), Some(0));
        assert_eq!(pool.chunk_index(start.wrapping_add(128)), Some(2));
        assert_eq!(pool.chunk_index(start.wrapping_add(130)), None);
        assert_eq!(pool.chunk_index(start.wrapping_add(1024)), None);
        assert!(pool.contains(start.wrapping_add(1023)));
    }
}
