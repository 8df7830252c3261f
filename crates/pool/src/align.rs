//! Alignment arithmetic
//!
//! Pure helpers used by pool construction. They never log; the pool reports
//! rejected inputs when it is built. Both rounding functions apply the
//! same bitmask rule: when `x & (alignment - 1)` is non-zero, add the missing
//! `alignment - (x & (alignment - 1))` bytes.

use crate::error::{PoolError, PoolResult};

/// Natural alignment of a pointer on the target platform
pub const DEFAULT_ALIGNMENT: usize = align_of::<*const u8>();

/// Checks if a value is a power of two
///
/// Zero is not a power of two.
///
/// # Examples
/// ```
/// use chunk_pool::align::is_power_of_two;
///
/// assert!(is_power_of_two(1));
/// assert!(is_power_of_two(64));
/// assert!(!is_power_of_two(0));
/// assert!(!is_power_of_two(12));
/// ```
#[inline(always)]
pub const fn is_power_of_two(value: usize) -> bool {
    value.is_power_of_two()
}

/// Rounds `value` up to the next multiple of `alignment`
#[inline(always)]
const fn round_up(value: usize, alignment: usize) -> Option<usize> {
    let modulo = value & (alignment - 1);
    if modulo == 0 {
        Some(value)
    } else {
        value.checked_add(alignment - modulo)
    }
}

/// Returns the smallest address `>= addr` that is a multiple of `alignment`
///
/// # Examples
/// ```
/// use chunk_pool::align::align_address;
///
/// assert_eq!(align_address(0x1001, 16).unwrap(), 0x1010);
/// assert_eq!(align_address(0x1010, 16).unwrap(), 0x1010);
/// assert!(align_address(0x1000, 24).is_err());
/// ```
///
/// # Errors
/// - [`PoolError::InvalidAlignment`] if `alignment` is not a power of two
/// - [`PoolError::SizeOverflow`] if the rounded address does not fit in `usize`
#[inline]
pub fn align_address(addr: usize, alignment: usize) -> PoolResult<usize> {
    if !is_power_of_two(alignment) {
        return Err(PoolError::InvalidAlignment { alignment });
    }
    round_up(addr, alignment).ok_or(PoolError::SizeOverflow {
        operation: "align_address",
    })
}

/// Rounds a byte count up to a multiple of `alignment`
///
/// # Examples
/// ```
/// use chunk_pool::align::align_size;
///
/// assert_eq!(align_size(13, 8).unwrap(), 16);
/// assert_eq!(align_size(64, 8).unwrap(), 64);
/// assert_eq!(align_size(0, 8).unwrap(), 0);
/// ```
///
/// # Errors
/// - [`PoolError::InvalidAlignment`] if `alignment` is not a power of two
/// - [`PoolError::SizeOverflow`] if the rounded size does not fit in `usize`
#[inline]
pub fn align_size(size: usize, alignment: usize) -> PoolResult<usize> {
    if !is_power_of_two(alignment) {
        return Err(PoolError::InvalidAlignment { alignment });
    }
    round_up(size, alignment).ok_or(PoolError::SizeOverflow {
        operation: "align_size",
    })
}
