//! Fibonacci index mixing and probe-cursor arithmetic shared by all tables.
//!
//! Every table maps a 32-bit key hash to its initial slot index with one
//! multiply and one shift: `(h * 0x9E3779B9) >> shift`. The multiplier is
//! the 32-bit golden-ratio constant, which spreads the low bits of weak
//! hashes (including the identity hash over small integers) into the high
//! positions that survive the shift. Capacities are powers of two, so the
//! shift replaces a modulo.

/// The 32-bit Fibonacci multiplier, `2^32 / phi` rounded to an odd value.
pub(crate) const GOLDEN_RATIO: u32 = 0x9E37_79B9;

/// Map a key hash to its initial index in `[0, 1 << (32 - shift))`.
#[inline]
#[must_use]
pub(crate) fn mix(hash: u32, shift: u32) -> usize {
    (hash.wrapping_mul(GOLDEN_RATIO) >> shift) as usize
}

/// Extract the 7-bit metadata fingerprint from a key hash.
///
/// The high bit is always zero, keeping fingerprints disjoint from the
/// sentinel metadata bytes, which all have the high bit set.
#[inline]
#[must_use]
pub(crate) fn fingerprint(hash: u32) -> u8 {
    (hash & 0x7F) as u8
}

/// Reposition a probe cursor that would overrun capacity.
///
/// The rotated hash re-derives a fresh in-range anchor from bits the
/// original mix discarded, and folding in the current jump keeps successive
/// re-anchors from revisiting the same position. The result is always in
/// `[0, 1 << (32 - shift))`, so the cursor never needs to wrap.
#[inline]
#[must_use]
pub(crate) fn reanchor_left(hash: u32, jump: u32, shift: u32) -> usize {
    (hash.rotate_left(31).wrapping_add(jump) >> shift) as usize
}

/// [`reanchor_left`] with the opposite rotation, used by the scalar table.
#[inline]
#[must_use]
pub(crate) fn reanchor_right(hash: u32, jump: u32, shift: u32) -> usize {
    (hash.rotate_right(31).wrapping_add(jump) >> shift) as usize
}

/// Round a requested capacity up to a power of two, floored at `min`.
#[inline]
#[must_use]
pub(crate) fn capacity_for(requested: usize, min: usize) -> usize {
    requested.max(min).next_power_of_two()
}

/// The shift that maps a mixed 32-bit hash into `[0, capacity)`.
#[inline]
#[must_use]
pub(crate) fn index_shift(capacity: usize) -> u32 {
    debug_assert!(capacity.is_power_of_two());
    32 - capacity.trailing_zeros()
}
