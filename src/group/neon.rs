//! NEON group operations.

use core::arch::aarch64::*;

use super::{BitMask, EMPTY, GROUP_WIDTH};

#[derive(Clone, Copy)]
pub(crate) struct Group(uint8x16_t);

impl Group {
    /// Whether this backend satisfies the dense table's vector requirement.
    pub(crate) const NATIVE: bool = true;

    /// Load the 16 metadata bytes at the start of `meta`.
    #[inline]
    #[must_use]
    pub(crate) fn load(meta: &[u8]) -> Self {
        debug_assert!(meta.len() >= GROUP_WIDTH);
        unsafe { Group(vld1q_u8(meta.as_ptr())) }
    }

    /// Slots whose metadata equals `byte`.
    #[inline]
    #[must_use]
    pub(crate) fn match_byte(self, byte: u8) -> BitMask {
        unsafe { movemask(vceqq_u8(self.0, vdupq_n_u8(byte))) }
    }

    /// Slots holding the `EMPTY` sentinel.
    #[inline]
    #[must_use]
    pub(crate) fn match_empty(self) -> BitMask {
        self.match_byte(EMPTY)
    }

    /// Slots holding either sentinel, i.e. bytes with the sign bit set.
    #[inline]
    #[must_use]
    pub(crate) fn match_free(self) -> BitMask {
        unsafe { movemask(vtstq_u8(self.0, vdupq_n_u8(0x80))) }
    }
}

/// Collapse a lane-wise comparison result (`0xFF` or `0x00` per lane) into
/// one bit per lane. NEON has no movemask instruction; weighting each lane
/// by its bit position and horizontally adding the two halves produces the
/// same mask.
#[inline]
#[must_use]
unsafe fn movemask(cmp: uint8x16_t) -> BitMask {
    const WEIGHTS: [u8; 16] = [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128];
    let weighted = vandq_u8(cmp, vld1q_u8(WEIGHTS.as_ptr()));
    let low = u16::from(vaddv_u8(vget_low_u8(weighted)));
    let high = u16::from(vaddv_u8(vget_high_u8(weighted)));
    BitMask(low | (high << 8))
}
