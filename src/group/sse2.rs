//! SSE2 group operations.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{BitMask, EMPTY, GROUP_WIDTH};

#[derive(Clone, Copy)]
pub(crate) struct Group(__m128i);

impl Group {
    /// Whether this backend satisfies the dense table's vector requirement.
    pub(crate) const NATIVE: bool = true;

    /// Load the 16 metadata bytes at the start of `meta`.
    #[inline]
    #[must_use]
    pub(crate) fn load(meta: &[u8]) -> Self {
        debug_assert!(meta.len() >= GROUP_WIDTH);
        // Unaligned load; the metadata array carries 16 trailing padding
        // bytes so every in-range probe position has a full group readable.
        unsafe { Group(_mm_loadu_si128(meta.as_ptr() as *const __m128i)) }
    }

    /// Slots whose metadata equals `byte`.
    #[inline]
    #[must_use]
    pub(crate) fn match_byte(self, byte: u8) -> BitMask {
        unsafe {
            let cmp = _mm_cmpeq_epi8(self.0, _mm_set1_epi8(byte as i8));
            BitMask(_mm_movemask_epi8(cmp) as u16)
        }
    }

    /// Slots holding the `EMPTY` sentinel.
    #[inline]
    #[must_use]
    pub(crate) fn match_empty(self) -> BitMask {
        self.match_byte(EMPTY)
    }

    /// Slots holding either sentinel. Sentinels are the only metadata bytes
    /// with the sign bit set, so the movemask alone is the answer.
    #[inline]
    #[must_use]
    pub(crate) fn match_free(self) -> BitMask {
        unsafe { BitMask(_mm_movemask_epi8(self.0) as u16) }
    }
}
