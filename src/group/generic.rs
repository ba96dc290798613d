//! Scalar group operations for targets without a 128-bit byte compare.
//!
//! This backend exists so the crate compiles everywhere; the dense table
//! refuses construction on it (`NATIVE` is `false`) because a slot-at-a-time
//! group scan defeats the table's design. The scalar and linear tables never
//! touch this module.

use super::{BitMask, EMPTY, GROUP_WIDTH};

#[derive(Clone, Copy)]
pub(crate) struct Group([u8; GROUP_WIDTH]);

impl Group {
    pub(crate) const NATIVE: bool = false;

    #[inline]
    #[must_use]
    pub(crate) fn load(meta: &[u8]) -> Self {
        debug_assert!(meta.len() >= GROUP_WIDTH);
        let mut bytes = [0; GROUP_WIDTH];
        bytes.copy_from_slice(&meta[..GROUP_WIDTH]);
        Group(bytes)
    }

    #[inline]
    #[must_use]
    pub(crate) fn match_byte(self, byte: u8) -> BitMask {
        let mut mask = 0_u16;
        for (offset, &meta) in self.0.iter().enumerate() {
            if meta == byte {
                mask |= 1 << offset;
            }
        }
        BitMask(mask)
    }

    #[inline]
    #[must_use]
    pub(crate) fn match_empty(self) -> BitMask {
        self.match_byte(EMPTY)
    }

    #[inline]
    #[must_use]
    pub(crate) fn match_free(self) -> BitMask {
        let mut mask = 0_u16;
        for (offset, &meta) in self.0.iter().enumerate() {
            if meta & 0x80 != 0 {
                mask |= 1 << offset;
            }
        }
        BitMask(mask)
    }
}
