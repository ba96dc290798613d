//! A family of in-process, single-threaded open-addressing hash tables
//! sharing one philosophy: Fibonacci index mixing, power-of-two capacity,
//! triangular-number probing, and cache-line-friendly metadata kept apart
//! from the entries it describes.
//!
//! Every table keeps two parallel flat arrays:
//!
//! ```text
//!   metadata:                       entries:
//!  ----------                --------------------------
//! | 0x3A     |              |        | slot:  |        |
//! |----------|              |        |        |        |
//! | EMPTY    |              |  ...   |  key   |  ...   |
//! |----------|              |        |  value |        |
//! | TOMBSTONE|              |        |        |        |
//! |----------|               --------------------------
//! | ...      |
//!  ----------
//! ```
//!
//! o The metadata array is one byte per slot and is the only thing a probe
//!   scans. Keeping it dense and separate from the entries means a probe
//!   touches one or two cache lines before the first key comparison.
//!
//! o Capacity is always a power of two. The initial index for a 32-bit key
//!   hash `h` is `(h * 0x9E3779B9) >> shift`: a Fibonacci multiply spreads
//!   even identity-hashed integer keys, and the shift replaces a modulo.
//!
//! o Probe sequences advance by triangular numbers, which over a
//!   power-of-two ring visit every position exactly once. A cursor that
//!   would run off the end re-anchors from a rotated copy of the hash
//!   rather than wrapping.
//!
//! Three tables share that discipline and differ in how they scan:
//!
//! o [`DenseMap`] stores a 7-bit hash fingerprint per occupied slot and
//!   compares 16 metadata bytes at a time with a 128-bit vector equality,
//!   locating candidates at loads up to 0.9. Removal writes a tombstone
//!   that later inserts recycle. Requires SSE2 or NEON; construction
//!   reports [`Error::UnsupportedPlatform`] anywhere else.
//!
//! o [`QuadMap`] walks the same mathematics one slot at a time over a
//!   tri-state metadata byte. Simpler machinery, no platform demands.
//!
//! o [`RobinMap`] restricts keys to primitives ([`Key32`]) and exchanges
//!   fingerprints for a per-slot probe-sequence length, bounding every
//!   lookup and keeping entries in home order with Robin-Hood swaps.
//!
//! All tables are single-threaded with no internal synchronization;
//! callers requiring concurrent access must serialize externally, and a
//! reader-writer lock is the natural pairing. Iteration order is
//! unspecified and any mutation invalidates iterators; iteration runs from
//! the highest slot to the lowest so the entry just yielded can be removed
//! without disturbing what remains.
//!
//! # Usage
//!
//! ```
//! use baklava::DenseMap;
//!
//! # fn main() -> Result<(), baklava::Error> {
//! let mut map = DenseMap::new()?;
//! assert!(map.insert(1_u32, "one"));
//! assert!(!map.insert(1_u32, "uno"));
//! assert_eq!(map.get(&1), Some(&"one"));
//! assert!(map.update(&1, "first"));
//! assert!(map.remove(&1));
//! assert!(map.is_empty());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod dense;
mod error;
mod fib;
mod group;
pub mod hasher;
pub mod quad;
pub mod robin;
mod slot;

pub use crate::dense::DenseMap;
pub use crate::error::Error;
pub use crate::hasher::{
    Fnv1a32, Fnv1a32BuildHasher, IdentityBuildHasher, IdentityHasher, Key32,
};
pub use crate::quad::QuadMap;
pub use crate::robin::RobinMap;
