//! SIMD-accelerated dense hash table.
//!
//! [`DenseMap`] keeps two parallel flat arrays: one metadata byte per slot
//! and one key-value slot. A metadata byte is either the 7-bit fingerprint
//! of the occupant's hash or one of two sentinels (`EMPTY`, `TOMBSTONE`),
//! both of which have the sign bit set. Probing walks 16-slot groups: a
//! single vector compare of the group against a broadcast fingerprint
//! yields a bitmask of candidate slots, and only candidates pay for a key
//! comparison. A second compare against `EMPTY` decides whether the search
//! can stop.
//!
//! Groups advance through the table by triangular numbers scaled to the
//! group width (cumulative offsets 16, 48, 96, ...), which over a
//! power-of-two capacity visits every group exactly once. A cursor that
//! would run past the end re-anchors from a rotated copy of the hash
//! instead of wrapping, so a probe never loops over a dense upper region.
//!
//! Removal writes a tombstone. Tombstones do not terminate probes, so
//! inserts prefer recycling a tombstone over consuming a fresh empty slot
//! within the same group, and rehashing drops them entirely.

mod iter;

use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::ops::{Index, IndexMut};

use log::{debug, trace};

use crate::error::Error;
use crate::fib;
use crate::group::{is_full, Group, EMPTY, GROUP_WIDTH, TOMBSTONE};
use crate::hasher::{make_hash, Fnv1a32BuildHasher};
use crate::slot::Slot;

pub use self::iter::{Iter, Keys, Values};

/// Smallest capacity the dense table allocates.
const MIN_CAPACITY: usize = 16;

/// Ceiling on the load factor. Misses terminate on an empty slot, so some
/// slice of the table must stay empty.
const MAX_LOAD_FACTOR: f64 = 0.9;

/// A dense open-addressing hash table probed 16 slots at a time with a
/// 128-bit vector compare.
///
/// Keys and values must implement [`Default`]: vacated slots are
/// overwritten with default entries so the metadata array remains the only
/// occupancy oracle. Construction fails with
/// [`Error::UnsupportedPlatform`] on targets without SSE2 or NEON.
///
/// All operations are single-threaded; callers requiring concurrent access
/// must serialize externally.
#[derive(Clone)]
pub struct DenseMap<K, V, S = Fnv1a32BuildHasher> {
    meta: Vec<u8>,
    slots: Vec<Slot<K, V>>,
    capacity: usize,
    shift: u32,
    load_factor: f64,
    threshold: usize,
    count: usize,
    hasher: S,
}

impl<K, V> DenseMap<K, V>
where
    K: Hash + Eq + Default,
    V: Default,
{
    /// Create a table with the minimum capacity and the default load
    /// factor of 0.9.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] if the target has no 128-bit
    /// byte-equality vector compare.
    #[inline]
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Create a table that can hold at least `capacity` slots before its
    /// first rehash. The real capacity is the next power of two, floored
    /// at 16.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] if the target has no 128-bit
    /// byte-equality vector compare.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_capacity_and_hasher(capacity, Fnv1a32BuildHasher)
    }

    /// Create a table with the given capacity and load factor. Load
    /// factors above 0.9 are clamped to 0.9.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] if the target has no 128-bit
    /// byte-equality vector compare.
    #[inline]
    pub fn with_capacity_and_load_factor(
        capacity: usize,
        load_factor: f64,
    ) -> Result<Self, Error> {
        Self::with_capacity_and_load_factor_and_hasher(capacity, load_factor, Fnv1a32BuildHasher)
    }
}

impl<K, V, S> DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    /// Create a minimum-capacity table that hashes keys with `hasher`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] if the target has no 128-bit
    /// byte-equality vector compare.
    #[inline]
    pub fn with_hasher(hasher: S) -> Result<Self, Error> {
        Self::with_capacity_and_hasher(MIN_CAPACITY, hasher)
    }

    /// Create a table with the given capacity that hashes keys with
    /// `hasher`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] if the target has no 128-bit
    /// byte-equality vector compare.
    #[inline]
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, Error> {
        Self::with_capacity_and_load_factor_and_hasher(capacity, MAX_LOAD_FACTOR, hasher)
    }

    /// Create a table with the given capacity and load factor that hashes
    /// keys with `hasher`. Load factors above 0.9 are clamped to 0.9.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] if the target has no 128-bit
    /// byte-equality vector compare.
    pub fn with_capacity_and_load_factor_and_hasher(
        capacity: usize,
        load_factor: f64,
        hasher: S,
    ) -> Result<Self, Error> {
        if !Group::NATIVE {
            return Err(Error::UnsupportedPlatform);
        }
        debug_assert!(load_factor > 0.0);
        let load_factor = if load_factor > MAX_LOAD_FACTOR {
            MAX_LOAD_FACTOR
        } else {
            load_factor
        };
        let capacity = fib::capacity_for(capacity, MIN_CAPACITY);
        let mut slots = Vec::new();
        slots.resize_with(capacity + GROUP_WIDTH, Slot::default);
        Ok(Self {
            meta: vec![EMPTY; capacity + GROUP_WIDTH],
            slots,
            capacity,
            shift: fib::index_shift(capacity),
            load_factor,
            threshold: threshold(capacity, load_factor),
            count: 0,
            hasher,
        })
    }

    /// Number of live entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current slot capacity. Always a power of two; the backing arrays
    /// carry 16 additional padding slots beyond it.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The load factor this table rehashes at.
    #[inline]
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// The build hasher this table hashes keys with.
    #[inline]
    #[must_use]
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Insert `key` mapping to `value`.
    ///
    /// Returns `true` if a new entry was created and `false` if the key
    /// was already present; the existing value is left untouched. May
    /// trigger a rehash.
    #[must_use]
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = make_hash(&self.hasher, &key);
        if self.find(hash, &key).is_some() {
            return false;
        }
        if self.count >= self.threshold {
            self.resize();
        }
        self.insert_unique(hash, key, value);
        self.count += 1;
        true
    }

    /// Look up the value for `key`.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = make_hash(&self.hasher, key);
        let index = self.find(hash, key)?;
        Some(&self.slots[index].value)
    }

    /// Look up the value for `key` for in-place mutation.
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = make_hash(&self.hasher, key);
        let index = self.find(hash, key)?;
        Some(&mut self.slots[index].value)
    }

    /// Overwrite the value for an existing `key`.
    ///
    /// Returns `false`, leaving the table unchanged, if the key is absent.
    #[must_use]
    pub fn update(&mut self, key: &K, value: V) -> bool {
        let hash = make_hash(&self.hasher, key);
        match self.find(hash, key) {
            Some(index) => {
                self.slots[index].value = value;
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `key`, if present.
    ///
    /// The slot becomes a tombstone: later probes walk over it, later
    /// inserts may recycle it, and the next rehash retires it.
    #[must_use]
    pub fn remove(&mut self, key: &K) -> bool {
        let hash = make_hash(&self.hasher, key);
        match self.find(hash, key) {
            Some(index) => {
                self.meta[index] = TOMBSTONE;
                self.slots[index] = Slot::default();
                self.count -= 1;
                true
            }
            None => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        let hash = make_hash(&self.hasher, key);
        self.find(hash, key).is_some()
    }

    /// Drop every entry. Capacity is preserved.
    pub fn clear(&mut self) {
        for meta in self.meta.iter_mut() {
            *meta = EMPTY;
        }
        for slot in self.slots.iter_mut() {
            *slot = Slot::default();
        }
        self.count = 0;
        trace!("dense table cleared");
    }

    /// Iterate over the live entries, from the highest slot index to the
    /// lowest. Order is otherwise unspecified and any mutation invalidates
    /// it.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.meta, &self.slots, self.count)
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Slot index currently holding `key`, found by scanning the whole
    /// table by key equality. Intended for tests and diagnostics; the
    /// index is invalidated by any rehash.
    #[must_use]
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.meta
            .iter()
            .enumerate()
            .find(|&(index, &meta)| is_full(meta) && self.slots[index].key == *key)
            .map(|(index, _)| index)
    }

    /// Insert every live entry of `other` through the public insert path.
    /// Keys already present in `self` keep their current values.
    pub fn copy_from(&mut self, other: &Self)
    where
        K: Clone,
        V: Clone,
    {
        for (key, value) in other.iter() {
            let _ = self.insert(key.clone(), value.clone());
        }
    }

    /// Locate `key`, walking fingerprint matches group by group and
    /// stopping at the first group that contains an empty slot.
    fn find(&self, hash: u32, key: &K) -> Option<usize> {
        let h2 = fib::fingerprint(hash);
        let mut pos = fib::mix(hash, self.shift);
        let mut jump = 0_u32;
        loop {
            let group = Group::load(&self.meta[pos..]);
            for offset in group.match_byte(h2) {
                let index = pos + offset;
                if self.slots[index].key == *key {
                    return Some(index);
                }
            }
            if group.match_empty().any() {
                return None;
            }
            jump += GROUP_WIDTH as u32;
            pos += jump as usize;
            if pos >= self.capacity {
                pos = fib::reanchor_left(hash, jump, self.shift);
            }
        }
    }

    /// Place an entry known not to be in the table. Within each group a
    /// tombstone is preferred over an empty slot; tombstones do not stop
    /// probes, so recycling them keeps the effective load from creeping up.
    /// The scan does not look ahead to later groups for a tombstone.
    fn insert_unique(&mut self, hash: u32, key: K, value: V) {
        let h2 = fib::fingerprint(hash);
        let mut pos = fib::mix(hash, self.shift);
        let mut jump = 0_u32;
        loop {
            let group = Group::load(&self.meta[pos..]);
            if let Some(free) = group.match_free().first() {
                let offset = group.match_byte(TOMBSTONE).first().unwrap_or(free);
                let index = pos + offset;
                self.meta[index] = h2;
                self.slots[index] = Slot { key, value };
                return;
            }
            jump += GROUP_WIDTH as u32;
            pos += jump as usize;
            if pos >= self.capacity {
                pos = fib::reanchor_left(hash, jump, self.shift);
            }
        }
    }

    /// Double the capacity and replay every live entry through
    /// [`insert_unique`](Self::insert_unique). Tombstones are dropped and
    /// the live count is preserved.
    fn resize(&mut self) {
        let old_capacity = self.capacity;
        self.capacity *= 2;
        self.shift -= 1;
        self.threshold = threshold(self.capacity, self.load_factor);
        let old_meta = mem::replace(&mut self.meta, vec![EMPTY; self.capacity + GROUP_WIDTH]);
        let mut slots = Vec::new();
        slots.resize_with(self.capacity + GROUP_WIDTH, Slot::default);
        let mut old_slots = mem::replace(&mut self.slots, slots);
        for (index, &meta) in old_meta.iter().enumerate() {
            if is_full(meta) {
                let slot = mem::take(&mut old_slots[index]);
                let hash = make_hash(&self.hasher, &slot.key);
                self.insert_unique(hash, slot.key, slot.value);
            }
        }
        debug!(
            "dense table rehash: capacity {} -> {}, {} live entries",
            old_capacity, self.capacity, self.count
        );
    }
}

/// Entry count that triggers a rehash for the given capacity and load
/// factor.
#[inline]
fn threshold(capacity: usize, load_factor: f64) -> usize {
    (capacity as f64 * load_factor) as usize
}

impl<K, V, S> fmt::Debug for DenseMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(Iter::new(&self.meta, &self.slots, self.count))
            .finish()
    }
}

impl<K, V, S> Extend<(K, V)> for DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            let _ = self.insert(key, value);
        }
    }
}

impl<K, V, S> Index<&K> for DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is absent.
    #[inline]
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S> IndexMut<&K> for DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    /// Write access to an existing entry's value. The indexer cannot
    /// create entries.
    ///
    /// # Panics
    ///
    /// Panics if the key is absent.
    #[inline]
    fn index_mut(&mut self, key: &K) -> &mut V {
        self.get_mut(key).expect("no entry found for key")
    }
}

impl<'a, K, V, S> IntoIterator for &'a DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[cfg(any(
    target_arch = "x86_64",
    all(target_arch = "x86", target_feature = "sse2"),
    all(target_arch = "aarch64", target_feature = "neon")
))]
mod tests {
    use super::DenseMap;
    use crate::fib::GOLDEN_RATIO;
    use crate::hasher::IdentityBuildHasher;

    /// Multiplicative inverse of the Fibonacci constant modulo `2^32`.
    /// `key(m) * GOLDEN_RATIO == m`, which lets a test choose the exact
    /// mixed value and therefore the exact initial probe group.
    const GOLDEN_INVERSE: u32 = 0x144C_BC89;

    fn identity_map(capacity: usize) -> DenseMap<u32, u64, IdentityBuildHasher> {
        DenseMap::with_capacity_and_hasher(capacity, IdentityBuildHasher)
            .expect("simd support required for dense table tests")
    }

    #[test]
    fn golden_inverse_is_inverse() {
        assert_eq!(GOLDEN_RATIO.wrapping_mul(GOLDEN_INVERSE), 1);
    }

    #[test]
    fn insert_and_get() {
        let mut map = identity_map(16);
        assert!(map.insert(1, 100));
        assert!(map.insert(2, 200));
        assert!(map.insert(3, 300));
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&2), Some(&200));
        assert!(!map.contains(&4));
    }

    #[test]
    fn fills_to_load_factor_without_rehash() {
        // 14 entries stay under the 0.9 threshold of a 16-slot table.
        let mut map = identity_map(16);
        for key in 1..=14 {
            assert!(map.insert(key, u64::from(key) * u64::from(key)));
        }
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.len(), 14);
        assert_eq!(map.get(&7), Some(&49));
    }

    #[test]
    fn rehash_on_threshold() {
        let mut map = identity_map(16);
        for key in 1..=15 {
            assert!(map.insert(key, u64::from(key) * u64::from(key)));
        }
        assert_eq!(map.capacity(), 32);
        assert_eq!(map.len(), 15);
        for key in 1..=15_u32 {
            assert_eq!(map.get(&key), Some(&(u64::from(key) * u64::from(key))));
        }
    }

    #[test]
    fn remove_half_the_keys() {
        let mut map = identity_map(16);
        for key in 1..=100 {
            assert!(map.insert(key, u64::from(key) * u64::from(key)));
        }
        for key in (2..=100).step_by(2) {
            assert!(map.remove(&key));
        }
        assert_eq!(map.len(), 50);
        assert!(!map.contains(&2));
        assert!(map.contains(&51));
        assert_eq!(map.get(&99), Some(&9801));
    }

    #[test]
    fn update_overwrites_only_existing_keys() {
        let mut map: DenseMap<u32, String, _> = DenseMap::with_hasher(IdentityBuildHasher)
            .expect("simd support required for dense table tests");
        assert!(map.insert(42, String::from("a")));
        assert!(map.update(&42, String::from("b")));
        assert!(!map.update(&43, String::from("x")));
        assert_eq!(map.get(&42), Some(&String::from("b")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn duplicate_insert_keeps_first_value() {
        let mut map = identity_map(16);
        assert!(map.insert(9, 1));
        assert!(!map.insert(9, 2));
        assert_eq!(map.get(&9), Some(&1));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn adversarial_collisions_survive_rehash() {
        // Every key mixes to initial index zero: key(m) = m * GOLDEN_INVERSE
        // makes the mixed product equal m, and m < 2^shift for all shifts
        // involved, so the whole workload lands on one probe group until
        // rehashes spread it.
        let mut map = identity_map(16);
        for m in 0..50_u32 {
            let key = m.wrapping_mul(GOLDEN_INVERSE);
            assert!(map.insert(key, u64::from(m)));
        }
        assert_eq!(map.len(), 50);
        for m in 0..50_u32 {
            let key = m.wrapping_mul(GOLDEN_INVERSE);
            assert_eq!(map.get(&key), Some(&u64::from(m)));
        }
    }

    #[test]
    fn capacity_rounds_up() {
        let map: DenseMap<u32, u32> = DenseMap::with_capacity(20).expect("simd support");
        assert_eq!(map.capacity(), 32);
        let map: DenseMap<u32, u32> = DenseMap::with_capacity(0).expect("simd support");
        assert_eq!(map.capacity(), 16);
    }

    #[test]
    fn load_factor_clamps_to_ceiling() {
        let map: DenseMap<u32, u32> =
            DenseMap::with_capacity_and_load_factor(16, 2.5).expect("simd support");
        assert!((map.load_factor() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn insert_remove_cycles_do_not_grow_capacity() {
        let mut map = identity_map(16);
        for _ in 0..10_000 {
            assert!(map.insert(7, 7));
            assert!(map.remove(&7));
        }
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), 16);
        assert!(!map.contains(&7));
    }

    #[test]
    fn tombstones_are_recycled_in_place() {
        let mut map = identity_map(16);
        assert!(map.insert(5, 50));
        let index = map.index_of(&5).expect("live entry has a slot");
        assert!(map.remove(&5));
        assert!(map.insert(5, 51));
        assert_eq!(map.index_of(&5), Some(index));
    }

    #[test]
    fn iteration_yields_each_live_entry_once() {
        let mut map = identity_map(16);
        for key in 0..40 {
            assert!(map.insert(key, u64::from(key)));
        }
        assert!(map.remove(&11));
        let mut seen = map.iter().map(|(&key, _)| key).collect::<Vec<_>>();
        assert_eq!(seen.len(), map.len());
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), map.len());
        assert!(!seen.contains(&11));
    }

    #[test]
    fn clear_resets_count_and_keeps_capacity() {
        let mut map = identity_map(16);
        for key in 0..30 {
            assert!(map.insert(key, 1));
        }
        let capacity = map.capacity();
        map.clear();
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), capacity);
        assert!(!map.contains(&3));
        assert!(map.insert(3, 3));
    }

    #[test]
    fn copy_from_inserts_through_public_path() {
        let mut source = identity_map(16);
        assert!(source.insert(1, 10));
        assert!(source.insert(2, 20));
        let mut target = identity_map(16);
        assert!(target.insert(2, 99));
        target.copy_from(&source);
        assert_eq!(target.len(), 2);
        assert_eq!(target.get(&1), Some(&10));
        // Pre-existing keys keep their values.
        assert_eq!(target.get(&2), Some(&99));
    }

    #[test]
    fn index_returns_value() {
        let mut map = identity_map(16);
        assert!(map.insert(8, 80));
        assert_eq!(map[&8], 80);
    }

    #[test]
    fn index_mut_writes_existing_entry() {
        let mut map = identity_map(16);
        assert!(map.insert(8, 80));
        map[&8] = 81;
        assert_eq!(map.get(&8), Some(&81));
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn index_panics_on_missing_key() {
        let map = identity_map(16);
        let _ = map[&1];
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn index_mut_panics_on_missing_key() {
        let mut map = identity_map(16);
        map[&1] = 2;
    }
}
