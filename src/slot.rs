//! Flat entry storage shared by the three tables.

/// A key-value pair occupying one position of an entry array.
///
/// A slot is meaningful only while the parallel metadata byte marks the
/// position as occupied; the metadata array is the sole occupancy oracle.
/// Vacant positions hold default-constructed slots so that removal and
/// `clear` drop dead keys and values at the moment they die.
#[derive(Debug, Clone, Default)]
pub(crate) struct Slot<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}
