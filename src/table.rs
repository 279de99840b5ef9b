//! Leaf data model: arena entry records and the flat bucket table.

use slotmap::DefaultKey;

/// Arena key identifying one entry. Generational: a key for a removed
/// entry never resolves again, even if its physical slot is reused.
pub(crate) type EntryKey = DefaultKey;

/// One stored entry. The hash is computed once at insertion and reused
/// for every later placement decision, so `K: Hash` never runs again
/// after the entry exists; migration between tables is pure relinking.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    /// Next entry in this bucket's chain. Non-owning.
    pub(crate) next: Option<EntryKey>,
}

/// A flat array of chain heads. The size is 0 (never allocated) or a
/// power of two; `mask = size - 1`, so bucket selection is `hash & mask`.
#[derive(Debug, Default)]
pub(crate) struct Table {
    pub(crate) buckets: Vec<Option<EntryKey>>,
    pub(crate) mask: usize,
    pub(crate) used: usize,
}

impl Table {
    pub(crate) fn new() -> Self {
        Table {
            buckets: Vec::new(),
            mask: 0,
            used: 0,
        }
    }

    /// `size` must be a power of two.
    pub(crate) fn with_pow2_size(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Table {
            buckets: vec![None; size],
            mask: size - 1,
            used: 0,
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn is_unallocated(&self) -> bool {
        self.buckets.is_empty()
    }

    pub(crate) fn reset(&mut self) {
        self.buckets = Vec::new();
        self.mask = 0;
        self.used = 0;
    }
}
