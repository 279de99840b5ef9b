//! Core dictionary: two bucket tables over one entry arena, the keyed
//! operations, and the load-factor resize policy.

use crate::config::Config;
use crate::table::{Entry, EntryKey, Table};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use slotmap::SlotMap;
use std::collections::hash_map::RandomState;

/// Stable reference to one entry. Copyable; survives rehashing (entry
/// identity never changes, only bucket membership does). A handle for a
/// removed entry never resolves and never aliases a later entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(pub(crate) EntryKey);

impl Handle {
    /// Borrow the entry's key, if the entry is still live.
    pub fn key<'a, K, V, S>(&self, dict: &'a Dict<K, V, S>) -> Option<&'a K> {
        dict.slots.get(self.0).map(|e| &e.key)
    }

    /// Borrow the entry's value, if the entry is still live.
    pub fn value<'a, K, V, S>(&self, dict: &'a Dict<K, V, S>) -> Option<&'a V> {
        dict.slots.get(self.0).map(|e| &e.value)
    }

    /// Mutably borrow the entry's value, if the entry is still live.
    pub fn value_mut<'a, K, V, S>(&self, dict: &'a mut Dict<K, V, S>) -> Option<&'a mut V> {
        dict.slots.get_mut(self.0).map(|e| &mut e.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    DuplicateKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeError {
    /// A rehash is already migrating entries; no new target may be
    /// installed until it drains.
    RehashInProgress,
    /// The requested capacity is below the current entry count.
    WouldDropEntries,
    /// The request rounds to the size already in place.
    AlreadySized,
    /// Automatic resizing is administratively disabled.
    ResizeDisabled,
}

/// Outcome of [`Dict::replace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replaced {
    /// The key was absent; a new entry was created.
    Inserted(Handle),
    /// The key was present; its value was overwritten.
    Updated(Handle),
}

/// A chained hash table that resizes in bounded increments and supports
/// resumable, resize-tolerant scans. See the crate docs for the model.
pub struct Dict<K, V, S = RandomState> {
    /// Index 0 is the active table; index 1 is the migration target,
    /// allocated only while rehashing.
    pub(crate) tables: [Table; 2],
    /// All entries of both tables, addressed by generational keys.
    pub(crate) slots: SlotMap<EntryKey, Entry<K, V>>,
    /// -1 when idle; otherwise the next `tables[0]` bucket to migrate.
    /// Buckets below it are already drained.
    pub(crate) rehash_idx: isize,
    /// Live safe iterators plus in-flight scan calls. Non-zero
    /// suppresses opportunistic rehash steps.
    pub(crate) pause_rehash: u32,
    pub(crate) config: Config,
    pub(crate) hasher: S,
    pub(crate) rng: SmallRng,
}

impl<K, V> Dict<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_config_and_hasher(Config::default(), RandomState::new())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V> Default for Dict<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Dict<K, V, S> {
    /// Live entries across both tables.
    pub fn len(&self) -> usize {
        self.tables[0].used + self.tables[1].used
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated buckets across both tables.
    pub fn capacity(&self) -> usize {
        self.tables[0].size() + self.tables[1].size()
    }

    #[inline]
    pub fn is_rehashing(&self) -> bool {
        self.rehash_idx != -1
    }

    /// Allow load-factor growth on insertion.
    pub fn enable_resize(&mut self) {
        self.config.resize_enabled = true;
    }

    /// Refuse load-factor growth on insertion, except past the force
    /// ratio. Does not abort a rehash already in progress.
    pub fn disable_resize(&mut self) {
        self.config.resize_enabled = false;
    }

    /// Drop every entry and return to the never-allocated state.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.tables[0].reset();
        self.tables[1].reset();
        self.rehash_idx = -1;
    }
}

impl<K, V, S> Dict<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(Config::default(), hasher)
    }

    pub fn with_config_and_hasher(config: Config, hasher: S) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Dict {
            tables: [Table::new(), Table::new()],
            slots: SlotMap::with_key(),
            rehash_idx: -1,
            pause_rehash: 0,
            config,
            hasher,
            rng,
        }
    }

    fn hash_query<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Search both active tables for an entry matching `hash`/`eq`.
    /// The stored hash short-circuits `Eq`; `tables[0]` buckets below
    /// the rehash cursor are skipped (already drained).
    fn lookup_by(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<EntryKey> {
        for t in 0..2 {
            let table = &self.tables[t];
            if !table.is_unallocated() {
                let idx = (hash as usize) & table.mask;
                if !(t == 0 && (idx as isize) < self.rehash_idx) {
                    let mut cur = table.buckets[idx];
                    while let Some(k) = cur {
                        let e = &self.slots[k];
                        if e.hash == hash && eq(&e.key) {
                            return Some(k);
                        }
                        cur = e.next;
                    }
                }
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    /// Push a new entry at the chain head of the given bucket.
    fn link(&mut self, table: usize, bucket: usize, key: K, value: V, hash: u64) -> EntryKey {
        let head = self.tables[table].buckets[bucket];
        let k = self.slots.insert(Entry {
            key,
            value,
            hash,
            next: head,
        });
        self.tables[table].buckets[bucket] = Some(k);
        self.tables[table].used += 1;
        k
    }

    /// Common front half of every insertion: one opportunistic rehash
    /// step, the resize policy, the duplicate check, and selection of
    /// the write target (`tables[1]` iff rehashing). Returns the target
    /// (table, bucket) or the existing entry.
    fn insert_slot(&mut self, hash: u64, key: &K) -> Result<(usize, usize), EntryKey> {
        self.rehash_step();
        self.expand_if_needed();
        if let Some(existing) = self.lookup_by(hash, |k| k == key) {
            return Err(existing);
        }
        let table = if self.is_rehashing() { 1 } else { 0 };
        let bucket = (hash as usize) & self.tables[table].mask;
        Ok((table, bucket))
    }

    /// Insert a new key -> value pair. Fails without mutation if the
    /// key is already present in either table.
    pub fn insert(&mut self, key: K, value: V) -> Result<Handle, InsertError> {
        let hash = self.hash_query(&key);
        match self.insert_slot(hash, &key) {
            Ok((t, b)) => Ok(Handle(self.link(t, b, key, value, hash))),
            Err(_) => Err(InsertError::DuplicateKey),
        }
    }

    /// As [`Dict::insert`], but the value is produced only when the key
    /// turns out to be absent.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> Result<Handle, InsertError>
    where
        F: FnOnce() -> V,
    {
        let hash = self.hash_query(&key);
        match self.insert_slot(hash, &key) {
            Ok((t, b)) => {
                let value = default();
                Ok(Handle(self.link(t, b, key, value, hash)))
            }
            Err(_) => Err(InsertError::DuplicateKey),
        }
    }

    /// Return the entry for `key`, creating it with `default` when
    /// absent. The bool reports whether an insertion happened.
    pub fn find_or_insert<F>(&mut self, key: K, default: F) -> (Handle, bool)
    where
        F: FnOnce() -> V,
    {
        let hash = self.hash_query(&key);
        match self.insert_slot(hash, &key) {
            Ok((t, b)) => {
                let value = default();
                (Handle(self.link(t, b, key, value, hash)), true)
            }
            Err(existing) => (Handle(existing), false),
        }
    }

    /// Insert or overwrite. On overwrite the new value is written into
    /// the slot before the old one is dropped, so reference-counted
    /// values see increment-then-decrement even when old and new alias
    /// the same allocation.
    pub fn replace(&mut self, key: K, value: V) -> Replaced {
        let hash = self.hash_query(&key);
        match self.insert_slot(hash, &key) {
            Ok((t, b)) => Replaced::Inserted(Handle(self.link(t, b, key, value, hash))),
            Err(existing) => {
                let old = mem::replace(&mut self.slots[existing].value, value);
                drop(old);
                Replaced::Updated(Handle(existing))
            }
        }
    }

    /// Locate a key. Performs one opportunistic rehash step when a
    /// rehash is in progress.
    pub fn find<Q>(&mut self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.hash_query(key);
        self.lookup_by(hash, |k| k.borrow() == key).map(Handle)
    }

    /// Borrow the value for `key`.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(key)?;
        self.slots.get(h.0).map(|e| &e.value)
    }

    /// Mutably borrow the value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(key)?;
        self.slots.get_mut(h.0).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).is_some()
    }

    /// Unlink the entry for `key` and hand its parts back to the
    /// caller. The structure is fully consistent before the returned
    /// key/value can run any `Drop` code, so destructors may reenter
    /// the dict safely.
    pub fn take<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let hash = self.hash_query(key);
        for t in 0..2 {
            if !self.tables[t].is_unallocated() {
                let idx = (hash as usize) & self.tables[t].mask;
                if !(t == 0 && (idx as isize) < self.rehash_idx) {
                    let mut prev: Option<EntryKey> = None;
                    let mut cur = self.tables[t].buckets[idx];
                    while let Some(k) = cur {
                        let e = &self.slots[k];
                        let next = e.next;
                        if e.hash == hash && e.key.borrow() == key {
                            match prev {
                                Some(p) => self.slots[p].next = next,
                                None => self.tables[t].buckets[idx] = next,
                            }
                            self.tables[t].used -= 1;
                            let e = self.slots.remove(k).unwrap();
                            return Some((e.key, e.value));
                        }
                        prev = cur;
                        cur = next;
                    }
                }
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    /// Remove the entry for `key`, dropping its key and value in place.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(key).is_some()
    }

    /// Install a table sized for `capacity` (rounded up to a power of
    /// two, floored at the configured initial capacity). The first
    /// allocation installs directly into slot 0; any later call
    /// installs the migration target and starts a rehash.
    pub fn expand(&mut self, capacity: usize) -> Result<(), ResizeError> {
        if self.is_rehashing() {
            return Err(ResizeError::RehashInProgress);
        }
        if capacity < self.len() {
            return Err(ResizeError::WouldDropEntries);
        }
        let size = self.next_table_size(capacity);
        if size == self.tables[0].size() {
            return Err(ResizeError::AlreadySized);
        }
        let fresh = Table::with_pow2_size(size);
        if self.tables[0].is_unallocated() {
            self.tables[0] = fresh;
            return Ok(());
        }
        self.tables[1] = fresh;
        self.rehash_idx = 0;
        Ok(())
    }

    /// Request the smallest table accommodating the current entry
    /// count. Starts a (possibly shrinking) rehash.
    pub fn shrink_to_fit(&mut self) -> Result<(), ResizeError> {
        if !self.config.resize_enabled {
            return Err(ResizeError::ResizeDisabled);
        }
        if self.is_rehashing() {
            return Err(ResizeError::RehashInProgress);
        }
        self.expand(self.len())
    }

    fn next_table_size(&self, capacity: usize) -> usize {
        let target = capacity.max(self.config.initial_capacity).max(1);
        target
            .checked_next_power_of_two()
            .unwrap_or(1 << (usize::BITS - 1))
    }

    /// Load-factor policy, run before every insertion. First insertion
    /// allocates the initial table. Past `used >= size`, grow to twice
    /// the entry count, unless resizing is disabled and the load is
    /// still under the force ratio.
    fn expand_if_needed(&mut self) {
        if self.is_rehashing() {
            return;
        }
        if self.tables[0].is_unallocated() {
            let initial = self.config.initial_capacity;
            let _ = self.expand(initial);
            return;
        }
        let used = self.tables[0].used;
        let size = self.tables[0].size();
        if used >= size
            && (self.config.resize_enabled || used / size > self.config.force_resize_ratio)
        {
            let _ = self.expand(used * 2);
        }
    }
}
