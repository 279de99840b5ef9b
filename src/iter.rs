//! Traversal: the borrowing iterator and the mutation-tolerant safe
//! cursor.
//!
//! Both share one order: ascending bucket index, chain order within a
//! bucket (most recently inserted first), `tables[0]` first, and then
//! `tables[1]` from bucket 0 while a rehash is in progress.
//!
//! [`Iter`] borrows the dict shared, and every mutating operation takes
//! `&mut self`, so mutating during iteration is a compile error: a
//! stale-read hazard is rejected at compile time rather than detected
//! after the fact.
//!
//! [`SafeIter`] is a detached cursor driven through the dict, for
//! callers that interleave mutation with traversal. Creating one pauses
//! opportunistic rehash steps so bucket positions stay put until it is
//! released.

use crate::dict::{Dict, Handle};
use crate::table::EntryKey;

/// Borrowing iterator over every live entry.
pub struct Iter<'a, K, V, S> {
    dict: &'a Dict<K, V, S>,
    table: usize,
    index: usize,
    entry: Option<EntryKey>,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (Handle, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let dict = self.dict;
        loop {
            if let Some(k) = self.entry {
                let e = &dict.slots[k];
                self.entry = e.next;
                return Some((Handle(k), &e.key, &e.value));
            }
            let t = &dict.tables[self.table];
            if self.index >= t.size() {
                if dict.is_rehashing() && self.table == 0 {
                    self.table = 1;
                    self.index = 0;
                    continue;
                }
                return None;
            }
            self.entry = t.buckets[self.index];
            self.index += 1;
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a Dict<K, V, S> {
    type Item = (Handle, &'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Detached cursor for traversal interleaved with mutation.
///
/// The caller may insert and remove freely between [`Dict::safe_next`]
/// calls, including removing the entry just returned (its successor is
/// saved beforehand). Removing a not-yet-visited entry may skip the
/// remainder of that one chain; it never misbehaves further, because a
/// saved position whose entry is gone is detected through the arena's
/// generational keys.
#[must_use = "safe iterators pause rehashing until passed to Dict::release_iter"]
pub struct SafeIter {
    table: usize,
    index: isize,
    entry: Option<EntryKey>,
    next_entry: Option<EntryKey>,
}

impl<K, V, S> Dict<K, V, S> {
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            dict: self,
            table: 0,
            index: 0,
            entry: None,
        }
    }

    /// Open a safe cursor. Suppresses opportunistic rehash steps until
    /// released; nesting is permitted and counted.
    pub fn safe_iter(&mut self) -> SafeIter {
        self.pause_rehash += 1;
        SafeIter {
            table: 0,
            index: -1,
            entry: None,
            next_entry: None,
        }
    }

    /// Advance a safe cursor, returning the next entry or `None` once
    /// exhausted.
    pub fn safe_next(&mut self, it: &mut SafeIter) -> Option<Handle> {
        loop {
            if it.entry.is_none() {
                it.index += 1;
                if it.index >= self.tables[it.table].size() as isize {
                    if self.is_rehashing() && it.table == 0 {
                        it.table = 1;
                        it.index = 0;
                    } else {
                        return None;
                    }
                }
                let idx = it.index as usize;
                it.entry = self.tables[it.table].buckets.get(idx).copied().flatten();
            } else {
                // successor saved when the previous entry was handed
                // out; the caller may have removed it since
                it.entry = it.next_entry.filter(|&k| self.slots.contains_key(k));
            }
            if let Some(k) = it.entry {
                it.next_entry = self.slots[k].next;
                return Some(Handle(k));
            }
        }
    }

    /// Close a safe cursor, resuming opportunistic rehash progress once
    /// every open cursor has been released.
    pub fn release_iter(&mut self, it: SafeIter) {
        let _ = it;
        debug_assert!(self.pause_rehash > 0);
        self.pause_rehash -= 1;
    }
}
