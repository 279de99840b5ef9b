//! Incremental migration between the two tables.
//!
//! Migration relinks arena keys using each entry's stored hash, so no
//! user code (`Hash`, `Eq`, `Drop`) ever runs during a step and entry
//! identity is preserved.

use crate::dict::Dict;
use crate::table::Table;
use core::mem;
use std::time::{Duration, Instant};

impl<K, V, S> Dict<K, V, S> {
    /// Migrate up to `n` non-empty buckets from `tables[0]` into
    /// `tables[1]`. Visits at most `n * 10` empty buckets, so a single
    /// call stays bounded even on a sparse table. Returns `true` while
    /// work remains, `false` once the rehash has completed (or none was
    /// in progress).
    ///
    /// Only the opportunistic per-operation step is suppressed by live
    /// safe iterators; driving this explicitly while one is open moves
    /// buckets underneath it.
    pub fn rehash(&mut self, n: usize) -> bool {
        if !self.is_rehashing() {
            return false;
        }
        let mut budget = n;
        let mut empty_visits = n.saturating_mul(10);
        while budget > 0 && self.tables[0].used != 0 {
            budget -= 1;
            let mut idx = self.rehash_idx as usize;
            debug_assert!(idx < self.tables[0].size());
            while self.tables[0].buckets[idx].is_none() {
                idx += 1;
                self.rehash_idx = idx as isize;
                empty_visits -= 1;
                if empty_visits == 0 {
                    return true;
                }
            }
            self.migrate_bucket(idx);
            self.rehash_idx = idx as isize + 1;
        }
        if self.tables[0].used == 0 {
            self.tables[0] = mem::replace(&mut self.tables[1], Table::new());
            self.rehash_idx = -1;
            return false;
        }
        true
    }

    /// Relink every entry of one `tables[0]` bucket into its position
    /// in `tables[1]`. Chain order within the destination is reversed
    /// relative to the source (head insertion), which is unobservable:
    /// chain order is only meaningful to iterators, and those hold the
    /// rehash paused.
    fn migrate_bucket(&mut self, idx: usize) {
        let mut cur = self.tables[0].buckets[idx].take();
        while let Some(k) = cur {
            let next = self.slots[k].next;
            let dest = (self.slots[k].hash as usize) & self.tables[1].mask;
            let head = self.tables[1].buckets[dest].replace(k);
            self.slots[k].next = head;
            self.tables[0].used -= 1;
            self.tables[1].used += 1;
            cur = next;
        }
    }

    /// Run 100-bucket batches until the rehash completes or the wall
    /// clock exceeds `budget`. Returns the number of buckets processed,
    /// rounded to the batch size.
    pub fn rehash_for(&mut self, budget: Duration) -> usize {
        let start = Instant::now();
        let mut buckets = 0;
        while self.rehash(100) {
            buckets += 100;
            if start.elapsed() >= budget {
                break;
            }
        }
        buckets
    }

    /// The opportunistic slice of migration work done by every keyed
    /// operation: a single bucket, and only while no safe iterator or
    /// scan call holds the rehash paused.
    pub(crate) fn rehash_step(&mut self) {
        if self.pause_rehash == 0 {
            self.rehash(1);
        }
    }
}
