//! Random element retrieval.
//!
//! Three tiers: `random_entry` (uniform bucket, chain-corrected),
//! `sample` (bounded-cost batch from a contiguous run of buckets), and
//! `fair_random_entry` (batch pick with a guaranteed fallback). The
//! batch path flattens the short-chain bias a single bucket pick
//! carries, at the cost of weaker guarantees on the returned count.

use crate::dict::{Dict, Handle};
use rand::Rng;

/// Batch drawn by `fair_random_entry`. Tuning value, not contract.
const FAIR_SAMPLE_SIZE: usize = 15;

/// Consecutive empty buckets tolerated before `sample` jumps to a
/// fresh random position (jointly with the requested count). Tuning
/// value, not contract.
const EMPTY_RUN_JUMP: usize = 5;

impl<K, V, S> Dict<K, V, S> {
    /// Return one entry, approximately uniformly. Picks a uniformly
    /// random non-empty bucket (over the combined un-drained space of
    /// both tables while rehashing), then a uniformly random position
    /// along its chain; the counted walk corrects the bias a plain
    /// head pick would give entries in short chains.
    pub fn random_entry(&mut self) -> Option<Handle> {
        if self.is_empty() {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let head = if self.is_rehashing() {
            let s0 = self.tables[0].size();
            let s1 = self.tables[1].size();
            let start = self.rehash_idx as usize;
            loop {
                // buckets of table 0 below the cursor are drained
                let h = start + self.rng.random_range(0..s0 + s1 - start);
                let head = if h >= s0 {
                    self.tables[1].buckets[h - s0]
                } else {
                    self.tables[0].buckets[h]
                };
                if let Some(k) = head {
                    break k;
                }
            }
        } else {
            loop {
                let h = (self.rng.random::<u64>() as usize) & self.tables[0].mask;
                if let Some(k) = self.tables[0].buckets[h] {
                    break k;
                }
            }
        };

        let mut len = 0usize;
        let mut cur = Some(head);
        while let Some(k) = cur {
            len += 1;
            cur = self.slots[k].next;
        }
        let mut pos = self.rng.random_range(0..len);
        let mut k = head;
        while pos > 0 {
            k = self.slots[k].next.unwrap();
            pos -= 1;
        }
        Some(Handle(k))
    }

    /// Best-effort batch sampler: walks forward from a random bucket
    /// across both tables, collecting every entry of every non-empty
    /// bucket visited, within a `count * 10` step budget. May return
    /// fewer than `count` entries (even zero) and makes no duplicate
    /// guarantee across calls; it is meant for "give me a few mostly
    /// random entries fast", not for uniform selection.
    pub fn sample(&mut self, count: usize) -> Vec<Handle> {
        let count = count.min(self.len());
        if count == 0 {
            return Vec::new();
        }
        // migration work proportional to the request
        for _ in 0..count {
            if !self.is_rehashing() {
                break;
            }
            self.rehash_step();
        }

        let tables = if self.is_rehashing() { 2 } else { 1 };
        let mut maxmask = self.tables[0].mask;
        if tables > 1 && self.tables[1].mask > maxmask {
            maxmask = self.tables[1].mask;
        }

        let mut i = (self.rng.random::<u64>() as usize) & maxmask;
        let mut empty_run = 0usize;
        let mut out = Vec::with_capacity(count);
        let mut steps = count * 10;
        while out.len() < count && steps > 0 {
            steps -= 1;
            for t in 0..tables {
                if tables == 2 && t == 0 && i < self.rehash_idx as usize {
                    // the drained prefix of table 0 holds nothing; when
                    // past the end of table 1 as well (shrink), skip
                    // straight to the cursor
                    if i >= self.tables[1].size() {
                        i = self.rehash_idx as usize;
                    } else {
                        continue;
                    }
                }
                if i >= self.tables[t].size() {
                    continue;
                }
                let mut cur = self.tables[t].buckets[i];
                if cur.is_none() {
                    empty_run += 1;
                    if empty_run >= EMPTY_RUN_JUMP && empty_run > count {
                        i = (self.rng.random::<u64>() as usize) & maxmask;
                        empty_run = 0;
                    }
                } else {
                    empty_run = 0;
                    while let Some(k) = cur {
                        out.push(Handle(k));
                        cur = self.slots[k].next;
                        if out.len() == count {
                            return out;
                        }
                    }
                }
            }
            i = (i + 1) & maxmask;
        }
        out
    }

    /// Return one entry with flatter bias than [`Dict::random_entry`]:
    /// draw a small batch from a contiguous bucket run and pick
    /// uniformly within it. Falls back to `random_entry` when the
    /// bounded batch walk comes back empty, so a non-empty dict always
    /// yields an entry.
    pub fn fair_random_entry(&mut self) -> Option<Handle> {
        let batch = self.sample(FAIR_SAMPLE_SIZE);
        if batch.is_empty() {
            return self.random_entry();
        }
        let idx = self.rng.random_range(0..batch.len());
        Some(batch[idx])
    }
}
