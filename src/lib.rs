//! stepmap: a single-threaded hash map that resizes in bounded steps,
//! for event loops that cannot afford a stop-the-world rehash.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep every operation a small, bounded unit of work, growth
//!   included, while supporting full traversals that stay correct
//!   across resizes.
//! - Layers:
//!   - table: the leaf data model. Entries live in a slotmap arena
//!     behind generational keys; a bucket table is a flat power-of-two
//!     array of chain heads with intrusive `next` links.
//!   - dict: `Dict<K, V, S>` owns two tables ("active" and "migration
//!     target"), the arena, and the rehash cursor. Keyed operations
//!     (insert family, replace, find/get, take/remove) consult both
//!     tables while a rehash is in flight and land writes in the
//!     target. `Handle` is a copyable stable reference to one entry.
//!   - rehash: stepwise migration. Each keyed operation donates one
//!     bounded step; explicit `rehash`/`rehash_for` drain harder. A
//!     step relinks whole buckets by stored hash.
//!   - iter: a borrowing iterator (mutation is a compile error) and a
//!     detached safe cursor (mutation tolerated, rehash paused).
//!   - scan: stateless resumable traversal on a reverse-binary cursor,
//!     correct across power-of-two resizes between calls.
//!   - sample: uniform and batch random entry retrieval.
//!
//! Constraints
//! - Single mutator: all mutation goes through `&mut self`; there is no
//!   internal locking and no atomics. The design bounds latency, not
//!   parallelism.
//! - Entries own their key and value; `Drop` runs exactly once, only
//!   after the structure is consistent (unlink before destroy).
//! - Each entry stores its `u64` hash; `K: Hash` runs once at
//!   insertion, so migration and lookup short-circuits never call user
//!   code with the structure mid-change.
//! - Policy is per-instance (`Config`), not process-global: initial
//!   capacity, force-resize ratio, resize flag, RNG seed.
//!
//! Invariants
//! - Table sizes are 0 or powers of two; `mask = size - 1`.
//! - While rehashing, the migration target exists and receives every
//!   new insertion; buckets of the active table below the rehash cursor
//!   are empty.
//! - `len()` equals the entries reachable from both tables' buckets.
//! - Safe cursors and in-flight scan calls hold a counted pause on
//!   opportunistic migration; progress resumes at zero.

mod config;
mod dict;
mod dict_proptest;
mod iter;
mod rehash;
mod sample;
mod scan;
mod table;
mod value;

// Public surface
pub use config::{Config, FORCE_RESIZE_RATIO, INITIAL_CAPACITY};
pub use dict::{Dict, Handle, InsertError, Replaced, ResizeError};
pub use iter::{Iter, SafeIter};
pub use value::Value;
