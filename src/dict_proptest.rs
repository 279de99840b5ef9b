#![cfg(test)]

// Property tests for Dict kept inside the crate so they can check
// internal invariants (table sizes, used counts) alongside the model.

use crate::dict::{Dict, Handle, InsertError, Replaced};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::BuildHasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to
// earlier keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertWith(usize, i32),
    FindOrInsert(usize, i32),
    Replace(usize, i32),
    Remove(usize),
    Take(usize),
    Find(usize),
    Get(usize),
    Contains(String),
    Iterate,
    ScanAll,
    Rehash(u8),
    Shrink,
    SetResize(bool),
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertWith(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::FindOrInsert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Replace(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Take),
            idx.clone().prop_map(OpI::Find),
            idx.clone().prop_map(OpI::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            Just(OpI::Iterate),
            Just(OpI::ScanAll),
            (0u8..6).prop_map(OpI::Rehash),
            Just(OpI::Shrink),
            any::<bool>().prop_map(OpI::SetResize),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Shared runner: drives the dict and a std HashMap model through one
// op sequence, asserting parity and structural invariants after every
// step.
fn run_scenario<S: BuildHasher>(
    sut: &mut Dict<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(h) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        let prev = live.insert(k.clone(), h);
                        prop_assert!(prev.is_none());
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                }
            }
            OpI::InsertWith(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let mut calls = 0;
                let res = sut.insert_with(k.clone(), || {
                    calls += 1;
                    v
                });
                match res {
                    Ok(h) => {
                        prop_assert!(!already);
                        prop_assert_eq!(calls, 1, "default runs exactly once on success");
                        live.insert(k.clone(), h);
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already);
                        prop_assert_eq!(calls, 0, "default must not run on duplicate");
                    }
                }
            }
            OpI::FindOrInsert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let (h, inserted) = sut.find_or_insert(k.clone(), || v);
                prop_assert_eq!(inserted, !already);
                if inserted {
                    live.insert(k.clone(), h);
                    model.insert(k, v);
                } else {
                    prop_assert_eq!(live.get(&k), Some(&h), "existing handle is stable");
                    prop_assert_eq!(h.value(sut), model.get(&k));
                }
            }
            OpI::Replace(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                match sut.replace(k.clone(), v) {
                    Replaced::Inserted(h) => {
                        prop_assert!(!already);
                        live.insert(k.clone(), h);
                    }
                    Replaced::Updated(h) => {
                        prop_assert!(already);
                        prop_assert_eq!(live.get(&k), Some(&h));
                    }
                }
                model.insert(k, v);
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                let removed = sut.remove(k.0.as_str());
                prop_assert_eq!(removed, model.remove(&k).is_some());
                if removed {
                    stale.push(live.remove(&k).expect("tracked live handle"));
                }
            }
            OpI::Take(i) => {
                let k = key_from(&pool, i);
                match sut.take(k.0.as_str()) {
                    Some((kk, vv)) => {
                        prop_assert!(kk == k);
                        let mv = model.remove(&kk).expect("present in model");
                        prop_assert_eq!(vv, mv);
                        stale.push(live.remove(&k).expect("tracked live handle"));
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let found = sut.find(k.0.as_str());
                prop_assert_eq!(found.is_some(), model.contains_key(&k));
                if let Some(h) = found {
                    prop_assert_eq!(live.get(&k), Some(&h), "handle stable across rehash");
                }
            }
            OpI::Get(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.get(k.0.as_str()), model.get(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<Key> = sut.iter().map(|(_, k, _)| k.clone()).collect();
                let m_keys: BTreeSet<Key> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::ScanAll => {
                let mut seen: BTreeSet<Key> = BTreeSet::new();
                let mut cursor = 0;
                let mut rounds = 0;
                loop {
                    cursor = sut.scan(cursor, |d, h| {
                        seen.insert(h.key(d).expect("scanned entry is live").clone());
                    });
                    if cursor == 0 {
                        break;
                    }
                    rounds += 1;
                    prop_assert!(rounds < 1 << 16, "scan must terminate");
                }
                let m_keys: BTreeSet<Key> = model.keys().cloned().collect();
                prop_assert_eq!(seen, m_keys);
            }
            OpI::Rehash(n) => {
                sut.rehash(n as usize);
            }
            OpI::Shrink => {
                let _ = sut.shrink_to_fit();
            }
            OpI::SetResize(on) => {
                if on {
                    sut.enable_resize();
                } else {
                    sut.disable_resize();
                }
            }
        }

        // Post-conditions after each op
        // 1) All stale handles must not resolve
        for &h in &stale {
            prop_assert!(h.value(sut).is_none());
        }
        // 2) Size parity with the model
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        // 3) Structural invariants: power-of-two tables, enumeration
        //    count matches the used counters
        for t in 0..2 {
            let size = sut.tables[t].size();
            prop_assert!(size == 0 || size.is_power_of_two());
            if size > 0 {
                prop_assert_eq!(sut.tables[t].mask, size - 1);
            }
        }
        prop_assert_eq!(sut.iter().count(), sut.len());
    }
    Ok(())
}

// Property: state-machine equivalence against std HashMap across random
// op sequences, including explicit rehash driving and shrink requests.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: Dict<Key, i32> = Dict::new();
        run_scenario(&mut sut, pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key lands in one
// chain, stressing chain search, unlink, and migration order.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl std::hash::Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: Dict<Key, i32, ConstBuildHasher> = Dict::with_hasher(ConstBuildHasher);
        run_scenario(&mut sut, pool, ops)?;
    }
}
