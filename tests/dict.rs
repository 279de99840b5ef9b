// Dict integration suite (consolidated), driven through the public
// surface only.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Growth: load factor >= 1 starts an incremental rehash; every
//   operation donates a bounded step until it drains.
// - Stability: handles keep resolving across rehashes; removed
//   entries never alias later ones.
// - Safe cursors: traversal interleaved with mutation, rehash held
//   paused for their lifetime and resumed on release.
// - Sampling: non-empty dicts always yield entries.
use stepmap::{Config, Dict, Replaced, Value};
use std::collections::BTreeSet;

// Test: the concrete growth schedule from a capacity-4 start.
// Assumes: default config (initial capacity 4, resize enabled).
// Verifies: growth 4 -> 8 triggers at the 5th insertion and 8 -> 16 at
// the 9th; rehashing settles again after enough subsequent operations.
#[test]
fn growth_schedule_from_capacity_four() {
    let mut d: Dict<char, u32> = Dict::new();
    let keys: Vec<char> = ('a'..='k').collect();

    for (n, &k) in keys.iter().enumerate() {
        d.insert(k, n as u32).unwrap();
        let inserted = n + 1;
        match inserted {
            1..=4 => {
                assert_eq!(d.capacity(), 4);
                assert!(!d.is_rehashing());
            }
            5 => {
                // used/size reached 1: an 8-bucket target is installed
                assert!(d.is_rehashing());
                assert_eq!(d.capacity(), 4 + 8);
            }
            9 => {
                // the 4 -> 8 migration has fully drained by now (each
                // insert moved at least one bucket), so the 9th insert
                // finds used == size == 8 again
                assert!(d.is_rehashing());
                assert_eq!(d.capacity(), 8 + 16);
            }
            _ => {}
        }
    }

    // ordinary operations finish the migration
    for _ in 0..100 {
        let _ = d.find(&'a');
    }
    assert!(!d.is_rehashing());
    assert_eq!(d.capacity(), 16);
    assert_eq!(d.len(), 11);
    for (n, &k) in keys.iter().enumerate() {
        assert_eq!(d.get(&k), Some(&(n as u32)));
    }
}

// Test: rehash termination and key preservation.
// Assumes: an explicit expand installs a migration target.
// Verifies: repeated rehash(1) calls reach completion; every key
// inserted before the resize is still found afterwards.
#[test]
fn rehash_terminates_and_preserves_keys() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..128 {
        d.insert(i, i * 3).unwrap();
    }
    while d.rehash(16) {}
    d.expand(2048).unwrap();
    assert!(d.is_rehashing());

    let mut steps = 0;
    while d.rehash(1) {
        steps += 1;
        assert!(steps < 100_000, "rehash must terminate");
    }
    assert!(!d.is_rehashing());
    for i in 0..128 {
        assert_eq!(d.get(&i), Some(&(i * 3)));
    }
}

// Test: batch sampling bounds on a well-populated dict.
// Assumes: 100 unique keys are present.
// Verifies: sample(15) returns between 1 and 15 entries, all members
// of the inserted set; fair_random_entry never returns None.
#[test]
fn sampling_bounds_on_hundred_keys() {
    let mut d: Dict<u64, u64> = Dict::with_config(Config {
        seed: Some(9),
        ..Config::default()
    });
    for i in 0..100 {
        d.insert(i, i).unwrap();
    }

    let batch = d.sample(15);
    assert!(
        (1..=15).contains(&batch.len()),
        "got {} entries",
        batch.len()
    );
    for h in &batch {
        let k = *h.key(&d).unwrap();
        assert!(k < 100, "sampled key must come from the inserted set");
    }

    for _ in 0..50 {
        assert!(d.fair_random_entry().is_some());
    }
}

// Test: safe cursor interleaved with mutation.
// Assumes: a rehash is in progress when the cursor opens.
// Verifies: the cursor drains fully with inserts and removals running
// between steps, the rehash makes no progress while it is open, and
// progress resumes once it is released.
#[test]
fn safe_cursor_interleaved_mutation() {
    let mut d: Dict<u32, u32> = Dict::new();
    for i in 0..32 {
        d.insert(i, i).unwrap();
    }
    while d.rehash(8) {}
    d.expand(512).unwrap();
    assert!(d.is_rehashing());

    let mut it = d.safe_iter();
    let mut seen = BTreeSet::new();
    let mut fresh = 1000;
    while let Some(h) = d.safe_next(&mut it) {
        let k = *h.key(&d).unwrap();
        seen.insert(k);
        if k < 32 && k % 3 == 0 {
            // removing the entry just returned is always safe
            assert!(d.remove(&k));
        }
        if fresh < 1010 {
            d.insert(fresh, 0).unwrap();
            fresh += 1;
        }
        // the open cursor pins both tables in place
        assert!(d.is_rehashing());
    }
    // every key present for the cursor's whole lifetime was seen
    for i in 0..32 {
        assert!(seen.contains(&i));
    }
    d.release_iter(it);

    // progress resumes: ordinary operations drain the rehash
    let mut rounds = 0;
    while d.is_rehashing() {
        let _ = d.find(&1);
        rounds += 1;
        assert!(rounds < 100_000);
    }
    assert_eq!(d.len(), 32 - 11 + 10);
}

// Test: replace reports what happened and keeps size coherent.
// Assumes: nothing beyond an empty dict.
// Verifies: absent key -> Inserted and len + 1; present key -> Updated,
// len unchanged, new value visible.
#[test]
fn replace_inserted_vs_updated() {
    let mut d: Dict<String, u32> = Dict::new();
    match d.replace("k".to_string(), 1) {
        Replaced::Inserted(_) => {}
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(d.len(), 1);

    match d.replace("k".to_string(), 2) {
        Replaced::Updated(h) => assert_eq!(h.value(&d), Some(&2)),
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(d.len(), 1);
    assert_eq!(d.get("k"), Some(&2));
}

// Test: shrink after mass deletion.
// Assumes: deletions leave the table mostly empty.
// Verifies: shrink_to_fit installs a right-sized target, the migration
// drains, and the survivors remain reachable.
#[test]
fn shrink_after_mass_removal() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..256 {
        d.insert(i, i).unwrap();
    }
    while d.rehash(64) {}
    let big = d.capacity();
    for i in 10..256 {
        assert!(d.remove(&i));
    }
    assert_eq!(d.len(), 10);

    d.shrink_to_fit().unwrap();
    while d.rehash(64) {}
    assert!(!d.is_rehashing());
    assert!(d.capacity() < big);
    assert_eq!(d.capacity(), 16);
    for i in 0..10 {
        assert_eq!(d.get(&i), Some(&i));
    }
}

// Test: mixed scalar payloads through the Value enum.
// Assumes: hosts store one Value per key.
// Verifies: variants round-trip and replace swaps variants in place.
#[test]
fn value_payloads() {
    let mut d: Dict<&'static str, Value<String>> = Dict::new();
    d.insert("obj", Value::Obj("blob".to_string())).unwrap();
    d.insert("int", Value::from(-5i64)).unwrap();
    d.insert("uint", Value::from(9u64)).unwrap();
    d.insert("float", Value::from(2.5f64)).unwrap();

    assert_eq!(
        d.get(&"obj").and_then(|v| v.as_obj()).map(String::as_str),
        Some("blob")
    );
    assert_eq!(d.get(&"int").and_then(Value::as_int), Some(-5));
    assert_eq!(d.get(&"uint").and_then(Value::as_uint), Some(9));
    assert_eq!(d.get(&"float").and_then(Value::as_double), Some(2.5));

    d.replace("int", Value::from(3.25f64));
    assert_eq!(d.get(&"int").and_then(Value::as_double), Some(3.25));
    assert_eq!(d.len(), 4);
}

// Test: rehash_for drains within a generous wall-clock budget.
// Assumes: a pending migration of a few thousand buckets.
// Verifies: the call reports progress and completion state matches.
#[test]
fn rehash_for_duration_drains() {
    let mut d: Dict<u64, u64> = Dict::new();
    for i in 0..1000 {
        d.insert(i, i).unwrap();
    }
    while d.rehash(128) {}
    d.expand(1 << 14).unwrap();

    let processed = d.rehash_for(std::time::Duration::from_secs(10));
    assert!(!d.is_rehashing());
    assert!(processed > 0);
    assert_eq!(d.len(), 1000);
}
