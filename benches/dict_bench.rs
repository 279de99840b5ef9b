use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use stepmap::{Config, Dict};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("stepmap_insert_10k", |b| {
        b.iter_batched(
            Dict::<String, u64>::new,
            |mut d| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    d.insert(key(x), i as u64).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("stepmap_get_hit", |b| {
        let mut d = Dict::new();
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().cloned().enumerate() {
            d.insert(k, i as u64).unwrap();
        }
        while d.rehash(100) {}
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(d.get(k.as_str()));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("stepmap_get_miss", |b| {
        let mut d = Dict::new();
        for (i, x) in lcg(11).take(10_000).enumerate() {
            d.insert(key(x), i as u64).unwrap();
        }
        while d.rehash(100) {}
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            let k = key(miss.next().unwrap());
            black_box(d.get(k.as_str()));
        })
    });
}

fn bench_full_scan(c: &mut Criterion) {
    c.bench_function("stepmap_scan_10k", |b| {
        let mut d = Dict::with_config(Config {
            seed: Some(3),
            ..Config::default()
        });
        for (i, x) in lcg(23).take(10_000).enumerate() {
            d.insert(key(x), i as u64).unwrap();
        }
        while d.rehash(100) {}
        b.iter(|| {
            let mut n = 0u64;
            let mut cursor = 0;
            loop {
                cursor = d.scan(cursor, |_, _| n += 1);
                if cursor == 0 {
                    break;
                }
            }
            black_box(n)
        })
    });
}

fn bench_rehash_drain(c: &mut Criterion) {
    c.bench_function("stepmap_rehash_drain_64k_buckets", |b| {
        b.iter_batched(
            || {
                let mut d = Dict::<String, u64>::new();
                for (i, x) in lcg(31).take(20_000).enumerate() {
                    d.insert(key(x), i as u64).unwrap();
                }
                while d.rehash(100) {}
                d.expand(1 << 16).unwrap();
                d
            },
            |mut d| {
                while d.rehash(100) {}
                black_box(d)
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_get_hit, bench_get_miss, bench_full_scan, bench_rehash_drain
}
criterion_main!(benches);
