use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mdds::{MultiTypeVector, PackedTrieMap};

fn bench_multi_type_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_type_vector");

    group.bench_function("set_numeric_sequential", |b| {
        b.iter(|| {
            let mut db = MultiTypeVector::with_size(10_000);
            for i in 0..10_000 {
                db.set(i, i as f64).unwrap();
            }
            black_box(db.block_count())
        })
    });

    group.bench_function("set_range_numeric", |b| {
        let values: Vec<f64> = (0..10_000).map(|i| i as f64).collect();
        b.iter(|| {
            let mut db = MultiTypeVector::with_size(10_000);
            db.set_range(0, &values).unwrap();
            black_box(db.block_count())
        })
    });

    group.bench_function("get_numeric_striped", |b| {
        // 100 alternating numeric/empty stripes keep the lookup honest.
        let mut db = MultiTypeVector::with_size(10_000);
        for stripe in 0..50 {
            let start = stripe * 200;
            let values: Vec<f64> = (0..100).map(|i| (start + i) as f64).collect();
            db.set_range(start, &values).unwrap();
        }
        b.iter(|| {
            for row in (0..10_000).step_by(97) {
                black_box(db.get_numeric(row).ok());
            }
        })
    });
}

fn bench_packed_trie(c: &mut Criterion) {
    let mut group = c.benchmark_group("packed_trie");
    let keys: Vec<String> = (0..1000).map(|i| format!("key{i:05}")).collect();
    let entries: Vec<(&str, usize)> = keys.iter().map(|k| k.as_str()).zip(0..).collect();
    let map = PackedTrieMap::new(&entries).unwrap();

    group.bench_function("find", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(map.find(key));
            }
        })
    });

    group.bench_function("prefix_search", |b| {
        b.iter(|| black_box(map.prefix_search("key00")).len())
    });
}

criterion_group!(benches, bench_multi_type_vector, bench_packed_trie);
criterion_main!(benches);
