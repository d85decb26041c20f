use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::tempdir;

const N: usize = 1_000;
const VAL_SIZE: usize = 100;

fn store_set_sync(c: &mut Criterion) {
    c.bench_function("store_set_sync_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let store = driftkv::open(dir.path().join("bench")).unwrap();
                (dir, store)
            },
            |(_dir, store)| {
                for i in 0..N {
                    let key = format!("k{i:06}").into_bytes();
                    store.set(&key, &vec![b'x'; VAL_SIZE]).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn store_set_many(c: &mut Criterion) {
    c.bench_function("store_set_many_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let store = driftkv::open(dir.path().join("bench")).unwrap();
                let pairs: Vec<_> = (0..N)
                    .map(|i| (format!("k{i:06}").into_bytes(), vec![b'x'; VAL_SIZE]))
                    .collect();
                (dir, store, pairs)
            },
            |(_dir, store, pairs)| {
                store.set_many(pairs).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn store_get_hit(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = driftkv::open(dir.path().join("bench")).unwrap();
    for i in 0..N {
        let key = format!("k{i:06}").into_bytes();
        store.set(&key, &vec![b'x'; VAL_SIZE]).unwrap();
    }

    c.bench_function("store_get_hit_1k", |b| {
        b.iter(|| {
            for i in 0..N {
                let key = format!("k{i:06}").into_bytes();
                criterion::black_box(store.get(&key).unwrap());
            }
        });
    });
}

fn store_scan(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = driftkv::open(dir.path().join("bench")).unwrap();
    let pairs: Vec<_> = (0..10_000usize)
        .map(|i| (format!("k{i:06}").into_bytes(), b"v".to_vec()))
        .collect();
    store.set_many(pairs).unwrap();

    c.bench_function("store_scan_prefix_10k", |b| {
        b.iter(|| {
            criterion::black_box(store.keys(Some(b"k00*"), 0, 0, true).unwrap());
        });
    });
    c.bench_function("store_scan_page_of_100", |b| {
        b.iter(|| {
            criterion::black_box(store.keys(None, 100, 5_000, true).unwrap());
        });
    });
}

fn store_overwrite_in_place(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = driftkv::open(dir.path().join("bench")).unwrap();
    store.set(b"slot", &vec![b'x'; VAL_SIZE]).unwrap();

    c.bench_function("store_overwrite_in_place", |b| {
        b.iter(|| {
            store.set(b"slot", &vec![b'y'; VAL_SIZE]).unwrap();
        });
    });
}

criterion_group!(
    benches,
    store_set_sync,
    store_set_many,
    store_get_hit,
    store_scan,
    store_overwrite_in_place,
);

criterion_main!(benches);
