use criterion::{Criterion, criterion_group, criterion_main};
use mnemos_core::{Pattern, PatternId, PatternType, WeightKind};
use mnemos_store::PatternStore;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

fn populated(n: usize) -> (PatternStore, Vec<PatternId>) {
    let mut rng = SmallRng::seed_from_u64(42);
    let store = PatternStore::open_in_memory().unwrap();
    let ids: Vec<PatternId> = (0..n)
        .map(|i| {
            store
                .put(&Pattern::new(PatternType::Emergent, "bench", json!({ "i": i })).unwrap())
                .unwrap()
        })
        .collect();
    for _ in 0..n * 4 {
        let a = rng.random_range(0..n);
        let b = rng.random_range(0..n);
        if a != b {
            store
                .set_edge(&ids[a], &ids[b], rng.random_range(0.0..1.0), WeightKind::Semantic)
                .unwrap();
        }
    }
    (store, ids)
}

fn bench_put(c: &mut Criterion) {
    let store = PatternStore::open_in_memory().unwrap();
    let mut i = 0u64;
    c.bench_function("put_new_pattern", |b| {
        b.iter(|| {
            i += 1;
            store
                .put(&Pattern::new(PatternType::Emergent, "bench", json!({ "i": i })).unwrap())
                .unwrap()
        });
    });

    let repeat = Pattern::new(PatternType::Emergent, "bench", json!({ "same": 1 })).unwrap();
    c.bench_function("put_rediscovery", |b| {
        b.iter(|| store.put(&repeat).unwrap());
    });
}

fn bench_neighbors(c: &mut Criterion) {
    let (store, ids) = populated(500);
    c.bench_function("neighbors_top_10", |b| {
        b.iter(|| store.neighbors(&ids[7], 0.0, 10).unwrap());
    });
}

criterion_group!(benches, bench_put, bench_neighbors);
criterion_main!(benches);
