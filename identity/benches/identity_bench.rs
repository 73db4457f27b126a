use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use footfall_identity::{Matcher, Thresholds, classify};
use footfall_vecstore::MemoryVectorStore;

fn random_unit_vec(dim: usize, seed: u64) -> Vec<f32> {
    let mut v = Vec::with_capacity(dim);
    let mut state = seed;
    for _ in 0..dim {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        v.push(((state >> 33) as f32) / (u32::MAX as f32) - 0.5);
    }
    let norm: f64 = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let s = (1.0 / norm) as f32;
        for x in &mut v {
            *x *= s;
        }
    }
    v
}

fn bench_classify(c: &mut Criterion) {
    c.bench_function("classify", |b| {
        b.iter(|| classify(black_box(Some(0.33)), black_box(Some(0.61))))
    });
}

fn bench_find_best_match(c: &mut Criterion) {
    let dim = 128;
    let store = Arc::new(MemoryVectorStore::new(dim));
    for i in 0..1000u64 {
        store
            .insert("org", &format!("person-{i:04}"), &random_unit_vec(dim, i + 1))
            .unwrap();
    }
    let matcher = Matcher::new(Thresholds::default(), store);
    let query = random_unit_vec(dim, 424242);

    c.bench_function("find_best_match/1000x128", |b| {
        b.iter(|| matcher.find_best_match("org", black_box(&query), None).unwrap())
    });
}

criterion_group!(benches, bench_classify, bench_find_best_match);
criterion_main!(benches);
