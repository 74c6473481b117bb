//! Benchmarks for raptl
//!
//! Run with: cargo bench -p raptl

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use raptl::prelude::*;
use raptl::semiring_einsum;

fn bench_einsum(c: &mut Criterion) {
    let mut group = c.benchmark_group("einsum");

    for size in [8usize, 16, 32].iter() {
        let a = Tensor::random(["i", "j"], &[*size, *size]).unwrap();
        let b = Tensor::random(["j", "k"], &[*size, *size]).unwrap();

        group.bench_with_input(BenchmarkId::new("counting", size), size, |bench, _| {
            bench.iter(|| semiring_einsum::<Counting>("ij,jk->ik", black_box(&[&a, &b])).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("minplus", size), size, |bench, _| {
            bench.iter(|| {
                SemiringKind::MinPlus
                    .einsum("ij,jk->ik", black_box(&[&a, &b]))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_grandparent(c: &mut Criterion) {
    let reasoner = Reasoner::default();
    let relation = Tensor::random(["x", "y"], &[16, 16])
        .unwrap()
        .map(|&v| if v > 0.8 { 1.0 } else { 0.0 });
    let parent = reasoner.create_fact("parent", relation, 0.9, 0.9);

    c.bench_function("grandparent_16", |b| {
        b.iter(|| reasoner.grandparent(black_box(&parent)).unwrap());
    });
}

criterion_group!(benches, bench_einsum, bench_grandparent);
criterion_main!(benches);
