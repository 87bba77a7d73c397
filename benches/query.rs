use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kdball::{KdTree, QueryOptions, Strategy, TreeConfig};
use rand::prelude::*;

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

// Roughly 10 neighbours per point for uniform data in [0, 100)^3.
fn radius_for(n: usize) -> f64 {
    100.0 * (10.0 * 3.0 / (4.0 * std::f64::consts::PI * n as f64)).cbrt()
}

fn random_points(n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(2);
    (0..n * 3).map(|_| rng.gen_range(0.0..100.0)).collect()
}

fn benchmark_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_ball_tree");
    group.sample_size(10);

    for &size in &SIZES {
        let data = random_points(size);
        let tree = KdTree::build(&data, 3, &TreeConfig::new()).unwrap();
        let r = radius_for(size);

        for (name, p) in [("p1", 1.0), ("p2", 2.0), ("pinf", f64::INFINITY), ("p3", 3.0)] {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &_s| {
                let options = QueryOptions::new(r).p(p);
                b.iter(|| tree.query_ball_tree(&tree, &options).unwrap())
            });
        }

        group.bench_with_input(BenchmarkId::new("work_stack", size), &size, |b, &_s| {
            let options = QueryOptions::new(r).strategy(Strategy::WorkStack);
            b.iter(|| tree.query_ball_tree(&tree, &options).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("eps", size), &size, |b, &_s| {
            let options = QueryOptions::new(r).eps(0.5);
            b.iter(|| tree.query_ball_tree(&tree, &options).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("count", size), &size, |b, &_s| {
            let options = QueryOptions::new(r);
            b.iter(|| tree.count_neighbors(&tree, &options).unwrap())
        });
    }
    group.finish();
}

fn benchmark_periodic(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_ball_tree_periodic");
    group.sample_size(10);

    for &size in &SIZES {
        let data = random_points(size);
        let open = KdTree::build(&data, 3, &TreeConfig::new()).unwrap();
        let boxed = KdTree::build(&data, 3, &TreeConfig::new().periodic(vec![100.0; 3])).unwrap();
        let options = QueryOptions::new(radius_for(size));

        group.bench_with_input(BenchmarkId::new("open", size), &size, |b, &_s| {
            b.iter(|| open.query_ball_tree(&open, &options).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("periodic", size), &size, |b, &_s| {
            b.iter(|| boxed.query_ball_tree(&boxed, &options).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_metrics, benchmark_periodic);
criterion_main!(benches);
