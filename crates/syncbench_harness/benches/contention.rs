use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use syncbench_harness::{BenchmarkSettings, ContentionBenchmark, PrimitiveKind};

fn contended_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_append");
    group.sample_size(10);

    for workers in [2, 4] {
        let settings = BenchmarkSettings::default()
            .with_workers(workers)
            .with_iterations(1_000)
            .with_seed(0);
        let mut bench = ContentionBenchmark::new(settings).unwrap();

        for kind in PrimitiveKind::ALL {
            group.bench_with_input(BenchmarkId::new(kind.name(), workers), &kind, |b, &kind| b.iter(|| {
                bench.run_kind(kind).unwrap()
            }));
        }
    }
    group.finish();
}

fn primitive_creation(c: &mut Criterion) {
    let settings = BenchmarkSettings::default();
    for kind in PrimitiveKind::ALL {
        c.bench_function(&format!("{kind}::create"), |b| b.iter(|| {
            kind.create(&settings).unwrap()
        }));
    }
}

criterion_group!(contention,
    contended_append,
    primitive_creation
);
criterion_main!(contention);
