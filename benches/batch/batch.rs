use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use seiqhrf::batch::SimulationBatch;
use seiqhrf::config::{InitialCounts, ModelConfig};

static SEED: u64 = 123;
static NSTEPS: usize = 100;
static NSIMS: usize = 8;

fn outbreak(population: usize, ncores: usize) -> ModelConfig {
    ModelConfig {
        nsteps: NSTEPS,
        nsims: NSIMS,
        ncores,
        seed: SEED,
        vital: true,
        init: InitialCounts {
            s: population - 10,
            e: 0,
            i: 10,
            q: 0,
            h: 0,
            r: 0,
            f: 0,
        },
        ..ModelConfig::default()
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.sample_size(10);
    for ncores in [1, 4] {
        let batch = SimulationBatch::new(outbreak(2000, ncores)).expect("valid configuration");
        group.bench_with_input(BenchmarkId::new("outbreak-2000", ncores), &batch, |bencher, batch| {
            bencher.iter_with_large_drop(|| batch.execute().expect("batch executes"));
        });
    }
    group.finish();
}

criterion_group!(batch_benches, criterion_benchmark);
criterion_main!(batch_benches);
