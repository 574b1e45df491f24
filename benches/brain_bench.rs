//! Benchmarks for ensemble-racer.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ensemble_racer::{Brain, BrainConfig, Genotype, InitConfig, TensorSet};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SENSORS: [f32; 9] = [3.0, 2.5, 2.0, 2.5, 4.0, 2.5, 2.0, 2.5, 3.0];

fn bench_brain_creation(c: &mut Criterion) {
    let config = BrainConfig::default();

    c.bench_function("brain_new", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| {
            black_box(Brain::new(config.clone(), &mut rng));
        });
    });
}

fn bench_decide(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut brain = Brain::new(BrainConfig::default(), &mut rng);

    c.bench_function("brain_decide", |b| {
        b.iter(|| {
            brain.update_telemetry(0.0, 0.0, 150.0);
            black_box(brain.decide(black_box(&SENSORS), &mut rng));
        });
    });

    // Deep freeze exercises the random steering path
    let mut frozen = Brain::new(BrainConfig::default(), &mut rng);
    c.bench_function("brain_decide_frozen", |b| {
        b.iter(|| {
            frozen.update_telemetry(0.0, 0.0, 0.0);
            black_box(frozen.decide(black_box(&SENSORS), &mut rng));
        });
    });
}

fn bench_mutation(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let genome = TensorSet::random(&InitConfig::default(), &mut rng);

    c.bench_function("genome_mutation", |b| {
        let mut g = genome.clone();
        b.iter(|| {
            g.mutate(&mut rng, 1.0);
            black_box(&g);
        });
    });
}

fn bench_crossover(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let parent1 = TensorSet::random(&InitConfig::default(), &mut rng);
    let parent2 = TensorSet::random(&InitConfig::default(), &mut rng);

    c.bench_function("genome_crossover", |b| {
        b.iter(|| {
            black_box(parent1.crossover(&parent2, &mut rng));
        });
    });
}

fn bench_parameter_exchange(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let donor = Brain::new(BrainConfig::default(), &mut rng);
    let mut target = Brain::new(BrainConfig::default(), &mut rng);
    let bundle = donor.export_parameters();

    c.bench_function("export_parameters", |b| {
        b.iter(|| {
            black_box(donor.export_parameters());
        });
    });

    c.bench_function("import_parameters", |b| {
        b.iter(|| {
            black_box(target.import_parameters(black_box(&bundle)).is_ok());
        });
    });
}

criterion_group!(
    benches,
    bench_brain_creation,
    bench_decide,
    bench_mutation,
    bench_crossover,
    bench_parameter_exchange,
);
criterion_main!(benches);
