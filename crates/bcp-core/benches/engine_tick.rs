//! Criterion benchmarks for the per-tick prediction hot path.
//!
//! No network or timer involvement: the benches run the trained network and
//! the in-memory cycle only, so they are deterministic in CI.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bcp_common::{Category, RefreshConfig, Timeframe};
use bcp_core::derive::apply_prediction;
use bcp_core::predict::generate;
use bcp_core::state::EngineState;
use bcp_model::{builtin_training_set, train, PriorityNet, TrainOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn trained_net() -> PriorityNet {
    let (net, _) = train(&builtin_training_set(), &TrainOptions::default())
        .expect("builtin set should train");
    net
}

fn bench_forward_pass(c: &mut Criterion) {
    let net = trained_net();
    let features = [0.3f32, 1.0, 0.7, 0.0];

    c.bench_function("engine_tick/forward_pass", |b| {
        b.iter(|| {
            let value = net
                .predict(black_box(&features))
                .expect("forward pass should succeed");
            black_box(value);
        })
    });
}

fn bench_training_loop(c: &mut Criterion) {
    let set = builtin_training_set();

    let mut group = c.benchmark_group("engine_tick");
    group.sample_size(20);
    for epochs in [10usize, 100] {
        let options = TrainOptions {
            epochs,
            ..TrainOptions::default()
        };
        group.bench_with_input(
            BenchmarkId::new("train", epochs),
            &options,
            |b, options| {
                b.iter(|| {
                    let (net, report) =
                        train(black_box(&set), options).expect("training should succeed");
                    black_box((net, report));
                });
            },
        );
    }
    group.finish();
}

fn bench_prediction_cycle(c: &mut Criterion) {
    let net = trained_net();

    let mut group = c.benchmark_group("engine_tick");
    for category in [Category::Ticket, Category::Sales] {
        group.bench_with_input(
            BenchmarkId::new("prediction_cycle", category),
            &category,
            |b, &category| {
                let mut state =
                    EngineState::new(category, Timeframe::Weekly, RefreshConfig::default());
                let mut rng = StdRng::seed_from_u64(42);
                b.iter(|| {
                    let generated = generate(&net, category, &mut rng);
                    let summary = apply_prediction(&mut state, &generated, &mut rng);
                    black_box(summary);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_forward_pass,
    bench_training_loop,
    bench_prediction_cycle
);
criterion_main!(benches);
