use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use spendcast::ledger::synthetic_ledger;
use spendcast::model::{LstmNetwork, ModelConfig};
use spendcast::scaling::MinMaxScaler;
use spendcast::sequence::build_sequences;

const SERIES_LEN: usize = 365;
const WINDOW: usize = 30;

fn scaled_series() -> Vec<f64> {
    let records = synthetic_ledger(SERIES_LEN, 7);
    let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
    let scaler = MinMaxScaler::fit(&amounts).expect("fit scaler");
    scaler.transform(&amounts)
}

fn bench_build_sequences(c: &mut Criterion) {
    let series = scaled_series();
    c.bench_with_input(
        BenchmarkId::new("build_sequences", SERIES_LEN),
        &series,
        |b, series| {
            b.iter(|| build_sequences(black_box(series), WINDOW).expect("build"));
        },
    );
}

fn bench_forward_pass(c: &mut Criterion) {
    let series = scaled_series();
    let samples = build_sequences(&series, WINDOW).expect("build");
    let mut rng = StdRng::seed_from_u64(42);
    let model = LstmNetwork::new(ModelConfig::default(), &mut rng);
    let window = samples[0].window.clone();
    c.bench_with_input(BenchmarkId::new("predict", WINDOW), &window, |b, window| {
        b.iter(|| model.predict(black_box(window)));
    });
}

criterion_group!(benches, bench_build_sequences, bench_forward_pass);
criterion_main!(benches);
