//! End-to-end pipeline run: synthetic ledger → tiny fit → bundle round trip.

use ndarray::Array2;
use spendcast::artifact::ArtifactBundle;
use spendcast::model::ModelConfig;
use spendcast::pipeline::{ForecastPipeline, PipelineConfig};
use spendcast::train::TrainOptions;

fn tiny_config(data: std::path::PathBuf, out: std::path::PathBuf) -> PipelineConfig {
    PipelineConfig {
        data_path: data,
        output_dir: out,
        window_size: 5,
        split_ratio: 0.8,
        synthetic_len: 60,
        train: TrainOptions {
            epochs: 6,
            batch_size: 8,
            learning_rate: 5e-3,
            validation_fraction: 0.2,
            model: ModelConfig {
                input_size: 1,
                hidden_sizes: [6, 4],
                dense_size: 4,
                dropout: 0.0,
            },
            seed: 11,
            ..TrainOptions::default()
        },
    }
}

#[test]
fn full_run_produces_loadable_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let missing_csv = dir.path().join("absent.csv");
    let bundle_dir = dir.path().join("models");

    let pipeline = ForecastPipeline::new(tiny_config(missing_csv, bundle_dir.clone()));
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.train_samples + summary.test_samples, 60 - 5);
    assert_eq!(summary.train_samples, (55_f64 * 0.8) as usize);
    assert!(summary.metrics.mae.is_finite());
    assert!(summary.metrics.rmse >= summary.metrics.mae);
    assert!(!summary.history.train_loss.is_empty());

    let bundle = ArtifactBundle::load(&bundle_dir).unwrap();
    assert_eq!(bundle.window_size, 5);
    assert_eq!(bundle.feature_info.window_size, 5);
    assert_eq!(bundle.feature_info.feature_columns, vec!["scaled_amount"]);
    assert_eq!(
        bundle.feature_info.train_shape,
        [summary.train_samples, 5, 1]
    );

    // The reloaded model must predict, and predict the same as a second load.
    let window = Array2::from_shape_fn((5, 1), |(t, _)| 0.1 + 0.1 * t as f64);
    let first = bundle.model.predict(&window);
    assert!(first.is_finite());
    let again = ArtifactBundle::load(&bundle_dir).unwrap();
    assert_eq!(first, again.model.predict(&window));

    // Scaler round trip survives serialization.
    let round = bundle.scaler.inverse_transform_one(bundle.scaler.transform_one(123.45));
    assert!((round - 123.45).abs() < 1e-9);
}
