//! Library exports for the expense-forecasting trainer, benchmarks, and tests.

/// Model/scaler/metadata bundle persistence.
pub mod artifact;
/// Deployment environment checks.
pub mod config;
/// Data-shape errors shared across the pipeline.
pub mod error;
/// Lightweight statistical forecaster for serving.
pub mod heuristic;
/// Ledger CSV ingest and synthetic fallback.
pub mod ledger;
/// Tracing subscriber setup.
pub mod logging;
/// Stacked LSTM network and dense head.
pub mod model;
/// End-to-end training pipeline.
pub mod pipeline;
/// Min-max feature scaling.
pub mod scaling;
/// Sliding-window sequence construction.
pub mod sequence;
/// Fit loop, Adam optimizer, and regression metrics.
pub mod train;
