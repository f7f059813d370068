//! The end-to-end training pipeline as an explicit staged object.
//!
//! Each stage has a typed boundary (ledger → scaled series → split sequence
//! samples → trained model → metrics → bundle) so stages are independently
//! testable with synthetic fixtures. `run` chains them in order; there is no
//! partial resume, a restarted run redoes every stage.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::artifact::{ArtifactBundle, ArtifactError, FeatureInfo};
use crate::error::DataError;
use crate::ledger::{self, LedgerRecord};
use crate::model::LstmNetwork;
use crate::scaling::MinMaxScaler;
use crate::sequence::{SequenceSample, build_sequences, split_chronological};
use crate::train::{self, RegressionMetrics, TrainOptions, TrainingHistory};

/// Everything a training run needs to know.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ledger CSV location; a missing file falls back to synthetic data.
    pub data_path: PathBuf,
    /// Directory the artifact bundle is written to.
    pub output_dir: PathBuf,
    /// Number of past observations per training window.
    pub window_size: usize,
    /// Chronological train/test split ratio.
    pub split_ratio: f64,
    /// Length of the synthetic fallback ledger.
    pub synthetic_len: usize,
    /// Fit hyperparameters.
    pub train: TrainOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("expenses_income_summary.csv"),
            output_dir: PathBuf::from("models"),
            window_size: 30,
            split_ratio: 0.8,
            synthetic_len: 100,
            train: TrainOptions::default(),
        }
    }
}

/// Why a pipeline run failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be turned into training sequences.
    #[error(transparent)]
    Data(#[from] DataError),
    /// The artifact bundle could not be written.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Output of the load/clean/scale stage.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Cleaned ledger, date ascending.
    pub records: Vec<LedgerRecord>,
    /// Scaler fitted once over the amounts; never refit afterwards.
    pub scaler: MinMaxScaler,
    /// Amounts mapped into `[0, 1]`, ledger order.
    pub scaled: Vec<f64>,
}

/// Output of the windowing stage.
#[derive(Debug, Clone)]
pub struct SplitSequences {
    /// Chronologically earlier samples, used for fitting.
    pub train: Vec<SequenceSample>,
    /// Chronologically later samples, held out for evaluation.
    pub test: Vec<SequenceSample>,
    /// Window size the samples were built with.
    pub window_size: usize,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Held-out error in currency units.
    pub metrics: RegressionMetrics,
    /// Per-epoch fit record.
    pub history: TrainingHistory,
    /// Where the bundle was written.
    pub bundle_dir: PathBuf,
    /// Training sample count.
    pub train_samples: usize,
    /// Held-out sample count.
    pub test_samples: usize,
}

/// Staged load → scale → sequence → train → evaluate → save pipeline.
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    /// Build a pipeline around `config`.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load (or synthesize) the ledger, fit the scaler, scale the amounts.
    ///
    /// A degenerate constant ledger fails here, before any sequence is
    /// built.
    pub fn prepare(&self) -> Result<PreparedData, PipelineError> {
        let records = ledger::load_or_synthesize(
            &self.config.data_path,
            self.config.synthetic_len,
            self.config.train.seed,
        )?;
        if records.is_empty() {
            return Err(DataError::EmptyLedger.into());
        }
        let amounts = ledger::amounts(&records);
        let scaler = MinMaxScaler::fit(&amounts)?;
        let scaled = scaler.transform(&amounts);
        info!(records = records.len(), min = scaler.min, max = scaler.max, "Ledger prepared");
        Ok(PreparedData {
            records,
            scaler,
            scaled,
        })
    }

    /// Window the scaled series and split it chronologically.
    pub fn build_sequences(
        &self,
        prepared: &PreparedData,
    ) -> Result<SplitSequences, PipelineError> {
        let samples = build_sequences(&prepared.scaled, self.config.window_size)?;
        let (train, test) = split_chronological(&samples, self.config.split_ratio);
        info!(
            total = samples.len(),
            train = train.len(),
            test = test.len(),
            window = self.config.window_size,
            "Sequences built"
        );
        Ok(SplitSequences {
            train,
            test,
            window_size: self.config.window_size,
        })
    }

    /// Fit a fresh model on the training partition.
    pub fn train(
        &self,
        sequences: &SplitSequences,
    ) -> Result<(LstmNetwork, TrainingHistory), PipelineError> {
        Ok(train::fit(&sequences.train, &self.config.train)?)
    }

    /// Held-out error in original currency units.
    pub fn evaluate(
        &self,
        model: &LstmNetwork,
        sequences: &SplitSequences,
        scaler: &MinMaxScaler,
    ) -> RegressionMetrics {
        train::evaluate(model, &sequences.test, scaler)
    }

    /// Write the artifact bundle and return its directory.
    pub fn save(
        &self,
        model: &LstmNetwork,
        scaler: &MinMaxScaler,
        sequences: &SplitSequences,
    ) -> Result<PathBuf, PipelineError> {
        let bundle = ArtifactBundle {
            model: model.clone(),
            scaler: *scaler,
            window_size: sequences.window_size,
            feature_info: FeatureInfo {
                window_size: sequences.window_size,
                feature_columns: vec!["scaled_amount".to_string()],
                target_column: "amount".to_string(),
                train_shape: [sequences.train.len(), sequences.window_size, 1],
                model_type: "LSTM".to_string(),
            },
        };
        bundle.save(&self.config.output_dir)?;
        Ok(self.config.output_dir.clone())
    }

    /// Run every stage in order.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let prepared = self.prepare()?;
        let sequences = self.build_sequences(&prepared)?;
        let (model, history) = self.train(&sequences)?;
        let metrics = self.evaluate(&model, &sequences, &prepared.scaler);
        let bundle_dir = self.save(&model, &prepared.scaler, &sequences)?;
        info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            mape = metrics.mape,
            bundle = %bundle_dir.display(),
            "Pipeline run complete"
        );
        Ok(RunSummary {
            metrics,
            history,
            bundle_dir,
            train_samples: sequences.train.len(),
            test_samples: sequences.test.len(),
        })
    }
}
