//! Model fitting with adaptive learning-rate and early-stopping control.
//!
//! The trainer owns the model for the duration of a fit: it carves a
//! validation slice off the end of the (chronological) training partition,
//! runs Adam over shuffled mini-batches, halves the learning rate when the
//! validation loss plateaus, and stops early, restoring the best-seen
//! weights, once validation stops improving for a longer patience window.

mod metrics;
mod optimizer;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::DataError;
use crate::model::{LstmNetwork, ModelConfig, NetworkGradients};
use crate::sequence::SequenceSample;

pub use metrics::{
    RegressionMetrics, evaluate, mean_absolute_error, mean_absolute_percentage_error,
    root_mean_squared_error,
};
pub use optimizer::Adam;

/// Fit hyperparameters. Defaults match the production training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// Maximum passes over the training data.
    pub epochs: usize,
    /// Mini-batch size.
    pub batch_size: usize,
    /// Initial Adam learning rate.
    pub learning_rate: f64,
    /// Fraction of the training partition held out for validation, taken
    /// from its chronological tail.
    pub validation_fraction: f64,
    /// Stagnant validation epochs tolerated before stopping.
    pub early_stop_patience: usize,
    /// Stagnant validation epochs tolerated before halving the rate.
    pub lr_patience: usize,
    /// Multiplier applied to the learning rate on a plateau.
    pub lr_factor: f64,
    /// Floor the learning rate never drops below.
    pub min_learning_rate: f64,
    /// Seed for weight init, dropout masks, and batch shuffling.
    pub seed: u64,
    /// Network architecture.
    pub model: ModelConfig,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 200,
            batch_size: 32,
            learning_rate: 1e-3,
            validation_fraction: 0.1,
            early_stop_patience: 20,
            lr_patience: 10,
            lr_factor: 0.5,
            min_learning_rate: 1e-5,
            seed: 42,
            model: ModelConfig::default(),
        }
    }
}

/// Per-epoch record of one fit.
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    /// Mean training MSE per epoch, in scaled space.
    pub train_loss: Vec<f64>,
    /// Validation MSE per epoch, in scaled space.
    pub val_loss: Vec<f64>,
    /// Learning rate in effect during each epoch.
    pub learning_rate: Vec<f64>,
    /// Epoch with the best monitored loss (0-based).
    pub best_epoch: usize,
    /// Whether the patience window ended training before the epoch cap.
    pub stopped_early: bool,
}

/// Train a fresh network on `samples` (already chronologically ordered).
pub fn fit(
    samples: &[SequenceSample],
    options: &TrainOptions,
) -> Result<(LstmNetwork, TrainingHistory), DataError> {
    // Validation is the chronological tail of the training partition,
    // carved before any shuffling.
    let split_at = (samples.len() as f64 * (1.0 - options.validation_fraction)) as usize;
    let (train, val) = samples.split_at(split_at.min(samples.len()));
    if train.is_empty() {
        return Err(DataError::EmptyTrainingSet);
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut model = LstmNetwork::new(options.model.clone(), &mut rng);
    let mut adam = Adam::new(&model, options.learning_rate);

    info!(
        train = train.len(),
        val = val.len(),
        window = train[0].window.nrows(),
        epochs = options.epochs,
        "Starting fit"
    );

    let mut history = TrainingHistory::default();
    let mut best_monitor = f64::INFINITY;
    let mut best_weights: Option<LstmNetwork> = None;
    let mut stop_wait = 0usize;
    let mut plateau_wait = 0usize;

    let mut indices: Vec<usize> = (0..train.len()).collect();
    for epoch in 0..options.epochs {
        indices.shuffle(&mut rng);

        let mut squared_error = 0.0;
        for batch in indices.chunks(options.batch_size.max(1)) {
            squared_error += train_batch(&mut model, &mut adam, train, batch, &mut rng);
        }
        let train_loss = squared_error / train.len() as f64;
        let val_loss = mean_squared_error(&model, val);
        // With no validation slice the training loss drives both controls.
        let monitor = if val.is_empty() { train_loss } else { val_loss };

        history.train_loss.push(train_loss);
        history.val_loss.push(val_loss);
        history.learning_rate.push(adam.learning_rate);
        debug!(
            epoch,
            train_loss,
            val_loss,
            lr = adam.learning_rate,
            "Epoch complete"
        );

        if monitor < best_monitor {
            best_monitor = monitor;
            history.best_epoch = epoch;
            best_weights = Some(model.clone());
            stop_wait = 0;
            plateau_wait = 0;
        } else {
            stop_wait += 1;
            plateau_wait += 1;
            if plateau_wait >= options.lr_patience {
                let reduced = (adam.learning_rate * options.lr_factor)
                    .max(options.min_learning_rate);
                if reduced < adam.learning_rate {
                    info!(
                        epoch,
                        from = adam.learning_rate,
                        to = reduced,
                        "Validation loss plateaued, reducing learning rate"
                    );
                    adam.learning_rate = reduced;
                }
                plateau_wait = 0;
            }
            if stop_wait >= options.early_stop_patience {
                info!(
                    epoch,
                    best_epoch = history.best_epoch,
                    best_loss = best_monitor,
                    "Early stopping, restoring best weights"
                );
                history.stopped_early = true;
                if let Some(best) = best_weights.take() {
                    model = best;
                }
                break;
            }
        }
    }

    info!(
        epochs_run = history.train_loss.len(),
        best_epoch = history.best_epoch,
        stopped_early = history.stopped_early,
        "Fit finished"
    );
    Ok((model, history))
}

/// Forward/backward over one mini-batch, one Adam step. Returns the batch's
/// total squared error.
fn train_batch(
    model: &mut LstmNetwork,
    adam: &mut Adam,
    train: &[SequenceSample],
    batch: &[usize],
    rng: &mut StdRng,
) -> f64 {
    let mut grads = NetworkGradients::zeros_like(model);
    let mut squared_error = 0.0;
    for &idx in batch {
        let sample = &train[idx];
        let cache = model.forward_training(&sample.window, rng);
        let err = cache.prediction - sample.target;
        squared_error += err * err;
        // d(MSE)/d(pred) with the batch mean folded in.
        model.backward(&cache, 2.0 * err / batch.len() as f64, &mut grads);
    }
    adam.step(model, &grads);
    squared_error
}

fn mean_squared_error(model: &LstmNetwork, samples: &[SequenceSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|s| {
            let err = model.predict(&s.window) - s.target;
            err * err
        })
        .sum();
    sum / samples.len() as f64
}

/// Draw a harness-friendly options set for unit tests: tiny network, few
/// epochs, no dropout.
#[cfg(test)]
pub(crate) fn small_options(seed: u64) -> TrainOptions {
    TrainOptions {
        epochs: 8,
        batch_size: 8,
        learning_rate: 5e-3,
        validation_fraction: 0.2,
        early_stop_patience: 20,
        lr_patience: 10,
        seed,
        model: ModelConfig {
            input_size: 1,
            hidden_sizes: [6, 4],
            dense_size: 4,
            dropout: 0.0,
        },
        ..TrainOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::build_sequences;

    fn ramp_series(len: usize) -> Vec<f64> {
        (0..len).map(|i| i as f64 / len as f64).collect()
    }

    #[test]
    fn fit_produces_one_history_entry_per_epoch() {
        let samples = build_sequences(&ramp_series(40), 5).unwrap();
        let options = small_options(1);
        let (_, history) = fit(&samples, &options).unwrap();
        assert_eq!(history.train_loss.len(), history.val_loss.len());
        assert_eq!(history.train_loss.len(), history.learning_rate.len());
        assert!(!history.train_loss.is_empty());
        assert!(history.train_loss.len() <= options.epochs);
        assert!(history.train_loss.iter().all(|l| l.is_finite()));
        assert!(history.val_loss.iter().all(|l| l.is_finite()));
    }

    #[test]
    fn fit_is_deterministic_for_a_seed() {
        let samples = build_sequences(&ramp_series(30), 4).unwrap();
        let options = small_options(7);
        let (model_a, history_a) = fit(&samples, &options).unwrap();
        let (model_b, history_b) = fit(&samples, &options).unwrap();
        assert_eq!(history_a.train_loss, history_b.train_loss);
        let window = &samples[0].window;
        assert_eq!(model_a.predict(window), model_b.predict(window));
    }

    #[test]
    fn training_reduces_loss_on_a_smooth_series() {
        let series: Vec<f64> = (0..60)
            .map(|i| 0.5 + 0.4 * (i as f64 * 0.3).sin())
            .collect();
        let samples = build_sequences(&series, 6).unwrap();
        let mut options = small_options(3);
        options.epochs = 30;
        let (_, history) = fit(&samples, &options).unwrap();
        let first = history.train_loss[0];
        let last = *history.train_loss.last().unwrap();
        assert!(last < first, "loss did not improve: {first} -> {last}");
    }

    #[test]
    fn empty_input_fails_before_model_construction() {
        let err = fit(&[], &small_options(1)).unwrap_err();
        assert_eq!(err, DataError::EmptyTrainingSet);
    }
}
