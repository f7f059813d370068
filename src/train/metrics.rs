//! Held-out regression error, reported in ledger currency units.

use serde::{Deserialize, Serialize};

use crate::model::LstmNetwork;
use crate::scaling::MinMaxScaler;
use crate::sequence::SequenceSample;

/// Evaluation summary for a trained forecaster.
///
/// All three values are computed after inverse-scaling predictions and
/// targets, so they read in the ledger's currency units rather than in
/// normalized `[0,1]` space. MAPE is a fraction, not a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Mean absolute percentage error (fraction).
    pub mape: f64,
}

/// Mean absolute error between two equally long series.
pub fn mean_absolute_error(truth: &[f64], predicted: &[f64]) -> f64 {
    mean(truth.iter().zip(predicted).map(|(&t, &p)| (t - p).abs()))
}

/// Root mean squared error between two equally long series.
pub fn root_mean_squared_error(truth: &[f64], predicted: &[f64]) -> f64 {
    mean(truth.iter().zip(predicted).map(|(&t, &p)| (t - p) * (t - p))).sqrt()
}

/// Mean absolute percentage error as a fraction, with an epsilon guard so a
/// zero target contributes a large but finite term.
pub fn mean_absolute_percentage_error(truth: &[f64], predicted: &[f64]) -> f64 {
    mean(
        truth
            .iter()
            .zip(predicted)
            .map(|(&t, &p)| (t - p).abs() / t.abs().max(f64::EPSILON)),
    )
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Predict every held-out window and report error in original units.
pub fn evaluate(
    model: &LstmNetwork,
    samples: &[SequenceSample],
    scaler: &MinMaxScaler,
) -> RegressionMetrics {
    let predicted_scaled: Vec<f64> = samples.iter().map(|s| model.predict(&s.window)).collect();
    let truth_scaled: Vec<f64> = samples.iter().map(|s| s.target).collect();

    let predicted = scaler.inverse_transform(&predicted_scaled);
    let truth = scaler.inverse_transform(&truth_scaled);

    RegressionMetrics {
        mae: mean_absolute_error(&truth, &predicted),
        rmse: root_mean_squared_error(&truth, &predicted),
        mape: mean_absolute_percentage_error(&truth, &predicted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_error_means_zero_metrics() {
        let truth = [100.0, 105.0, 98.0, 110.0];
        assert_eq!(mean_absolute_error(&truth, &truth), 0.0);
        assert_eq!(root_mean_squared_error(&truth, &truth), 0.0);
        assert_eq!(mean_absolute_percentage_error(&truth, &truth), 0.0);
    }

    #[test]
    fn constant_offset_shows_up_in_currency_units() {
        let truth = [100.0, 200.0];
        let predicted = [110.0, 210.0];
        assert!((mean_absolute_error(&truth, &predicted) - 10.0).abs() < 1e-12);
        assert!((root_mean_squared_error(&truth, &predicted) - 10.0).abs() < 1e-12);
        let mape = mean_absolute_percentage_error(&truth, &predicted);
        assert!((mape - (0.1 + 0.05) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_series_report_zero() {
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }
}
