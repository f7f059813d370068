//! Trend heuristic used at the serving boundary.
//!
//! This is deliberately a separate code path from the trained LSTM pipeline:
//! it works directly on the raw values supplied with a request, with no
//! scaler, windowing, or artifact bundle involved. Prediction is the average
//! of the supplied history, nudged by a bounded linear trend factor and a
//! small random jitter drawn from an explicit RNG so callers control
//! determinism.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of historical values a forecast needs.
pub const MIN_HISTORY: usize = 3;

/// Fixed confidence reported with every heuristic forecast.
const CONFIDENCE: f64 = 0.85;

/// Why a heuristic forecast could not be made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeuristicError {
    /// Fewer than [`MIN_HISTORY`] values were supplied.
    #[error("Please provide at least {MIN_HISTORY} historical expense values")]
    TooFewValues,
}

/// Direction of the supplied history, first value to last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Last value above the first.
    Upward,
    /// Last value at or below the first.
    Downward,
}

/// Serving-boundary response shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicForecast {
    /// Predicted next expense, rounded to cents.
    pub prediction: f64,
    /// Fixed confidence score.
    pub confidence: f64,
    /// Trend direction over the supplied history.
    pub trend: Trend,
}

/// Forecast the next expense from raw historical values.
pub fn forecast(
    expenses: &[f64],
    rng: &mut impl Rng,
) -> Result<HeuristicForecast, HeuristicError> {
    if expenses.len() < MIN_HISTORY {
        return Err(HeuristicError::TooFewValues);
    }

    let first = expenses[0];
    let last = expenses[expenses.len() - 1];
    let average = expenses.iter().sum::<f64>() / expenses.len() as f64;

    let recent_trend = last - first;
    // A zero first value would blow up the relative trend; treat it as flat.
    let trend_factor = if first == 0.0 {
        1.0
    } else {
        (1.0 + (recent_trend / first) * 0.5).clamp(0.9, 1.1)
    };
    let random_factor = 0.98 + rng.random::<f64>() * 0.04;

    let prediction = average * trend_factor * random_factor;
    Ok(HeuristicForecast {
        prediction: (prediction * 100.0).round() / 100.0,
        confidence: CONFIDENCE,
        trend: if recent_trend > 0.0 {
            Trend::Upward
        } else {
            Trend::Downward
        },
    })
}
