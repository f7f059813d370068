//! Reversible min-max scaling of ledger amounts.
//!
//! The model's training dynamics assume bounded input magnitude, so amounts
//! are remapped into `[0, 1]` using the min/max observed at fit time. The
//! fitted parameters are frozen: every later transform and inverse transform
//! reuses them unchanged, and they travel with the artifact bundle so a
//! separate process can reproduce inference exactly.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Fitted min-max scaler over a single value column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Minimum of the training amounts.
    pub min: f64,
    /// Maximum of the training amounts.
    pub max: f64,
}

impl MinMaxScaler {
    /// Fit over the given values.
    ///
    /// Fails on an empty series and on a constant series, where the scale
    /// denominator would be zero.
    pub fn fit(values: &[f64]) -> Result<Self, DataError> {
        let mut iter = values.iter();
        let Some(&first) = iter.next() else {
            return Err(DataError::EmptySeries);
        };
        let mut min = first;
        let mut max = first;
        for &v in iter {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        if max == min {
            return Err(DataError::ConstantSeries { value: min });
        }
        Ok(Self { min, max })
    }

    /// Map a single value into scaled space.
    ///
    /// Values outside the fitted range land outside `[0, 1]`; that is
    /// accepted for inference-time inputs, not an error.
    pub fn transform_one(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }

    /// Map every value into scaled space.
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform_one(v)).collect()
    }

    /// Exact algebraic inverse of [`MinMaxScaler::transform_one`].
    pub fn inverse_transform_one(&self, scaled: f64) -> f64 {
        scaled * (self.max - self.min) + self.min
    }

    /// Inverse of [`MinMaxScaler::transform`].
    pub fn inverse_transform(&self, scaled: &[f64]) -> Vec<f64> {
        scaled
            .iter()
            .map(|&v| self.inverse_transform_one(v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_captures_observed_range() {
        let scaler = MinMaxScaler::fit(&[100.0, 105.0, 98.0, 110.0]).unwrap();
        assert_eq!(scaler.min, 98.0);
        assert_eq!(scaler.max, 110.0);
        assert_eq!(scaler.transform_one(98.0), 0.0);
        assert_eq!(scaler.transform_one(110.0), 1.0);
    }

    #[test]
    fn round_trip_recovers_values_in_range() {
        let values = [100.0, 105.0, 98.0, 110.0, 120.0, 115.0, 130.0];
        let scaler = MinMaxScaler::fit(&values).unwrap();
        let scaled = scaler.transform(&values);
        assert!(scaled.iter().all(|&v| (0.0..=1.0).contains(&v)));
        let restored = scaler.inverse_transform(&scaled);
        for (orig, back) in values.iter().zip(restored.iter()) {
            assert!((orig - back).abs() < 1e-9);
        }
    }

    #[test]
    fn constant_series_is_rejected() {
        let err = MinMaxScaler::fit(&[50.0; 8]).unwrap_err();
        assert_eq!(err, DataError::ConstantSeries { value: 50.0 });
    }

    #[test]
    fn empty_series_is_rejected() {
        assert_eq!(MinMaxScaler::fit(&[]).unwrap_err(), DataError::EmptySeries);
    }

    #[test]
    fn out_of_range_values_are_allowed() {
        let scaler = MinMaxScaler::fit(&[0.0, 10.0]).unwrap();
        assert!(scaler.transform_one(15.0) > 1.0);
        assert!(scaler.transform_one(-5.0) < 0.0);
    }
}
