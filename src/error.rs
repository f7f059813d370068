//! Shared error type for malformed or insufficient pipeline input.

use thiserror::Error;

/// Errors raised when ledger data cannot be turned into training input.
///
/// All variants are raised before any model is constructed; training itself
/// either completes or propagates a shape mismatch from the layers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// No records survived cleaning (unparseable amounts/dates).
    #[error("Ledger is empty after cleaning")]
    EmptyLedger,
    /// No `amount` column and no numeric fallback column in the input.
    #[error("No amount column and no numeric fallback column found")]
    NoAmountColumn,
    /// Scaler input was empty.
    #[error("Cannot fit a scaler on an empty series")]
    EmptySeries,
    /// Min-max scaling is undefined for a constant series.
    #[error("Cannot scale a constant series (every value is {value})")]
    ConstantSeries {
        /// The single value the series holds.
        value: f64,
    },
    /// The series is too short for the requested window.
    #[error("Insufficient history: series length {len} must exceed window size {window}")]
    InsufficientHistory {
        /// Number of observations available.
        len: usize,
        /// Requested window size.
        window: usize,
    },
    /// A window size of zero can never produce a sample.
    #[error("Window size must be at least 1")]
    ZeroWindow,
    /// The training partition came out empty after the validation carve.
    #[error("Not enough samples to carve train and validation partitions")]
    EmptyTrainingSet,
}
