//! Recurrent forecasting model.
//!
//! Two stacked LSTM layers (the first feeding its full per-step output
//! sequence to the second, which keeps only its final state), dropout
//! between the recurrent layers during training, and a small dense head
//! projecting to one scalar. Forward and backward passes are written out
//! explicitly on `ndarray`.

mod dense;
mod lstm;

use ndarray::{Array1, Array2};

pub use dense::{Activation, Dense, DenseGradients};
pub use lstm::{
    ForwardCache, LstmCell, LstmGradients, LstmNetwork, ModelConfig, NetworkGradients,
};

/// Outer product `a bᵀ`, used by every weight-gradient accumulation.
pub(crate) fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}
