//! Sliding-window sequence construction and the chronological split.
//!
//! A series of length `N` with window `W` yields exactly `N - W` overlapping
//! samples (stride 1): sample `k` holds series indices `[k, k + W)` and its
//! target is series index `k + W`. Sample order follows the series, which is
//! what makes the later train/test split chronological.

use ndarray::Array2;

use crate::error::DataError;

/// One training sample: a window of scaled values and the value that follows.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSample {
    /// Scaled input window, shape `(window_size, 1)`.
    pub window: Array2<f64>,
    /// The scaled value immediately after the window.
    pub target: f64,
}

/// Build stride-1 windowed samples over a scaled series.
pub fn build_sequences(
    series: &[f64],
    window_size: usize,
) -> Result<Vec<SequenceSample>, DataError> {
    if window_size == 0 {
        return Err(DataError::ZeroWindow);
    }
    if series.len() <= window_size {
        return Err(DataError::InsufficientHistory {
            len: series.len(),
            window: window_size,
        });
    }

    let n_samples = series.len() - window_size;
    let mut samples = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let window =
            Array2::from_shape_fn((window_size, 1), |(t, _)| series[i + t]);
        samples.push(SequenceSample {
            window,
            target: series[i + window_size],
        });
    }
    Ok(samples)
}

/// Split samples chronologically at `floor(len * ratio)`.
///
/// No shuffling happens across the boundary: every test sample comes after
/// every training sample in series order.
pub fn split_chronological(
    samples: &[SequenceSample],
    ratio: f64,
) -> (Vec<SequenceSample>, Vec<SequenceSample>) {
    let cut = (samples.len() as f64 * ratio) as usize;
    let cut = cut.min(samples.len());
    (samples[..cut].to_vec(), samples[cut..].to_vec())
}
