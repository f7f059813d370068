//! Persisted training artifacts.
//!
//! A training run writes one self-contained bundle directory holding the
//! model weights, the fitted scaler parameters, the window size, and the
//! feature metadata. All four files are required together: a separate
//! process reconstructs exact preprocessing from the bundle alone. Bundles
//! are immutable after write; retraining produces a new bundle rather than
//! patching an old one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::model::LstmNetwork;
use crate::scaling::MinMaxScaler;

/// Model weights sub-path.
pub const MODEL_FILE: &str = "lstm_model.json";
/// Scaler parameters sub-path.
pub const SCALER_FILE: &str = "scaler.json";
/// Window size sub-path.
pub const WINDOW_FILE: &str = "window_size.json";
/// Feature metadata sub-path.
pub const FEATURE_INFO_FILE: &str = "feature_info.json";

/// Errors while writing or reconstructing a bundle.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Filesystem failure on one of the bundle files.
    #[error("Artifact I/O failed for {path}: {source}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A bundle file held invalid JSON.
    #[error("Artifact file {path} is not valid JSON: {source}")]
    Json {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The window size recorded in the metadata disagrees with
    /// `window_size.json`.
    #[error("Bundle is inconsistent: window_size.json says {window_file} but feature_info.json says {feature_info}")]
    WindowMismatch {
        /// Value from `window_size.json`.
        window_file: usize,
        /// Value from `feature_info.json`.
        feature_info: usize,
    },
}

/// Feature layout metadata, enough to rebuild the preprocessing exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    /// Window size the sequences were built with.
    pub window_size: usize,
    /// Scaled feature columns fed to the model, in order.
    pub feature_columns: Vec<String>,
    /// Ledger column the target was taken from.
    pub target_column: String,
    /// Shape of the training tensor `[samples, window, features]`.
    pub train_shape: [usize; 3],
    /// Model family identifier.
    pub model_type: String,
}

/// A loaded (or about-to-be-written) artifact bundle.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    /// Trained network.
    pub model: LstmNetwork,
    /// Scaler fitted on the training amounts.
    pub scaler: MinMaxScaler,
    /// Window size, duplicated from the metadata for direct access.
    pub window_size: usize,
    /// Feature layout metadata.
    pub feature_info: FeatureInfo,
}

impl ArtifactBundle {
    /// Write the bundle under `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        write_json(&dir.join(MODEL_FILE), &self.model)?;
        write_json(&dir.join(SCALER_FILE), &self.scaler)?;
        write_json(&dir.join(WINDOW_FILE), &self.window_size)?;
        write_json(&dir.join(FEATURE_INFO_FILE), &self.feature_info)?;
        info!(dir = %dir.display(), "Artifact bundle written");
        Ok(())
    }

    /// Reconstruct a bundle written by [`ArtifactBundle::save`].
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let model: LstmNetwork = read_json(&dir.join(MODEL_FILE))?;
        let scaler: MinMaxScaler = read_json(&dir.join(SCALER_FILE))?;
        let window_size: usize = read_json(&dir.join(WINDOW_FILE))?;
        let feature_info: FeatureInfo = read_json(&dir.join(FEATURE_INFO_FILE))?;
        if feature_info.window_size != window_size {
            return Err(ArtifactError::WindowMismatch {
                window_file: window_size,
                feature_info: feature_info.window_size,
            });
        }
        Ok(Self {
            model,
            scaler,
            window_size,
            feature_info,
        })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ArtifactError> {
    let data = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::model::ModelConfig;

    fn small_bundle() -> ArtifactBundle {
        let mut rng = StdRng::seed_from_u64(21);
        let config = ModelConfig {
            input_size: 1,
            hidden_sizes: [4, 3],
            dense_size: 3,
            dropout: 0.2,
        };
        ArtifactBundle {
            model: LstmNetwork::new(config, &mut rng),
            scaler: MinMaxScaler {
                min: 98.0,
                max: 130.0,
            },
            window_size: 3,
            feature_info: FeatureInfo {
                window_size: 3,
                feature_columns: vec!["scaled_amount".to_string()],
                target_column: "amount".to_string(),
                train_shape: [4, 3, 1],
                model_type: "LSTM".to_string(),
            },
        }
    }

    #[test]
    fn bundle_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = small_bundle();
        bundle.save(dir.path()).unwrap();

        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(loaded.scaler.min, 98.0);
        assert_eq!(loaded.scaler.max, 130.0);
        assert_eq!(loaded.window_size, 3);
        assert_eq!(loaded.feature_info, bundle.feature_info);

        let window = Array2::from_shape_vec((3, 1), vec![0.1, 0.5, 0.9]).unwrap();
        assert_eq!(loaded.model.predict(&window), bundle.model.predict(&window));
    }

    #[test]
    fn all_four_files_are_written() {
        let dir = tempfile::tempdir().unwrap();
        small_bundle().save(dir.path()).unwrap();
        for file in [MODEL_FILE, SCALER_FILE, WINDOW_FILE, FEATURE_INFO_FILE] {
            assert!(dir.path().join(file).is_file(), "missing {file}");
        }
    }

    #[test]
    fn window_disagreement_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut bundle = small_bundle();
        bundle.save(dir.path()).unwrap();
        bundle.feature_info.window_size = 5;
        // Overwrite just the metadata to simulate a corrupted bundle.
        super::write_json(&dir.path().join(FEATURE_INFO_FILE), &bundle.feature_info).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::WindowMismatch {
                window_file: 3,
                feature_info: 5
            }
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
