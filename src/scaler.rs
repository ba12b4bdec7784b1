//! Per-feature standardization
//!
//! A [`FeatureScaler`] is fit on training-fold feature rows only and applied
//! to everything the network sees afterwards, so evaluation folds and live
//! requests never leak statistics into fitting. The scaler ships alongside
//! the network as part of the model artifact.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::checkpoint::{ensure_version, Checkpointable, CheckpointError};
use crate::features::{mean, stdev};

/// Schema version stored in scaler artifacts
pub const SCALER_VERSION: u32 = 1;

/// Errors raised while fitting or applying a scaler.
#[derive(Debug)]
pub enum ScalerError {
    /// No rows were provided to fit on
    EmptyFit,
    /// Rows disagree on column count
    RaggedRows { expected: usize, found: usize },
    /// A vector was scaled against a scaler fit on a different layout
    DimensionMismatch { expected: usize, found: usize },
}

impl fmt::Display for ScalerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalerError::EmptyFit => write!(f, "cannot fit a scaler on zero feature rows"),
            ScalerError::RaggedRows { expected, found } => write!(
                f,
                "feature rows disagree on column count: expected {}, found {}",
                expected, found
            ),
            ScalerError::DimensionMismatch { expected, found } => write!(
                f,
                "feature vector has {} columns but scaler was fit on {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for ScalerError {}

/// Column-wise mean/deviation standardizer for feature vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    means: Vec<f32>,
    stds: Vec<f32>,
}

impl FeatureScaler {
    /// Fits column statistics from a set of feature rows.
    ///
    /// Constant columns get a deviation of 1, so applying the scaler never
    /// divides by zero.
    pub fn fit(rows: &[Vec<f32>]) -> Result<Self, ScalerError> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(ScalerError::EmptyFit);
        }
        let dims = rows[0].len();
        for row in rows {
            if row.len() != dims {
                return Err(ScalerError::RaggedRows {
                    expected: dims,
                    found: row.len(),
                });
            }
        }

        let mut means = vec![0.0; dims];
        let mut stds = vec![0.0; dims];
        let mut column = Vec::with_capacity(rows.len());
        for d in 0..dims {
            column.clear();
            column.extend(rows.iter().map(|row| row[d]));
            means[d] = mean(&column);
            stds[d] = stdev(&column);
        }

        Ok(FeatureScaler { means, stds })
    }

    /// Number of feature columns this scaler was fit on.
    pub fn dimensions(&self) -> usize {
        self.means.len()
    }

    /// Standardizes one feature vector.
    ///
    /// A zero stored deviation is treated as 1, matching the fit-time floor
    /// even for artifacts written by other tooling.
    pub fn transform(&self, features: &[f32]) -> Result<Vec<f32>, ScalerError> {
        if features.len() != self.means.len() {
            return Err(ScalerError::DimensionMismatch {
                expected: self.means.len(),
                found: features.len(),
            });
        }

        Ok(features
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let sd = if self.stds[i] == 0.0 { 1.0 } else { self.stds[i] };
                (x - self.means[i]) / sd
            })
            .collect())
    }

    /// Standardizes a batch of rows, preserving order.
    pub fn transform_rows(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, ScalerError> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}

impl Checkpointable for FeatureScaler {
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        Self::write_snapshot(&(SCALER_VERSION, self.clone()), path)
    }

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let (version, scaler): (u32, FeatureScaler) = Self::read_snapshot(path)?;
        ensure_version(SCALER_VERSION, version)?;
        if scaler.means.len() != scaler.stds.len() {
            return Err(CheckpointError::InvalidFormat(format!(
                "scaler has {} means but {} deviations",
                scaler.means.len(),
                scaler.stds.len()
            )));
        }
        Ok(scaler)
    }
}
