//! Prediction service
//!
//! In-process serving boundary around the trained model and its scaler. The
//! caller is never blocked: malformed requests and internal failures both
//! come back as a typed classification whose fallback distribution is
//! uniform, so downstream consumers always have something to act on.

use std::path::Path;

use serde::Serialize;

use crate::checkpoint::{Checkpointable, CheckpointError};
use crate::dataset::StateDistribution;
use crate::model::LoadedModel;
use crate::scaler::FeatureScaler;

/// Outcome of one prediction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PredictionOutcome {
    /// Clean prediction
    Ok(StateDistribution),
    /// The request is malformed; the caller should fix its input
    ClientError(String),
    /// The pipeline failed internally; the caller did nothing wrong
    ServerError(String),
}

impl PredictionOutcome {
    /// The distribution to act on; degraded outcomes yield the uniform
    /// fallback.
    pub fn distribution(&self) -> StateDistribution {
        match self {
            PredictionOutcome::Ok(dist) => *dist,
            _ => StateDistribution::uniform(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, PredictionOutcome::Ok(_))
    }
}

/// Serves state predictions from a loaded model and scaler pair.
pub struct PredictionService {
    model: LoadedModel,
    scaler: FeatureScaler,
}

impl PredictionService {
    /// Wires a model and scaler together, rejecting mismatched pairs.
    ///
    /// A scaler fit on a different feature layout than the model expects is
    /// a deployment error and surfaces here, at startup, rather than on the
    /// first request.
    pub fn new(model: LoadedModel, scaler: FeatureScaler) -> Result<Self, CheckpointError> {
        if model.input_size() != scaler.dimensions() {
            return Err(CheckpointError::InvalidFormat(format!(
                "model expects {} features but scaler was fit on {}",
                model.input_size(),
                scaler.dimensions()
            )));
        }
        Ok(Self { model, scaler })
    }

    /// Loads both artifacts from disk and wires them together.
    pub fn load<P: AsRef<Path>>(model_path: P, scaler_path: P) -> Result<Self, CheckpointError> {
        let model = LoadedModel::load(model_path)?;
        let scaler = FeatureScaler::load_checkpoint(scaler_path)?;
        Self::new(model, scaler)
    }

    /// Number of features a request must carry.
    pub fn expected_features(&self) -> usize {
        self.scaler.dimensions()
    }

    /// Classifies one raw feature vector.
    ///
    /// Never panics. Wrong-length or non-finite input is a client error;
    /// anything that goes wrong past validation is a server error. Both
    /// carry the uniform fallback through [`PredictionOutcome::distribution`].
    pub fn predict(&self, features: &[f32]) -> PredictionOutcome {
        if features.len() != self.scaler.dimensions() {
            return PredictionOutcome::ClientError(format!(
                "expected {} features, got {}",
                self.scaler.dimensions(),
                features.len()
            ));
        }
        if let Some(pos) = features.iter().position(|v| !v.is_finite()) {
            return PredictionOutcome::ClientError(format!(
                "feature {pos} is not a finite number"
            ));
        }

        let scaled = match self.scaler.transform(features) {
            Ok(scaled) => scaled,
            Err(err) => {
                tracing::error!("Scaler rejected a validated request: {}", err);
                return PredictionOutcome::ServerError(err.to_string());
            }
        };

        let dist = self.model.predict(&scaled);
        if dist.to_array().iter().any(|p| !p.is_finite()) {
            tracing::error!("Model produced a non-finite distribution");
            return PredictionOutcome::ServerError(
                "model produced a non-finite distribution".to_string(),
            );
        }

        PredictionOutcome::Ok(dist)
    }
}
