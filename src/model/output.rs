//! Model artifacts and output-layout resolution
//!
//! A persisted model records how its output units map onto cognitive states:
//! either positional (unit `i` is canonical class `i`) or keyed by class
//! label. The mapping is resolved exactly once when the artifact is loaded,
//! so the per-prediction path is a plain array permutation with no format
//! sniffing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::checkpoint::{ensure_version, Checkpointable, CheckpointError};
use crate::dataset::{CognitiveState, StateDistribution};
use crate::model::network::{NetworkConfig, ParameterSnapshot, StateNetwork};

/// Schema version stored in model artifacts
pub const MODEL_VERSION: u32 = 1;

/// How the network's output units map onto cognitive states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputLayout {
    /// Output unit `i` carries the canonical class with index `i`
    Indexed,
    /// Output unit `i` carries the class named by `labels[i]`
    Keyed(Vec<String>),
}

/// Everything needed to reconstruct a trained classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub network_config: NetworkConfig,
    pub parameters: ParameterSnapshot,
    pub layout: OutputLayout,
}

impl ModelArtifact {
    /// Capture a trained network into a persistable artifact.
    pub fn from_network(network: &StateNetwork, layout: OutputLayout) -> Self {
        Self {
            network_config: network.config().clone(),
            parameters: network.snapshot(),
            layout,
        }
    }
}

impl Checkpointable for ModelArtifact {
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        Self::write_snapshot(&(MODEL_VERSION, self.clone()), path)
    }

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let (version, artifact): (u32, ModelArtifact) = Self::read_snapshot(path)?;
        ensure_version(MODEL_VERSION, version)?;
        Ok(artifact)
    }
}

/// A classifier ready to serve predictions, with its output layout resolved.
pub struct LoadedModel {
    network: StateNetwork,
    // class_slots[i] is the canonical class index fed by output unit i
    class_slots: [usize; 3],
}

impl LoadedModel {
    /// Reconstruct a network from an artifact and resolve its output layout.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self, CheckpointError> {
        if artifact.network_config.output_size != CognitiveState::num_classes() {
            return Err(CheckpointError::InvalidFormat(format!(
                "model has {} output units, expected {}",
                artifact.network_config.output_size,
                CognitiveState::num_classes()
            )));
        }

        let mut network = StateNetwork::new(artifact.network_config.clone());
        network.restore(&artifact.parameters)?;

        let class_slots = resolve_layout(&artifact.layout)?;
        Ok(Self {
            network,
            class_slots,
        })
    }

    /// Load and resolve a model artifact from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let artifact = ModelArtifact::load_checkpoint(path)?;
        Self::from_artifact(&artifact)
    }

    pub fn input_size(&self) -> usize {
        self.network.input_size()
    }

    /// Predict the state distribution for an already-scaled feature vector.
    pub fn predict(&self, scaled_features: &[f32]) -> StateDistribution {
        let probs = self.network.forward(scaled_features);

        let mut values = [0.0f32; 3];
        for (slot, &class_idx) in self.class_slots.iter().enumerate() {
            values[class_idx] = probs[slot];
        }
        StateDistribution::from_array(values)
    }

    /// Most probable state for an already-scaled feature vector.
    pub fn predict_state(&self, scaled_features: &[f32]) -> CognitiveState {
        self.predict(scaled_features).argmax()
    }
}

/// Maps an output layout to canonical class indices, one per output unit.
fn resolve_layout(layout: &OutputLayout) -> Result<[usize; 3], CheckpointError> {
    match layout {
        OutputLayout::Indexed => Ok([0, 1, 2]),
        OutputLayout::Keyed(labels) => {
            if labels.len() != CognitiveState::num_classes() {
                return Err(CheckpointError::InvalidFormat(format!(
                    "keyed layout names {} classes, expected {}",
                    labels.len(),
                    CognitiveState::num_classes()
                )));
            }

            let mut slots = [0usize; 3];
            let mut seen = [false; 3];
            for (slot, label) in labels.iter().enumerate() {
                let state = CognitiveState::from_label(label).ok_or_else(|| {
                    CheckpointError::InvalidFormat(format!("unknown class label '{label}'"))
                })?;
                let idx = state.index();
                if seen[idx] {
                    return Err(CheckpointError::InvalidFormat(format!(
                        "class label '{label}' appears twice in keyed layout"
                    )));
                }
                seen[idx] = true;
                slots[slot] = idx;
            }
            Ok(slots)
        }
    }
}
