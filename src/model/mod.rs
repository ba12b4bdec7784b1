//! Classifier network and trained-model persistence

pub mod network;
pub mod output;

pub use network::{Gradients, NetworkConfig, ParameterSnapshot, StateNetwork};
pub use output::{LoadedModel, ModelArtifact, OutputLayout, MODEL_VERSION};
