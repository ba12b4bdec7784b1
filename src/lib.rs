//! # Cognitive State Core
//!
//! A deterministic Rust pipeline for synthetic EEG: it generates multi-channel
//! recordings with soft cognitive-state labels, extracts spectral and
//! statistical features, trains a small feed-forward classifier with
//! subject-level cross-validation, and serves predictions from the saved
//! artifacts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cognitive_state_core::{run_training, Checkpointable, PipelineConfig};
//! use cognitive_state_core::dataset::{read_windows, Window};
//!
//! let config = PipelineConfig::default();
//! let windows: Vec<Window> = read_windows(&config.artifacts.dataset_path)?;
//!
//! // Cross-validate, then fit the final model on every window
//! let pipeline = run_training(&windows, &config.trainer_config())?;
//! println!("Mean accuracy: {:.3}", pipeline.report.mean_accuracy);
//!
//! pipeline.model.save_checkpoint(&config.artifacts.model_path)?;
//! pipeline.scaler.save_checkpoint(&config.artifacts.scaler_path)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`config`] - Pipeline configuration via TOML
//! - [`dataset`] - Synthetic EEG trials, windowing, and soft labels
//! - [`features`] - Band powers, Hjorth parameters, and cross-channel correlations
//! - [`trainer`] - Subject-level cross-validation and burst training
//! - [`serve`] - Prediction service over saved artifacts

pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod eval;
pub mod features;
pub mod logging;
pub mod model;
pub mod scaler;
pub mod serve;
pub mod trainer;

pub use checkpoint::{CheckpointError, Checkpointable};
pub use config::{
    ArtifactConfig, ConfigError, DatasetConfig, LabelConfig, PipelineConfig, TrainingConfig,
};
pub use dataset::{
    synthesize_trial, window_trial, CognitiveState, StateDistribution, SubjectProfile, Trial,
    Window,
};
pub use eval::{evaluate_dataset, ConfusionMatrix, EvaluationReport};
pub use features::{extract_feature_matrix, extract_features, feature_count, FeatureError};
pub use model::{LoadedModel, ModelArtifact, NetworkConfig, OutputLayout, StateNetwork};
pub use scaler::{FeatureScaler, ScalerError};
pub use serve::{PredictionOutcome, PredictionService};
pub use trainer::{
    run_training, CrossValidationReport, FoldOutcome, TrainedPipeline, TrainerConfig,
    TrainingError,
};
