//! Pipeline configuration management via TOML files.
//!
//! This module provides configuration parsing from TOML format with sensible defaults.
//! Every field carries a default, so a partial file (or an empty one) still loads;
//! validation happens after parsing and rejects values the pipeline cannot run with.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{SynthesisConfig, WindowerConfig};
use crate::trainer::TrainerConfig;

/// Pipeline configuration loaded from a TOML file.
///
/// # Examples
///
/// ```
/// use cognitive_state_core::PipelineConfig;
///
/// // Load from file, falling back to defaults
/// let config = PipelineConfig::load_from_file("config/pipeline.toml")
///     .unwrap_or_else(|_| PipelineConfig::default());
///
/// println!("Subjects: {}", config.dataset.subjects);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Synthetic recording parameters.
    pub dataset: DatasetConfig,
    /// Windowing and soft-label noise parameters.
    pub labels: LabelConfig,
    /// Cross-validation and optimizer parameters.
    pub training: TrainingConfig,
    /// File locations for the dataset and trained artifacts.
    pub artifacts: ArtifactConfig,
}

impl PipelineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        Self::from_str(&contents)
    }

    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawPipelineConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;

        let dataset = DatasetConfig::try_from(&raw.dataset)?;
        let labels = LabelConfig::try_from(&raw.labels)?;
        let training = TrainingConfig::try_from(&raw.training)?;
        let artifacts = ArtifactConfig::try_from(&raw.artifacts)?;

        Ok(Self {
            dataset,
            labels,
            training,
            artifacts,
        })
    }

    /// Synthesis parameters for one recording, with the model's standard
    /// channel layout and state dynamics.
    pub fn synthesis_config(&self) -> SynthesisConfig {
        SynthesisConfig {
            sample_rate: self.dataset.sample_rate,
            trial_secs: self.dataset.trial_secs,
            ..SynthesisConfig::default()
        }
    }

    pub fn windower_config(&self) -> WindowerConfig {
        WindowerConfig {
            window_samples: self.labels.window_samples,
            min_windows_per_class: self.labels.min_windows_per_class,
            smoothing: self.labels.smoothing,
            jitter_sigma: self.labels.jitter_sigma,
            floor: self.labels.floor,
            mislabel_prob: self.labels.mislabel_prob,
            mislabel_shift: self.labels.mislabel_shift,
        }
    }

    /// Trainer parameters; the sample rate comes from the dataset section so
    /// band powers are computed against the rate the windows were recorded at.
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            folds: self.training.folds,
            sample_rate: self.dataset.sample_rate,
            hidden_sizes: self.training.hidden_sizes.clone(),
            learning_rate: self.training.learning_rate,
            batch_size: self.training.batch_size,
            max_bursts: self.training.max_bursts,
            burst_epochs: self.training.burst_epochs,
            burst_loss_target: self.training.burst_loss_target,
            improvement_margin: self.training.improvement_margin,
            patience: self.training.patience,
            final_epochs: self.training.final_epochs,
            final_loss_target: self.training.final_loss_target,
            seed: self.training.seed,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            labels: LabelConfig::default(),
            training: TrainingConfig::default(),
            artifacts: ArtifactConfig::default(),
        }
    }
}

/// Synthetic recording parameters.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetConfig {
    /// Number of simulated subjects
    pub subjects: usize,
    /// Subjects with index at or above this belong to the attention-deficit group
    pub deficit_start: usize,
    /// Length of each recording in seconds
    pub trial_secs: usize,
    /// Sample rate in Hz
    pub sample_rate: usize,
    /// Seed for subject profiles, state walks, and label noise
    pub seed: u64,
}

impl DatasetConfig {
    fn try_from(raw: &RawDataset) -> Result<Self, ConfigError> {
        if raw.subjects == 0 {
            return Err(ConfigError::Parse("dataset.subjects must be ≥ 1".into()));
        }
        if raw.deficit_start > raw.subjects {
            return Err(ConfigError::Parse(
                "dataset.deficit_start must not exceed dataset.subjects".into(),
            ));
        }
        if raw.trial_secs == 0 {
            return Err(ConfigError::Parse("dataset.trial_secs must be ≥ 1".into()));
        }
        if raw.sample_rate < 2 {
            return Err(ConfigError::Parse("dataset.sample_rate must be ≥ 2".into()));
        }

        Ok(Self {
            subjects: raw.subjects,
            deficit_start: raw.deficit_start,
            trial_secs: raw.trial_secs,
            sample_rate: raw.sample_rate,
            seed: raw.seed,
        })
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            subjects: default_subjects(),
            deficit_start: default_deficit_start(),
            trial_secs: default_trial_secs(),
            sample_rate: default_sample_rate(),
            seed: default_dataset_seed(),
        }
    }
}

/// Windowing and soft-label noise parameters.
#[derive(Debug, Clone, Serialize)]
pub struct LabelConfig {
    /// Window length in samples; also the slicing stride
    pub window_samples: usize,
    /// Minimum majority-labeled windows per class per subject
    pub min_windows_per_class: usize,
    /// Weight of the raw proportions in the uniform blend
    pub smoothing: f32,
    /// Sigma of the additive Gaussian jitter per component
    pub jitter_sigma: f32,
    /// Positive floor applied before renormalization
    pub floor: f32,
    /// Probability of injecting a simulated human mislabel
    pub mislabel_prob: f32,
    /// Probability mass pushed toward the flipped class
    pub mislabel_shift: f32,
}

impl LabelConfig {
    fn try_from(raw: &RawLabels) -> Result<Self, ConfigError> {
        if raw.window_samples < 2 {
            return Err(ConfigError::Parse(
                "labels.window_samples must be ≥ 2".into(),
            ));
        }
        if raw.min_windows_per_class == 0 {
            return Err(ConfigError::Parse(
                "labels.min_windows_per_class must be ≥ 1".into(),
            ));
        }
        if !raw.smoothing.is_finite() || !(0.0..=1.0).contains(&raw.smoothing) {
            return Err(ConfigError::Parse(
                "labels.smoothing must be in [0, 1]".into(),
            ));
        }
        if !raw.jitter_sigma.is_finite() || raw.jitter_sigma < 0.0 {
            return Err(ConfigError::Parse(
                "labels.jitter_sigma must be ≥ 0".into(),
            ));
        }
        if !raw.floor.is_finite() || raw.floor <= 0.0 {
            return Err(ConfigError::Parse("labels.floor must be positive".into()));
        }
        if !raw.mislabel_prob.is_finite() || !(0.0..=1.0).contains(&raw.mislabel_prob) {
            return Err(ConfigError::Parse(
                "labels.mislabel_prob must be in [0, 1]".into(),
            ));
        }
        if !raw.mislabel_shift.is_finite() || !(0.0..=1.0).contains(&raw.mislabel_shift) {
            return Err(ConfigError::Parse(
                "labels.mislabel_shift must be in [0, 1]".into(),
            ));
        }

        Ok(Self {
            window_samples: raw.window_samples,
            min_windows_per_class: raw.min_windows_per_class,
            smoothing: raw.smoothing,
            jitter_sigma: raw.jitter_sigma,
            floor: raw.floor,
            mislabel_prob: raw.mislabel_prob,
            mislabel_shift: raw.mislabel_shift,
        })
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            window_samples: default_window_samples(),
            min_windows_per_class: default_min_windows_per_class(),
            smoothing: default_smoothing(),
            jitter_sigma: default_jitter_sigma(),
            floor: default_floor(),
            mislabel_prob: default_mislabel_prob(),
            mislabel_shift: default_mislabel_shift(),
        }
    }
}

/// Cross-validation and optimizer parameters.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingConfig {
    pub folds: usize,
    pub hidden_sizes: Vec<usize>,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub max_bursts: usize,
    pub burst_epochs: usize,
    pub burst_loss_target: f32,
    pub improvement_margin: f32,
    pub patience: usize,
    pub final_epochs: usize,
    pub final_loss_target: f32,
    pub seed: u64,
}

impl TrainingConfig {
    fn try_from(raw: &RawTraining) -> Result<Self, ConfigError> {
        if raw.folds < 2 {
            return Err(ConfigError::Parse("training.folds must be ≥ 2".into()));
        }
        if raw.hidden_sizes.is_empty() {
            return Err(ConfigError::Parse(
                "training.hidden_sizes must not be empty".into(),
            ));
        }
        if raw.hidden_sizes.iter().any(|&size| size == 0) {
            return Err(ConfigError::Parse(
                "training.hidden_sizes entries must be ≥ 1".into(),
            ));
        }
        if !raw.learning_rate.is_finite() || raw.learning_rate <= 0.0 {
            return Err(ConfigError::Parse(
                "training.learning_rate must be positive".into(),
            ));
        }
        if raw.batch_size == 0 {
            return Err(ConfigError::Parse("training.batch_size must be ≥ 1".into()));
        }
        if raw.max_bursts == 0 {
            return Err(ConfigError::Parse("training.max_bursts must be ≥ 1".into()));
        }
        if raw.burst_epochs == 0 {
            return Err(ConfigError::Parse(
                "training.burst_epochs must be ≥ 1".into(),
            ));
        }
        if !raw.burst_loss_target.is_finite() || raw.burst_loss_target <= 0.0 {
            return Err(ConfigError::Parse(
                "training.burst_loss_target must be positive".into(),
            ));
        }
        if !raw.improvement_margin.is_finite() || raw.improvement_margin < 0.0 {
            return Err(ConfigError::Parse(
                "training.improvement_margin must be ≥ 0".into(),
            ));
        }
        if raw.patience == 0 {
            return Err(ConfigError::Parse("training.patience must be ≥ 1".into()));
        }
        if raw.final_epochs == 0 {
            return Err(ConfigError::Parse(
                "training.final_epochs must be ≥ 1".into(),
            ));
        }
        if !raw.final_loss_target.is_finite() || raw.final_loss_target <= 0.0 {
            return Err(ConfigError::Parse(
                "training.final_loss_target must be positive".into(),
            ));
        }

        Ok(Self {
            folds: raw.folds,
            hidden_sizes: raw.hidden_sizes.clone(),
            learning_rate: raw.learning_rate,
            batch_size: raw.batch_size,
            max_bursts: raw.max_bursts,
            burst_epochs: raw.burst_epochs,
            burst_loss_target: raw.burst_loss_target,
            improvement_margin: raw.improvement_margin,
            patience: raw.patience,
            final_epochs: raw.final_epochs,
            final_loss_target: raw.final_loss_target,
            seed: raw.seed,
        })
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            folds: default_folds(),
            hidden_sizes: default_hidden_sizes(),
            learning_rate: default_learning_rate(),
            batch_size: default_batch_size(),
            max_bursts: default_max_bursts(),
            burst_epochs: default_burst_epochs(),
            burst_loss_target: default_burst_loss_target(),
            improvement_margin: default_improvement_margin(),
            patience: default_patience(),
            final_epochs: default_final_epochs(),
            final_loss_target: default_final_loss_target(),
            seed: default_training_seed(),
        }
    }
}

/// File locations for the dataset and trained artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactConfig {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
}

impl ArtifactConfig {
    fn try_from(raw: &RawArtifacts) -> Result<Self, ConfigError> {
        if raw.dataset_path.is_empty() {
            return Err(ConfigError::Parse(
                "artifacts.dataset_path must not be empty".into(),
            ));
        }
        if raw.model_path.is_empty() {
            return Err(ConfigError::Parse(
                "artifacts.model_path must not be empty".into(),
            ));
        }
        if raw.scaler_path.is_empty() {
            return Err(ConfigError::Parse(
                "artifacts.scaler_path must not be empty".into(),
            ));
        }

        Ok(Self {
            dataset_path: PathBuf::from(&raw.dataset_path),
            model_path: PathBuf::from(&raw.model_path),
            scaler_path: PathBuf::from(&raw.scaler_path),
        })
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(default_dataset_path()),
            model_path: PathBuf::from(default_model_path()),
            scaler_path: PathBuf::from(default_scaler_path()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPipelineConfig {
    #[serde(default)]
    dataset: RawDataset,
    #[serde(default)]
    labels: RawLabels,
    #[serde(default)]
    training: RawTraining,
    #[serde(default)]
    artifacts: RawArtifacts,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default = "default_subjects")]
    subjects: usize,
    #[serde(default = "default_deficit_start")]
    deficit_start: usize,
    #[serde(default = "default_trial_secs")]
    trial_secs: usize,
    #[serde(default = "default_sample_rate")]
    sample_rate: usize,
    #[serde(default = "default_dataset_seed")]
    seed: u64,
}

impl Default for RawDataset {
    fn default() -> Self {
        Self {
            subjects: default_subjects(),
            deficit_start: default_deficit_start(),
            trial_secs: default_trial_secs(),
            sample_rate: default_sample_rate(),
            seed: default_dataset_seed(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLabels {
    #[serde(default = "default_window_samples")]
    window_samples: usize,
    #[serde(default = "default_min_windows_per_class")]
    min_windows_per_class: usize,
    #[serde(default = "default_smoothing")]
    smoothing: f32,
    #[serde(default = "default_jitter_sigma")]
    jitter_sigma: f32,
    #[serde(default = "default_floor")]
    floor: f32,
    #[serde(default = "default_mislabel_prob")]
    mislabel_prob: f32,
    #[serde(default = "default_mislabel_shift")]
    mislabel_shift: f32,
}

impl Default for RawLabels {
    fn default() -> Self {
        Self {
            window_samples: default_window_samples(),
            min_windows_per_class: default_min_windows_per_class(),
            smoothing: default_smoothing(),
            jitter_sigma: default_jitter_sigma(),
            floor: default_floor(),
            mislabel_prob: default_mislabel_prob(),
            mislabel_shift: default_mislabel_shift(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTraining {
    #[serde(default = "default_folds")]
    folds: usize,
    #[serde(default = "default_hidden_sizes")]
    hidden_sizes: Vec<usize>,
    #[serde(default = "default_learning_rate")]
    learning_rate: f32,
    #[serde(default = "default_batch_size")]
    batch_size: usize,
    #[serde(default = "default_max_bursts")]
    max_bursts: usize,
    #[serde(default = "default_burst_epochs")]
    burst_epochs: usize,
    #[serde(default = "default_burst_loss_target")]
    burst_loss_target: f32,
    #[serde(default = "default_improvement_margin")]
    improvement_margin: f32,
    #[serde(default = "default_patience")]
    patience: usize,
    #[serde(default = "default_final_epochs")]
    final_epochs: usize,
    #[serde(default = "default_final_loss_target")]
    final_loss_target: f32,
    #[serde(default = "default_training_seed")]
    seed: u64,
}

impl Default for RawTraining {
    fn default() -> Self {
        Self {
            folds: default_folds(),
            hidden_sizes: default_hidden_sizes(),
            learning_rate: default_learning_rate(),
            batch_size: default_batch_size(),
            max_bursts: default_max_bursts(),
            burst_epochs: default_burst_epochs(),
            burst_loss_target: default_burst_loss_target(),
            improvement_margin: default_improvement_margin(),
            patience: default_patience(),
            final_epochs: default_final_epochs(),
            final_loss_target: default_final_loss_target(),
            seed: default_training_seed(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawArtifacts {
    #[serde(default = "default_dataset_path")]
    dataset_path: String,
    #[serde(default = "default_model_path")]
    model_path: String,
    #[serde(default = "default_scaler_path")]
    scaler_path: String,
}

impl Default for RawArtifacts {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            model_path: default_model_path(),
            scaler_path: default_scaler_path(),
        }
    }
}

fn default_subjects() -> usize {
    20
}

fn default_deficit_start() -> usize {
    10
}

fn default_trial_secs() -> usize {
    60
}

fn default_sample_rate() -> usize {
    128
}

fn default_dataset_seed() -> u64 {
    42
}

fn default_window_samples() -> usize {
    128
}

fn default_min_windows_per_class() -> usize {
    6
}

fn default_smoothing() -> f32 {
    0.85
}

fn default_jitter_sigma() -> f32 {
    0.10
}

fn default_floor() -> f32 {
    5e-4
}

fn default_mislabel_prob() -> f32 {
    0.12
}

fn default_mislabel_shift() -> f32 {
    0.25
}

fn default_folds() -> usize {
    5
}

fn default_hidden_sizes() -> Vec<usize> {
    vec![64, 48, 24]
}

fn default_learning_rate() -> f32 {
    8e-4
}

fn default_batch_size() -> usize {
    32
}

fn default_max_bursts() -> usize {
    40
}

fn default_burst_epochs() -> usize {
    120
}

fn default_burst_loss_target() -> f32 {
    4e-3
}

fn default_improvement_margin() -> f32 {
    3e-4
}

fn default_patience() -> usize {
    6
}

fn default_final_epochs() -> usize {
    400
}

fn default_final_loss_target() -> f32 {
    3e-3
}

fn default_training_seed() -> u64 {
    42
}

fn default_dataset_path() -> String {
    "data/eeg_cognitive_states.json".to_string()
}

fn default_model_path() -> String {
    "models/cognitive_state_model.bin".to_string()
}

fn default_scaler_path() -> String {
    "models/feature_scaler.bin".to_string()
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}
