//! Subject-wise cross-validation and burst training
//!
//! Training runs K-fold cross-validation over subjects, then fits one final
//! model on the whole dataset for production use. Within each fold the
//! network trains in short bursts: after every burst the controller compares
//! the monitored loss against the best seen so far, snapshots the parameters
//! on sufficient improvement, and restores the best snapshot once patience
//! runs out.

pub mod folds;

pub use folds::{distinct_subjects, partition_subjects, SubjectFold};

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::checkpoint::CheckpointError;
use crate::dataset::{CognitiveState, Window};
use crate::features::{extract_feature_matrix, FeatureError};
use crate::model::{
    ModelArtifact, NetworkConfig, OutputLayout, ParameterSnapshot, StateNetwork,
};
use crate::scaler::{FeatureScaler, ScalerError};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of cross-validation folds over subjects
    pub folds: usize,
    /// Sample rate the windows were recorded at, Hz
    pub sample_rate: usize,
    /// Hidden layer widths of the classifier
    pub hidden_sizes: Vec<usize>,
    /// Learning rate for gradient descent
    pub learning_rate: f32,
    /// Mini-batch size
    pub batch_size: usize,
    /// Maximum number of training bursts per fold
    pub max_bursts: usize,
    /// Epochs per burst
    pub burst_epochs: usize,
    /// A burst ends early once the epoch loss falls below this
    pub burst_loss_target: f32,
    /// Minimum loss improvement that counts as progress
    pub improvement_margin: f32,
    /// Bursts without progress before early stop
    pub patience: usize,
    /// Epochs for the final full-dataset model
    pub final_epochs: usize,
    /// Loss target for the final model
    pub final_loss_target: f32,
    /// Seed for fold shuffling, weight init, and batch order
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            sample_rate: 128,
            hidden_sizes: vec![64, 48, 24],
            learning_rate: 8e-4,
            batch_size: 32,
            max_bursts: 40,
            burst_epochs: 120,
            burst_loss_target: 4e-3,
            improvement_margin: 3e-4,
            patience: 6,
            final_epochs: 400,
            final_loss_target: 3e-3,
            seed: 42,
        }
    }
}

/// Errors raised while training.
#[derive(Debug)]
pub enum TrainingError {
    /// No windows to train on
    EmptyDataset,
    /// Subject-wise cross-validation needs at least two distinct subjects
    NotEnoughSubjects { found: usize },
    /// Feature extraction failed on a window
    Feature(FeatureError),
    /// Scaler fitting or application failed
    Scaler(ScalerError),
    /// Parameter snapshot handling failed
    Checkpoint(CheckpointError),
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingError::EmptyDataset => write!(f, "dataset contains no windows"),
            TrainingError::NotEnoughSubjects { found } => write!(
                f,
                "subject-wise cross-validation needs at least 2 subjects, found {found}"
            ),
            TrainingError::Feature(err) => write!(f, "feature extraction failed: {err}"),
            TrainingError::Scaler(err) => write!(f, "feature scaling failed: {err}"),
            TrainingError::Checkpoint(err) => write!(f, "snapshot handling failed: {err}"),
        }
    }
}

impl std::error::Error for TrainingError {}

impl From<FeatureError> for TrainingError {
    fn from(err: FeatureError) -> Self {
        TrainingError::Feature(err)
    }
}

impl From<ScalerError> for TrainingError {
    fn from(err: ScalerError) -> Self {
        TrainingError::Scaler(err)
    }
}

impl From<CheckpointError> for TrainingError {
    fn from(err: CheckpointError) -> Self {
        TrainingError::Checkpoint(err)
    }
}

/// Metrics for a single training burst
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstRecord {
    pub burst: usize,
    pub train_loss: f32,
    pub improved: bool,
    pub elapsed_ms: u128,
}

/// Result of training and evaluating one fold
#[derive(Debug, Clone, Serialize)]
pub struct FoldOutcome {
    pub fold: usize,
    pub train_windows: usize,
    pub test_windows: usize,
    pub test_subjects: Vec<usize>,
    pub bursts: Vec<BurstRecord>,
    pub best_loss: f32,
    pub stopped_early: bool,
    pub accuracy: f32,
}

/// Complete cross-validation result
#[derive(Debug, Clone, Serialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldOutcome>,
    pub mean_accuracy: f32,
    pub std_accuracy: f32,
}

/// Cross-validation report plus the production model and its scaler.
pub struct TrainedPipeline {
    pub report: CrossValidationReport,
    pub model: ModelArtifact,
    pub scaler: FeatureScaler,
}

/// Runs cross-validation followed by the final full-dataset fit.
pub fn run_training(
    windows: &[Window],
    config: &TrainerConfig,
) -> Result<TrainedPipeline, TrainingError> {
    let report = cross_validate(windows, config)?;
    tracing::info!(
        "Cross-validation mean accuracy: {:.2}% (std {:.2}%)",
        report.mean_accuracy * 100.0,
        report.std_accuracy * 100.0
    );

    let (model, scaler) = train_final_model(windows, config)?;
    Ok(TrainedPipeline {
        report,
        model,
        scaler,
    })
}

/// Subject-wise K-fold cross-validation with soft-label targets.
///
/// Every fold fits its own scaler on train-partition features only, trains a
/// fresh network through the burst controller, and scores hard-label accuracy
/// on the held-out subjects.
pub fn cross_validate(
    windows: &[Window],
    config: &TrainerConfig,
) -> Result<CrossValidationReport, TrainingError> {
    if windows.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let subject_per_window: Vec<usize> = windows.iter().map(|w| w.subject).collect();
    let subjects = distinct_subjects(&subject_per_window);
    if subjects.len() < 2 {
        return Err(TrainingError::NotEnoughSubjects {
            found: subjects.len(),
        });
    }

    let features = extract_feature_matrix(windows, config.sample_rate)?;
    let targets = soft_targets(windows);
    let folds = partition_subjects(&subjects, config.folds, config.seed);

    let mut outcomes = Vec::with_capacity(folds.len());
    for fold in &folds {
        let test_set: HashSet<usize> = fold.test_subjects.iter().copied().collect();

        let mut train_idx = Vec::new();
        let mut test_idx = Vec::new();
        for (i, window) in windows.iter().enumerate() {
            if test_set.contains(&window.subject) {
                test_idx.push(i);
            } else {
                train_idx.push(i);
            }
        }

        tracing::info!(
            "Fold {}/{}: {} train windows, {} test windows",
            fold.index + 1,
            folds.len(),
            train_idx.len(),
            test_idx.len()
        );

        let train_rows = gather_rows(&features, &train_idx);
        let scaler = FeatureScaler::fit(&train_rows)?;
        let train_inputs: Vec<Array1<f32>> = scaler
            .transform_rows(&train_rows)?
            .into_iter()
            .map(Array1::from_vec)
            .collect();
        let train_targets: Vec<Array1<f32>> =
            train_idx.iter().map(|&i| targets[i].clone()).collect();

        let mut network = StateNetwork::new(NetworkConfig {
            input_size: scaler.dimensions(),
            hidden_sizes: config.hidden_sizes.clone(),
            output_size: CognitiveState::num_classes(),
            seed: config.seed.wrapping_add(fold.index as u64),
        });
        let mut rng =
            StdRng::seed_from_u64(config.seed.wrapping_add(1000 + fold.index as u64));

        let controller =
            run_burst_loop(&mut network, &train_inputs, &train_targets, config, &mut rng)?;

        let mut correct = 0usize;
        for &i in &test_idx {
            let scaled = scaler.transform(&features[i])?;
            if network.predict_index(&scaled) == windows[i].label.index() {
                correct += 1;
            }
        }
        let accuracy = if test_idx.is_empty() {
            0.0
        } else {
            correct as f32 / test_idx.len() as f32
        };

        tracing::info!("Fold {} accuracy: {:.2}%", fold.index + 1, accuracy * 100.0);

        let outcome = FoldOutcome {
            fold: fold.index,
            train_windows: train_idx.len(),
            test_windows: test_idx.len(),
            test_subjects: fold.test_subjects.clone(),
            bursts: controller.bursts,
            best_loss: controller.best_loss,
            stopped_early: controller.stopped_early,
            accuracy,
        };

        if let Err(err) = crate::logging::log_fold_outcome(&outcome) {
            tracing::warn!("Failed to append training log entry: {}", err);
        }

        outcomes.push(outcome);
    }

    let accuracies: Vec<f32> = outcomes.iter().map(|o| o.accuracy).collect();
    let mean_accuracy = crate::features::mean(&accuracies);
    let std_accuracy = crate::features::variance(&accuracies).sqrt();

    Ok(CrossValidationReport {
        folds: outcomes,
        mean_accuracy,
        std_accuracy,
    })
}

/// Fits the production model on the entire dataset.
///
/// The scaler is refit on all windows and the network runs one long training
/// pass; the burst controller is not needed because nothing is held out.
pub fn train_final_model(
    windows: &[Window],
    config: &TrainerConfig,
) -> Result<(ModelArtifact, FeatureScaler), TrainingError> {
    if windows.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let features = extract_feature_matrix(windows, config.sample_rate)?;
    let targets = soft_targets(windows);

    let scaler = FeatureScaler::fit(&features)?;
    let inputs: Vec<Array1<f32>> = scaler
        .transform_rows(&features)?
        .into_iter()
        .map(Array1::from_vec)
        .collect();

    let mut network = StateNetwork::new(NetworkConfig {
        input_size: scaler.dimensions(),
        hidden_sizes: config.hidden_sizes.clone(),
        output_size: CognitiveState::num_classes(),
        seed: config.seed,
    });
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(7919));

    tracing::info!("Training final model on {} windows", windows.len());
    let loss = run_epochs(
        &mut network,
        &inputs,
        &targets,
        config.final_epochs,
        config.batch_size,
        config.learning_rate,
        config.final_loss_target,
        &mut rng,
    );
    tracing::info!("Final model training loss: {:.6}", loss);

    let artifact = ModelArtifact::from_network(&network, OutputLayout::Indexed);
    Ok((artifact, scaler))
}

struct BurstLoopOutcome {
    bursts: Vec<BurstRecord>,
    best_loss: f32,
    stopped_early: bool,
}

/// Repeated short training bursts with snapshot-on-improvement.
fn run_burst_loop(
    network: &mut StateNetwork,
    inputs: &[Array1<f32>],
    targets: &[Array1<f32>],
    config: &TrainerConfig,
    rng: &mut StdRng,
) -> Result<BurstLoopOutcome, TrainingError> {
    let mut bursts = Vec::new();
    let mut best_loss = f32::INFINITY;
    let mut best_snapshot: Option<ParameterSnapshot> = None;
    let mut patience = 0usize;
    let mut stopped_early = false;

    for burst in 0..config.max_bursts {
        let start = Instant::now();
        let loss = run_epochs(
            network,
            inputs,
            targets,
            config.burst_epochs,
            config.batch_size,
            config.learning_rate,
            config.burst_loss_target,
            rng,
        );

        let improved = loss < best_loss - config.improvement_margin;
        if improved {
            best_loss = loss;
            best_snapshot = Some(network.snapshot());
            patience = 0;
        } else {
            patience += 1;
        }

        bursts.push(BurstRecord {
            burst,
            train_loss: loss,
            improved,
            elapsed_ms: start.elapsed().as_millis(),
        });

        if patience >= config.patience {
            tracing::info!(
                "Early stop after burst {} (no improvement for {} bursts)",
                burst + 1,
                patience
            );
            stopped_early = true;
            break;
        }
    }

    // Evaluation happens on the best parameters seen, not the last ones.
    if let Some(snapshot) = &best_snapshot {
        network.restore(snapshot)?;
    }

    Ok(BurstLoopOutcome {
        bursts,
        best_loss,
        stopped_early,
    })
}

/// Mini-batch epochs with an early exit once the loss target is reached.
#[allow(clippy::too_many_arguments)]
fn run_epochs(
    network: &mut StateNetwork,
    inputs: &[Array1<f32>],
    targets: &[Array1<f32>],
    epochs: usize,
    batch_size: usize,
    learning_rate: f32,
    loss_target: f32,
    rng: &mut StdRng,
) -> f32 {
    let mut indices: Vec<usize> = (0..inputs.len()).collect();
    let mut epoch_loss = f32::INFINITY;

    for _ in 0..epochs {
        indices.shuffle(rng);

        let mut loss_sum = 0.0;
        let mut num_batches = 0;
        for batch in indices.chunks(batch_size.max(1)) {
            let batch_inputs: Vec<Array1<f32>> =
                batch.iter().map(|&i| inputs[i].clone()).collect();
            let batch_targets: Vec<Array1<f32>> =
                batch.iter().map(|&i| targets[i].clone()).collect();

            let (loss, gradients) = network.compute_loss(&batch_inputs, &batch_targets);
            network.update_weights(&gradients, learning_rate);

            loss_sum += loss;
            num_batches += 1;
        }

        epoch_loss = loss_sum / num_batches.max(1) as f32;
        if epoch_loss < loss_target {
            break;
        }
    }

    epoch_loss
}

fn soft_targets(windows: &[Window]) -> Vec<Array1<f32>> {
    windows
        .iter()
        .map(|w| Array1::from_vec(w.soft.to_array().to_vec()))
        .collect()
}

fn gather_rows(features: &[Vec<f32>], indices: &[usize]) -> Vec<Vec<f32>> {
    indices.iter().map(|&i| features[i].clone()).collect()
}
