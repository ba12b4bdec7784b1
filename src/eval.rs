//! Model evaluation
//!
//! Scores a trained model against labeled windows: overall accuracy, a
//! confusion matrix over true vs. predicted classes, and per-class statistics
//! of the winning-prediction confidence.

use std::fmt;

use serde::Serialize;

use crate::dataset::{CognitiveState, Window};
use crate::features::{extract_feature_matrix, mean, variance, FeatureError};
use crate::model::LoadedModel;
use crate::scaler::{FeatureScaler, ScalerError};

/// Errors raised while evaluating a model.
#[derive(Debug)]
pub enum EvaluationError {
    /// No windows to evaluate on
    EmptyDataset,
    /// Feature extraction failed on a window
    Feature(FeatureError),
    /// Scaler application failed
    Scaler(ScalerError),
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationError::EmptyDataset => write!(f, "no windows to evaluate on"),
            EvaluationError::Feature(err) => write!(f, "feature extraction failed: {err}"),
            EvaluationError::Scaler(err) => write!(f, "feature scaling failed: {err}"),
        }
    }
}

impl std::error::Error for EvaluationError {}

impl From<FeatureError> for EvaluationError {
    fn from(err: FeatureError) -> Self {
        EvaluationError::Feature(err)
    }
}

impl From<ScalerError> for EvaluationError {
    fn from(err: ScalerError) -> Self {
        EvaluationError::Scaler(err)
    }
}

/// Confusion counts; rows are true classes, columns are predicted classes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfusionMatrix {
    counts: [[usize; 3]; 3],
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: CognitiveState, predicted: CognitiveState) {
        self.counts[actual.index()][predicted.index()] += 1;
    }

    pub fn count(&self, actual: CognitiveState, predicted: CognitiveState) -> usize {
        self.counts[actual.index()][predicted.index()]
    }

    /// Number of windows whose true class is `actual`.
    pub fn row_sum(&self, actual: CognitiveState) -> usize {
        self.counts[actual.index()].iter().sum()
    }

    /// Correctly classified windows across all classes.
    pub fn diagonal_sum(&self) -> usize {
        (0..3).map(|i| self.counts[i][i]).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Winning-confidence statistics for windows of one true class.
#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceStats {
    pub count: usize,
    pub mean: f32,
    pub std: f32,
    /// Fraction of predictions with confidence above 0.90
    pub frac_above_090: f32,
    /// Fraction of predictions with confidence below 0.50
    pub frac_below_050: f32,
}

impl ConfidenceStats {
    fn from_values(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                mean: 0.0,
                std: 0.0,
                frac_above_090: 0.0,
                frac_below_050: 0.0,
            };
        }

        let n = values.len() as f32;
        Self {
            count: values.len(),
            mean: mean(values),
            std: variance(values).sqrt(),
            frac_above_090: values.iter().filter(|&&v| v > 0.90).count() as f32 / n,
            frac_below_050: values.iter().filter(|&&v| v < 0.50).count() as f32 / n,
        }
    }
}

/// Full evaluation result
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f32,
    pub confusion: ConfusionMatrix,
    /// Indexed by canonical class order
    pub confidence: [ConfidenceStats; 3],
}

/// Evaluates a loaded model over labeled windows.
///
/// Every window goes through the same path as a live request: feature
/// extraction, scaling, prediction, argmax against the hard label.
pub fn evaluate_dataset(
    model: &LoadedModel,
    scaler: &FeatureScaler,
    windows: &[Window],
    sample_rate: usize,
) -> Result<EvaluationReport, EvaluationError> {
    if windows.is_empty() {
        return Err(EvaluationError::EmptyDataset);
    }

    let features = extract_feature_matrix(windows, sample_rate)?;

    let mut confusion = ConfusionMatrix::default();
    let mut correct = 0usize;
    let mut confidences: [Vec<f32>; 3] = [Vec::new(), Vec::new(), Vec::new()];

    for (window, row) in windows.iter().zip(features.iter()) {
        let scaled = scaler.transform(row)?;
        let dist = model.predict(&scaled);

        let predicted = dist.argmax();
        confusion.record(window.label, predicted);
        if predicted == window.label {
            correct += 1;
        }
        confidences[window.label.index()].push(dist.max_value());
    }

    let confidence = [
        ConfidenceStats::from_values(&confidences[0]),
        ConfidenceStats::from_values(&confidences[1]),
        ConfidenceStats::from_values(&confidences[2]),
    ];

    Ok(EvaluationReport {
        total: windows.len(),
        correct,
        accuracy: correct as f32 / windows.len() as f32,
        confusion,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StateDistribution;
    use crate::model::{ModelArtifact, NetworkConfig, OutputLayout, StateNetwork};

    fn tone_window(subject: usize, state: CognitiveState) -> Window {
        let freq = match state {
            CognitiveState::Attentive => 17.0,
            CognitiveState::Calm => 10.0,
            CognitiveState::Drowsy => 5.0,
        };
        let channels: Vec<Vec<f32>> = (0..2)
            .map(|c| {
                (0..128)
                    .map(|i| {
                        (2.0 * std::f32::consts::PI * freq * i as f32 / 128.0 + c as f32)
                            .sin()
                    })
                    .collect()
            })
            .collect();

        let mut soft = [0.05f32; 3];
        soft[state.index()] = 0.9;

        Window {
            channels,
            label: state,
            soft: StateDistribution::from_array(soft),
            subject,
        }
    }

    fn untrained_setup(windows: &[Window]) -> (LoadedModel, FeatureScaler) {
        let features = extract_feature_matrix(windows, 128).unwrap();
        let scaler = FeatureScaler::fit(&features).unwrap();

        let network = StateNetwork::new(NetworkConfig {
            input_size: scaler.dimensions(),
            hidden_sizes: vec![8],
            output_size: 3,
            seed: 5,
        });
        let artifact = ModelArtifact::from_network(&network, OutputLayout::Indexed);
        (LoadedModel::from_artifact(&artifact).unwrap(), scaler)
    }

    #[test]
    fn test_confusion_rows_match_class_counts() {
        let mut windows = Vec::new();
        for subject in 0..3 {
            windows.push(tone_window(subject, CognitiveState::Attentive));
            windows.push(tone_window(subject, CognitiveState::Calm));
            windows.push(tone_window(subject, CognitiveState::Drowsy));
            windows.push(tone_window(subject, CognitiveState::Calm));
        }

        let (model, scaler) = untrained_setup(&windows);
        let report = evaluate_dataset(&model, &scaler, &windows, 128).unwrap();

        assert_eq!(report.total, windows.len());
        assert_eq!(report.confusion.total(), windows.len());
        assert_eq!(report.confusion.row_sum(CognitiveState::Attentive), 3);
        assert_eq!(report.confusion.row_sum(CognitiveState::Calm), 6);
        assert_eq!(report.confusion.row_sum(CognitiveState::Drowsy), 3);
        assert_eq!(report.correct, report.confusion.diagonal_sum());
        assert!((0.0..=1.0).contains(&report.accuracy));
    }

    #[test]
    fn test_confidence_stats_are_fractions() {
        let windows: Vec<Window> = (0..4)
            .map(|s| tone_window(s, CognitiveState::Attentive))
            .collect();

        let (model, scaler) = untrained_setup(&windows);
        let report = evaluate_dataset(&model, &scaler, &windows, 128).unwrap();

        let stats = &report.confidence[CognitiveState::Attentive.index()];
        assert_eq!(stats.count, 4);
        assert!((0.0..=1.0).contains(&stats.mean));
        assert!((0.0..=1.0).contains(&stats.frac_above_090));
        assert!((0.0..=1.0).contains(&stats.frac_below_050));

        // No calm or drowsy windows were provided.
        assert_eq!(report.confidence[CognitiveState::Calm.index()].count, 0);
        assert_eq!(report.confidence[CognitiveState::Drowsy.index()].count, 0);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let windows = vec![tone_window(0, CognitiveState::Calm)];
        let (model, scaler) = untrained_setup(&windows);
        assert!(matches!(
            evaluate_dataset(&model, &scaler, &[], 128),
            Err(EvaluationError::EmptyDataset)
        ));
    }
}
