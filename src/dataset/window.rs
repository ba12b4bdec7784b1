//! Windowing and soft labels
//!
//! Slices a trial into fixed one-second windows and derives a per-window soft
//! label: raw class proportions blended with a uniform prior, Gaussian
//! jitter, a positive floor, renormalization, and an occasional injected
//! mislabel. A pre-pass relabels random windows of the ground-truth sequence
//! so no class falls below a configured minimum per subject.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::markov::CognitiveState;
use super::synth::Trial;

/// A probability distribution over the three cognitive states.
///
/// Serialized as a mapping from class label to probability (the dataset wire
/// form). Distributions built by the soft-label pipeline sum to 1 with every
/// component strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateDistribution {
    pub attentive: f32,
    pub calm: f32,
    pub drowsy: f32,
}

impl StateDistribution {
    pub fn uniform() -> Self {
        Self {
            attentive: 1.0 / 3.0,
            calm: 1.0 / 3.0,
            drowsy: 1.0 / 3.0,
        }
    }

    pub fn from_array(values: [f32; 3]) -> Self {
        Self {
            attentive: values[0],
            calm: values[1],
            drowsy: values[2],
        }
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.attentive, self.calm, self.drowsy]
    }

    pub fn get(&self, state: CognitiveState) -> f32 {
        self.to_array()[state.index()]
    }

    pub fn sum(&self) -> f32 {
        self.attentive + self.calm + self.drowsy
    }

    /// Most probable state; ties go to the first state in canonical order
    pub fn argmax(&self) -> CognitiveState {
        let values = self.to_array();
        let mut best = 0;
        for i in 1..values.len() {
            if values[i] > values[best] {
                best = i;
            }
        }
        CognitiveState::from_index(best).unwrap_or(CognitiveState::Attentive)
    }

    /// Confidence of the most probable state
    pub fn max_value(&self) -> f32 {
        self.to_array().iter().fold(f32::MIN, |a, &b| a.max(b))
    }
}

/// One training/evaluation example
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Channel-major samples, one row per channel
    #[serde(rename = "input")]
    pub channels: Vec<Vec<f32>>,
    /// Argmax of the soft distribution
    pub label: CognitiveState,
    pub soft: StateDistribution,
    /// Owning subject; cross-validation folds split on this id
    pub subject: usize,
}

/// Windowing and soft-label construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowerConfig {
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

impl Default for WindowerConfig {
    fn default() -> Self {
        Self {
            window_samples: 128,
            min_windows_per_class: 6,
            smoothing: 0.85,
            jitter_sigma: 0.10,
            floor: 5e-4,
            mislabel_prob: 0.12,
            mislabel_shift: 0.25,
        }
    }
}

/// Upper bound on balance relabeling attempts per trial
const MAX_RELABEL_ATTEMPTS: usize = 300;

/// Slice a trial into labeled windows.
///
/// Only full windows are emitted; a ragged tail shorter than
/// `window_samples` is dropped.
pub fn window_trial(trial: &Trial, config: &WindowerConfig, rng: &mut impl Rng) -> Vec<Window> {
    let w = config.window_samples;
    let n = trial.labels.len();

    let mut labels = trial.labels.clone();
    balance_classes(&mut labels, config, rng);

    let mut windows = Vec::with_capacity(n / w.max(1));
    let mut start = 0;
    while w > 0 && start + w <= n {
        let soft = build_soft_label(&labels[start..start + w], config, rng);
        let channels: Vec<Vec<f32>> = trial
            .channels
            .iter()
            .map(|ch| ch[start..start + w].to_vec())
            .collect();
        windows.push(Window {
            channels,
            label: soft.argmax(),
            soft,
            subject: trial.subject_id,
        });
        start += w;
    }
    windows
}

/// Count hard labels of a window set in canonical class order
pub fn class_counts(windows: &[Window]) -> [usize; 3] {
    let mut counts = [0usize; 3];
    for window in windows {
        counts[window.label.index()] += 1;
    }
    counts
}

/// Relabel random window-aligned spans until every class reaches the
/// configured minimum of majority-labeled windows (or attempts run out)
fn balance_classes(labels: &mut [CognitiveState], config: &WindowerConfig, rng: &mut impl Rng) {
    let w = config.window_samples;
    if w == 0 || labels.len() < w || config.min_windows_per_class == 0 {
        return;
    }
    let num_windows = labels.len() / w;

    for _ in 0..MAX_RELABEL_ATTEMPTS {
        let counts = window_majorities(labels, w);
        let under = CognitiveState::all()
            .into_iter()
            .find(|s| counts[s.index()] < config.min_windows_per_class);
        let Some(state) = under else {
            return;
        };
        let pos = rng.gen_range(0..num_windows) * w;
        labels[pos..pos + w].fill(state);
    }
}

/// Majority class per full window, counted in canonical order
fn window_majorities(labels: &[CognitiveState], window_samples: usize) -> [usize; 3] {
    let mut totals = [0usize; 3];
    for chunk in labels.chunks_exact(window_samples) {
        let mut counts = [0usize; 3];
        for label in chunk {
            counts[label.index()] += 1;
        }
        let mut best = 0;
        for i in 1..counts.len() {
            if counts[i] > counts[best] {
                best = i;
            }
        }
        totals[best] += 1;
    }
    totals
}

/// Raw proportions -> uniform blend + jitter -> floor -> renormalize ->
/// occasional mislabel injection
fn build_soft_label(
    chunk: &[CognitiveState],
    config: &WindowerConfig,
    rng: &mut impl Rng,
) -> StateDistribution {
    let total = chunk.len().max(1) as f32;
    let mut counts = [0.0f32; 3];
    for label in chunk {
        counts[label.index()] += 1.0;
    }

    let uniform_share = (1.0 - config.smoothing) / 3.0;
    let mut soft = [0.0f32; 3];
    let mut sum = 0.0;
    for i in 0..soft.len() {
        let jitter: f32 = rng.sample::<f32, _>(StandardNormal) * config.jitter_sigma;
        soft[i] = (config.smoothing * counts[i] / total + uniform_share + jitter)
            .max(config.floor);
        sum += soft[i];
    }
    if !sum.is_finite() || sum <= 0.0 {
        return StateDistribution::uniform();
    }
    for value in soft.iter_mut() {
        *value /= sum;
    }

    if rng.gen::<f32>() < config.mislabel_prob {
        let mut argmax = 0;
        for i in 1..soft.len() {
            if soft[i] > soft[argmax] {
                argmax = i;
            }
        }
        let others: Vec<usize> = (0..soft.len()).filter(|i| *i != argmax).collect();
        let flip = others[rng.gen_range(0..others.len())];
        soft[flip] += config.mislabel_shift;
        let shifted: f32 = soft.iter().sum();
        for value in soft.iter_mut() {
            *value /= shifted;
        }
    }

    StateDistribution::from_array(soft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::subject::{SubjectGroup, SubjectProfile};
    use crate::dataset::synth::{synthesize_trial, SynthesisConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_trial(seed: u64) -> Trial {
        let config = SynthesisConfig {
            trial_secs: 20,
            ..SynthesisConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let profile = SubjectProfile::generate(7, SubjectGroup::Reference, &mut rng);
        synthesize_trial(&profile, &config, &mut rng)
    }

    #[test]
    fn test_soft_labels_sum_to_one_and_stay_positive() {
        let trial = small_trial(31);
        let mut rng = StdRng::seed_from_u64(32);
        let windows = window_trial(&trial, &WindowerConfig::default(), &mut rng);

        assert_eq!(windows.len(), 20);
        for window in &windows {
            assert!((window.soft.sum() - 1.0).abs() < 1e-5);
            for component in window.soft.to_array() {
                assert!(component > 0.0);
            }
        }
    }

    #[test]
    fn test_hard_label_is_argmax_of_soft() {
        let trial = small_trial(33);
        let mut rng = StdRng::seed_from_u64(34);
        let windows = window_trial(&trial, &WindowerConfig::default(), &mut rng);

        for window in &windows {
            assert_eq!(window.label, window.soft.argmax());
        }
    }

    #[test]
    fn test_window_dimensions() {
        let trial = small_trial(35);
        let mut rng = StdRng::seed_from_u64(36);
        let windows = window_trial(&trial, &WindowerConfig::default(), &mut rng);

        for window in &windows {
            assert_eq!(window.channels.len(), 4);
            for channel in &window.channels {
                assert_eq!(channel.len(), 128);
            }
            assert_eq!(window.subject, 7);
        }
    }

    #[test]
    fn test_balance_pass_reaches_minimum_per_class() {
        // A sequence stuck in one state must still yield the per-class floor.
        let mut labels = vec![CognitiveState::Attentive; 128 * 20];
        let config = WindowerConfig {
            min_windows_per_class: 3,
            ..WindowerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(40);
        balance_classes(&mut labels, &config, &mut rng);

        let counts = window_majorities(&labels, config.window_samples);
        for count in counts {
            assert!(count >= 3, "majority counts {:?}", counts);
        }
    }

    #[test]
    fn test_argmax_ties_break_in_canonical_order() {
        let tie = StateDistribution::from_array([0.4, 0.4, 0.2]);
        assert_eq!(tie.argmax(), CognitiveState::Attentive);
        let tie = StateDistribution::from_array([0.2, 0.4, 0.4]);
        assert_eq!(tie.argmax(), CognitiveState::Calm);
    }

    #[test]
    fn test_degenerate_chunk_falls_back_to_uniform_shape() {
        // Zero-length span: raw proportions vanish and the blend alone
        // survives, so the result stays a valid distribution.
        let config = WindowerConfig::default();
        let mut rng = StdRng::seed_from_u64(41);
        let soft = build_soft_label(&[], &config, &mut rng);

        assert!((soft.sum() - 1.0).abs() < 1e-5);
        for component in soft.to_array() {
            assert!(component > 0.0);
        }
    }

    #[test]
    fn test_mislabel_injection_shifts_mass_away_from_argmax() {
        let chunk = vec![CognitiveState::Attentive; 128];
        let clean_config = WindowerConfig {
            jitter_sigma: 0.0,
            mislabel_prob: 0.0,
            ..WindowerConfig::default()
        };
        let forced_config = WindowerConfig {
            jitter_sigma: 0.0,
            mislabel_prob: 1.0,
            ..WindowerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(50);

        // Pure chunk: blend gives 0.85 + 0.15/3 = 0.9 on the argmax class.
        let clean = build_soft_label(&chunk, &clean_config, &mut rng);
        assert!((clean.attentive - 0.9).abs() < 1e-4);

        // Forced mislabel pushes 0.25 mass to another class; whichever class
        // receives it, the argmax component lands at 0.9 / 1.25.
        let shifted = build_soft_label(&chunk, &forced_config, &mut rng);
        assert!((shifted.attentive - 0.9 / 1.25).abs() < 1e-4);
        assert!((shifted.sum() - 1.0).abs() < 1e-5);
    }
}
