//! Cognitive state process
//!
//! A three-state discrete-time Markov chain drives the ground-truth label
//! sequence for each trial. The chain holds its macro state for randomized
//! dwell intervals; the emitted per-sample label is a micro state that can
//! briefly diverge from the macro state through transient overrides and
//! fatigue-driven drowsy samples.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The three cognitive states the classifier separates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
#[serde(rename_all = "lowercase")]
pub enum CognitiveState {
    Attentive = 0,
    Calm = 1,
    Drowsy = 2,
}

impl CognitiveState {
    /// All states in canonical order (used for vector outputs and tie-breaks)
    pub fn all() -> [CognitiveState; 3] {
        [
            CognitiveState::Attentive,
            CognitiveState::Calm,
            CognitiveState::Drowsy,
        ]
    }

    /// Stable index into the canonical order
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Get state from canonical index (0-2)
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(CognitiveState::Attentive),
            1 => Some(CognitiveState::Calm),
            2 => Some(CognitiveState::Drowsy),
            _ => None,
        }
    }

    /// Wire label used in dataset files and label-keyed model outputs
    pub fn label(&self) -> &'static str {
        match self {
            CognitiveState::Attentive => "attentive",
            CognitiveState::Calm => "calm",
            CognitiveState::Drowsy => "drowsy",
        }
    }

    /// Parse a wire label back into a state
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "attentive" => Some(CognitiveState::Attentive),
            "calm" => Some(CognitiveState::Calm),
            "drowsy" => Some(CognitiveState::Drowsy),
            _ => None,
        }
    }

    /// Total number of cognitive states
    pub fn num_classes() -> usize {
        3
    }
}

/// Row-stochastic transition probabilities in canonical state order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    pub rows: [[f32; 3]; 3],
}

impl TransitionMatrix {
    /// Sample the next macro state from the current state's row
    pub fn sample_next(&self, current: CognitiveState, rng: &mut impl Rng) -> CognitiveState {
        let row = &self.rows[current.index()];
        let draw = rng.gen::<f32>();
        let mut cumulative = 0.0;
        for state in CognitiveState::all() {
            cumulative += row[state.index()];
            if draw < cumulative {
                return state;
            }
        }
        // Rounding can leave `draw` past the accumulated mass
        CognitiveState::Drowsy
    }

    /// Check that every row sums to 1 within tolerance with no negative mass
    pub fn is_row_stochastic(&self) -> bool {
        self.rows.iter().all(|row| {
            let sum: f32 = row.iter().sum();
            (sum - 1.0).abs() < 1e-5 && row.iter().all(|p| *p >= 0.0)
        })
    }
}

impl Default for TransitionMatrix {
    fn default() -> Self {
        Self {
            rows: [
                [0.86, 0.11, 0.03],
                [0.09, 0.80, 0.11],
                [0.03, 0.22, 0.75],
            ],
        }
    }
}

/// Configuration for the label-generating state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateProcessConfig {
    pub transition: TransitionMatrix,
    /// Dwell range in seconds before the first transition
    pub initial_dwell_secs: (f32, f32),
    /// Dwell range in seconds after each transition
    pub dwell_secs: (f32, f32),
    /// Per-sample probability of a transient override to another state
    pub micro_override_prob: f32,
    /// Base per-sample probability of fatigue forcing the drowsy state
    pub fatigue_base_prob: f32,
}

impl Default for StateProcessConfig {
    fn default() -> Self {
        Self {
            transition: TransitionMatrix::default(),
            initial_dwell_secs: (5.0, 12.0),
            dwell_secs: (4.0, 12.0),
            micro_override_prob: 0.03,
            fatigue_base_prob: 0.01,
        }
    }
}

/// Discrete-time state machine producing per-sample ground-truth labels.
///
/// The macro state follows the Markov chain and is the only input to its own
/// transitions. The emitted label is the micro state: usually equal to the
/// macro state, occasionally replaced by a transient override or a
/// fatigue-forced drowsy sample.
pub struct StateProcess {
    config: StateProcessConfig,
    sample_rate: usize,
    macro_state: CognitiveState,
    dwell_remaining: usize,
}

impl StateProcess {
    /// Start a new process with a random initial state and initial dwell
    pub fn new(config: StateProcessConfig, sample_rate: usize, rng: &mut impl Rng) -> Self {
        let macro_state = CognitiveState::all()[rng.gen_range(0..CognitiveState::num_classes())];
        let dwell_remaining = sample_dwell(config.initial_dwell_secs, sample_rate, rng);
        Self {
            config,
            sample_rate,
            macro_state,
            dwell_remaining,
        }
    }

    /// Current macro dwell state (not necessarily the emitted label)
    pub fn macro_state(&self) -> CognitiveState {
        self.macro_state
    }

    /// Advance one sample and emit the ground-truth label.
    ///
    /// `elapsed` is the fraction of the trial completed so far; combined with
    /// the subject's fatigue coefficient it scales the drowsy-forcing
    /// probability upward as the trial progresses.
    pub fn advance(&mut self, elapsed: f32, fatigue: f32, rng: &mut impl Rng) -> CognitiveState {
        if self.dwell_remaining == 0 {
            self.macro_state = self.config.transition.sample_next(self.macro_state, rng);
            self.dwell_remaining = sample_dwell(self.config.dwell_secs, self.sample_rate, rng);
        }
        self.dwell_remaining -= 1;

        let mut micro = self.macro_state;
        if rng.gen::<f32>() < self.config.micro_override_prob {
            micro = random_other(micro, rng);
        }
        let drowsy_prob = self.config.fatigue_base_prob * (1.0 + fatigue * elapsed);
        if micro != CognitiveState::Drowsy && rng.gen::<f32>() < drowsy_prob {
            micro = CognitiveState::Drowsy;
        }
        micro
    }

    /// Generate a full label sequence of `len` samples
    pub fn generate_sequence(
        &mut self,
        len: usize,
        fatigue: f32,
        rng: &mut impl Rng,
    ) -> Vec<CognitiveState> {
        (0..len)
            .map(|t| self.advance(t as f32 / len as f32, fatigue, rng))
            .collect()
    }
}

fn sample_dwell(range_secs: (f32, f32), sample_rate: usize, rng: &mut impl Rng) -> usize {
    let lo = (range_secs.0 * sample_rate as f32) as usize;
    let hi = (range_secs.1 * sample_rate as f32) as usize;
    rng.gen_range(lo..=hi.max(lo))
}

fn random_other(state: CognitiveState, rng: &mut impl Rng) -> CognitiveState {
    let others: Vec<CognitiveState> = CognitiveState::all()
        .into_iter()
        .filter(|s| *s != state)
        .collect();
    others[rng.gen_range(0..others.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_canonical_order_is_stable() {
        assert_eq!(CognitiveState::Attentive.index(), 0);
        assert_eq!(CognitiveState::Calm.index(), 1);
        assert_eq!(CognitiveState::from_index(2), Some(CognitiveState::Drowsy));
        assert_eq!(CognitiveState::from_index(3), None);
    }

    #[test]
    fn test_labels_round_trip() {
        for state in CognitiveState::all() {
            assert_eq!(CognitiveState::from_label(state.label()), Some(state));
        }
        assert_eq!(CognitiveState::from_label("bored"), None);
    }

    #[test]
    fn test_default_transitions_are_self_dominant() {
        let matrix = TransitionMatrix::default();
        assert!(matrix.is_row_stochastic());
        for (i, row) in matrix.rows.iter().enumerate() {
            assert!(row[i] >= 0.75, "row {} self-transition too weak", i);
        }
    }

    #[test]
    fn test_sequence_emits_only_known_states() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut process = StateProcess::new(StateProcessConfig::default(), 128, &mut rng);
        let sequence = process.generate_sequence(128 * 30, 0.5, &mut rng);

        assert_eq!(sequence.len(), 128 * 30);
        for label in &sequence {
            assert!(CognitiveState::all().contains(label));
        }
    }

    #[test]
    fn test_sequence_is_reproducible_for_fixed_seed() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut process = StateProcess::new(StateProcessConfig::default(), 128, &mut rng);
            process.generate_sequence(128 * 10, 0.8, &mut rng)
        };

        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn test_fatigue_drift_increases_late_drowsy_share() {
        // Isolate the fatigue term: the chain never re-enters drowsy on its
        // own and micro overrides are off, so drowsy samples past the initial
        // dwell come from fatigue alone.
        let config = StateProcessConfig {
            transition: TransitionMatrix {
                rows: [[0.9, 0.1, 0.0], [0.1, 0.9, 0.0], [0.5, 0.5, 0.0]],
            },
            micro_override_prob: 0.0,
            ..StateProcessConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut process = StateProcess::new(config, 128, &mut rng);
        let sequence = process.generate_sequence(128 * 240, 2.0, &mut rng);

        // The initial dwell (possibly drowsy) is over after 12 s at most.
        let skip = 128 * 12;
        let quarter = sequence.len() / 4;
        let drowsy_count = |span: &[CognitiveState]| {
            span.iter()
                .filter(|s| **s == CognitiveState::Drowsy)
                .count()
        };
        let early = drowsy_count(&sequence[skip..skip + quarter]);
        let late = drowsy_count(&sequence[sequence.len() - quarter..]);

        assert!(
            late > early,
            "late drowsy count {} should exceed early count {}",
            late,
            early
        );
    }
}
