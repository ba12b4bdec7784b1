//! Subject profiles
//!
//! Per-subject physiological parameters drawn once before synthesis and
//! immutable afterwards. Two populations are modeled with different sampling
//! ranges; the deficit group trends toward slower, noisier signals with
//! weaker alpha synchrony.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Population a subject belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectGroup {
    Reference,
    AttentionDeficit,
}

impl SubjectGroup {
    /// Assign a group from the subject index and the configured split point
    pub fn for_index(index: usize, deficit_start: usize) -> Self {
        if index >= deficit_start {
            SubjectGroup::AttentionDeficit
        } else {
            SubjectGroup::Reference
        }
    }

    /// Uniform sampling ranges for this population
    pub fn ranges(&self) -> ProfileRanges {
        match self {
            SubjectGroup::Reference => ProfileRanges {
                alpha_peak: (8.8, 11.5),
                spectral_slope: (0.7, 1.2),
                base_noise: (0.6, 1.4),
                emg_level: (0.6, 1.3),
                blink_rate: (0.9, 1.5),
                alpha_sync: (0.95, 1.25),
                theta_bias: (0.9, 1.2),
                wander: (0.25, 0.8),
                fatigue: (0.2, 0.7),
            },
            SubjectGroup::AttentionDeficit => ProfileRanges {
                alpha_peak: (8.0, 10.0),
                spectral_slope: (0.9, 1.5),
                base_noise: (1.1, 2.0),
                emg_level: (1.1, 1.9),
                blink_rate: (0.7, 1.3),
                alpha_sync: (0.55, 0.9),
                theta_bias: (1.2, 1.7),
                wander: (0.25, 0.8),
                fatigue: (0.7, 1.2),
            },
        }
    }
}

/// Per-parameter (low, high) sampling bounds for one population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRanges {
    pub alpha_peak: (f32, f32),
    pub spectral_slope: (f32, f32),
    pub base_noise: (f32, f32),
    pub emg_level: (f32, f32),
    pub blink_rate: (f32, f32),
    pub alpha_sync: (f32, f32),
    pub theta_bias: (f32, f32),
    pub wander: (f32, f32),
    pub fatigue: (f32, f32),
}

/// Immutable per-subject parameters driving synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub id: usize,
    pub group: SubjectGroup,
    /// Dominant alpha rhythm peak frequency in Hz
    pub alpha_peak: f32,
    /// Steepness factor of the broadband background
    pub spectral_slope: f32,
    /// Baseline noise scaling
    pub base_noise: f32,
    /// Muscle artifact level
    pub emg_level: f32,
    /// Eye blink rate multiplier
    pub blink_rate: f32,
    /// Alpha rhythm synchrony factor
    pub alpha_sync: f32,
    /// Slow-wave amplitude bias
    pub theta_bias: f32,
    /// Slow drift amplitude
    pub wander: f32,
    /// Fatigue drift coefficient
    pub fatigue: f32,
}

impl SubjectProfile {
    /// Draw a profile for one subject from its group's ranges
    pub fn generate(id: usize, group: SubjectGroup, rng: &mut impl Rng) -> Self {
        let r = group.ranges();
        Self {
            id,
            group,
            alpha_peak: rng.gen_range(r.alpha_peak.0..r.alpha_peak.1),
            spectral_slope: rng.gen_range(r.spectral_slope.0..r.spectral_slope.1),
            base_noise: rng.gen_range(r.base_noise.0..r.base_noise.1),
            emg_level: rng.gen_range(r.emg_level.0..r.emg_level.1),
            blink_rate: rng.gen_range(r.blink_rate.0..r.blink_rate.1),
            alpha_sync: rng.gen_range(r.alpha_sync.0..r.alpha_sync.1),
            theta_bias: rng.gen_range(r.theta_bias.0..r.theta_bias.1),
            wander: rng.gen_range(r.wander.0..r.wander.1),
            fatigue: rng.gen_range(r.fatigue.0..r.fatigue.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_group_split_point() {
        assert_eq!(SubjectGroup::for_index(0, 10), SubjectGroup::Reference);
        assert_eq!(SubjectGroup::for_index(9, 10), SubjectGroup::Reference);
        assert_eq!(
            SubjectGroup::for_index(10, 10),
            SubjectGroup::AttentionDeficit
        );
    }

    #[test]
    fn test_profiles_stay_within_group_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        for group in [SubjectGroup::Reference, SubjectGroup::AttentionDeficit] {
            let ranges = group.ranges();
            for id in 0..50 {
                let p = SubjectProfile::generate(id, group, &mut rng);
                let within = |v: f32, (lo, hi): (f32, f32)| v >= lo && v < hi;
                assert!(within(p.alpha_peak, ranges.alpha_peak));
                assert!(within(p.spectral_slope, ranges.spectral_slope));
                assert!(within(p.base_noise, ranges.base_noise));
                assert!(within(p.emg_level, ranges.emg_level));
                assert!(within(p.blink_rate, ranges.blink_rate));
                assert!(within(p.alpha_sync, ranges.alpha_sync));
                assert!(within(p.theta_bias, ranges.theta_bias));
                assert!(within(p.wander, ranges.wander));
                assert!(within(p.fatigue, ranges.fatigue));
            }
        }
    }

    #[test]
    fn test_generation_is_reproducible() {
        let mut a = StdRng::seed_from_u64(21);
        let mut b = StdRng::seed_from_u64(21);
        let pa = SubjectProfile::generate(4, SubjectGroup::Reference, &mut a);
        let pb = SubjectProfile::generate(4, SubjectGroup::Reference, &mut b);
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_deficit_group_trends() {
        // Range endpoints keep the deficit group strictly above reference on
        // theta bias and strictly below on alpha synchrony.
        let reference = SubjectGroup::Reference.ranges();
        let deficit = SubjectGroup::AttentionDeficit.ranges();
        assert!(deficit.theta_bias.0 >= reference.theta_bias.1);
        assert!(deficit.alpha_sync.1 <= reference.alpha_sync.0);
    }
}
