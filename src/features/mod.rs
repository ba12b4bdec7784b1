//! Feature extraction
//!
//! Turns a multi-channel sample window into the fixed-order feature vector
//! consumed by the classifier. Per channel: four band powers, three band
//! ratios, spectral entropy, three Hjorth parameters, mean, and standard
//! deviation. After the per-channel blocks come the pairwise Pearson
//! correlations in upper-triangle order. Vector layout is part of the model
//! artifact contract.

pub mod spectral;
pub mod statistics;

pub use spectral::{
    band_power, band_ratio, power_spectrum, spectral_entropy, BAND_EDGES_HZ, SPECTRAL_EPS,
};
pub use statistics::{hjorth, mean, pearson_correlation, stdev, variance, HjorthParameters};

use rayon::prelude::*;
use std::error::Error;
use std::fmt;

use crate::dataset::Window;

/// Features emitted per channel before the correlation block
pub const PER_CHANNEL_FEATURES: usize = 13;

/// Errors raised while extracting features from a window.
#[derive(Debug)]
pub enum FeatureError {
    /// Window has no channels or a zero-length channel
    EmptyWindow,
    /// Channels disagree on sample count
    RaggedChannels { expected: usize, found: usize },
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::EmptyWindow => {
                write!(f, "window has no samples to extract features from")
            }
            FeatureError::RaggedChannels { expected, found } => write!(
                f,
                "channel length mismatch: expected {} samples, found {}",
                expected, found
            ),
        }
    }
}

impl Error for FeatureError {}

/// Number of features produced for a window with `num_channels` channels.
pub fn feature_count(num_channels: usize) -> usize {
    num_channels * PER_CHANNEL_FEATURES + num_channels * num_channels.saturating_sub(1) / 2
}

/// Extracts the full feature vector from one window of channel data.
///
/// `sample_rate` maps band edges onto FFT bins and must match the rate the
/// window was recorded at. Fails on empty or ragged input; everything else
/// produces a finite vector of [`feature_count`] entries.
pub fn extract_features(
    channels: &[Vec<f32>],
    sample_rate: usize,
) -> Result<Vec<f32>, FeatureError> {
    if channels.is_empty() {
        return Err(FeatureError::EmptyWindow);
    }
    let window_len = channels[0].len();
    if window_len == 0 {
        return Err(FeatureError::EmptyWindow);
    }
    for channel in channels {
        if channel.len() != window_len {
            return Err(FeatureError::RaggedChannels {
                expected: window_len,
                found: channel.len(),
            });
        }
    }

    let mut features = Vec::with_capacity(feature_count(channels.len()));

    for signal in channels {
        let psd = power_spectrum(signal);

        let (d_lo, d_hi) = BAND_EDGES_HZ[0];
        let (t_lo, t_hi) = BAND_EDGES_HZ[1];
        let (a_lo, a_hi) = BAND_EDGES_HZ[2];
        let (b_lo, b_hi) = BAND_EDGES_HZ[3];

        let delta = band_power(&psd, d_lo, d_hi, sample_rate);
        let theta = band_power(&psd, t_lo, t_hi, sample_rate);
        let alpha = band_power(&psd, a_lo, a_hi, sample_rate);
        let beta = band_power(&psd, b_lo, b_hi, sample_rate);

        features.push(delta);
        features.push(theta);
        features.push(alpha);
        features.push(beta);

        features.push(band_ratio(theta, alpha));
        features.push(band_ratio(beta, alpha));
        features.push(band_ratio(beta, theta));

        features.push(spectral_entropy(&psd));

        let h = hjorth(signal);
        features.push(h.activity);
        features.push(h.mobility);
        features.push(h.complexity);

        features.push(mean(signal));
        features.push(stdev(signal));
    }

    for i in 0..channels.len() {
        for j in (i + 1)..channels.len() {
            features.push(pearson_correlation(&channels[i], &channels[j]));
        }
    }

    Ok(features)
}

/// Extracts features for a batch of windows in parallel.
///
/// Rows come back in window order. The first malformed window aborts the
/// whole batch, matching the fail-fast contract of [`extract_features`].
pub fn extract_feature_matrix(
    windows: &[Window],
    sample_rate: usize,
) -> Result<Vec<Vec<f32>>, FeatureError> {
    windows
        .par_iter()
        .map(|window| extract_features(&window.channels, sample_rate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: usize = 128;

    fn tone_channel(freq_hz: f32, len: usize, amp: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amp * (2.0 * std::f32::consts::PI * freq_hz * i as f32 / SAMPLE_RATE as f32)
                    .sin()
            })
            .collect()
    }

    fn four_channel_window() -> Vec<Vec<f32>> {
        vec![
            tone_channel(10.0, 128, 1.0),
            tone_channel(6.0, 128, 0.8),
            tone_channel(18.0, 128, 0.5),
            tone_channel(2.0, 128, 1.2),
        ]
    }

    #[test]
    fn test_feature_count_matches_layout() {
        assert_eq!(feature_count(4), 58);
        assert_eq!(feature_count(2), 27);
        assert_eq!(feature_count(1), 13);
    }

    #[test]
    fn test_extracted_vector_has_expected_length() {
        let features = extract_features(&four_channel_window(), SAMPLE_RATE).unwrap();
        assert_eq!(features.len(), 58);
        assert!(features.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_alpha_tone_peaks_in_alpha_slot() {
        let window = vec![tone_channel(10.0, 128, 1.0)];
        let features = extract_features(&window, SAMPLE_RATE).unwrap();
        // Band power order is delta, theta, alpha, beta.
        assert!(features[2] > features[0]);
        assert!(features[2] > features[1]);
        assert!(features[2] > features[3]);
    }

    #[test]
    fn test_correlation_block_follows_channel_blocks() {
        let base = tone_channel(10.0, 128, 1.0);
        let window = vec![base.clone(), base];
        let features = extract_features(&window, SAMPLE_RATE).unwrap();
        assert_eq!(features.len(), 27);
        // Identical channels correlate to 1 in the final slot.
        assert!((features[26] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_flat_window_is_finite() {
        let window = vec![vec![0.5; 128]; 4];
        let features = extract_features(&window, SAMPLE_RATE).unwrap();
        assert!(features.iter().all(|v| v.is_finite()));
        // stdev floor keeps the per-channel tail at 1.
        assert_eq!(features[12], 1.0);
    }

    #[test]
    fn test_empty_and_ragged_windows_are_rejected() {
        assert!(matches!(
            extract_features(&[], SAMPLE_RATE),
            Err(FeatureError::EmptyWindow)
        ));
        assert!(matches!(
            extract_features(&[vec![]], SAMPLE_RATE),
            Err(FeatureError::EmptyWindow)
        ));

        let ragged = vec![vec![0.0; 128], vec![0.0; 64]];
        assert!(matches!(
            extract_features(&ragged, SAMPLE_RATE),
            Err(FeatureError::RaggedChannels {
                expected: 128,
                found: 64
            })
        ));
    }

    fn window_of(channels: Vec<Vec<f32>>) -> Window {
        use crate::dataset::{CognitiveState, StateDistribution};
        Window {
            channels,
            label: CognitiveState::Calm,
            soft: StateDistribution::uniform(),
            subject: 0,
        }
    }

    #[test]
    fn test_batch_matrix_preserves_window_order() {
        let windows: Vec<Window> = (0..8)
            .map(|i| window_of(vec![tone_channel(4.0 + i as f32 * 2.0, 128, 1.0); 2]))
            .collect();

        let matrix = extract_feature_matrix(&windows, SAMPLE_RATE).unwrap();
        assert_eq!(matrix.len(), 8);

        for (row, window) in matrix.iter().zip(windows.iter()) {
            let sequential = extract_features(&window.channels, SAMPLE_RATE).unwrap();
            assert_eq!(row, &sequential);
        }
    }

    #[test]
    fn test_batch_matrix_fails_on_any_bad_window() {
        let windows = vec![
            window_of(vec![tone_channel(10.0, 128, 1.0)]),
            window_of(vec![]),
            window_of(vec![tone_channel(6.0, 128, 1.0)]),
        ];
        assert!(extract_feature_matrix(&windows, SAMPLE_RATE).is_err());
    }
}
