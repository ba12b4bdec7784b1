//! Spectral feature primitives
//!
//! Power spectrum, canonical band powers, and spectral entropy computed per
//! channel window. Training, evaluation, and serving all route through these
//! functions, so any change here invalidates previously trained artifacts.

use rustfft::{num_complex::Complex, FftPlanner};

/// Shared denominator floor for ratio and normalization guards
pub const SPECTRAL_EPS: f32 = 1e-9;

/// Canonical band edges in Hz, ordered delta, theta, alpha, beta.
///
/// Adjacent bands share an edge bin on purpose; the classifier learns from
/// relative power, so the small double-count is harmless and stable.
pub const BAND_EDGES_HZ: [(f32, f32); 4] = [(0.5, 4.0), (4.0, 8.0), (8.0, 13.0), (13.0, 22.0)];

/// Computes the one-sided unnormalized power spectrum of a signal window.
///
/// Returns `psd[k] = re^2 + im^2` for the first `len / 2` DFT bins. No
/// window function and no scaling are applied: every downstream consumer is
/// either a ratio or a normalized sum, so absolute scale cancels out.
pub fn power_spectrum(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n < 2 {
        return Vec::new();
    }

    let mut buffer: Vec<Complex<f32>> =
        signal.iter().map(|&x| Complex::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    buffer.iter().take(n / 2).map(|c| c.norm_sqr()).collect()
}

/// Sums spectral power over the inclusive bin range covering `[lo_hz, hi_hz]`.
///
/// Bin `k` of a one-sided PSD holds frequency `k * sample_rate / window_len`
/// where `window_len = 2 * psd.len()`. Both edge bins are included and the
/// upper bin is clamped to the PSD length.
pub fn band_power(psd: &[f32], lo_hz: f32, hi_hz: f32, sample_rate: usize) -> f32 {
    if psd.is_empty() || sample_rate == 0 {
        return 0.0;
    }

    let window_len = (psd.len() * 2) as f32;
    let lo_bin = (lo_hz * window_len / sample_rate as f32).floor() as usize;
    let hi_bin =
        ((hi_hz * window_len / sample_rate as f32).floor() as usize).min(psd.len() - 1);

    if lo_bin > hi_bin {
        return 0.0;
    }

    psd[lo_bin..=hi_bin].iter().sum()
}

/// Ratio of two band powers with the shared denominator floor.
pub fn band_ratio(numerator: f32, denominator: f32) -> f32 {
    numerator / (denominator + SPECTRAL_EPS)
}

/// Computes the Shannon entropy (in bits) of the normalized power spectrum.
///
/// The PSD is normalized by its total power plus [`SPECTRAL_EPS`], so an
/// all-zero spectrum yields zero entropy instead of NaN. Higher values mean
/// power is spread across bins; a single dominant peak drives it toward zero.
pub fn spectral_entropy(psd: &[f32]) -> f32 {
    let total: f32 = psd.iter().sum::<f32>() + SPECTRAL_EPS;

    let mut entropy = 0.0;
    for &power in psd {
        let p = power / total;
        if p > 0.0 {
            entropy -= p * p.log2();
        }
    }
    entropy
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: usize = 128;

    fn sinusoid(freq_hz: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq_hz * i as f32 / SAMPLE_RATE as f32).sin()
            })
            .collect()
    }

    #[test]
    fn test_power_spectrum_length_is_half_window() {
        let psd = power_spectrum(&sinusoid(10.0, 128));
        assert_eq!(psd.len(), 64);
    }

    #[test]
    fn test_pure_alpha_tone_dominates_alpha_band() {
        let psd = power_spectrum(&sinusoid(10.0, 128));

        let (d_lo, d_hi) = BAND_EDGES_HZ[0];
        let (t_lo, t_hi) = BAND_EDGES_HZ[1];
        let (a_lo, a_hi) = BAND_EDGES_HZ[2];
        let (b_lo, b_hi) = BAND_EDGES_HZ[3];

        let alpha = band_power(&psd, a_lo, a_hi, SAMPLE_RATE);
        assert!(alpha > band_power(&psd, d_lo, d_hi, SAMPLE_RATE));
        assert!(alpha > band_power(&psd, t_lo, t_hi, SAMPLE_RATE));
        assert!(alpha > band_power(&psd, b_lo, b_hi, SAMPLE_RATE));
    }

    #[test]
    fn test_band_power_bins_are_inclusive() {
        // With a 128-sample window at 128 Hz each bin spans exactly 1 Hz, so
        // the 4-8 Hz band must cover bins 4 through 8.
        let mut psd = vec![0.0; 64];
        for k in 4..=8 {
            psd[k] = 1.0;
        }
        let theta = band_power(&psd, 4.0, 8.0, SAMPLE_RATE);
        assert!((theta - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_band_power_clamps_upper_bin() {
        let psd = vec![1.0; 8];
        // Nominal upper bin is far past the PSD length.
        let total = band_power(&psd, 0.0, 1000.0, SAMPLE_RATE);
        assert!((total - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_entropy_uniform_spectrum_is_log2_n() {
        let psd = vec![1.0; 64];
        let h = spectral_entropy(&psd);
        assert!((h - 6.0).abs() < 0.01);
    }

    #[test]
    fn test_entropy_single_peak_is_near_zero() {
        let mut psd = vec![0.0; 64];
        psd[10] = 100.0;
        assert!(spectral_entropy(&psd) < 0.01);
    }

    #[test]
    fn test_entropy_all_zero_spectrum_is_zero() {
        let psd = vec![0.0; 64];
        assert_eq!(spectral_entropy(&psd), 0.0);
    }

    #[test]
    fn test_flat_signal_power_collapses_to_dc() {
        let psd = power_spectrum(&vec![3.0; 128]);
        assert!(psd[0] > 0.0);
        let off_dc: f32 = psd[1..].iter().sum();
        assert!(off_dc < psd[0] * 1e-6);
    }

    #[test]
    fn test_band_ratio_survives_zero_denominator() {
        let r = band_ratio(1.0, 0.0);
        assert!(r.is_finite());
        assert!(r > 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(power_spectrum(&[]).is_empty());
        assert!(power_spectrum(&[1.0]).is_empty());
        assert_eq!(band_power(&[], 0.5, 4.0, SAMPLE_RATE), 0.0);
    }
}
