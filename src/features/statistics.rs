//! Time-domain statistics
//!
//! Sample moments, Hjorth parameters, and pairwise Pearson correlation. The
//! degenerate-signal floors here (constant or empty windows) keep every
//! downstream division defined without special-casing callers.

/// Denominator floor used by the correlation feature
const CORR_EPS: f32 = 1e-9;

/// Hjorth descriptors of a single channel window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HjorthParameters {
    /// Signal variance
    pub activity: f32,
    /// Ratio of first-derivative to signal spread
    pub mobility: f32,
    /// Change of mobility between derivative orders
    pub complexity: f32,
}

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Unbiased sample variance with the divisor floored at 1.
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f32 = values.iter().map(|v| (v - m) * (v - m)).sum();
    sum_sq / (values.len() - 1).max(1) as f32
}

/// Sample standard deviation; a constant window reports 1 so scaling
/// divisions stay defined.
pub fn stdev(values: &[f32]) -> f32 {
    let sd = variance(values).sqrt();
    if sd == 0.0 {
        1.0
    } else {
        sd
    }
}

/// Computes the Hjorth activity, mobility, and complexity of a window.
///
/// Mobility and complexity divide by variances of successive differences;
/// any zero variance in a denominator is replaced by 1, so a flat window
/// yields `(0, 0, 0)` rather than NaN.
pub fn hjorth(signal: &[f32]) -> HjorthParameters {
    let first_diff: Vec<f32> = signal.windows(2).map(|w| w[1] - w[0]).collect();
    let second_diff: Vec<f32> = first_diff.windows(2).map(|w| w[1] - w[0]).collect();

    let var0 = variance(signal);
    let var1 = variance(&first_diff);
    let var2 = variance(&second_diff);

    let mobility = (var1 / non_zero(var0)).sqrt();
    let complexity = (var2 / non_zero(var1)).sqrt() / non_zero(mobility);

    HjorthParameters {
        activity: var0,
        mobility,
        complexity,
    }
}

/// Pearson correlation between two equal-length windows.
///
/// The denominator carries a small additive floor, so two flat windows
/// correlate to 0 instead of NaN.
pub fn pearson_correlation(x: &[f32], y: &[f32]) -> f32 {
    let mx = mean(x);
    let my = mean(y);

    let mut num = 0.0;
    let mut dx2 = 0.0;
    let mut dy2 = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a - mx;
        let dy = b - my;
        num += dx * dy;
        dx2 += dx * dx;
        dy2 += dy * dy;
    }

    num / ((dx2 * dy2).sqrt() + CORR_EPS)
}

fn non_zero(v: f32) -> f32 {
    if v == 0.0 {
        1.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance_basics() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&values) - 2.5).abs() < 1e-6);
        // Sample variance of 1..4 with divisor n-1.
        assert!((variance(&values) - 5.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_stdev_of_constant_window_is_one() {
        let flat = [0.7; 64];
        assert_eq!(stdev(&flat), 1.0);
    }

    #[test]
    fn test_hjorth_of_flat_window_is_finite_zeroes() {
        let flat = [2.0; 128];
        let h = hjorth(&flat);
        assert_eq!(h.activity, 0.0);
        assert_eq!(h.mobility, 0.0);
        assert_eq!(h.complexity, 0.0);
    }

    #[test]
    fn test_hjorth_mobility_grows_with_frequency() {
        let slow: Vec<f32> = (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * 2.0 * i as f32 / 128.0).sin())
            .collect();
        let fast: Vec<f32> = (0..256)
            .map(|i| (2.0 * std::f32::consts::PI * 20.0 * i as f32 / 128.0).sin())
            .collect();

        let h_slow = hjorth(&slow);
        let h_fast = hjorth(&fast);
        assert!(h_fast.mobility > h_slow.mobility);
    }

    #[test]
    fn test_pearson_of_identical_signals_is_one() {
        let x: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).sin()).collect();
        let r = pearson_correlation(&x, &x);
        assert!((r - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_pearson_of_negated_signal_is_minus_one() {
        let x: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).sin()).collect();
        let y: Vec<f32> = x.iter().map(|v| -v).collect();
        let r = pearson_correlation(&x, &y);
        assert!((r + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_pearson_of_flat_signals_is_zero() {
        let x = [1.0; 32];
        let y = [1.0; 32];
        let r = pearson_correlation(&x, &y);
        assert!(r.is_finite());
        assert_eq!(r, 0.0);
    }

    #[test]
    fn test_empty_inputs_stay_finite() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        let h = hjorth(&[]);
        assert!(h.mobility.is_finite());
        assert!(h.complexity.is_finite());
    }
}
