//! Trial synthesis
//!
//! Combines three oscillatory bands, broadband noise, line interference and
//! ocular/muscle artifacts into a multi-channel trial. The state process
//! drives per-sample band amplitudes; the subject profile shifts frequencies,
//! noise floors and artifact density.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use super::markov::{CognitiveState, StateProcess, StateProcessConfig};
use super::subject::{SubjectGroup, SubjectProfile};

/// The three synthesized oscillatory bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Theta,
    Alpha,
    Beta,
}

/// One value per band (amplitudes, sigmas, channel gains)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandValues {
    pub theta: f32,
    pub alpha: f32,
    pub beta: f32,
}

impl BandValues {
    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::Theta => self.theta,
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
        }
    }

    pub fn get_mut(&mut self, band: Band) -> &mut f32 {
        match band {
            Band::Theta => &mut self.theta,
            Band::Alpha => &mut self.alpha,
            Band::Beta => &mut self.beta,
        }
    }
}

/// State-conditional amplitude burst: while in `state`, multiply `band` by a
/// draw from `gain` with probability `prob` per sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstRule {
    pub state: CognitiveState,
    pub band: Band,
    pub prob: f32,
    pub gain: (f32, f32),
}

/// Structural and tabular parameters of the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub sample_rate: usize,
    pub trial_secs: usize,
    /// Channels with index below this get full ocular/spike artifact weight
    pub frontal_channels: usize,
    pub state_process: StateProcessConfig,
    /// Base band amplitudes per state, canonical state order
    pub base_amplitudes: [BandValues; 3],
    /// Relative sigma of the per-sample Gaussian amplitude draw
    pub amplitude_rel_sigma: BandValues,
    pub bursts: Vec<BurstRule>,
    /// Per-channel band gain; row count defines the channel count
    pub channel_gains: Vec<BandValues>,
    /// Center-frequency draw range for the slow band, Hz
    pub theta_cf_hz: (f32, f32),
    /// Alpha center frequency is the subject's peak plus this jitter, Hz
    pub alpha_cf_jitter_hz: f32,
    /// Center-frequency draw range for the fast band, Hz
    pub beta_cf_hz: (f32, f32),
    pub powerline_hz: f32,
}

impl SynthesisConfig {
    pub fn channel_count(&self) -> usize {
        self.channel_gains.len()
    }

    pub fn samples_per_trial(&self) -> usize {
        self.sample_rate * self.trial_secs
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 128,
            trial_secs: 60,
            frontal_channels: 2,
            state_process: StateProcessConfig::default(),
            base_amplitudes: [
                // attentive, calm, drowsy
                BandValues {
                    theta: 0.50,
                    alpha: 1.00,
                    beta: 0.95,
                },
                BandValues {
                    theta: 0.80,
                    alpha: 1.10,
                    beta: 0.60,
                },
                BandValues {
                    theta: 1.20,
                    alpha: 0.90,
                    beta: 0.55,
                },
            ],
            amplitude_rel_sigma: BandValues {
                theta: 0.35,
                alpha: 0.30,
                beta: 0.45,
            },
            bursts: vec![
                BurstRule {
                    state: CognitiveState::Calm,
                    band: Band::Alpha,
                    prob: 0.05,
                    gain: (1.7, 2.5),
                },
                BurstRule {
                    state: CognitiveState::Calm,
                    band: Band::Theta,
                    prob: 0.04,
                    gain: (1.2, 1.8),
                },
                BurstRule {
                    state: CognitiveState::Attentive,
                    band: Band::Beta,
                    prob: 0.04,
                    gain: (1.5, 2.2),
                },
                BurstRule {
                    state: CognitiveState::Drowsy,
                    band: Band::Alpha,
                    prob: 0.15,
                    gain: (1.1, 1.5),
                },
            ],
            channel_gains: vec![
                BandValues {
                    theta: 1.02,
                    alpha: 1.00,
                    beta: 0.98,
                },
                BandValues {
                    theta: 0.96,
                    alpha: 1.04,
                    beta: 1.02,
                },
                BandValues {
                    theta: 1.00,
                    alpha: 0.96,
                    beta: 1.06,
                },
                BandValues {
                    theta: 1.03,
                    alpha: 1.01,
                    beta: 0.97,
                },
            ],
            theta_cf_hz: (4.5, 7.5),
            alpha_cf_jitter_hz: 1.2,
            beta_cf_hz: (13.0, 21.0),
            powerline_hz: 50.0,
        }
    }
}

/// One subject's full-length multi-channel signal and its label sequence.
///
/// Owned by the synthesizer until windowing; not persisted as a whole.
pub struct Trial {
    pub subject_id: usize,
    /// Channel-major samples, `channel_count` rows of `samples_per_trial`
    pub channels: Vec<Vec<f32>>,
    pub labels: Vec<CognitiveState>,
}

/// Synthesize one subject's trial.
///
/// Stochastic, but fully determined by the caller's RNG. Artifact tracks are
/// generated over the whole trial first; the per-sample loop then advances
/// the state process, draws band amplitudes and sums all additive terms.
pub fn synthesize_trial(
    profile: &SubjectProfile,
    config: &SynthesisConfig,
    rng: &mut impl Rng,
) -> Trial {
    let n = config.samples_per_trial();
    let channel_count = config.channel_count();
    let sr = config.sample_rate as f32;

    let pink = pink_noise(n, 0.985, rng);
    let ar = ar1_noise(n, 0.94, 0.06, rng);
    let blink = blink_track(n, profile.blink_rate, rng);
    let eye = eye_roll_track(n, rng);
    let spike = spike_track(n, rng);
    let emg = emg_track(n, profile.emg_level, rng);
    let spontaneous = spontaneous_track(n, profile.wander, rng);

    // Per-channel oscillator phases and alpha modulation envelopes
    let mut phases: Vec<BandValues> = (0..channel_count)
        .map(|_| BandValues {
            theta: rng.gen::<f32>() * 2.0 * PI,
            alpha: rng.gen::<f32>() * 2.0 * PI,
            beta: rng.gen::<f32>() * 2.0 * PI,
        })
        .collect();
    let env_phase: Vec<f32> = (0..channel_count)
        .map(|_| rng.gen::<f32>() * 2.0 * PI)
        .collect();
    let env_freq: Vec<f32> = (0..channel_count)
        .map(|_| rng.gen_range(0.12..0.4))
        .collect();
    let env_gain = match profile.group {
        SubjectGroup::AttentionDeficit => 0.8,
        SubjectGroup::Reference => 1.0,
    };

    let mut process = StateProcess::new(config.state_process.clone(), config.sample_rate, rng);
    let mut labels = Vec::with_capacity(n);
    let mut channels = vec![vec![0.0f32; n]; channel_count];

    for t in 0..n {
        let micro = process.advance(t as f32 / n as f32, profile.fatigue, rng);
        labels.push(micro);

        let base = config.base_amplitudes[micro.index()];
        let sigma = config.amplitude_rel_sigma;
        let base_theta = base.theta * profile.theta_bias;
        let mut amps = BandValues {
            theta: gaussian_amp(base_theta, sigma.theta, rng),
            alpha: gaussian_amp(base.alpha, sigma.alpha, rng),
            beta: gaussian_amp(base.beta, sigma.beta, rng),
        };

        for rule in &config.bursts {
            if micro == rule.state && rng.gen::<f32>() < rule.prob {
                *amps.get_mut(rule.band) *= rng.gen_range(rule.gain.0..rule.gain.1);
            }
        }

        amps.theta *= 1.0 + (profile.theta_bias - 1.0) * 0.5;
        amps.alpha *= profile.alpha_sync;
        amps.beta *= 1.0 + (profile.emg_level - 1.0) * 0.18;

        let theta_cf = rng.gen_range(config.theta_cf_hz.0..config.theta_cf_hz.1);
        let alpha_cf = profile.alpha_peak
            + rng.gen_range(-config.alpha_cf_jitter_hz..config.alpha_cf_jitter_hz);
        let beta_cf = rng.gen_range(config.beta_cf_hz.0..config.beta_cf_hz.1);

        let secs = t as f32 / sr;
        let channel_center = (channel_count as f32 - 1.0) / 2.0;

        for ch in 0..channel_count {
            let env = 1.0 + 0.65 * (2.0 * PI * env_freq[ch] * secs + env_phase[ch]).sin();
            let alpha_env = env * env_gain;

            let phase = &mut phases[ch];
            phase.theta = (phase.theta + 2.0 * PI * theta_cf / sr) % (2.0 * PI);
            phase.alpha = (phase.alpha + 2.0 * PI * alpha_cf / sr) % (2.0 * PI);
            phase.beta = (phase.beta + 2.0 * PI * beta_cf / sr) % (2.0 * PI);

            let gain = config.channel_gains[ch];
            let theta_sig = amps.theta * gain.theta * (phase.theta + spontaneous[t] * 0.2).sin();
            let alpha_sig =
                amps.alpha * gain.alpha * alpha_env * (phase.alpha + spontaneous[t] * 0.15).sin();
            let beta_sig = amps.beta * gain.beta * (phase.beta + spontaneous[t] * 0.12).sin();

            let noise = pink[t] * profile.base_noise * 0.9 + ar[t] * 0.6;
            let line = powerline(secs, config.powerline_hz);
            let frontal = ch < config.frontal_channels;
            let emg_term = emg[t] * (1.0 + profile.emg_level * 0.6);
            let spike_term = spike[t] * if frontal { 1.0 } else { 0.5 };
            let blink_term = blink[t] * if frontal { 1.0 } else { 0.45 };
            let eye_term = eye[t] * if frontal { 1.0 } else { 0.5 };

            let centered = ch as f32 - channel_center;
            let offset = centered * 0.02 * (1.0 + profile.spectral_slope * 0.1);

            let mut wander = 0.0;
            if rng.gen::<f32>() < 0.0008 {
                wander = (rng.gen::<f32>() * 2.0 - 1.0) * rng.gen_range(0.2..0.8);
            }
            if micro == CognitiveState::Calm {
                wander *= 0.5;
            }

            let mut sample = theta_sig + alpha_sig + beta_sig;
            sample += noise + line + emg_term + spike_term + blink_term + eye_term;
            sample += offset + wander;
            sample *= 1.0 + centered * 0.01;

            channels[ch][t] = sample;
        }
    }

    Trial {
        subject_id: profile.id,
        channels,
        labels,
    }
}

fn gaussian_amp(base: f32, rel_sigma: f32, rng: &mut impl Rng) -> f32 {
    let z: f32 = rng.sample(StandardNormal);
    (base + base * rel_sigma * z).max(0.0)
}

/// Pink-like noise from a one-pole lowpass over uniform white noise
fn pink_noise(n: usize, alpha: f32, rng: &mut impl Rng) -> Vec<f32> {
    let mut out = vec![0.0; n];
    let mut prev = 0.0;
    for value in out.iter_mut() {
        let w = (rng.gen::<f32>() * 2.0 - 1.0) * 0.5;
        prev = alpha * prev + (1.0 - alpha) * w;
        *value = prev;
    }
    out
}

fn ar1_noise(n: usize, coeff: f32, scale: f32, rng: &mut impl Rng) -> Vec<f32> {
    let mut out = vec![0.0; n];
    let mut p = 0.0;
    for value in out.iter_mut() {
        p = coeff * p + (rng.gen::<f32>() * 2.0 - 1.0) * scale;
        *value = p;
    }
    out
}

fn add_blink(track: &mut [f32], idx: usize, amp: f32, width: usize) {
    let half = width as f32 / 2.0;
    for i in 0..width {
        if idx + i >= track.len() {
            break;
        }
        let w = 1.0 - (i as f32 - half).abs() / half;
        track[idx + i] += amp * w;
    }
}

fn add_eye_roll(track: &mut [f32], idx: usize, amp: f32, len: usize) {
    for i in 0..len {
        if idx + i >= track.len() {
            break;
        }
        let frac = i as f32 / len as f32;
        track[idx + i] += amp * (frac * 2.0 * PI).sin() * (1.0 - frac * 0.6);
    }
}

/// Triangular blink pulses spaced inversely to the subject's blink rate
fn blink_track(n: usize, blink_rate: f32, rng: &mut impl Rng) -> Vec<f32> {
    let mut track = vec![0.0; n];
    let mut next = ((rng.gen_range(60.0..200.0) / blink_rate) as usize).max(1);
    while next < n {
        let amp = rng.gen_range(0.6..1.6);
        let width = rng.gen_range(12..26);
        add_blink(&mut track, next, amp, width);
        next += ((rng.gen_range(60.0..200.0) / blink_rate) as usize).max(1);
    }
    track
}

/// A handful of longer sinusoidal ocular excursions, most trials
fn eye_roll_track(n: usize, rng: &mut impl Rng) -> Vec<f32> {
    let mut track = vec![0.0; n];
    let max_pos = n.saturating_sub(220);
    if max_pos == 0 || rng.gen::<f32>() >= 0.9 {
        return track;
    }
    let rolls = rng.gen_range(1..4);
    for _ in 0..rolls {
        let pos = rng.gen_range(0..max_pos);
        let amp = rng.gen_range(0.6..1.4);
        let len = rng.gen_range(120..260);
        add_eye_roll(&mut track, pos, amp, len);
    }
    track
}

fn spike_track(n: usize, rng: &mut impl Rng) -> Vec<f32> {
    let mut track = vec![0.0; n];
    if n < 2 {
        return track;
    }
    let count = rng.gen_range(6..18);
    for _ in 0..count {
        let idx = rng.gen_range(0..n - 1);
        let amp = rng.gen_range(0.8..1.6);
        track[idx] += amp * (rng.gen::<f32>() * 0.6 + 0.6);
    }
    track
}

/// Short wideband bursts whose density scales with the muscle artifact level
fn emg_track(n: usize, emg_level: f32, rng: &mut impl Rng) -> Vec<f32> {
    let mut track = vec![0.0; n];
    let mut next = rng.gen_range(80..320);
    while next < n {
        let width = rng.gen_range(10..50);
        for k in 0..width {
            if next + k >= n {
                break;
            }
            track[next + k] += (rng.gen::<f32>() * 2.0 - 1.0) * 0.02 * emg_level;
        }
        next += rng.gen_range(80..320);
    }
    track
}

/// Slowly decaying phase wander shared by all bands of a channel
fn spontaneous_track(n: usize, wander: f32, rng: &mut impl Rng) -> Vec<f32> {
    let mut track = vec![0.0; n];
    let mut prev = 0.0;
    for value in track.iter_mut() {
        prev = 0.97 * prev + (rng.gen::<f32>() * 2.0 - 1.0) * 0.02 * wander;
        *value = prev;
    }
    track
}

fn powerline(secs: f32, base_hz: f32) -> f32 {
    0.08 * (2.0 * PI * base_hz * secs).sin() + 0.02 * (2.0 * PI * 2.0 * base_hz * secs).sin()
}
