//! Synthetic chest-strap data for test mode and end-to-end checks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::ecg::{HeartRateSample, RawSample};

/// Longest span one simulation request may generate.
pub const MAX_SIMULATION_MS: i64 = 600_000;

/// Generates a QRS-like waveform: small P and T waves around a narrow, tall R spike.
#[derive(Debug, Clone)]
pub struct SyntheticEcg {
    pub sampling_rate_hz: f64,
    pub heart_rate_bpm: f64,
    /// Beat-to-beat rate jitter, +/- bpm
    pub rate_jitter_bpm: f64,
    pub r_amplitude: f64,
    /// Uniform noise, +/- amplitude
    pub noise_amplitude: f64,
    rng: StdRng,
}

impl SyntheticEcg {
    pub fn new(sampling_rate_hz: f64, heart_rate_bpm: f64, seed: u64) -> Self {
        Self {
            sampling_rate_hz,
            heart_rate_bpm,
            rate_jitter_bpm: 0.0,
            r_amplitude: 1000.0,
            noise_amplitude: 10.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_jitter(mut self, rate_jitter_bpm: f64) -> Self {
        self.rate_jitter_bpm = rate_jitter_bpm;
        self
    }

    pub fn with_noise(mut self, noise_amplitude: f64) -> Self {
        self.noise_amplitude = noise_amplitude;
        self
    }

    /// Beat onset times in ms relative to `start`, covering `duration_ms`.
    fn beat_onsets(&mut self, duration_ms: i64) -> Vec<(f64, f64)> {
        let mut beats = Vec::new();
        let mut onset = 0.0;
        while onset < duration_ms as f64 + 2_000.0 {
            let jitter = if self.rate_jitter_bpm > 0.0 {
                self.rng.gen_range(-self.rate_jitter_bpm..=self.rate_jitter_bpm)
            } else {
                0.0
            };
            let rr = 60_000.0 / (self.heart_rate_bpm + jitter).max(1.0);
            beats.push((onset, rr));
            onset += rr;
        }
        beats
    }

    fn waveform(&self, t_in_beat: f64, rr: f64) -> f64 {
        let gaussian = |center: f64, width: f64, amplitude: f64| {
            let d = (t_in_beat - center) / width;
            amplitude * (-0.5 * d * d).exp()
        };
        let a = self.r_amplitude;
        let r_time = 0.25 * rr;
        gaussian(0.10 * rr, 25.0, 0.10 * a) // P
            + gaussian(r_time - 20.0, 6.0, -0.10 * a) // Q
            + gaussian(r_time, 12.0, a) // R
            + gaussian(r_time + 20.0, 6.0, -0.15 * a) // S
            + gaussian(0.55 * rr, 40.0, 0.25 * a) // T
    }

    pub fn samples(&mut self, start: i64, duration_ms: i64) -> Vec<RawSample> {
        let beats = self.beat_onsets(duration_ms);
        let count = (duration_ms as f64 * self.sampling_rate_hz / 1000.0).floor() as usize;
        let step = 1000.0 / self.sampling_rate_hz;

        let mut samples = Vec::with_capacity(count);
        let mut beat_index = 0;
        for i in 0..count {
            let t = i as f64 * step;
            while beat_index + 1 < beats.len() && beats[beat_index + 1].0 <= t {
                beat_index += 1;
            }
            let (onset, rr) = beats[beat_index];
            let noise = if self.noise_amplitude > 0.0 {
                self.rng.gen_range(-self.noise_amplitude..=self.noise_amplitude)
            } else {
                0.0
            };
            samples.push(RawSample {
                timestamp: start + t.round() as i64,
                value: self.waveform(t - onset, rr) + noise,
            });
        }
        samples
    }
}

/// Reported heart rate every second, `from_bpm` moving linearly to `to_bpm`.
pub fn heart_rate_ramp(start: i64, duration_ms: i64, from_bpm: i32, to_bpm: i32) -> Vec<HeartRateSample> {
    let seconds = duration_ms / 1000;
    (0..=seconds)
        .map(|i| {
            let fraction = if seconds == 0 { 0.0 } else { i as f64 / seconds as f64 };
            HeartRateSample {
                timestamp: start + i * 1000,
                value: (from_bpm as f64 + (to_bpm - from_bpm) as f64 * fraction).round() as i32,
            }
        })
        .collect()
}
