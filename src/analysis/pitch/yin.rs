// YIN module - frame-wise fundamental frequency estimation
//
// For each centred frame the difference function
//
//   d(tau) = E(0) + E(tau) - 2 r(tau)
//
// is built from windowed energies E and the cross-correlation r between the
// first `window_length` samples and the rest of the frame. r comes from an
// FFT product so the cost per frame stays O(n log n). The cumulative mean
// normalised difference is then searched for the first trough below the
// threshold, refined by parabolic interpolation.
//
// References:
// - de Cheveigne, A. & Kawahara, H. (2002). YIN, a fundamental frequency
//   estimator for speech and music

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::PitchEstimator;
use crate::config::AnalysisConfig;

/// Windowed energy below which a frame is treated as silent
const ENERGY_FLOOR: f64 = 1e-6;

/// YIN estimator with librosa-compatible framing
#[derive(Debug, Clone)]
pub struct YinEstimator {
    frame_length: usize,
    window_length: usize,
    hop_length: usize,
    trough_threshold: f64,
}

impl YinEstimator {
    /// Create an estimator; the integration window is half the frame
    pub fn new(frame_length: usize, hop_length: usize, trough_threshold: f32) -> Self {
        let frame_length = frame_length.max(4);
        Self {
            frame_length,
            window_length: frame_length / 2,
            hop_length: hop_length.max(1),
            trough_threshold: trough_threshold as f64,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.frame_length,
            config.hop_length,
            config.trough_threshold,
        )
    }

    /// Lag search range in samples for the requested frequency bounds
    ///
    /// The upper lag is capped so the shifted window stays inside the frame.
    pub fn period_bounds(&self, sample_rate: u32, fmin: f32, fmax: f32) -> (usize, usize) {
        let sr = sample_rate as f64;
        let min_period = ((sr / fmax as f64).floor() as usize).max(1);
        let max_period = ((sr / fmin as f64).ceil() as usize)
            .min(self.frame_length - self.window_length - 1);
        (min_period, max_period)
    }

    fn frame_f0(
        &self,
        frame: &[f32],
        sample_rate: u32,
        bounds: (usize, usize),
        fft: &FftPair,
        scratch: &mut FrameScratch,
    ) -> f32 {
        let (min_period, max_period) = bounds;
        let window = self.window_length;
        let FrameScratch {
            frame_spec,
            window_spec,
            energy_prefix,
            cmnd,
        } = scratch;

        energy_prefix.clear();
        energy_prefix.push(0.0);
        let mut acc = 0.0_f64;
        for &s in frame {
            acc += (s as f64) * (s as f64);
            energy_prefix.push(acc);
        }
        let energy = |tau: usize| {
            let e = energy_prefix[tau + window] - energy_prefix[tau];
            if e.abs() < ENERGY_FLOOR {
                0.0
            } else {
                e
            }
        };

        let e0 = energy(0);
        if e0 <= 0.0 {
            return f32::NAN;
        }

        // r(tau) = sum_j frame[j] * frame[j + tau], j < window
        for (i, slot) in frame_spec.iter_mut().enumerate() {
            let v = frame.get(i).copied().unwrap_or(0.0) as f64;
            *slot = Complex::new(v, 0.0);
        }
        for (i, slot) in window_spec.iter_mut().enumerate() {
            let v = if i < window { frame[i] as f64 } else { 0.0 };
            *slot = Complex::new(v, 0.0);
        }
        fft.forward.process(frame_spec);
        fft.forward.process(window_spec);
        for (a, b) in frame_spec.iter_mut().zip(window_spec.iter()) {
            *a *= b.conj();
        }
        fft.inverse.process(frame_spec);
        let norm = frame_spec.len() as f64;

        // Cumulative mean normalised difference over [1, max_period]
        cmnd.clear();
        let mut running = 0.0_f64;
        for tau in 1..=max_period {
            let r = frame_spec[tau].re / norm;
            let d = (e0 + energy(tau) - 2.0 * r).max(0.0);
            running += d;
            let value = if running > 0.0 {
                d * tau as f64 / running
            } else {
                1.0
            };
            if tau >= min_period {
                cmnd.push(value);
            }
        }

        let Some(index) = first_trough_below(cmnd.as_slice(), self.trough_threshold) else {
            return f32::NAN;
        };

        let period = (min_period + index) as f64 + parabolic_shift(cmnd.as_slice(), index);
        if period <= 0.0 {
            return f32::NAN;
        }
        (sample_rate as f64 / period) as f32
    }
}

impl PitchEstimator for YinEstimator {
    fn estimate(&self, samples: &[f32], sample_rate: u32, fmin: f32, fmax: f32) -> Vec<f32> {
        if samples.is_empty() || sample_rate == 0 || fmin <= 0.0 || fmax <= fmin {
            return Vec::new();
        }

        let n_frames = 1 + samples.len() / self.hop_length;
        let bounds = self.period_bounds(sample_rate, fmin, fmax);
        if bounds.0 + 2 > bounds.1 {
            log::warn!(
                "[Yin] Lag range {:?} too narrow for frame length {}",
                bounds,
                self.frame_length
            );
            return vec![f32::NAN; n_frames];
        }

        let pad = self.frame_length / 2;
        let mut padded = vec![0.0_f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let fft_len = (self.frame_length + self.window_length).next_power_of_two();
        let fft = FftPair::new(fft_len);
        let mut scratch = FrameScratch::new(fft_len, self.frame_length);

        (0..n_frames)
            .map(|i| {
                let start = i * self.hop_length;
                let frame = &padded[start..start + self.frame_length];
                self.frame_f0(frame, sample_rate, bounds, &fft, &mut scratch)
            })
            .collect()
    }
}

struct FftPair {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftPair {
    fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }
}

struct FrameScratch {
    frame_spec: Vec<Complex<f64>>,
    window_spec: Vec<Complex<f64>>,
    energy_prefix: Vec<f64>,
    cmnd: Vec<f64>,
}

impl FrameScratch {
    fn new(fft_len: usize, frame_length: usize) -> Self {
        Self {
            frame_spec: vec![Complex::new(0.0, 0.0); fft_len],
            window_spec: vec![Complex::new(0.0, 0.0); fft_len],
            energy_prefix: Vec::with_capacity(frame_length + 1),
            cmnd: Vec::with_capacity(frame_length),
        }
    }
}

/// Index of the first local minimum strictly below `threshold`
///
/// The first element counts as a trough when it is below its right
/// neighbour; the last when it is below its left one.
fn first_trough_below(values: &[f64], threshold: f64) -> Option<usize> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    (0..n).find(|&k| {
        let v = values[k];
        let is_trough = if k == 0 {
            v < values[1]
        } else if k == n - 1 {
            v < values[k - 1]
        } else {
            v < values[k - 1] && v <= values[k + 1]
        };
        is_trough && v < threshold
    })
}

/// Sub-sample offset of the vertex of the parabola through k-1, k, k+1
fn parabolic_shift(values: &[f64], k: usize) -> f64 {
    if k == 0 || k + 1 >= values.len() {
        return 0.0;
    }
    let (left, centre, right) = (values[k - 1], values[k], values[k + 1]);
    let a = right + left - 2.0 * centre;
    let b = (right - left) / 2.0;
    if b.abs() >= a.abs() {
        0.0
    } else {
        -b / a
    }
}
