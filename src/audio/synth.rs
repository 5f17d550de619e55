//! Deterministic synthetic signals.
//!
//! Reference tones, silence and seeded noise for the CLI `tone` command and
//! for tests that need audio with a known fundamental.

use std::f64::consts::PI;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Supported deterministic waveform patterns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyntheticPattern {
    Sine { frequency_hz: f32 },
    Silence,
    WhiteNoise { seed: u64 },
}

/// Full description of a synthetic signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSpec {
    pub pattern: SyntheticPattern,
    pub sample_rate: u32,
    pub duration_secs: f32,
    pub amplitude: f32,
}

impl SyntheticSpec {
    pub fn render(&self) -> Vec<f32> {
        match self.pattern {
            SyntheticPattern::Sine { frequency_hz } => sine(
                frequency_hz,
                self.sample_rate,
                self.duration_secs,
                self.amplitude,
            ),
            SyntheticPattern::Silence => silence(self.sample_rate, self.duration_secs),
            SyntheticPattern::WhiteNoise { seed } => white_noise(
                self.sample_rate,
                self.duration_secs,
                self.amplitude,
                seed,
            ),
        }
    }

    /// Render and write as 16-bit mono PCM WAV.
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<(), hound::Error> {
        write_wav(path, &self.render(), self.sample_rate)
    }
}

fn sample_count(sample_rate: u32, duration_secs: f32) -> usize {
    (sample_rate as f64 * duration_secs.max(0.0) as f64).round() as usize
}

/// Sine tone starting at phase zero.
pub fn sine(frequency_hz: f32, sample_rate: u32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let n = sample_count(sample_rate, duration_secs);
    let step = 2.0 * PI * frequency_hz as f64 / sample_rate as f64;
    (0..n)
        .map(|i| amplitude * (step * i as f64).sin() as f32)
        .collect()
}

/// Digital silence.
pub fn silence(sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    vec![0.0; sample_count(sample_rate, duration_secs)]
}

/// Uniform white noise in `[-amplitude, amplitude)`, reproducible per seed.
pub fn white_noise(sample_rate: u32, duration_secs: f32, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..sample_count(sample_rate, duration_secs))
        .map(|_| amplitude * rng.gen_range(-1.0_f32..1.0))
        .collect()
}

/// Write mono samples as 16-bit PCM WAV, clamping to full scale.
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(scaled)?;
    }
    writer.finalize()
}
