// Decoder module - canonical waveform loading
//
// The normalization stage always produces linear-PCM WAV, so decoding is a
// WAV read followed by scaling to [-1, 1] and a channel-average downmix.

use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::error::DecodeError;

/// Mono floating-point waveform at its native sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Loads a waveform from disk
pub trait WaveformDecoder: Send + Sync {
    fn load(&self, path: &Path) -> Result<Waveform, DecodeError>;
}

/// `hound`-backed WAV decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct HoundDecoder;

impl WaveformDecoder for HoundDecoder {
    fn load(&self, path: &Path) -> Result<Waveform, DecodeError> {
        let reader = WavReader::open(path).map_err(|err| DecodeError::Open {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(read_error)?,
            (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
                let scale = 1.0 / (1_i64 << (bits - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(read_error)?
            }
            (format, bits) => {
                return Err(DecodeError::UnsupportedFormat {
                    bits_per_sample: bits,
                    float: format == SampleFormat::Float,
                })
            }
        };

        let samples = downmix(&interleaved, spec.channels as usize);
        log::debug!(
            "[Decoder] Loaded {} frames @ {} Hz ({} ch) from {}",
            samples.len(),
            spec.sample_rate,
            spec.channels,
            path.display()
        );

        Ok(Waveform {
            samples,
            sample_rate: spec.sample_rate,
        })
    }
}

fn read_error(err: hound::Error) -> DecodeError {
    DecodeError::Read {
        reason: err.to_string(),
    }
}

/// Average interleaved channels into one
///
/// A trailing partial frame is dropped.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth;
    use hound::{WavSpec, WavWriter};

    #[test]
    fn test_downmix_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0, 0.25];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
        assert_eq!(downmix(&stereo[..2], 1), vec![1.0, 0.0]);
    }

    #[test]
    fn test_loads_mono_pcm16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        synth::write_wav(&path, &synth::sine(220.0, 44_100, 0.5, 0.5), 44_100).unwrap();

        let waveform = HoundDecoder.load(&path).unwrap();
        assert_eq!(waveform.sample_rate, 44_100);
        assert_eq!(waveform.samples.len(), 22_050);
        assert!((waveform.duration_secs() - 0.5).abs() < 1e-9);
        let peak = waveform.samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!((peak - 0.5).abs() < 1e-2);
    }

    #[test]
    fn test_loads_stereo_float_as_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(0.8_f32).unwrap();
            writer.write_sample(0.2_f32).unwrap();
        }
        writer.finalize().unwrap();

        let waveform = HoundDecoder.load(&path).unwrap();
        assert_eq!(waveform.samples.len(), 100);
        assert!(waveform.samples.iter().all(|s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_garbage_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a RIFF header").unwrap();

        match HoundDecoder.load(&path) {
            Err(DecodeError::Open { .. }) => {}
            other => panic!("expected Open error, got {:?}", other),
        }
    }
}
