// Pitch module - representative fundamental frequency of a recording
//
// Pipeline: trim silence → fall back to the full signal if trimming leaves
// too little → frame-wise F0 estimation → drop unvoiced frames → median.
// The median keeps transient octave errors and noise spikes from dragging
// the result the way a mean would.

pub mod trim;
pub mod yin;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

pub use yin::YinEstimator;

/// Frame-wise fundamental frequency estimator
///
/// Returns one value per analysis frame, NaN where the frame is unvoiced.
pub trait PitchEstimator: Send + Sync {
    fn estimate(&self, samples: &[f32], sample_rate: u32, fmin: f32, fmax: f32) -> Vec<f32>;
}

/// Output of a successful extraction
#[derive(Debug, Clone, PartialEq)]
pub struct PitchAnalysis {
    /// Median of the voiced estimates, in Hz
    pub average_pitch: f64,
    /// Voiced estimates only, in frame order
    pub series: Vec<f32>,
    /// Whether the silence-trimmed signal was analysed
    pub trimmed: bool,
    /// Duration of the analysed signal in seconds
    pub analysed_secs: f64,
}

/// Turns a decoded waveform into a representative pitch
pub struct PitchExtractor {
    config: AnalysisConfig,
    estimator: Box<dyn PitchEstimator>,
}

impl PitchExtractor {
    /// Extractor backed by the YIN estimator
    pub fn new(config: AnalysisConfig) -> Self {
        let estimator = Box::new(YinEstimator::from_config(&config));
        Self { config, estimator }
    }

    /// Extractor with a caller-supplied estimator
    pub fn with_estimator(config: AnalysisConfig, estimator: Box<dyn PitchEstimator>) -> Self {
        Self { config, estimator }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Estimate the representative pitch of `samples`
    ///
    /// # Errors
    /// * `TooShort` - both the trimmed and the untrimmed signal are under
    ///   `min_duration_secs`
    /// * `NoPitchDetected` - no finite, positive estimate remained
    /// * `InvalidSampleRate` - `sample_rate` is zero
    pub fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<PitchAnalysis, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate { sample_rate });
        }

        let cfg = &self.config;
        let min_secs = cfg.min_duration_secs as f64;
        let span = trim::trim_silence(samples, cfg.top_db, cfg.frame_length, cfg.hop_length);
        let trimmed = &samples[span];

        let (signal, used_trimmed) = if duration_secs(trimmed, sample_rate) < min_secs {
            let full = duration_secs(samples, sample_rate);
            if full < min_secs {
                return Err(AnalysisError::TooShort {
                    duration_secs: full as f32,
                    min_secs: cfg.min_duration_secs,
                });
            }
            log::debug!(
                "[PitchExtractor] Trimmed signal under {}s, using untrimmed {:.3}s",
                cfg.min_duration_secs,
                full
            );
            (samples, false)
        } else {
            (trimmed, true)
        };

        let raw = self
            .estimator
            .estimate(signal, sample_rate, cfg.fmin, cfg.fmax);
        let frame_count = raw.len();
        let series: Vec<f32> = raw
            .into_iter()
            .filter(|f0| f0.is_finite() && *f0 > 0.0)
            .collect();

        let Some(average_pitch) = median(&series) else {
            return Err(AnalysisError::NoPitchDetected);
        };

        log::debug!(
            "[PitchExtractor] {} of {} frames voiced, median {:.2} Hz",
            series.len(),
            frame_count,
            average_pitch
        );

        Ok(PitchAnalysis {
            average_pitch,
            series,
            trimmed: used_trimmed,
            analysed_secs: duration_secs(signal, sample_rate),
        })
    }
}

fn duration_secs(samples: &[f32], sample_rate: u32) -> f64 {
    samples.len() as f64 / sample_rate as f64
}

/// Median; even-length input averages the middle pair
pub fn median(values: &[f32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
