// Orchestrator module - one upload in, one outcome out
//
// Received → Validated → Normalized → Decoded → Analyzed → Completed
//     └──────────┴────────────┴──────────┴──────────┴──→ Failed(kind)
//
// Each request owns a RequestFiles guard; every file it writes is registered
// there first and removed when the request ends, panics included.

pub mod scratch;

use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::analysis::{classify_with_hint, PitchExtractor, VoiceType};
use crate::audio::{FfmpegConverter, FormatConverter, HoundDecoder, NormalizationStage, WaveformDecoder};
use crate::config::AppConfig;
use crate::error::{
    log_analysis_error, log_media_error, log_request_error, AnalysisFailure,
    FailureKind, RequestError,
};

use scratch::RequestFiles;

/// Extensions accepted for upload, compared case-insensitively
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["aac", "wav", "mp3", "ogg"];

/// Raw submission as received from the transport
#[derive(Debug, Clone, Default)]
pub struct UploadedAudio {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub gender: Option<String>,
}

/// Successful analysis of one upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub voice_type: VoiceType,
    /// Hz, rounded to two decimals
    pub average_pitch: f64,
    /// Voiced per-frame estimates in Hz
    pub pitch_series: Vec<f32>,
    #[serde(serialize_with = "serialize_processing_time")]
    pub processing_time: Duration,
}

/// Terminal result of a submission
///
/// Serializes to the response body: `{"status": "success", ...result}` or
/// `{"status": "error", "kind": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum AnalysisOutcome {
    #[serde(rename = "success")]
    Success(AnalysisResult),
    #[serde(rename = "error")]
    Failure(AnalysisFailure),
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::Failure(failure) => Some(failure.kind),
        }
    }
}

/// Lifecycle position of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Validated,
    Normalized,
    Decoded,
    Analyzed,
    Completed,
    Failed(FailureKind),
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Failed(kind) => write!(f, "Failed({})", kind),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Runs submissions through normalization, decoding, extraction and
/// classification
///
/// Holds no per-request state, so one instance is shared by all workers.
pub struct RequestOrchestrator {
    upload_dir: PathBuf,
    max_upload_bytes: usize,
    normalizer: NormalizationStage,
    decoder: Arc<dyn WaveformDecoder>,
    extractor: PitchExtractor,
}

impl RequestOrchestrator {
    /// Orchestrator with injected converter, decoder and extractor
    pub fn new(
        config: &AppConfig,
        converter: Arc<dyn FormatConverter>,
        decoder: Arc<dyn WaveformDecoder>,
        extractor: PitchExtractor,
    ) -> Self {
        Self {
            upload_dir: config.storage.upload_dir.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
            normalizer: NormalizationStage::new(converter, config.storage.converted_dir.clone()),
            decoder,
            extractor,
        }
    }

    /// Production wiring: ffmpeg, hound and YIN
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(FfmpegConverter::new(&config.converter)),
            Arc::new(HoundDecoder),
            PitchExtractor::new(config.analysis.clone()),
        )
    }

    pub fn converter(&self) -> &Arc<dyn FormatConverter> {
        self.normalizer.converter()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Process one submission to completion
    ///
    /// Never panics and never leaves request files behind.
    pub fn submit(&self, upload: UploadedAudio) -> AnalysisOutcome {
        let started = Instant::now();
        let mut state = RequestState::Received;
        let _span = tracing::info_span!("analyze", file = %upload.filename).entered();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run(&upload, &mut state, started)
        }));

        let err = match result {
            Ok(Ok(analysis)) => {
                log::info!(
                    "[Orchestrator] {} → {} ({:.2} Hz) in {}ms",
                    upload.filename,
                    analysis.voice_type,
                    analysis.average_pitch,
                    analysis.processing_time.as_millis()
                );
                return AnalysisOutcome::Success(analysis);
            }
            Ok(Err(err)) => err,
            Err(payload) => RequestError::Panicked {
                reason: panic_reason(payload.as_ref()),
            },
        };

        log_request_error(&err, &format!("submit ({}, state {})", upload.filename, state));
        if let RequestError::Panicked { reason } = &err {
            log::error!("[Orchestrator] Stage panicked: {}", reason);
        }
        state = RequestState::Failed(err.kind());
        log::debug!("[Orchestrator] Request ended in {}", state);

        AnalysisOutcome::Failure(AnalysisFailure::from(&err))
    }

    fn run(
        &self,
        upload: &UploadedAudio,
        state: &mut RequestState,
        started: Instant,
    ) -> Result<AnalysisResult, RequestError> {
        let mut files = RequestFiles::new();

        self.validate(upload)?;
        *state = RequestState::Validated;

        let staged = scratch::staged_path(&self.upload_dir, &upload.filename);
        files.register(&staged);
        fs::write(&staged, &upload.bytes).map_err(|err| RequestError::Storage {
            reason: err.to_string(),
        })?;

        let canonical = self.normalizer.output_path_for(&staged);
        files.register(&canonical);
        self.normalizer.normalize_to(&staged, &canonical)?;
        *state = RequestState::Normalized;

        let waveform = self.decoder.load(&canonical).map_err(|err| {
            log_media_error(&err, "Decoder", &canonical.display().to_string());
            err
        })?;
        *state = RequestState::Decoded;

        let analysis = self
            .extractor
            .extract(&waveform.samples, waveform.sample_rate)
            .map_err(|err| {
                log_analysis_error(&err, &upload.filename);
                err
            })?;
        let voice_type = classify_with_hint(analysis.average_pitch, upload.gender.as_deref());
        *state = RequestState::Analyzed;

        files.release();
        *state = RequestState::Completed;

        Ok(AnalysisResult {
            voice_type,
            average_pitch: round_hundredths(analysis.average_pitch),
            pitch_series: analysis.series,
            processing_time: started.elapsed(),
        })
    }

    fn validate(&self, upload: &UploadedAudio) -> Result<(), RequestError> {
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(RequestError::PayloadTooLarge {
                limit_bytes: self.max_upload_bytes,
            });
        }
        if upload.filename.is_empty() {
            return Err(RequestError::EmptyFilename);
        }
        if upload.bytes.is_empty() {
            return Err(RequestError::EmptyPayload);
        }
        if !is_allowed_file(&upload.filename) {
            return Err(RequestError::UnsupportedFormat {
                filename: upload.filename.clone(),
            });
        }
        Ok(())
    }
}

/// Whether the text after the last `.` is an accepted extension
pub fn is_allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Render as `H:MM:SS.ffffff`
pub fn format_processing_time(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_micros()
    )
}

fn serialize_processing_time<S: Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_processing_time(*elapsed))
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
