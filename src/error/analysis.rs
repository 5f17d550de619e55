// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 1001-1003
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Signal is shorter than the minimum usable duration, even untrimmed
    pub const TOO_SHORT: i32 = 1001;

    /// No finite positive F0 estimate survived filtering
    pub const NO_PITCH_DETECTED: i32 = 1002;

    /// Sample rate of zero handed to the extractor
    pub const INVALID_SAMPLE_RATE: i32 = 1003;
}

/// Log an analysis error with structured context
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=PitchExtractor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Pitch-analysis errors
///
/// `TooShort` and `NoPitchDetected` are caused by the submitted recording and
/// surface to clients as validation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Untrimmed signal shorter than the minimum duration
    TooShort { duration_secs: f32, min_secs: f32 },

    /// Every frame was unvoiced or invalid
    NoPitchDetected,

    /// Sample rate must be positive
    InvalidSampleRate { sample_rate: u32 },
}

impl AnalysisError {
    /// Whether the failure is attributable to the recording rather than the system
    pub fn is_client_caused(&self) -> bool {
        matches!(
            self,
            AnalysisError::TooShort { .. } | AnalysisError::NoPitchDetected
        )
    }
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::TooShort { .. } => AnalysisErrorCodes::TOO_SHORT,
            AnalysisError::NoPitchDetected => AnalysisErrorCodes::NO_PITCH_DETECTED,
            AnalysisError::InvalidSampleRate { .. } => AnalysisErrorCodes::INVALID_SAMPLE_RATE,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::TooShort { min_secs, .. } => {
                format!("Audio file is too short (minimum {} seconds)", min_secs)
            }
            AnalysisError::NoPitchDetected => "No pitch detected".to_string(),
            AnalysisError::InvalidSampleRate { sample_rate } => {
                format!("Invalid sample rate: {} Hz", sample_rate)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}
