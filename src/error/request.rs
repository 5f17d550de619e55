// Request lifecycle errors and the client-facing failure taxonomy

use crate::error::{AnalysisError, ConversionError, DecodeError, ErrorCode};
use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request error code constants
///
/// Error code range: 4001-4010
pub struct RequestErrorCodes {}

impl RequestErrorCodes {
    pub const MISSING_FILE: i32 = 4001;
    pub const EMPTY_PAYLOAD: i32 = 4002;
    pub const EMPTY_FILENAME: i32 = 4003;
    pub const UNSUPPORTED_FORMAT: i32 = 4004;
    pub const PAYLOAD_TOO_LARGE: i32 = 4005;
    pub const ANALYSIS: i32 = 4006;
    pub const CONVERSION: i32 = 4007;
    pub const DECODE: i32 = 4008;
    pub const STORAGE: i32 = 4009;
    pub const PANICKED: i32 = 4010;
}

/// The four outcome kinds a caller can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Bad or missing file, unsupported extension, too short, no pitch
    ValidationError,
    /// Upload exceeds the configured size limit
    PayloadTooLarge,
    /// External converter failed
    ConversionError,
    /// Unexpected failure in storage, decode or analysis
    ProcessingError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ValidationError => "ValidationError",
            FailureKind::PayloadTooLarge => "PayloadTooLarge",
            FailureKind::ConversionError => "ConversionError",
            FailureKind::ProcessingError => "ProcessingError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure returned across the orchestrator boundary
///
/// Only the kind and a human-readable message leave the service; internal
/// error codes, paths and tool output stay in the logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl AnalysisFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&RequestError> for AnalysisFailure {
    fn from(err: &RequestError) -> Self {
        Self::new(err.kind(), err.client_message())
    }
}

/// Log a request error with structured context
pub fn log_request_error(err: &RequestError, context: &str) {
    error!(
        "Request error in {}: code={}, kind={}, component=Orchestrator, message={}",
        context,
        err.code(),
        err.kind(),
        err.message()
    );
}

/// Everything that can end a request early
#[derive(Debug, Clone, PartialEq)]
pub enum RequestError {
    /// No file part in the submission
    MissingFile,

    /// File part present but zero bytes long
    EmptyPayload,

    /// File part has no filename
    EmptyFilename,

    /// Extension outside the allowed set
    UnsupportedFormat { filename: String },

    /// Payload larger than the configured limit
    PayloadTooLarge { limit_bytes: usize },

    /// Pitch extraction failed
    Analysis(AnalysisError),

    /// Normalization failed
    Conversion(ConversionError),

    /// Canonical waveform could not be decoded
    Decode(DecodeError),

    /// Upload could not be staged on disk
    Storage { reason: String },

    /// A stage panicked; the panic payload is kept for the logs
    Panicked { reason: String },
}

impl RequestError {
    /// Classify into exactly one client-facing kind
    pub fn kind(&self) -> FailureKind {
        match self {
            RequestError::MissingFile
            | RequestError::EmptyPayload
            | RequestError::EmptyFilename
            | RequestError::UnsupportedFormat { .. } => FailureKind::ValidationError,
            RequestError::PayloadTooLarge { .. } => FailureKind::PayloadTooLarge,
            RequestError::Analysis(err) if err.is_client_caused() => FailureKind::ValidationError,
            RequestError::Analysis(_) => FailureKind::ProcessingError,
            RequestError::Conversion(_) => FailureKind::ConversionError,
            RequestError::Decode(_) | RequestError::Storage { .. } | RequestError::Panicked { .. } => {
                FailureKind::ProcessingError
            }
        }
    }

    /// Message safe to return to the submitter
    ///
    /// Stage errors that carry paths, OS errors or converter output are
    /// reduced to a fixed sentence; `message()` keeps the details for logs.
    pub fn client_message(&self) -> String {
        match self {
            RequestError::Conversion(_) => "Audio conversion failed".to_string(),
            RequestError::Decode(_) => "Failed to decode converted audio".to_string(),
            RequestError::Storage { .. } => "Failed to store upload".to_string(),
            other => other.message(),
        }
    }
}

impl ErrorCode for RequestError {
    fn code(&self) -> i32 {
        match self {
            RequestError::MissingFile => RequestErrorCodes::MISSING_FILE,
            RequestError::EmptyPayload => RequestErrorCodes::EMPTY_PAYLOAD,
            RequestError::EmptyFilename => RequestErrorCodes::EMPTY_FILENAME,
            RequestError::UnsupportedFormat { .. } => RequestErrorCodes::UNSUPPORTED_FORMAT,
            RequestError::PayloadTooLarge { .. } => RequestErrorCodes::PAYLOAD_TOO_LARGE,
            RequestError::Analysis(_) => RequestErrorCodes::ANALYSIS,
            RequestError::Conversion(_) => RequestErrorCodes::CONVERSION,
            RequestError::Decode(_) => RequestErrorCodes::DECODE,
            RequestError::Storage { .. } => RequestErrorCodes::STORAGE,
            RequestError::Panicked { .. } => RequestErrorCodes::PANICKED,
        }
    }

    fn message(&self) -> String {
        match self {
            RequestError::MissingFile => "No file part in request".to_string(),
            RequestError::EmptyPayload => "Uploaded file is empty".to_string(),
            RequestError::EmptyFilename => "No file selected".to_string(),
            RequestError::UnsupportedFormat { .. } => "Unsupported file format".to_string(),
            RequestError::PayloadTooLarge { limit_bytes } => {
                format!("File too large (limit {}MB)", limit_bytes / (1024 * 1024))
            }
            RequestError::Analysis(err) => err.message(),
            RequestError::Conversion(err) => err.message(),
            RequestError::Decode(err) => err.message(),
            RequestError::Storage { reason } => format!("Failed to store upload: {}", reason),
            RequestError::Panicked { .. } => "Internal error during analysis".to_string(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RequestError (code {}, {}): {}",
            self.code(),
            self.kind(),
            self.message()
        )
    }
}

impl std::error::Error for RequestError {}

impl From<AnalysisError> for RequestError {
    fn from(err: AnalysisError) -> Self {
        RequestError::Analysis(err)
    }
}

impl From<ConversionError> for RequestError {
    fn from(err: ConversionError) -> Self {
        RequestError::Conversion(err)
    }
}

impl From<DecodeError> for RequestError {
    fn from(err: DecodeError) -> Self {
        RequestError::Decode(err)
    }
}
