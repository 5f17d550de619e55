// Error types for the voice analysis service
//
// This module defines custom error types for pitch analysis, media handling
// and the request lifecycle, providing structured error handling with error
// codes and a client-facing failure taxonomy.

mod analysis;
mod media;
mod request;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use media::{
    log_media_error, ConversionError, ConversionErrorCodes, DecodeError, DecodeErrorCodes,
};
pub use request::{log_request_error, AnalysisFailure, FailureKind, RequestError, RequestErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the transport boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
