// Media error types: format conversion and waveform decoding

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Conversion error code constants
///
/// Error code range: 2001-2004
pub struct ConversionErrorCodes {}

impl ConversionErrorCodes {
    /// Converter process could not be started
    pub const SPAWN_FAILED: i32 = 2001;

    /// Converter exited with a non-zero status
    pub const TOOL_FAILED: i32 = 2002;

    /// Converter reported success but produced no output
    pub const MISSING_OUTPUT: i32 = 2003;

    /// Filesystem failure around the conversion
    pub const IO_FAILED: i32 = 2004;
}

/// Decode error code constants
///
/// Error code range: 3001-3003
pub struct DecodeErrorCodes {}

impl DecodeErrorCodes {
    /// File could not be opened or parsed as WAV
    pub const OPEN_FAILED: i32 = 3001;

    /// Sample stream was truncated or malformed
    pub const READ_FAILED: i32 = 3002;

    /// Sample format is not supported
    pub const UNSUPPORTED_FORMAT: i32 = 3003;
}

/// Log a media error (conversion or decode) with structured context
pub fn log_media_error(err: &dyn ErrorCode, component: &str, context: &str) {
    error!(
        "Media error in {}: code={}, component={}, message={}",
        context,
        err.code(),
        component,
        err.message()
    );
}

/// Errors raised while driving the external format converter
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The converter binary could not be launched
    Spawn { program: String, reason: String },

    /// The converter ran and failed; `stderr` carries its diagnostics
    ToolFailed { status: Option<i32>, stderr: String },

    /// The converter exited cleanly without writing the output file
    MissingOutput { path: String },

    /// Copy/create failure in a converter that works on files directly
    Io { reason: String },
}

impl ErrorCode for ConversionError {
    fn code(&self) -> i32 {
        match self {
            ConversionError::Spawn { .. } => ConversionErrorCodes::SPAWN_FAILED,
            ConversionError::ToolFailed { .. } => ConversionErrorCodes::TOOL_FAILED,
            ConversionError::MissingOutput { .. } => ConversionErrorCodes::MISSING_OUTPUT,
            ConversionError::Io { .. } => ConversionErrorCodes::IO_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            ConversionError::Spawn { program, reason } => {
                format!("Failed to start converter '{}': {}", program, reason)
            }
            ConversionError::ToolFailed { status, stderr } => match status {
                Some(code) => format!("Converter error (exit status {}): {}", code, stderr.trim()),
                None => format!("Converter error (terminated by signal): {}", stderr.trim()),
            },
            ConversionError::MissingOutput { path } => {
                format!("Converter produced no output at {}", path)
            }
            ConversionError::Io { reason } => format!("Conversion I/O error: {}", reason),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConversionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConversionError {}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::Io {
            reason: err.to_string(),
        }
    }
}

/// Errors raised while decoding a canonical waveform
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// File missing or not a readable WAV container
    Open { path: String, reason: String },

    /// Sample data could not be read
    Read { reason: String },

    /// Bit depth / sample format combination we do not decode
    UnsupportedFormat { bits_per_sample: u16, float: bool },
}

impl ErrorCode for DecodeError {
    fn code(&self) -> i32 {
        match self {
            DecodeError::Open { .. } => DecodeErrorCodes::OPEN_FAILED,
            DecodeError::Read { .. } => DecodeErrorCodes::READ_FAILED,
            DecodeError::UnsupportedFormat { .. } => DecodeErrorCodes::UNSUPPORTED_FORMAT,
        }
    }

    fn message(&self) -> String {
        match self {
            DecodeError::Open { path, reason } => {
                format!("Failed to open waveform {}: {}", path, reason)
            }
            DecodeError::Read { reason } => format!("Failed to read samples: {}", reason),
            DecodeError::UnsupportedFormat {
                bits_per_sample,
                float,
            } => format!(
                "Unsupported sample format: {}-bit {}",
                bits_per_sample,
                if *float { "float" } else { "integer" }
            ),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DecodeError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DecodeError {}
