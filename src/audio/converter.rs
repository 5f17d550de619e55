// Converter module - normalization of arbitrary uploads to canonical WAV
//
// The NormalizationStage owns the output directory and the naming rule; the
// FormatConverter does the actual transcoding. The stage never deletes its
// input and never retries.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::config::ConverterConfig;
use crate::error::{log_media_error, ConversionError};

/// Transcodes one audio file into canonical linear-PCM WAV
pub trait FormatConverter: Send + Sync {
    /// Write the canonical version of `input` to `output`
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError>;

    /// Whether the converter can currently run
    fn is_available(&self) -> bool;

    /// Short name for logs and status reports
    fn name(&self) -> &str;
}

/// Converter that shells out to `ffmpeg`
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    program: String,
    codec: String,
    sample_rate: u32,
    channels: Option<u16>,
}

impl FfmpegConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            codec: config.codec.clone(),
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }

    /// Argument list for one conversion
    pub fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-acodec".to_string(),
            self.codec.clone(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
        ];
        if let Some(channels) = self.channels {
            args.push("-ac".to_string());
            args.push(channels.to_string());
        }
        args.push(output.to_string_lossy().into_owned());
        args.push("-y".to_string());
        args
    }
}

impl FormatConverter for FfmpegConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let result = Command::new(&self.program)
            .args(self.args(input, output))
            .stdin(Stdio::null())
            .output()
            .map_err(|err| ConversionError::Spawn {
                program: self.program.clone(),
                reason: err.to_string(),
            })?;

        if !result.status.success() {
            return Err(ConversionError::ToolFailed {
                status: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Converter for uploads that are already canonical WAV
///
/// Copies the file byte-for-byte; decoding will reject anything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughConverter;

impl FormatConverter for PassthroughConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        fs::copy(input, output)?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

/// Drives a converter with a fixed output directory and naming rule
#[derive(Clone)]
pub struct NormalizationStage {
    converter: Arc<dyn FormatConverter>,
    output_dir: PathBuf,
}

impl NormalizationStage {
    pub fn new(converter: Arc<dyn FormatConverter>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            converter,
            output_dir: output_dir.into(),
        }
    }

    pub fn converter(&self) -> &Arc<dyn FormatConverter> {
        &self.converter
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Canonical output location for `input`: `<output_dir>/<input stem>.wav`
    ///
    /// Request-unique as long as the input name is. Never equal to `input`:
    /// a WAV upload staged in the output directory gets a `_canonical` suffix.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let output = self.output_dir.join(format!("{}.wav", stem));
        if output == input {
            self.output_dir.join(format!("{}_canonical.wav", stem))
        } else {
            output
        }
    }

    /// Convert `input` and return the canonical WAV path
    pub fn normalize(&self, input: &Path) -> Result<PathBuf, ConversionError> {
        let output = self.output_path_for(input);
        self.normalize_to(input, &output)?;
        Ok(output)
    }

    /// Convert `input` into an output path chosen by the caller
    pub fn normalize_to(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let result = self.converter.convert(input, output).and_then(|()| {
            if output.is_file() {
                Ok(())
            } else {
                Err(ConversionError::MissingOutput {
                    path: output.display().to_string(),
                })
            }
        });
        if let Err(err) = &result {
            log_media_error(err, self.converter.name(), &input.display().to_string());
            return result;
        }

        log::info!(
            "[Normalization] Converted {} → {} via {}",
            input.display(),
            output.display(),
            self.converter.name()
        );
        Ok(())
    }
}
