//! Configuration management for the analysis service
//!
//! This module provides runtime configuration loading from JSON files plus
//! environment overrides, so deployment details (port, working directories,
//! converter binary) can change without recompilation. Analysis parameters
//! live here too, next to their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub converter: ConverterConfig,
    pub analysis: AnalysisConfig,
}

/// HTTP transport parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Listening port
    pub port: u16,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
    /// Number of requests analysed concurrently
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
            workers: 6,
        }
    }
}

/// Working directories for transient per-request files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Staging directory for raw uploads
    pub upload_dir: PathBuf,
    /// Output directory for canonical WAV copies
    pub converted_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            converted_dir: PathBuf::from("converted"),
        }
    }
}

/// External converter invocation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Converter executable (looked up on PATH when not absolute)
    pub program: String,
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// Target PCM codec
    pub codec: String,
    /// Fixed output channel count; `None` preserves the input layout
    pub channels: Option<u16>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            sample_rate: 44_100,
            codec: "pcm_s16le".to_string(),
            channels: None,
        }
    }
}

/// Pitch extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Lowest F0 searched (bass floor)
    pub fmin: f32,
    /// Highest F0 searched (soprano ceiling)
    pub fmax: f32,
    /// Frames quieter than this many dB below the loudest frame are silence
    pub top_db: f32,
    /// Minimum usable signal duration in seconds
    pub min_duration_secs: f32,
    /// Analysis frame length in samples
    pub frame_length: usize,
    /// Hop between frames in samples
    pub hop_length: usize,
    /// Normalised difference a YIN trough must fall under to count as voiced
    pub trough_threshold: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fmin: 60.0,
            fmax: 1000.0,
            top_db: 20.0,
            min_duration_secs: 0.5,
            frame_length: 2048,
            hop_length: 512,
            trough_threshold: 0.1,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Sections or fields missing from the file take their defaults. A file
    /// that is missing or not valid JSON yields the full default config.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration for the running process
    ///
    /// Reads the file named by `VOCALCOACH_CONFIG` when set, then applies
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = match std::env::var("VOCALCOACH_CONFIG") {
            Ok(path) => Self::load_from_file(path),
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply environment-style overrides from a lookup function
    ///
    /// Unparseable numeric values are logged and ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = parse_override::<u16>(&lookup, "PORT") {
            self.server.port = port;
        }
        if let Some(host) = lookup("VOCALCOACH_HOST") {
            self.server.host = host;
        }
        if let Some(limit) = parse_override::<usize>(&lookup, "VOCALCOACH_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = limit;
        }
        if let Some(workers) = parse_override::<usize>(&lookup, "VOCALCOACH_WORKERS") {
            self.server.workers = workers.max(1);
        }
        if let Some(dir) = lookup("VOCALCOACH_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("VOCALCOACH_CONVERTED_DIR") {
            self.storage.converted_dir = PathBuf::from(dir);
        }
        if let Some(program) = lookup("VOCALCOACH_FFMPEG") {
            self.converter.program = program;
        }
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[Config] Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}
