//! Service health probe.
//!
//! Reports converter availability and whether both working directories
//! accept writes. Probing leaves nothing behind: the marker file written to
//! test a directory is removed immediately.

use std::fs;
use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use crate::audio::FormatConverter;
use crate::config::StorageConfig;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StorageStatus {
    pub upload_folder: bool,
    pub converted_folder: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceChecks {
    /// `"available"` or `"unavailable"`
    pub converter: &'static str,
    pub storage: StorageStatus,
}

/// Body of `GET /health` and of `vocalcoach_cli status`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceStatus {
    /// `"healthy"` when every check passes, `"degraded"` otherwise
    pub status: &'static str,
    pub timestamp: String,
    pub services: ServiceChecks,
}

impl ServiceStatus {
    pub fn probe(converter: &dyn FormatConverter, storage: &StorageConfig) -> Self {
        let converter_ok = converter.is_available();
        let storage = StorageStatus {
            upload_folder: is_writable_dir(&storage.upload_dir),
            converted_folder: is_writable_dir(&storage.converted_dir),
        };
        let healthy = converter_ok && storage.upload_folder && storage.converted_folder;

        if !healthy {
            log::warn!(
                "[Status] Degraded: converter={} upload_folder={} converted_folder={}",
                converter_ok,
                storage.upload_folder,
                storage.converted_folder
            );
        }

        Self {
            status: if healthy { "healthy" } else { "degraded" },
            timestamp: chrono::Local::now().to_rfc3339(),
            services: ServiceChecks {
                converter: if converter_ok { "available" } else { "unavailable" },
                storage,
            },
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Whether `dir` exists and a file can be created in it
pub fn is_writable_dir(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let marker = dir.join(format!(".probe-{}", Uuid::new_v4().simple()));
    match fs::write(&marker, b"") {
        Ok(()) => {
            if let Err(err) = fs::remove_file(&marker) {
                log::warn!("[Status] Could not remove probe {}: {}", marker.display(), err);
            }
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PassthroughConverter;
    use crate::error::ConversionError;

    struct MissingConverter;

    impl FormatConverter for MissingConverter {
        fn convert(&self, _input: &Path, _output: &Path) -> Result<(), ConversionError> {
            Err(ConversionError::Spawn {
                program: "ffmpeg".to_string(),
                reason: "not found".to_string(),
            })
        }
        fn is_available(&self) -> bool {
            false
        }
        fn name(&self) -> &str {
            "missing"
        }
    }

    fn storage_in(root: &Path) -> StorageConfig {
        StorageConfig {
            upload_dir: root.join("uploads"),
            converted_dir: root.join("converted"),
        }
    }

    #[test]
    fn test_healthy_when_everything_is_available() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path());
        fs::create_dir(&storage.upload_dir).unwrap();
        fs::create_dir(&storage.converted_dir).unwrap();

        let status = ServiceStatus::probe(&PassthroughConverter, &storage);

        assert!(status.is_healthy());
        assert_eq!(status.services.converter, "available");
        assert_eq!(fs::read_dir(&storage.upload_dir).unwrap().count(), 0);
        assert_eq!(fs::read_dir(&storage.converted_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_degraded_without_converter_or_directory() {
        let root = tempfile::tempdir().unwrap();
        let storage = storage_in(root.path());
        fs::create_dir(&storage.upload_dir).unwrap();

        let status = ServiceStatus::probe(&MissingConverter, &storage);

        assert_eq!(status.status, "degraded");
        assert_eq!(status.services.converter, "unavailable");
        assert!(status.services.storage.upload_folder);
        assert!(!status.services.storage.converted_folder);
    }

    #[test]
    fn test_json_shape() {
        let root = tempfile::tempdir().unwrap();
        let status = ServiceStatus::probe(&PassthroughConverter, &storage_in(root.path()));
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["status"], "degraded");
        assert!(json["timestamp"].is_string());
        assert_eq!(json["services"]["converter"], "available");
        assert_eq!(json["services"]["storage"]["upload_folder"], false);
    }
}
