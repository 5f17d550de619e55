// Startup - process-wide initialization, run once by each binary

use std::fs;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::StorageConfig;

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, defaulting to `info`. `log` records from library code
/// are bridged into tracing. Output goes to stderr so CLI stdout stays
/// machine-readable. Calling this twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        log::debug!("[Startup] Logging already initialized");
    }
}

/// Create both working directories if they are missing
pub fn prepare_directories(storage: &StorageConfig) -> anyhow::Result<()> {
    for dir in [&storage.upload_dir, &storage.converted_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating working directory {}", dir.display()))?;
    }
    log::info!(
        "[Startup] Working directories ready: uploads={} converted={}",
        storage.upload_dir.display(),
        storage.converted_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_directories_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            upload_dir: root.path().join("a/uploads"),
            converted_dir: root.path().join("b/converted"),
        };

        prepare_directories(&storage).unwrap();
        prepare_directories(&storage).unwrap();

        assert!(storage.upload_dir.is_dir());
        assert!(storage.converted_dir.is_dir());
    }

    #[test]
    fn test_prepare_directories_reports_blocked_path() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let storage = StorageConfig {
            upload_dir: blocker.join("uploads"),
            converted_dir: root.path().join("converted"),
        };

        let err = prepare_directories(&storage).unwrap_err();
        assert!(format!("{:#}", err).contains("creating working directory"));
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
