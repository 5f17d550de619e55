//! Per-request scratch files.
//!
//! Every path a request writes is registered with its [`RequestFiles`] guard
//! before the write happens, so partial outputs are covered too. The guard
//! removes everything when it is dropped, which includes unwinding.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Scoped owner of the files created for one request
#[derive(Debug, Default)]
pub struct RequestFiles {
    paths: Vec<PathBuf>,
}

impl RequestFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `path`; it is deleted when the guard is released
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every registered file now
    ///
    /// Files that were never created are skipped silently; other failures are
    /// logged and do not stop the remaining deletions.
    pub fn release(&mut self) {
        for path in self.paths.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("[RequestFiles] Removed {}", path.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    log::warn!("[RequestFiles] Failed to remove {}: {}", path.display(), err)
                }
            }
        }
    }
}

impl Drop for RequestFiles {
    fn drop(&mut self) {
        self.release();
    }
}

/// Reduce an untrusted filename to a safe single path component
///
/// Non-ASCII characters are dropped, separators and whitespace runs become
/// `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or trailing
/// `.`/`_` are stripped. The result may be empty.
pub fn sanitize_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Collision-free staging location for an upload
pub fn staged_path(upload_dir: &Path, filename: &str) -> PathBuf {
    let id = Uuid::new_v4().simple().to_string();
    upload_dir.join(sanitize_filename(&format!("{}_{}", id, filename)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name_unchanged() {
        assert_eq!(sanitize_filename("take-1.mp3"), "take-1.mp3");
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\voice.wav"), "C_Users_me_voice.wav");
    }

    #[test]
    fn test_sanitize_collapses_whitespace_and_drops_non_ascii() {
        assert_eq!(sanitize_filename("my  great\tsong.ogg"), "my_great_song.ogg");
        assert_eq!(sanitize_filename("şarkı.aac"), "ark.aac");
        assert_eq!(sanitize_filename("a$b%c.wav"), "abc.wav");
    }

    #[test]
    fn test_sanitize_can_be_empty() {
        assert_eq!(sanitize_filename("..."), "");
        assert_eq!(sanitize_filename("ğüş"), "");
    }

    #[test]
    fn test_staged_paths_are_unique() {
        let dir = Path::new("/tmp/uploads");
        let a = staged_path(dir, "voice.wav");
        let b = staged_path(dir, "voice.wav");

        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(dir));
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_voice.wav"));
        assert_eq!(name.len(), 32 + "_voice.wav".len());
    }

    #[test]
    fn test_guard_removes_files_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let written = dir.path().join("a.bin");
        fs::write(&written, b"x").unwrap();

        {
            let mut files = RequestFiles::new();
            files.register(&written);
            files.register(dir.path().join("never-created.wav"));
            assert_eq!(files.paths().len(), 2);
        }

        assert!(!written.exists());
    }

    #[test]
    fn test_guard_runs_during_unwind() {
        let dir = tempfile::tempdir().unwrap();
        let written = dir.path().join("b.bin");
        fs::write(&written, b"x").unwrap();

        let path = written.clone();
        let result = std::panic::catch_unwind(move || {
            let mut files = RequestFiles::new();
            files.register(path);
            panic!("stage failed");
        });

        assert!(result.is_err());
        assert!(!written.exists());
    }
}
