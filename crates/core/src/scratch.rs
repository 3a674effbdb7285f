//! Temporary files that are removed when their guard goes out of scope.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Owns a path on disk for the lifetime of the guard.
///
/// The file does not need to exist; whatever is at the path when the guard
/// drops is removed, on success, error and unwind alike.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Claim `path`, creating its parent directory if needed.
    pub fn claim(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove scratch file {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("img").join("42.png");
        {
            let scratch = ScratchFile::claim(&path).unwrap();
            std::fs::write(scratch.path(), b"png").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_fine() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never-written.png");
        let scratch = ScratchFile::claim(&path).unwrap();
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_removed_on_unwind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("panic.png");
        let inner = path.clone();
        let result = std::panic::catch_unwind(move || {
            let scratch = ScratchFile::claim(&inner).unwrap();
            std::fs::write(scratch.path(), b"png").unwrap();
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
