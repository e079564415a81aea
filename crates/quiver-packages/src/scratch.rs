//! Scoped temporary directories for extraction and downloads.

use std::path::Path;

use tempfile::TempDir;
use tracing::debug;

use crate::error::{PackageError, PackageResult};

/// A temporary directory removed when dropped, on every exit path.
///
/// Removal failures are logged at `debug` and otherwise ignored; they must
/// never replace the result of the operation that owned the directory.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Create a scratch directory under the system temp location.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Io`] if the directory cannot be created.
    pub fn new(purpose: &str) -> PackageResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("quiver-{purpose}-"))
            .tempdir()
            .map_err(|e| PackageError::io(std::env::temp_dir(), e))?;
        debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir: Some(dir) })
    }

    /// The directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map_or_else(|| Path::new(""), TempDir::path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                debug!(path = %path.display(), error = %e, "failed to remove scratch directory");
            }
        }
    }
}
