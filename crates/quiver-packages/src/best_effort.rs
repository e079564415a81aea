//! Best-effort loading: a missing or unreadable file is not an error.
//!
//! Listing installs, loading installed manifests, and reading examples and
//! test cases for export all tolerate bad files by skipping them. The
//! diagnostic explaining the skip is kept so callers and tests can inspect it.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

/// An optional value plus the reason it is absent.
#[derive(Debug)]
pub struct BestEffort<T> {
    /// The loaded value, if loading succeeded.
    pub value: Option<T>,
    /// Why loading failed. `None` on success.
    pub diagnostic: Option<String>,
}

impl<T> BestEffort<T> {
    /// A successful load.
    #[must_use]
    pub fn loaded(value: T) -> Self {
        Self {
            value: Some(value),
            diagnostic: None,
        }
    }

    /// A skipped load with its reason.
    #[must_use]
    pub fn skipped(diagnostic: impl Into<String>) -> Self {
        Self {
            value: None,
            diagnostic: Some(diagnostic.into()),
        }
    }

    /// Keep loaded values that satisfy `check`; others become skips carrying
    /// the check's message.
    #[must_use]
    pub fn and_check(self, check: impl FnOnce(&T) -> Result<(), String>) -> Self {
        match self.value {
            Some(value) => match check(&value) {
                Ok(()) => Self::loaded(value),
                Err(reason) => Self::skipped(reason),
            },
            None => self,
        }
    }

    /// Drop the diagnostic after logging it at `debug`.
    pub fn into_option(self) -> Option<T> {
        if let Some(diagnostic) = &self.diagnostic {
            debug!(%diagnostic, "best-effort load skipped");
        }
        self.value
    }
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> BestEffort<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return BestEffort::skipped(format!("{}: {e}", path.display())),
    };
    match serde_json::from_str(&content) {
        Ok(value) => BestEffort::loaded(value),
        Err(e) => BestEffort::skipped(format!("{}: {e}", path.display())),
    }
}

/// Read a file as UTF-8 text.
pub fn read_text(path: &Path) -> BestEffort<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => BestEffort::loaded(text),
        Err(e) => BestEffort::skipped(format!("{}: {e}", path.display())),
    }
}
