//! Package error types.

use std::path::PathBuf;

/// Errors from package operations.
///
/// Create and install surface these to callers through
/// [`ValidationResult`](crate::ValidationResult) rather than `Err`; the variants
/// still carry the detail that ends up in the message.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// No manifest file where one was required.
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// A manifest file exists but is not valid JSON for a manifest.
    #[error("manifest parse error in {path}: {message}")]
    ManifestParse {
        /// Path to the manifest file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// A test-case file exists but is not valid JSON for a test case.
    #[error("test case parse error in {path}: {message}")]
    TestCaseParse {
        /// Path to the test-case file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// The tool id cannot be used as an install directory name.
    #[error("invalid tool id '{id}': {reason}")]
    InvalidToolId {
        /// The offending id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Reading or writing a package archive failed.
    #[error("archive error: {message}")]
    Archive {
        /// Description of the failure.
        message: String,
    },

    /// Unsafe entry type in archive (symlink, hardlink, device node).
    #[error("unsafe archive entry type '{entry_type}' at {path}")]
    UnsafeEntryType {
        /// The entry type that was rejected.
        entry_type: String,
        /// The path of the entry.
        path: String,
    },

    /// Path traversal detected in archive entry.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path.
        path: String,
    },

    /// Downloaded archive exceeds the configured limit.
    #[error("package too large: {size} bytes (limit: {limit} bytes)")]
    PackageTooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Maximum allowed size in bytes.
        limit: u64,
    },

    /// Fetching a remote package failed.
    #[error("download failed for {url}: {message}")]
    Download {
        /// The URL being fetched.
        url: String,
        /// Failure reason.
        message: String,
    },

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error with the path it happened on.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl PackageError {
    /// Attach a path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for package operations.
pub type PackageResult<T> = Result<T, PackageError>;
