//! The quiver home directory.
//!
//! ```text
//! ~/.quiver/                 (QuiverHome, or $QUIVER_HOME)
//! ├── config.toml            (user config)
//! └── packages/              (default install root)
//!     └── <tool-id>/
//!         ├── manifest.json
//!         └── package-info.json
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the home directory.
pub const HOME_ENV_VAR: &str = "QUIVER_HOME";

/// Global quiver state directory (`~/.quiver/` or `$QUIVER_HOME`).
#[derive(Debug, Clone)]
pub struct QuiverHome {
    root: PathBuf,
}

impl QuiverHome {
    /// Resolve the home directory.
    ///
    /// Checks `$QUIVER_HOME` first, then falls back to `$HOME/.quiver/`.
    ///
    /// # Errors
    ///
    /// Returns an error if `$QUIVER_HOME` is relative, or if neither it nor
    /// `$HOME` is set.
    pub fn resolve() -> io::Result<Self> {
        if let Ok(custom) = std::env::var(HOME_ENV_VAR) {
            let root = PathBuf::from(custom);
            if !root.is_absolute() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "QUIVER_HOME must be an absolute path",
                ));
            }
            return Ok(Self { root });
        }

        let home = std::env::var("HOME").map_err(|_| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "neither QUIVER_HOME nor HOME environment variable is set",
            )
        })?;
        Ok(Self {
            root: PathBuf::from(home).join(".quiver"),
        })
    }

    /// Create from an explicit path (useful for testing).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// User-level config file (`~/.quiver/config.toml`).
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Default install root (`~/.quiver/packages/`).
    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    /// Create the home and packages directories if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.packages_dir())
    }
}

/// Workspace-level config file (`<workspace>/.quiver/config.toml`).
#[must_use]
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".quiver").join("config.toml")
}
