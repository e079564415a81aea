#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration for the quiver tool package manager.
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment** (`QUIVER_INSTALL_ROOT`, `QUIVER_LOG`)
//! 2. **Workspace** (`{workspace}/.quiver/config.toml`)
//! 3. **User** (`~/.quiver/config.toml`)
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! ```rust,no_run
//! use quiver_config::{Config, QuiverHome};
//!
//! let home = QuiverHome::resolve().unwrap();
//! let resolved = Config::load(Some(std::path::Path::new(".")), &home).unwrap();
//! println!("installing into {}", resolved.install_root().display());
//! ```

/// Home directory layout.
pub mod dirs;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use dirs::QuiverHome;
pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use types::*;

impl Config {
    /// Load configuration using the process environment for overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(
        workspace_root: Option<&std::path::Path>,
        home: &QuiverHome,
    ) -> ConfigResult<ResolvedConfig> {
        let env: std::collections::HashMap<String, String> = std::env::vars().collect();
        loader::load(workspace_root, home, &env)
    }
}
