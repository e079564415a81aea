//! Config file discovery and layered loading.
//!
//! 1. Parse embedded `defaults.toml` → base
//! 2. Merge `<home>/config.toml` (user)
//! 3. Merge `<workspace>/.quiver/config.toml` (workspace)
//! 4. Apply environment overrides (`QUIVER_INSTALL_ROOT`, `QUIVER_LOG`)
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dirs::{QuiverHome, workspace_config_path};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Overrides `packages.install_root`.
pub const INSTALL_ROOT_ENV_VAR: &str = "QUIVER_INSTALL_ROOT";

/// Overrides `logging.level`.
pub const LOG_ENV_VAR: &str = "QUIVER_LOG";

/// A loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The merged, validated configuration.
    pub config: Config,
    /// The home directory used for user-level lookups.
    pub home: QuiverHome,
    /// Config files that contributed, in merge order.
    pub loaded_files: Vec<PathBuf>,
    /// Environment variables that overrode a key.
    pub env_overrides: Vec<&'static str>,
}

impl ResolvedConfig {
    /// The effective install root: the configured override or `<home>/packages`.
    #[must_use]
    pub fn install_root(&self) -> PathBuf {
        self.config
            .packages
            .install_root
            .clone()
            .unwrap_or_else(|| self.home.packages_dir())
    }
}

/// Load the configuration with layered precedence.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a config file is malformed or the merged
/// result fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home: &QuiverHome,
    env: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut loaded_files = Vec::new();

    let user_path = home.config_path();
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge(&mut merged, &overlay);
        info!(path = %user_path.display(), "loaded user config");
        loaded_files.push(user_path);
    }

    if let Some(ws_root) = workspace_root {
        let ws_path = workspace_config_path(ws_root);
        if let Some(overlay) = try_load_file(&ws_path)? {
            deep_merge(&mut merged, &overlay);
            info!(path = %ws_path.display(), "loaded workspace config");
            loaded_files.push(ws_path);
        }
    }

    let env_overrides = apply_env_overrides(&mut merged, env);

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        home: home.clone(),
        loaded_files,
        env_overrides,
    })
}

/// Recursively deep-merge `overlay` into `base`.
///
/// Tables merge per key; scalars and arrays from the overlay replace the base.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

fn apply_env_overrides(
    merged: &mut toml::Value,
    env: &HashMap<String, String>,
) -> Vec<&'static str> {
    let mut applied = Vec::new();
    if let Some(root) = env.get(INSTALL_ROOT_ENV_VAR).filter(|v| !v.is_empty()) {
        set_key(merged, "packages", "install_root", root);
        debug!(var = INSTALL_ROOT_ENV_VAR, "applied environment override");
        applied.push(INSTALL_ROOT_ENV_VAR);
    }
    if let Some(level) = env.get(LOG_ENV_VAR).filter(|v| !v.is_empty()) {
        set_key(merged, "logging", "level", level);
        debug!(var = LOG_ENV_VAR, "applied environment override");
        applied.push(LOG_ENV_VAR);
    }
    applied
}

fn set_key(merged: &mut toml::Value, section: &str, key: &str, value: &str) {
    let Some(root) = merged.as_table_mut() else {
        return;
    };
    let table = root
        .entry(section)
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = table.as_table_mut() {
        table.insert(key.to_owned(), toml::Value::String(value.to_owned()));
    }
}

/// Read and parse a TOML file, returning `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}
