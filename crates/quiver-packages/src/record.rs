//! Persisted install record.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PackageError, PackageResult};

/// File name of the install record inside each install directory.
pub const PACKAGE_INFO_FILE_NAME: &str = "package-info.json";

/// Record of one installed package.
///
/// Written at the end of a successful install, overwritten on reinstall,
/// removed with the install directory on uninstall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    /// Tool identity from the manifest.
    pub tool_id: String,
    /// Version from the manifest.
    pub version: String,
    /// Human-readable name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Directory holding the installed files.
    pub install_path: PathBuf,
    /// When the install completed.
    pub installed_at: DateTime<Utc>,
    /// Capability tags from the manifest.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Where the archive came from. Absent in records written without provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PackageSource>,
    /// Blake3 digest of the installed archive (prefixed with `blake3:`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_digest: Option<String>,
}

impl PackageInfo {
    /// Path of the record file inside `install_dir`.
    #[must_use]
    pub fn path_in(install_dir: &Path) -> PathBuf {
        install_dir.join(PACKAGE_INFO_FILE_NAME)
    }

    /// Write the record into its install directory.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Serialization`] or [`PackageError::Io`].
    pub fn save(&self) -> PackageResult<()> {
        let path = Self::path_in(&self.install_path);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|e| PackageError::io(path, e))
    }
}

/// Where an installed archive came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PackageSource {
    /// A local archive path.
    Local(String),
    /// A remote archive URL.
    Url(String),
}

impl fmt::Display for PackageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "local:{path}"),
            Self::Url(url) => write!(f, "url:{url}"),
        }
    }
}

impl From<PackageSource> for String {
    fn from(source: PackageSource) -> Self {
        source.to_string()
    }
}

impl TryFrom<String> for PackageSource {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("invalid package source: {s}"))
    }
}

impl PackageSource {
    /// Parse `local:<path>` or `url:<url>`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (prefix, value) = s.split_once(':')?;
        match prefix {
            "local" => Some(Self::Local(value.to_string())),
            "url" => Some(Self::Url(value.to_string())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dir: &Path) -> PackageInfo {
        PackageInfo {
            tool_id: "demo.echo".into(),
            version: "1.0.0".into(),
            name: "Echo".into(),
            description: "Echoes".into(),
            install_path: dir.to_path_buf(),
            installed_at: Utc::now(),
            capabilities: vec!["echo".into()],
            source: Some(PackageSource::Url("https://example.com/echo.tpkg".into())),
            archive_digest: Some("blake3:00".into()),
        }
    }

    #[test]
    fn source_display_and_parse() {
        let url = PackageSource::Url("https://example.com/a.tpkg".into());
        assert_eq!(url.to_string(), "url:https://example.com/a.tpkg");
        assert_eq!(PackageSource::parse(&url.to_string()), Some(url));
        assert_eq!(
            PackageSource::parse("local:/tmp/a.tpkg"),
            Some(PackageSource::Local("/tmp/a.tpkg".into()))
        );
        assert_eq!(PackageSource::parse("registry:x"), None);
        assert_eq!(PackageSource::parse("nocolon"), None);
    }

    #[test]
    fn saved_record_reads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let info = sample(tmp.path());
        info.save().unwrap();

        let raw = std::fs::read_to_string(PackageInfo::path_in(tmp.path())).unwrap();
        assert!(raw.contains("\"toolId\": \"demo.echo\""));
        assert!(raw.contains("\"source\": \"url:https://example.com/echo.tpkg\""));
        let back: PackageInfo = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn record_without_provenance_parses() {
        let raw = r#"{"toolId":"demo.echo","version":"1.0.0","name":"Echo","description":"d",
            "installPath":"/x","installedAt":"2026-01-01T00:00:00Z","capabilities":[]}"#;
        let info: PackageInfo = serde_json::from_str(raw).unwrap();
        assert!(info.source.is_none());
        assert!(info.archive_digest.is_none());
    }
}
