//! Tool manifest types.
//!
//! A manifest (`manifest.json` at the package root) describes one callable
//! tool: its identity, network endpoint, input/output JSON Schemas, auth
//! requirements, and relative references to test-case and example files.
//!
//! Required scalar fields deserialize to empty defaults so that a document
//! missing `toolId` still parses and the validator can report
//! "`toolId` is required" alongside every other problem.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PackageError, PackageResult};

/// Standard manifest file name at the package root.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// The only endpoint `type` currently supported.
pub const ENDPOINT_KIND_HTTP: &str = "http";

/// Dot-separated lowercase segments, at least two of them.
static TOOL_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9_]*(\.[a-z0-9][a-z0-9_]*)+$").unwrap_or_else(|e| {
        unreachable!("tool id pattern is a valid regex: {e}")
    })
});

/// A tool manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Dotted identity, e.g. `stripe.payments.create_charge`.
    #[serde(default)]
    pub tool_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Semantic version string.
    #[serde(default)]
    pub version: String,
    /// What the tool does, written for the consuming model.
    #[serde(default)]
    pub description: String,
    /// Ordered capability tags.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Where and how the tool is called.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    /// JSON Schema for the request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    /// JSON Schema for the response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    /// Authentication requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
    /// Relative paths to test-case files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<String>>,
    /// Relative paths to free-form example documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    /// Publisher metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PackageMeta>,
}

/// Network endpoint of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Endpoint kind; only [`ENDPOINT_KIND_HTTP`] is supported.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// HTTP verb.
    #[serde(default)]
    pub method: String,
    /// Absolute `http`/`https` URL.
    #[serde(default)]
    pub url: String,
    /// Default per-call timeout. Signed so that a negative value reaches the
    /// validator instead of failing the parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,
}

impl Endpoint {
    /// The endpoint timeout, if set and positive.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        positive_millis(self.timeout_ms)
    }
}

/// Authentication requirements of a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// One of `none`, `bearer`, `api_key`, `oauth2`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// OAuth scopes, informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Where credentials come from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hints: Option<AuthConfigHints>,
}

impl AuthConfig {
    /// The parsed auth kind, or `None` for an unknown `type`.
    #[must_use]
    pub fn auth_kind(&self) -> Option<AuthKind> {
        AuthKind::parse(&self.kind)
    }

    /// Environment variable names to search for a credential, in order.
    #[must_use]
    pub fn env_names(&self) -> &[String] {
        self.config_hints
            .as_ref()
            .map_or(&[], |hints| hints.env.as_slice())
    }
}

/// Free-form hints on how to obtain credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfigHints {
    /// Environment variable names that may hold the credential.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    /// Documentation URL for obtaining credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Header name for `api_key` auth. Defaults to `X-API-Key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Any other publisher-defined hints.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The fixed set of auth kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    /// No credentials.
    None,
    /// `Authorization: Bearer <token>`.
    Bearer,
    /// A key in a dedicated header.
    ApiKey,
    /// OAuth 2.0; the runner only forwards an already-issued token.
    OAuth2,
}

impl AuthKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 4] = [Self::None, Self::Bearer, Self::ApiKey, Self::OAuth2];

    /// Parse the manifest string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "bearer" => Some(Self::Bearer),
            "api_key" => Some(Self::ApiKey),
            "oauth2" => Some(Self::OAuth2),
            _ => None,
        }
    }

    /// The manifest string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bearer => "bearer",
            Self::ApiKey => "api_key",
            Self::OAuth2 => "oauth2",
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard HTTP verbs accepted in `endpoint.method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// Parse a verb, ignoring ASCII case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// The equivalent `reqwest` method.
    #[must_use]
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Publisher metadata. Only informational.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMeta {
    /// Publisher identity (a name string or a structured object).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Value>,
    /// SPDX license expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Project homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Any other publisher-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Load a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::ManifestNotFound`] if the file is absent and
    /// [`PackageError::ManifestParse`] if it cannot be read or parsed.
    pub fn from_path(path: &Path) -> PackageResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PackageError::ManifestNotFound(path.to_path_buf()));
            },
            Err(e) => {
                return Err(PackageError::ManifestParse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            },
        };

        serde_json::from_str(&content).map_err(|e| PackageError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Test-case paths, empty when none are declared.
    #[must_use]
    pub fn test_paths(&self) -> &[String] {
        self.tests.as_deref().unwrap_or_default()
    }

    /// Example paths, empty when none are declared.
    #[must_use]
    pub fn example_paths(&self) -> &[String] {
        self.examples.as_deref().unwrap_or_default()
    }
}

/// Check a tool id against the dotted-segment pattern.
///
/// # Errors
///
/// Returns a human-readable reason when the id does not match.
pub fn validate_tool_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("toolId must not be empty".into());
    }
    if !TOOL_ID_PATTERN.is_match(id) {
        return Err(format!(
            "toolId '{id}' must be two or more dot-separated segments of lowercase letters, digits and underscores (e.g. publisher.domain.capability)"
        ));
    }
    Ok(())
}

/// Reject tool ids that cannot serve as a single directory name.
///
/// Applied by the installer even when manifest validation is skipped, so an
/// unvalidated id cannot escape the install root.
///
/// # Errors
///
/// Returns [`PackageError::InvalidToolId`] for empty ids, separators, `.`/`..`
/// and control characters.
pub fn ensure_path_safe_tool_id(id: &str) -> PackageResult<()> {
    let reason = if id.is_empty() {
        Some("must not be empty")
    } else if id == "." || id == ".." || id.starts_with('.') {
        Some("must not start with '.'")
    } else if id.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if id.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PackageError::InvalidToolId {
            id: id.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn positive_millis(ms: Option<i64>) -> Option<Duration> {
    ms.and_then(|v| u64::try_from(v).ok())
        .filter(|v| *v > 0)
        .map(Duration::from_millis)
}
