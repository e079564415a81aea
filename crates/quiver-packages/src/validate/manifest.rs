use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use super::is_package_relative;
use crate::manifest::{
    AuthKind, ENDPOINT_KIND_HTTP, Endpoint, HttpMethod, Manifest, validate_tool_id,
};
use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::validation::ValidationResult;

/// Validates manifests.
#[derive(Clone)]
pub struct ManifestValidator {
    schemas: Arc<dyn SchemaValidator>,
}

impl Default for ManifestValidator {
    fn default() -> Self {
        Self::new(Arc::new(JsonSchemaValidator))
    }
}

impl std::fmt::Debug for ManifestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestValidator").finish_non_exhaustive()
    }
}

impl ManifestValidator {
    /// Create a validator using the given schema capability.
    #[must_use]
    pub fn new(schemas: Arc<dyn SchemaValidator>) -> Self {
        Self { schemas }
    }

    /// The schema capability shared with test-case validation.
    #[must_use]
    pub fn schemas(&self) -> Arc<dyn SchemaValidator> {
        Arc::clone(&self.schemas)
    }

    /// Validate a manifest, collecting every error and warning.
    #[must_use]
    pub fn validate(&self, manifest: &Manifest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if manifest.tool_id.trim().is_empty() {
            result.error("toolId is required");
        } else if let Err(reason) = validate_tool_id(&manifest.tool_id) {
            result.error(reason);
        }

        if manifest.version.trim().is_empty() {
            result.error("version is required");
        } else if let Err(e) = semver::Version::parse(&manifest.version) {
            result.error(format!(
                "version '{}' is not a valid semantic version (MAJOR.MINOR.PATCH[-prerelease][+build]): {e}",
                manifest.version
            ));
        }

        if manifest.name.trim().is_empty() {
            result.error("name is required");
        }
        if manifest.description.trim().is_empty() {
            result.error("description is required");
        }

        if manifest.capabilities.is_empty() {
            result.error("capabilities must list at least one capability");
        }
        for (i, capability) in manifest.capabilities.iter().enumerate() {
            if capability.trim().is_empty() {
                result.error(format!("capabilities[{i}] must not be empty"));
            }
        }

        match &manifest.endpoint {
            Some(endpoint) => check_endpoint(endpoint, &mut result),
            None => result.error("endpoint is required"),
        }

        self.check_schema_field("inputSchema", manifest.input_schema.as_ref(), &mut result);
        self.check_schema_field("outputSchema", manifest.output_schema.as_ref(), &mut result);

        if let Some(auth) = &manifest.auth {
            match auth.auth_kind() {
                None => result.error(format!(
                    "auth.type '{}' is not one of: {}",
                    auth.kind,
                    AuthKind::ALL.map(AuthKind::as_str).join(", ")
                )),
                Some(AuthKind::None) => {},
                Some(kind) if auth.env_names().is_empty() => result.warning(format!(
                    "auth.type '{kind}' lists no configHints.env variables; tests will run unauthenticated"
                )),
                Some(_) => {},
            }
        }

        match &manifest.tests {
            None => result.warning("no tests defined"),
            Some(paths) => check_relative_paths("tests", paths, &mut result),
        }
        match &manifest.examples {
            None => result.warning("no examples defined"),
            Some(paths) => check_relative_paths("examples", paths, &mut result),
        }
        if manifest.meta.is_none() {
            result.warning("no meta defined");
        }

        result
    }

    /// Parse and validate a manifest file.
    ///
    /// A missing or unparseable file is reported as a failed result.
    #[must_use]
    pub fn validate_file(&self, path: &Path) -> ValidationResult {
        match Manifest::from_path(path) {
            Ok(manifest) => self.validate(&manifest),
            Err(e) => ValidationResult::failure(e.to_string()),
        }
    }

    fn check_schema_field(&self, field: &str, schema: Option<&Value>, result: &mut ValidationResult) {
        let Some(schema) = schema else {
            result.error(format!("{field} is required"));
            return;
        };
        if let Err(e) = self.schemas.check_schema(schema) {
            result.error(format!("{field} is not a valid JSON Schema: {e}"));
            return;
        }
        if schema.get("type").is_none() {
            result.error(format!("{field} must declare a 'type'"));
        }
    }
}

fn check_endpoint(endpoint: &Endpoint, result: &mut ValidationResult) {
    if endpoint.kind.is_empty() {
        result.error("endpoint.type is required");
    } else if endpoint.kind != ENDPOINT_KIND_HTTP {
        result.error(format!(
            "endpoint.type '{}' is not supported (expected '{ENDPOINT_KIND_HTTP}')",
            endpoint.kind
        ));
    }

    if endpoint.method.is_empty() {
        result.error("endpoint.method is required");
    } else if HttpMethod::parse(&endpoint.method).is_none() {
        result.error(format!(
            "endpoint.method '{}' is not a standard HTTP method",
            endpoint.method
        ));
    }

    if endpoint.url.is_empty() {
        result.error("endpoint.url is required");
    } else {
        match Url::parse(&endpoint.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {},
            Ok(url) => result.error(format!(
                "endpoint.url '{}' must use http or https (got '{}')",
                endpoint.url,
                url.scheme()
            )),
            Err(e) => result.error(format!(
                "endpoint.url '{}' is not an absolute URL: {e}",
                endpoint.url
            )),
        }
    }

    if let Some(ms) = endpoint.timeout_ms
        && ms <= 0
    {
        result.error(format!("endpoint.timeoutMs must be positive (got {ms})"));
    }
}

fn check_relative_paths(field: &str, paths: &[String], result: &mut ValidationResult) {
    for (i, path) in paths.iter().enumerate() {
        if !is_package_relative(path) {
            result.error(format!(
                "{field}[{i}] '{path}' must be a relative path inside the package"
            ));
        }
    }
}
