//! Package creation from a source folder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::archive::{PACKAGE_EXTENSION, pack_directory};
use crate::error::{PackageError, PackageResult};
use crate::manifest::{MANIFEST_FILE_NAME, Manifest, ensure_path_safe_tool_id};
use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::test_case::TestCase;
use crate::validate::{ManifestValidator, TestCaseValidator};
use crate::validation::ValidationResult;

/// Result of [`PackageCreator::create_package`].
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    /// Accumulated errors and warnings.
    pub validation: ValidationResult,
    /// Where the archive was written, on success.
    pub archive_path: Option<PathBuf>,
}

impl CreateOutcome {
    fn failed(validation: ValidationResult) -> Self {
        Self {
            validation,
            archive_path: None,
        }
    }
}

/// Builds package archives from source folders.
#[derive(Debug, Clone)]
pub struct PackageCreator {
    manifests: ManifestValidator,
    test_cases: TestCaseValidator,
}

impl Default for PackageCreator {
    fn default() -> Self {
        Self::new(Arc::new(JsonSchemaValidator))
    }
}

impl PackageCreator {
    /// Create a package creator using the given schema capability.
    #[must_use]
    pub fn new(schemas: Arc<dyn SchemaValidator>) -> Self {
        Self {
            manifests: ManifestValidator::new(Arc::clone(&schemas)),
            test_cases: TestCaseValidator::new(schemas),
        }
    }

    /// Validate `source` and archive it.
    ///
    /// With `validate`, the manifest and every declared test case must pass;
    /// each test's input is also checked against the manifest's input schema.
    /// When `output` is `None` the archive is written beside `source` as
    /// `<toolId with '.'→'_'>-<version>.tpkg`. No archive is written on failure.
    #[must_use]
    pub fn create_package(
        &self,
        source: &Path,
        output: Option<&Path>,
        validate: bool,
    ) -> CreateOutcome {
        match self.try_create(source, output, validate) {
            Ok(outcome) => outcome,
            Err(e) => CreateOutcome::failed(ValidationResult::failure(e.to_string())),
        }
    }

    fn try_create(
        &self,
        source: &Path,
        output: Option<&Path>,
        validate: bool,
    ) -> PackageResult<CreateOutcome> {
        if !source.is_dir() {
            return Ok(CreateOutcome::failed(ValidationResult::failure(format!(
                "source folder not found: {}",
                source.display()
            ))));
        }
        let source = source
            .canonicalize()
            .map_err(|e| PackageError::io(source, e))?;
        let manifest = Manifest::from_path(&source.join(MANIFEST_FILE_NAME))?;

        let mut validation = ValidationResult::new();
        if validate {
            validation = self.manifests.validate(&manifest);
            if !validation.is_valid {
                return Ok(CreateOutcome::failed(validation));
            }
            validation.merge(self.validate_tests(&source, &manifest));
            if !validation.is_valid {
                return Ok(CreateOutcome::failed(validation));
            }
        }

        let dest = match output {
            Some(path) => path.to_path_buf(),
            None => {
                ensure_path_safe_tool_id(&manifest.tool_id)?;
                source
                    .parent()
                    .unwrap_or(&source)
                    .join(default_archive_name(&manifest))
            },
        };

        let files = pack_directory(&source, &dest).map_err(|e| PackageError::Archive {
            message: format!("failed to create {}: {e}", dest.display()),
        })?;

        info!(
            tool_id = %manifest.tool_id,
            version = %manifest.version,
            archive = %dest.display(),
            files,
            "package created"
        );
        Ok(CreateOutcome {
            validation,
            archive_path: Some(dest),
        })
    }

    /// Load and check every declared test case, combining all failures.
    fn validate_tests(&self, source: &Path, manifest: &Manifest) -> ValidationResult {
        let mut combined = ValidationResult::new();
        for relative in manifest.test_paths() {
            let test_case = match TestCase::from_path(&source.join(relative)) {
                Ok(tc) => tc,
                Err(e) => {
                    combined.error(format!("{relative}: {e}"));
                    continue;
                },
            };
            debug!(test = %test_case.name, path = %relative, "validating test case");

            let structural = self.test_cases.validate(&test_case);
            let structurally_valid = structural.is_valid;
            combined.merge(structural.prefixed(relative));
            if !structurally_valid {
                continue;
            }

            if let Some(schema) = &manifest.input_schema {
                combined.merge(self.test_cases.validate_against_schema(&test_case, schema));
            }
        }
        combined
    }
}

/// Default archive file name for a manifest.
#[must_use]
pub fn default_archive_name(manifest: &Manifest) -> String {
    format!(
        "{}-{}.{PACKAGE_EXTENSION}",
        manifest.tool_id.replace('.', "_"),
        manifest.version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_json(path: &Path, value: &serde_json::Value) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    }

    fn echo_source(root: &Path, test_input: serde_json::Value) -> PathBuf {
        let src = root.join("echo");
        write_json(
            &src.join("manifest.json"),
            &json!({
                "toolId": "demo.echo",
                "name": "Echo",
                "version": "1.0.0",
                "description": "Echoes its input",
                "capabilities": ["echo"],
                "endpoint": {"type": "http", "method": "POST", "url": "http://127.0.0.1:9/echo"},
                "inputSchema": {"type": "object", "properties": {"message": {"type": "string"}}, "required": ["message"]},
                "outputSchema": {"type": "object"},
                "tests": ["tests/hello.json"]
            }),
        );
        write_json(
            &src.join("tests/hello.json"),
            &json!({
                "name": "hello",
                "description": "echoes hello",
                "input": test_input,
                "assertions": [{"path": "$.message", "equals": "hello"}]
            }),
        );
        src
    }

    #[test]
    fn default_name_replaces_dots() {
        let manifest = Manifest {
            tool_id: "stripe.payments.create_charge".into(),
            version: "2.3.1-beta".into(),
            ..Manifest::default()
        };
        assert_eq!(
            default_archive_name(&manifest),
            "stripe_payments_create_charge-2.3.1-beta.tpkg"
        );
    }

    #[test]
    fn creates_archive_beside_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = echo_source(tmp.path(), json!({"message": "hello"}));

        let outcome = PackageCreator::default().create_package(&src, None, true);

        assert!(outcome.validation.is_valid, "{:?}", outcome.validation.errors);
        let archive = outcome.archive_path.unwrap();
        assert_eq!(archive.file_name().unwrap(), "demo_echo-1.0.0.tpkg");
        assert!(archive.is_file());
        assert_eq!(outcome.validation.warnings, vec!["no examples defined", "no meta defined"]);
    }

    #[test]
    fn invalid_test_input_blocks_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let src = echo_source(tmp.path(), json!({"message": 5}));
        let out = tmp.path().join("out.tpkg");

        let outcome = PackageCreator::default().create_package(&src, Some(&out), true);

        assert!(!outcome.validation.is_valid);
        assert!(outcome.validation.errors[0].starts_with("hello: input at /message"));
        assert!(outcome.archive_path.is_none());
        assert!(!out.exists());
    }

    #[test]
    fn missing_test_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let src = echo_source(tmp.path(), json!({"message": "hello"}));
        std::fs::remove_file(src.join("tests/hello.json")).unwrap();

        let outcome = PackageCreator::default().create_package(&src, None, true);
        assert!(!outcome.validation.is_valid);
        assert!(outcome.validation.errors[0].starts_with("tests/hello.json:"));
    }

    #[test]
    fn invalid_manifest_is_returned_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let src = echo_source(tmp.path(), json!({"message": "hello"}));
        write_json(&src.join("manifest.json"), &json!({"toolId": "Bad"}));

        let expected = ManifestValidator::default()
            .validate(&Manifest::from_path(&src.join("manifest.json")).unwrap());
        let outcome = PackageCreator::default().create_package(&src, None, true);
        assert_eq!(outcome.validation, expected);
    }

    #[test]
    fn skipping_validation_packs_anyway() {
        let tmp = tempfile::tempdir().unwrap();
        let src = echo_source(tmp.path(), json!({"message": 5}));
        let out = tmp.path().join("custom.tpkg");

        let outcome = PackageCreator::default().create_package(&src, Some(&out), false);
        assert!(outcome.validation.is_valid);
        assert_eq!(outcome.archive_path.as_deref(), Some(out.as_path()));
    }

    #[test]
    fn missing_manifest_or_folder_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let outcome =
            PackageCreator::default().create_package(&tmp.path().join("nope"), None, true);
        assert!(outcome.validation.errors[0].contains("source folder not found"));

        let empty = tmp.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();
        let outcome = PackageCreator::default().create_package(&empty, None, true);
        assert!(outcome.validation.errors[0].contains("manifest not found"));
    }
}
