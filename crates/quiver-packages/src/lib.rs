//! Package lifecycle engine for self-describing tool packages.
//!
//! A package bundles a tool [`Manifest`] (identity, HTTP endpoint, input and
//! output JSON Schemas, auth requirements) with executable [`TestCase`]s and
//! free-form examples. This crate provides:
//!
//! - [`ManifestValidator`] / [`TestCaseValidator`]: collect-all validation into
//!   a [`ValidationResult`]
//! - [`PackageCreator`]: validated source folder → `.tpkg` archive
//! - [`PackageInstaller`]: archive (path or URL) → install root, plus listing,
//!   lookup and removal of installed packages
//! - [`TestRunner`]: calls a tool's endpoint per test case and evaluates
//!   JSONPath assertions against the response
//! - [`ToolsExporter`]: installed packages → flat [`ToolDefinition`] list
//!
//! # Install layout
//!
//! ```text
//! <install root>/
//!   demo.echo/
//!     manifest.json
//!     package-info.json
//!     tests/hello.json
//! ```
//!
//! # Error policy
//!
//! Create and install report expected failures through a [`ValidationResult`]
//! inside their outcome instead of `Err`. Test execution failures are confined
//! to the [`TestResult`] that produced them. Files that cannot be loaded while
//! listing or exporting are skipped (see [`best_effort`]).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod archive;
pub mod assertions;
pub mod auth;
pub mod best_effort;
pub mod creator;
pub mod error;
pub mod exporter;
pub mod installer;
pub mod manifest;
pub mod query;
pub mod record;
pub mod runner;
pub mod schema;
pub mod scratch;
pub mod test_case;
pub mod validate;
pub mod validation;

pub use assertions::{AssertionResult, evaluate_assertion};
pub use auth::{ApiKey, AuthStrategies, BearerToken, CredentialStrategy, NoAuth, OAuth2};
pub use best_effort::BestEffort;
pub use creator::{CreateOutcome, PackageCreator, default_archive_name};
pub use error::{PackageError, PackageResult};
pub use exporter::{TestSummary, ToolDefinition, ToolsExporter};
pub use installer::{FetchSettings, InstallOutcome, PackageInstaller};
pub use manifest::{
    AuthConfig, AuthConfigHints, AuthKind, Endpoint, HttpMethod, MANIFEST_FILE_NAME, Manifest,
    PackageMeta, validate_tool_id,
};
pub use query::{JsonPathSelector, PathSelector};
pub use record::{PACKAGE_INFO_FILE_NAME, PackageInfo, PackageSource};
pub use runner::{DEFAULT_TEST_TIMEOUT, TestResult, TestRunner};
pub use schema::{JsonSchemaValidator, SchemaValidator, SchemaViolation};
pub use scratch::ScratchDir;
pub use test_case::{Assertion, AssertionKind, TestCase};
pub use validate::{ManifestValidator, TestCaseValidator};
pub use validation::ValidationResult;
