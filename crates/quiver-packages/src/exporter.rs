//! Export of installed packages as a flat tool list for tool-calling runtimes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::best_effort::read_text;
use crate::error::{PackageError, PackageResult};
use crate::installer::PackageInstaller;
use crate::manifest::Manifest;
use crate::runner::{TestResult, TestRunner};
use crate::validate::is_package_relative;

/// Consumer-facing description of one installed tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Package identity, for routing calls back to the package.
    pub tool_id: String,
    /// Installed version.
    pub version: String,
    /// Human-readable name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the tool's input.
    pub input_schema: Value,
    /// Capability tags.
    pub capabilities: Vec<String>,
    /// Raw text of each readable example file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    /// Result of running the package's tests, when requested and available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_summary: Option<TestSummary>,
}

/// Aggregate outcome of a package's test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    /// Tests run.
    pub total: usize,
    /// Tests that passed.
    pub passed: usize,
    /// Tests that failed.
    pub failed: usize,
    /// Mean wall-clock duration per test.
    pub average_latency_ms: f64,
}

impl TestSummary {
    /// Summarize a non-empty set of results. `None` for an empty set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_results(results: &[TestResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let total_ms: u64 = results.iter().map(|r| r.duration_ms).sum();
        Some(Self {
            total,
            passed,
            failed: total.saturating_sub(passed),
            average_latency_ms: total_ms as f64 / total as f64,
        })
    }
}

/// Builds tool definitions from an install root.
#[derive(Debug, Clone)]
pub struct ToolsExporter {
    installer: PackageInstaller,
    runner: TestRunner,
}

impl ToolsExporter {
    /// Create an exporter reading from `installer` and testing with `runner`.
    #[must_use]
    pub fn new(installer: PackageInstaller, runner: TestRunner) -> Self {
        Self { installer, runner }
    }

    /// Definitions for every installed package, optionally written to `output`.
    ///
    /// Packages whose manifest cannot be loaded are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Io`] or [`PackageError::Serialization`] if the
    /// output file cannot be written.
    pub async fn export_tools(
        &self,
        output: Option<&Path>,
        run_tests: bool,
    ) -> PackageResult<Vec<ToolDefinition>> {
        let mut tools = Vec::new();
        for package in self.installer.list_installed() {
            match self.export_tool(&package.tool_id, run_tests).await {
                Some(tool) => tools.push(tool),
                None => debug!(tool_id = %package.tool_id, "skipping package without a loadable manifest"),
            }
        }

        if let Some(path) = output {
            write_tools(path, &tools)?;
            info!(path = %path.display(), tools = tools.len(), "exported tools");
        }
        Ok(tools)
    }

    /// Definition of one installed package. `None` if it is not installed.
    pub async fn export_tool(&self, tool_id: &str, run_tests: bool) -> Option<ToolDefinition> {
        let manifest = self.installer.load_manifest(tool_id)?;
        let examples = self.load_examples(&manifest);
        let test_summary = if run_tests {
            self.summarize_tests(&manifest).await
        } else {
            None
        };

        Some(ToolDefinition {
            tool_id: manifest.tool_id,
            version: manifest.version,
            name: manifest.name,
            description: manifest.description,
            input_schema: manifest.input_schema.unwrap_or(Value::Null),
            capabilities: manifest.capabilities,
            examples,
            test_summary,
        })
    }

    fn load_examples(&self, manifest: &Manifest) -> Option<Vec<String>> {
        let declared = manifest.examples.as_ref()?;
        let dir = self.installer.install_dir(&manifest.tool_id);
        let loaded: Vec<String> = declared
            .iter()
            .filter(|relative| is_package_relative(relative))
            .filter_map(|relative| read_text(&dir.join(relative)).into_option())
            .collect();
        (!loaded.is_empty()).then_some(loaded)
    }

    async fn summarize_tests(&self, manifest: &Manifest) -> Option<TestSummary> {
        manifest.tests.as_ref()?;
        let test_cases = self.installer.load_test_cases(manifest);
        if test_cases.is_empty() {
            debug!(tool_id = %manifest.tool_id, "no loadable test cases");
            return None;
        }
        let results = self.runner.run_tests(manifest, &test_cases).await;
        TestSummary::from_results(&results)
    }
}

fn write_tools(path: &Path, tools: &[ToolDefinition]) -> PackageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PackageError::io(parent, e))?;
    }
    let content = serde_json::to_string_pretty(tools)?;
    std::fs::write(path, content).map_err(|e| PackageError::io(path, e))
}
