use std::sync::Arc;

use serde_json::Value;

use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::test_case::{Assertion, TestCase};
use crate::validation::ValidationResult;

/// Validates test cases, structurally and against an input schema.
#[derive(Clone)]
pub struct TestCaseValidator {
    schemas: Arc<dyn SchemaValidator>,
}

impl Default for TestCaseValidator {
    fn default() -> Self {
        Self::new(Arc::new(JsonSchemaValidator))
    }
}

impl std::fmt::Debug for TestCaseValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCaseValidator").finish_non_exhaustive()
    }
}

impl TestCaseValidator {
    /// Create a validator using the given schema capability.
    #[must_use]
    pub fn new(schemas: Arc<dyn SchemaValidator>) -> Self {
        Self { schemas }
    }

    /// Structural checks that need no manifest.
    #[must_use]
    pub fn validate(&self, test_case: &TestCase) -> ValidationResult {
        let mut result = ValidationResult::new();

        if test_case.name.trim().is_empty() {
            result.error("name is required");
        }
        if test_case.description.trim().is_empty() {
            result.error("description is required");
        }
        if test_case.input.is_none() {
            result.error("input is required");
        }
        if test_case.assertions.is_empty() {
            result.error("assertions must contain at least one assertion");
        }
        for (i, assertion) in test_case.assertions.iter().enumerate() {
            check_assertion(i, assertion, &mut result);
        }
        if let Some(ms) = test_case.timeout_ms
            && ms <= 0
        {
            result.error(format!("timeoutMs must be positive (got {ms})"));
        }

        result
    }

    /// Validate the test's `input` against the owning manifest's input schema.
    ///
    /// Each violation is reported with its instance path, prefixed with the
    /// test name.
    #[must_use]
    pub fn validate_against_schema(
        &self,
        test_case: &TestCase,
        input_schema: &Value,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        match &test_case.input {
            None => result.error("input is required"),
            Some(input) => {
                for violation in self.schemas.validate_instance(input_schema, input) {
                    result.error(format!(
                        "input at {}: {}",
                        violation.display_path(),
                        violation.message
                    ));
                }
            },
        }
        result.prefixed(&test_case.name)
    }
}

fn check_assertion(index: usize, assertion: &Assertion, result: &mut ValidationResult) {
    if assertion.path.trim().is_empty() {
        result.error(format!("assertions[{index}]: path is required"));
    }

    let count = assertion.set_count();
    if count != 1 {
        result.error(format!(
            "assertions[{index}]: exactly one of equals, notEquals, exists, notExists must be set (found {count})"
        ));
    }

    if assertion.exists == Some(false) {
        result.error(format!("assertions[{index}]: exists must be true when set"));
    }
    if assertion.not_exists == Some(false) {
        result.error(format!("assertions[{index}]: notExists must be true when set"));
    }
}
