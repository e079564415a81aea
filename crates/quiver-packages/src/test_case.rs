//! Test-case documents.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{PackageError, PackageResult};
use crate::manifest::positive_millis;

/// One test scenario for a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Test name, used in results and error prefixes.
    #[serde(default)]
    pub name: String,
    /// What the test exercises.
    #[serde(default)]
    pub description: String,
    /// Request body. `Some(Value::Null)` when the document has `"input": null`.
    #[serde(default, deserialize_with = "present_value")]
    pub input: Option<Value>,
    /// Informational only; never machine-checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// Checks evaluated against the response, in order.
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    /// Overrides the endpoint timeout for this test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,
}

impl TestCase {
    /// Load a test case from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Io`] if the file cannot be read and
    /// [`PackageError::TestCaseParse`] if it is not a test-case document.
    pub fn from_path(path: &Path) -> PackageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PackageError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| PackageError::TestCaseParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The per-test timeout, if set and positive.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        positive_millis(self.timeout_ms)
    }
}

/// One path-based check. Exactly one of the four check fields must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    /// JSONPath expression selecting the node(s) to check.
    #[serde(default)]
    pub path: String,
    /// Expected value of the first match. `null` is a valid expectation.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub equals: Option<Value>,
    /// Value the first match must differ from.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub not_equals: Option<Value>,
    /// Path must select at least one node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    /// Path must select nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_exists: Option<bool>,
}

/// The single check an [`Assertion`] performs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssertionKind<'a> {
    /// First match deep-equals the value.
    Equals(&'a Value),
    /// First match does not deep-equal the value.
    NotEquals(&'a Value),
    /// At least one match.
    Exists,
    /// No match.
    NotExists,
}

impl Assertion {
    /// Number of check fields present.
    #[must_use]
    pub fn set_count(&self) -> usize {
        [
            self.equals.is_some(),
            self.not_equals.is_some(),
            self.exists.is_some(),
            self.not_exists.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// The check to perform.
    ///
    /// `None` unless exactly one field is set, and also when that field is an
    /// `exists`/`notExists` flag set to `false`.
    #[must_use]
    pub fn kind(&self) -> Option<AssertionKind<'_>> {
        if self.set_count() != 1 {
            return None;
        }
        if let Some(v) = &self.equals {
            Some(AssertionKind::Equals(v))
        } else if let Some(v) = &self.not_equals {
            Some(AssertionKind::NotEquals(v))
        } else if self.exists == Some(true) {
            Some(AssertionKind::Exists)
        } else if self.not_exists == Some(true) {
            Some(AssertionKind::NotExists)
        } else {
            None
        }
    }

    /// The value this assertion compares against, for reporting.
    #[must_use]
    pub fn expected_value(&self) -> Option<Value> {
        match self.kind()? {
            AssertionKind::Equals(v) | AssertionKind::NotEquals(v) => Some(v.clone()),
            AssertionKind::Exists => Some(Value::Bool(true)),
            AssertionKind::NotExists => Some(Value::Bool(false)),
        }
    }
}

/// Distinguish an explicit `null` from an absent key.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_null_counts_as_set() {
        let assertion: Assertion =
            serde_json::from_value(json!({"path": "$.a", "equals": null})).unwrap();
        assert_eq!(assertion.equals, Some(Value::Null));
        assert_eq!(assertion.set_count(), 1);
        assert_eq!(assertion.kind(), Some(AssertionKind::Equals(&Value::Null)));
    }

    #[test]
    fn false_flags_have_no_kind() {
        let exists: Assertion =
            serde_json::from_value(json!({"path": "$.a", "exists": false})).unwrap();
        assert_eq!(exists.set_count(), 1);
        assert_eq!(exists.kind(), None);

        let not_exists: Assertion =
            serde_json::from_value(json!({"path": "$.a", "notExists": false})).unwrap();
        assert_eq!(not_exists.kind(), None);

        let exists: Assertion =
            serde_json::from_value(json!({"path": "$.a", "exists": true})).unwrap();
        assert_eq!(exists.kind(), Some(AssertionKind::Exists));
    }

    #[test]
    fn absent_fields_are_unset() {
        let assertion: Assertion = serde_json::from_value(json!({"path": "$.a"})).unwrap();
        assert_eq!(assertion.set_count(), 0);
        assert_eq!(assertion.kind(), None);
    }

    #[test]
    fn multiple_fields_have_no_kind() {
        let assertion: Assertion =
            serde_json::from_value(json!({"path": "$.a", "exists": true, "notEquals": 3}))
                .unwrap();
        assert_eq!(assertion.set_count(), 2);
        assert_eq!(assertion.kind(), None);
    }

    #[test]
    fn input_null_is_present() {
        let case: TestCase = serde_json::from_value(json!({
            "name": "n", "description": "d", "input": null,
            "assertions": [{"path": "$", "exists": true}]
        }))
        .unwrap();
        assert_eq!(case.input, Some(Value::Null));

        let missing: TestCase =
            serde_json::from_value(json!({"name": "n", "description": "d"})).unwrap();
        assert_eq!(missing.input, None);
    }

    #[test]
    fn loads_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hello.json");
        std::fs::write(
            &path,
            r#"{"name":"hello","description":"says hello","input":{"message":"hello"},
                "assertions":[{"path":"$.message","equals":"hello"}],"timeoutMs":500}"#,
        )
        .unwrap();

        let case = TestCase::from_path(&path).unwrap();
        assert_eq!(case.name, "hello");
        assert_eq!(case.timeout(), Some(Duration::from_millis(500)));
        assert_eq!(case.assertions[0].expected_value(), Some(json!("hello")));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            TestCase::from_path(&path),
            Err(PackageError::TestCaseParse { .. })
        ));
    }
}
