//! Assertion evaluation against a JSON response.
//!
//! Only the first node selected by a path is compared; further matches are
//! ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::PathSelector;
use crate::test_case::{Assertion, AssertionKind};

/// Outcome of one assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    /// The path expression evaluated.
    pub path: String,
    /// Whether the check held.
    pub passed: bool,
    /// First selected value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    /// The value or condition checked against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// Human-readable explanation.
    pub message: String,
}

/// Evaluate one assertion against `response`.
///
/// Never fails: a malformed path or an assertion without exactly one check
/// yields a failed result carrying the reason.
#[must_use]
pub fn evaluate_assertion(
    assertion: &Assertion,
    response: &Value,
    selector: &dyn PathSelector,
) -> AssertionResult {
    let path = assertion.path.clone();
    let expected = assertion.expected_value();
    let result = |passed: bool, actual: Option<Value>, message: String| AssertionResult {
        path: path.clone(),
        passed,
        actual,
        expected: expected.clone(),
        message,
    };

    let Some(kind) = assertion.kind() else {
        let message = if assertion.set_count() == 1 {
            format!("{path}: exists and notExists must be true when set")
        } else {
            format!(
                "{path}: assertion must set exactly one of equals, notEquals, exists, notExists (found {})",
                assertion.set_count()
            )
        };
        return result(false, None, message);
    };

    let first = match selector.select(response, &assertion.path) {
        Ok(matches) => matches.into_iter().next(),
        Err(e) => return result(false, None, e),
    };

    match (kind, first) {
        (AssertionKind::Exists, None) => {
            result(false, None, format!("{path} does not exist, expected to exist"))
        },
        (AssertionKind::NotExists, None) => result(true, None, format!("{path} does not exist")),
        (AssertionKind::Equals(_) | AssertionKind::NotEquals(_), None) => {
            result(false, None, format!("{path}: path does not exist"))
        },
        (AssertionKind::Exists, Some(actual)) => {
            result(true, Some(actual), format!("{path} exists"))
        },
        (AssertionKind::NotExists, Some(actual)) => {
            result(false, Some(actual), format!("{path} exists, expected not to"))
        },
        (AssertionKind::Equals(want), Some(actual)) => {
            if actual == *want {
                result(true, Some(actual), format!("{path} equals {want}"))
            } else {
                let message = format!("{path}: expected {want}, got {actual}");
                result(false, Some(actual), message)
            }
        },
        (AssertionKind::NotEquals(unwanted), Some(actual)) => {
            if actual == *unwanted {
                let message = format!("{path}: expected a value other than {unwanted}, got {actual}");
                result(false, Some(actual), message)
            } else {
                let message = format!("{path} is {actual}, not {unwanted}");
                result(true, Some(actual), message)
            }
        },
    }
}
