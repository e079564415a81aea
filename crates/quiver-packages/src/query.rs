//! Path queries over JSON documents behind a narrow interface.

use serde_json::Value;
use serde_json_path::JsonPath;

/// Selects nodes from a JSON document by a path expression.
pub trait PathSelector: Send + Sync {
    /// All nodes selected by `expression`, in document order.
    ///
    /// # Errors
    ///
    /// Returns a description when `expression` does not parse.
    fn select(&self, document: &Value, expression: &str) -> Result<Vec<Value>, String>;
}

/// [`PathSelector`] implementing RFC 9535 JSONPath via `serde_json_path`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathSelector;

impl PathSelector for JsonPathSelector {
    fn select(&self, document: &Value, expression: &str) -> Result<Vec<Value>, String> {
        let path = JsonPath::parse(expression).map_err(|e| format!("invalid path '{expression}': {e}"))?;
        Ok(path.query(document).all().into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_in_document_order() {
        let doc = json!({"items": [{"id": 1}, {"id": 2}]});
        let found = JsonPathSelector.select(&doc, "$.items[*].id").unwrap();
        assert_eq!(found, vec![json!(1), json!(2)]);
    }

    #[test]
    fn missing_path_selects_nothing() {
        let doc = json!({"message": "hello"});
        assert!(JsonPathSelector.select(&doc, "$.nonexistent").unwrap().is_empty());
    }

    #[test]
    fn null_values_are_selected() {
        let doc = json!({"a": null});
        assert_eq!(JsonPathSelector.select(&doc, "$.a").unwrap(), vec![Value::Null]);
    }

    #[test]
    fn malformed_expression_is_an_error() {
        let doc = json!({});
        let err = JsonPathSelector.select(&doc, "$[").unwrap_err();
        assert!(err.contains("invalid path"));
    }
}
