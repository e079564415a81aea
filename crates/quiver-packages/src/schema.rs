//! JSON Schema validation behind a narrow interface.

use serde_json::Value;

/// One instance-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON Pointer to the offending node; empty for the document root.
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl SchemaViolation {
    /// The pointer, or `/` when the violation is at the root.
    #[must_use]
    pub fn display_path(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }
}

/// Checks schema documents and validates instances against them.
pub trait SchemaValidator: Send + Sync {
    /// Confirm that `schema` is a well-formed JSON Schema document.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    fn check_schema(&self, schema: &Value) -> Result<(), String>;

    /// Validate `instance` against `schema`, reporting every violation.
    ///
    /// An uncompilable schema yields a single root-level violation.
    fn validate_instance(&self, schema: &Value, instance: &Value) -> Vec<SchemaViolation>;
}

/// [`SchemaValidator`] backed by the `jsonschema` crate.
///
/// The draft is picked from the schema's `$schema` keyword, defaulting to the
/// latest supported draft.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn check_schema(&self, schema: &Value) -> Result<(), String> {
        if !schema.is_object() && !schema.is_boolean() {
            return Err("schema must be a JSON object".into());
        }
        jsonschema::validator_for(schema)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn validate_instance(&self, schema: &Value, instance: &Value) -> Vec<SchemaViolation> {
        let validator = match jsonschema::validator_for(schema) {
            Ok(v) => v,
            Err(e) => {
                return vec![SchemaViolation {
                    path: String::new(),
                    message: format!("schema cannot be compiled: {e}"),
                }];
            },
        };

        validator
            .iter_errors(instance)
            .map(|e| SchemaViolation {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_schema() -> Value {
        json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"]
        })
    }

    #[test]
    fn accepts_well_formed_schema() {
        assert!(JsonSchemaValidator.check_schema(&message_schema()).is_ok());
    }

    #[test]
    fn rejects_malformed_schema() {
        let bad = json!({"type": "not-a-type"});
        assert!(JsonSchemaValidator.check_schema(&bad).is_err());
        assert!(JsonSchemaValidator.check_schema(&json!("object")).is_err());
    }

    #[test]
    fn valid_instance_has_no_violations() {
        let violations =
            JsonSchemaValidator.validate_instance(&message_schema(), &json!({"message": "hi"}));
        assert!(violations.is_empty());
    }

    #[test]
    fn violations_carry_instance_path() {
        let violations =
            JsonSchemaValidator.validate_instance(&message_schema(), &json!({"message": 42}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/message");

        let missing = JsonSchemaValidator.validate_instance(&message_schema(), &json!({}));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].display_path(), "/");
    }
}
