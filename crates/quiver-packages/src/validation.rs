//! Validation outcome shared by every validator, creator and installer.

use serde::{Deserialize, Serialize};

/// Outcome of a validation pass.
///
/// Errors block the operation that produced them; warnings never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `true` iff `errors` is empty.
    pub is_valid: bool,
    /// Blocking problems, in discovery order.
    pub errors: Vec<String>,
    /// Informational findings, in discovery order.
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    /// An empty, valid result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A result holding a single error.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.error(message);
        result
    }

    /// Record a blocking error.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    /// Record a non-blocking warning.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Append another result's findings, keeping order.
    pub fn merge(&mut self, other: Self) {
        self.is_valid = self.is_valid && other.is_valid && other.errors.is_empty();
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Prefix every message with `label: `.
    #[must_use]
    pub fn prefixed(mut self, label: &str) -> Self {
        for message in self.errors.iter_mut().chain(self.warnings.iter_mut()) {
            *message = format!("{label}: {message}");
        }
        self
    }
}
