// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Form validation backed by the `jsonschema` validator.

use std::fmt;

use anyhow::{Result, anyhow};
use jsonschema::error::ValidationErrorKind;
use serde_json::Value;

use crate::models::form_data::child_pointer;

/// One validation problem attributed to a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormError {
    /// JSON Pointer of the offending field (`""` for the whole entry).
    pub pointer: String,
    pub message: String,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.pointer, self.message)
        }
    }
}

/// Validator compiled once per loaded schema.
pub struct FormValidator {
    inner: jsonschema::Validator,
}

impl fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormValidator").finish_non_exhaustive()
    }
}

impl FormValidator {
    pub fn new(schema: &Value) -> Result<Self> {
        let inner = jsonschema::validator_for(schema).map_err(|e| anyhow!("Invalid schema: {e}"))?;
        Ok(Self { inner })
    }

    /// Collect all errors for `data`, in validator order.
    ///
    /// Missing required properties are reported on the missing field itself
    /// so the message appears under the empty input.
    pub fn validate(&self, data: &Value) -> Vec<FormError> {
        let mut errors: Vec<FormError> = self
            .inner
            .iter_errors(data)
            .map(|err| {
                let path = err.instance_path.to_string();
                match &err.kind {
                    ValidationErrorKind::Required { property } => FormError {
                        pointer: child_pointer(&path, property.as_str().unwrap_or_default()),
                        message: "is a required property".to_string(),
                    },
                    _ => FormError {
                        pointer: path,
                        message: err.to_string(),
                    },
                }
            })
            .collect();
        errors.dedup();
        errors
    }

    pub fn is_valid(&self, data: &Value) -> bool {
        self.inner.is_valid(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_schema() -> Value {
        json!({
            "type": "object",
            "required": ["datasetId", "nuclide"],
            "properties": {
                "datasetId": { "type": "string", "minLength": 1 },
                "nuclide": {
                    "type": "object",
                    "required": ["mass"],
                    "properties": { "mass": { "type": "integer", "minimum": 0 } }
                }
            }
        })
    }

    #[test]
    fn valid_entry_has_no_errors() {
        let validator = FormValidator::new(&entry_schema()).unwrap();
        let data = json!({ "datasetId": "E1", "nuclide": { "mass": 56 } });
        assert!(validator.validate(&data).is_empty());
        assert!(validator.is_valid(&data));
    }

    #[test]
    fn required_errors_point_at_the_missing_field() {
        let validator = FormValidator::new(&entry_schema()).unwrap();
        let errors = validator.validate(&json!({ "nuclide": {} }));

        let pointers: Vec<&str> = errors.iter().map(|e| e.pointer.as_str()).collect();
        assert!(pointers.contains(&"/datasetId"));
        assert!(pointers.contains(&"/nuclide/mass"));
        assert!(errors.iter().all(|e| e.message == "is a required property"));
    }

    #[test]
    fn type_errors_keep_the_instance_path() {
        let validator = FormValidator::new(&entry_schema()).unwrap();
        let errors = validator.validate(&json!({ "datasetId": "E1", "nuclide": { "mass": "abc" } }));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].pointer, "/nuclide/mass");
        assert!(errors[0].to_string().starts_with("/nuclide/mass: "));
    }

    #[test]
    fn invalid_schema_is_rejected() {
        assert!(FormValidator::new(&json!({ "type": 12 })).is_err());
    }
}
