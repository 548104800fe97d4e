//! Validation error model.
//!
//! Every failure produced by the engine is a value, never a panic: a
//! [`ValidationError`] carries a classification, the path to the offending
//! value, a human-readable message, and the value itself. Schema
//! construction mistakes (kind-incompatible modifiers, empty choice sets,
//! invalid patterns) are programmer errors and panic in the builder
//! instead; they can never appear here.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::coerce::value_kind;
use crate::path::Path;

/// Which constraint a [`ErrorKind::ConstraintViolation`] breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// String did not match the node's pattern.
    Regex,
    /// Numeric value fell below the inclusive lower bound.
    Min,
    /// Numeric value exceeded the inclusive upper bound.
    Max,
    /// Value was not a member of the enumerated choice set.
    OneOf,
}

/// Classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required field was absent from the input.
    MissingField,
    /// The value's type does not match the schema kind.
    TypeMismatch,
    /// A kind-specific constraint failed on a correctly-typed value.
    ConstraintViolation(ConstraintKind),
    /// Coercion was requested but no conversion is defined for the value.
    CoercionFailure,
    /// A custom callback rejected the value.
    CustomValidationFailure,
    /// Input nesting exceeded the configured depth bound.
    DepthLimitExceeded,
}

/// A single path-qualified validation failure.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{path}: {message}")]
pub struct ValidationError {
    /// Failure classification.
    pub kind: ErrorKind,
    /// Location of the offending value relative to the validated root.
    pub path: Path,
    /// Human-readable description naming the violated expectation.
    pub message: String,
    /// The value at the failure site when the error was produced. This is
    /// the pre-coercion raw value for coercion failures and `Null` for
    /// missing fields.
    pub value: Value,
}

impl ValidationError {
    fn new(kind: ErrorKind, path: Path, message: String, value: Value) -> Self {
        ValidationError {
            kind,
            path,
            message,
            value,
        }
    }

    pub(crate) fn missing_field(path: Path) -> Self {
        Self::new(
            ErrorKind::MissingField,
            path,
            "missing required field".to_string(),
            Value::Null,
        )
    }

    pub(crate) fn type_mismatch(path: Path, expected: &str, value: &Value) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            path,
            format!("expected {}, got {}", expected, value_kind(value)),
            value.clone(),
        )
    }

    pub(crate) fn invalid_key(path: Path, expected: &str, key: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            path,
            format!("expected {} key, got '{}'", expected, key),
            Value::String(key.to_string()),
        )
    }

    pub(crate) fn constraint(
        path: Path,
        constraint: ConstraintKind,
        message: String,
        value: &Value,
    ) -> Self {
        Self::new(
            ErrorKind::ConstraintViolation(constraint),
            path,
            message,
            value.clone(),
        )
    }

    pub(crate) fn coercion(path: Path, message: String, value: &Value) -> Self {
        Self::new(ErrorKind::CoercionFailure, path, message, value.clone())
    }

    pub(crate) fn custom(path: Path, message: String, value: &Value) -> Self {
        Self::new(
            ErrorKind::CustomValidationFailure,
            path,
            message,
            value.clone(),
        )
    }

    pub(crate) fn depth_exceeded(path: Path, limit: usize, value: &Value) -> Self {
        Self::new(
            ErrorKind::DepthLimitExceeded,
            path,
            format!("nesting exceeds depth limit of {}", limit),
            value.clone(),
        )
    }
}

/// Outcome of a collect-all validation pass.
///
/// `value` is the best-effort output: branches that validated carry their
/// transformed value, leaves that failed keep the raw input value, and
/// missing fields stay absent. `errors` follows the walk order:
/// structural errors at a node precede its children's, object fields
/// follow declaration order, list elements ascend by index, dict entries
/// ascend by key, and a container's custom-callback error trails the
/// children it validated.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub value: Value,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// First recorded error. Equal to what fail-fast validation reports
    /// for the same input.
    pub fn first_error(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Collapses into a fail-fast style result, keeping the value on
    /// success and the first error otherwise.
    pub fn into_result(mut self) -> Result<Value, ValidationError> {
        if self.errors.is_empty() {
            Ok(self.value)
        } else {
            Err(self.errors.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path_to(key: &str) -> Path {
        let mut path = Path::root();
        path.push_key(key);
        path
    }

    #[test]
    fn test_display_includes_path_and_message() {
        let err = ValidationError::missing_field(path_to("port"));
        assert_eq!(err.to_string(), "port: missing required field");
    }

    #[test]
    fn test_root_errors_use_sentinel_path() {
        let err = ValidationError::type_mismatch(Path::root(), "object", &json!("nope"));
        assert_eq!(err.to_string(), "$root: expected object, got str");
    }

    #[test]
    fn test_type_mismatch_names_both_sides() {
        let err = ValidationError::type_mismatch(path_to("age"), "int", &json!("abc"));
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.message, "expected int, got str");
        assert_eq!(err.value, json!("abc"));
    }

    #[test]
    fn test_missing_field_carries_null_value() {
        let err = ValidationError::missing_field(path_to("name"));
        assert_eq!(err.kind, ErrorKind::MissingField);
        assert_eq!(err.value, Value::Null);
    }

    #[test]
    fn test_constraint_kind_is_preserved() {
        let err = ValidationError::constraint(
            path_to("age"),
            ConstraintKind::Min,
            "value 9 is less than minimum 10".to_string(),
            &json!(9),
        );
        assert_eq!(err.kind, ErrorKind::ConstraintViolation(ConstraintKind::Min));
        assert_eq!(err.value, json!(9));
    }

    #[test]
    fn test_result_first_error_and_validity() {
        let ok = ValidationResult {
            value: json!({}),
            errors: vec![],
        };
        assert!(ok.is_valid());
        assert!(ok.first_error().is_none());

        let bad = ValidationResult {
            value: json!({}),
            errors: vec![
                ValidationError::missing_field(path_to("a")),
                ValidationError::missing_field(path_to("b")),
            ],
        };
        assert!(!bad.is_valid());
        assert_eq!(bad.first_error().unwrap().path.to_string(), "a");
    }

    #[test]
    fn test_into_result_keeps_value_or_first_error() {
        let ok = ValidationResult {
            value: json!({"x": 1}),
            errors: vec![],
        };
        assert_eq!(ok.into_result().unwrap(), json!({"x": 1}));

        let bad = ValidationResult {
            value: json!({}),
            errors: vec![
                ValidationError::missing_field(path_to("a")),
                ValidationError::missing_field(path_to("b")),
            ],
        };
        let err = bad.into_result().unwrap_err();
        assert_eq!(err.path.to_string(), "a");
    }

    #[test]
    fn test_error_serializes_with_rendered_path() {
        let err = ValidationError::missing_field(path_to("host"));
        let payload = serde_json::to_value(&err).unwrap();
        assert_eq!(payload["path"], json!("host"));
        assert_eq!(payload["kind"], json!("missing_field"));
    }
}
