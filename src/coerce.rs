//! Type coercion rules.
//!
//! Coercion is opt-in per node and runs before the type check, converting
//! a mistyped raw value toward the node's kind. Conversions are
//! conservative and lossless:
//!
//! - str: anything but null stringifies; scalars lexically (`42` ->
//!   `"42"`, `true` -> `"true"`), containers as compact JSON
//!   (`[1, 2]` -> `"[1,2]"`)
//! - int: strings in integer lexical form, and floats whose value is
//!   exactly integral
//! - float: numeric strings and integers
//! - bool: the words true/false/yes/no/on/off (case-insensitive), the
//!   strings "1"/"0", and the numbers 1 and 0
//!
//! Null never coerces (a required null reports a type mismatch, not a
//! coercion failure), and no conversion is defined for non-scalar
//! target kinds.

use serde_json::{Number, Value};

use crate::types::SchemaKind;

/// Result of one coercion attempt.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CoerceOutcome {
    /// Value already has the target kind; left untouched.
    Unchanged,
    /// Converted replacement value.
    Coerced(Value),
    /// No conversion is defined; the message explains why.
    Failed(String),
}

/// Name of a raw value's kind for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_f64() {
                "float"
            } else {
                "int"
            }
        }
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Attempts coercion of `value` toward `kind`. Non-scalar kinds have no
/// conversions and always report `Unchanged`.
pub(crate) fn coerce_to(value: &Value, kind: &SchemaKind) -> CoerceOutcome {
    match kind {
        SchemaKind::Str { .. } => to_str(value),
        SchemaKind::Int { .. } => to_int(value),
        SchemaKind::Float { .. } => to_float(value),
        SchemaKind::Bool => to_bool(value),
        _ => CoerceOutcome::Unchanged,
    }
}

fn to_str(value: &Value) -> CoerceOutcome {
    match value {
        Value::String(_) => CoerceOutcome::Unchanged,
        Value::Bool(b) => CoerceOutcome::Coerced(Value::String(b.to_string())),
        Value::Number(n) => CoerceOutcome::Coerced(Value::String(n.to_string())),
        Value::Array(_) | Value::Object(_) => match serde_json::to_string(value) {
            Ok(text) => CoerceOutcome::Coerced(Value::String(text)),
            Err(e) => CoerceOutcome::Failed(format!(
                "cannot render {} as str: {}",
                value_kind(value),
                e
            )),
        },
        Value::Null => CoerceOutcome::Failed("cannot coerce null to str".to_string()),
    }
}

fn to_int(value: &Value) -> CoerceOutcome {
    match value {
        Value::Number(n) if !n.is_f64() => CoerceOutcome::Unchanged,
        Value::Number(n) => match n.as_f64() {
            // i64::MAX as f64 rounds up to 2^63, so `<` keeps the cast in range.
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                CoerceOutcome::Coerced(Value::from(f as i64))
            }
            _ => CoerceOutcome::Failed(format!("cannot coerce float {} to int without loss", n)),
        },
        Value::String(s) => match s.parse::<i64>() {
            Ok(i) => CoerceOutcome::Coerced(Value::from(i)),
            Err(_) => CoerceOutcome::Failed(format!("cannot coerce '{}' to int", s)),
        },
        other => CoerceOutcome::Failed(format!("cannot coerce {} to int", value_kind(other))),
    }
}

fn to_float(value: &Value) -> CoerceOutcome {
    match value {
        Value::Number(n) if n.is_f64() => CoerceOutcome::Unchanged,
        Value::Number(n) => match n.as_f64().and_then(Number::from_f64) {
            Some(num) => CoerceOutcome::Coerced(Value::Number(num)),
            None => CoerceOutcome::Failed(format!("cannot coerce {} to float", n)),
        },
        Value::String(s) => {
            // from_f64 rejects NaN and infinities, so "inf" and "NaN" fail here.
            match s.parse::<f64>().ok().and_then(Number::from_f64) {
                Some(num) => CoerceOutcome::Coerced(Value::Number(num)),
                None => CoerceOutcome::Failed(format!("cannot coerce '{}' to float", s)),
            }
        }
        other => CoerceOutcome::Failed(format!("cannot coerce {} to float", value_kind(other))),
    }
}

fn to_bool(value: &Value) -> CoerceOutcome {
    match value {
        Value::Bool(_) => CoerceOutcome::Unchanged,
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => CoerceOutcome::Coerced(Value::Bool(true)),
            "false" | "no" | "off" | "0" => CoerceOutcome::Coerced(Value::Bool(false)),
            _ => CoerceOutcome::Failed(format!("cannot coerce '{}' to bool", s)),
        },
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => CoerceOutcome::Coerced(Value::Bool(true)),
            Some(f) if f == 0.0 => CoerceOutcome::Coerced(Value::Bool(false)),
            _ => CoerceOutcome::Failed(format!("cannot coerce number {} to bool", n)),
        },
        other => CoerceOutcome::Failed(format!("cannot coerce {} to bool", value_kind(other))),
    }
}
