//! Coercion behavior through the engine: opt-in conversion toward scalar
//! kinds, interplay with type checks, constraints, custom callbacks, and
//! the best-effort output.

use serde_json::{json, Value};
use vschema::{v, validate, validate_all, ConstraintKind, ErrorKind, KeyKind, Options};

fn collect(data: &Value, schema: &vschema::SchemaNode) -> vschema::ValidationResult {
    validate_all(data, schema, &Options::default())
}

// ==================== Opt-in ====================

#[test]
fn test_no_coercion_by_default() {
    let schema = v::object([("port", v::int())]);
    let err = validate(&json!({"port": "5432"}), &schema).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.message, "expected int, got str");
}

// ==================== Toward str ====================

#[test]
fn test_scalars_stringify() {
    let schema = v::string().coerce();
    assert_eq!(validate(&json!(42), &schema).unwrap(), json!("42"));
    assert_eq!(validate(&json!(4.5), &schema).unwrap(), json!("4.5"));
    assert_eq!(validate(&json!(true), &schema).unwrap(), json!("true"));
    assert_eq!(validate(&json!(false), &schema).unwrap(), json!("false"));
}

#[test]
fn test_containers_stringify_as_compact_json() {
    let schema = v::string().coerce();
    assert_eq!(validate(&json!([1, 2]), &schema).unwrap(), json!("[1,2]"));
    assert_eq!(
        validate(&json!({"a": 1}), &schema).unwrap(),
        json!(r#"{"a":1}"#)
    );
}

// ==================== Toward int ====================

#[test]
fn test_lexical_string_to_int() {
    let schema = v::int().coerce();
    assert_eq!(validate(&json!("123"), &schema).unwrap(), json!(123));
    assert_eq!(validate(&json!("-40"), &schema).unwrap(), json!(-40));
}

#[test]
fn test_non_lexical_string_to_int_fails() {
    let schema = v::int().coerce();
    for bad in ["abc", "12.0", " 5", ""] {
        let err = validate(&json!(bad), &schema).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CoercionFailure, "input: {:?}", bad);
    }
}

#[test]
fn test_exactly_integral_float_to_int() {
    let schema = v::int().coerce();
    assert_eq!(validate(&json!(12.0), &schema).unwrap(), json!(12));
}

#[test]
fn test_fractional_float_to_int_fails_with_raw_value() {
    let schema = v::int().coerce();
    let err = validate(&json!(12.5), &schema).unwrap_err();
    assert_eq!(err.kind, ErrorKind::CoercionFailure);
    // The error carries the pre-coercion raw value.
    assert_eq!(err.value, json!(12.5));
}

// ==================== Toward float ====================

#[test]
fn test_numeric_string_to_float() {
    let schema = v::float().coerce();
    assert_eq!(validate(&json!("0.25"), &schema).unwrap(), json!(0.25));
    assert_eq!(validate(&json!("3"), &schema).unwrap(), json!(3.0));
}

#[test]
fn test_integer_to_float() {
    let schema = v::float().coerce();
    assert_eq!(validate(&json!(3), &schema).unwrap(), json!(3.0));
}

#[test]
fn test_non_numeric_string_to_float_fails() {
    let schema = v::float().coerce();
    let err = validate(&json!("fast"), &schema).unwrap_err();
    assert_eq!(err.kind, ErrorKind::CoercionFailure);
}

// ==================== Toward bool ====================

#[test]
fn test_truth_words_coerce_case_insensitively() {
    let schema = v::bool().coerce();
    for word in ["true", "True", "TRUE", "yes", "Yes", "on", "ON", "1"] {
        assert_eq!(
            validate(&json!(word), &schema).unwrap(),
            json!(true),
            "word: {:?}",
            word
        );
    }
    for word in ["false", "False", "FALSE", "no", "No", "off", "OFF", "0"] {
        assert_eq!(
            validate(&json!(word), &schema).unwrap(),
            json!(false),
            "word: {:?}",
            word
        );
    }
}

#[test]
fn test_one_and_zero_coerce_to_bool() {
    let schema = v::bool().coerce();
    assert_eq!(validate(&json!(1), &schema).unwrap(), json!(true));
    assert_eq!(validate(&json!(0), &schema).unwrap(), json!(false));
    assert_eq!(validate(&json!(1.0), &schema).unwrap(), json!(true));
    assert_eq!(validate(&json!(0.0), &schema).unwrap(), json!(false));
}

#[test]
fn test_other_values_do_not_coerce_to_bool() {
    let schema = v::bool().coerce();
    for bad in [json!(2), json!(0.5), json!("maybe")] {
        let err = validate(&bad, &schema).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CoercionFailure, "input: {}", bad);
    }
}

// ==================== Interplay with the pipeline ====================

#[test]
fn test_constraints_run_on_the_coerced_value() {
    let schema = v::object([("port", v::int().coerce().range(1, 65535))]);
    let err = validate(&json!({"port": "99999"}), &schema).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::ConstraintViolation(ConstraintKind::Max)
    );
    // Post-coercion value in the error, since coercion itself succeeded.
    assert_eq!(err.value, json!(99999));
}

#[test]
fn test_coerced_value_feeds_the_custom_callback() {
    let schema = v::int()
        .coerce()
        .custom(|value| Ok(json!(value.as_i64().unwrap_or(0) * 2)));
    assert_eq!(validate(&json!("21"), &schema).unwrap(), json!(42));
}

#[test]
fn test_null_never_coerces() {
    let optional = v::object([("s", v::string().coerce().optional())]);
    let out = validate(&json!({"s": null}), &optional).unwrap();
    assert_eq!(out, json!({"s": null}));

    let required = v::object([("s", v::string().coerce())]);
    let err = validate(&json!({"s": null}), &required).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.message, "expected str, got null");
}

#[test]
fn test_list_elements_coerce_individually() {
    let schema = v::list(v::int().coerce());
    let out = validate(&json!(["1", "2", 3]), &schema).unwrap();
    assert_eq!(out, json!([1, 2, 3]));
}

#[test]
fn test_dict_values_coerce_individually() {
    let schema = v::dict(KeyKind::Str, v::float().coerce());
    let out = validate(&json!({"ratio": "0.5", "load": 2}), &schema).unwrap();
    assert_eq!(out, json!({"ratio": 0.5, "load": 2.0}));
}

#[test]
fn test_container_kinds_have_no_conversions() {
    let schema = v::list(v::int()).coerce();
    let err = validate(&json!("[1, 2]"), &schema).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);

    let schema = v::object([("a", v::int())]).coerce();
    let err = validate(&json!("{}"), &schema).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

#[test]
fn test_one_of_ignores_coercion() {
    let schema = v::one_of([1, 2, 3]).coerce();
    let err = validate(&json!("1"), &schema).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::ConstraintViolation(ConstraintKind::OneOf)
    );
}

#[test]
fn test_coercion_failure_keeps_raw_in_best_effort_output() {
    let schema = v::object([("a", v::int().coerce()), ("b", v::int().coerce())]);
    let result = collect(&json!({"a": "abc", "b": "5"}), &schema);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::CoercionFailure);
    assert_eq!(result.value, json!({"a": "abc", "b": 5}));
}
