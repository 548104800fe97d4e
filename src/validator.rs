//! Recursive validation engine.
//!
//! One tree walk implements both failure modes. Fail-fast reports the
//! first error through `Result` and stops; collect-all records every
//! error and keeps walking, producing a best-effort value alongside the
//! error list. The walk is pre-order with a fixed child order (schema
//! declaration order for object fields, ascending index for list
//! elements, ascending key for dict entries), so the fail-fast error is
//! always the first entry of the collect-all list.
//!
//! Per node the steps run in a fixed sequence: conditional gate,
//! presence handling (default substitution, optional/partial absence),
//! null passthrough for optional fields, depth bound, opt-in coercion,
//! type check, constraint checks, child recursion for containers, and
//! the custom callback last. Validation never mutates the schema and is
//! deterministic for identical inputs.

use regex::Regex;
use serde_json::{Map, Value};

use crate::coerce::{self, CoerceOutcome};
use crate::errors::{ConstraintKind, ValidationError, ValidationResult};
use crate::path::Path;
use crate::preprocess::{merge_base, Migration};
use crate::types::{KeyKind, SchemaKind, SchemaNode};

/// Default recursion bound. Input nested deeper than this fails with a
/// depth error instead of exhausting the stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Validation options, applied uniformly to the whole tree.
#[derive(Debug, Clone)]
pub struct Options {
    /// Relaxes missing-field errors at every depth, for validating
    /// partial documents such as configuration patches.
    pub partial: bool,
    /// Structure whose values fill keys missing from the input,
    /// recursively, before validation.
    pub base: Option<Value>,
    /// Top-level key migration applied before the base merge.
    pub migrate: Option<Migration>,
    /// Recursion bound; input nested deeper fails validation.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            partial: false,
            base: None,
            migrate: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn base(mut self, base: Value) -> Self {
        self.base = Some(base);
        self
    }

    pub fn migrate(mut self, migration: Migration) -> Self {
        self.migrate = Some(migration);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Validates `data` against `schema` with default options, returning the
/// validated (and possibly coerced or defaulted) value or the first
/// error encountered in traversal order.
pub fn validate(data: &Value, schema: &SchemaNode) -> Result<Value, ValidationError> {
    validate_with(data, schema, &Options::default())
}

/// Fail-fast validation with explicit options.
pub fn validate_with(
    data: &Value,
    schema: &SchemaNode,
    options: &Options,
) -> Result<Value, ValidationError> {
    let prepared = preprocess(data, options);
    let mut walker = Walker {
        root: &prepared,
        partial: options.partial,
        max_depth: options.max_depth,
        mode: Mode::FailFast,
        errors: Vec::new(),
    };
    let mut path = Path::root();
    let out = walker.walk(Some(&prepared), schema, &mut path, 0)?;
    Ok(out.unwrap_or_else(|| prepared.clone()))
}

/// Collect-all validation: walks the entire tree regardless of failures
/// and reports every error, alongside a best-effort output value.
pub fn validate_all(data: &Value, schema: &SchemaNode, options: &Options) -> ValidationResult {
    let prepared = preprocess(data, options);
    let mut walker = Walker {
        root: &prepared,
        partial: options.partial,
        max_depth: options.max_depth,
        mode: Mode::CollectAll,
        errors: Vec::new(),
    };
    let mut path = Path::root();
    let out = match walker.walk(Some(&prepared), schema, &mut path, 0) {
        Ok(value) => value,
        // Collect mode never aborts.
        Err(_) => None,
    };
    ValidationResult {
        value: out.unwrap_or_else(|| prepared.clone()),
        errors: walker.errors,
    }
}

fn preprocess(data: &Value, options: &Options) -> Value {
    let mut prepared = match &options.migrate {
        Some(migration) => migration.apply(data),
        None => data.clone(),
    };
    if let Some(base) = &options.base {
        prepared = merge_base(&prepared, base);
    }
    prepared
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    FailFast,
    CollectAll,
}

/// Traversal state threaded through the walk. `root` is the document
/// after preprocessing; `when` predicates receive it, never the
/// original input.
struct Walker<'a> {
    root: &'a Value,
    partial: bool,
    max_depth: usize,
    mode: Mode,
    errors: Vec<ValidationError>,
}

/// `Ok(Some(v))` is the validated value, `Ok(None)` means the field is
/// omitted from the output. `Err` occurs only in fail-fast mode.
type Step = Result<Option<Value>, ValidationError>;

impl Walker<'_> {
    /// Records an error; in fail-fast mode it aborts the traversal.
    fn emit(&mut self, error: ValidationError) -> Result<(), ValidationError> {
        match self.mode {
            Mode::FailFast => Err(error),
            Mode::CollectAll => {
                self.errors.push(error);
                Ok(())
            }
        }
    }

    /// Validates `value` (or its absence) against `node`.
    fn walk(
        &mut self,
        value: Option<&Value>,
        node: &SchemaNode,
        path: &mut Path,
        depth: usize,
    ) -> Step {
        // A false predicate removes the field from validation entirely;
        // a present value passes through untouched.
        if let Some(when) = &node.when {
            if !when.call(self.root) {
                return Ok(value.cloned());
            }
        }

        let raw = match value {
            Some(v) => v,
            None => {
                if let Some(default) = &node.default {
                    return Ok(Some(default.clone()));
                }
                if node.optional || self.partial {
                    return Ok(None);
                }
                self.emit(ValidationError::missing_field(path.clone()))?;
                return Ok(None);
            }
        };

        // An explicit null on an optional field carries through without
        // further checks; on a required field it falls into the type
        // check below (null never coerces).
        if raw.is_null() && node.optional {
            return Ok(Some(Value::Null));
        }

        if depth > self.max_depth {
            self.emit(ValidationError::depth_exceeded(path.clone(), self.max_depth, raw))?;
            return Ok(Some(raw.clone()));
        }

        match &node.kind {
            SchemaKind::Str { regex } => self.walk_str(raw, node, regex.as_ref(), path),
            SchemaKind::Int { min, max } => self.walk_int(raw, node, *min, *max, path),
            SchemaKind::Float { min, max } => self.walk_float(raw, node, *min, *max, path),
            SchemaKind::Bool => self.walk_bool(raw, node, path),
            SchemaKind::OneOf { choices } => self.walk_one_of(raw, node, choices, path),
            SchemaKind::List { item } => self.walk_list(raw, node, item, path, depth),
            SchemaKind::Dict { key, value } => {
                self.walk_dict(raw, node, *key, value, path, depth)
            }
            SchemaKind::Object { fields } => self.walk_object(raw, node, fields, path, depth),
        }
    }

    /// Runs opt-in coercion. `Ok(None)` means the coercion failed and
    /// the error was already recorded. Null is exempt so that a required
    /// null reports a type mismatch, not a coercion failure.
    fn coerced(&mut self, raw: &Value, node: &SchemaNode, path: &mut Path) -> Step {
        if !node.coerce || raw.is_null() {
            return Ok(Some(raw.clone()));
        }
        match coerce::coerce_to(raw, &node.kind) {
            CoerceOutcome::Unchanged => Ok(Some(raw.clone())),
            CoerceOutcome::Coerced(value) => Ok(Some(value)),
            CoerceOutcome::Failed(message) => {
                self.emit(ValidationError::coercion(path.clone(), message, raw))?;
                Ok(None)
            }
        }
    }

    /// Applies the custom callback as the final step. On rejection the
    /// best-effort output keeps the raw input value.
    fn finish(&mut self, current: Value, node: &SchemaNode, raw: &Value, path: &mut Path) -> Step {
        match &node.custom {
            None => Ok(Some(current)),
            Some(callback) => match callback.call(&current) {
                Ok(value) => Ok(Some(value)),
                Err(message) => {
                    self.emit(ValidationError::custom(path.clone(), message, &current))?;
                    Ok(Some(raw.clone()))
                }
            },
        }
    }

    fn walk_str(
        &mut self,
        raw: &Value,
        node: &SchemaNode,
        regex: Option<&Regex>,
        path: &mut Path,
    ) -> Step {
        let current = match self.coerced(raw, node, path)? {
            Some(value) => value,
            None => return Ok(Some(raw.clone())),
        };
        let text = match current.as_str() {
            Some(text) => text,
            None => {
                self.emit(ValidationError::type_mismatch(path.clone(), "str", &current))?;
                return Ok(Some(raw.clone()));
            }
        };
        if let Some(re) = regex {
            // Patterns match from the start of the string; `$` in the
            // pattern still controls the end.
            let matched = re.find(text).map_or(false, |m| m.start() == 0);
            if !matched {
                let message =
                    format!("value '{}' does not match pattern '{}'", text, re.as_str());
                self.emit(ValidationError::constraint(
                    path.clone(),
                    ConstraintKind::Regex,
                    message,
                    &current,
                ))?;
                return Ok(Some(raw.clone()));
            }
        }
        self.finish(current, node, raw, path)
    }

    fn walk_int(
        &mut self,
        raw: &Value,
        node: &SchemaNode,
        min: Option<i64>,
        max: Option<i64>,
        path: &mut Path,
    ) -> Step {
        let current = match self.coerced(raw, node, path)? {
            Some(value) => value,
            None => return Ok(Some(raw.clone())),
        };
        let number = match as_integer(&current) {
            Some(number) => number,
            None => {
                self.emit(ValidationError::type_mismatch(path.clone(), "int", &current))?;
                return Ok(Some(raw.clone()));
            }
        };
        let mut ok = true;
        if let Some(lo) = min {
            if number < i128::from(lo) {
                let message = format!("value {} is less than minimum {}", number, lo);
                self.emit(ValidationError::constraint(
                    path.clone(),
                    ConstraintKind::Min,
                    message,
                    &current,
                ))?;
                ok = false;
            }
        }
        if let Some(hi) = max {
            if number > i128::from(hi) {
                let message = format!("value {} is greater than maximum {}", number, hi);
                self.emit(ValidationError::constraint(
                    path.clone(),
                    ConstraintKind::Max,
                    message,
                    &current,
                ))?;
                ok = false;
            }
        }
        if !ok {
            return Ok(Some(raw.clone()));
        }
        self.finish(current, node, raw, path)
    }

    fn walk_float(
        &mut self,
        raw: &Value,
        node: &SchemaNode,
        min: Option<f64>,
        max: Option<f64>,
        path: &mut Path,
    ) -> Step {
        let current = match self.coerced(raw, node, path)? {
            Some(value) => value,
            None => return Ok(Some(raw.clone())),
        };
        let number = match as_float(&current) {
            Some(number) => number,
            None => {
                self.emit(ValidationError::type_mismatch(path.clone(), "float", &current))?;
                return Ok(Some(raw.clone()));
            }
        };
        let mut ok = true;
        if let Some(lo) = min {
            if number < lo {
                let message = format!("value {} is less than minimum {}", number, lo);
                self.emit(ValidationError::constraint(
                    path.clone(),
                    ConstraintKind::Min,
                    message,
                    &current,
                ))?;
                ok = false;
            }
        }
        if let Some(hi) = max {
            if number > hi {
                let message = format!("value {} is greater than maximum {}", number, hi);
                self.emit(ValidationError::constraint(
                    path.clone(),
                    ConstraintKind::Max,
                    message,
                    &current,
                ))?;
                ok = false;
            }
        }
        if !ok {
            return Ok(Some(raw.clone()));
        }
        self.finish(current, node, raw, path)
    }

    fn walk_bool(&mut self, raw: &Value, node: &SchemaNode, path: &mut Path) -> Step {
        let current = match self.coerced(raw, node, path)? {
            Some(value) => value,
            None => return Ok(Some(raw.clone())),
        };
        if !current.is_boolean() {
            self.emit(ValidationError::type_mismatch(path.clone(), "bool", &current))?;
            return Ok(Some(raw.clone()));
        }
        self.finish(current, node, raw, path)
    }

    fn walk_one_of(
        &mut self,
        raw: &Value,
        node: &SchemaNode,
        choices: &[Value],
        path: &mut Path,
    ) -> Step {
        // Membership by value equality; there is no separate type check.
        if !choices.iter().any(|choice| choice == raw) {
            let rendered: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
            let message = format!("value {} is not one of [{}]", raw, rendered.join(", "));
            self.emit(ValidationError::constraint(
                path.clone(),
                ConstraintKind::OneOf,
                message,
                raw,
            ))?;
            return Ok(Some(raw.clone()));
        }
        self.finish(raw.clone(), node, raw, path)
    }

    fn walk_list(
        &mut self,
        raw: &Value,
        node: &SchemaNode,
        item: &SchemaNode,
        path: &mut Path,
        depth: usize,
    ) -> Step {
        let array = match raw.as_array() {
            Some(array) => array,
            None => {
                self.emit(ValidationError::type_mismatch(path.clone(), "list", raw))?;
                return Ok(Some(raw.clone()));
            }
        };
        let mut out = Vec::with_capacity(array.len());
        for (index, element) in array.iter().enumerate() {
            path.push_index(index);
            let step = self.walk(Some(element), item, path, depth + 1);
            path.pop();
            match step? {
                Some(value) => out.push(value),
                None => out.push(element.clone()),
            }
        }
        self.finish(Value::Array(out), node, raw, path)
    }

    fn walk_dict(
        &mut self,
        raw: &Value,
        node: &SchemaNode,
        key_kind: KeyKind,
        value_node: &SchemaNode,
        path: &mut Path,
        depth: usize,
    ) -> Step {
        let map = match raw.as_object() {
            Some(map) => map,
            None => {
                self.emit(ValidationError::type_mismatch(path.clone(), "dict", raw))?;
                return Ok(Some(raw.clone()));
            }
        };
        let mut out = Map::new();
        // Map iteration is key-ordered, which fixes the error order.
        for (key, entry) in map {
            path.push_key(key);
            let step = self.dict_entry(key, entry, key_kind, value_node, path, depth);
            path.pop();
            let validated = step?;
            out.insert(key.clone(), validated.unwrap_or_else(|| entry.clone()));
        }
        self.finish(Value::Object(out), node, raw, path)
    }

    /// One dict entry: the key check does not stop value validation, so
    /// a bad key and a bad value both surface in collect mode.
    fn dict_entry(
        &mut self,
        key: &str,
        entry: &Value,
        key_kind: KeyKind,
        value_node: &SchemaNode,
        path: &mut Path,
        depth: usize,
    ) -> Step {
        if key_kind == KeyKind::Int && key.parse::<i64>().is_err() {
            self.emit(ValidationError::invalid_key(path.clone(), key_kind.name(), key))?;
        }
        self.walk(Some(entry), value_node, path, depth + 1)
    }

    fn walk_object(
        &mut self,
        raw: &Value,
        node: &SchemaNode,
        fields: &[(String, SchemaNode)],
        path: &mut Path,
        depth: usize,
    ) -> Step {
        let map = match raw.as_object() {
            Some(map) => map,
            None => {
                self.emit(ValidationError::type_mismatch(path.clone(), "object", raw))?;
                return Ok(Some(raw.clone()));
            }
        };
        let mut out = Map::new();
        for (name, field_node) in fields {
            path.push_key(name);
            let step = self.walk(map.get(name), field_node, path, depth + 1);
            path.pop();
            if let Some(value) = step? {
                out.insert(name.clone(), value);
            }
        }
        // Input keys not declared in the schema are dropped here.
        self.finish(Value::Object(out), node, raw, path)
    }
}

/// Integer view of a number, wide enough to hold both i64 and u64.
fn as_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i128::from(i))
            } else {
                n.as_u64().map(i128::from)
            }
        }
        _ => None,
    }
}

/// Float view of a number; integers are not floats here.
fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_f64() => n.as_f64(),
        _ => None,
    }
}
