//! Schema tree representation.
//!
//! A schema is a tree of [`SchemaNode`]s: a closed kind enum dispatched by
//! exhaustive `match` in the engine, plus kind-independent modifiers
//! (optional, default, coercion, conditional gating, custom callbacks,
//! documentation metadata). Kind-specific constraints live in the variant
//! payload: a compiled pattern for strings, inclusive bounds for numbers.
//!
//! Nodes are immutable once built. Every modifier consumes the node and
//! returns the augmented copy, so a kept reference never observes later
//! changes and finished trees are safe to share across threads. Applying
//! a modifier to a kind that does not support it is a programmer error
//! and panics at construction time; data problems are always reported as
//! error values instead.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

/// Key discipline for dict schemas.
///
/// Raw-value mappings always carry string keys on the wire; `Int`
/// additionally requires each key to be the lexical form of a 64-bit
/// integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Str,
    Int,
}

impl KeyKind {
    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            KeyKind::Str => "str",
            KeyKind::Int => "int",
        }
    }
}

/// Numeric bound argument accepted by `range`, `min`, and `max`.
///
/// Integer literals convert to `Bound::Int` and float literals to
/// `Bound::Float`, so `int().range(1, 65535)` and
/// `float().range(0.0, 1.0)` both read naturally. Int nodes reject float
/// bounds at construction time; float nodes accept either.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Int(i64),
    Float(f64),
}

impl Bound {
    fn as_f64(&self) -> f64 {
        match self {
            Bound::Int(i) => *i as f64,
            Bound::Float(f) => *f,
        }
    }

    /// True when `self` is strictly greater than `other`. Int pairs
    /// compare exactly; adjacent i64 values near 2^63 collapse to the
    /// same f64.
    fn exceeds(&self, other: &Bound) -> bool {
        match (self, other) {
            (Bound::Int(a), Bound::Int(b)) => a > b,
            _ => self.as_f64() > other.as_f64(),
        }
    }
}

impl From<i32> for Bound {
    fn from(value: i32) -> Self {
        Bound::Int(value as i64)
    }
}

impl From<i64> for Bound {
    fn from(value: i64) -> Self {
        Bound::Int(value)
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Bound::Float(value)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Int(i) => write!(f, "{}", i),
            Bound::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Closed set of schema node kinds.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// UTF-8 string, optionally constrained by a compiled pattern.
    Str { regex: Option<Regex> },
    /// 64-bit signed integer with optional inclusive bounds.
    Int { min: Option<i64>, max: Option<i64> },
    /// 64-bit float with optional inclusive bounds.
    Float { min: Option<f64>, max: Option<f64> },
    /// Boolean.
    Bool,
    /// Homogeneous sequence whose elements validate against one schema.
    List { item: Box<SchemaNode> },
    /// Homogeneous mapping with a key discipline and one value schema.
    Dict { key: KeyKind, value: Box<SchemaNode> },
    /// Enumerated choice: the value must equal one of the literals.
    OneOf { choices: Vec<Value> },
    /// Nested mapping with named per-field schemas, in declaration order.
    Object { fields: Vec<(String, SchemaNode)> },
}

impl SchemaKind {
    /// Kind name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Str { .. } => "str",
            SchemaKind::Int { .. } => "int",
            SchemaKind::Float { .. } => "float",
            SchemaKind::Bool => "bool",
            SchemaKind::List { .. } => "list",
            SchemaKind::Dict { .. } => "dict",
            SchemaKind::OneOf { .. } => "oneof",
            SchemaKind::Object { .. } => "object",
        }
    }
}

/// Caller-supplied transform or check, run as the final validation step.
///
/// `Ok(v)` replaces the value in the output; `Err(message)` fails the
/// field with a custom-validation error.
#[derive(Clone)]
pub struct CustomFn(Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>);

impl CustomFn {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        CustomFn(Arc::new(f))
    }

    pub(crate) fn call(&self, value: &Value) -> Result<Value, String> {
        (self.0)(value)
    }
}

impl fmt::Debug for CustomFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomFn")
    }
}

/// Caller-supplied conditional gate over the root document.
#[derive(Clone)]
pub struct WhenFn(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl WhenFn {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        WhenFn(Arc::new(f))
    }

    pub(crate) fn call(&self, root: &Value) -> bool {
        (self.0)(root)
    }
}

impl fmt::Debug for WhenFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WhenFn")
    }
}

/// One validation unit: a kind plus kind-independent modifiers.
///
/// Built through the constructors in [`crate::v`] and refined by chaining
/// the modifier methods below, each of which consumes the node and
/// returns the extended copy.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) kind: SchemaKind,
    pub(crate) optional: bool,
    pub(crate) default: Option<Value>,
    pub(crate) examples: Vec<Value>,
    pub(crate) description: Option<String>,
    pub(crate) coerce: bool,
    pub(crate) custom: Option<CustomFn>,
    pub(crate) when: Option<WhenFn>,
}

impl SchemaNode {
    pub(crate) fn new(kind: SchemaKind) -> Self {
        SchemaNode {
            kind,
            optional: false,
            default: None,
            examples: Vec::new(),
            description: None,
            coerce: false,
            custom: None,
            when: None,
        }
    }

    /// The node's kind, for schema introspection.
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Whether absence of this field is accepted.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Marks the field as optional: absence is not an error, and an
    /// explicit null passes through unvalidated.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sets the value substituted when the field is absent. A field with
    /// a default is automatically optional.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.optional = true;
        self
    }

    /// Attaches example values, used by sample generation and doc tooling.
    pub fn examples<I, T>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a human-readable description. Carried as metadata only;
    /// validation behavior is unaffected.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Enables best-effort conversion of mistyped raw values before the
    /// type check. Only scalar kinds define conversions.
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Sets the custom callback, replacing any previous one. The callback
    /// runs last, after coercion, constraints, and (for containers) child
    /// validation; `Ok(v)` becomes the output value, `Err(message)` fails
    /// the field.
    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.custom = Some(CustomFn::new(f));
        self
    }

    /// Gates the field on a predicate over the root document (as it
    /// stands after migration and base-merge). When the predicate is
    /// false the field is excluded from validation entirely and any
    /// present value passes through untouched.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.when = Some(WhenFn::new(predicate));
        self
    }

    /// Constrains a string node to match `pattern`. Matching is anchored
    /// at the start of the string; end the pattern with `$` to require
    /// the whole string to match.
    ///
    /// # Panics
    ///
    /// Panics if the node is not a string schema or the pattern does not
    /// compile.
    pub fn regex(mut self, pattern: &str) -> Self {
        match &mut self.kind {
            SchemaKind::Str { regex } => {
                let compiled = match Regex::new(pattern) {
                    Ok(re) => re,
                    Err(e) => panic!("regex(): invalid pattern '{}': {}", pattern, e),
                };
                *regex = Some(compiled);
            }
            other => panic!("regex() applies to str schemas, not {}", other.name()),
        }
        self
    }

    /// Sets the inclusive lower bound of a numeric node.
    ///
    /// # Panics
    ///
    /// Panics if the node is not numeric, or if a float bound is given
    /// for an int node.
    pub fn min(mut self, bound: impl Into<Bound>) -> Self {
        self.set_min(bound.into());
        self
    }

    /// Sets the inclusive upper bound of a numeric node.
    ///
    /// # Panics
    ///
    /// Panics if the node is not numeric, or if a float bound is given
    /// for an int node.
    pub fn max(mut self, bound: impl Into<Bound>) -> Self {
        self.set_max(bound.into());
        self
    }

    /// Sets both inclusive bounds of a numeric node.
    ///
    /// # Panics
    ///
    /// Panics if the node is not numeric, if a float bound is given for
    /// an int node, or if `min` exceeds `max`.
    pub fn range(mut self, min: impl Into<Bound>, max: impl Into<Bound>) -> Self {
        let (lo, hi) = (min.into(), max.into());
        if lo.exceeds(&hi) {
            panic!("range(): minimum {} exceeds maximum {}", lo, hi);
        }
        self.set_min(lo);
        self.set_max(hi);
        self
    }

    fn set_min(&mut self, bound: Bound) {
        match &mut self.kind {
            SchemaKind::Int { min, .. } => *min = Some(int_bound(bound, "min")),
            SchemaKind::Float { min, .. } => *min = Some(bound.as_f64()),
            other => panic!("min() applies to int and float schemas, not {}", other.name()),
        }
    }

    fn set_max(&mut self, bound: Bound) {
        match &mut self.kind {
            SchemaKind::Int { max, .. } => *max = Some(int_bound(bound, "max")),
            SchemaKind::Float { max, .. } => *max = Some(bound.as_f64()),
            other => panic!("max() applies to int and float schemas, not {}", other.name()),
        }
    }
}

fn int_bound(bound: Bound, which: &str) -> i64 {
    match bound {
        Bound::Int(i) => i,
        Bound::Float(f) => panic!("{}(): int schema requires an integer bound, got {}", which, f),
    }
}
