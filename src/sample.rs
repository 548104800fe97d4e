//! Representative sample generation.
//!
//! Derives a literal value from a schema tree, useful for emitting
//! starter configuration files or documentation snippets from the same
//! schema that validates them.

use serde_json::{json, Map, Value};

use crate::types::{SchemaKind, SchemaNode};

/// Derives a representative value for `schema`.
///
/// Per node the priority is: declared default, then the first example,
/// then a kind-specific stub ("example" for strings, 0 for ints, 0.0 for
/// floats, false for bools, a single generated element for lists, an
/// empty mapping for dicts, the first choice for enumerations, and a
/// recursively generated mapping for objects). Generation is pure: equal
/// schemas always produce equal samples.
pub fn generate_sample(schema: &SchemaNode) -> Value {
    if let Some(default) = &schema.default {
        return default.clone();
    }
    if let Some(example) = schema.examples.first() {
        return example.clone();
    }
    match schema.kind() {
        SchemaKind::Str { .. } => json!("example"),
        SchemaKind::Int { .. } => json!(0),
        SchemaKind::Float { .. } => json!(0.0),
        SchemaKind::Bool => json!(false),
        SchemaKind::List { item } => Value::Array(vec![generate_sample(item)]),
        SchemaKind::Dict { .. } => Value::Object(Map::new()),
        SchemaKind::OneOf { choices } => choices.first().cloned().unwrap_or(Value::Null),
        SchemaKind::Object { fields } => {
            let mut out = Map::new();
            for (name, node) in fields {
                out.insert(name.clone(), generate_sample(node));
            }
            Value::Object(out)
        }
    }
}
