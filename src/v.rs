//! Schema constructors.
//!
//! Entry points for building schema trees, meant to be used qualified:
//!
//! ```
//! use vschema::v;
//!
//! let schema = v::object([
//!     ("host", v::string().default("localhost")),
//!     ("port", v::int().range(1, 65535).default(5432)),
//!     ("tags", v::list(v::string()).optional()),
//! ]);
//! # let _ = schema;
//! ```
//!
//! Each constructor returns a [`SchemaNode`] that the modifier methods on
//! the node refine further. Construction mistakes (empty choice sets,
//! duplicate field names) panic immediately rather than surfacing later
//! as data errors.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::{KeyKind, SchemaKind, SchemaNode};

/// A UTF-8 string schema.
pub fn string() -> SchemaNode {
    SchemaNode::new(SchemaKind::Str { regex: None })
}

/// A 64-bit signed integer schema. Floats are rejected even when their
/// value is integral, unless coercion is enabled on the node.
pub fn int() -> SchemaNode {
    SchemaNode::new(SchemaKind::Int {
        min: None,
        max: None,
    })
}

/// A 64-bit float schema. Integer raw values are rejected unless
/// coercion is enabled on the node.
pub fn float() -> SchemaNode {
    SchemaNode::new(SchemaKind::Float {
        min: None,
        max: None,
    })
}

/// A boolean schema.
pub fn bool() -> SchemaNode {
    SchemaNode::new(SchemaKind::Bool)
}

/// A homogeneous list whose elements all validate against `item`.
pub fn list(item: SchemaNode) -> SchemaNode {
    SchemaNode::new(SchemaKind::List {
        item: Box::new(item),
    })
}

/// A homogeneous mapping: keys follow the `key` discipline, values
/// validate against `value`.
pub fn dict(key: KeyKind, value: SchemaNode) -> SchemaNode {
    SchemaNode::new(SchemaKind::Dict {
        key,
        value: Box::new(value),
    })
}

/// An enumerated choice: the value must equal one of `choices`.
///
/// # Panics
///
/// Panics if `choices` is empty.
pub fn one_of<I, T>(choices: I) -> SchemaNode
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    let choices: Vec<Value> = choices.into_iter().map(Into::into).collect();
    if choices.is_empty() {
        panic!("one_of() requires at least one choice");
    }
    SchemaNode::new(SchemaKind::OneOf { choices })
}

/// A nested mapping with named fields, validated in declaration order.
/// Input keys not declared here are dropped from the output.
///
/// # Panics
///
/// Panics if a field name appears more than once.
pub fn object<I, S>(fields: I) -> SchemaNode
where
    I: IntoIterator<Item = (S, SchemaNode)>,
    S: Into<String>,
{
    let fields: Vec<(String, SchemaNode)> = fields
        .into_iter()
        .map(|(name, node)| (name.into(), node))
        .collect();
    let mut seen = HashSet::new();
    for (name, _) in &fields {
        if !seen.insert(name.as_str()) {
            panic!("object(): duplicate field '{}'", name);
        }
    }
    SchemaNode::new(SchemaKind::Object { fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_of_accepts_mixed_literals() {
        let node = one_of([json!("auto"), json!(0), json!(false)]);
        match node.kind() {
            SchemaKind::OneOf { choices } => {
                assert_eq!(choices, &vec![json!("auto"), json!(0), json!(false)])
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    #[should_panic(expected = "at least one choice")]
    fn test_empty_one_of_panics() {
        let _ = one_of(Vec::<Value>::new());
    }

    #[test]
    #[should_panic(expected = "duplicate field 'port'")]
    fn test_duplicate_object_field_panics() {
        let _ = object([("port", int()), ("port", string())]);
    }

    #[test]
    fn test_object_preserves_declaration_order() {
        let node = object([("b", int()), ("a", int()), ("c", int())]);
        match node.kind() {
            SchemaKind::Object { fields } => {
                let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["b", "a", "c"]);
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }

    #[test]
    fn test_nested_construction() {
        let node = object([(
            "servers",
            list(object([("host", string()), ("port", int())])),
        )]);
        match node.kind() {
            SchemaKind::Object { fields } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].1.kind().name(), "list");
            }
            other => panic!("unexpected kind {}", other.name()),
        }
    }
}
