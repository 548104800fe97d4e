//! vschema - declarative validation, coercion, and migration for
//! semi-structured data.
//!
//! A schema is an immutable tree built with the [`v`] constructors and
//! refined by chaining modifiers. Validation walks a raw
//! [`serde_json::Value`] against that tree and returns either the
//! validated (possibly coerced and defaulted) value or errors qualified
//! by their path from the document root.
//!
//! ```
//! use serde_json::json;
//! use vschema::{v, validate};
//!
//! let schema = v::object([
//!     ("host", v::string().default("localhost")),
//!     ("port", v::int().range(1, 65535).default(5432)),
//! ]);
//!
//! let config = validate(&json!({"port": 8080}), &schema).unwrap();
//! assert_eq!(config, json!({"host": "localhost", "port": 8080}));
//! ```
//!
//! # Design principles
//!
//! - Schemas are immutable after construction and safe to share across
//!   threads; validation never mutates them.
//! - Two failure modes over one traversal: fail-fast ([`validate`],
//!   [`validate_with`]) returns the first error, collect-all
//!   ([`validate_all`]) reports every error with a best-effort value.
//! - Builder misuse panics at construction time; problems in the data
//!   are always returned as [`ValidationError`] values.
//! - Recursion over input is bounded ([`Options::max_depth`]), so
//!   adversarially deep documents fail cleanly instead of overflowing
//!   the stack.

mod coerce;
mod errors;
mod path;
mod preprocess;
mod sample;
mod types;
pub mod v;
mod validator;

pub use errors::{ConstraintKind, ErrorKind, ValidationError, ValidationResult};
pub use path::{Path, PathSegment};
pub use preprocess::Migration;
pub use sample::generate_sample;
pub use types::{Bound, KeyKind, SchemaKind, SchemaNode};
pub use validator::{validate, validate_all, validate_with, Options, DEFAULT_MAX_DEPTH};
