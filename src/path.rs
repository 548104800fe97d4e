//! Error-path bookkeeping.
//!
//! Every validation error names the location of the offending value as a
//! path from the document root. Paths are kept as typed segments rather
//! than pre-rendered strings, so the renderer controls formatting in one
//! place and traversal can push and pop segments cheaply.

use std::fmt;

use serde::{Serialize, Serializer};

/// One step into a nested structure: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A field name inside a mapping.
    Key(String),
    /// An element index inside a sequence.
    Index(usize),
}

/// Ordered segments from the document root to a value.
///
/// Rendering joins keys with `.` and indexes in bracket notation, so a
/// failure two levels down in a list reads `servers[0].port`. The empty
/// path denotes the root value itself and renders as `$root`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The empty path, addressing the validated root value.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub(crate) fn push_key(&mut self, key: &str) {
        self.0.push(PathSegment::Key(key.to_string()));
    }

    pub(crate) fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Path(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$root");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        write!(f, ".{}", key)?;
                    } else {
                        write!(f, "{}", key)?;
                    }
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

// Paths serialize as their rendered form so error payloads stay compact.
impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
