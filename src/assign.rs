// Path resolver / assigner
// Writes a value at a dotted path, creating intermediate Objects on the way.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::evaluator::EvalError;
use crate::value::Value;

/// One step of a KeyPath: an Object field name or an Array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        PathSegment::Key(s.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        PathSegment::Key(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// An ordered sequence of segments addressing a position in a tree.
///
/// Parsed from a dotted string ("a.b.0.c"; all-digit segments become Array
/// indices) or built from segments directly when a field name is itself
/// digit-shaped or contains a dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath(Vec<PathSegment>);

impl KeyPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        KeyPath(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The dotted form of the first `n` segments, for error messages.
    pub(crate) fn prefix(&self, n: usize) -> String {
        self.0[..n]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.0.len()))
    }
}

impl FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('.')
            .filter(|seg| !seg.is_empty())
            .map(|seg| {
                if seg.bytes().all(|b| b.is_ascii_digit()) {
                    // Leading zeros would not round-trip through Display; treat
                    // them as field names, not indices.
                    if seg.len() > 1 && seg.starts_with('0') {
                        PathSegment::Key(seg.to_string())
                    } else {
                        PathSegment::Index(seg.parse().unwrap_or(0))
                    }
                } else {
                    PathSegment::Key(seg.to_string())
                }
            })
            .collect();
        Ok(KeyPath(segments))
    }
}

impl From<&str> for KeyPath {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| KeyPath(Vec::new()))
    }
}

impl From<Vec<PathSegment>> for KeyPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        KeyPath(segments)
    }
}

/// Write `new_value` into `root` at `path`, returning the updated tree.
///
/// The input tree is never mutated: the returned root shares every unchanged
/// subtree with the input and clones only the containers along the write
/// path (Rc copy-on-write). Missing or Null positions addressed by a named
/// segment are materialized as empty Objects; descending through an existing
/// scalar is a TypeMismatch naming the colliding segment. The terminal
/// segment's value is replaced unconditionally (for Array targets, index
/// `len` appends).
///
/// An empty path replaces the root outright.
pub fn assign(root: &Value, path: &KeyPath, new_value: Value) -> Result<Value, EvalError> {
    if path.is_empty() {
        return Ok(new_value);
    }
    let mut updated = root.clone();
    assign_into(&mut updated, path, 0, new_value)?;
    Ok(updated)
}

fn assign_into(
    node: &mut Value,
    path: &KeyPath,
    depth: usize,
    new_value: Value,
) -> Result<(), EvalError> {
    let terminal = depth + 1 == path.segments().len();

    match &path.segments()[depth] {
        PathSegment::Key(key) => {
            // Null positions become empty Objects on named segments.
            if node.is_null() {
                *node = Value::empty_object();
            }
            let map = match node {
                Value::Object(m) => Rc::make_mut(m),
                other => {
                    return Err(EvalError::TypeMismatch {
                        path: path.prefix(depth + 1),
                        expected: "object",
                        found: other.type_name(),
                    })
                }
            };
            if terminal {
                map.insert(key.clone(), new_value);
                return Ok(());
            }
            let child = map.entry(key.clone()).or_insert(Value::Null);
            assign_into(child, path, depth + 1, new_value)
        }
        PathSegment::Index(i) => {
            let i = *i;
            let arr = match node {
                Value::Array(a) => Rc::make_mut(a),
                other => {
                    return Err(EvalError::TypeMismatch {
                        path: path.prefix(depth + 1),
                        expected: "array",
                        found: other.type_name(),
                    })
                }
            };
            if terminal {
                if i < arr.len() {
                    arr[i] = new_value;
                } else if i == arr.len() {
                    arr.push(new_value);
                } else {
                    return Err(EvalError::PathNotFound {
                        path: path.prefix(depth + 1),
                    });
                }
                return Ok(());
            }
            let child = arr.get_mut(i).ok_or_else(|| EvalError::PathNotFound {
                path: path.prefix(depth + 1),
            })?;
            assign_into(child, path, depth + 1, new_value)
        }
    }
}
