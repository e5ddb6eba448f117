// Flattener
// Linearizes a tree into a single-level ordered mapping keyed by dotted paths.

use indexmap::IndexMap;

use crate::assign::{assign, KeyPath, PathSegment};
use crate::evaluator::EvalError;
use crate::value::Value;

/// Flatten a tree into an ordered single-level mapping.
///
/// Every leaf (Null, Bool, Number, String) appears exactly once, keyed by
/// its full path with segments joined by `.` and Array indices in decimal:
/// `{"a": [1, 2], "b": {"c": 3}}` flattens to
/// `{"a.0": 1, "a.1": 2, "b.c": 3}`. Keys follow depth-first traversal
/// order, so the mapping reads like the document. A scalar root flattens to
/// a single entry under the empty key; empty containers contribute nothing.
///
/// Distinct paths can stringify to the same joined key when a field name
/// itself contains `.` (or is digit-shaped beside a sibling array). Such
/// collisions resolve last-write-wins with the key's first-seen position
/// kept, the same policy Merge uses.
pub fn flatten(value: &Value) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    flatten_into(value, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut IndexMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter() {
                flatten_into(child, join(&prefix, key), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, join(&prefix, &i.to_string()), out);
            }
        }
        leaf => {
            out.insert(prefix, leaf.clone());
        }
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

/// Rebuild a tree from a flattened mapping by assigning each entry into an
/// empty Object root, in mapping order.
///
/// Inverse of [`flatten`] for trees without Arrays: assignment materializes
/// missing positions as Objects only, so an Array flattened to `"a.0"` keys
/// comes back as an Object with field `"0"`. Fails only if the mapping's
/// keys collide in shape (a prefix of one path holding a leaf of another).
pub fn unflatten(entries: &IndexMap<String, Value>) -> Result<Value, EvalError> {
    let mut root = Value::empty_object();
    for (key, value) in entries.iter() {
        if key.is_empty() {
            // a flattened scalar root
            root = value.clone();
            continue;
        }
        let segments: Vec<PathSegment> = key.split('.').map(PathSegment::from).collect();
        root = assign(&root, &KeyPath::new(segments), value.clone())?;
    }
    Ok(root)
}
