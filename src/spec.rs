// Spec: the closed algebra of query/transform descriptors
// Mirrors the role of an AST: parse/build once, evaluate many times.

use std::fmt;
use std::rc::Rc;

use crate::assign::KeyPath;
use crate::evaluator::EvalError;
use crate::value::Value;

/// Result mode for the iterating combinators.
///
/// `First` stops at the first qualifying element; `All` produces every
/// qualifying element, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterMode {
    First,
    All,
}

/// The fallback of a `Coalesce` spec: a factory invoked with the original
/// input value once every alternative has failed. Its own failure propagates.
///
/// Wraps an `Rc<dyn Fn>` so Specs stay cheaply cloneable descriptors.
#[derive(Clone)]
pub struct Fallback(Rc<dyn Fn(&Value) -> Result<Value, EvalError>>);

impl Fallback {
    /// Fallback from an arbitrary factory function.
    pub fn new(f: impl Fn(&Value) -> Result<Value, EvalError> + 'static) -> Self {
        Fallback(Rc::new(f))
    }

    /// Fallback that ignores the input and produces a constant.
    pub fn value(v: Value) -> Self {
        Fallback(Rc::new(move |_| Ok(v.clone())))
    }

    /// Invoke the factory with the original input.
    pub fn produce(&self, input: &Value) -> Result<Value, EvalError> {
        (self.0)(input)
    }
}

impl PartialEq for Fallback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fallback(..)")
    }
}

/// An immutable descriptor of a query/transform operation over a Value.
///
/// Specs are pure data: building one performs no evaluation and takes no
/// ownership of any input tree. The evaluator interprets them recursively.
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    /// Constant result, ignores the input.
    Literal(Value),

    /// Project a field from an Object. PathNotFound if the field is absent
    /// or the input is not an Object.
    Key(String),

    /// Project an element from an Array. PathNotFound if the index is out of
    /// range or the input is not an Array.
    Index(usize),

    /// Left-to-right pipeline: each stage's output feeds the next.
    /// Fails at the first failing stage, later stages never run.
    Sequence(Vec<Spec>),

    /// Apply `inner` to each element of an iterable input (Array, or Object
    /// taken as its `[key, value]` entry pairs). With no inner spec the
    /// elements pass through by identity. `First` yields one element, `All`
    /// yields the sequence of per-element successes (failures skipped).
    Iterate {
        inner: Option<Box<Spec>>,
        mode: IterMode,
    },

    /// Reinterpret an Object as an Array of `[key, value]` pairs.
    Entries,

    /// Unbounded-depth, pre-order search for an Object field named `key`,
    /// anywhere in the tree. Object fields are visited in stored key order,
    /// Array elements by index; matched subtrees are themselves searched.
    Search { key: String, mode: IterMode },

    /// Fold an Array of single-entry Objects into one Object. Later entries
    /// overwrite earlier ones for the same key; the key keeps its first-seen
    /// position in the output.
    Merge,

    /// Try alternatives in order; the first success wins. If every
    /// alternative fails, the fallback is invoked with the original input.
    Coalesce { alts: Vec<Spec>, default: Fallback },

    /// Evaluate `target` and `value` against the input, then write the value
    /// result into the target tree at `path`, creating intermediate Objects
    /// as needed. Produces the updated target root.
    Assign {
        target: Box<Spec>,
        path: KeyPath,
        value: Box<Spec>,
    },

    /// Build an Object from (key-spec, value-spec) pairs, each evaluated
    /// against the input. Key specs must produce Strings.
    Object(Vec<(Spec, Spec)>),
}

// ── Builder conveniences ─────────────────────────────────────────────────────

impl Spec {
    pub fn literal(v: impl Into<Value>) -> Self {
        Spec::Literal(v.into())
    }

    pub fn key(name: impl Into<String>) -> Self {
        Spec::Key(name.into())
    }

    pub fn index(i: usize) -> Self {
        Spec::Index(i)
    }

    pub fn seq(stages: impl IntoIterator<Item = Spec>) -> Self {
        Spec::Sequence(stages.into_iter().collect())
    }

    /// Iterate elements by identity.
    pub fn iterate(mode: IterMode) -> Self {
        Spec::Iterate { inner: None, mode }
    }

    /// Iterate elements through an inner spec.
    pub fn iterate_with(inner: Spec, mode: IterMode) -> Self {
        Spec::Iterate {
            inner: Some(Box::new(inner)),
            mode,
        }
    }

    /// First element of the input sequence (glom's `Iter().first()`).
    pub fn first() -> Self {
        Spec::iterate(IterMode::First)
    }

    pub fn entries() -> Self {
        Spec::Entries
    }

    /// First match of a recursive wildcard search.
    pub fn search(key: impl Into<String>) -> Self {
        Spec::Search {
            key: key.into(),
            mode: IterMode::First,
        }
    }

    /// All matches of a recursive wildcard search, in pre-order.
    pub fn search_all(key: impl Into<String>) -> Self {
        Spec::Search {
            key: key.into(),
            mode: IterMode::All,
        }
    }

    pub fn merge() -> Self {
        Spec::Merge
    }

    pub fn coalesce(alts: impl IntoIterator<Item = Spec>, default: Fallback) -> Self {
        Spec::Coalesce {
            alts: alts.into_iter().collect(),
            default,
        }
    }

    pub fn assign(target: Spec, path: KeyPath, value: Spec) -> Self {
        Spec::Assign {
            target: Box::new(target),
            path,
            value: Box::new(value),
        }
    }

    pub fn object(pairs: impl IntoIterator<Item = (Spec, Spec)>) -> Self {
        Spec::Object(pairs.into_iter().collect())
    }
}
