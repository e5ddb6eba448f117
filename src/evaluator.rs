// Spec evaluator
// Pure recursive dispatch: (Spec, Value) -> Value or a typed failure.

use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::assign;
use crate::spec::{IterMode, Spec};
use crate::value::Value;

/// Evaluation failures. Every variant carries the sub-path at which the
/// failure occurred, dotted, with `$` standing for the evaluation root.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A key or index addressed nothing.
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// The value at the path has the wrong shape for the operation.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A sequence was required and the input could not provide one.
    #[error("iteration error at {path}: {reason}")]
    IterationError { path: String, reason: String },
}

// ── Element iteration ────────────────────────────────────────────────────────

/// Restartable iterator over the elements of an iterable Value: Array
/// elements in order, or Object entries as `[key, value]` pairs in stored
/// key order. Holds an Rc into the source, so constructing and cloning are
/// O(1) and independent iterations never share cursor state.
#[derive(Clone)]
pub enum ElementIter {
    Array { items: Rc<Vec<Value>>, pos: usize },
    Object {
        entries: Rc<IndexMap<String, Value>>,
        pos: usize,
    },
}

impl ElementIter {
    /// None if the value is not iterable (scalars, Null).
    pub fn over(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(ElementIter::Array {
                items: items.clone(),
                pos: 0,
            }),
            Value::Object(entries) => Some(ElementIter::Object {
                entries: entries.clone(),
                pos: 0,
            }),
            _ => None,
        }
    }
}

impl Iterator for ElementIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ElementIter::Array { items, pos } => {
                let v = items.get(*pos)?.clone();
                *pos += 1;
                Some(v)
            }
            ElementIter::Object { entries, pos } => {
                let (k, v) = entries.get_index(*pos)?;
                let pair = Value::pair(Value::string(k.as_str()), v.clone());
                *pos += 1;
                Some(pair)
            }
        }
    }
}

/// Lazy sequence behind `Iterate(.., All)`: elements mapped through the
/// inner spec, failing elements skipped. Each element is evaluated with a
/// fresh evaluator, so the sequence is deterministic and restartable.
pub struct IterAll {
    elements: ElementIter,
    inner: Option<Spec>,
}

impl IterAll {
    pub fn new(elements: ElementIter, inner: Option<Spec>) -> Self {
        IterAll { elements, inner }
    }
}

impl Iterator for IterAll {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        loop {
            let elem = self.elements.next()?;
            match &self.inner {
                None => return Some(elem),
                Some(spec) => {
                    if let Ok(v) = Evaluator::new().evaluate(spec, &elem) {
                        return Some(v);
                    }
                }
            }
        }
    }
}

// ── Recursive wildcard search ────────────────────────────────────────────────

/// Lazy pre-order search for an Object field named `key`, at any depth.
///
/// Objects are walked in stored key order, Arrays by index; a matched value
/// is yielded and then itself searched, so matches nested inside matches are
/// found, outer first. The work stack holds Rc'd cursors into the tree, so
/// constructing the iterator copies nothing and re-running it over the same
/// tree yields an identical sequence.
pub struct SearchIter {
    key: Rc<str>,
    stack: Vec<SearchFrame>,
}

enum SearchFrame {
    Object {
        entries: Rc<IndexMap<String, Value>>,
        pos: usize,
    },
    Array { items: Rc<Vec<Value>>, pos: usize },
}

impl SearchFrame {
    fn over(value: &Value) -> Option<Self> {
        match value {
            Value::Object(entries) => Some(SearchFrame::Object {
                entries: entries.clone(),
                pos: 0,
            }),
            Value::Array(items) => Some(SearchFrame::Array {
                items: items.clone(),
                pos: 0,
            }),
            _ => None,
        }
    }

    /// Next child of this frame, with whether its field name matches `key`.
    fn advance(&mut self, key: &str) -> Option<(bool, Value)> {
        match self {
            SearchFrame::Object { entries, pos } => {
                let (k, v) = entries.get_index(*pos)?;
                let hit = k.as_str() == key;
                let child = v.clone();
                *pos += 1;
                Some((hit, child))
            }
            SearchFrame::Array { items, pos } => {
                let child = items.get(*pos)?.clone();
                *pos += 1;
                Some((false, child))
            }
        }
    }
}

impl SearchIter {
    pub fn new(root: &Value, key: impl Into<Rc<str>>) -> Self {
        let mut stack = Vec::new();
        if let Some(frame) = SearchFrame::over(root) {
            stack.push(frame);
        }
        SearchIter {
            key: key.into(),
            stack,
        }
    }
}

impl Iterator for SearchIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let key = self.key.clone();
        while let Some(frame) = self.stack.last_mut() {
            match frame.advance(&key) {
                None => {
                    self.stack.pop();
                }
                Some((hit, child)) => {
                    // Descend before yielding so the child's own matches come
                    // right after it (pre-order).
                    if let Some(frame) = SearchFrame::over(&child) {
                        self.stack.push(frame);
                    }
                    if hit {
                        return Some(child);
                    }
                }
            }
        }
        None
    }
}

// ── Evaluator ────────────────────────────────────────────────────────────────

/// Interprets a Spec against a Value.
///
/// Evaluation is a pure function of its inputs: the evaluator itself only
/// carries the segment stack used to report the offending sub-path in
/// failures, and `evaluate` resets it, so one evaluator can be reused across
/// independent evaluations.
pub struct Evaluator {
    path: Vec<String>,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator { path: Vec::new() }
    }

    pub fn evaluate(&mut self, spec: &Spec, data: &Value) -> Result<Value, EvalError> {
        self.path.clear();
        self.eval(spec, data)
    }

    /// Current sub-path, for diagnostics.
    fn at(&self) -> String {
        if self.path.is_empty() {
            "$".to_string()
        } else {
            self.path.join(".")
        }
    }

    /// Current sub-path extended with one more segment.
    fn here(&self, segment: &str) -> String {
        if self.path.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{}", self.path.join("."), segment)
        }
    }

    fn eval(&mut self, spec: &Spec, data: &Value) -> Result<Value, EvalError> {
        match spec {
            Spec::Literal(v) => Ok(v.clone()),

            Spec::Key(name) => match data.get(name) {
                Some(v) => {
                    let v = v.clone();
                    self.path.push(name.clone());
                    Ok(v)
                }
                None => Err(EvalError::PathNotFound {
                    path: self.here(name),
                }),
            },

            Spec::Index(i) => match data.get_index(*i) {
                Some(v) => {
                    let v = v.clone();
                    self.path.push(i.to_string());
                    Ok(v)
                }
                None => Err(EvalError::PathNotFound {
                    path: self.here(&i.to_string()),
                }),
            },

            Spec::Sequence(stages) => {
                let mut current = data.clone();
                for stage in stages {
                    current = self.eval(stage, &current)?;
                }
                Ok(current)
            }

            Spec::Iterate { inner, mode } => self.eval_iterate(inner.as_deref(), *mode, data),

            Spec::Entries => match data {
                Value::Object(map) => Ok(Value::array(
                    map.iter()
                        .map(|(k, v)| Value::pair(Value::string(k.as_str()), v.clone()))
                        .collect(),
                )),
                other => Err(EvalError::TypeMismatch {
                    path: self.at(),
                    expected: "object",
                    found: other.type_name(),
                }),
            },

            Spec::Search { key, mode } => {
                let mut matches = SearchIter::new(data, key.as_str());
                match mode {
                    IterMode::First => match matches.next() {
                        Some(v) => Ok(v),
                        None => Err(EvalError::PathNotFound {
                            path: self.here(&format!("**.{}", key)),
                        }),
                    },
                    IterMode::All => Ok(Value::array(matches.collect())),
                }
            }

            Spec::Merge => self.eval_merge(data),

            Spec::Coalesce { alts, default } => {
                let depth = self.path.len();
                for alt in alts {
                    match self.eval(alt, data) {
                        Ok(v) => return Ok(v),
                        Err(_) => self.path.truncate(depth),
                    }
                }
                default.produce(data)
            }

            Spec::Assign {
                target,
                path,
                value,
            } => {
                let depth = self.path.len();
                let target_tree = self.eval(target, data)?;
                self.path.truncate(depth);
                let new_value = self.eval(value, data)?;
                self.path.truncate(depth);
                assign::assign(&target_tree, path, new_value)
            }

            Spec::Object(pairs) => {
                let depth = self.path.len();
                let mut out = IndexMap::new();
                for (key_spec, value_spec) in pairs {
                    let key_value = self.eval(key_spec, data)?;
                    self.path.truncate(depth);
                    let key = match key_value.as_str() {
                        Some(k) => k.to_string(),
                        None => {
                            return Err(EvalError::TypeMismatch {
                                path: self.at(),
                                expected: "string",
                                found: key_value.type_name(),
                            })
                        }
                    };
                    let value = self.eval(value_spec, data)?;
                    self.path.truncate(depth);
                    out.insert(key, value);
                }
                Ok(Value::object(out))
            }
        }
    }

    fn eval_iterate(
        &mut self,
        inner: Option<&Spec>,
        mode: IterMode,
        data: &Value,
    ) -> Result<Value, EvalError> {
        let elements = ElementIter::over(data).ok_or_else(|| EvalError::IterationError {
            path: self.at(),
            reason: format!("cannot iterate over {}", data.type_name()),
        })?;

        match mode {
            IterMode::First => {
                for elem in elements {
                    match inner {
                        None => return Ok(elem),
                        Some(spec) => {
                            if let Ok(v) = Evaluator::new().evaluate(spec, &elem) {
                                return Ok(v);
                            }
                        }
                    }
                }
                Err(EvalError::IterationError {
                    path: self.at(),
                    reason: "no element satisfied the spec".to_string(),
                })
            }
            IterMode::All => {
                let all = IterAll::new(elements, inner.cloned());
                Ok(Value::array(all.collect()))
            }
        }
    }

    fn eval_merge(&mut self, data: &Value) -> Result<Value, EvalError> {
        let arr = data.as_array().ok_or_else(|| EvalError::IterationError {
            path: self.at(),
            reason: format!(
                "merge requires an array of single-entry objects, found {}",
                data.type_name()
            ),
        })?;

        let mut out: IndexMap<String, Value> = IndexMap::new();
        for (i, elem) in arr.iter().enumerate() {
            let map = match elem.as_object() {
                Some(m) if m.len() == 1 => m,
                _ => {
                    return Err(EvalError::IterationError {
                        path: self.at(),
                        reason: format!("merge element {} is not a single-entry object", i),
                    })
                }
            };
            for (k, v) in map.iter() {
                // insert keeps the first-seen position for an existing key
                out.insert(k.clone(), v.clone());
            }
        }
        Ok(Value::object(out))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

/// Evaluate a spec against a tree, glom style.
pub fn glom(data: &Value, spec: &Spec) -> Result<Value, EvalError> {
    Evaluator::new().evaluate(spec, data)
}

// ── Tests ────────────────────────────────────────────────────────────────────
