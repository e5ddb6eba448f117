// treeglom - declarative querying and restructuring of JSON-like trees
// Licensed under the MIT License

//! # treeglom
//!
//! A small interpreter over a spec algebra applied to a generic tree value:
//! compose navigation, iteration, recursive wildcard search, merging,
//! ordered fallback, and path-creating assignment into declarative
//! query/transform pipelines over JSON-like data.
//!
//! ## Architecture
//!
//! - `value` - the ordered, Rc-wrapped tree type all data flows through
//! - `spec` - the closed algebra of query/transform descriptors
//! - `parser` - the dotted-path DSL compiler (`"a.b.0"`, `"**.key"`)
//! - `evaluator` - recursive interpretation of a Spec against a Value
//! - `assign` - path navigation with copy-on-write, path-creating writes
//! - `flatten` - tree to single-level dotted mapping, and back
//!
//! ## Example
//!
//! ```
//! use treeglom::{glom, glom_path, tree, Spec};
//!
//! let planets = tree!({
//!     "pluto": {"moons": 6.0, "population": null},
//!     "earth": {"moons": 1.0, "population": {"humans": 7700000000.0}},
//! });
//!
//! // dotted DSL
//! assert_eq!(glom_path(&planets, "earth.moons").unwrap(), tree!(1.0));
//!
//! // recursive wildcard search
//! assert_eq!(glom_path(&planets, "**.humans").unwrap(), tree!(7700000000.0));
//!
//! // structured specs compose the same way
//! let spec = Spec::seq([Spec::key("pluto"), Spec::key("moons")]);
//! assert_eq!(glom(&planets, &spec).unwrap(), tree!(6.0));
//! ```

use thiserror::Error;

pub mod assign;
pub mod evaluator;
pub mod flatten;
pub mod parser;
pub mod spec;
pub mod value;

pub use assign::{assign, KeyPath, PathSegment};
pub use evaluator::{glom, ElementIter, EvalError, Evaluator, IterAll, SearchIter};
pub use flatten::{flatten, unflatten};
pub use parser::{parse, SpecError};
pub use spec::{Fallback, IterMode, Spec};
pub use value::Value;

/// Any failure the engine can produce: a malformed spec expression at
/// compile time, or a typed evaluation failure at run time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlomError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Compile a dotted path expression and evaluate it against a tree in one
/// step. Compile the spec once with [`parser::parse`] instead when it will
/// be evaluated repeatedly.
pub fn glom_path(data: &Value, expr: &str) -> Result<Value, GlomError> {
    let spec = parser::parse(expr)?;
    Ok(glom(data, &spec)?)
}
