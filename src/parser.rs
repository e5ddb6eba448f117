// Dotted-path DSL compiler
// Compiles "a.b.0" / "**.key" strings into the same Spec variants the
// structured builders produce, so both surfaces evaluate identically.

use thiserror::Error;

use crate::spec::Spec;

/// Compile-time failures of the dotted DSL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("invalid spec: empty expression")]
    Empty,

    #[error("invalid spec: empty segment in {0:?}")]
    EmptySegment(String),

    #[error("invalid spec: `**` must be a standalone segment in {0:?}")]
    EmbeddedWildcard(String),

    #[error("invalid spec: `**` must be followed by a target key in {0:?}")]
    DanglingWildcard(String),

    #[error("invalid spec: more than one `**` in {0:?}")]
    RepeatedWildcard(String),
}

/// Compile a dotted path expression into a Spec.
///
/// Grammar: `.`-separated segments. All-digit segments (without leading
/// zeros) address Array positions, everything else addresses Object fields.
/// A standalone `**` segment turns into a recursive search, consuming the
/// rest of the expression as the target key: `"**.humans"` finds the first
/// Object field named `humans` anywhere in the tree.
///
/// ```
/// use treeglom::parser::parse;
/// use treeglom::{glom, tree};
///
/// let data = tree!({"a": {"b": [1.0, 2.0]}});
/// let spec = parse("a.b.1").unwrap();
/// assert_eq!(glom(&data, &spec).unwrap(), tree!(2.0));
/// ```
pub fn parse(expr: &str) -> Result<Spec, SpecError> {
    if expr.is_empty() {
        return Err(SpecError::Empty);
    }

    let segments: Vec<&str> = expr.split('.').collect();
    let mut stages = Vec::new();
    let mut rest = &segments[..];

    while let Some((segment, tail)) = rest.split_first() {
        if segment.is_empty() {
            return Err(SpecError::EmptySegment(expr.to_string()));
        }
        if *segment == "**" {
            let key = compile_search_key(expr, tail)?;
            stages.push(Spec::search(key));
            rest = &[];
            break;
        }
        if segment.contains("**") {
            return Err(SpecError::EmbeddedWildcard(expr.to_string()));
        }
        stages.push(compile_segment(segment));
        rest = tail;
    }
    debug_assert!(rest.is_empty());

    if stages.len() == 1 {
        Ok(stages.pop().unwrap_or(Spec::Sequence(Vec::new())))
    } else {
        Ok(Spec::Sequence(stages))
    }
}

/// The suffix after `**`, joined back with `.`, becomes the search key.
fn compile_search_key(expr: &str, tail: &[&str]) -> Result<String, SpecError> {
    if tail.is_empty() {
        return Err(SpecError::DanglingWildcard(expr.to_string()));
    }
    for segment in tail {
        if segment.is_empty() {
            return Err(SpecError::EmptySegment(expr.to_string()));
        }
        if segment.contains("**") {
            return Err(SpecError::RepeatedWildcard(expr.to_string()));
        }
    }
    Ok(tail.join("."))
}

fn compile_segment(segment: &str) -> Spec {
    let digit_only = segment.bytes().all(|b| b.is_ascii_digit());
    let leading_zero = segment.len() > 1 && segment.starts_with('0');
    if digit_only && !leading_zero {
        match segment.parse() {
            Ok(i) => Spec::Index(i),
            Err(_) => Spec::key(segment),
        }
    } else {
        Spec::key(segment)
    }
}
