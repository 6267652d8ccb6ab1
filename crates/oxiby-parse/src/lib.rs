//! The parse engine: a table-driven shift/reduce automaton over a loaded
//! [`Language`], producing a [`SyntaxTree`] for every input.
//!
//! Syntax errors never fail a parse; they surface as `ERROR` nodes in the
//! tree plus diagnostics riding on it. The only failure mode is handing the
//! engine a definition built for a different table-format revision.

mod engine;
#[cfg(test)]
mod tests;

use oxiby_language::Language;
pub use oxiby_tree::SyntaxTree;

/// Table-format revision this engine drives. Definitions are checked against
/// it before any work happens.
pub const ENGINE_VERSION: u16 = oxiby_language::ABI_VERSION;

/// Parses `text` with a loaded language definition.
///
/// Always returns a tree whose root spans the whole input, with malformed
/// spans represented as `ERROR` nodes; structurally identical trees for
/// identical `(language, text)` pairs. `previous` is accepted for subtree
/// reuse compatibility; the current engine reparses from scratch.
pub fn parse(
    language: &Language,
    text: &str,
    previous: Option<&SyntaxTree>,
) -> Result<SyntaxTree, ParseError> {
    if language.version() != ENGINE_VERSION {
        return Err(ParseError::EngineVersionMismatch {
            found: language.version(),
            expected: ENGINE_VERSION,
        });
    }
    let _ = previous;
    Ok(engine::run(language, text))
}

/// Failures raised before parsing begins. Malformed input is not one of
/// them; it produces `ERROR` nodes instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(
        "language definition targets table format {found}, engine supports {expected}"
    )]
    EngineVersionMismatch { found: u16, expected: u16 },
}
