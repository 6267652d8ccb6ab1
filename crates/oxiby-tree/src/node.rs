//! Raw arena storage shared by the builder and the navigation layer.

use oxiby_language::Symbol;
use text_size::{TextRange, TextSize};

pub(crate) const NO_PARENT: u32 = u32::MAX;
pub(crate) const NO_FIELD: u16 = u16::MAX;

/// One arena slot. Children are a `(start, len)` window into the tree's flat
/// child-index vector; tokens additionally record attached trivia lengths.
pub(crate) struct NodeData {
    pub(crate) kind: Symbol,
    pub(crate) range: TextRange,
    pub(crate) parent: u32,
    pub(crate) children_start: u32,
    pub(crate) children_len: u32,
    pub(crate) field: u16,
    pub(crate) token: bool,
    pub(crate) leading_len: TextSize,
    pub(crate) trailing_len: TextSize,
}
