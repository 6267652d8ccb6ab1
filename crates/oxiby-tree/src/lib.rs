//! Immutable, arena-backed concrete syntax trees.
//!
//! A [`SyntaxTree`] owns its nodes, a copy of the parsed text, and the
//! [`Language`](oxiby_language::Language) that produced it. Navigation goes
//! through lifetime-bound [`SyntaxNode`] handles, so a node can never outlive
//! its tree; [`NodePtr`] is the owned escape hatch, a `(tree id, index)`
//! pair re-resolved through a live tree and rejected with
//! [`TreeError::DetachedNode`] when the tree it came from is gone.

mod builder;
mod node;
mod syntax;

pub use builder::{NodeId, TreeBuilder};
pub use syntax::{
    Ancestors, Children, NodePtr, Preorder, SyntaxNode, SyntaxTree, TreeError, TreeId, WalkEvent,
};
