//! Bottom-up construction of a [`SyntaxTree`].
//!
//! The parse engine creates leaves as it shifts and interior nodes as it
//! reduces, then seals the arena with [`TreeBuilder::finish`]. Until then
//! parent links and fields stay patchable, which is what lets error recovery
//! re-home already-built subtrees.

use oxiby_errors::Diagnostic;
use oxiby_language::{Field, Language, Symbol};
use text_size::{TextRange, TextSize};

use crate::SyntaxTree;
use crate::node::{NO_FIELD, NO_PARENT, NodeData};

/// Handle to a node under construction. Only meaningful for the builder that
/// issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) u32);

pub struct TreeBuilder {
    language: Language,
    text: Box<str>,
    nodes: Vec<NodeData>,
    children: Vec<u32>,
    diagnostics: Vec<Diagnostic>,
}

impl TreeBuilder {
    pub fn new(language: Language, text: &str) -> Self {
        Self {
            language,
            text: text.into(),
            nodes: Vec::with_capacity(64),
            children: Vec::with_capacity(64),
            diagnostics: Vec::new(),
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Adds a leaf for a scanned token.
    pub fn token(
        &mut self,
        kind: Symbol,
        range: TextRange,
        leading_len: TextSize,
        trailing_len: TextSize,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            range,
            parent: NO_PARENT,
            children_start: 0,
            children_len: 0,
            field: NO_FIELD,
            token: true,
            leading_len,
            trailing_len,
        });
        id
    }

    /// Adds an interior node adopting `children` in order. Children must not
    /// already have a parent, except when re-homed through [`Self::node`] by
    /// recovery (their old parent slot simply goes unreachable).
    pub fn node(&mut self, kind: Symbol, children: &[NodeId]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let range = match (children.first(), children.last()) {
            (Some(first), Some(last)) => TextRange::new(
                self.nodes[first.0 as usize].range.start(),
                self.nodes[last.0 as usize].range.end(),
            ),
            // An empty interior node sits at the current frontier.
            _ => TextRange::empty(
                self.nodes.last().map_or_else(|| TextSize::new(0), |node| node.range.end()),
            ),
        };
        let children_start = self.children.len() as u32;
        for child in children {
            self.children.push(child.0);
            self.nodes[child.0 as usize].parent = id.0;
        }
        self.nodes.push(NodeData {
            kind,
            range,
            parent: NO_PARENT,
            children_start,
            children_len: children.len() as u32,
            field: NO_FIELD,
            token: false,
            leading_len: TextSize::new(0),
            trailing_len: TextSize::new(0),
        });
        id
    }

    /// Adds a synthetic error node covering `children`.
    pub fn error(&mut self, children: &[NodeId]) -> NodeId {
        self.node(Symbol::ERROR, children)
    }

    pub fn set_field(&mut self, node: NodeId, field: Field) {
        self.nodes[node.0 as usize].field = field.index() as u16;
    }

    pub fn kind_of(&self, node: NodeId) -> Symbol {
        self.nodes[node.0 as usize].kind
    }

    /// Children of an already-built node, for recovery's root rebuilding.
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        let data = &self.nodes[node.0 as usize];
        let start = data.children_start as usize;
        let end = start + data.children_len as usize;
        self.children[start..end].iter().map(|&index| NodeId(index)).collect()
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn last_diagnostic_mut(&mut self) -> Option<&mut Diagnostic> {
        self.diagnostics.last_mut()
    }

    /// Seals the arena. The root is forced to span the whole input,
    /// including any leading or trailing trivia.
    pub fn finish(mut self, root: NodeId) -> SyntaxTree {
        let full = TextRange::new(TextSize::new(0), TextSize::of(&*self.text));
        let root_data = &mut self.nodes[root.0 as usize];
        root_data.range = full;
        root_data.parent = NO_PARENT;
        SyntaxTree::assemble(
            self.language,
            self.text,
            self.nodes,
            self.children,
            root.0,
            self.diagnostics,
        )
    }
}
