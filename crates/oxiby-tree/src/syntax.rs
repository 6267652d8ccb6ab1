//! Read-only navigation over a finished tree.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use oxiby_errors::Diagnostic;
use oxiby_language::{Field, Language, Symbol};
use text_size::TextRange;

use crate::node::{NO_FIELD, NO_PARENT, NodeData};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique generation stamp for one tree. Weak node references carry
/// it so a pointer into a dropped or foreign tree can be detected instead of
/// dereferenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreeId(NonZeroU64);

impl TreeId {
    fn next() -> Self {
        let raw = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(raw).expect("tree id counter overflowed"))
    }
}

/// An immutable concrete syntax tree: node arena, text copy, producing
/// language, and the diagnostics recovery generated while building it.
///
/// Safe for concurrent reads once constructed; never mutated afterwards.
pub struct SyntaxTree {
    id: TreeId,
    language: Language,
    text: Box<str>,
    nodes: Vec<NodeData>,
    children: Vec<u32>,
    root: u32,
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    pub(crate) fn assemble(
        language: Language,
        text: Box<str>,
        nodes: Vec<NodeData>,
        children: Vec<u32>,
        root: u32,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self { id: TreeId::next(), language, text, nodes, children, root, diagnostics }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The full source text this tree was parsed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, index: self.root }
    }

    /// Syntax errors recovered during the parse that built this tree.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Resolves a weak node reference against this tree.
    pub fn resolve(&self, ptr: NodePtr) -> Result<SyntaxNode<'_>, TreeError> {
        if ptr.tree != self.id {
            return Err(TreeError::DetachedNode { expected: self.id, found: ptr.tree });
        }
        Ok(SyntaxNode { tree: self, index: ptr.index })
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language.name())
            .field("text_len", &self.text.len())
            .field("nodes", &self.nodes.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

/// Borrowed handle to one node. Copyable; all accessors are O(1) or
/// O(children).
#[derive(Clone, Copy)]
pub struct SyntaxNode<'a> {
    tree: &'a SyntaxTree,
    index: u32,
}

impl<'a> SyntaxNode<'a> {
    fn data(self) -> &'a NodeData {
        &self.tree.nodes[self.index as usize]
    }

    pub fn tree(self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn kind(self) -> Symbol {
        self.data().kind
    }

    pub fn kind_name(self) -> &'a str {
        self.tree.language.symbol_name(self.kind())
    }

    pub fn is_token(self) -> bool {
        self.data().token
    }

    pub fn is_named(self) -> bool {
        self.tree.language.is_named(self.kind())
    }

    pub fn is_error(self) -> bool {
        self.kind() == Symbol::ERROR
    }

    /// Byte range of the significant text this node covers. The root always
    /// spans the entire input.
    pub fn range(self) -> TextRange {
        self.data().range
    }

    /// Byte range including trivia attached to a token.
    pub fn full_range(self) -> TextRange {
        let data = self.data();
        TextRange::new(data.range.start() - data.leading_len, data.range.end() + data.trailing_len)
    }

    pub fn text(self) -> &'a str {
        &self.tree.text[self.range()]
    }

    pub fn parent(self) -> Option<Self> {
        let parent = self.data().parent;
        (parent != NO_PARENT).then_some(Self { tree: self.tree, index: parent })
    }

    pub fn child_count(self) -> usize {
        self.data().children_len as usize
    }

    pub fn child(self, index: usize) -> Option<Self> {
        let data = self.data();
        if index >= data.children_len as usize {
            return None;
        }
        let slot = self.tree.children[data.children_start as usize + index];
        Some(Self { tree: self.tree, index: slot })
    }

    pub fn children(self) -> Children<'a> {
        let data = self.data();
        let start = data.children_start as usize;
        let end = start + data.children_len as usize;
        Children { tree: self.tree, slots: self.tree.children[start..end].iter() }
    }

    /// Children that appear in rendered trees: named nodes and error nodes.
    pub fn named_children(self) -> impl Iterator<Item = SyntaxNode<'a>> {
        self.children().filter(|child| child.is_named())
    }

    /// Field this node fills on its parent, if any.
    pub fn field(self) -> Option<Field> {
        let field = self.data().field;
        (field != NO_FIELD).then_some(Field::new(field))
    }

    pub fn field_name(self) -> Option<&'a str> {
        Some(self.tree.language.field_name(self.field()?))
    }

    /// First child filling the given field.
    pub fn child_by_field(self, name: &str) -> Option<Self> {
        let field = self.tree.language.field_id(name)?;
        self.children().find(|child| child.field() == Some(field))
    }

    pub fn ancestors(self) -> Ancestors<'a> {
        Ancestors { next: self.parent() }
    }

    /// Depth-first traversal of this subtree, yielding enter/leave events.
    pub fn preorder(self) -> Preorder<'a> {
        Preorder { root: Some(self), stack: Vec::with_capacity(16) }
    }

    /// Weak reference usable after this borrow ends.
    pub fn ptr(self) -> NodePtr {
        NodePtr { tree: self.tree.id, index: self.index }
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.kind_name(), self.range())
    }
}

impl fmt::Display for SyntaxNode<'_> {
    /// S-expression over named nodes, with field labels:
    /// `(item_fn signature: (fn_signature ...) body: (block))`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.kind_name())?;
        for child in self.named_children() {
            f.write_str(" ")?;
            if let Some(field) = child.field_name() {
                write!(f, "{field}: ")?;
            }
            fmt::Display::fmt(&child, f)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root(), f)
    }
}

/// Owned weak reference to a node: a `(tree id, node index)` pair that never
/// keeps the tree alive. Resolving it through [`SyntaxTree::resolve`] is the
/// only way back to a live node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodePtr {
    tree: TreeId,
    index: u32,
}

/// Navigation failure: the referenced tree is not the one resolving the
/// pointer (it may already be destroyed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node is detached: it belongs to tree {found:?}, not {expected:?}")]
    DetachedNode { expected: TreeId, found: TreeId },
}

/// Iterator over a node's direct children.
#[derive(Clone)]
pub struct Children<'a> {
    tree: &'a SyntaxTree,
    slots: std::slice::Iter<'a, u32>,
}

impl<'a> Iterator for Children<'a> {
    type Item = SyntaxNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(SyntaxNode { tree: self.tree, index: *self.slots.next()? })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        Some(SyntaxNode { tree: self.tree, index: *self.slots.next_back()? })
    }
}

impl ExactSizeIterator for Children<'_> {
    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Iterator from a node's parent up to the root.
#[derive(Clone)]
pub struct Ancestors<'a> {
    next: Option<SyntaxNode<'a>>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = SyntaxNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Preorder walk event.
#[derive(Clone, Copy, Debug)]
pub enum WalkEvent<'a> {
    Enter(SyntaxNode<'a>),
    Leave(SyntaxNode<'a>),
}

/// Depth-first traversal yielding [`WalkEvent`]s.
pub struct Preorder<'a> {
    root: Option<SyntaxNode<'a>>,
    stack: Vec<(SyntaxNode<'a>, usize)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = WalkEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            self.stack.push((root, 0));
            return Some(WalkEvent::Enter(root));
        }
        let (node, cursor) = self.stack.last_mut()?;
        match node.child(*cursor) {
            Some(child) => {
                *cursor += 1;
                self.stack.push((child, 0));
                Some(WalkEvent::Enter(child))
            }
            None => {
                let (node, _) = self.stack.pop()?;
                Some(WalkEvent::Leave(node))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use oxiby_language::{ABI_VERSION, LanguageHandle, RawLanguage, SymbolInfo};
    use text_size::TextSize;

    use super::*;
    use crate::TreeBuilder;

    const WORD: Symbol = Symbol::new(3);
    const COMMA: Symbol = Symbol::new(4);
    const DOCUMENT: Symbol = Symbol::new(5);
    const PAIR: Symbol = Symbol::new(6);

    fn test_language() -> Language {
        let raw = RawLanguage {
            abi_version: ABI_VERSION,
            name: "pairs".into(),
            symbols: Box::new([
                SymbolInfo::end(),
                SymbolInfo::error(),
                SymbolInfo::unknown(),
                SymbolInfo {
                    name: "word".into(),
                    terminal: true,
                    named: true,
                    hidden: false,
                    extra: false,
                },
                SymbolInfo {
                    name: ",".into(),
                    terminal: true,
                    named: false,
                    hidden: false,
                    extra: false,
                },
                SymbolInfo {
                    name: "document".into(),
                    terminal: false,
                    named: true,
                    hidden: false,
                    extra: false,
                },
                SymbolInfo {
                    name: "pair".into(),
                    terminal: false,
                    named: true,
                    hidden: false,
                    extra: false,
                },
            ]),
            fields: Box::new(["first".into(), "second".into()]),
            lex_rules: Box::new([]),
            productions: Box::new([]),
            states: Box::new([]),
            root: DOCUMENT,
        };
        Language::load(&LanguageHandle::new(raw)).unwrap()
    }

    /// Builds the tree for `ab, cd`: (document (pair "ab" "," "cd")).
    fn sample_tree() -> SyntaxTree {
        let language = test_language();
        let mut builder = TreeBuilder::new(language, "ab, cd");

        let first = builder.token(
            WORD,
            TextRange::new(TextSize::new(0), TextSize::new(2)),
            TextSize::new(0),
            TextSize::new(0),
        );
        let comma = builder.token(
            COMMA,
            TextRange::new(TextSize::new(2), TextSize::new(3)),
            TextSize::new(0),
            TextSize::new(1),
        );
        let second = builder.token(
            WORD,
            TextRange::new(TextSize::new(4), TextSize::new(6)),
            TextSize::new(0),
            TextSize::new(0),
        );
        builder.set_field(first, Field::new(0));
        builder.set_field(second, Field::new(1));

        let pair = builder.node(PAIR, &[first, comma, second]);
        let document = builder.node(DOCUMENT, &[pair]);
        builder.finish(document)
    }

    #[test]
    fn root_spans_whole_text() {
        let tree = sample_tree();
        let root = tree.root();
        assert_eq!(root.kind(), DOCUMENT);
        assert_eq!(root.kind_name(), "document");
        assert_eq!(root.range(), TextRange::new(TextSize::new(0), TextSize::new(6)));
        assert!(root.parent().is_none());
    }

    #[test]
    fn children_parent_roundtrip() {
        let tree = sample_tree();
        for event in tree.root().preorder() {
            let WalkEvent::Enter(node) = event else { continue };
            for child in node.children() {
                assert_eq!(child.parent(), Some(node));
            }
        }
    }

    #[test]
    fn child_accessors() {
        let tree = sample_tree();
        let pair = tree.root().child(0).unwrap();
        assert_eq!(pair.kind(), PAIR);
        assert_eq!(pair.child_count(), 3);
        assert_eq!(pair.child(1).unwrap().kind(), COMMA);
        assert!(pair.child(3).is_none());
        assert_eq!(pair.children().len(), 3);
        assert_eq!(pair.named_children().count(), 2);
        assert_eq!(pair.text(), "ab, cd");
    }

    #[test]
    fn fields_resolve_by_name() {
        let tree = sample_tree();
        let pair = tree.root().child(0).unwrap();

        let first = pair.child_by_field("first").unwrap();
        assert_eq!(first.text(), "ab");
        assert_eq!(first.field_name(), Some("first"));

        let second = pair.child_by_field("second").unwrap();
        assert_eq!(second.text(), "cd");

        assert!(pair.child_by_field("third").is_none());
        assert!(pair.field_name().is_none());
    }

    #[test]
    fn token_trivia_extends_full_range() {
        let tree = sample_tree();
        let comma = tree.root().child(0).unwrap().child(1).unwrap();
        assert_eq!(comma.range(), TextRange::new(TextSize::new(2), TextSize::new(3)));
        assert_eq!(comma.full_range(), TextRange::new(TextSize::new(2), TextSize::new(4)));
    }

    #[test]
    fn ancestors_walk_to_root() {
        let tree = sample_tree();
        let pair = tree.root().child(0).unwrap();
        let first = pair.child(0).unwrap();
        let kinds: Vec<_> = first.ancestors().map(SyntaxNode::kind).collect();
        assert_eq!(kinds, vec![PAIR, DOCUMENT]);
    }

    #[test]
    fn ptr_resolves_in_owning_tree_only() {
        let tree = sample_tree();
        let other = sample_tree();

        let ptr = tree.root().child(0).unwrap().ptr();
        let resolved = tree.resolve(ptr).unwrap();
        assert_eq!(resolved.kind(), PAIR);

        let detached = other.resolve(ptr).unwrap_err();
        assert_eq!(
            detached,
            TreeError::DetachedNode { expected: other.id(), found: tree.id() }
        );
    }

    #[test]
    fn ptr_survives_tree_drop_as_detached() {
        let (ptr, stale_id) = {
            let tree = sample_tree();
            (tree.root().ptr(), tree.id())
        };
        let fresh = sample_tree();
        assert_ne!(fresh.id(), stale_id);
        assert!(matches!(fresh.resolve(ptr), Err(TreeError::DetachedNode { .. })));
    }

    #[test]
    fn display_renders_named_sexp_with_fields() {
        let tree = sample_tree();
        assert_eq!(
            tree.to_string(),
            "(document (pair first: (word) second: (word)))"
        );
    }

    #[test]
    fn finished_trees_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyntaxTree>();
        assert_send_sync::<NodePtr>();
    }
}

