use expect_test::expect;
use oxiby_language::{
    ABI_VERSION, Language, LanguageHandle, RawLanguage, Symbol, SymbolInfo,
};
use oxiby_tables::{GrammarBuilder, TokenPattern, alt, field, lit, sym};
use oxiby_tree::{SyntaxNode, WalkEvent};
use text_size::{TextRange, TextSize};

use crate::{ParseError, parse};

fn oxiby() -> Language {
    Language::load(&oxiby_grammar::language()).unwrap()
}

/// Expression grammar small enough to reason about by hand.
fn math() -> Language {
    let mut grammar = GrammarBuilder::new("math", "program");
    grammar
        .token("integer", TokenPattern::Integer)
        .extra("whitespace", TokenPattern::Whitespace)
        .prec_left(1, &["+"])
        .prec_left(2, &["*"])
        .rule("program", [alt([sym("expression")])])
        .rule(
            "expression",
            [
                alt([field("lhs", "expression"), lit("+"), field("rhs", "expression")])
                    .prec_left(1),
                alt([field("lhs", "expression"), lit("*"), field("rhs", "expression")])
                    .prec_left(2),
                alt([sym("integer")]),
                alt([lit("("), sym("expression"), lit(")")]),
            ],
        );
    Language::load(&grammar.build().unwrap()).unwrap()
}

fn check(language: &Language, text: &str, expected: expect_test::Expect) {
    let tree = parse(language, text, None).unwrap();
    expected.assert_eq(&tree.to_string());
}

#[test]
fn math_precedence() {
    check(
        &math(),
        "1+2*3",
        expect![[r#"(program (expression lhs: (expression (integer)) rhs: (expression lhs: (expression (integer)) rhs: (expression (integer)))))"#]],
    );
}

#[test]
fn math_left_associativity() {
    check(
        &math(),
        "1+2+3",
        expect![[r#"(program (expression lhs: (expression lhs: (expression (integer)) rhs: (expression (integer))) rhs: (expression (integer))))"#]],
    );
}

#[test]
fn math_parentheses_override() {
    check(
        &math(),
        "(1+2)*3",
        expect![[r#"(program (expression lhs: (expression (expression lhs: (expression (integer)) rhs: (expression (integer)))) rhs: (expression (integer))))"#]],
    );
}

#[test]
fn math_empty_input_still_produces_tree() {
    let language = math();
    let tree = parse(&language, "", None).unwrap();
    assert_eq!(tree.root().kind_name(), "program");
    assert_eq!(tree.root().range(), TextRange::empty(TextSize::new(0)));
    assert!(!tree.diagnostics().is_empty());
}

#[test]
fn math_garbage_becomes_error_node() {
    let language = math();
    let tree = parse(&language, "@@@", None).unwrap();

    assert_eq!(tree.root().kind_name(), "program");
    assert_eq!(tree.root().range(), TextRange::new(TextSize::new(0), TextSize::new(3)));
    let children: Vec<_> = tree.root().children().collect();
    assert_eq!(children.len(), 1);
    assert!(children[0].is_error());

    // One diagnostic for the skipped run, one for the missing expression.
    assert_eq!(tree.diagnostics().len(), 2);
    assert_eq!(tree.diagnostics()[0].message(), "unexpected token `@`");
    assert_eq!(
        tree.diagnostics()[0].range(),
        TextRange::new(TextSize::new(0), TextSize::new(3))
    );
    assert_eq!(tree.diagnostics()[1].message(), "unexpected end of input");
}

#[test]
fn math_truncated_input_wraps_partial_parse() {
    let language = math();
    let tree = parse(&language, "(1+", None).unwrap();

    assert_eq!(tree.root().range(), TextRange::new(TextSize::new(0), TextSize::new(3)));
    check(
        &language,
        "(1+",
        expect![[r#"(program (ERROR (expression (integer))))"#]],
    );
    assert!(
        tree.diagnostics().iter().any(|d| d.message() == "unexpected end of input")
    );
}

#[test]
fn engine_rejects_foreign_table_version() {
    let raw = RawLanguage {
        abi_version: ABI_VERSION + 3,
        name: "future".into(),
        symbols: Box::new([SymbolInfo::end(), SymbolInfo::error(), SymbolInfo::unknown()]),
        fields: Box::new([]),
        lex_rules: Box::new([]),
        productions: Box::new([]),
        states: Box::new([]),
        root: Symbol::new(0),
    };
    let handle = LanguageHandle::new(raw);
    let language = Language::load_for_version(&handle, ABI_VERSION + 3).unwrap();

    assert_eq!(
        parse(&language, "anything", None).unwrap_err(),
        ParseError::EngineVersionMismatch { found: ABI_VERSION + 3, expected: ABI_VERSION }
    );
}

#[test]
fn oxiby_empty_function() {
    check(
        &oxiby(),
        "fn main() {}",
        expect![[r#"(source_file (item_fn signature: (fn_signature name: (expr_identifier) parameters: (parameters)) body: (block)))"#]],
    );
}

#[test]
fn oxiby_let_with_operator_precedence() {
    check(
        &oxiby(),
        "fn main() { let x = 1 + 2 * 3 }",
        expect![[r#"(source_file (item_fn signature: (fn_signature name: (expr_identifier) parameters: (parameters)) body: (block (let pattern: (pattern (expr_identifier)) value: (binary lhs: (integer) rhs: (binary lhs: (integer) rhs: (integer)))))))"#]],
    );
}

#[test]
fn oxiby_use_item() {
    check(
        &oxiby(),
        "use collections.list List",
        expect![[r#"(source_file (item_use module: (expr_identifier) module: (expr_identifier) import: (type_identifier)))"#]],
    );
}

#[test]
fn oxiby_record_struct() {
    check(
        &oxiby(),
        "struct Point { x: Int, y: Int }",
        expect![[r#"(source_file (item_struct name: (type_identifier) body: (record_struct name: (expr_identifier) type: (type (concrete_type type_name: (type_identifier))) name: (expr_identifier) type: (type (concrete_type type_name: (type_identifier))))))"#]],
    );
}

#[test]
fn oxiby_error_inside_block() {
    let language = oxiby();
    let tree = parse(&language, "fn main() { @ }", None).unwrap();

    check(
        &language,
        "fn main() { @ }",
        expect![[r#"(source_file (item_fn signature: (fn_signature name: (expr_identifier) parameters: (parameters)) body: (block (ERROR))))"#]],
    );
    assert_eq!(tree.diagnostics().len(), 1);
    assert_eq!(tree.diagnostics()[0].message(), "unexpected token `@`");
    assert_eq!(
        tree.diagnostics()[0].range(),
        TextRange::new(TextSize::new(12), TextSize::new(13))
    );
}

#[test]
fn oxiby_truncated_item_recovers() {
    let language = oxiby();
    let tree = parse(&language, "fn main(", None).unwrap();

    assert_eq!(tree.root().kind_name(), "source_file");
    assert_eq!(tree.root().range(), TextRange::new(TextSize::new(0), TextSize::new(8)));
    let children: Vec<_> = tree.root().children().collect();
    assert_eq!(children.len(), 1);
    assert!(children[0].is_error());
    assert!(
        tree.diagnostics().iter().any(|d| d.message() == "unexpected end of input")
    );
}

#[test]
fn oxiby_empty_input_is_valid() {
    let language = oxiby();
    let tree = parse(&language, "", None).unwrap();

    assert_eq!(tree.root().kind_name(), "source_file");
    assert_eq!(tree.root().range(), TextRange::empty(TextSize::new(0)));
    assert_eq!(tree.root().child_count(), 0);
    assert!(tree.diagnostics().is_empty());
}

#[test]
fn oxiby_trivia_only_input_is_valid() {
    let language = oxiby();
    let text = "// just a comment\n";
    let tree = parse(&language, text, None).unwrap();

    assert_eq!(tree.root().range(), TextRange::new(TextSize::new(0), TextSize::of(text)));
    assert_eq!(tree.root().child_count(), 0);
    assert!(tree.diagnostics().is_empty());
}

const MEDIUM: &str = r#"
// A vehicle registry.
use collections.list List

pub struct Vehicle {
    name: String,
    wheels: Int,

    pub fn describe(self) -> String {
        name
    }
}

pub enum Shape {
    Circle(Float),
    Rectangle { width: Float, height: Float },
}

trait Area {
    type Output: Numeric
    fn area(self) -> Float
}

impl Area for Shape {
    fn area(self) -> Float {
        match kind {
            1 -> 3 * radius * radius,
            _ -> width * height,
        }
    }
}

fn main() {
    let total = 1 + 2 * 3
    let shapes = [1, 2, 3]
    let range = 0 ..= 10
    let labels = ["a": 1, "b": 2]
    while total < 10 {
        total = total + 1
    }
    if total == 10 {
        describe(total)
    } else {
        total
    }
    for s in shapes {
        process(s, total)
    }
}
"#;

#[test]
fn oxiby_medium_program_parses_cleanly() {
    let language = oxiby();
    let tree = parse(&language, MEDIUM, None).unwrap();

    assert_eq!(tree.root().kind_name(), "source_file");
    assert_eq!(tree.root().range(), TextRange::new(TextSize::new(0), TextSize::of(MEDIUM)));
    assert_eq!(
        tree.diagnostics().iter().map(|d| d.message()).collect::<Vec<_>>(),
        Vec::<&str>::new()
    );
    assert!(!has_errors(tree.root()));

    let kinds: Vec<&str> = tree.root().children().map(SyntaxNode::kind_name).collect();
    assert_eq!(
        kinds,
        vec!["item_use", "item_struct", "item_enum", "item_trait", "item_impl", "item_fn"]
    );
}

#[test]
fn parse_is_deterministic() {
    let language = oxiby();
    let first = parse(&language, MEDIUM, None).unwrap();
    let second = parse(&language, MEDIUM, None).unwrap();

    assert_eq!(first.to_string(), second.to_string());
    assert!(structurally_equal(first.root(), second.root()));
}

#[test]
fn children_resolve_back_to_parent() {
    let language = oxiby();
    let tree = parse(&language, MEDIUM, None).unwrap();

    let mut nodes = 0;
    for event in tree.root().preorder() {
        let WalkEvent::Enter(node) = event else { continue };
        nodes += 1;
        for child in node.children() {
            assert_eq!(child.parent(), Some(node));
        }
        if let Some(parent) = node.parent() {
            assert!(parent.range().contains_range(node.range()));
        }
    }
    assert!(nodes > 50, "expected a substantial tree, got {nodes} nodes");
}

#[test]
fn malformed_input_never_fails() {
    let language = oxiby();
    let inputs = [
        "fn",
        "fn main() {",
        "struct struct struct",
        "}}}}",
        "fn main() { let = }",
        "use",
        "enum E { A(, }",
        "\"unterminated",
        "émoji ïdentifiers",
    ];
    for text in inputs {
        let tree = parse(&language, text, None).unwrap();
        assert_eq!(
            tree.root().range(),
            TextRange::new(TextSize::new(0), TextSize::of(text)),
            "root must span all of {text:?}"
        );
        assert!(
            has_errors(tree.root()) || !tree.diagnostics().is_empty(),
            "expected recovery evidence for {text:?}"
        );
    }
}

#[test]
fn previous_tree_is_accepted_and_ignored() {
    let language = oxiby();
    let first = parse(&language, "fn main() {}", None).unwrap();
    let second = parse(&language, "fn main() { 1 }", Some(&first)).unwrap();
    assert_eq!(
        second.root().range(),
        TextRange::new(TextSize::new(0), TextSize::new(15))
    );
}

fn has_errors(node: SyntaxNode<'_>) -> bool {
    node.preorder().any(|event| match event {
        WalkEvent::Enter(node) => node.is_error(),
        WalkEvent::Leave(_) => false,
    })
}

fn structurally_equal(left: SyntaxNode<'_>, right: SyntaxNode<'_>) -> bool {
    left.kind() == right.kind()
        && left.range() == right.range()
        && left.child_count() == right.child_count()
        && left.children().zip(right.children()).all(|(l, r)| structurally_equal(l, r))
}
