//! Rule definitions for the Oxiby language.
//!
//! Binding strength mirrors the original precedence table: call and index
//! bind tightest, then field access, unary operators, the arithmetic and
//! logical tiers, ranges, and assignment at the bottom.

use oxiby_tables::{Alt, GrammarBuilder, TokenPattern, alt, field, field_lit, lit, sym};

const ASSIGN: u8 = 1;
const RANGE: u8 = 2;
const OR: u8 = 3;
const AND: u8 = 4;
const COMPARATIVE: u8 = 5;
const ADDITIVE: u8 = 6;
const MULTIPLICATIVE: u8 = 7;
const UNARY: u8 = 8;
const FIELD: u8 = 9;
const CALL: u8 = 10;

const BINARY_OPERATORS: &[(&str, u8)] = &[
    ("&&", AND),
    ("||", OR),
    ("==", COMPARATIVE),
    ("!=", COMPARATIVE),
    ("<", COMPARATIVE),
    ("<=", COMPARATIVE),
    (">", COMPARATIVE),
    (">=", COMPARATIVE),
    ("+", ADDITIVE),
    ("-", ADDITIVE),
    ("*", MULTIPLICATIVE),
    ("/", MULTIPLICATIVE),
    ("%", MULTIPLICATIVE),
];

pub(crate) fn grammar() -> GrammarBuilder {
    let mut g = GrammarBuilder::new("oxiby", "source_file");

    g.token("expr_identifier", TokenPattern::LowerIdent)
        .token("type_identifier", TokenPattern::UpperIdent)
        .token("float", TokenPattern::Float)
        .token("integer", TokenPattern::Integer)
        .token("string", TokenPattern::String)
        .extra("whitespace", TokenPattern::Whitespace)
        .extra("comment", TokenPattern::LineComment);

    g.prec_left(ASSIGN, &["="])
        .prec_left(RANGE, &["..=", "..<"])
        .prec_left(OR, &["||"])
        .prec_left(AND, &["&&"])
        .prec_left(COMPARATIVE, &["==", "!=", "<", "<=", ">", ">="])
        .prec_left(ADDITIVE, &["+", "-"])
        .prec_left(MULTIPLICATIVE, &["*", "/", "%"])
        .prec_left(FIELD, &["."])
        .prec_left(CALL, &["(", "["]);

    g.supertype("item").supertype("expression").supertype("expression_with_trailing_block");

    items(&mut g);
    types(&mut g);
    patterns(&mut g);
    expressions(&mut g);

    g
}

fn items(g: &mut GrammarBuilder) {
    g.rule("source_file", [alt([sym("_items")])])
        .rule("_items", [alt([]), alt([sym("_items"), sym("item")])])
        .rule(
            "item",
            [
                alt([sym("item_enum")]),
                alt([sym("item_fn")]),
                alt([sym("item_impl")]),
                alt([sym("item_struct")]),
                alt([sym("item_trait")]),
                alt([sym("item_use")]),
            ],
        )
        .rule("_visibility", [alt([]), alt([lit("pub")])]);

    g.rule(
        "item_enum",
        [alt([
            sym("_visibility"),
            lit("enum"),
            field("name", "type_identifier"),
            field("type_params", "_type_params_opt"),
            lit("{"),
            sym("_enum_members"),
            lit("}"),
        ])],
    )
    .rule("_enum_members", [alt([]), alt([sym("_enum_members"), sym("_enum_member")])])
    .rule(
        "_enum_member",
        [
            alt([field("variant", "variant")]),
            alt([field("variant", "variant"), lit(",")]),
            alt([field("functions", "item_fn")]),
        ],
    )
    .rule(
        "variant",
        [
            alt([field("name", "type_identifier")]),
            alt([field("name", "type_identifier"), field("fields", "tuple_variant")]),
            alt([field("name", "type_identifier"), field("fields", "record_variant")]),
        ],
    )
    .rule(
        "tuple_variant",
        [
            alt([lit("("), lit(")")]),
            alt([lit("("), sym("_variant_types"), lit(")")]),
            alt([lit("("), sym("_variant_types"), lit(","), lit(")")]),
        ],
    )
    .rule(
        "_variant_types",
        [
            alt([field("type", "type")]),
            alt([sym("_variant_types"), lit(","), field("type", "type")]),
        ],
    )
    .rule(
        "record_variant",
        [
            alt([lit("{"), lit("}")]),
            alt([lit("{"), sym("_record_variant_fields"), lit("}")]),
            alt([lit("{"), sym("_record_variant_fields"), lit(","), lit("}")]),
        ],
    )
    .rule(
        "_record_variant_fields",
        [
            alt([sym("_record_variant_field")]),
            alt([sym("_record_variant_fields"), lit(","), sym("_record_variant_field")]),
        ],
    )
    .rule(
        "_record_variant_field",
        [alt([field("name", "expr_identifier"), lit(":"), field("type", "type")])],
    );

    g.rule(
        "fn_signature",
        [alt([
            sym("_visibility"),
            lit("fn"),
            field("name", "expr_identifier"),
            field("parameters", "parameters"),
            field("return_type", "_return_type_opt"),
            field("where_clause", "_where_opt"),
        ])],
    )
    .rule("_return_type_opt", [alt([]), alt([sym("return_type")])])
    .rule("return_type", [alt([lit("->"), sym("type")])])
    .rule("_where_opt", [alt([]), alt([sym("where_clause")])])
    .rule("item_fn", [alt([field("signature", "fn_signature"), field("body", "block")])])
    .rule(
        "parameters",
        [
            alt([lit("("), lit(")")]),
            alt([lit("("), sym("_params"), lit(")")]),
            alt([lit("("), sym("_params"), lit(","), lit(")")]),
        ],
    )
    .rule("_params", [alt([sym("_param")]), alt([sym("_params"), lit(","), sym("_param")])])
    .rule("_param", [alt([sym("self")]), alt([sym("parameter")])])
    .rule("self", [alt([lit("self")])])
    .rule(
        "parameter",
        [alt([
            field("parameter_name", "expr_identifier"),
            lit(":"),
            field("parameter_type", "type"),
        ])],
    );

    g.rule(
        "item_struct",
        [alt([
            sym("_visibility"),
            lit("struct"),
            field("name", "type_identifier"),
            field("type_params", "_type_params_opt"),
            field("body", "_struct_body_opt"),
        ])],
    )
    .rule(
        "_struct_body_opt",
        [alt([]), alt([sym("tuple_struct")]), alt([sym("record_struct")])],
    )
    .rule(
        "tuple_struct",
        [
            alt([lit("("), lit(")")]),
            alt([lit("("), sym("_tuple_fields"), lit(")")]),
            alt([lit("("), sym("_tuple_fields"), lit(","), lit(")")]),
        ],
    )
    .rule(
        "_tuple_fields",
        [
            alt([sym("_tuple_field")]),
            alt([sym("_tuple_fields"), lit(","), sym("_tuple_field")]),
        ],
    )
    .rule("_tuple_field", [alt([sym("_visibility"), field("type", "type")])])
    .rule("record_struct", [alt([lit("{"), sym("_record_members"), lit("}")])])
    .rule(
        "_record_members",
        [alt([]), alt([sym("_record_members"), sym("_record_member")])],
    )
    .rule(
        "_record_member",
        [
            alt([sym("_record_field")]),
            alt([sym("_record_field"), lit(",")]),
            alt([field("functions", "item_fn")]),
        ],
    )
    .rule(
        "_record_field",
        [alt([
            sym("_visibility"),
            field("name", "expr_identifier"),
            lit(":"),
            field("type", "type"),
        ])],
    );

    g.rule(
        "item_trait",
        [alt([
            sym("_visibility"),
            lit("trait"),
            field("name", "type_identifier"),
            field("type_params", "_type_params_opt"),
            field("where_clause", "_where_opt"),
            lit("{"),
            sym("_trait_members"),
            lit("}"),
        ])],
    )
    .rule("_trait_members", [alt([]), alt([sym("_trait_members"), sym("_trait_member")])])
    .rule(
        "_trait_member",
        [
            alt([field("associated_types", "associated_type")]),
            alt([field("functions", "item_fn")]),
            alt([field("functions", "fn_signature")]),
        ],
    )
    .rule(
        "associated_type",
        [alt([
            lit("type"),
            field("name", "type_identifier"),
            sym("_bounds_opt"),
            sym("_default_opt"),
        ])],
    )
    .rule("_bounds_opt", [alt([]), alt([lit(":"), field("bounds", "bounds")])])
    .rule(
        "bounds",
        [
            alt([sym("type_identifier")]),
            alt([sym("bounds"), lit("+"), sym("type_identifier")]),
        ],
    )
    .rule("_default_opt", [alt([]), alt([lit("="), field("default", "type")])]);

    g.rule(
        "item_impl",
        [alt([
            lit("impl"),
            field("trait_name", "type_identifier"),
            field("trait_params", "_type_params_opt"),
            lit("for"),
            field("type_name", "type_identifier"),
            field("type_params", "_type_params_opt"),
            field("where_clause", "_where_opt"),
            lit("{"),
            sym("_impl_members"),
            lit("}"),
        ])],
    )
    .rule("_impl_members", [alt([]), alt([sym("_impl_members"), sym("_impl_member")])])
    .rule(
        "_impl_member",
        [
            alt([field("associated_types", "associated_type")]),
            alt([field("functions", "item_fn")]),
        ],
    )
    .rule(
        "where_clause",
        [
            alt([lit("where"), sym("_constraints")]),
            alt([lit("where"), sym("_constraints"), lit(",")]),
        ],
    )
    .rule(
        "_constraints",
        [
            alt([sym("constraint")]),
            alt([sym("_constraints"), lit(","), sym("constraint")]),
        ],
    )
    .rule(
        "constraint",
        [alt([field("type", "type"), sym("_bounds_opt"), sym("_default_opt")])],
    );

    g.rule(
        "item_use",
        [alt([lit("use"), field("module", "_use_module"), sym("_use_imports_opt")])],
    )
    .rule(
        "_use_module",
        [
            alt([sym("expr_identifier")]),
            alt([sym("_use_module"), lit("."), sym("expr_identifier")]),
        ],
    )
    .rule("_use_imports_opt", [alt([]), alt([sym("_use_imports")])])
    .rule(
        "_use_imports",
        [
            alt([field("import", "_use_import")]),
            alt([sym("_use_imports"), lit(","), field("import", "_use_import")]),
        ],
    )
    .rule("_use_import", [alt([sym("expr_identifier")]), alt([sym("type_identifier")])]);
}

fn types(g: &mut GrammarBuilder) {
    g.rule(
        "type",
        [
            alt([sym("variable_type")]),
            alt([sym("tuple_type")]),
            alt([sym("function_type")]),
            alt([sym("concrete_type")]),
        ],
    )
    .rule("variable_type", [alt([sym("expr_identifier")])])
    .rule(
        "tuple_type",
        [alt([lit("("), lit(")")]), alt([lit("("), sym("_types"), lit(")")])],
    )
    .rule("_types", [alt([sym("type")]), alt([sym("_types"), lit(","), sym("type")])])
    .rule(
        "function_type",
        [
            alt([lit("Fn"), lit("("), lit(")"), sym("_fn_type_return_opt")]),
            alt([
                lit("Fn"),
                lit("("),
                field("parameters", "_types"),
                lit(")"),
                sym("_fn_type_return_opt"),
            ]),
        ],
    )
    .rule(
        "_fn_type_return_opt",
        [alt([]), alt([lit("->"), field("return_type", "type")])],
    )
    .rule(
        "concrete_type",
        [
            alt([field("type_name", "type_identifier"), sym("_type_params_field_opt")]),
            alt([
                field("qualifier", "type_identifier"),
                lit("."),
                field("type_name", "type_identifier"),
                sym("_type_params_field_opt"),
            ]),
        ],
    )
    .rule(
        "_type_params_field_opt",
        [alt([]), alt([field("type_parameters", "type_params")])],
    )
    .rule("_type_params_opt", [alt([]), alt([sym("type_params")])])
    .rule("type_params", [alt([lit("<"), sym("_types"), lit(">")])]);
}

fn patterns(g: &mut GrammarBuilder) {
    g.rule(
        "pattern",
        [
            alt([sym("pattern_literal")]),
            alt([sym("expr_identifier")]),
            alt([lit("_")]),
            alt([sym("pattern_tuple")]),
            alt([sym("pattern_list")]),
        ],
    )
    .rule(
        "pattern_literal",
        [
            alt([sym("boolean")]),
            alt([sym("float")]),
            alt([sym("integer")]),
            alt([sym("string")]),
        ],
    )
    .rule("boolean", [alt([lit("true")]), alt([lit("false")])])
    .rule(
        "pattern_tuple",
        [
            alt([lit("("), lit(")")]),
            alt([lit("("), sym("_patterns"), lit(")")]),
            alt([lit("("), sym("_patterns"), lit(","), lit(")")]),
        ],
    )
    .rule(
        "_patterns",
        [alt([sym("pattern")]), alt([sym("_patterns"), lit(","), sym("pattern")])],
    )
    .rule(
        "pattern_list",
        [
            alt([lit("["), lit("]")]),
            alt([lit("["), sym("_patterns"), lit("]")]),
            alt([lit("["), sym("_patterns"), lit(","), lit("]")]),
        ],
    );
}

fn expressions(g: &mut GrammarBuilder) {
    g.rule(
        "expression",
        [
            alt([sym("boolean")]),
            alt([sym("float")]),
            alt([sym("integer")]),
            alt([sym("string")]),
            alt([sym("range")]),
            alt([sym("hash_map")]),
            alt([sym("list")]),
            alt([sym("tuple")]),
            alt([sym("struct_literal")]),
            alt([sym("enum_literal")]),
            alt([sym("scoped_expr_identifier")]),
            alt([sym("scoped_type_identifier")]),
            alt([sym("field")]),
            alt([sym("index")]),
            alt([sym("call")]),
            alt([sym("closure")]),
            alt([sym("break")]),
            alt([sym("conditional")]),
            alt([sym("continue")]),
            alt([sym("for_loop")]),
            alt([sym("loop")]),
            alt([sym("return")]),
            alt([sym("while_loop")]),
            alt([sym("let")]),
            alt([sym("match")]),
            alt([sym("assignment")]),
            alt([sym("unary")]),
            alt([sym("binary")]),
            alt([sym("parenthesized")]),
            alt([sym("expression_with_trailing_block")]),
        ],
    )
    .rule("expression_with_trailing_block", [alt([sym("block")])]);

    g.rule(
        "scoped_expr_identifier",
        [
            alt([sym("expr_identifier")]),
            alt([field("scope", "type_identifier"), lit("."), sym("expr_identifier")]),
        ],
    )
    .rule(
        "scoped_type_identifier",
        [
            alt([sym("type_identifier")]),
            alt([field("scope", "type_identifier"), lit("."), sym("type_identifier")]),
        ],
    );

    g.rule(
        "range",
        [
            alt([field("start", "expression"), lit("..="), field("end", "expression")])
                .prec_left(RANGE),
            alt([field("start", "expression"), lit("..<"), field("end", "expression")])
                .prec_left(RANGE),
        ],
    )
    .rule(
        "hash_map",
        [
            alt([lit("["), sym("_pairs"), lit("]")]),
            alt([lit("["), sym("_pairs"), lit(","), lit("]")]),
        ],
    )
    .rule("_pairs", [alt([sym("_pair")]), alt([sym("_pairs"), lit(","), sym("_pair")])])
    .rule("_pair", [alt([sym("expression"), lit(":"), sym("expression")])])
    .rule(
        "list",
        [
            alt([lit("["), lit("]")]),
            alt([lit("["), sym("_list_elements"), lit("]")]),
            alt([lit("["), sym("_list_elements"), lit(","), lit("]")]),
        ],
    )
    .rule(
        "_list_elements",
        [
            alt([sym("expression")]),
            alt([sym("_list_elements"), lit(","), sym("expression")]),
        ],
    )
    .rule(
        "tuple",
        [
            alt([lit("("), lit(")")]),
            alt([lit("("), sym("expression"), lit(","), lit(")")]),
            alt([lit("("), sym("expression"), lit(","), sym("_tuple_elements"), lit(")")]),
            alt([
                lit("("),
                sym("expression"),
                lit(","),
                sym("_tuple_elements"),
                lit(","),
                lit(")"),
            ]),
        ],
    )
    .rule(
        "_tuple_elements",
        [
            alt([sym("expression")]),
            alt([sym("_tuple_elements"), lit(","), sym("expression")]),
        ],
    );

    g.rule(
        "call",
        [alt([field("name", "expression"), field("arguments", "arguments")])
            .prec_left(CALL)],
    )
    .rule(
        "arguments",
        [
            alt([lit("("), lit(")")]),
            alt([lit("("), sym("_arguments"), lit(")")]),
            alt([lit("("), sym("_arguments"), lit(","), lit(")")]),
        ],
    )
    .rule(
        "_arguments",
        [
            alt([field("expression", "expression")]),
            alt([sym("_arguments"), lit(","), field("expression", "expression")]),
        ],
    )
    .rule(
        "index",
        [alt([
            field("expr", "expression"),
            lit("["),
            field("index", "expression"),
            lit("]"),
        ])
        .prec_left(CALL)],
    )
    .rule(
        "field",
        [
            alt([field("value", "expression"), lit("."), field("field", "expr_identifier")])
                .prec_left(FIELD),
            alt([field("value", "expression"), lit("."), field("field", "integer")])
                .prec_left(FIELD),
        ],
    );

    g.rule(
        "closure",
        [
            alt([
                lit("fn"),
                lit("("),
                lit(")"),
                sym("_closure_return_opt"),
                lit("{"),
                field("body", "_block_exprs"),
                lit("}"),
            ]),
            alt([
                lit("fn"),
                lit("("),
                sym("_closure_params"),
                lit(")"),
                sym("_closure_return_opt"),
                lit("{"),
                field("body", "_block_exprs"),
                lit("}"),
            ]),
            alt([
                lit("fn"),
                lit("("),
                sym("_closure_params"),
                lit(","),
                lit(")"),
                sym("_closure_return_opt"),
                lit("{"),
                field("body", "_block_exprs"),
                lit("}"),
            ]),
        ],
    )
    .rule(
        "_closure_params",
        [
            alt([sym("closure_param")]),
            alt([sym("_closure_params"), lit(","), sym("closure_param")]),
        ],
    )
    .rule(
        "closure_param",
        [
            alt([field("name", "expr_identifier")]),
            alt([field("name", "expr_identifier"), lit(":"), field("type", "type")]),
        ],
    )
    .rule(
        "_closure_return_opt",
        [alt([]), alt([lit("->"), field("return_type", "type")])],
    );

    g.rule("break", [alt([lit("break")]), alt([lit("break"), sym("expression")])])
        .rule("continue", [alt([lit("continue")])])
        .rule("return", [alt([lit("return")]), alt([lit("return"), sym("expression")])])
        .rule(
            "conditional",
            [
                alt([lit("if"), sym("expression"), sym("block")]),
                alt([lit("if"), sym("expression"), sym("block"), lit("else"), sym("block")]),
                alt([
                    lit("if"),
                    sym("expression"),
                    sym("block"),
                    lit("else"),
                    sym("conditional"),
                ]),
            ],
        )
        .rule(
            "for_loop",
            [alt([lit("for"), sym("pattern"), lit("in"), sym("expression"), sym("block")])],
        )
        .rule("loop", [alt([lit("loop"), sym("block")])])
        .rule(
            "while_loop",
            [alt([lit("while"), field("predicate", "expression"), sym("block")])],
        )
        .rule("block", [alt([lit("{"), sym("_block_exprs"), lit("}")])])
        .rule("_block_exprs", [alt([]), alt([sym("_block_exprs"), sym("expression")])]);

    g.rule(
        "let",
        [
            alt([
                lit("let"),
                field("pattern", "pattern"),
                lit("="),
                field("value", "expression"),
            ])
            .prec_right(ASSIGN),
            alt([
                lit("let"),
                field("pattern", "pattern"),
                lit(":"),
                field("type", "type"),
                lit("="),
                field("value", "expression"),
            ])
            .prec_right(ASSIGN),
        ],
    )
    .rule(
        "match",
        [alt([lit("match"), field("expr", "expression"), field("body", "match_body")])],
    )
    .rule("match_body", [alt([lit("{"), sym("_match_arms"), lit("}")])])
    .rule(
        "_match_arms",
        [alt([sym("match_arm")]), alt([sym("_match_arms"), sym("match_arm")])],
    )
    .rule(
        "match_arm",
        [
            alt([field("pattern", "pattern"), lit("->"), field("expr", "expression")]),
            alt([
                field("pattern", "pattern"),
                lit("->"),
                field("expr", "expression"),
                lit(","),
            ]),
        ],
    );

    let binary = BINARY_OPERATORS
        .iter()
        .map(|&(operator, level)| {
            alt([
                field("lhs", "expression"),
                field_lit("operator", operator),
                field("rhs", "expression"),
            ])
            .prec_left(level)
        })
        .collect::<Vec<Alt>>();

    g.rule(
        "assignment",
        [alt([field("lhs", "expression"), lit("="), field("right", "expression")])
            .prec_left(ASSIGN)],
    )
    .rule(
        "unary",
        [
            alt([lit("-"), sym("expression")]).prec_left(UNARY),
            alt([lit("!"), sym("expression")]).prec_left(UNARY),
        ],
    )
    .rule("binary", binary)
    .rule("parenthesized", [alt([lit("("), sym("expression"), lit(")")])])
    .rule(
        "struct_literal",
        [
            alt([field("name", "type_identifier"), lit("{"), lit("}")]),
            alt([field("name", "type_identifier"), lit("{"), sym("_struct_fields"), lit("}")]),
            alt([
                field("name", "type_identifier"),
                lit("{"),
                sym("_struct_fields"),
                lit(","),
                lit("}"),
            ]),
        ],
    )
    .rule(
        "_struct_fields",
        [
            alt([sym("_struct_field")]),
            alt([sym("_struct_fields"), lit(","), sym("_struct_field")]),
        ],
    )
    .rule(
        "_struct_field",
        [alt([field("field", "expr_identifier"), lit(":"), field("value", "expression")])],
    )
    .rule(
        "enum_literal",
        [alt([
            field("type", "type_identifier"),
            lit("."),
            field("variant", "struct_literal"),
        ])],
    );
}
