//! Generation-time grammar compiler.
//!
//! [`GrammarBuilder`] takes a declarative grammar (tokens, literals,
//! precedence declarations, rules) and compiles it into the table format of
//! `oxiby-language`: an SLR(1) action/goto automaton with yacc-style static
//! conflict resolution. This is the step that runs when a grammar bundle is
//! built, not when source text is parsed.

mod automaton;

use oxiby_language::{
    ABI_VERSION, Field, LanguageHandle, LexPattern, LexRule, Production, RawLanguage, Symbol,
    SymbolInfo,
};
use rustc_hash::FxHashMap;

/// Lexical shape of a declared token. Literal text never goes through here;
/// it is written directly in rules via [`lit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenPattern {
    LowerIdent,
    UpperIdent,
    Integer,
    Float,
    String,
    LineComment,
    Whitespace,
}

impl TokenPattern {
    fn lower(self) -> LexPattern {
        match self {
            Self::LowerIdent => LexPattern::LowerIdent,
            Self::UpperIdent => LexPattern::UpperIdent,
            Self::Integer => LexPattern::Integer,
            Self::Float => LexPattern::Float,
            Self::String => LexPattern::String,
            Self::LineComment => LexPattern::LineComment,
            Self::Whitespace => LexPattern::Whitespace,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// One element of a production's right-hand side.
#[derive(Clone, Debug)]
pub struct Elem {
    kind: ElemKind,
    field: Option<&'static str>,
}

#[derive(Clone, Debug)]
enum ElemKind {
    /// Reference to a declared token or rule by name.
    Sym(&'static str),
    /// Anonymous literal token, registered on first use.
    Lit(&'static str),
}

/// References a declared token or rule.
pub fn sym(name: &'static str) -> Elem {
    Elem { kind: ElemKind::Sym(name), field: None }
}

/// An anonymous literal token (keyword or punctuation).
pub fn lit(text: &'static str) -> Elem {
    Elem { kind: ElemKind::Lit(text), field: None }
}

/// Like [`sym`], with a field name attached to the produced node.
pub fn field(name: &'static str, symbol: &'static str) -> Elem {
    Elem { kind: ElemKind::Sym(symbol), field: Some(name) }
}

/// Like [`lit`], with a field name attached to the token.
pub fn field_lit(name: &'static str, text: &'static str) -> Elem {
    Elem { kind: ElemKind::Lit(text), field: Some(name) }
}

/// One alternative of a rule.
#[derive(Clone, Debug)]
pub struct Alt {
    elems: Vec<Elem>,
    prec: Option<(u8, Assoc)>,
}

/// Builds an alternative from its elements; `alt([])` is the empty production.
pub fn alt(elems: impl IntoIterator<Item = Elem>) -> Alt {
    Alt { elems: elems.into_iter().collect(), prec: None }
}

impl Alt {
    pub fn prec_left(mut self, level: u8) -> Self {
        self.prec = Some((level, Assoc::Left));
        self
    }

    pub fn prec_right(mut self, level: u8) -> Self {
        self.prec = Some((level, Assoc::Right));
        self
    }
}

struct TokenDef {
    name: &'static str,
    pattern: TokenPattern,
    extra: bool,
    named: bool,
}

struct RuleDef {
    name: &'static str,
    alts: Vec<Alt>,
}

/// Declarative grammar under construction. `build` performs all validation
/// and table computation.
pub struct GrammarBuilder {
    name: &'static str,
    root: &'static str,
    tokens: Vec<TokenDef>,
    rules: Vec<RuleDef>,
    precedences: Vec<(&'static str, u8, Assoc)>,
    supertypes: Vec<&'static str>,
}

impl GrammarBuilder {
    pub fn new(name: &'static str, root: &'static str) -> Self {
        Self {
            name,
            root,
            tokens: Vec::new(),
            rules: Vec::new(),
            precedences: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    /// Declares a named pattern token.
    pub fn token(&mut self, name: &'static str, pattern: TokenPattern) -> &mut Self {
        self.tokens.push(TokenDef { name, pattern, extra: false, named: true });
        self
    }

    /// Declares a token lexed between any two ordinary tokens and attached
    /// as trivia. Whitespace extras are anonymous; all others are named.
    pub fn extra(&mut self, name: &'static str, pattern: TokenPattern) -> &mut Self {
        let named = pattern != TokenPattern::Whitespace;
        self.tokens.push(TokenDef { name, pattern, extra: true, named });
        self
    }

    /// Declares left-associative precedence for terminals, by token name or
    /// literal text. Higher levels bind tighter.
    pub fn prec_left(&mut self, level: u8, terminals: &[&'static str]) -> &mut Self {
        for terminal in terminals {
            self.precedences.push((terminal, level, Assoc::Left));
        }
        self
    }

    /// Declares right-associative precedence for terminals.
    pub fn prec_right(&mut self, level: u8, terminals: &[&'static str]) -> &mut Self {
        for terminal in terminals {
            self.precedences.push((terminal, level, Assoc::Right));
        }
        self
    }

    /// Adds a rule. Rules whose name starts with `_` are hidden: their
    /// children splice into the parent node instead of forming one.
    pub fn rule(&mut self, name: &'static str, alts: impl IntoIterator<Item = Alt>) -> &mut Self {
        self.rules.push(RuleDef { name, alts: alts.into_iter().collect() });
        self
    }

    /// Marks a visible-named rule as hidden (a supertype): it groups
    /// alternatives in the grammar but never appears in trees.
    pub fn supertype(&mut self, name: &'static str) -> &mut Self {
        self.supertypes.push(name);
        self
    }

    /// Compiles the grammar into a loadable handle.
    pub fn build(&self) -> Result<LanguageHandle, GrammarError> {
        let symbols = self.assemble_symbols()?;
        let (productions, prod_precs, fields) = self.assemble_productions(&symbols)?;
        let token_precs = self.resolve_precedences(&symbols)?;

        let grammar = automaton::Grammar {
            symbols: &symbols.infos,
            productions: &productions,
            prod_precs: &prod_precs,
            token_precs: &token_precs,
        };
        let states = automaton::construct(&grammar);

        let lex_rules = self.assemble_lex_rules(&symbols);

        Ok(LanguageHandle::new(RawLanguage {
            abi_version: ABI_VERSION,
            name: self.name.into(),
            symbols: symbols.infos.into_boxed_slice(),
            fields: fields.into_boxed_slice(),
            lex_rules: lex_rules.into_boxed_slice(),
            productions: productions.into_boxed_slice(),
            states: states.into_boxed_slice(),
            root: symbols.root,
        }))
    }

    fn assemble_symbols(&self) -> Result<SymbolSet, GrammarError> {
        let mut infos =
            vec![SymbolInfo::end(), SymbolInfo::error(), SymbolInfo::unknown()];
        let mut names = FxHashMap::default();
        let mut literals = FxHashMap::default();

        for token in &self.tokens {
            let symbol = Symbol::new(infos.len() as u16);
            if names.insert(token.name, symbol).is_some() {
                return Err(GrammarError::DuplicateName(token.name.to_owned()));
            }
            infos.push(SymbolInfo {
                name: token.name.into(),
                terminal: true,
                named: token.named,
                hidden: false,
                extra: token.extra,
            });
        }

        // Literals in first-use order, scanning rules in declaration order.
        for rule in &self.rules {
            for alt in &rule.alts {
                for elem in &alt.elems {
                    if let ElemKind::Lit(text) = elem.kind {
                        literals.entry(text).or_insert_with(|| {
                            let symbol = Symbol::new(infos.len() as u16);
                            infos.push(SymbolInfo {
                                name: text.into(),
                                terminal: true,
                                named: false,
                                hidden: false,
                                extra: false,
                            });
                            symbol
                        });
                    }
                }
            }
        }

        for rule in &self.rules {
            let symbol = Symbol::new(infos.len() as u16);
            if names.insert(rule.name, symbol).is_some() {
                return Err(GrammarError::DuplicateName(rule.name.to_owned()));
            }
            let hidden =
                rule.name.starts_with('_') || self.supertypes.contains(&rule.name);
            infos.push(SymbolInfo {
                name: rule.name.into(),
                terminal: false,
                named: !hidden,
                hidden,
                extra: false,
            });
        }

        let Some(&root) = names.get(self.root) else {
            return Err(GrammarError::MissingRoot(self.root.to_owned()));
        };
        if infos[root.index()].terminal || infos[root.index()].hidden {
            return Err(GrammarError::InvalidRoot(self.root.to_owned()));
        }

        // Internal augmented start symbol; its single production drives the
        // accept action.
        let start = Symbol::new(infos.len() as u16);
        infos.push(SymbolInfo {
            name: "$start".into(),
            terminal: false,
            named: false,
            hidden: true,
            extra: false,
        });

        Ok(SymbolSet { infos, names, literals, root, start })
    }

    #[allow(clippy::type_complexity)]
    fn assemble_productions(
        &self,
        symbols: &SymbolSet,
    ) -> Result<(Vec<Production>, Vec<Option<(u8, Assoc)>>, Vec<Box<str>>), GrammarError> {
        let mut productions = Vec::new();
        let mut prod_precs = Vec::new();
        let mut fields: Vec<Box<str>> = Vec::new();
        let mut field_ids = FxHashMap::default();

        // Production 0 is the augmented start rule.
        productions.push(Production {
            lhs: symbols.start,
            rhs: Box::new([symbols.root]),
            fields: Box::new([None]),
        });
        prod_precs.push(None);

        for rule in &self.rules {
            let lhs = symbols.names[rule.name];
            for alt in &rule.alts {
                let mut rhs = Vec::with_capacity(alt.elems.len());
                let mut slot_fields = Vec::with_capacity(alt.elems.len());
                for elem in &alt.elems {
                    let symbol = match elem.kind {
                        ElemKind::Sym(name) => {
                            *symbols.names.get(name).ok_or_else(|| {
                                GrammarError::UnknownSymbol {
                                    rule: rule.name.to_owned(),
                                    name: name.to_owned(),
                                }
                            })?
                        }
                        ElemKind::Lit(text) => symbols.literals[text],
                    };
                    rhs.push(symbol);
                    slot_fields.push(elem.field.map(|name| {
                        *field_ids.entry(name).or_insert_with(|| {
                            let id = Field::new(fields.len() as u16);
                            fields.push(name.into());
                            id
                        })
                    }));
                }
                productions.push(Production {
                    lhs,
                    rhs: rhs.into_boxed_slice(),
                    fields: slot_fields.into_boxed_slice(),
                });
                prod_precs.push(alt.prec);
            }
        }

        Ok((productions, prod_precs, fields))
    }

    fn resolve_precedences(
        &self,
        symbols: &SymbolSet,
    ) -> Result<FxHashMap<Symbol, (u8, Assoc)>, GrammarError> {
        let mut token_precs = FxHashMap::default();
        for &(name, level, assoc) in &self.precedences {
            let symbol = symbols
                .names
                .get(name)
                .or_else(|| symbols.literals.get(name))
                .copied()
                .ok_or_else(|| GrammarError::UnknownPrecedenceTerminal(name.to_owned()))?;
            token_precs.insert(symbol, (level, assoc));
        }
        Ok(token_precs)
    }

    fn assemble_lex_rules(&self, symbols: &SymbolSet) -> Vec<LexRule> {
        let mut lex_rules = Vec::new();
        for token in &self.tokens {
            lex_rules.push(LexRule {
                symbol: symbols.names[token.name],
                pattern: token.pattern.lower(),
            });
        }
        let mut literals: Vec<_> = symbols.literals.iter().collect();
        literals.sort_by_key(|&(_, symbol)| *symbol);
        for (text, &symbol) in literals {
            lex_rules.push(LexRule { symbol, pattern: LexPattern::Literal((*text).into()) });
        }
        lex_rules
    }
}

struct SymbolSet {
    infos: Vec<SymbolInfo>,
    names: FxHashMap<&'static str, Symbol>,
    literals: FxHashMap<&'static str, Symbol>,
    root: Symbol,
    start: Symbol,
}

/// Grammar compilation failures; all are authoring mistakes caught at
/// generation time, never at parse time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("duplicate token or rule name `{0}`")]
    DuplicateName(String),
    #[error("rule `{rule}` references unknown symbol `{name}`")]
    UnknownSymbol { rule: String, name: String },
    #[error("root rule `{0}` is not defined")]
    MissingRoot(String),
    #[error("root rule `{0}` must be a visible nonterminal")]
    InvalidRoot(String),
    #[error("precedence declared for unknown terminal `{0}`")]
    UnknownPrecedenceTerminal(String),
}
