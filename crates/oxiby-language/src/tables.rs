//! The plain-data table format a grammar compiles into.
//!
//! Everything here is inert data: no behavior beyond sorted-slice lookups.
//! The layout is the compatibility contract between grammar bundles and the
//! runtime, versioned by `abi_version`.

/// Identifier of a terminal or nonterminal in a language's symbol registry.
///
/// Indexes into [`RawLanguage::symbols`]. Ids 0..=2 are reserved in every
/// definition: `end`, `ERROR`, and `UNKNOWN`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u16);

impl Symbol {
    /// End of input.
    pub const END: Self = Self(0);
    /// Synthetic kind for error-recovery nodes.
    pub const ERROR: Self = Self(1);
    /// Terminal emitted for bytes no lexical rule matches.
    pub const UNKNOWN: Self = Self(2);
    /// First id available to grammar-defined symbols.
    pub const FIRST_FREE: u16 = 3;

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a field name, indexing into [`RawLanguage::fields`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Field(u16);

impl Field {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Registry entry for one symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: Box<str>,
    pub terminal: bool,
    /// Named symbols appear in rendered trees; anonymous ones (literals,
    /// whitespace) do not.
    pub named: bool,
    /// Hidden nonterminals splice their children into the parent node.
    pub hidden: bool,
    /// Extras are lexed between any two tokens and attached as trivia.
    pub extra: bool,
}

impl SymbolInfo {
    pub fn end() -> Self {
        Self { name: "end".into(), terminal: true, named: false, hidden: false, extra: false }
    }

    pub fn error() -> Self {
        Self { name: "ERROR".into(), terminal: false, named: true, hidden: false, extra: false }
    }

    pub fn unknown() -> Self {
        Self { name: "UNKNOWN".into(), terminal: true, named: false, hidden: false, extra: false }
    }
}

/// Lexical shape of one terminal.
///
/// The closed opcode set keeps the scanner table-driven without shipping a
/// DFA: literals cover keywords and punctuation, the pattern opcodes cover
/// the token classes the grammar format supports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexPattern {
    /// Exact text. Wins length ties against pattern opcodes, so keywords
    /// shadow identifiers without special cases.
    Literal(Box<str>),
    /// `[a-z_][0-9A-Za-z_]*`
    LowerIdent,
    /// `[A-Z][0-9A-Za-z]*`
    UpperIdent,
    /// `[0-9]+`
    Integer,
    /// `[0-9]+ "." [0-9]+`
    Float,
    /// `" ... "` with no escapes, terminated on the same quote.
    String,
    /// `//` to end of line.
    LineComment,
    /// Maximal run of Unicode whitespace.
    Whitespace,
}

/// One scanner rule: when `pattern` matches, emit `symbol`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexRule {
    pub symbol: Symbol,
    pub pattern: LexPattern,
}

/// One grammar production. `fields` runs parallel to `rhs`; a `Some` entry
/// assigns that field to the node(s) produced by the slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Production {
    pub lhs: Symbol,
    pub rhs: Box<[Symbol]>,
    pub fields: Box<[Option<Field>]>,
}

/// Parse action for a `(state, terminal)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Shift(u32),
    Reduce(u32),
    Accept,
}

/// One automaton state: actions keyed by terminal, gotos by nonterminal.
/// Both slices are sorted by symbol id for binary-search lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub actions: Box<[(Symbol, Action)]>,
    pub gotos: Box<[(Symbol, u32)]>,
}

impl State {
    pub fn action(&self, terminal: Symbol) -> Option<Action> {
        let index = self.actions.binary_search_by_key(&terminal, |&(symbol, _)| symbol).ok()?;
        Some(self.actions[index].1)
    }

    pub fn goto(&self, nonterminal: Symbol) -> Option<u32> {
        let index = self.gotos.binary_search_by_key(&nonterminal, |&(symbol, _)| symbol).ok()?;
        Some(self.gotos[index].1)
    }
}

/// A compiled grammar bundle: the in-memory "wire format" grammar crates
/// export and the loader validates. Created at generation time, never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLanguage {
    pub abi_version: u16,
    pub name: Box<str>,
    pub symbols: Box<[SymbolInfo]>,
    pub fields: Box<[Box<str>]>,
    pub lex_rules: Box<[LexRule]>,
    pub productions: Box<[Production]>,
    pub states: Box<[State]>,
    /// Start symbol; also the kind of every tree's root node. Parsing begins
    /// in state 0.
    pub root: Symbol,
}

impl RawLanguage {
    pub fn symbol(&self, symbol: Symbol) -> &SymbolInfo {
        &self.symbols[symbol.index()]
    }

    pub fn production(&self, index: u32) -> &Production {
        &self.productions[index as usize]
    }

    pub fn state(&self, index: u32) -> &State {
        &self.states[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_lookup_is_sorted_binary_search() {
        let state = State {
            actions: Box::new([
                (Symbol::new(3), Action::Shift(7)),
                (Symbol::new(5), Action::Reduce(2)),
                (Symbol::new(9), Action::Accept),
            ]),
            gotos: Box::new([(Symbol::new(12), 4)]),
        };

        assert_eq!(state.action(Symbol::new(3)), Some(Action::Shift(7)));
        assert_eq!(state.action(Symbol::new(5)), Some(Action::Reduce(2)));
        assert_eq!(state.action(Symbol::new(9)), Some(Action::Accept));
        assert_eq!(state.action(Symbol::new(4)), None);
        assert_eq!(state.goto(Symbol::new(12)), Some(4));
        assert_eq!(state.goto(Symbol::new(3)), None);
    }
}
