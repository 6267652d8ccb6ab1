//! Compiled language definitions and the loader that validates them.
//!
//! A grammar is compiled (out of band) into a [`RawLanguage`]: a versioned,
//! plain-data bundle of lexical rules, productions, and an action/goto table.
//! Grammar crates hand it out as an opaque [`LanguageHandle`]; the loader
//! turns a handle into a validated [`Language`] that the parse engine and
//! every produced tree share read-only.

mod tables;

use triomphe::Arc;

pub use crate::tables::{
    Action, Field, LexPattern, LexRule, Production, RawLanguage, State, Symbol, SymbolInfo,
};

/// Table-format revision this build of the runtime understands.
///
/// A definition whose `abi_version` differs is rejected outright; hosts must
/// not guess compatibility across revisions.
pub const ABI_VERSION: u16 = 1;

/// Opaque handle to a compiled grammar bundle, as exported by grammar crates.
///
/// A handle may be null; only [`Language::load`] decides whether it is usable.
#[derive(Clone)]
pub struct LanguageHandle(Option<Arc<RawLanguage>>);

impl LanguageHandle {
    pub fn new(raw: RawLanguage) -> Self {
        Self(Some(Arc::new(raw)))
    }

    /// The absent handle, standing in for a grammar bundle that failed to
    /// build or was never linked in.
    pub const fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }
}

impl std::fmt::Debug for LanguageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(raw) => f.debug_tuple("LanguageHandle").field(&raw.name).finish(),
            None => f.write_str("LanguageHandle(null)"),
        }
    }
}

/// A validated, immutable language definition.
///
/// Cheap to clone and safe to share across threads; every clone refers to the
/// same underlying tables. Instances can only be produced by the loader, so
/// holding a `Language` implies the version gate already passed.
#[derive(Clone)]
pub struct Language {
    raw: Arc<RawLanguage>,
}

impl Language {
    /// Validates `handle` against this runtime's [`ABI_VERSION`].
    ///
    /// Loading is idempotent: repeated calls with the same handle yield
    /// definitions backed by the same allocation.
    pub fn load(handle: &LanguageHandle) -> Result<Self, LoadError> {
        Self::load_for_version(handle, ABI_VERSION)
    }

    /// Validates `handle` against an explicit table-format revision.
    ///
    /// For embedders pinned to a specific revision; everything else goes
    /// through [`Language::load`].
    pub fn load_for_version(handle: &LanguageHandle, expected: u16) -> Result<Self, LoadError> {
        let raw = handle.0.as_ref().ok_or(LoadError::NullDefinition)?;
        if raw.abi_version != expected {
            return Err(LoadError::VersionMismatch { found: raw.abi_version, expected });
        }
        Ok(Self { raw: Arc::clone(raw) })
    }

    pub fn name(&self) -> &str {
        &self.raw.name
    }

    pub fn version(&self) -> u16 {
        self.raw.abi_version
    }

    pub fn symbol_count(&self) -> usize {
        self.raw.symbols.len()
    }

    pub fn field_count(&self) -> usize {
        self.raw.fields.len()
    }

    /// The symbol produced for the root node of every tree.
    pub fn root_symbol(&self) -> Symbol {
        self.raw.root
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        &self.raw.symbol(symbol).name
    }

    pub fn is_named(&self, symbol: Symbol) -> bool {
        self.raw.symbol(symbol).named
    }

    pub fn is_hidden(&self, symbol: Symbol) -> bool {
        self.raw.symbol(symbol).hidden
    }

    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.raw.symbol(symbol).extra
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        self.raw.symbol(symbol).terminal
    }

    pub fn field_name(&self, field: Field) -> &str {
        &self.raw.fields[field.index()]
    }

    pub fn field_id(&self, name: &str) -> Option<Field> {
        let index = self.raw.fields.iter().position(|field| &**field == name)?;
        Some(Field::new(index as u16))
    }

    /// The raw tables backing this definition, for the lexer and engine.
    pub fn raw(&self) -> &RawLanguage {
        &self.raw
    }

    /// Whether two definitions share the same underlying tables.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.raw, &other.raw)
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("version", &self.version())
            .field("symbols", &self.symbol_count())
            .field("fields", &self.field_count())
            .finish()
    }
}

/// Failures surfaced by the loader before a definition is ever used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("language definition handle is null")]
    NullDefinition,
    #[error("language table format version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u16, expected: u16 },
}
