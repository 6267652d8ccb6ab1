//! The Oxiby grammar, compiled into a loadable language definition.
//!
//! This crate plays the role of a generated grammar bundle: it exports a
//! single accessor returning an opaque handle, guaranteed non-null when the
//! grammar compiles. Hosts validate the handle through
//! `oxiby_language::Language::load` before parsing with it.

mod grammar;

use std::sync::LazyLock;

use oxiby_language::LanguageHandle;

static LANGUAGE: LazyLock<LanguageHandle> = LazyLock::new(|| {
    grammar::grammar()
        .build()
        .unwrap_or_else(|error| panic!("the bundled oxiby grammar failed to compile: {error}"))
});

/// Returns the compiled Oxiby grammar bundle.
///
/// The grammar compiles once per process; every call hands out the same
/// shared definition, so loading it repeatedly is cheap and idempotent.
pub fn language() -> LanguageHandle {
    LANGUAGE.clone()
}

#[cfg(test)]
mod tests {
    use oxiby_language::{ABI_VERSION, Language, Symbol};

    use super::*;

    #[test]
    fn can_load_grammar() {
        let handle = language();
        assert!(!handle.is_null(), "error loading Oxiby grammar");

        let language = Language::load(&handle).expect("error loading Oxiby grammar");
        assert_eq!(language.name(), "oxiby");
        assert_eq!(language.version(), ABI_VERSION);
        assert!(language.symbol_count() > Symbol::FIRST_FREE as usize);
        assert!(language.field_count() > 0);
    }

    #[test]
    fn loading_is_idempotent() {
        let first = Language::load(&language()).unwrap();
        let second = Language::load(&language()).unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(first.version(), second.version());
        assert_eq!(first.symbol_count(), second.symbol_count());
        assert_eq!(first.field_count(), second.field_count());
    }

    #[test]
    fn exposes_expected_symbols() {
        let language = Language::load(&language()).unwrap();
        let names: Vec<&str> = (0..language.symbol_count())
            .map(|index| language.symbol_name(Symbol::new(index as u16)))
            .collect();

        for expected in [
            "source_file",
            "item_fn",
            "item_struct",
            "item_enum",
            "item_trait",
            "item_impl",
            "item_use",
            "expr_identifier",
            "type_identifier",
            "binary",
            "match_arm",
            "comment",
        ] {
            assert!(names.contains(&expected), "missing symbol `{expected}`");
        }
        assert_eq!(language.symbol_name(language.root_symbol()), "source_file");
    }

    #[test]
    fn exposes_expected_fields() {
        let language = Language::load(&language()).unwrap();
        for expected in ["name", "parameters", "body", "signature", "lhs", "rhs", "pattern"] {
            assert!(language.field_id(expected).is_some(), "missing field `{expected}`");
        }
    }
}
