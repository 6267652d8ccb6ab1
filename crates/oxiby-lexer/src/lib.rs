use oxiby_language::{Language, LexPattern, Symbol};
use text_size::{TextRange, TextSize};

/// One scanned token. `range` covers the significant text; extras scanned
/// around it are recorded as leading/trailing trivia lengths so the token
/// stream stays lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: Symbol,
    pub range: TextRange,
    pub leading_len: TextSize,
    pub trailing_len: TextSize,
}

impl Token {
    pub fn is_end(&self) -> bool {
        self.kind == Symbol::END
    }
}

/// Table-driven scanner over a language definition's lexical rules.
///
/// Longest match wins; on a length tie a literal rule beats a pattern rule,
/// so keywords shadow identifiers. Bytes no rule matches become one-char
/// `UNKNOWN` tokens for the parser's recovery to sweep up. Trivia between
/// two tokens attaches to the earlier token as trailing trivia; only the
/// first token (and an all-trivia input's end token) carries leading trivia.
pub struct Lexer<'a> {
    language: &'a Language,
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(language: &'a Language, text: &'a str) -> Self {
        Self { language, text, pos: 0 }
    }

    pub fn next_token(&mut self) -> Token {
        let leading_start = self.pos;
        self.skip_extras();
        let leading_len = TextSize::new((self.pos - leading_start) as u32);

        let start = self.pos;
        if start == self.text.len() {
            return Token {
                kind: Symbol::END,
                range: TextRange::empty(TextSize::new(start as u32)),
                leading_len,
                trailing_len: TextSize::new(0),
            };
        }

        let (kind, len) = self.match_token(start);
        self.pos = start + len;
        let range =
            TextRange::new(TextSize::new(start as u32), TextSize::new(self.pos as u32));

        let trailing_start = self.pos;
        self.skip_extras();
        let trailing_len = TextSize::new((self.pos - trailing_start) as u32);

        Token { kind, range, leading_len, trailing_len }
    }

    fn skip_extras(&mut self) {
        let raw = self.language.raw();
        loop {
            let rest = &self.text[self.pos..];
            let advanced = raw
                .lex_rules
                .iter()
                .filter(|rule| raw.symbol(rule.symbol).extra)
                .filter_map(|rule| match_len(&rule.pattern, rest))
                .max();
            match advanced {
                Some(len) if len > 0 => self.pos += len,
                _ => break,
            }
        }
    }

    fn match_token(&self, start: usize) -> (Symbol, usize) {
        let raw = self.language.raw();
        let rest = &self.text[start..];

        let mut best: Option<(usize, bool, Symbol)> = None;
        for rule in raw.lex_rules.iter().filter(|rule| !raw.symbol(rule.symbol).extra) {
            let Some(len) = match_len(&rule.pattern, rest) else { continue };
            if len == 0 {
                continue;
            }
            let literal = matches!(rule.pattern, LexPattern::Literal(_));
            let better = match best {
                None => true,
                Some((best_len, best_literal, _)) => {
                    len > best_len || (len == best_len && literal && !best_literal)
                }
            };
            if better {
                best = Some((len, literal, rule.symbol));
            }
        }

        match best {
            Some((len, _, symbol)) => (symbol, len),
            None => {
                let char_len =
                    rest.chars().next().map_or(1, char::len_utf8);
                (Symbol::UNKNOWN, char_len)
            }
        }
    }
}

fn match_len(pattern: &LexPattern, rest: &str) -> Option<usize> {
    match pattern {
        LexPattern::Literal(text) => rest.starts_with(&**text).then(|| text.len()),
        LexPattern::LowerIdent => {
            let first = rest.as_bytes().first()?;
            if !(first.is_ascii_lowercase() || *first == b'_') {
                return None;
            }
            Some(1 + ident_continue_len(&rest[1..], true))
        }
        LexPattern::UpperIdent => {
            let first = rest.as_bytes().first()?;
            if !first.is_ascii_uppercase() {
                return None;
            }
            Some(1 + ident_continue_len(&rest[1..], false))
        }
        LexPattern::Integer => {
            let len = digit_len(rest);
            (len > 0).then_some(len)
        }
        LexPattern::Float => {
            let whole = digit_len(rest);
            if whole == 0 || rest.as_bytes().get(whole) != Some(&b'.') {
                return None;
            }
            let fraction = digit_len(&rest[whole + 1..]);
            (fraction > 0).then_some(whole + 1 + fraction)
        }
        LexPattern::String => {
            if !rest.starts_with('"') {
                return None;
            }
            let close = rest[1..].find('"')?;
            Some(close + 2)
        }
        LexPattern::LineComment => {
            if !rest.starts_with("//") {
                return None;
            }
            let body = rest[2..].find('\n').unwrap_or(rest.len() - 2);
            Some(2 + body)
        }
        LexPattern::Whitespace => {
            let len: usize =
                rest.chars().take_while(|c| c.is_whitespace()).map(char::len_utf8).sum();
            (len > 0).then_some(len)
        }
    }
}

fn ident_continue_len(rest: &str, allow_underscore: bool) -> usize {
    rest.bytes()
        .take_while(|byte| {
            byte.is_ascii_alphanumeric() || (allow_underscore && *byte == b'_')
        })
        .count()
}

fn digit_len(rest: &str) -> usize {
    rest.bytes().take_while(u8::is_ascii_digit).count()
}
