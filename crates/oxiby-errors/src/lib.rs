use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;

/// A message anchored to a byte range of the parsed text.
///
/// Diagnostics describe recovered syntax errors; they travel with the tree
/// that contains the corresponding `ERROR` nodes and never abort a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    message: String,
    range: TextRange,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { message: message.into(), range }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    /// Extends the annotated range to `end`; recovery grows a diagnostic as
    /// it skips further tokens in the same run.
    pub fn extend_to(&mut self, end: text_size::TextSize) {
        self.range = TextRange::new(self.range.start(), end);
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let message = Level::Error.title(&self.message).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(Level::Error.span(self.range.into()).label("here"))
                .fold(true),
        );
        renderer.render(message)
    }
}

#[cfg(test)]
mod tests {
    use text_size::TextSize;

    use super::*;

    #[test]
    fn render_plain() {
        let diagnostic = Diagnostic::error(
            "unexpected token `@`",
            TextRange::new(TextSize::new(5), TextSize::new(6)),
        );
        let renderer = Renderer::plain();
        let output = diagnostic.render(&renderer, "demo.oxiby", "fn m @ ()").to_string();
        assert!(output.contains("unexpected token `@`"));
        assert!(output.contains("demo.oxiby"));
    }

    #[test]
    fn extend_to_grows_range() {
        let mut diagnostic =
            Diagnostic::error("bad", TextRange::new(TextSize::new(1), TextSize::new(2)));
        diagnostic.extend_to(TextSize::new(7));
        assert_eq!(diagnostic.range(), TextRange::new(TextSize::new(1), TextSize::new(7)));
    }
}
