use anyhow::Context as _;
use camino::Utf8PathBuf;
use clap::Parser;
use oxiby_errors::Renderer;
use oxiby_language::Language;

#[derive(Parser)]
enum Options {
    /// Parse a source file and print its syntax tree.
    Parse { path: Utf8PathBuf },
}

fn main() -> anyhow::Result<()> {
    match Options::parse() {
        Options::Parse { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read `{path}`"))?;

            let language = Language::load(&oxiby_grammar::language())
                .context("failed to load the bundled oxiby grammar")?;
            let tree = oxiby_parse::parse(&language, &text, None)
                .context("language definition is incompatible with this engine")?;

            println!("{tree}");

            let renderer = Renderer::styled();
            for diagnostic in tree.diagnostics() {
                eprintln!("{}", diagnostic.render(&renderer, path.as_str(), &text));
            }

            Ok(())
        }
    }
}
