//! Generate ABNF (RFC 5234) descriptions of the languages implemented by a
//! flex lexer and bison grammar pair.

use abnf::Document;
use grammar::{Canonicalizer, Settings};
use tracing::info;

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Column rule bodies are wrapped at.
    pub width: usize,
    /// Prefix of lexer token names as referenced from the grammar.
    pub token_prefix: String,
    /// Keyword of the `/*#...#*/` comment flagging top level rules.
    pub marker: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            width: 72,
            token_prefix: "TKN_".to_owned(),
            marker: "toplevel".to_owned(),
        }
    }
}

/// Render the ABNF for a lexer source and grammar source. Nothing is
/// returned unless both sources were read successfully.
pub fn generate(lexer_source: &str, grammar_source: &str, options: &Options) -> grammar::Result<String> {
    let terminals = grammar::lexer::extract(lexer_source)?;
    let source = grammar::parser::extract(grammar_source, &options.marker)?;

    let settings = Settings {
        token_prefix: options.token_prefix.clone(),
    };
    let roots = source.roots();
    let rules = Canonicalizer::new(&source.rules, &terminals, &roots, settings).rules();
    info!(
        terminals = terminals.len(),
        rules = rules.len(),
        "generated abnf"
    );

    let document = Document {
        terminals: terminals.rules(),
        rules,
    };
    Ok(document.render(options.width))
}
