//! Extraction of named definitions from the first section of a flex source.

use nom::{
    bytes::complete::take_till1,
    character::complete::space1,
    combinator::rest,
    sequence::separated_pair,
    IResult,
};
use tracing::debug;

use abnf::{parser::unescape, regex, Fragment};

use crate::error::{Error, Result};
use crate::position::Position;
use crate::tables::{Terminal, TerminalKind, TerminalTable};

/// Split a definition line into its name and the text following it.
fn definition(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till1(|c| c == ' ' || c == '\t'), space1, rest)(input)
}

/// Collect the named definitions preceding the first `%%` line. Text in
/// `%{ ... %}` blocks and comments is skipped.
pub fn extract(input: &str) -> Result<TerminalTable> {
    let mut table = TerminalTable::new();
    let mut pos = Position::new(input);

    while !pos.is_empty() {
        let line_no = pos.line();
        let line = pos.take_line();

        if line.starts_with("%{") {
            skip_verbatim(&mut pos);
            continue;
        }
        if line.starts_with("%%") {
            debug!(terminals = table.len(), "lexer definitions extracted");
            return Ok(table);
        }
        if let Some(comment) = line.strip_prefix("/*") {
            if !comment.contains("*/") {
                skip_comment(&mut pos, line_no)?;
            }
            continue;
        }

        let stripped = line.trim();
        if stripped.len() < 3 {
            continue;
        }
        let (key, value) = match definition(stripped) {
            Ok((_, (key, value))) => (key, value.trim()),
            Err(_) => continue,
        };
        if key.starts_with('%') || value.is_empty() {
            continue;
        }

        let terminal = classify(&table, key, value).map_err(|error| Error::Pattern {
            name: key.to_owned(),
            line: line_no,
            error,
        })?;
        debug!(name = key, kind = ?terminal.kind, abnf = %terminal.abnf, "terminal");
        table.insert(terminal);
    }

    Err(Error::MissingSeparator("lexer"))
}

fn skip_verbatim(pos: &mut Position<'_>) {
    while !pos.is_empty() {
        if pos.take_line().starts_with("%}") {
            return;
        }
    }
}

fn skip_comment(pos: &mut Position<'_>, start: usize) -> Result<()> {
    while !pos.is_empty() {
        if pos.take_line().contains("*/") {
            return Ok(());
        }
    }
    Err(Error::UnterminatedComment { line: start })
}

/// Whether a definition is literal text rather than a pattern.
fn is_plain(value: &str) -> bool {
    let quoted = value.len() > 1 && value.starts_with('"') && value.ends_with('"');
    quoted || !value.contains(|c| "[({*+?|".contains(c))
}

fn classify(table: &TerminalTable, key: &str, value: &str) -> abnf::Result<Terminal> {
    let mut chars = value.chars();
    let (kind, abnf) = match (chars.next(), chars.next(), chars.next()) {
        _ if value.chars().all(char::is_alphabetic) => (
            TerminalKind::Keyword,
            Fragment::literal(&value.to_uppercase()),
        ),
        (Some('\\'), Some(_), None) | (Some(_), None, _) => {
            let c = unescape(value).chars().next().unwrap_or('\\');
            (TerminalKind::Char, Fragment::char(c))
        }
        _ if is_plain(value) => {
            // Slashes only delimit unquoted text.
            let text = match value.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
                Some(quoted) => quoted.to_owned(),
                None => value.replace('/', ""),
            };
            (TerminalKind::Literal, Fragment::literal(&unescape(&text)))
        }
        _ => {
            let abnf = regex::translate_with(value, |name| {
                table.get(name).map(Terminal::reference)
            })?;
            (TerminalKind::Pattern, abnf)
        }
    };

    Ok(Terminal {
        name: key.to_owned(),
        kind,
        abnf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abnf_of(table: &TerminalTable, name: &str) -> (TerminalKind, String) {
        let t = table
            .get(name)
            .unwrap_or_else(|| panic!("missing terminal {}", name));
        (t.kind, t.abnf.to_string())
    }

    #[test]
    fn extract_definitions() {
        let input = r#"%{
#include "parser.h"
SKIPPED  this is code
%}
/* single line comment */
/*
 * block comment
 */
%option noyywrap
%x COMMENT

SELECT      select
COMMA       ,
NEWLINE     \n
ARROW       /=>/
EQ          "=="
SLASH       "/"
OPEN        "/*"
DIGIT       [0-9]
SIGNED      -?{DIGIT}+
NUMBER      {DIGIT}+(\.{DIGIT}+)?
IDENT	[a-zA-Z_][a-zA-Z0-9_]*
x

%%
AFTER   after
"#;
        let table = extract(input).unwrap();

        let tests = vec![
            ("SELECT", TerminalKind::Keyword, "\"SELECT\""),
            ("COMMA", TerminalKind::Char, "\",\""),
            ("NEWLINE", TerminalKind::Char, "%x0A"),
            ("ARROW", TerminalKind::Literal, "\"=>\""),
            ("EQ", TerminalKind::Literal, "\"==\""),
            ("SLASH", TerminalKind::Literal, "\"/\""),
            ("OPEN", TerminalKind::Literal, "\"/*\""),
            ("DIGIT", TerminalKind::Pattern, "DIGIT"),
            ("SIGNED", TerminalKind::Pattern, "0*1\"-\" 1*<digit>"),
            (
                "NUMBER",
                TerminalKind::Pattern,
                "1*<digit> 0*1(\".\" 1*<digit>)",
            ),
            (
                "IDENT",
                TerminalKind::Pattern,
                "(ALPHA / \"_\") *(ALPHA / DIGIT / \"_\")",
            ),
        ];
        for (name, kind, abnf) in tests {
            assert_eq!(
                abnf_of(&table, name),
                (kind, abnf.to_owned()),
                "terminal: {}",
                name
            );
        }

        assert_eq!(table.len(), 11);
        assert!(table.get("SKIPPED").is_none());
        assert!(table.get("AFTER").is_none());

        let rules: Vec<String> = table.rules().iter().map(|r| r.to_string()).collect();
        assert_eq!(
            rules,
            vec![
                "SELECT = \"SELECT\"",
                "<digit> = DIGIT",
                "<signed> = 0*1\"-\" 1*<digit>",
                "<number> = 1*<digit> 0*1(\".\" 1*<digit>)",
                "<ident> = (ALPHA / \"_\") *(ALPHA / DIGIT / \"_\")",
            ]
        );
    }

    #[test]
    fn extract_errors() {
        let tests = vec![
            ("A a\n", Error::MissingSeparator("lexer")),
            ("/* open\nA a\n%%\n", Error::UnterminatedComment { line: 1 }),
            (
                "A a\nBAD [abc\n%%\n",
                Error::Pattern {
                    name: "BAD".to_owned(),
                    line: 2,
                    error: abnf::Error::UnterminatedClass("[abc".to_owned()),
                },
            ),
        ];

        for (input, want) in tests {
            assert_eq!(extract(input).unwrap_err(), want, "input: {:?}", input);
        }
    }
}
