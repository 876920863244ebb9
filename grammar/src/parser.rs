//! Extraction of productions from a bison source.
//!
//! The declarations section is only consulted for `%start`. In the rules
//! section, action code in braces and comments are dropped from the bodies
//! while quoted literals are kept intact, so none of `{`, `}`, `;` or `/*`
//! inside a literal or comment affects where a production ends.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{alpha1, alphanumeric1, char, space0},
    combinator::{all_consuming, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::position::Position;
use crate::tables::{Rule, RuleTable};

/// Productions read from a grammar source.
#[derive(Debug, Clone, Default)]
pub struct GrammarSource {
    /// Symbol named by `%start`, if any.
    pub start: Option<String>,
    pub rules: RuleTable,
    /// Names of productions flagged with the marker comment, in the order
    /// they were defined.
    pub top_level: Vec<String>,
}

impl GrammarSource {
    /// Rules to emit blocks for: the flagged rules, or if none were flagged,
    /// the start symbol, or failing that the first rule.
    pub fn roots(&self) -> Vec<String> {
        if !self.top_level.is_empty() {
            return self.top_level.clone();
        }
        let fallback = self
            .start
            .as_deref()
            .filter(|start| self.rules.contains(start))
            .or_else(|| self.rules.first());
        match fallback {
            Some(name) => {
                warn!(rule = name, "no top level markers, using a single root");
                vec![name.to_owned()]
            }
            None => Vec::new(),
        }
    }
}

/// A bison symbol name.
pub fn symbol(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"), tag("."))),
        many0(alt((alphanumeric1, tag("_"), tag("."), tag("-")))),
    ))(input)
}

fn rule_header(input: &str) -> IResult<&str, &str> {
    preceded(space0, terminated(symbol, pair(space0, char(':'))))(input)
}

/// Keyword of a `/*#keyword#*/` marker line.
fn marker_key(line: &str) -> Option<&str> {
    let parsed: IResult<&str, &str> =
        all_consuming(delimited(tag("/*#"), take_until("#*/"), tag("#*/")))(line.trim_end());
    parsed.ok().map(|(_, key)| key.trim())
}

/// Read the productions from `input`. Productions preceded by a
/// `/*#<marker>#*/` line are flagged top level.
pub fn extract(input: &str, marker: &str) -> Result<GrammarSource> {
    let mut pos = Position::new(input);
    let start = declarations(&mut pos)?;

    let mut scanner = Scanner {
        pos,
        marker,
        depth: 0,
        action_line: 0,
        comment: None,
        toplevel: false,
        current: None,
        rules: RuleTable::new(),
        top_level: Vec::new(),
    };
    scanner.run()?;

    info!(
        start = ?start,
        rules = scanner.rules.len(),
        top_level = scanner.top_level.len(),
        "grammar extracted"
    );
    Ok(GrammarSource {
        start,
        rules: scanner.rules,
        top_level: scanner.top_level,
    })
}

/// Skip over the declarations section, returning the start symbol.
fn declarations(pos: &mut Position<'_>) -> Result<Option<String>> {
    let mut start = None;
    let mut prologue = false;
    while !pos.is_empty() {
        let line = pos.take_line();
        if prologue {
            prologue = !line.starts_with("%}");
        } else if line.starts_with("%{") {
            prologue = true;
        } else if let Some(name) = line.strip_prefix("%start") {
            start = Some(name.trim().to_owned());
        } else if line.starts_with("%%") {
            return Ok(start);
        }
    }
    Err(Error::MissingSeparator("grammar"))
}

#[derive(Debug)]
struct Pending {
    name: String,
    body: String,
    line: usize,
}

struct Scanner<'a> {
    pos: Position<'a>,
    marker: &'a str,
    /// Brace nesting of action code.
    depth: usize,
    /// Line the outermost open brace is on.
    action_line: usize,
    /// Line an open comment started on.
    comment: Option<usize>,
    toplevel: bool,
    current: Option<Pending>,
    rules: RuleTable,
    top_level: Vec<String>,
}

impl<'a> Scanner<'a> {
    fn run(&mut self) -> Result<()> {
        while !self.pos.is_empty() {
            if self.depth == 0 && self.comment.is_none() {
                let line = self.pos.current_line();
                if line.starts_with("%%") {
                    break;
                }
                if let Some(key) = marker_key(line) {
                    self.complete();
                    if key == self.marker {
                        self.toplevel = true;
                    }
                    self.pos.take_line();
                    continue;
                }
                self.header();
            }
            self.scan_line();
        }

        if let Some(line) = self.comment {
            return Err(Error::UnterminatedComment { line });
        }
        if self.depth > 0 {
            return Err(Error::UnterminatedAction {
                line: self.action_line,
            });
        }
        self.complete();
        Ok(())
    }

    /// Start a new production if one is named at the current position. Any
    /// production still open is completed first.
    fn header(&mut self) {
        let line = self.pos.current_line();
        if let Ok((rest, name)) = rule_header(line) {
            self.complete();
            self.current = Some(Pending {
                name: name.to_owned(),
                body: String::new(),
                line: self.pos.line(),
            });
            self.pos.skip(line.len() - rest.len());
        }
    }

    /// Consume input up to and including the next newline.
    fn scan_line(&mut self) {
        loop {
            if self.current.is_none() && self.depth == 0 && self.comment.is_none() {
                self.header();
            }

            let c = match self.pos.peek() {
                Some(c) => c,
                None => return,
            };

            if self.comment.is_some() {
                if self.pos.match_str("*/") {
                    self.comment = None;
                    continue;
                }
                self.pos.next_char();
                if c == '\n' {
                    return;
                }
                continue;
            }

            if self.pos.match_str("/*") {
                self.comment = Some(self.pos.line());
                self.push(" ");
                continue;
            }
            if self.pos.match_str("//") {
                let len = self.pos.current_line().len();
                self.pos.skip(len);
                continue;
            }

            match c {
                '\'' | '"' => {
                    let literal = self.quoted(c);
                    self.push(&literal);
                }
                '{' => {
                    if self.depth == 0 {
                        self.action_line = self.pos.line();
                        self.push(" ");
                    }
                    self.depth += 1;
                    self.pos.next_char();
                }
                '}' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.pos.next_char();
                }
                ';' if self.depth == 0 => {
                    self.pos.next_char();
                    self.complete();
                }
                '\n' => {
                    self.pos.next_char();
                    self.push(" ");
                    return;
                }
                c => {
                    self.pos.next_char();
                    let mut buf = [0; 4];
                    self.push(c.encode_utf8(&mut buf));
                }
            }
        }
    }

    /// Read a quoted literal, stopping at the closing quote or the end of the
    /// line.
    fn quoted(&mut self, quote: char) -> String {
        let mut text = String::new();
        if let Some(open) = self.pos.next_char() {
            text.push(open);
        }
        while let Some(c) = self.pos.peek() {
            if c == '\n' {
                break;
            }
            self.pos.next_char();
            text.push(c);
            if c == '\\' {
                match self.pos.peek() {
                    Some(next) if next != '\n' => {
                        self.pos.next_char();
                        text.push(next);
                    }
                    _ => (),
                }
            } else if c == quote {
                break;
            }
        }
        text
    }

    /// Append body text, unless inside action code or outside a production.
    fn push(&mut self, text: &str) {
        if self.depth > 0 {
            return;
        }
        if let Some(pending) = self.current.as_mut() {
            pending.body.push_str(text);
        }
    }

    fn complete(&mut self) {
        let pending = match self.current.take() {
            Some(pending) => pending,
            None => return,
        };
        let body = pending.body.trim().to_owned();
        debug!(
            name = %pending.name,
            body = %body,
            top_level = self.toplevel,
            line = pending.line,
            "production"
        );

        if self.toplevel && !self.top_level.contains(&pending.name) {
            self.top_level.push(pending.name.clone());
        }
        self.rules.insert(Rule {
            name: pending.name,
            body,
            top_level: self.toplevel,
            line: pending.line,
        });
        self.toplevel = false;
    }
}
