//! Rewriting of extracted productions into ABNF.
//!
//! Top level rules are the roots of the output. Any other rule referenced
//! from a root is expanded in place, so each root block describes its
//! production in terms of terminals and other roots only. A rule found
//! while it is still being expanded would expand forever; it is promoted to
//! a root of its own and referenced instead.

use std::collections::{HashMap, HashSet};

use nom::{
    branch::alt,
    bytes::complete::{is_not, take},
    character::complete::{anychar, char, multispace0},
    combinator::{map, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};
use tracing::{debug, warn};

use abnf::{parser::unescape, Fragment, Lhs, Repeat};

use crate::tables::{RuleTable, TerminalTable};

/// Canonicalizer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefix grammar references to lexer tokens carry, removed in output.
    pub token_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            token_prefix: "TKN_".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol<'a> {
    /// Contents of a quoted literal, escapes unresolved.
    Literal(&'a str),
    Bar,
    Word(&'a str),
}

fn quoted(quote: char, input: &str) -> IResult<&str, &str> {
    let stop = if quote == '"' { "\\\"" } else { "\\'" };
    delimited(
        char(quote),
        recognize(many0(alt((
            recognize(pair(char('\\'), anychar)),
            is_not(stop),
        )))),
        char(quote),
    )(input)
}

fn symbol(input: &str) -> IResult<&str, Symbol<'_>> {
    alt((
        map(|i| quoted('\'', i), Symbol::Literal),
        map(|i| quoted('"', i), Symbol::Literal),
        value(Symbol::Bar, char('|')),
        map(is_not(" \t\r\n|'\""), Symbol::Word),
        // An unterminated quote.
        map(take(1usize), Symbol::Word),
    ))(input)
}

fn symbols(body: &str) -> Vec<Symbol<'_>> {
    let parsed: IResult<&str, Vec<Symbol<'_>>> = many0(preceded(multispace0, symbol))(body);
    parsed.map(|(_, symbols)| symbols).unwrap_or_default()
}

/// Drop bison annotations that don't describe input.
fn strip_directives<'a>(alternative: &[Symbol<'a>]) -> Vec<Symbol<'a>> {
    let mut out = Vec::with_capacity(alternative.len());
    let mut iter = alternative.iter();
    while let Some(&symbol) = iter.next() {
        match symbol {
            Symbol::Word("%prec") | Symbol::Word("%dprec") | Symbol::Word("%merge") => {
                iter.next();
            }
            Symbol::Word(word) if word.starts_with('%') || word.starts_with('[') => (),
            symbol => out.push(symbol),
        }
    }
    out
}

/// Name a body word refers to, without any `[name]` suffix.
fn symbol_name(word: &str) -> &str {
    word.find('[').map_or(word, |idx| &word[..idx])
}

pub struct Canonicalizer<'a> {
    rules: &'a RuleTable,
    terminals: &'a TerminalTable,
    settings: Settings,
    /// Rules emitted as blocks of their own, in output order.
    roots: Vec<String>,
    boundary: HashSet<String>,
    in_progress: Vec<String>,
    memo: HashMap<String, Fragment>,
}

impl<'a> Canonicalizer<'a> {
    /// Create a canonicalizer emitting a block for each of `top_level`.
    /// Names without a production are skipped.
    pub fn new(
        rules: &'a RuleTable,
        terminals: &'a TerminalTable,
        top_level: &[String],
        settings: Settings,
    ) -> Self {
        let mut roots = Vec::with_capacity(top_level.len());
        for name in top_level {
            if !rules.contains(name) {
                warn!(rule = %name, "top level rule has no production");
                continue;
            }
            if !roots.contains(name) {
                roots.push(name.clone());
            }
        }
        let boundary = roots.iter().cloned().collect();

        Canonicalizer {
            rules,
            terminals,
            settings,
            roots,
            boundary,
            in_progress: Vec::new(),
            memo: HashMap::new(),
        }
    }

    /// ABNF for the production `name`. Below depth 0 an alternation is
    /// grouped so it can sit inside a sequence. Names without a production
    /// are returned as is.
    pub fn canonicalize(&mut self, name: &str, depth: usize) -> Fragment {
        let fragment = self.expand(name);
        match fragment {
            Fragment::Alternation(_) if depth > 0 => fragment.grouped(),
            Fragment::Group(inner) if depth == 0 => *inner,
            fragment => fragment,
        }
    }

    /// A block for every root, including those promoted while expanding.
    pub fn rules(mut self) -> Vec<abnf::Rule> {
        let mut out = Vec::with_capacity(self.roots.len());
        let mut idx = 0;
        while idx < self.roots.len() {
            let name = self.roots[idx].clone();
            let rhs = self.canonicalize(&name, 0);
            debug!(rule = %name, abnf = %rhs, "canonical rule");
            out.push(abnf::Rule {
                lhs: Lhs::Bracketed(name),
                rhs,
            });
            idx += 1;
        }
        out
    }

    fn expand(&mut self, name: &str) -> Fragment {
        if let Some(fragment) = self.memo.get(name) {
            return fragment.clone();
        }
        let rules = self.rules;
        let rule = match rules.get(name) {
            Some(rule) => rule,
            None => return Fragment::Name(name.to_owned()),
        };

        self.in_progress.push(name.to_owned());
        let symbols = symbols(&rule.body);

        let mut optional = false;
        let mut bases = Vec::new();
        let mut tails = Vec::new();
        let mut star_first = None;
        for alternative in symbols.split(|s| *s == Symbol::Bar) {
            let alternative = strip_directives(alternative);
            match alternative.split_first() {
                None => optional = true,
                Some((Symbol::Word(head), tail)) if symbol_name(head) == name => {
                    star_first.get_or_insert(bases.is_empty());
                    let tail = self.sequence(tail);
                    if tail != Fragment::Empty {
                        tails.push(tail);
                    }
                }
                Some(_) => bases.push(self.sequence(&alternative)),
            }
        }
        self.in_progress.pop();

        let base = Fragment::alternate(bases);
        let mut fragment = if tails.is_empty() {
            base
        } else {
            let tails = match Fragment::alternate(tails) {
                Fragment::Group(tails) => Fragment::Group(tails),
                tails => Fragment::Group(Box::new(tails)),
            };
            let star = Fragment::repeat(Repeat::any(), tails);
            let base = match base {
                Fragment::Alternation(_) => base.grouped(),
                base => base,
            };
            if star_first == Some(true) {
                Fragment::concat(vec![star, base])
            } else {
                Fragment::concat(vec![base, star])
            }
        };
        if optional && fragment != Fragment::Empty {
            fragment = fragment.optional();
        }

        self.memo.insert(name.to_owned(), fragment.clone());
        fragment
    }

    fn sequence(&mut self, symbols: &[Symbol<'_>]) -> Fragment {
        let mut items = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let item = match *symbol {
                Symbol::Literal(text) => Fragment::literal(&unescape(text)),
                Symbol::Word(word) => self.reference(symbol_name(word)),
                Symbol::Bar => continue,
            };
            items.push(item);
        }
        Fragment::concat(items)
    }

    fn reference(&mut self, name: &str) -> Fragment {
        if self.boundary.contains(name) {
            return Fragment::Reference(name.to_owned());
        }
        if self.rules.contains(name) {
            if self.in_progress.iter().any(|n| n == name) {
                self.promote(name);
                return Fragment::Reference(name.to_owned());
            }
            let fragment = self.canonicalize(name, 1);
            if self.boundary.contains(name) {
                return Fragment::Reference(name.to_owned());
            }
            return fragment;
        }

        let bare = name
            .strip_prefix(self.settings.token_prefix.as_str())
            .filter(|bare| !bare.is_empty())
            .unwrap_or(name);
        match self.terminals.get(bare).or_else(|| self.terminals.get(name)) {
            Some(terminal) => terminal.reference(),
            None => Fragment::Name(bare.to_owned()),
        }
    }

    fn promote(&mut self, name: &str) {
        if self.boundary.insert(name.to_owned()) {
            warn!(rule = name, "recursive rule emitted as a block of its own");
            self.roots.push(name.to_owned());
        }
    }
}
