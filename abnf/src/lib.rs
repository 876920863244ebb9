//! A minimal ABNF (RFC 5234) model along with translators from flex style
//! regular expressions.

use std::fmt::{self, Display};

pub mod charclass;
mod error;
pub mod parser;
pub mod regex;

pub use error::{Error, Result};

/// Core rules from RFC 5234 appendix B that translations reduce to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Core {
    Alpha,
    Digit,
    Hexdig,
    Sp,
    Dquote,
}

impl Display for Core {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Core::Alpha => "ALPHA",
            Core::Digit => "DIGIT",
            Core::Hexdig => "HEXDIG",
            Core::Sp => "SP",
            Core::Dquote => "DQUOTE",
        };
        write!(f, "{}", name)
    }
}

/// Repetition bounds, written in front of the repeated element.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Repeat {
    pub min: u32,
    pub max: Option<u32>,
}

impl Repeat {
    /// Zero or more.
    pub fn any() -> Self {
        Repeat { min: 0, max: None }
    }

    pub fn at_least(min: u32) -> Self {
        Repeat { min, max: None }
    }

    /// Zero or one.
    pub fn optional() -> Self {
        Repeat {
            min: 0,
            max: Some(1),
        }
    }
}

impl Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.min, self.max) {
            (0, None) => write!(f, "*"),
            (min, None) => write!(f, "{}*", min),
            (min, Some(max)) if min == max => write!(f, "{}", min),
            (min, Some(max)) => write!(f, "{}*{}", min, max),
        }
    }
}

/// The rhs of an ABNF rule, or any piece of it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Fragment {
    /// Matches the empty string.
    Empty,
    /// A quoted string. Never contains a double quote or control characters.
    Literal(String),
    /// A single numeric value, `%xHH`.
    Char(u32),
    /// An inclusive numeric range, `%xHH-HH`.
    Range(u32, u32),
    Core(Core),
    /// A rule name referenced as is.
    Name(String),
    /// A rule name referenced in angle brackets.
    Reference(String),
    Repeat(Repeat, Box<Fragment>),
    Group(Box<Fragment>),
    Optional(Box<Fragment>),
    Concatenation(Vec<Fragment>),
    Alternation(Vec<Fragment>),
}

impl Fragment {
    /// Fragment matching exactly `c`.
    pub fn char(c: char) -> Self {
        match c {
            '"' => Fragment::Core(Core::Dquote),
            ' ' => Fragment::Core(Core::Sp),
            c if is_quotable(c) => Fragment::Literal(c.to_string()),
            c => Fragment::Char(c as u32),
        }
    }

    /// Fragment matching the text `s`, splitting out characters that can't
    /// appear inside an ABNF quoted string.
    pub fn literal(s: &str) -> Self {
        let mut parts = Vec::new();
        let mut run = String::new();
        for c in s.chars() {
            if is_quotable(c) {
                run.push(c);
                continue;
            }
            if !run.is_empty() {
                parts.push(Fragment::Literal(std::mem::take(&mut run)));
            }
            parts.push(Fragment::char(c));
        }
        if !run.is_empty() {
            parts.push(Fragment::Literal(run));
        }
        Fragment::concat(parts)
    }

    /// Single value or range covering `lo` through `hi`.
    pub fn span(lo: u32, hi: u32) -> Self {
        if lo == hi {
            Fragment::Char(lo)
        } else {
            Fragment::Range(lo, hi)
        }
    }

    /// Sequence of fragments. Nested sequences are flattened, empty fragments
    /// dropped, and adjacent quoted strings joined.
    pub fn concat(items: Vec<Fragment>) -> Self {
        let mut out: Vec<Fragment> = Vec::with_capacity(items.len());
        for item in items {
            let flattened = match item {
                Fragment::Empty => continue,
                Fragment::Concatenation(inner) => inner,
                other => vec![other],
            };
            for item in flattened {
                if let Fragment::Literal(next) = &item {
                    if let Some(Fragment::Literal(prev)) = out.last_mut() {
                        prev.push_str(next);
                        continue;
                    }
                }
                out.push(item);
            }
        }
        match out.len() {
            0 => Fragment::Empty,
            1 => out.remove(0),
            _ => Fragment::Concatenation(out),
        }
    }

    /// Alternatives of fragments. Nested, ungrouped alternations are
    /// flattened.
    pub fn alternate(items: Vec<Fragment>) -> Self {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Fragment::Alternation(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Fragment::Empty,
            1 => out.remove(0),
            _ => Fragment::Alternation(out),
        }
    }

    pub fn repeat(repeat: Repeat, element: Fragment) -> Self {
        Fragment::Repeat(repeat, Box::new(element))
    }

    pub fn optional(self) -> Self {
        match self {
            Fragment::Optional(_) => self,
            Fragment::Group(inner) => Fragment::Optional(inner),
            other => Fragment::Optional(Box::new(other)),
        }
    }

    /// Wrap in a group if this fragment is made up of more than one element.
    pub fn grouped(self) -> Self {
        if self.is_compound() {
            Fragment::Group(Box::new(self))
        } else {
            self
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            Fragment::Concatenation(_) | Fragment::Alternation(_)
        )
    }
}

fn is_quotable(c: char) -> bool {
    // RFC 5234 char-val: %x20-21 / %x23-7E
    c == ' ' || c == '!' || ('\u{23}'..='\u{7E}').contains(&c)
}

impl Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fragment::Empty => write!(f, "\"\""),
            Fragment::Literal(s) => write!(f, "\"{}\"", s),
            Fragment::Char(c) => write!(f, "%x{:02X}", c),
            Fragment::Range(lo, hi) => write!(f, "%x{:02X}-{:02X}", lo, hi),
            Fragment::Core(core) => write!(f, "{}", core),
            Fragment::Name(name) => write!(f, "{}", name),
            Fragment::Reference(name) => write!(f, "<{}>", name),
            Fragment::Repeat(repeat, element) => match **element {
                Fragment::Concatenation(_) | Fragment::Alternation(_) | Fragment::Repeat(..) => {
                    write!(f, "{}({})", repeat, element)
                }
                _ => write!(f, "{}{}", repeat, element),
            },
            Fragment::Group(inner) => write!(f, "({})", inner),
            Fragment::Optional(inner) => write!(f, "[{}]", inner),
            Fragment::Concatenation(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    match item {
                        Fragment::Alternation(_) => write!(f, "({})", item)?,
                        _ => write!(f, "{}", item)?,
                    }
                }
                Ok(())
            }
            Fragment::Alternation(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " / ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// The lhs of a rule.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Lhs {
    /// Written as is, used for keyword terminals.
    Bare(String),
    /// Written in angle brackets.
    Bracketed(String),
}

impl Display for Lhs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Lhs::Bare(name) => write!(f, "{}", name),
            Lhs::Bracketed(name) => write!(f, "<{}>", name),
        }
    }
}

/// A single ABNF rule.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Rule {
    pub lhs: Lhs,
    pub rhs: Fragment,
}

impl Rule {
    /// Render the rule, breaking the rhs across lines so that no line
    /// exceeds `width` unless a single element is wider. Continuation lines
    /// are indented as RFC 5234 requires.
    pub fn render(&self, width: usize) -> String {
        let head = format!("{} =", self.lhs);
        let indent = if head.len() + 1 <= width / 2 {
            head.len() + 1
        } else {
            4
        };

        let mut out = head;
        let mut line_len = out.len();
        let mut on_line = 0;
        for word in split_words(&self.rhs.to_string()) {
            if on_line > 0 && line_len + 1 + word.len() > width {
                out.push('\n');
                out.push_str(&" ".repeat(indent));
                out.push_str(word);
                line_len = indent + word.len();
            } else {
                out.push(' ');
                out.push_str(word);
                line_len += 1 + word.len();
            }
            on_line += 1;
        }
        out
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// Split rendered ABNF on spaces that aren't part of a quoted string.
fn split_words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ' ' if !quoted => {
                if idx > start {
                    words.push(&s[start..idx]);
                }
                start = idx + 1;
            }
            _ => (),
        }
    }
    if start < s.len() {
        words.push(&s[start..]);
    }
    words
}

/// A rendered grammar: one line per terminal, then one block per rule.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Document {
    pub terminals: Vec<Rule>,
    pub rules: Vec<Rule>,
}

impl Document {
    pub fn render(&self, width: usize) -> String {
        let mut blocks = Vec::new();
        if !self.terminals.is_empty() {
            let lines: Vec<String> = self.terminals.iter().map(|t| t.render(width)).collect();
            blocks.push(lines.join("\n"));
        }
        blocks.extend(self.rules.iter().map(|r| r.render(width)));

        let mut out = blocks.join("\n\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_fragments() {
        let tests = vec![
            (Fragment::Empty, "\"\""),
            (Fragment::literal("select"), "\"select\""),
            (Fragment::literal("say \"hi\""), "\"say \" DQUOTE \"hi\" DQUOTE"),
            (Fragment::literal("a\tb"), "\"a\" %x09 \"b\""),
            (Fragment::char(' '), "SP"),
            (Fragment::span(0x41, 0x41), "%x41"),
            (Fragment::span(0x20, 0x2F), "%x20-2F"),
            (
                Fragment::repeat(Repeat::at_least(1), Fragment::Core(Core::Digit)),
                "1*DIGIT",
            ),
            (
                Fragment::repeat(Repeat::optional(), Fragment::literal("x")),
                "0*1\"x\"",
            ),
            (
                Fragment::repeat(
                    Repeat { min: 2, max: Some(2) },
                    Fragment::concat(vec![Fragment::literal("a"), Fragment::Core(Core::Digit)]),
                ),
                "2(\"a\" DIGIT)",
            ),
            (
                Fragment::concat(vec![
                    Fragment::Name("a".into()),
                    Fragment::alternate(vec![
                        Fragment::Name("b".into()),
                        Fragment::Name("c".into()),
                    ]),
                ]),
                "a (b / c)",
            ),
            (
                Fragment::Reference("expr".into()).optional(),
                "[<expr>]",
            ),
            (
                Fragment::Reference("expr".into()).optional().optional(),
                "[<expr>]",
            ),
        ];

        for (fragment, want) in tests {
            assert_eq!(fragment.to_string(), want, "fragment: {:?}", fragment);
        }
    }

    #[test]
    fn concat_joins_adjacent_literals() {
        let got = Fragment::concat(vec![
            Fragment::literal("a"),
            Fragment::concat(vec![Fragment::literal("b"), Fragment::Empty]),
            Fragment::repeat(Repeat::any(), Fragment::literal("c")),
            Fragment::literal("d"),
        ]);
        assert_eq!(got.to_string(), "\"ab\" *\"c\" \"d\"");
    }

    #[test]
    fn render_wraps_long_rules() {
        let rule = Rule {
            lhs: Lhs::Bracketed("list".into()),
            rhs: Fragment::concat(vec![
                Fragment::Name("first".into()),
                Fragment::Name("second".into()),
                Fragment::Name("third".into()),
                Fragment::literal("a b c"),
            ]),
        };
        assert_eq!(rule.render(80), "<list> = first second third \"a b c\"");
        assert_eq!(
            rule.render(24),
            "<list> = first second\n         third \"a b c\""
        );
    }

    #[test]
    fn render_document() {
        let doc = Document {
            terminals: vec![
                Rule {
                    lhs: Lhs::Bare("SELECT".into()),
                    rhs: Fragment::literal("SELECT"),
                },
                Rule {
                    lhs: Lhs::Bracketed("number".into()),
                    rhs: Fragment::repeat(Repeat::at_least(1), Fragment::Core(Core::Digit)),
                },
            ],
            rules: vec![Rule {
                lhs: Lhs::Bracketed("query".into()),
                rhs: Fragment::concat(vec![
                    Fragment::Name("SELECT".into()),
                    Fragment::Reference("number".into()),
                ]),
            }],
        };
        assert_eq!(
            doc.render(72),
            "SELECT = \"SELECT\"\n<number> = 1*DIGIT\n\n<query> = SELECT <number>\n"
        );
    }
}
