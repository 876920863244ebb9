//! Translation of flex regular expressions into ABNF.
//!
//! Patterns are read left to right in a single pass. Operands are kept on a
//! stack alongside the binding strength of the construct that produced them;
//! quantifiers rewrite the topmost operand in place, while alternation
//! collapses everything above it into one sequence first.

use tracing::{trace, warn};

use crate::charclass;
use crate::error::{Error, Result};
use crate::parser::{self, Token};
use crate::{Fragment, Repeat};

const LITERAL: u8 = 100;
const ANY: u8 = 90;
const GROUP: u8 = 80;
const CLASS: u8 = 70;
const STAR: u8 = 43;
const PLUS: u8 = 42;
const BOUNDED: u8 = 41;
const OPTION: u8 = 40;
const SEQUENCE: u8 = 35;
const ALTERNATION: u8 = 30;

#[derive(Debug)]
struct Operand {
    precedence: u8,
    fragment: Fragment,
}

#[derive(Debug, Default)]
struct Stack {
    operands: Vec<Operand>,
}

impl Stack {
    fn push(&mut self, precedence: u8, fragment: Fragment) {
        self.merge(precedence);
        self.operands.push(Operand {
            precedence,
            fragment,
        });
    }

    /// Collapse the trailing operands binding tighter than `min` into a
    /// single sequence.
    fn merge(&mut self, min: u8) {
        let start = self
            .operands
            .iter()
            .rposition(|op| op.precedence <= min)
            .map_or(0, |idx| idx + 1);
        if self.operands.len() - start < 2 {
            return;
        }
        let items = self.operands.drain(start..).map(|op| op.fragment).collect();
        self.operands.push(Operand {
            precedence: SEQUENCE,
            fragment: Fragment::concat(items),
        });
    }

    /// Apply a quantifier to the topmost operand. Returns false if there is
    /// nothing to apply it to.
    fn quantify(&mut self, precedence: u8, repeat: Repeat) -> bool {
        match self.operands.last_mut() {
            Some(top) if top.precedence != ALTERNATION => {
                let element = std::mem::replace(&mut top.fragment, Fragment::Empty);
                top.fragment = Fragment::repeat(repeat, element);
                top.precedence = precedence;
                true
            }
            _ => false,
        }
    }

    fn alternate(&mut self) {
        self.merge(ALTERNATION);
        self.operands.push(Operand {
            precedence: ALTERNATION,
            fragment: Fragment::Empty,
        });
    }

    fn finish(mut self) -> Fragment {
        self.merge(ALTERNATION);

        let mut branches = Vec::new();
        let mut current = Fragment::Empty;
        for op in self.operands {
            if op.precedence == ALTERNATION {
                branches.push(std::mem::replace(&mut current, Fragment::Empty));
            } else {
                current = op.fragment;
            }
        }
        branches.push(current);
        Fragment::alternate(branches)
    }
}

/// Translate `pattern` into a single ABNF fragment. `{name}` references are
/// rendered as `<name>` with the name lower cased.
pub fn translate(pattern: &str) -> Result<Fragment> {
    translate_with(pattern, |_| None)
}

/// Like `translate`, but `{name}` references are first offered to
/// `definitions`.
pub fn translate_with<F>(pattern: &str, definitions: F) -> Result<Fragment>
where
    F: Fn(&str) -> Option<Fragment>,
{
    let mut translator = Translator {
        pattern,
        rest: pattern,
        definitions: &definitions,
    };
    let fragment = match translator.expression(0)? {
        Fragment::Group(inner) => *inner,
        other => other,
    };
    trace!(pattern, abnf = %fragment, "translated pattern");
    Ok(fragment)
}

struct Translator<'a> {
    pattern: &'a str,
    rest: &'a str,
    definitions: &'a dyn Fn(&str) -> Option<Fragment>,
}

impl<'a> Translator<'a> {
    /// Translate up to the end of the pattern, or up to (but not including)
    /// the ')' closing the current group.
    fn expression(&mut self, depth: usize) -> Result<Fragment> {
        let mut stack = Stack::default();
        loop {
            if self.rest.is_empty() {
                if depth > 0 {
                    return Err(Error::UnterminatedGroup(self.pattern.to_owned()));
                }
                break;
            }
            if self.rest.starts_with(')') {
                if depth > 0 {
                    break;
                }
                return Err(Error::UnbalancedParen(self.pattern.to_owned()));
            }

            let at_start = self.rest.len() == self.pattern.len();
            let input = self.rest;
            let (rest, token) = parser::token(input).map_err(|err| match err {
                nom::Err::Failure(_) if input.starts_with('[') => {
                    Error::UnterminatedClass(self.pattern.to_owned())
                }
                err => Error::from(err),
            })?;
            let text = &input[..input.len() - rest.len()];
            self.rest = rest;

            match token {
                Token::Char(c) => stack.push(LITERAL, Fragment::char(c)),
                Token::Quoted(s) => stack.push(LITERAL, Fragment::literal(&parser::unescape(s))),
                Token::Anchor('^') if at_start => (),
                Token::Anchor('$') if depth == 0 && self.rest.is_empty() => (),
                Token::Anchor(c) => stack.push(LITERAL, Fragment::char(c)),
                Token::Any => stack.push(ANY, Fragment::Range(0x20, 0x7E)),
                Token::Open => {
                    let inner = self.expression(depth + 1)?;
                    // Step over the ')' the nested expression stopped at.
                    self.rest = &self.rest[1..];
                    if inner != Fragment::Empty {
                        stack.push(GROUP, inner.grouped());
                    }
                }
                Token::Close => return Err(Error::UnbalancedParen(self.pattern.to_owned())),
                Token::Class(class) => stack.push(CLASS, charclass::resolve(class)?),
                Token::Definition(name) => {
                    let fragment = (self.definitions)(name)
                        .unwrap_or_else(|| Fragment::Reference(name.to_lowercase()));
                    stack.push(LITERAL, fragment);
                }
                Token::Star => self.quantify(&mut stack, STAR, Repeat::any(), text),
                Token::Plus => self.quantify(&mut stack, PLUS, Repeat::at_least(1), text),
                Token::Question => self.quantify(&mut stack, OPTION, Repeat::optional(), text),
                Token::Bounded(min, max) => {
                    if max.map_or(false, |max| max < min) {
                        return Err(Error::BadRepeat(text.to_owned()));
                    }
                    self.quantify(&mut stack, BOUNDED, Repeat { min, max }, text);
                }
                Token::Bar => stack.alternate(),
            }
        }
        Ok(stack.finish())
    }

    fn quantify(&self, stack: &mut Stack, precedence: u8, repeat: Repeat, text: &str) {
        if !stack.quantify(precedence, repeat) {
            warn!(
                pattern = self.pattern,
                construct = text,
                "quantifier without operand, treating as literal"
            );
            stack.push(LITERAL, Fragment::literal(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Core;
    use proptest::prelude::*;

    #[test]
    fn translate_patterns() {
        let tests = vec![
            ("a|b", "\"a\" / \"b\""),
            ("ab*", "\"a\" *\"b\""),
            ("[0-9]+", "1*DIGIT"),
            ("abc", "\"abc\""),
            ("(ab)*c", "*\"ab\" \"c\""),
            ("(a b)+", "1*(\"a\" SP \"b\")"),
            ("(a|b)c?", "(\"a\" / \"b\") 0*1\"c\""),
            ("(a|b)", "\"a\" / \"b\""),
            ("a(b|c)d|e", "\"a\" (\"b\" / \"c\") \"d\" / \"e\""),
            ("[a-zA-Z_][a-zA-Z0-9_]*", "(ALPHA / \"_\") *(ALPHA / DIGIT / \"_\")"),
            ("-?[0-9]+\\.[0-9]*", "0*1\"-\" 1*DIGIT \".\" *DIGIT"),
            ("x{2,4}", "2*4\"x\""),
            ("x{3}", "3\"x\""),
            ("x{1,}", "1*\"x\""),
            ("{DIGIT}+", "1*<digit>"),
            ("\"<=\"|\">=\"", "\"<=\" / \">=\""),
            ("^abc$", "\"abc\""),
            ("a^b$c", "\"a^b$c\""),
            (".", "%x20-7E"),
            ("a.b", "\"a\" %x20-7E \"b\""),
            ("\\n", "%x0A"),
            ("a b", "\"a\" SP \"b\""),
            ("\\\"[^\"]*\\\"", "DQUOTE *(%x20-21 / %x23-2F / DIGIT / %x3A-40 / ALPHA / %x5B-60 / %x7B-7E) DQUOTE"),
            ("a()b", "\"ab\""),
            ("a|", "\"a\" / \"\""),
            ("*a", "\"*a\""),
            ("a|*", "\"a\" / \"*\""),
            ("(a)", "\"a\""),
            ("((a|b))", "\"a\" / \"b\""),
        ];

        for (pattern, want) in tests {
            let got = translate(pattern).unwrap();
            assert_eq!(got.to_string(), want, "pattern: {:?}", pattern);
        }
    }

    #[test]
    fn translate_errors() {
        let tests = vec![
            ("[abc", Error::UnterminatedClass("[abc".to_owned())),
            ("a[b-c", Error::UnterminatedClass("a[b-c".to_owned())),
            ("(ab", Error::UnterminatedGroup("(ab".to_owned())),
            ("ab)", Error::UnbalancedParen("ab)".to_owned())),
            ("x{4,2}", Error::BadRepeat("{4,2}".to_owned())),
            ("[z-a]", Error::ReversedRange('z', 'a')),
        ];

        for (pattern, want) in tests {
            assert_eq!(translate(pattern), Err(want), "pattern: {:?}", pattern);
        }
    }

    #[test]
    fn translate_with_definitions() {
        let got = translate_with("{D}+{NAME}", |name| match name {
            "D" => Some(Fragment::Core(Core::Digit)),
            _ => None,
        })
        .unwrap();
        assert_eq!(got.to_string(), "1*DIGIT <name>");
    }

    /// Reports any character outside a quoted string that only has meaning in
    /// regex syntax, or an unbalanced bracket.
    fn stray_metachar(abnf: &str) -> Option<char> {
        let mut quoted = false;
        let mut depth: i32 = 0;
        for c in abnf.chars() {
            match c {
                '"' => quoted = !quoted,
                _ if quoted => (),
                '+' | '?' | '|' | '\\' | '^' | '$' | '{' | '}' => return Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => {
                    depth -= 1;
                    if depth < 0 {
                        return Some(c);
                    }
                }
                _ => (),
            }
        }
        if quoted || depth != 0 {
            return Some('"');
        }
        None
    }

    proptest! {
        #[test]
        fn translation_is_stable(pattern in "([a-c]|\\[\\^?[a-e0-9-]{1,4}\\]|\\.|\\((a|b\\|c)\\)|[*+?|])*") {
            if let Ok(first) = translate(&pattern) {
                let second = translate(&pattern).unwrap();
                prop_assert_eq!(first.to_string(), second.to_string());
            }
        }

        #[test]
        fn translation_leaves_no_metachars(pattern in "([a-c +?|*(){}\"]|\\[[a-e^-]{1,4}\\]|\\\\[+?|])*") {
            if let Ok(fragment) = translate(&pattern) {
                let abnf = fragment.to_string();
                prop_assert_eq!(stray_metachar(&abnf), None, "pattern {:?} gave {}", pattern, abnf);
            }
        }
    }
}
