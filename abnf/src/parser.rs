//! Token readers for flex style regular expressions.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while_m_n},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1, none_of},
    combinator::{all_consuming, cut, map, map_opt, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

/// A single lexical element of a regular expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A character matched as is, including escaped metacharacters.
    Char(char),
    /// Contents of a double quoted string, still escaped.
    Quoted(&'a str),
    Any,
    Open,
    Close,
    /// Inner text of a bracketed class, including a leading '^'.
    Class(&'a str),
    Star,
    Plus,
    Question,
    Bounded(u32, Option<u32>),
    /// A `{name}` reference to another definition.
    Definition(&'a str),
    Bar,
    /// '^' or '$'. Only anchors at the edges of a pattern.
    Anchor(char),
}

/// An element of a character class body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassItem<'a> {
    Char(char),
    Range(char, char),
    /// A POSIX class such as `[:alpha:]`.
    Named(&'a str),
}

pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// A backslash escape, resolved to the character it denotes.
pub fn escaped_char(input: &str) -> IResult<&str, char> {
    preceded(
        char('\\'),
        alt((
            preceded(
                char('x'),
                map_opt(
                    take_while_m_n(1, 2, |c: char| c.is_ascii_hexdigit()),
                    |s: &str| u32::from_str_radix(s, 16).ok().and_then(std::char::from_u32),
                ),
            ),
            map_opt(
                take_while_m_n(1, 3, |c: char| ('0'..='7').contains(&c)),
                |s: &str| u32::from_str_radix(s, 8).ok().and_then(std::char::from_u32),
            ),
            map(anychar, named_escape),
        )),
    )(input)
}

fn named_escape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'f' => '\u{0C}',
        'v' => '\u{0B}',
        'a' => '\u{07}',
        'b' => '\u{08}',
        c => c,
    }
}

/// Resolve every backslash escape in `s`.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(next) = rest.chars().next() {
        match escaped_char(rest) {
            Ok((remaining, c)) => {
                out.push(c);
                rest = remaining;
            }
            Err(_) => {
                out.push(next);
                rest = &rest[next.len_utf8()..];
            }
        }
    }
    out
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(
        char('"'),
        recognize(many0(alt((
            recognize(pair(char('\\'), anychar)),
            is_not("\\\""),
        )))),
        char('"'),
    )(input)
}

fn posix_class(input: &str) -> IResult<&str, &str> {
    delimited(tag("[:"), alpha1, tag(":]"))(input)
}

fn class_body(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('^')),
        // A ']' right after the opening bracket is a member.
        opt(char(']')),
        many0(alt((
            recognize(posix_class),
            recognize(pair(char('\\'), anychar)),
            recognize(none_of("]")),
        ))),
    )))(input)
}

/// A bracketed character class. Fails hard once the opening bracket is
/// consumed and no closing bracket follows.
pub fn class(input: &str) -> IResult<&str, &str> {
    preceded(char('['), cut(terminated(class_body, char(']'))))(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

fn bounded(input: &str) -> IResult<&str, (u32, Option<u32>)> {
    map(
        delimited(
            char('{'),
            pair(number, opt(preceded(char(','), opt(number)))),
            char('}'),
        ),
        |(min, max)| match max {
            None => (min, Some(min)),
            Some(max) => (min, max),
        },
    )(input)
}

fn definition(input: &str) -> IResult<&str, &str> {
    delimited(char('{'), identifier, char('}'))(input)
}

pub fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        map(class, Token::Class),
        map(quoted, Token::Quoted),
        map(bounded, |(min, max)| Token::Bounded(min, max)),
        map(definition, Token::Definition),
        map(escaped_char, Token::Char),
        map(anychar, |c| match c {
            '.' => Token::Any,
            '(' => Token::Open,
            ')' => Token::Close,
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Question,
            '|' => Token::Bar,
            '^' | '$' => Token::Anchor(c),
            c => Token::Char(c),
        }),
    ))(input)
}

fn class_char(input: &str) -> IResult<&str, char> {
    alt((escaped_char, anychar))(input)
}

/// Split the inner text of a class (without any leading '^') into members.
pub fn class_items(input: &str) -> IResult<&str, Vec<ClassItem<'_>>> {
    all_consuming(many0(alt((
        map(posix_class, ClassItem::Named),
        map(
            separated_pair(class_char, char('-'), class_char),
            |(lo, hi)| ClassItem::Range(lo, hi),
        ),
        map(class_char, ClassItem::Char),
    ))))(input)
}
