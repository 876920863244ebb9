//! Resolution of bracketed character classes.
//!
//! Negated classes are computed by subtracting members from the printable
//! ASCII range and reducing what remains to core rules where possible. Plain
//! classes keep their members in source order.

use tracing::warn;

use crate::error::{Error, Result};
use crate::parser::{self, ClassItem};
use crate::{Core, Fragment};

/// Universe negated classes are taken against.
pub const PRINTABLE: (u32, u32) = (0x20, 0x7E);

const UPPER: (u32, u32) = (0x41, 0x5A);
const LOWER: (u32, u32) = (0x61, 0x7A);
const DIGITS: (u32, u32) = (0x30, 0x39);

/// Resolve the inner text of a `[...]` construct into a single fragment.
/// The result is grouped when it has more than one alternative.
pub fn resolve(class: &str) -> Result<Fragment> {
    let (negated, body) = match class.strip_prefix('^') {
        Some(body) => (true, body),
        None => (false, class),
    };
    let (_, items) = parser::class_items(body)?;

    let mut terms = if negated {
        negated_terms(&items)?
    } else {
        listed_terms(&items)?
    };

    Ok(match terms.len() {
        0 => {
            warn!(class, "character class matches nothing");
            Fragment::Empty
        }
        1 => terms.remove(0),
        _ => Fragment::Group(Box::new(Fragment::Alternation(terms))),
    })
}

/// Set of disjoint inclusive ranges, ordered by lower bound.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeSet(Vec<(u32, u32)>);

impl RangeSet {
    fn remove(&mut self, (lo, hi): (u32, u32)) {
        let mut kept = Vec::with_capacity(self.0.len() + 1);
        for &(start, end) in &self.0 {
            if end < lo || start > hi {
                kept.push((start, end));
                continue;
            }
            if start < lo {
                kept.push((start, lo - 1));
            }
            if end > hi {
                kept.push((hi + 1, end));
            }
        }
        self.0 = kept;
    }

    fn covers(&self, (lo, hi): (u32, u32)) -> bool {
        self.0.iter().any(|&(start, end)| start <= lo && hi <= end)
    }
}

fn negated_terms(items: &[ClassItem<'_>]) -> Result<Vec<Fragment>> {
    let mut remaining = RangeSet(vec![PRINTABLE]);
    for item in items {
        for range in item_ranges(item)? {
            remaining.remove(range);
        }
    }

    let mut terms = Vec::new();
    if remaining.covers(UPPER) && remaining.covers(LOWER) {
        remaining.remove(UPPER);
        remaining.remove(LOWER);
        terms.push((UPPER.0, Fragment::Core(Core::Alpha)));
    }
    if remaining.covers(DIGITS) {
        remaining.remove(DIGITS);
        terms.push((DIGITS.0, Fragment::Core(Core::Digit)));
    }
    terms.extend(
        remaining
            .0
            .into_iter()
            .map(|(lo, hi)| (lo, Fragment::span(lo, hi))),
    );
    terms.sort_by_key(|(lo, _)| *lo);

    Ok(terms.into_iter().map(|(_, term)| term).collect())
}

fn item_ranges(item: &ClassItem<'_>) -> Result<Vec<(u32, u32)>> {
    match *item {
        ClassItem::Char(c) => Ok(vec![(c as u32, c as u32)]),
        ClassItem::Range(lo, hi) if lo > hi => Err(Error::ReversedRange(lo, hi)),
        ClassItem::Range(lo, hi) => Ok(vec![(lo as u32, hi as u32)]),
        ClassItem::Named(name) => posix(name)
            .map(|ranges| ranges.to_vec())
            .ok_or_else(|| Error::UnknownClass(name.to_owned())),
    }
}

fn listed_terms(items: &[ClassItem<'_>]) -> Result<Vec<Fragment>> {
    let mut terms = Vec::new();
    let mut idx = 0;
    while idx < items.len() {
        let (consumed, fragments) = match (items[idx], items.get(idx + 1)) {
            (ClassItem::Range('a', 'z'), Some(ClassItem::Range('A', 'Z')))
            | (ClassItem::Range('A', 'Z'), Some(ClassItem::Range('a', 'z'))) => {
                (2, vec![Fragment::Core(Core::Alpha)])
            }
            (ClassItem::Range('0', '9'), _) => (1, vec![Fragment::Core(Core::Digit)]),
            (ClassItem::Range(lo, hi), _) if lo > hi => return Err(Error::ReversedRange(lo, hi)),
            (ClassItem::Range(lo, hi), _) => (1, (lo..=hi).map(Fragment::char).collect()),
            (ClassItem::Char(c), _) => (1, vec![Fragment::char(c)]),
            (ClassItem::Named(name), _) => (1, named_terms(name)?),
        };

        for fragment in fragments {
            if !terms.contains(&fragment) {
                terms.push(fragment);
            }
        }
        idx += consumed;
    }
    Ok(terms)
}

fn named_terms(name: &str) -> Result<Vec<Fragment>> {
    let terms = match name {
        "alpha" => vec![Fragment::Core(Core::Alpha)],
        "digit" => vec![Fragment::Core(Core::Digit)],
        "alnum" => vec![Fragment::Core(Core::Alpha), Fragment::Core(Core::Digit)],
        "xdigit" => vec![Fragment::Core(Core::Hexdig)],
        _ => posix(name)
            .ok_or_else(|| Error::UnknownClass(name.to_owned()))?
            .iter()
            .map(|&(lo, hi)| Fragment::span(lo, hi))
            .collect(),
    };
    Ok(terms)
}

fn posix(name: &str) -> Option<&'static [(u32, u32)]> {
    let ranges: &'static [(u32, u32)] = match name {
        "alpha" => &[UPPER, LOWER],
        "digit" => &[DIGITS],
        "alnum" => &[DIGITS, UPPER, LOWER],
        "upper" => &[UPPER],
        "lower" => &[LOWER],
        "xdigit" => &[DIGITS, (0x41, 0x46), (0x61, 0x66)],
        "space" => &[(0x09, 0x0D), (0x20, 0x20)],
        "blank" => &[(0x09, 0x09), (0x20, 0x20)],
        "punct" => &[(0x21, 0x2F), (0x3A, 0x40), (0x5B, 0x60), (0x7B, 0x7E)],
        "cntrl" => &[(0x00, 0x1F), (0x7F, 0x7F)],
        "print" => &[PRINTABLE],
        "graph" => &[(0x21, 0x7E)],
        _ => return None,
    };
    Some(ranges)
}
