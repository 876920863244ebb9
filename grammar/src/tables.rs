use std::collections::HashMap;

use abnf::{Fragment, Lhs};

/// How a lexer definition was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// An alphabetic word, emitted as its own upper cased rule.
    Keyword,
    /// A single (possibly escaped) character, inlined where referenced.
    Char,
    /// Literal text without pattern syntax, inlined where referenced.
    Literal,
    /// A regular expression, emitted as its own lower cased rule.
    Pattern,
}

/// A named token from the lexer source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub name: String,
    pub kind: TerminalKind,
    pub abnf: Fragment,
}

impl Terminal {
    /// Name of the rule a pattern terminal is emitted under.
    pub fn rule_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// What to write wherever the terminal is referenced.
    pub fn reference(&self) -> Fragment {
        match self.kind {
            TerminalKind::Keyword => Fragment::Name(self.name.clone()),
            TerminalKind::Char | TerminalKind::Literal => self.abnf.clone(),
            TerminalKind::Pattern => Fragment::Reference(self.rule_name()),
        }
    }

    /// The rule defining this terminal, for kinds that get one.
    pub fn rule(&self) -> Option<abnf::Rule> {
        let lhs = match self.kind {
            TerminalKind::Keyword => Lhs::Bare(self.name.clone()),
            TerminalKind::Pattern => Lhs::Bracketed(self.rule_name()),
            TerminalKind::Char | TerminalKind::Literal => return None,
        };
        Some(abnf::Rule {
            lhs,
            rhs: self.abnf.clone(),
        })
    }
}

/// Terminals by name, remembering definition order.
#[derive(Debug, Clone, Default)]
pub struct TerminalTable {
    terminals: Vec<Terminal>,
    index: HashMap<String, usize>,
}

impl TerminalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a terminal. A later definition of the same name replaces the
    /// earlier one in place.
    pub fn insert(&mut self, terminal: Terminal) {
        match self.index.get(&terminal.name) {
            Some(&idx) => self.terminals[idx] = terminal,
            None => {
                self.index
                    .insert(terminal.name.clone(), self.terminals.len());
                self.terminals.push(terminal);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Terminal> {
        self.index.get(name).map(|&idx| &self.terminals[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Terminal> {
        self.terminals.iter()
    }

    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    /// Rules for every terminal that is emitted on its own, in definition
    /// order.
    pub fn rules(&self) -> Vec<abnf::Rule> {
        self.terminals.iter().filter_map(Terminal::rule).collect()
    }
}

/// A grammar production with its action code and comments removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub body: String,
    pub top_level: bool,
    /// Line the production starts on.
    pub line: usize,
}

/// Productions by name, remembering definition order.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, Rule>,
    order: Vec<String>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a production. Repeated definitions of a name add alternatives to
    /// the existing one.
    pub fn insert(&mut self, rule: Rule) {
        match self.rules.get_mut(&rule.name) {
            Some(existing) => {
                existing.body = format!("{} | {}", existing.body, rule.body);
                existing.top_level |= rule.top_level;
            }
            None => {
                self.order.push(rule.name.clone());
                self.rules.insert(rule.name.clone(), rule);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Name of the first production defined.
    pub fn first(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, body: &str, top_level: bool) -> Rule {
        Rule {
            name: name.to_owned(),
            body: body.to_owned(),
            top_level,
            line: 1,
        }
    }

    #[test]
    fn rule_table_merges_redefinitions() {
        let mut table = RuleTable::new();
        table.insert(rule("a", "b c", false));
        table.insert(rule("d", "e", false));
        table.insert(rule("a", "f", true));

        assert_eq!(table.len(), 2);
        assert_eq!(table.first(), Some("a"));
        let a = table.get("a").unwrap();
        assert_eq!(a.body, "b c | f");
        assert!(a.top_level);
    }

    #[test]
    fn terminal_references() {
        let tests = vec![
            (
                TerminalKind::Keyword,
                Fragment::literal("SELECT"),
                "SELECT",
                Some("SELECT = \"SELECT\""),
            ),
            (TerminalKind::Char, Fragment::char(','), "\",\"", None),
            (TerminalKind::Literal, Fragment::literal("<="), "\"<=\"", None),
            (
                TerminalKind::Pattern,
                Fragment::Core(abnf::Core::Digit),
                "<select>",
                Some("<select> = DIGIT"),
            ),
        ];

        for (kind, abnf, reference, rule) in tests {
            let terminal = Terminal {
                name: "SELECT".to_owned(),
                kind,
                abnf,
            };
            assert_eq!(terminal.reference().to_string(), reference, "kind: {:?}", kind);
            assert_eq!(
                terminal.rule().map(|r| r.to_string()),
                rule.map(str::to_owned),
                "kind: {:?}",
                kind
            );
        }
    }

    #[test]
    fn terminal_table_keeps_order() {
        let mut table = TerminalTable::new();
        for name in &["B", "A", "B"] {
            table.insert(Terminal {
                name: (*name).to_owned(),
                kind: TerminalKind::Keyword,
                abnf: Fragment::literal(name),
            });
        }
        let names: Vec<&str> = table.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(table.rules().len(), 2);
    }
}
