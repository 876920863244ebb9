//! Readers for flex and bison sources, and the rewriting of their rules
//! into ABNF.

pub mod canonical;
mod error;
pub mod lexer;
pub mod parser;
mod position;
pub mod tables;

pub use canonical::{Canonicalizer, Settings};
pub use error::{Error, Result};
pub use parser::GrammarSource;
pub use tables::{Rule, RuleTable, Terminal, TerminalKind, TerminalTable};
