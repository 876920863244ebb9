use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0} source has no '%%' section separator")]
    MissingSeparator(&'static str),
    #[error("line {line}: unterminated comment")]
    UnterminatedComment { line: usize },
    #[error("line {line}: unterminated action block")]
    UnterminatedAction { line: usize },
    #[error("line {line}: bad pattern for '{name}': {error}")]
    Pattern {
        name: String,
        line: usize,
        #[source]
        error: abnf::Error,
    },
}
