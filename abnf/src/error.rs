use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unterminated character class in '{0}'")]
    UnterminatedClass(String),
    #[error("unterminated group in '{0}'")]
    UnterminatedGroup(String),
    #[error("unbalanced ')' in '{0}'")]
    UnbalancedParen(String),
    #[error("unknown character class '[:{0}:]'")]
    UnknownClass(String),
    #[error("reversed range '{0}-{1}' in character class")]
    ReversedRange(char, char),
    #[error("bad repetition bounds '{0}'")]
    BadRepeat(String),
    #[error("failed to parse: {0}")]
    ParseError(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Error {
        Error::ParseError(format!("{:?}", err))
    }
}
