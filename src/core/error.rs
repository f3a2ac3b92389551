use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    InvalidInput,
    InvalidState,
    UnsupportedQuery,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::new(ErrorKind::Parse, err.to_string())
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error::new(ErrorKind::InvalidState, format!("fst error: {}", err))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::new(ErrorKind::InvalidInput, format!("invalid pattern: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
