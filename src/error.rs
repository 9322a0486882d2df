use std::{array::TryFromSliceError, fmt::Display};

use bincode::ErrorKind;

/// Custom Result type for PageDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for PageDB
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Internal error (invalid state, serialization, etc.)
    Internal(String),
    /// Reading or writing a page file failed
    Io(String),
    /// Persisted bytes could not be decoded
    Corrupt(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<Box<ErrorKind>> for Error {
    fn from(value: Box<ErrorKind>) -> Self {
        Error::Corrupt(value.to_string())
    }
}

impl From<TryFromSliceError> for Error {
    fn from(value: TryFromSliceError) -> Self {
        Error::Corrupt(value.to_string())
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Internal(err) => write!(f, "internal error {}", err),
            Error::Io(err) => write!(f, "io error {}", err),
            Error::Corrupt(err) => write!(f, "corrupt data {}", err),
        }
    }
}
