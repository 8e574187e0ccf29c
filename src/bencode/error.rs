use std::fmt;

use thiserror::Error;

/// Broad classification of a [`BencodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input does not satisfy the bencode grammar at some offset.
    MalformedInput,
    /// A complete value was parsed but input remains after it.
    TrailingData,
    /// A value handed to the encoder cannot be represented in bencode.
    InvalidValue,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::MalformedInput => "malformed input",
            ErrorKind::TrailingData => "trailing data",
            ErrorKind::InvalidValue => "invalid value",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BencodeError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("unexpected character {found:?} at offset {offset}, expected {expected}")]
    UnexpectedChar {
        offset: usize,
        found: char,
        expected: &'static str,
    },

    #[error("invalid integer at offset {offset}: {reason}")]
    InvalidInteger { offset: usize, reason: &'static str },

    #[error("invalid byte string length at offset {offset}: {reason}")]
    InvalidLength { offset: usize, reason: &'static str },

    #[error("dictionary key at offset {offset} is not a byte string")]
    NonBytesKey { offset: usize },

    #[error("dictionary key at offset {offset} is out of order")]
    UnsortedKey { offset: usize },

    #[error("duplicate dictionary key at offset {offset}")]
    DuplicateKey { offset: usize },

    #[error("nesting too deep at offset {offset}")]
    NestingTooDeep { offset: usize },

    #[error("trailing data after value at offset {offset}")]
    TrailingData { offset: usize },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl BencodeError {
    /// Returns the broad kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BencodeError::TrailingData { .. } => ErrorKind::TrailingData,
            BencodeError::InvalidValue(_) => ErrorKind::InvalidValue,
            _ => ErrorKind::MalformedInput,
        }
    }

    /// Returns the input offset at which the problem was detected.
    ///
    /// Encoder errors have no offset.
    pub fn offset(&self) -> Option<usize> {
        match *self {
            BencodeError::UnexpectedEof { offset }
            | BencodeError::UnexpectedChar { offset, .. }
            | BencodeError::InvalidInteger { offset, .. }
            | BencodeError::InvalidLength { offset, .. }
            | BencodeError::NonBytesKey { offset }
            | BencodeError::UnsortedKey { offset }
            | BencodeError::DuplicateKey { offset }
            | BencodeError::NestingTooDeep { offset }
            | BencodeError::TrailingData { offset } => Some(offset),
            BencodeError::InvalidValue(_) => None,
        }
    }
}

impl serde::ser::Error for BencodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        BencodeError::InvalidValue(msg.to_string())
    }
}
