use thiserror::Error;

use crate::bencode::BencodeError;

/// Errors that can occur when parsing torrent files.
#[derive(Debug, Error)]
pub enum MetainfoError {
    /// The torrent file is not valid canonical bencode.
    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),

    /// A required field is missing from the document.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong type or shape.
    #[error("invalid field {field:?}: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// A strict dictionary contains keys that are not part of the format.
    #[error("unknown keys in {context}: {keys}")]
    UnknownKeys { context: &'static str, keys: String },

    /// Two mutually exclusive fields are both present.
    #[error("fields {0:?} and {1:?} cannot both be present")]
    ConflictingFields(&'static str, &'static str),

    /// An info hash string is not 40 hex characters.
    #[error("invalid info hash")]
    InvalidInfoHash,

    /// An I/O error occurred while reading the torrent file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetainfoError {
    /// Returns `true` when the bytes were valid bencode but the document
    /// itself breaks the metainfo rules.
    pub fn is_invalid_document(&self) -> bool {
        !matches!(self, MetainfoError::Bencode(_) | MetainfoError::Io(_))
    }
}
