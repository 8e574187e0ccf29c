use thiserror::Error;

use crate::constants::{HTTP_BAD_REQUEST, HTTP_INTERNAL_ERROR};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("bencode error: {0}")]
    Bencode(#[from] crate::bencode::BencodeError),

    /// The announce query failed validation. The message is sent back to the
    /// client as the `failure reason`.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("invalid percent escape at offset {offset}")]
    InvalidEscape { offset: usize },
}

impl TrackerError {
    /// HTTP status to answer with when this error ends a request.
    pub fn status(&self) -> u16 {
        match self {
            TrackerError::InvalidRequest(_) | TrackerError::InvalidEscape { .. } => HTTP_BAD_REQUEST,
            TrackerError::Bencode(_) => HTTP_INTERNAL_ERROR,
        }
    }
}
