use bytes::Bytes;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::error::TrackerError;
use crate::bencode::to_bytes;
use crate::constants::{HTTP_INTERNAL_ERROR, HTTP_OK, PEER_ID_LEN};

/// A peer listed in a successful announce response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePeer {
    pub id: [u8; PEER_ID_LEN],
    /// IP address or host name, exactly as the tracker recorded it.
    pub ip: String,
    pub port: u16,
}

// Peer IDs are binary: emit them as byte strings, not lists of integers.
impl Serialize for ResponsePeer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut peer = serializer.serialize_struct("ResponsePeer", 3)?;
        peer.serialize_field("id", &Bytes::copy_from_slice(&self.id))?;
        peer.serialize_field("ip", &self.ip)?;
        peer.serialize_field("port", &self.port)?;
        peer.end()
    }
}

/// What an announce handler hands back to the HTTP glue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceResponse {
    Peers {
        /// Seconds the client should wait before announcing again.
        interval: u32,
        peers: Vec<ResponsePeer>,
    },
    Failure {
        reason: String,
        /// HTTP status to reply with; 500 when unset.
        status: Option<u16>,
    },
}

#[derive(Serialize)]
struct PeersBody<'a> {
    interval: u32,
    peers: &'a [ResponsePeer],
}

#[derive(Serialize)]
struct FailureBody<'a> {
    #[serde(rename = "failure reason")]
    reason: &'a str,
}

impl AnnounceResponse {
    pub fn failure(reason: impl Into<String>) -> Self {
        AnnounceResponse::Failure {
            reason: reason.into(),
            status: None,
        }
    }

    pub fn failure_with_status(reason: impl Into<String>, status: u16) -> Self {
        AnnounceResponse::Failure {
            reason: reason.into(),
            status: Some(status),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            AnnounceResponse::Peers { .. } => HTTP_OK,
            AnnounceResponse::Failure { status, .. } => status.unwrap_or(HTTP_INTERNAL_ERROR),
        }
    }

    /// Encodes the response body: `{interval, peers}` or `{failure reason}`.
    ///
    /// ```
    /// use bcanon::tracker::{AnnounceResponse, ResponsePeer};
    ///
    /// let response = AnnounceResponse::Peers {
    ///     interval: 60,
    ///     peers: vec![ResponsePeer { id: [b'p'; 20], ip: "10.0.0.1".into(), port: 6881 }],
    /// };
    /// assert_eq!(
    ///     response.to_bytes().unwrap(),
    ///     b"d8:intervali60e5:peersld2:id20:pppppppppppppppppppp2:ip8:10.0.0.14:porti6881eeee",
    /// );
    ///
    /// let failure = AnnounceResponse::failure("nope");
    /// assert_eq!(failure.to_bytes().unwrap(), b"d14:failure reason4:nopee");
    /// ```
    pub fn to_bytes(&self) -> Result<Vec<u8>, TrackerError> {
        let body = match self {
            AnnounceResponse::Peers { interval, peers } => to_bytes(&PeersBody {
                interval: *interval,
                peers,
            })?,
            AnnounceResponse::Failure { reason, .. } => to_bytes(&FailureBody { reason })?,
        };
        Ok(body)
    }
}
