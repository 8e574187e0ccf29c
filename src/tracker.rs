//! Announce glue for an HTTP tracker ([BEP-3]).
//!
//! Nothing here touches the network. An HTTP server hands
//! [`handle_announce`] the raw query string and the remote address, and gets
//! back a status code plus a bencoded body to send:
//!
//! 1. [`AnnounceRequest::from_query`] validates the query. Failures become a
//!    400 with a `failure reason`.
//! 2. An [`AnnounceHandler`] decides on the peers (or a failure).
//!    [`Swarm`] is a ready-made in-memory one.
//! 3. The [`AnnounceResponse`] is encoded as `{interval, peers}` or
//!    `{failure reason}`.
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod error;
mod handler;
mod request;
mod response;
mod swarm;

pub use error::TrackerError;
pub use handler::{handle_announce, AnnounceHandler, HttpResponse};
pub use request::{percent_decode, percent_encode, AnnounceRequest, TrackerEvent};
pub use response::{AnnounceResponse, ResponsePeer};
pub use swarm::{PeerEntry, Swarm, SwarmStats, TrackerConfig};
