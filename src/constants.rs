//! Protocol constants and tuning parameters.
//!
//! Wire-format limits for the codec plus the defaults used by the metainfo
//! parser and the tracker glue.

use std::time::Duration;

// ============================================================================
// Codec limits
// ============================================================================

/// Default maximum nesting depth accepted by the decoder.
///
/// Every list or dictionary adds one level. Deeper input is rejected rather
/// than risking stack exhaustion on hostile data.
pub const MAX_DEPTH: usize = 64;

// ============================================================================
// Metainfo
// ============================================================================

/// Length of one SHA-1 piece hash inside the `pieces` field.
pub const PIECE_HASH_LEN: usize = 20;

/// Length of a v1 info hash (SHA-1 of the bencoded info dictionary).
pub const INFO_HASH_LEN: usize = 20;

// ============================================================================
// Tracker
// ============================================================================

/// Length of a peer ID as sent in announce requests.
pub const PEER_ID_LEN: usize = 20;

/// Announce interval handed to clients by default.
pub const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(60);

/// Maximum number of peers returned in a single announce response.
pub const DEFAULT_MAX_PEERS: usize = 50;

/// HTTP status for malformed announce requests.
pub const HTTP_BAD_REQUEST: u16 = 400;

/// HTTP status used when a handler fails without naming a status.
pub const HTTP_INTERNAL_ERROR: u16 = 500;

/// HTTP status for successful announces.
pub const HTTP_OK: u16 = 200;
