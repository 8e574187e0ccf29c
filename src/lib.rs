//! bcanon - Canonical bencode and the torrent documents built on it
//!
//! A strict codec that accepts only the single canonical encoding of each
//! value, plus the two BitTorrent pieces that depend on that guarantee.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 bencode decoding/encoding and a serde serializer
//! - [`metainfo`] - BEP-3 `.torrent` parsing and info hashes
//! - [`tracker`] - BEP-3 HTTP announce request/response glue and swarm registry
//! - [`constants`] - Codec limits and tracker defaults

pub mod bencode;
pub mod constants;
pub mod metainfo;
pub mod tracker;

pub use bencode::{decode, encode, to_bytes, BencodeError, Decoder, ErrorKind, Value};
pub use metainfo::{File, FileLayout, Info, InfoHash, Metainfo, MetainfoError};
pub use tracker::{
    handle_announce, AnnounceHandler, AnnounceRequest, AnnounceResponse, HttpResponse, Swarm,
    TrackerConfig, TrackerError, TrackerEvent,
};
