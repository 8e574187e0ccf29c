//! Strict canonical bencode encoding and decoding ([BEP-3]).
//!
//! Bencode is the serialization format BitTorrent uses for `.torrent` files
//! and tracker responses. Every value has exactly one valid encoding, so the
//! encoded bytes of a value can be hashed to identify it.
//!
//! # Data Types
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! # Strictness
//!
//! The decoder accepts only canonical input:
//!
//! - integers without leading zeros and without `-0`;
//! - byte strings whose declared length fits the remaining input;
//! - dictionaries whose keys are byte strings in strictly increasing order;
//! - exactly one value per buffer for the top-level entry points.
//!
//! Because of this, `encode(&decode(b)?) == b` holds for every buffer the
//! decoder accepts.
//!
//! # Examples
//!
//! ```
//! use bcanon::bencode::{decode, decode_dict, encode, Value};
//!
//! let value = decode(b"ld1:ai1e1:bi2eed1:ci3e1:di4eee").unwrap();
//! let list = value.as_list().unwrap();
//! assert_eq!(list[0].get(b"b"), Some(&Value::Integer(2)));
//! assert_eq!(encode(&value), b"ld1:ai1e1:bi2eed1:ci3e1:di4eee");
//!
//! // Keys out of order are rejected, not re-sorted.
//! assert!(decode_dict(b"d1:bi2e1:ai1ee").is_err());
//! ```
//!
//! # Error Handling
//!
//! Every [`BencodeError`] belongs to one [`ErrorKind`]:
//!
//! - [`ErrorKind::MalformedInput`] - the grammar was violated at some offset
//! - [`ErrorKind::TrailingData`] - a value parsed but input remained
//! - [`ErrorKind::InvalidValue`] - the serializer was given unrepresentable data
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod error;
mod ser;
mod value;

pub use decode::{decode, decode_bytes, decode_dict, decode_integer, decode_list, Decoder};
pub use encode::{encode, encode_bytes, encode_dict, encode_integer, encode_list};
pub use error::{BencodeError, ErrorKind};
pub use ser::{to_bytes, to_value};
pub use value::{Dict, Value, ValueKind};

#[cfg(test)]
mod tests;
