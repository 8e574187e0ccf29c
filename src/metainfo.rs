//! Torrent metainfo parsing ([BEP-3]).
//!
//! A `.torrent` file is a bencoded dictionary. [`Metainfo::from_bytes`]
//! decodes it with the strict codec and then checks the document's shape:
//!
//! - **info** - required dictionary, hashed to form the [`InfoHash`]
//!   - `name` - suggested file or directory name
//!   - `piece length` - size of each piece in bytes
//!   - `pieces` - concatenated 20-byte SHA-1 piece hashes
//!   - `length` (single file) OR `files` (list of `{length, path}`)
//! - **announce** - optional tracker URL
//! - **comment** - optional comment
//! - **created by** - optional creating program
//! - **creation date** - optional Unix timestamp
//!
//! The info dictionary and each `files` entry are strict: keys outside the
//! ones listed above are rejected. Unknown root keys are kept in
//! [`Metainfo::other`].
//!
//! # Examples
//!
//! ```no_run
//! use bcanon::metainfo::Metainfo;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let torrent = Metainfo::from_file("example.torrent")?;
//!
//! println!("Name: {}", torrent.info.name);
//! println!("Info hash: {}", torrent.info_hash());
//! println!("Total size: {} bytes", torrent.info.total_length());
//! println!("Number of pieces: {}", torrent.info.piece_count());
//! # Ok(())
//! # }
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod error;
mod info_hash;
mod torrent;

pub use error::MetainfoError;
pub use info_hash::InfoHash;
pub use torrent::{File, FileLayout, Info, Metainfo};
