use super::error::MetainfoError;
use super::info_hash::InfoHash;
use crate::bencode::{decode_dict, encode, Dict, Value};
use crate::constants::PIECE_HASH_LEN;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const INFO_KEYS: &[&str] = &["name", "piece length", "pieces", "length", "files"];
const FILE_KEYS: &[&str] = &["length", "path"];

/// A parsed torrent file.
///
/// # Examples
///
/// ```
/// use bcanon::metainfo::Metainfo;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let data = b"d8:announce23:http://tracker/announce4:infod6:lengthi5e\
///              4:name5:a.txt12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee";
/// let metainfo = Metainfo::from_bytes(data)?;
///
/// assert_eq!(metainfo.info.name, "a.txt");
/// assert_eq!(metainfo.info.total_length(), 5);
/// assert_eq!(metainfo.announce.as_deref(), Some("http://tracker/announce"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Metainfo {
    /// Primary tracker URL.
    pub announce: Option<String>,
    /// The info dictionary containing file and piece information.
    pub info: Info,
    /// Optional free-form comment.
    pub comment: Option<String>,
    /// Name/version of the program that created the torrent.
    pub created_by: Option<String>,
    /// When the torrent was created.
    pub creation_date: Option<SystemTime>,
    /// Root keys this parser does not interpret, kept verbatim.
    pub other: Dict,
    info_hash: InfoHash,
}

/// The info dictionary from a torrent file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    /// Suggested name for the file or directory.
    pub name: String,
    /// Number of bytes per piece.
    pub piece_length: u64,
    /// SHA-1 hash of each piece.
    pub pieces: Vec<[u8; PIECE_HASH_LEN]>,
    pub layout: FileLayout,
}

/// Whether a torrent describes one file or a directory of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLayout {
    /// `length` was present: a single file named after `Info::name`.
    Single { length: u64 },
    /// `files` was present: paths are relative to a directory named `Info::name`.
    Multi { files: Vec<File> },
}

/// One entry of a multi-file torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub length: u64,
    /// Path components, outermost directory first.
    pub path: Vec<String>,
}

impl File {
    /// Joins the path components into a relative filesystem path.
    pub fn relative_path(&self) -> PathBuf {
        self.path.iter().collect()
    }
}

impl Info {
    /// Size of all files combined. Parsing guarantees the sum fits in `u64`.
    pub fn total_length(&self) -> u64 {
        match &self.layout {
            FileLayout::Single { length } => *length,
            FileLayout::Multi { files } => files.iter().map(|f| f.length).sum(),
        }
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_multi_file(&self) -> bool {
        matches!(self.layout, FileLayout::Multi { .. })
    }
}

impl Metainfo {
    /// Parses a torrent file from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The data is not a single canonical bencode dictionary
    /// - Required fields are missing or have the wrong type
    /// - The info dictionary, or a `files` entry, has keys outside the format
    /// - The pieces field length is not a multiple of 20
    /// - Both or neither of `length` and `files` are present
    /// - The `files` lengths add up to more than `u64::MAX`
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetainfoError> {
        let mut root = decode_dict(data)?;

        let info_value = root
            .remove(b"info".as_slice())
            .ok_or(MetainfoError::MissingField("info"))?;
        let info_dict = info_value.as_dict().ok_or(MetainfoError::InvalidField {
            field: "info",
            expected: "dictionary",
        })?;

        // The decoder only accepts canonical input, so this re-encoding is
        // byte-for-byte the info dictionary as it appeared in `data`.
        let info_hash = InfoHash::digest(&encode(&info_value));
        let info = parse_info(info_dict)?;

        let announce = optional_text(root.remove(b"announce".as_slice()), "announce")?;
        let comment = optional_text(root.remove(b"comment".as_slice()), "comment")?;
        let created_by = optional_text(root.remove(b"created by".as_slice()), "created by")?;
        let creation_date = root
            .remove(b"creation date".as_slice())
            .map(|v| parse_timestamp(&v))
            .transpose()?;

        tracing::debug!(
            name = %info.name,
            pieces = info.piece_count(),
            total_length = info.total_length(),
            %info_hash,
            "parsed metainfo"
        );

        Ok(Self {
            announce,
            info,
            comment,
            created_by,
            creation_date,
            other: root,
            info_hash,
        })
    }

    /// Reads and parses a `.torrent` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MetainfoError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// SHA-1 of the canonical info dictionary.
    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }
}

fn parse_info(dict: &Dict) -> Result<Info, MetainfoError> {
    reject_unknown_keys(dict, INFO_KEYS, "info")?;

    let name = required_text(dict, "name")?;

    let piece_length = required(dict, "piece length")?
        .as_integer()
        .and_then(|n| u64::try_from(n).ok())
        .filter(|&n| n > 0)
        .ok_or(MetainfoError::InvalidField {
            field: "piece length",
            expected: "positive integer",
        })?;

    let pieces_bytes = required(dict, "pieces")?
        .as_bytes()
        .ok_or(MetainfoError::InvalidField {
            field: "pieces",
            expected: "byte string",
        })?;
    if pieces_bytes.len() % PIECE_HASH_LEN != 0 {
        return Err(MetainfoError::InvalidField {
            field: "pieces",
            expected: "length that is a multiple of 20",
        });
    }
    let pieces = pieces_bytes
        .chunks_exact(PIECE_HASH_LEN)
        .map(|chunk| {
            let mut arr = [0u8; PIECE_HASH_LEN];
            arr.copy_from_slice(chunk);
            arr
        })
        .collect();

    let layout = match (dict.get(b"length".as_slice()), dict.get(b"files".as_slice())) {
        (Some(length), None) => FileLayout::Single {
            length: non_negative(length, "length")?,
        },
        (None, Some(files)) => {
            let files = files
                .as_list()
                .ok_or(MetainfoError::InvalidField {
                    field: "files",
                    expected: "list",
                })?
                .iter()
                .map(parse_file)
                .collect::<Result<Vec<_>, _>>()?;
            files
                .iter()
                .try_fold(0u64, |total, file| total.checked_add(file.length))
                .ok_or(MetainfoError::InvalidField {
                    field: "files",
                    expected: "total length within u64",
                })?;
            FileLayout::Multi { files }
        }
        (Some(_), Some(_)) => return Err(MetainfoError::ConflictingFields("length", "files")),
        (None, None) => return Err(MetainfoError::MissingField("length or files")),
    };

    Ok(Info {
        name,
        piece_length,
        pieces,
        layout,
    })
}

fn parse_file(value: &Value) -> Result<File, MetainfoError> {
    let dict = value.as_dict().ok_or(MetainfoError::InvalidField {
        field: "files",
        expected: "list of dictionaries",
    })?;
    reject_unknown_keys(dict, FILE_KEYS, "files entry")?;

    let length = non_negative(required(dict, "length")?, "length")?;

    let fragments = required(dict, "path")?
        .as_list()
        .ok_or(MetainfoError::InvalidField {
            field: "path",
            expected: "list",
        })?;
    if fragments.is_empty() {
        return Err(MetainfoError::InvalidField {
            field: "path",
            expected: "non-empty list",
        });
    }
    let path = fragments
        .iter()
        .map(|fragment| {
            fragment
                .as_str()
                .map(String::from)
                .ok_or(MetainfoError::InvalidField {
                    field: "path",
                    expected: "list of UTF-8 byte strings",
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(File { length, path })
}

fn reject_unknown_keys(
    dict: &Dict,
    known: &[&str],
    context: &'static str,
) -> Result<(), MetainfoError> {
    let unknown: Vec<String> = dict
        .keys()
        .filter(|key| !known.iter().any(|k| k.as_bytes() == &key[..]))
        .map(|key| String::from_utf8_lossy(key).into_owned())
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(MetainfoError::UnknownKeys {
            context,
            keys: unknown.join(", "),
        })
    }
}

fn required<'a>(dict: &'a Dict, field: &'static str) -> Result<&'a Value, MetainfoError> {
    dict.get(field.as_bytes())
        .ok_or(MetainfoError::MissingField(field))
}

fn required_text(dict: &Dict, field: &'static str) -> Result<String, MetainfoError> {
    text(required(dict, field)?, field)
}

fn optional_text(value: Option<Value>, field: &'static str) -> Result<Option<String>, MetainfoError> {
    value.map(|v| text(&v, field)).transpose()
}

fn text(value: &Value, field: &'static str) -> Result<String, MetainfoError> {
    value
        .as_str()
        .map(String::from)
        .ok_or(MetainfoError::InvalidField {
            field,
            expected: "UTF-8 byte string",
        })
}

fn non_negative(value: &Value, field: &'static str) -> Result<u64, MetainfoError> {
    value
        .as_integer()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or(MetainfoError::InvalidField {
            field,
            expected: "non-negative integer",
        })
}

fn parse_timestamp(value: &Value) -> Result<SystemTime, MetainfoError> {
    let secs = non_negative(value, "creation date")?;
    Ok(UNIX_EPOCH + Duration::from_secs(secs))
}
