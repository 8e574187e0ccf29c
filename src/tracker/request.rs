use std::borrow::Cow;
use std::fmt::Write;
use std::str::FromStr;

use super::error::TrackerError;
use crate::constants::{INFO_HASH_LEN, PEER_ID_LEN};
use crate::metainfo::InfoHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerEvent {
    /// A regular interval announce (`event` absent or `empty`).
    #[default]
    None,
    Started,
    Completed,
    Stopped,
}

impl TrackerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerEvent::None => "empty",
            TrackerEvent::Started => "started",
            TrackerEvent::Completed => "completed",
            TrackerEvent::Stopped => "stopped",
        }
    }

    /// Parses the value of an `event` query parameter.
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "started" => Some(TrackerEvent::Started),
            "completed" => Some(TrackerEvent::Completed),
            "stopped" => Some(TrackerEvent::Stopped),
            "empty" => Some(TrackerEvent::None),
            _ => None,
        }
    }
}

/// A validated announce request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceRequest {
    pub info_hash: InfoHash,
    pub peer_id: [u8; PEER_ID_LEN],
    /// Address the client asked to be reached at. `None` when absent or
    /// empty, in which case the connection's remote address applies.
    pub ip: Option<String>,
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub event: TrackerEvent,
}

impl AnnounceRequest {
    /// Parses and validates the query string of an announce URL (without
    /// the leading `?`).
    ///
    /// Checks run in a fixed order and the first failure wins, so a client
    /// always sees the same reason for the same query.
    ///
    /// ```
    /// use bcanon::tracker::{AnnounceRequest, TrackerEvent};
    ///
    /// let query = "info_hash=%00%01%02%03%04%05%06%07%08%09%0A%0B%0C%0D%0E%0F%10%11%12%13\
    ///              &peer_id=-BC0001-abcdefghijkl&port=6881\
    ///              &uploaded=0&downloaded=0&left=100&event=started";
    /// let request = AnnounceRequest::from_query(query).unwrap();
    ///
    /// assert_eq!(request.port, 6881);
    /// assert_eq!(&request.peer_id, b"-BC0001-abcdefghijkl");
    /// assert_eq!(request.event, TrackerEvent::Started);
    ///
    /// let err = AnnounceRequest::from_query("peer_id=x").unwrap_err();
    /// assert_eq!(err.to_string(), "Missing or invalid `info_hash`");
    /// ```
    pub fn from_query(query: &str) -> Result<Self, TrackerError> {
        let params = Params::parse(query);

        let info_hash = InfoHash(params.fixed::<INFO_HASH_LEN>("info_hash")?);
        let peer_id = params.fixed::<PEER_ID_LEN>("peer_id")?;

        let ip = match params.lookup("ip") {
            Param::Absent => None,
            Param::Single(raw) => {
                let ip = decode_text(raw).ok_or_else(|| invalid("Invalid `ip`"))?;
                Some(ip).filter(|ip| !ip.is_empty())
            }
            Param::Repeated => return Err(invalid("Invalid `ip`")),
        };

        let port = params.number::<u16>("port")?;
        let uploaded = params.number::<u64>("uploaded")?;
        let downloaded = params.number::<u64>("downloaded")?;
        let left = params.number::<u64>("left")?;

        let event = match params.lookup("event") {
            Param::Absent => TrackerEvent::None,
            Param::Single(raw) => decode_text(raw)
                .as_deref()
                .and_then(TrackerEvent::from_param)
                .ok_or_else(|| invalid("Invalid `event`"))?,
            Param::Repeated => return Err(invalid("Invalid `event`")),
        };

        Ok(Self {
            info_hash,
            peer_id,
            ip,
            port,
            uploaded,
            downloaded,
            left,
            event,
        })
    }

    /// Renders the request as an announce query string.
    pub fn to_query(&self) -> String {
        let mut query = format!(
            "info_hash={}&peer_id={}&port={}&uploaded={}&downloaded={}&left={}",
            percent_encode(self.info_hash.as_bytes()),
            percent_encode(&self.peer_id),
            self.port,
            self.uploaded,
            self.downloaded,
            self.left
        );

        if let Some(ip) = &self.ip {
            let _ = write!(query, "&ip={}", percent_encode(ip.as_bytes()));
        }
        if self.event != TrackerEvent::None {
            let _ = write!(query, "&event={}", self.event.as_str());
        }
        query
    }
}

/// Decodes `%XX` escapes. Every other character is taken literally.
///
/// ```
/// use bcanon::tracker::percent_decode;
///
/// assert_eq!(percent_decode("a%20b%ff").unwrap(), b"a b\xff");
/// assert!(percent_decode("%2").is_err());
/// assert!(percent_decode("%zz").is_err());
/// ```
pub fn percent_decode(input: &str) -> Result<Vec<u8>, TrackerError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let byte = bytes
            .get(i + 1..i + 3)
            .and_then(|digits| Some((hex_digit(digits[0])? << 4) | hex_digit(digits[1])?))
            .ok_or(TrackerError::InvalidEscape { offset: i })?;
        out.push(byte);
        i += 3;
    }

    Ok(out)
}

/// Escapes everything except RFC 3986 unreserved characters.
pub fn percent_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 3), |mut s, &b| {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            s.push(b as char);
        } else {
            let _ = write!(s, "%{:02X}", b);
        }
        s
    })
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

fn decode_text(raw: &str) -> Option<String> {
    percent_decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

fn decode_key(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    decode_text(raw).map_or(Cow::Borrowed(raw), Cow::Owned)
}

fn invalid(reason: &str) -> TrackerError {
    TrackerError::InvalidRequest(reason.to_string())
}

fn missing_or_invalid(name: &str) -> TrackerError {
    TrackerError::InvalidRequest(format!("Missing or invalid `{name}`"))
}

enum Param<'q> {
    Absent,
    Single(&'q str),
    Repeated,
}

/// `key=value` pairs of a query string, in order of appearance. Keys are
/// percent-decoded; values stay raw until a field asks for them. A key with
/// a malformed escape is kept as written and so matches no field.
struct Params<'q> {
    pairs: Vec<(Cow<'q, str>, &'q str)>,
}

impl<'q> Params<'q> {
    fn parse(query: &'q str) -> Self {
        let pairs = query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
                (decode_key(key), value)
            })
            .collect();
        Self { pairs }
    }

    fn lookup(&self, name: &str) -> Param<'q> {
        let mut values = self
            .pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| *value);

        match (values.next(), values.next()) {
            (None, _) => Param::Absent,
            (Some(value), None) => Param::Single(value),
            (Some(_), Some(_)) => Param::Repeated,
        }
    }

    fn single(&self, name: &str) -> Option<&'q str> {
        match self.lookup(name) {
            Param::Single(value) => Some(value),
            Param::Absent | Param::Repeated => None,
        }
    }

    /// A binary parameter that must decode to exactly `N` bytes.
    fn fixed<const N: usize>(&self, name: &str) -> Result<[u8; N], TrackerError> {
        let bytes = self
            .single(name)
            .and_then(|raw| percent_decode(raw).ok())
            .ok_or_else(|| missing_or_invalid(name))?;

        <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
            TrackerError::InvalidRequest(format!("Wrong `{name}` length {}", bytes.len()))
        })
    }

    /// A plain decimal parameter. Signs, whitespace and empty values are
    /// rejected, as are values that overflow `T`.
    fn number<T: FromStr>(&self, name: &str) -> Result<T, TrackerError> {
        self.single(name)
            .and_then(decode_text)
            .filter(|text| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| missing_or_invalid(name))
    }
}
