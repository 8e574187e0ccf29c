use super::error::BencodeError;
use super::value::{Dict, Value};
use crate::constants::MAX_DEPTH;
use bytes::Bytes;
use std::cmp::Ordering;

/// Decodes a single bencode value of any kind.
///
/// The whole buffer must be consumed; anything left after the value is a
/// [`BencodeError::TrailingData`] error.
///
/// Lists and dictionaries may nest at most [`MAX_DEPTH`] levels deep. The
/// encoder has no such limit, so a deeper tree encodes fine but fails here
/// with [`BencodeError::NestingTooDeep`]; use [`Decoder::with_max_depth`] to
/// read it back.
///
/// # Examples
///
/// ```
/// use bcanon::bencode::{decode, Value};
///
/// assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
/// assert!(decode(b"i42eextra").is_err());
/// ```
pub fn decode(data: &[u8]) -> Result<Value, BencodeError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.read_value()?;
    decoder.finish()?;
    Ok(value)
}

/// Decodes a buffer that must contain exactly one integer.
///
/// ```
/// use bcanon::bencode::decode_integer;
///
/// assert_eq!(decode_integer(b"i-1337e").unwrap(), -1337);
/// assert!(decode_integer(b"i-0e").is_err());
/// assert!(decode_integer(b"4:spam").is_err());
/// ```
pub fn decode_integer(data: &[u8]) -> Result<i64, BencodeError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.read_integer()?;
    decoder.finish()?;
    Ok(value)
}

/// Decodes a buffer that must contain exactly one byte string.
pub fn decode_bytes(data: &[u8]) -> Result<Bytes, BencodeError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.read_bytes()?;
    decoder.finish()?;
    Ok(value)
}

/// Decodes a buffer that must contain exactly one list.
pub fn decode_list(data: &[u8]) -> Result<Vec<Value>, BencodeError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.read_list()?;
    decoder.finish()?;
    Ok(value)
}

/// Decodes a buffer that must contain exactly one dictionary.
///
/// Keys must appear in strictly increasing byte order. Out-of-order and
/// repeated keys are rejected, never re-sorted or merged, so a dictionary
/// that decodes successfully was already canonical.
///
/// ```
/// use bcanon::bencode::decode_dict;
///
/// let dict = decode_dict(b"d1:ai1e1:bi2ee").unwrap();
/// assert_eq!(dict.len(), 2);
///
/// assert!(decode_dict(b"d1:bi2e1:ai1ee").is_err());
/// assert!(decode_dict(b"d1:ai1e1:ai2ee").is_err());
/// ```
pub fn decode_dict(data: &[u8]) -> Result<Dict, BencodeError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.read_dict()?;
    decoder.finish()?;
    Ok(value)
}

/// A cursor over a bencoded buffer.
///
/// The `read_*` methods parse one value starting at the cursor and advance
/// past it, leaving any following bytes untouched. [`finish`](Self::finish)
/// asserts that the whole buffer was consumed. On error the cursor is left
/// where the failed read started.
///
/// # Examples
///
/// ```
/// use bcanon::bencode::Decoder;
///
/// let mut decoder = Decoder::new(b"3:abcdefg");
/// let value = decoder.read_value().unwrap();
///
/// assert_eq!(value.as_str(), Some("abc"));
/// assert_eq!(decoder.position(), 5);
/// assert!(decoder.finish().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Creates a decoder whose cursor starts at `start`.
    pub fn at(data: &'a [u8], start: usize) -> Self {
        Self {
            data,
            pos: start,
            max_depth: MAX_DEPTH,
        }
    }

    /// Sets the maximum number of nested lists and dictionaries accepted.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns `true` once the cursor sits exactly at the end of the buffer.
    pub fn is_finished(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Fails with [`BencodeError::TrailingData`] unless the buffer is fully consumed.
    pub fn finish(&self) -> Result<(), BencodeError> {
        if self.is_finished() {
            Ok(())
        } else {
            Err(BencodeError::TrailingData { offset: self.pos })
        }
    }

    /// Reads one value of whichever kind the next byte announces.
    pub fn read_value(&mut self) -> Result<Value, BencodeError> {
        self.restoring(|d| d.value(0))
    }

    pub fn read_integer(&mut self) -> Result<i64, BencodeError> {
        self.restoring(|d| d.integer())
    }

    pub fn read_bytes(&mut self) -> Result<Bytes, BencodeError> {
        self.restoring(|d| d.bytes())
    }

    pub fn read_list(&mut self) -> Result<Vec<Value>, BencodeError> {
        self.restoring(|d| d.list(0))
    }

    pub fn read_dict(&mut self) -> Result<Dict, BencodeError> {
        self.restoring(|d| d.dict(0))
    }

    fn restoring<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, BencodeError>,
    ) -> Result<T, BencodeError> {
        let start = self.pos;
        let result = read(self);
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), BencodeError> {
        match self.peek() {
            Some(c) if c == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(BencodeError::UnexpectedChar {
                offset: self.pos,
                found: c as char,
                expected,
            }),
            None => Err(BencodeError::UnexpectedEof { offset: self.pos }),
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, BencodeError> {
        match self.peek() {
            Some(b'i') => self.integer().map(Value::Integer),
            Some(b'0'..=b'9') => self.bytes().map(Value::Bytes),
            Some(b'l') => self.list(depth).map(Value::List),
            Some(b'd') => self.dict(depth).map(Value::Dict),
            Some(c) => Err(BencodeError::UnexpectedChar {
                offset: self.pos,
                found: c as char,
                expected: "value",
            }),
            None => Err(BencodeError::UnexpectedEof { offset: self.pos }),
        }
    }

    /// Parses `0` or a non-zero digit followed by digits.
    ///
    /// `invalid` builds the error for a leading zero or an overflowing value,
    /// so integers and string lengths report their own variant.
    fn natural(
        &mut self,
        invalid: fn(usize, &'static str) -> BencodeError,
    ) -> Result<u64, BencodeError> {
        let start = self.pos;
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if matches!(self.peek(), Some(b'0'..=b'9')) {
                    return Err(invalid(start, "leading zero"));
                }
                return Ok(0);
            }
            Some(b'1'..=b'9') => {}
            Some(c) => {
                return Err(BencodeError::UnexpectedChar {
                    offset: start,
                    found: c as char,
                    expected: "digit",
                })
            }
            None => return Err(BencodeError::UnexpectedEof { offset: start }),
        }

        let mut n: u64 = 0;
        while let Some(c @ b'0'..=b'9') = self.peek() {
            n = n
                .checked_mul(10)
                .and_then(|n| n.checked_add(u64::from(c - b'0')))
                .ok_or_else(|| invalid(start, "too large"))?;
            self.pos += 1;
        }
        Ok(n)
    }

    fn integer(&mut self) -> Result<i64, BencodeError> {
        self.expect(b'i', "'i'")?;

        let sign_offset = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }

        let magnitude = self.natural(invalid_integer)?;
        self.expect(b'e', "'e'")?;

        if negative && magnitude == 0 {
            return Err(invalid_integer(sign_offset, "negative zero"));
        }

        let value = if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        value.ok_or_else(|| invalid_integer(sign_offset, "out of range for i64"))
    }

    fn bytes(&mut self) -> Result<Bytes, BencodeError> {
        let start = self.pos;
        let len = self.natural(invalid_length)?;
        self.expect(b':', "':'")?;

        let remaining = self.data.len() - self.pos;
        let len = usize::try_from(len)
            .ok()
            .filter(|&len| len <= remaining)
            .ok_or_else(|| invalid_length(start, "exceeds remaining input"))?;

        let bytes = Bytes::copy_from_slice(&self.data[self.pos..self.pos + len]);
        self.pos += len;
        Ok(bytes)
    }

    fn enter(&self, depth: usize) -> Result<(), BencodeError> {
        if depth >= self.max_depth {
            tracing::trace!(offset = self.pos, depth, "bencode nesting limit hit");
            return Err(BencodeError::NestingTooDeep { offset: self.pos });
        }
        Ok(())
    }

    fn list(&mut self, depth: usize) -> Result<Vec<Value>, BencodeError> {
        self.enter(depth)?;
        self.expect(b'l', "'l'")?;

        let mut list = Vec::new();
        loop {
            match self.peek() {
                Some(b'e') => {
                    self.pos += 1;
                    return Ok(list);
                }
                Some(_) => list.push(self.value(depth + 1)?),
                None => return Err(BencodeError::UnexpectedEof { offset: self.pos }),
            }
        }
    }

    fn dict(&mut self, depth: usize) -> Result<Dict, BencodeError> {
        self.enter(depth)?;
        self.expect(b'd', "'d'")?;

        let mut dict = Dict::new();
        loop {
            match self.peek() {
                Some(b'e') => {
                    self.pos += 1;
                    return Ok(dict);
                }
                Some(b'0'..=b'9') => {
                    let key_offset = self.pos;
                    let key = self.bytes()?;

                    // Keys strictly increase, so the map's last key is the previous one.
                    if let Some((last, _)) = dict.last_key_value() {
                        match key.cmp(last) {
                            Ordering::Greater => {}
                            Ordering::Equal => {
                                return Err(BencodeError::DuplicateKey { offset: key_offset })
                            }
                            Ordering::Less => {
                                return Err(BencodeError::UnsortedKey { offset: key_offset })
                            }
                        }
                    }

                    let value = self.value(depth + 1)?;
                    dict.insert(key, value);
                }
                Some(b'i' | b'l' | b'd') => {
                    return Err(BencodeError::NonBytesKey { offset: self.pos })
                }
                Some(c) => {
                    return Err(BencodeError::UnexpectedChar {
                        offset: self.pos,
                        found: c as char,
                        expected: "dictionary key or 'e'",
                    })
                }
                None => return Err(BencodeError::UnexpectedEof { offset: self.pos }),
            }
        }
    }
}

fn invalid_integer(offset: usize, reason: &'static str) -> BencodeError {
    BencodeError::InvalidInteger { offset, reason }
}

fn invalid_length(offset: usize, reason: &'static str) -> BencodeError {
    BencodeError::InvalidLength { offset, reason }
}
