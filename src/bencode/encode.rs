use super::value::Value;

/// Encodes a bencode value to its canonical byte form.
///
/// The output follows the canonical bencode format:
/// - Integers: `i<number>e`
/// - Byte strings: `<length>:<data>`
/// - Lists: `l<items>e`
/// - Dictionaries: `d<key><value>...e` (keys sorted lexicographically)
///
/// Encoding a [`Value`] cannot fail. Use [`to_bytes`](super::to_bytes) for
/// arbitrary `Serialize` data, which may be rejected.
///
/// # Examples
///
/// ```
/// use bcanon::bencode::{encode, Value};
/// use std::collections::BTreeMap;
/// use bytes::Bytes;
///
/// assert_eq!(encode(&Value::Integer(42)), b"i42e");
/// assert_eq!(encode(&Value::string("hello")), b"5:hello");
///
/// let list = Value::List(vec![Value::Integer(1), Value::string("two")]);
/// assert_eq!(encode(&list), b"li1e3:twoe");
///
/// let mut dict = BTreeMap::new();
/// dict.insert(Bytes::from_static(b"b"), Value::Integer(2));
/// dict.insert(Bytes::from_static(b"a"), Value::Integer(1));
/// assert_eq!(encode(&Value::Dict(dict)), b"d1:ai1e1:bi2ee");
/// ```
pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value(value, &mut buf);
    buf
}

/// Encodes a single integer.
///
/// ```
/// use bcanon::bencode::encode_integer;
///
/// assert_eq!(encode_integer(-1337), b"i-1337e");
/// assert_eq!(encode_integer(0), b"i0e");
/// ```
pub fn encode_integer(value: i64) -> Vec<u8> {
    let mut buf = Vec::new();
    write_integer(value, &mut buf);
    buf
}

/// Encodes a single byte string. The bytes are written raw, without escaping.
pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(bytes.len() + 8);
    write_bytes(bytes, &mut buf);
    buf
}

pub fn encode_list(list: &[Value]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_list(list, &mut buf);
    buf
}

/// Encodes dictionary entries given in any order.
///
/// Entries are sorted by key before writing. An entry whose value is `None`
/// is treated as absent and left out of the output. If a key occurs more
/// than once, the last present value for it wins.
///
/// # Examples
///
/// ```
/// use bcanon::bencode::{encode_dict, Value};
///
/// let b = Value::Integer(2);
/// let a = Value::Integer(1);
/// let encoded = encode_dict([
///     ("b", Some(&b)),
///     ("unset", None),
///     ("a", Some(&a)),
/// ]);
/// assert_eq!(encoded, b"d1:ai1e1:bi2ee");
/// ```
pub fn encode_dict<'v, K, I>(entries: I) -> Vec<u8>
where
    K: AsRef<[u8]>,
    I: IntoIterator<Item = (K, Option<&'v Value>)>,
{
    let mut present: Vec<(K, &Value)> = entries
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect();

    // Stable sort keeps insertion order among equal keys, so the last one is the winner.
    present.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    let mut buf = Vec::new();
    buf.push(b'd');
    for (i, (key, value)) in present.iter().enumerate() {
        let superseded = present
            .get(i + 1)
            .is_some_and(|(next, _)| next.as_ref() == key.as_ref());
        if superseded {
            continue;
        }
        write_bytes(key.as_ref(), &mut buf);
        encode_value(value, &mut buf);
    }
    buf.push(b'e');
    buf
}

fn encode_value(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Integer(i) => write_integer(*i, buf),
        Value::Bytes(b) => write_bytes(b, buf),
        Value::List(l) => write_list(l, buf),
        Value::Dict(d) => {
            buf.push(b'd');
            for (key, val) in d {
                write_bytes(key, buf);
                encode_value(val, buf);
            }
            buf.push(b'e');
        }
    }
}

fn write_integer(value: i64, buf: &mut Vec<u8>) {
    buf.push(b'i');
    if value < 0 {
        buf.push(b'-');
    }
    write_natural(value.unsigned_abs(), buf);
    buf.push(b'e');
}

fn write_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
    write_natural(bytes.len() as u64, buf);
    buf.push(b':');
    buf.extend_from_slice(bytes);
}

fn write_list(list: &[Value], buf: &mut Vec<u8>) {
    buf.push(b'l');
    for item in list {
        encode_value(item, buf);
    }
    buf.push(b'e');
}

fn write_natural(n: u64, buf: &mut Vec<u8>) {
    buf.extend_from_slice(n.to_string().as_bytes());
}
