use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use proptest::prelude::*;
use serde::Serialize;

use super::*;

fn dict(entries: &[(&str, Value)]) -> Value {
    Value::Dict(
        entries
            .iter()
            .map(|(k, v)| (Bytes::copy_from_slice(k.as_bytes()), v.clone()))
            .collect(),
    )
}

#[test]
fn test_decode_integer() {
    assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
    assert_eq!(decode(b"i-1337e").unwrap(), Value::Integer(-1337));
    assert_eq!(decode(b"i0e").unwrap(), Value::Integer(0));
    assert_eq!(decode_integer(b"i7e").unwrap(), 7);
}

#[test]
fn test_decode_integer_invalid() {
    for input in [&b"i00e"[..], b"i0123e", b"i-0e", b"ie", b"i-e", b"i12", b"i1x2e", b"i+1e"] {
        let err = decode(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput, "input {:?}", input);
    }
}

#[test]
fn test_decode_integer_offsets() {
    assert_eq!(
        decode(b"i-0e").unwrap_err(),
        BencodeError::InvalidInteger {
            offset: 1,
            reason: "negative zero"
        }
    );
    assert_eq!(
        decode(b"i0123e").unwrap_err(),
        BencodeError::InvalidInteger {
            offset: 1,
            reason: "leading zero"
        }
    );
    assert_eq!(
        decode(b"ie").unwrap_err(),
        BencodeError::UnexpectedChar {
            offset: 1,
            found: 'e',
            expected: "digit"
        }
    );
}

#[test]
fn test_decode_integer_bounds() {
    assert_eq!(decode_integer(b"i9223372036854775807e").unwrap(), i64::MAX);
    assert_eq!(decode_integer(b"i-9223372036854775808e").unwrap(), i64::MIN);
    assert!(decode_integer(b"i9223372036854775808e").is_err());
    assert!(decode_integer(b"i-9223372036854775809e").is_err());
    assert!(decode_integer(b"i99999999999999999999999e").is_err());
}

#[test]
fn test_decode_bytes() {
    assert_eq!(
        decode(b"4:spam").unwrap(),
        Value::Bytes(Bytes::from_static(b"spam"))
    );
    assert_eq!(decode_bytes(b"0:").unwrap(), Bytes::new());
}

#[test]
fn test_decode_bytes_exact_length() {
    let err = decode(b"3:abcdefg").unwrap_err();
    assert_eq!(err, BencodeError::TrailingData { offset: 5 });
    assert_eq!(err.kind(), ErrorKind::TrailingData);

    let mut decoder = Decoder::new(b"3:abcdefg");
    let value = decoder.read_value().unwrap();
    assert_eq!(value, Value::Bytes(Bytes::from_static(b"abc")));
    assert_eq!(decoder.position(), 5);
}

#[test]
fn test_decode_bytes_length_exceeds_input() {
    let err = decode(b"10:").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(err.offset(), Some(0));

    assert!(decode(b"5:abc").is_err());
    assert!(decode(b"18446744073709551616:").is_err());
    assert!(decode(b"03:abc").is_err());
    assert!(decode(b"3abc").is_err());
}

#[test]
fn test_decode_binary_bytes() {
    let data = [b'3', b':', 0x13, 0x37, 0xFF];
    let value = decode_bytes(&data).unwrap();
    assert_eq!(value.as_ref(), &[0x13, 0x37, 0xFF]);
    assert_eq!(encode_bytes(&value), data);
}

#[test]
fn test_decode_list() {
    assert_eq!(decode(b"le").unwrap(), Value::List(vec![]));

    let list = decode_list(b"l4:spami42ee").unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0], Value::Bytes(Bytes::from_static(b"spam")));
    assert_eq!(list[1], Value::Integer(42));
}

#[test]
fn test_decode_list_invalid() {
    let err = decode(b"lQUACKe").unwrap_err();
    assert_eq!(
        err,
        BencodeError::UnexpectedChar {
            offset: 1,
            found: 'Q',
            expected: "value"
        }
    );

    assert_eq!(
        decode(b"li1ee").unwrap_err(),
        BencodeError::TrailingData { offset: 4 }
    );
    assert_eq!(
        decode(b"li1e").unwrap_err(),
        BencodeError::UnexpectedEof { offset: 4 }
    );
}

#[test]
fn test_decode_dict() {
    assert_eq!(decode(b"de").unwrap(), Value::Dict(BTreeMap::new()));

    let d = decode_dict(b"d3:cow3:moo4:spam4:eggse").unwrap();
    assert_eq!(d.len(), 2);
    assert_eq!(
        d.get(b"cow".as_slice()),
        Some(&Value::Bytes(Bytes::from_static(b"moo")))
    );
}

#[test]
fn test_decode_dict_unsorted_keys() {
    let err = decode(b"d1:bi2e1:ai1ee").unwrap_err();
    assert_eq!(err, BencodeError::UnsortedKey { offset: 7 });
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    // Shorter prefix sorts first.
    assert!(decode(b"d2:abi1e1:ai2ee").is_err());
    assert!(decode(b"d1:ai1e2:abi2ee").is_ok());
}

#[test]
fn test_decode_dict_duplicate_keys() {
    assert_eq!(
        decode(b"d1:ai1e1:ai2ee").unwrap_err(),
        BencodeError::DuplicateKey { offset: 7 }
    );
}

#[test]
fn test_decode_dict_non_bytes_key() {
    assert_eq!(
        decode(b"di1ei2ee").unwrap_err(),
        BencodeError::NonBytesKey { offset: 1 }
    );
    assert_eq!(
        decode(b"dle1:ae").unwrap_err(),
        BencodeError::NonBytesKey { offset: 1 }
    );
    assert!(decode(b"d1:ae").is_err());
}

#[test]
fn test_kind_entry_points_reject_other_kinds() {
    assert!(decode_integer(b"4:spam").is_err());
    assert!(decode_bytes(b"i1e").is_err());
    assert!(decode_list(b"de").is_err());
    assert!(decode_dict(b"le").is_err());
}

#[test]
fn test_decoder_start_offset() {
    let data = b"xxi42e";
    let mut decoder = Decoder::at(data, 2);
    assert_eq!(decoder.read_integer().unwrap(), 42);
    assert!(decoder.finish().is_ok());

    let mut decoder = Decoder::at(data, 10);
    assert_eq!(
        decoder.read_value().unwrap_err(),
        BencodeError::UnexpectedEof { offset: 10 }
    );
}

#[test]
fn test_decoder_siblings() {
    let mut decoder = Decoder::new(b"i1e3:abcle");
    assert_eq!(decoder.read_integer().unwrap(), 1);
    assert_eq!(decoder.read_bytes().unwrap(), Bytes::from_static(b"abc"));
    assert_eq!(decoder.read_list().unwrap(), vec![]);
    assert!(decoder.is_finished());
}

#[test]
fn test_decoder_restores_position_on_error() {
    let mut decoder = Decoder::new(b"i1eli1e");
    decoder.read_integer().unwrap();
    assert!(decoder.read_list().is_err());
    assert_eq!(decoder.position(), 3);
}

#[test]
fn test_nesting_limit() {
    let nested = |depth: usize| {
        let mut data = vec![b'l'; depth];
        data.extend(std::iter::repeat(b'e').take(depth));
        data
    };

    assert!(decode(&nested(crate::constants::MAX_DEPTH)).is_ok());
    let err = decode(&nested(crate::constants::MAX_DEPTH + 1)).unwrap_err();
    assert!(matches!(err, BencodeError::NestingTooDeep { .. }));
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let deep = nested(200);
    let mut decoder = Decoder::new(&deep).with_max_depth(200);
    assert!(decoder.read_value().is_ok());

    let mut decoder = Decoder::new(b"le").with_max_depth(0);
    assert!(decoder.read_value().is_err());
}

#[test]
fn test_round_trip_past_default_depth() {
    let depth = crate::constants::MAX_DEPTH + 1;
    let value = (0..depth).fold(Value::Integer(7), |inner, _| Value::List(vec![inner]));
    let encoded = encode(&value);

    let err = decode(&encoded).unwrap_err();
    assert_eq!(err, BencodeError::NestingTooDeep { offset: crate::constants::MAX_DEPTH });

    let mut decoder = Decoder::new(&encoded).with_max_depth(depth);
    assert_eq!(decoder.read_value().unwrap(), value);
    assert!(decoder.finish().is_ok());
}

#[test]
fn test_encode_integer() {
    assert_eq!(encode(&Value::Integer(42)), b"i42e");
    assert_eq!(encode(&Value::Integer(-42)), b"i-42e");
    assert_eq!(encode_integer(0), b"i0e");
    assert_eq!(encode_integer(i64::MIN), b"i-9223372036854775808e");
}

#[test]
fn test_encode_bytes() {
    assert_eq!(encode(&Value::Bytes(Bytes::from_static(b"spam"))), b"4:spam");
    assert_eq!(encode_bytes(b""), b"0:");
}

#[test]
fn test_encode_list() {
    let list = vec![Value::Bytes(Bytes::from_static(b"spam")), Value::Integer(42)];
    assert_eq!(encode_list(&list), b"l4:spami42ee");
    assert_eq!(encode(&Value::List(list)), b"l4:spami42ee");
}

#[test]
fn test_encode_dict_sorted() {
    let value = dict(&[("b", Value::Integer(2)), ("a", Value::Integer(1))]);
    assert_eq!(encode(&value), b"d1:ai1e1:bi2ee");

    let one = Value::Integer(1);
    let two = Value::Integer(2);
    assert_eq!(
        encode_dict([(b"b".as_slice(), Some(&two)), (b"a".as_slice(), Some(&one))]),
        b"d1:ai1e1:bi2ee"
    );
}

#[test]
fn test_encode_dict_skips_absent() {
    let one = Value::Integer(1);
    let entries: Vec<(&str, Option<&Value>)> = vec![("z", None), ("a", Some(&one)), ("m", None)];
    assert_eq!(encode_dict(entries), b"d1:ai1ee");
}

#[test]
fn test_encode_dict_last_duplicate_wins() {
    let one = Value::Integer(1);
    let two = Value::Integer(2);
    assert_eq!(
        encode_dict([("k", Some(&one)), ("k", Some(&two))]),
        b"d1:ki2ee"
    );
    assert_eq!(encode_dict([("k", Some(&one)), ("k", None)]), b"d1:ki1ee");
}

#[test]
fn test_roundtrip() {
    let original = b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee";
    let decoded = decode(original).unwrap();
    assert_eq!(encode(&decoded), original);
}

#[test]
fn test_nested_structures() {
    let data = b"ld1:ai1e1:bi2eed1:ci3e1:di4eee";
    let decoded = decode(data).unwrap();

    let expected = Value::List(vec![
        dict(&[("a", Value::Integer(1)), ("b", Value::Integer(2))]),
        dict(&[("c", Value::Integer(3)), ("d", Value::Integer(4))]),
    ]);
    assert_eq!(decoded, expected);
    assert_eq!(encode(&decoded), data);
}

#[test]
fn test_value_accessors() {
    let value = Value::Integer(42);
    assert_eq!(value.as_integer(), Some(42));
    assert_eq!(value.kind(), ValueKind::Integer);
    assert!(value.as_bytes().is_none());

    let value = Value::Bytes(Bytes::from_static(b"test"));
    assert_eq!(value.as_str(), Some("test"));
    assert!(value.as_integer().is_none());

    let value = Value::List(vec![]);
    assert!(value.as_list().is_some());
    assert!(value.as_dict().is_none());
    assert!(value.into_dict().is_none());
}

#[test]
fn test_error_display_includes_offset() {
    let err = decode(b"d1:bi2e1:ai1ee").unwrap_err();
    assert_eq!(err.to_string(), "dictionary key at offset 7 is out of order");
}

#[derive(Serialize)]
struct Peer {
    id: Bytes,
    ip: String,
    port: u16,
}

#[derive(Serialize)]
struct Announce {
    interval: u32,
    peers: Vec<Peer>,
    #[serde(rename = "warning message")]
    warning: Option<String>,
}

#[test]
fn test_to_bytes_struct() {
    let announce = Announce {
        interval: 60,
        peers: vec![Peer {
            id: Bytes::from_static(b"abc"),
            ip: "10.0.0.1".into(),
            port: 6881,
        }],
        warning: None,
    };

    assert_eq!(
        to_bytes(&announce).unwrap(),
        b"d8:intervali60e5:peersld2:id3:abc2:ip8:10.0.0.14:porti6881eeee".to_vec()
    );
}

#[test]
fn test_to_bytes_sorts_map_keys() {
    let mut map = HashMap::new();
    map.insert("zeta", 1);
    map.insert("alpha", 2);
    map.insert("mid", 3);
    assert_eq!(
        to_bytes(&map).unwrap(),
        b"d5:alphai2e3:midi3e4:zetai1ee".to_vec()
    );
}

#[test]
fn test_to_bytes_floats() {
    assert_eq!(to_bytes(&3.0f64).unwrap(), b"i3e".to_vec());
    assert_eq!(to_bytes(&-2.0f32).unwrap(), b"i-2e".to_vec());

    for bad in [1.5f64, f64::NAN, f64::INFINITY, 1e19] {
        let err = to_bytes(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}

#[test]
fn test_to_bytes_rejects_unrepresentable() {
    assert_eq!(to_bytes(&true).unwrap_err().kind(), ErrorKind::InvalidValue);
    assert_eq!(to_bytes(&()).unwrap_err().kind(), ErrorKind::InvalidValue);
    assert_eq!(to_bytes(&u64::MAX).unwrap_err().kind(), ErrorKind::InvalidValue);
    assert!(to_bytes(&Option::<i64>::None).is_err());
    assert!(to_bytes(&vec![Some(1), None]).is_err());

    let mut map = BTreeMap::new();
    map.insert(1, "one");
    assert!(to_bytes(&map).is_err());
}

#[derive(Serialize)]
enum Event {
    Started,
    Moved(i64),
    Renamed { from: String, to: String },
}

#[test]
fn test_to_bytes_enums() {
    assert_eq!(to_bytes(&Event::Started).unwrap(), b"7:Started".to_vec());
    assert_eq!(to_bytes(&Event::Moved(-3)).unwrap(), b"d5:Movedi-3ee".to_vec());
    assert_eq!(
        to_bytes(&Event::Renamed {
            from: "a".into(),
            to: "b".into()
        })
        .unwrap(),
        b"d7:Renamedd4:from1:a2:to1:bee".to_vec()
    );
}

#[test]
fn test_to_value_of_value_is_identity() {
    let value = decode(b"d4:listli1e3:abce3:numi-5ee").unwrap();
    assert_eq!(to_value(&value).unwrap(), value);
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::List),
            proptest::collection::btree_map(
                proptest::collection::vec(any::<u8>(), 0..8).prop_map(Bytes::from),
                inner,
                0..8,
            )
            .prop_map(Value::Dict),
        ]
    })
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(value in arb_value()) {
        let encoded = encode(&value);
        prop_assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn prop_encode_inverts_decode(value in arb_value()) {
        let encoded = encode(&value);
        let decoded = decode(&encoded).unwrap();
        prop_assert_eq!(encode(&decoded), encoded);
    }

    #[test]
    fn prop_integer_text_matches_display(n in any::<i64>()) {
        prop_assert_eq!(encode_integer(n), format!("i{}e", n).into_bytes());
    }

    #[test]
    fn prop_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        if let Ok(value) = decode(&data) {
            prop_assert_eq!(encode(&value), data);
        }
    }
}
