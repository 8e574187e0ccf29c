//! Serialization of arbitrary Rust data into bencode.
//!
//! Data is first lowered into a [`Value`] tree, then encoded canonically, so
//! map and struct entries always come out sorted by key no matter what order
//! the `Serialize` impl produced them in.
//!
//! Mapping:
//! - Signed and unsigned integers become integers; unsigned values above
//!   `i64::MAX` are rejected.
//! - Floats are accepted only when finite and whole, and become integers.
//! - `str`, `char` and `serialize_bytes` data become byte strings. Note that
//!   `Vec<u8>` serializes as a sequence (a list of integers) unless wrapped in
//!   `bytes::Bytes` or similar.
//! - Sequences and tuples become lists; maps and structs become dictionaries.
//! - `None` is an absent value: struct fields and map entries holding it are
//!   left out. `None` anywhere else is an error.
//! - Unit variants become their name; other enum variants become a
//!   one-entry dictionary keyed by the variant name.
//! - `bool` and unit have no bencode form and are rejected.

use bytes::Bytes;
use serde::ser::{self, Impossible, Serialize};

use super::encode::encode;
use super::error::BencodeError;
use super::value::{Dict, Value};

/// Converts any `Serialize` value into a [`Value`] tree.
///
/// # Examples
///
/// ```
/// use bcanon::bencode::to_value;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Entry {
///     name: String,
///     size: u64,
///     note: Option<String>,
/// }
///
/// let value = to_value(&Entry { name: "a".into(), size: 3, note: None }).unwrap();
/// assert_eq!(value.get(b"size").and_then(|v| v.as_integer()), Some(3));
/// assert!(value.get(b"note").is_none());
/// ```
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, BencodeError> {
    value
        .serialize(ValueSerializer)?
        .ok_or_else(|| BencodeError::InvalidValue("absent value at top level".into()))
}

/// Serializes any `Serialize` value straight to canonical bencode bytes.
///
/// ```
/// use bcanon::bencode::to_bytes;
/// use std::collections::HashMap;
///
/// let mut map = HashMap::new();
/// map.insert("b", 2);
/// map.insert("a", 1);
/// assert_eq!(to_bytes(&map).unwrap(), b"d1:ai1e1:bi2ee");
///
/// assert!(to_bytes(&1.5f64).is_err());
/// ```
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, BencodeError> {
    to_value(value).map(|v| encode(&v))
}

impl Serialize for Value {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use ser::{SerializeMap, SerializeSeq};

        match self {
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(l) => {
                let mut seq = serializer.serialize_seq(Some(l.len()))?;
                for item in l {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(d) => {
                let mut map = serializer.serialize_map(Some(d.len()))?;
                for (key, val) in d {
                    map.serialize_entry(&RawBytes(key), val)?;
                }
                map.end()
            }
        }
    }
}

struct RawBytes<'a>(&'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

fn unsupported(what: &str) -> BencodeError {
    BencodeError::InvalidValue(format!("{} has no bencode representation", what))
}

fn absent_in(what: &str) -> BencodeError {
    BencodeError::InvalidValue(format!("absent value in {}", what))
}

/// `None` from this serializer means "absent".
type Slot = Option<Value>;

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Slot;
    type Error = BencodeError;
    type SerializeSeq = ListBuilder;
    type SerializeTuple = ListBuilder;
    type SerializeTupleStruct = ListBuilder;
    type SerializeTupleVariant = TupleVariantBuilder;
    type SerializeMap = DictBuilder;
    type SerializeStruct = DictBuilder;
    type SerializeStructVariant = StructVariantBuilder;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, _v: bool) -> Result<Slot, BencodeError> {
        Err(unsupported("bool"))
    }

    fn serialize_i8(self, v: i8) -> Result<Slot, BencodeError> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<Slot, BencodeError> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<Slot, BencodeError> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<Slot, BencodeError> {
        Ok(Some(Value::Integer(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Slot, BencodeError> {
        i64::try_from(v)
            .map(|v| Some(Value::Integer(v)))
            .map_err(|_| BencodeError::InvalidValue(format!("integer {} out of range", v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Slot, BencodeError> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u16(self, v: u16) -> Result<Slot, BencodeError> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u32(self, v: u32) -> Result<Slot, BencodeError> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u64(self, v: u64) -> Result<Slot, BencodeError> {
        i64::try_from(v)
            .map(|v| Some(Value::Integer(v)))
            .map_err(|_| BencodeError::InvalidValue(format!("integer {} out of range", v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Slot, BencodeError> {
        i64::try_from(v)
            .map(|v| Some(Value::Integer(v)))
            .map_err(|_| BencodeError::InvalidValue(format!("integer {} out of range", v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Slot, BencodeError> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<Slot, BencodeError> {
        // i64::MIN is exactly representable; i64::MAX rounds up to 2^63.
        const LOWER: f64 = -9_223_372_036_854_775_808.0;
        const UPPER: f64 = 9_223_372_036_854_775_808.0;

        if !v.is_finite() || v.fract() != 0.0 {
            return Err(BencodeError::InvalidValue(format!(
                "non-whole number {}",
                v
            )));
        }
        if !(LOWER..UPPER).contains(&v) {
            return Err(BencodeError::InvalidValue(format!("number {} out of range", v)));
        }
        Ok(Some(Value::Integer(v as i64)))
    }

    fn serialize_char(self, v: char) -> Result<Slot, BencodeError> {
        let mut buf = [0u8; 4];
        Ok(Some(Value::string(v.encode_utf8(&mut buf))))
    }

    fn serialize_str(self, v: &str) -> Result<Slot, BencodeError> {
        Ok(Some(Value::string(v)))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Slot, BencodeError> {
        Ok(Some(Value::Bytes(Bytes::copy_from_slice(v))))
    }

    fn serialize_none(self) -> Result<Slot, BencodeError> {
        Ok(None)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Slot, BencodeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Slot, BencodeError> {
        Err(unsupported("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Slot, BencodeError> {
        Err(unsupported(name))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Slot, BencodeError> {
        Ok(Some(Value::string(variant)))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Slot, BencodeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Slot, BencodeError> {
        let inner = value
            .serialize(ValueSerializer)?
            .ok_or_else(|| absent_in(variant))?;
        Ok(Some(single_entry(variant, inner)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ListBuilder, BencodeError> {
        Ok(ListBuilder {
            list: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<ListBuilder, BencodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<ListBuilder, BencodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<TupleVariantBuilder, BencodeError> {
        Ok(TupleVariantBuilder {
            variant,
            list: ListBuilder {
                list: Vec::with_capacity(len),
            },
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<DictBuilder, BencodeError> {
        Ok(DictBuilder::default())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<DictBuilder, BencodeError> {
        Ok(DictBuilder::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<StructVariantBuilder, BencodeError> {
        Ok(StructVariantBuilder {
            variant,
            dict: DictBuilder::default(),
        })
    }
}

fn single_entry(key: &'static str, value: Value) -> Value {
    let mut dict = Dict::new();
    dict.insert(Bytes::from_static(key.as_bytes()), value);
    Value::Dict(dict)
}

struct ListBuilder {
    list: Vec<Value>,
}

impl ListBuilder {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), BencodeError> {
        let value = value
            .serialize(ValueSerializer)?
            .ok_or_else(|| absent_in("list"))?;
        self.list.push(value);
        Ok(())
    }
}

impl ser::SerializeSeq for ListBuilder {
    type Ok = Slot;
    type Error = BencodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.push(value)
    }

    fn end(self) -> Result<Slot, BencodeError> {
        Ok(Some(Value::List(self.list)))
    }
}

impl ser::SerializeTuple for ListBuilder {
    type Ok = Slot;
    type Error = BencodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.push(value)
    }

    fn end(self) -> Result<Slot, BencodeError> {
        Ok(Some(Value::List(self.list)))
    }
}

impl ser::SerializeTupleStruct for ListBuilder {
    type Ok = Slot;
    type Error = BencodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.push(value)
    }

    fn end(self) -> Result<Slot, BencodeError> {
        Ok(Some(Value::List(self.list)))
    }
}

struct TupleVariantBuilder {
    variant: &'static str,
    list: ListBuilder,
}

impl ser::SerializeTupleVariant for TupleVariantBuilder {
    type Ok = Slot;
    type Error = BencodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.list.push(value)
    }

    fn end(self) -> Result<Slot, BencodeError> {
        Ok(Some(single_entry(self.variant, Value::List(self.list.list))))
    }
}

#[derive(Default)]
struct DictBuilder {
    dict: Dict,
    pending_key: Option<Bytes>,
}

impl DictBuilder {
    fn insert<T: Serialize + ?Sized>(&mut self, key: Bytes, value: &T) -> Result<(), BencodeError> {
        if let Some(value) = value.serialize(ValueSerializer)? {
            self.dict.insert(key, value);
        }
        Ok(())
    }
}

impl ser::SerializeMap for DictBuilder {
    type Ok = Slot;
    type Error = BencodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), BencodeError> {
        self.pending_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), BencodeError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| BencodeError::InvalidValue("map value without a key".into()))?;
        self.insert(key, value)
    }

    fn end(self) -> Result<Slot, BencodeError> {
        Ok(Some(Value::Dict(self.dict)))
    }
}

impl ser::SerializeStruct for DictBuilder {
    type Ok = Slot;
    type Error = BencodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), BencodeError> {
        self.insert(Bytes::from_static(key.as_bytes()), value)
    }

    fn end(self) -> Result<Slot, BencodeError> {
        Ok(Some(Value::Dict(self.dict)))
    }
}

struct StructVariantBuilder {
    variant: &'static str,
    dict: DictBuilder,
}

impl ser::SerializeStructVariant for StructVariantBuilder {
    type Ok = Slot;
    type Error = BencodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), BencodeError> {
        self.dict.insert(Bytes::from_static(key.as_bytes()), value)
    }

    fn end(self) -> Result<Slot, BencodeError> {
        Ok(Some(single_entry(self.variant, Value::Dict(self.dict.dict))))
    }
}

/// Accepts only string-like map keys.
struct KeySerializer;

fn key_error() -> BencodeError {
    BencodeError::InvalidValue("dictionary keys must be strings or bytes".into())
}

impl ser::Serializer for KeySerializer {
    type Ok = Bytes;
    type Error = BencodeError;
    type SerializeSeq = Impossible<Bytes, BencodeError>;
    type SerializeTuple = Impossible<Bytes, BencodeError>;
    type SerializeTupleStruct = Impossible<Bytes, BencodeError>;
    type SerializeTupleVariant = Impossible<Bytes, BencodeError>;
    type SerializeMap = Impossible<Bytes, BencodeError>;
    type SerializeStruct = Impossible<Bytes, BencodeError>;
    type SerializeStructVariant = Impossible<Bytes, BencodeError>;

    fn serialize_str(self, v: &str) -> Result<Bytes, BencodeError> {
        Ok(Bytes::copy_from_slice(v.as_bytes()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Bytes, BencodeError> {
        Ok(Bytes::copy_from_slice(v))
    }

    fn serialize_char(self, v: char) -> Result<Bytes, BencodeError> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Bytes, BencodeError> {
        Ok(Bytes::from_static(variant.as_bytes()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Bytes, BencodeError> {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_i8(self, _v: i8) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_i16(self, _v: i16) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_i32(self, _v: i32) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_i64(self, _v: i64) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_u8(self, _v: u8) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_u16(self, _v: u16) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_u32(self, _v: u32) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_u64(self, _v: u64) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_f32(self, _v: f32) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_f64(self, _v: f64) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_none(self) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_unit(self) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Bytes, BencodeError> {
        Err(key_error())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, BencodeError> {
        Err(key_error())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, BencodeError> {
        Err(key_error())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, BencodeError> {
        Err(key_error())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, BencodeError> {
        Err(key_error())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, BencodeError> {
        Err(key_error())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, BencodeError> {
        Err(key_error())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, BencodeError> {
        Err(key_error())
    }
}
