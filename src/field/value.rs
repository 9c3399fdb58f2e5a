//! # Field-Value Model
//!
//! ## Purpose
//!
//! The closed tagged union of AMQP 0-9-1 field-value variants together with
//! the signature-byte mapping shared by encode and decode. Encoding takes a
//! `&FieldValue` and branches on the variant, so there is no runtime type
//! inspection anywhere in the codec: a value either is one of these
//! eighteen shapes or it cannot be constructed at all.
//!
//! ## Lifecycle
//!
//! A `FieldValue` is built fresh by each decode and never mutated after.
//! Encode borrows the value read-only and retains nothing. Container
//! elements are owned by their parent container for its lifetime.

use std::time::SystemTime;

use num_enum::TryFromPrimitive;

use crate::{CodecError, Result};

/// Wire signature bytes, one per field-value variant.
///
/// The discriminants are the literal tag octets; an unrecognized octet
/// fails `try_from` and surfaces as [`CodecError::UnknownSignature`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum Signature {
    Boolean = b't',
    Int8 = b'b',
    UInt8 = b'B',
    Int16 = b'U',
    UInt16 = b'u',
    Int32 = b'I',
    UInt32 = b'i',
    Int64 = b'L',
    UInt64 = b'l',
    Float32 = b'f',
    Float64 = b'd',
    Decimal = b'D',
    ShortString = b's',
    ByteString = b'S',
    Timestamp = b'T',
    Array = b'A',
    Table = b'F',
    Void = b'V',
}

/// One AMQP 0-9-1 field value.
///
/// `Timestamp` always carries a UTC instant at whole-second precision;
/// `ShortString` is limited to 255 encoded UTF-8 bytes at encode time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum FieldValue {
    Boolean(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    ShortString(String),
    ByteString(Vec<u8>),
    Timestamp(SystemTime),
    Array(Vec<FieldValue>),
    Table(FieldTable),
    Void,
}

impl FieldValue {
    /// Signature byte this variant carries on the wire.
    pub fn signature(&self) -> Signature {
        match self {
            FieldValue::Boolean(_) => Signature::Boolean,
            FieldValue::Int8(_) => Signature::Int8,
            FieldValue::UInt8(_) => Signature::UInt8,
            FieldValue::Int16(_) => Signature::Int16,
            FieldValue::UInt16(_) => Signature::UInt16,
            FieldValue::Int32(_) => Signature::Int32,
            FieldValue::UInt32(_) => Signature::UInt32,
            FieldValue::Int64(_) => Signature::Int64,
            FieldValue::UInt64(_) => Signature::UInt64,
            FieldValue::Float32(_) => Signature::Float32,
            FieldValue::Float64(_) => Signature::Float64,
            FieldValue::Decimal(_) => Signature::Decimal,
            FieldValue::ShortString(_) => Signature::ShortString,
            FieldValue::ByteString(_) => Signature::ByteString,
            FieldValue::Timestamp(_) => Signature::Timestamp,
            FieldValue::Array(_) => Signature::Array,
            FieldValue::Table(_) => Signature::Table,
            FieldValue::Void => Signature::Void,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<i8> for FieldValue {
    fn from(v: i8) -> Self {
        FieldValue::Int8(v)
    }
}

impl From<u8> for FieldValue {
    fn from(v: u8) -> Self {
        FieldValue::UInt8(v)
    }
}

impl From<i16> for FieldValue {
    fn from(v: i16) -> Self {
        FieldValue::Int16(v)
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::UInt16(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int32(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::UInt32(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int64(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInt64(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float32(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float64(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::ShortString(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::ShortString(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::ByteString(v)
    }
}

impl From<SystemTime> for FieldValue {
    fn from(v: SystemTime) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(v: Vec<FieldValue>) -> Self {
        FieldValue::Array(v)
    }
}

impl From<FieldTable> for FieldValue {
    fn from(v: FieldTable) -> Self {
        FieldValue::Table(v)
    }
}

/// Exact decimal value `sign * magnitude * 10^-scale`.
///
/// The wire slot is one scale byte plus a signed 32-bit mantissa, so the
/// magnitude must fit in 31 bits and the scale in 7; both are validated at
/// encode time, not on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Decimal {
    negative: bool,
    magnitude: u32,
    scale: u8,
}

impl Decimal {
    pub fn new(negative: bool, magnitude: u32, scale: u8) -> Self {
        Self {
            negative,
            magnitude,
            scale,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }
}

/// Insertion-ordered field table with unique short-string keys.
///
/// Entries encode in insertion order, which keeps table output
/// deterministic. Equality deliberately ignores order: two tables are equal
/// when they hold the same set of (key, value) pairs, so a decoded table
/// compares equal to the one that produced it no matter how the peer chose
/// to order the wire bytes.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct FieldTable {
    entries: Vec<(String, FieldValue)>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a (key, value) entry, rejecting duplicate keys.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Result<()> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(CodecError::DuplicateKey(key));
        }
        self.entries.push((key, value));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion (and therefore encode) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for FieldTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl<'a> IntoIterator for &'a FieldTable {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, FieldValue)>,
        fn(&'a (String, FieldValue)) -> (&'a String, &'a FieldValue),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn pair(entry: &(String, FieldValue)) -> (&String, &FieldValue) {
            (&entry.0, &entry.1)
        }
        self.entries
            .iter()
            .map(pair as fn(&'a (String, FieldValue)) -> (&'a String, &'a FieldValue))
    }
}
