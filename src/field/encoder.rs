//! # Stream Value Encoder
//!
//! ## Purpose
//!
//! Sequential encoder over any `io::Write` sink, mirroring
//! [`super::decoder::ValueDecoder`] operation for operation. Containers use
//! the stage-and-copy strategy: the payload is serialized into a reusable
//! side buffer first, so its byte length is known before the length prefix
//! hits the sink. Sinks that cannot seek (sockets, compressors) therefore
//! still receive the prefix before the payload.
//!
//! The in-buffer encoder in [`super::zero_copy`] reaches the same bytes by
//! reserving the length slot and patching it afterwards; both strategies
//! are exercised against each other in the integration tests.
//!
//! ## Validation
//!
//! Encode is where value-range rules are enforced: short strings over 255
//! encoded bytes, decimals whose magnitude or scale cannot fit their wire
//! slots, instants before the Unix epoch and duplicate table keys all fail
//! before any payload byte reaches the sink. Inside a container nothing at
//! all reaches the sink, since the payload never left the stage buffer; at
//! top level [`ValueEncoder::encode_field_value`] has already emitted the
//! signature byte when payload validation runs, so a failed encode can
//! leave that one stray tag behind.

use std::collections::HashSet;
use std::io::Write;
use std::mem;
use std::time::SystemTime;

use crate::endian;
use crate::field::value::{Decimal, FieldValue};
use crate::field::zero_copy::BufEncoder;
use crate::{CodecError, Result, MAX_DECIMAL_MAGNITUDE, MAX_DECIMAL_SCALE, MAX_SHORT_STRING_LEN};

/// Sequential field-value encoder over a byte sink.
pub struct ValueEncoder<W> {
    sink: W,
    /// Container payloads are staged here before their length prefix is
    /// written; reused across calls.
    stage: Vec<u8>,
}

impl<W: Write> ValueEncoder<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            stage: Vec::with_capacity(256),
        }
    }

    /// Consume the encoder and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Append one tagged value: signature byte, then payload.
    pub fn encode_field_value(&mut self, value: &FieldValue) -> Result<()> {
        endian::write_u8(&mut self.sink, value.signature() as u8)?;
        match value {
            FieldValue::Boolean(v) => self.encode_boolean(*v),
            FieldValue::Int8(v) => self.encode_i8(*v),
            FieldValue::UInt8(v) => self.encode_u8(*v),
            FieldValue::Int16(v) => self.encode_i16(*v),
            FieldValue::UInt16(v) => self.encode_u16(*v),
            FieldValue::Int32(v) => self.encode_i32(*v),
            FieldValue::UInt32(v) => self.encode_u32(*v),
            FieldValue::Int64(v) => self.encode_i64(*v),
            FieldValue::UInt64(v) => self.encode_u64(*v),
            FieldValue::Float32(v) => self.encode_f32(*v),
            FieldValue::Float64(v) => self.encode_f64(*v),
            FieldValue::Decimal(v) => self.encode_decimal(*v),
            FieldValue::ShortString(v) => self.encode_short_string(v),
            FieldValue::ByteString(v) => self.encode_byte_string(v),
            FieldValue::Timestamp(v) => self.encode_timestamp(*v),
            FieldValue::Array(items) => self.encode_array(items),
            FieldValue::Table(table) => self.encode_table(table.iter()),
            FieldValue::Void => Ok(()),
        }
    }

    pub fn encode_boolean(&mut self, value: bool) -> Result<()> {
        endian::write_u8(&mut self.sink, value as u8)
    }

    pub fn encode_i8(&mut self, value: i8) -> Result<()> {
        endian::write_i8(&mut self.sink, value)
    }

    pub fn encode_u8(&mut self, value: u8) -> Result<()> {
        endian::write_u8(&mut self.sink, value)
    }

    pub fn encode_i16(&mut self, value: i16) -> Result<()> {
        endian::write_i16(&mut self.sink, value)
    }

    pub fn encode_u16(&mut self, value: u16) -> Result<()> {
        endian::write_u16(&mut self.sink, value)
    }

    pub fn encode_i32(&mut self, value: i32) -> Result<()> {
        endian::write_i32(&mut self.sink, value)
    }

    pub fn encode_u32(&mut self, value: u32) -> Result<()> {
        endian::write_u32(&mut self.sink, value)
    }

    pub fn encode_i64(&mut self, value: i64) -> Result<()> {
        endian::write_i64(&mut self.sink, value)
    }

    pub fn encode_u64(&mut self, value: u64) -> Result<()> {
        endian::write_u64(&mut self.sink, value)
    }

    pub fn encode_f32(&mut self, value: f32) -> Result<()> {
        endian::write_f32(&mut self.sink, value)
    }

    pub fn encode_f64(&mut self, value: f64) -> Result<()> {
        endian::write_f64(&mut self.sink, value)
    }

    pub fn encode_decimal(&mut self, value: Decimal) -> Result<()> {
        write_decimal(&mut self.sink, value)
    }

    pub fn encode_short_string(&mut self, value: &str) -> Result<()> {
        write_short_string(&mut self.sink, value)
    }

    pub fn encode_byte_string(&mut self, value: &[u8]) -> Result<()> {
        write_byte_string(&mut self.sink, value)
    }

    pub fn encode_timestamp(&mut self, value: SystemTime) -> Result<()> {
        write_timestamp(&mut self.sink, value)
    }

    /// Append a field array payload: length prefix, then tagged elements.
    pub fn encode_array(&mut self, items: &[FieldValue]) -> Result<()> {
        self.encode_container(|staged| {
            items.iter().try_for_each(|item| staged.encode_field_value(item))
        })
    }

    /// Append a field table payload: length prefix, then (name, value) pairs
    /// in iteration order. Duplicate keys are rejected before any byte of
    /// the table reaches the sink.
    pub fn encode_table<'e, I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'e str, &'e FieldValue)>,
    {
        self.encode_container(|staged| write_table_entries(staged, entries))
    }

    /// Stage a container payload, then emit length prefix plus payload.
    ///
    /// The stage buffer is detached while the closure runs so the closure
    /// can hold a `BufEncoder` over it, and reattached on every path out.
    fn encode_container<F>(&mut self, fill: F) -> Result<()>
    where
        F: FnOnce(&mut BufEncoder<'_>) -> Result<()>,
    {
        let mut stage = mem::take(&mut self.stage);
        stage.clear();

        let filled = {
            let mut staged = BufEncoder::with_depth(&mut stage, 1);
            fill(&mut staged)
        };
        let result = filled.and_then(|_| {
            let size = stage.len();
            let len = u32::try_from(size).map_err(|_| CodecError::PayloadTooLarge { size })?;
            endian::write_u32(&mut self.sink, len)?;
            self.sink.write_all(&stage)?;
            Ok(())
        });

        self.stage = stage;
        result
    }
}

/// 1-byte length prefix plus raw UTF-8; fails if the encoded form exceeds
/// 255 bytes.
pub(crate) fn write_short_string<W: Write>(dst: &mut W, value: &str) -> Result<()> {
    let len = value.len();
    if len > MAX_SHORT_STRING_LEN {
        return Err(CodecError::StringTooLong { len });
    }
    endian::write_u8(dst, len as u8)?;
    Ok(dst.write_all(value.as_bytes())?)
}

/// 4-byte length prefix plus raw bytes.
pub(crate) fn write_byte_string<W: Write>(dst: &mut W, value: &[u8]) -> Result<()> {
    let size = value.len();
    let len = u32::try_from(size).map_err(|_| CodecError::PayloadTooLarge { size })?;
    endian::write_u32(dst, len)?;
    Ok(dst.write_all(value)?)
}

/// Scale byte plus signed mantissa; the sign lives in the mantissa's
/// two's-complement representation so a decode of these bytes recovers the
/// same (sign, magnitude) pair.
pub(crate) fn write_decimal<W: Write>(dst: &mut W, value: Decimal) -> Result<()> {
    if value.magnitude() > MAX_DECIMAL_MAGNITUDE || value.scale() > MAX_DECIMAL_SCALE {
        return Err(CodecError::DecimalOutOfBounds {
            magnitude: value.magnitude(),
            scale: value.scale(),
        });
    }

    endian::write_u8(dst, value.scale())?;
    let mantissa = value.magnitude() as i32;
    endian::write_i32(dst, if value.is_negative() { -mantissa } else { mantissa })
}

/// 8-byte unsigned POSIX seconds; sub-second precision truncates.
pub(crate) fn write_timestamp<W: Write>(dst: &mut W, value: SystemTime) -> Result<()> {
    let seconds = value
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|_| CodecError::TimeBeforeEpoch)?
        .as_secs();
    endian::write_u64(dst, seconds)
}

/// Serialize table entries through a staged or in-place container encoder,
/// enforcing key uniqueness across the whole iteration.
pub(crate) fn write_table_entries<'e, I>(staged: &mut BufEncoder<'_>, entries: I) -> Result<()>
where
    I: IntoIterator<Item = (&'e str, &'e FieldValue)>,
{
    let mut seen = HashSet::new();
    for (key, value) in entries {
        if !seen.insert(key) {
            return Err(CodecError::DuplicateKey(key.to_owned()));
        }
        staged.encode_short_string(key)?;
        staged.encode_field_value(value)?;
    }
    Ok(())
}
