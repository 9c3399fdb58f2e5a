//! # Zero-Copy Codec Pair
//!
//! ## Purpose
//!
//! In-memory counterparts of the stream codecs for callers that already
//! hold the complete wire bytes, or that assemble output into one buffer.
//!
//! [`SliceDecoder`] binds to a borrowed byte slice and hands container
//! payloads to the parser as sub-slices of the same backing memory, so
//! nesting costs cursor arithmetic instead of a copy per level. The stream
//! decoder has to materialize each container region before it can bound the
//! recursion; this one never does.
//!
//! [`BufEncoder`] appends to a `Vec<u8>` using write-then-patch containers:
//! a four-byte length slot is reserved, the payload is written in place,
//! and the slot is back-filled once the payload size is known. Output is
//! byte-identical to the stream encoder's stage-and-copy strategy.
//!
//! ## Specialization Boundary
//!
//! Only the container operations differ from the stream codecs. Primitive
//! payloads route through the same sealed `crate::endian` helpers and the
//! same shared validation in `super::encoder`, which is what keeps the two
//! tiers in byte agreement.

use std::time::{Duration, SystemTime};

use crate::endian;
use crate::field::encoder;
use crate::field::parser;
use crate::field::value::{Decimal, FieldTable, FieldValue, Signature};
use crate::{CodecError, Result, MAX_NESTING_DEPTH};

/// Field-value decoder over a borrowed byte slice.
///
/// The cursor only moves forward; a failed decode leaves it wherever the
/// failure was detected, so callers treating errors as fatal (all of the
/// parser does) never observe a half-consumed value.
pub struct SliceDecoder<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Container levels already entered above this decoder.
    depth: usize,
}

impl<'a> SliceDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_depth(buf, 0)
    }

    pub(crate) fn with_depth(buf: &'a [u8], depth: usize) -> Self {
        Self { buf, pos: 0, depth }
    }

    /// Byte offset of the cursor from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Advance past `n` bytes and return them as a window into the backing
    /// slice.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(CodecError::UnexpectedEnd { need: n })?;
        let window = &self.buf[self.pos..end];
        self.pos = end;
        Ok(window)
    }

    /// Decode one tagged value, advancing the cursor past it.
    pub fn decode_field_value(&mut self) -> Result<FieldValue> {
        let tag = self.take(1)?[0];
        let signature =
            Signature::try_from(tag).map_err(|_| CodecError::UnknownSignature(tag))?;

        match signature {
            Signature::Boolean => Ok(FieldValue::Boolean(self.decode_boolean()?)),
            Signature::Int8 => Ok(FieldValue::Int8(self.decode_i8()?)),
            Signature::UInt8 => Ok(FieldValue::UInt8(self.decode_u8()?)),
            Signature::Int16 => Ok(FieldValue::Int16(self.decode_i16()?)),
            Signature::UInt16 => Ok(FieldValue::UInt16(self.decode_u16()?)),
            Signature::Int32 => Ok(FieldValue::Int32(self.decode_i32()?)),
            Signature::UInt32 => Ok(FieldValue::UInt32(self.decode_u32()?)),
            Signature::Int64 => Ok(FieldValue::Int64(self.decode_i64()?)),
            Signature::UInt64 => Ok(FieldValue::UInt64(self.decode_u64()?)),
            Signature::Float32 => Ok(FieldValue::Float32(self.decode_f32()?)),
            Signature::Float64 => Ok(FieldValue::Float64(self.decode_f64()?)),
            Signature::Decimal => Ok(FieldValue::Decimal(self.decode_decimal()?)),
            Signature::ShortString => {
                Ok(FieldValue::ShortString(self.decode_short_string()?))
            }
            Signature::ByteString => Ok(FieldValue::ByteString(self.decode_byte_string()?)),
            Signature::Timestamp => Ok(FieldValue::Timestamp(self.decode_timestamp()?)),
            Signature::Array => Ok(FieldValue::Array(self.decode_array()?)),
            Signature::Table => Ok(FieldValue::Table(self.decode_table()?)),
            Signature::Void => Ok(FieldValue::Void),
        }
    }

    pub fn decode_boolean(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn decode_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn decode_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn decode_i16(&mut self) -> Result<i16> {
        Ok(endian::get_i16(self.take(2)?))
    }

    pub fn decode_u16(&mut self) -> Result<u16> {
        Ok(endian::get_u16(self.take(2)?))
    }

    pub fn decode_i32(&mut self) -> Result<i32> {
        Ok(endian::get_i32(self.take(4)?))
    }

    pub fn decode_u32(&mut self) -> Result<u32> {
        Ok(endian::get_u32(self.take(4)?))
    }

    pub fn decode_i64(&mut self) -> Result<i64> {
        Ok(endian::get_i64(self.take(8)?))
    }

    pub fn decode_u64(&mut self) -> Result<u64> {
        Ok(endian::get_u64(self.take(8)?))
    }

    pub fn decode_f32(&mut self) -> Result<f32> {
        Ok(endian::get_f32(self.take(4)?))
    }

    pub fn decode_f64(&mut self) -> Result<f64> {
        Ok(endian::get_f64(self.take(8)?))
    }

    /// Decode a short string straight out of the borrowed window, without
    /// the stream decoder's scratch copy.
    pub fn decode_short_string(&mut self) -> Result<String> {
        let len = self.take(1)?[0] as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn decode_byte_string(&mut self) -> Result<Vec<u8>> {
        let len = self.decode_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn decode_decimal(&mut self) -> Result<Decimal> {
        let scale = self.take(1)?[0];
        let mantissa = self.decode_i32()?;
        Ok(Decimal::new(mantissa < 0, mantissa.unsigned_abs(), scale))
    }

    pub fn decode_timestamp(&mut self) -> Result<SystemTime> {
        let seconds = self.decode_u64()?;
        SystemTime::UNIX_EPOCH
            .checked_add(Duration::from_secs(seconds))
            .ok_or(CodecError::TimestampOutOfRange { seconds })
    }

    /// Decode a field array by binding its declared region in place.
    pub fn decode_array(&mut self) -> Result<Vec<FieldValue>> {
        let region = self.container_region()?;
        parser::parse_array_region(region, self.depth + 1)
    }

    /// Decode a field table by binding its declared region in place.
    pub fn decode_table(&mut self) -> Result<FieldTable> {
        let region = self.container_region()?;
        parser::parse_table_region(region, self.depth + 1)
    }

    fn container_region(&mut self) -> Result<&'a [u8]> {
        let len = self.decode_u32()? as usize;
        self.take(len)
    }
}

/// Field-value encoder appending to a caller-owned buffer.
///
/// Container length prefixes are reserved up front and patched once their
/// payloads are in place, so nothing is serialized twice. A failed encode
/// may leave a partially written container in the buffer; callers that need
/// all-or-nothing output should truncate back to the length they started
/// from.
pub struct BufEncoder<'a> {
    buf: &'a mut Vec<u8>,
    /// Container levels already entered above this encoder.
    depth: usize,
}

impl<'a> BufEncoder<'a> {
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self::with_depth(buf, 0)
    }

    pub(crate) fn with_depth(buf: &'a mut Vec<u8>, depth: usize) -> Self {
        Self { buf, depth }
    }

    /// Append one tagged value: signature byte, then payload.
    pub fn encode_field_value(&mut self, value: &FieldValue) -> Result<()> {
        self.buf.push(value.signature() as u8);
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
        self.buf.push(value as u8);
        Ok(())
    }

    pub fn encode_i8(&mut self, value: i8) -> Result<()> {
        self.buf.push(value as u8);
        Ok(())
    }

    pub fn encode_u8(&mut self, value: u8) -> Result<()> {
        self.buf.push(value);
        Ok(())
    }

    pub fn encode_i16(&mut self, value: i16) -> Result<()> {
        endian::write_i16(&mut *self.buf, value)
    }

    pub fn encode_u16(&mut self, value: u16) -> Result<()> {
        endian::write_u16(&mut *self.buf, value)
    }

    pub fn encode_i32(&mut self, value: i32) -> Result<()> {
        endian::write_i32(&mut *self.buf, value)
    }

    pub fn encode_u32(&mut self, value: u32) -> Result<()> {
        endian::write_u32(&mut *self.buf, value)
    }

    pub fn encode_i64(&mut self, value: i64) -> Result<()> {
        endian::write_i64(&mut *self.buf, value)
    }

    pub fn encode_u64(&mut self, value: u64) -> Result<()> {
        endian::write_u64(&mut *self.buf, value)
    }

    pub fn encode_f32(&mut self, value: f32) -> Result<()> {
        endian::write_f32(&mut *self.buf, value)
    }

    pub fn encode_f64(&mut self, value: f64) -> Result<()> {
        endian::write_f64(&mut *self.buf, value)
    }

    pub fn encode_decimal(&mut self, value: Decimal) -> Result<()> {
        encoder::write_decimal(&mut *self.buf, value)
    }

    pub fn encode_short_string(&mut self, value: &str) -> Result<()> {
        encoder::write_short_string(&mut *self.buf, value)
    }

    pub fn encode_byte_string(&mut self, value: &[u8]) -> Result<()> {
        encoder::write_byte_string(&mut *self.buf, value)
    }

    pub fn encode_timestamp(&mut self, value: SystemTime) -> Result<()> {
        encoder::write_timestamp(&mut *self.buf, value)
    }

    /// Append a field array payload, patching its length prefix in place.
    pub fn encode_array(&mut self, items: &[FieldValue]) -> Result<()> {
        let slot = self.enter_container()?;
        self.depth += 1;
        let written = items.iter().try_for_each(|item| self.encode_field_value(item));
        self.depth -= 1;
        written?;
        self.patch_length(slot)
    }

    /// Append a field table payload, patching its length prefix in place.
    /// Duplicate keys are rejected mid-write; see the type docs on partial
    /// output after errors.
    pub fn encode_table<'e, I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'e str, &'e FieldValue)>,
    {
        let slot = self.enter_container()?;
        self.depth += 1;
        let written = encoder::write_table_entries(self, entries);
        self.depth -= 1;
        written?;
        self.patch_length(slot)
    }

    /// Reserve a zeroed length slot and account for the new nesting level.
    fn enter_container(&mut self) -> Result<usize> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(CodecError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        let slot = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        Ok(slot)
    }

    /// Back-fill a reserved length slot with the bytes written since it.
    fn patch_length(&mut self, slot: usize) -> Result<()> {
        let size = self.buf.len() - slot - 4;
        let len = u32::try_from(size).map_err(|_| CodecError::PayloadTooLarge { size })?;
        endian::put_u32_at(self.buf, slot, len);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_tracks_consumed_bytes() {
        let wire = [b'u', 0x12, 0x34, b'V'];
        let mut decoder = SliceDecoder::new(&wire);

        assert_eq!(decoder.decode_field_value().unwrap(), FieldValue::UInt16(0x1234));
        assert_eq!(decoder.position(), 3);
        assert_eq!(decoder.remaining(), 1);

        assert_eq!(decoder.decode_field_value().unwrap(), FieldValue::Void);
        assert!(decoder.is_at_end());
    }

    #[test]
    fn overrunning_the_slice_reports_end_of_input() {
        let wire = [b'I', 0x00, 0x01];
        let err = SliceDecoder::new(&wire).decode_field_value().unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEnd { need: 4 }));
    }

    #[test]
    fn container_length_is_patched_after_payload() {
        let mut wire = Vec::new();
        BufEncoder::new(&mut wire)
            .encode_array(&[FieldValue::Int8(-1), FieldValue::Boolean(true)])
            .unwrap();

        assert_eq!(wire, [0, 0, 0, 4, b'b', 0xff, b't', 1]);
    }

    #[test]
    fn nested_container_lengths_patch_inner_first() {
        let inner = FieldValue::Array(vec![FieldValue::UInt8(7)]);
        let mut wire = Vec::new();
        BufEncoder::new(&mut wire)
            .encode_field_value(&FieldValue::Array(vec![inner]))
            .unwrap();

        // Outer payload: 'A' + inner length + inner payload = 7 bytes.
        assert_eq!(
            wire,
            [b'A', 0, 0, 0, 7, b'A', 0, 0, 0, 2, b'B', 7]
        );
    }

    #[test]
    fn nesting_past_the_limit_is_rejected() {
        let mut value = FieldValue::Array(Vec::new());
        for _ in 0..MAX_NESTING_DEPTH {
            value = FieldValue::Array(vec![value]);
        }

        let mut wire = Vec::new();
        let err = BufEncoder::new(&mut wire)
            .encode_field_value(&value)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH
            }
        ));
    }
}
