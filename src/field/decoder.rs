//! # Stream Value Decoder
//!
//! ## Purpose
//!
//! Sequential, stateful decoder over any `io::Read` source. Each call to
//! [`ValueDecoder::decode_field_value`] consumes one signature byte,
//! dispatches to the matching payload routine and leaves the cursor exactly
//! past the decoded value, recursing through the container parser for
//! nested arrays and tables.
//!
//! ## Dispatch Safety
//!
//! Composite routines (container length prefixes, the decimal mantissa,
//! timestamp seconds) read their fixed-width integers through the sealed
//! helpers in `crate::endian` rather than through any decoder method. The
//! zero-copy specialization in [`super::zero_copy`] replaces only the
//! container operations, and this separation guarantees it can never alter
//! the framing arithmetic of operations it did not intend to touch.
//!
//! ## Failure Modes
//!
//! An unknown signature byte, a source that ends before a declared length
//! is satisfied, and a container payload that does not consume its declared
//! region exactly are all fatal for the value being decoded and propagate
//! to the caller untouched. The scratch buffer remains valid for the next,
//! unrelated call.

use std::io::Read;
use std::time::{Duration, SystemTime};

use crate::endian;
use crate::field::parser;
use crate::field::value::{Decimal, FieldTable, FieldValue, Signature};
use crate::{CodecError, Result, MAX_SHORT_STRING_LEN};

/// Sequential field-value decoder over a byte source.
pub struct ValueDecoder<R> {
    src: R,
    /// Scratch for short-string payloads, grown once and reused across
    /// calls.
    strbuf: Vec<u8>,
}

impl<R: Read> ValueDecoder<R> {
    pub fn new(src: R) -> Self {
        Self {
            src,
            strbuf: Vec::new(),
        }
    }

    /// Consume the decoder and return the underlying source.
    pub fn into_inner(self) -> R {
        self.src
    }

    /// Decode one tagged value, advancing the source past it.
    pub fn decode_field_value(&mut self) -> Result<FieldValue> {
        self.decode_value(0)
    }

    fn decode_value(&mut self, depth: usize) -> Result<FieldValue> {
        let tag = endian::read_u8(&mut self.src)?;
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
            Signature::Array => Ok(FieldValue::Array(self.decode_array_nested(depth)?)),
            Signature::Table => Ok(FieldValue::Table(self.decode_table_nested(depth)?)),
            Signature::Void => Ok(FieldValue::Void),
        }
    }

    pub fn decode_boolean(&mut self) -> Result<bool> {
        Ok(endian::read_u8(&mut self.src)? != 0)
    }

    pub fn decode_i8(&mut self) -> Result<i8> {
        endian::read_i8(&mut self.src)
    }

    pub fn decode_u8(&mut self) -> Result<u8> {
        endian::read_u8(&mut self.src)
    }

    pub fn decode_i16(&mut self) -> Result<i16> {
        endian::read_i16(&mut self.src)
    }

    pub fn decode_u16(&mut self) -> Result<u16> {
        endian::read_u16(&mut self.src)
    }

    pub fn decode_i32(&mut self) -> Result<i32> {
        endian::read_i32(&mut self.src)
    }

    pub fn decode_u32(&mut self) -> Result<u32> {
        endian::read_u32(&mut self.src)
    }

    pub fn decode_i64(&mut self) -> Result<i64> {
        endian::read_i64(&mut self.src)
    }

    pub fn decode_u64(&mut self) -> Result<u64> {
        endian::read_u64(&mut self.src)
    }

    pub fn decode_f32(&mut self) -> Result<f32> {
        endian::read_f32(&mut self.src)
    }

    pub fn decode_f64(&mut self) -> Result<f64> {
        endian::read_f64(&mut self.src)
    }

    /// Decode a 1-byte-length-prefixed UTF-8 string.
    ///
    /// The length prefix counts bytes, not characters. Invalid UTF-8 decodes
    /// lossily (U+FFFD replacement) rather than failing, so a peer's sloppy
    /// header never poisons an otherwise well-framed value.
    pub fn decode_short_string(&mut self) -> Result<String> {
        let len = endian::read_u8(&mut self.src)? as usize;
        if len == 0 {
            return Ok(String::new());
        }

        if self.strbuf.is_empty() {
            self.strbuf.resize(MAX_SHORT_STRING_LEN, 0);
        }
        endian::read_exact(&mut self.src, &mut self.strbuf[..len])?;

        Ok(String::from_utf8_lossy(&self.strbuf[..len]).into_owned())
    }

    /// Decode a 4-byte-length-prefixed byte string (AMQP "long string").
    pub fn decode_byte_string(&mut self) -> Result<Vec<u8>> {
        let len = endian::read_u32(&mut self.src)? as usize;
        endian::read_bytes(&mut self.src, len)
    }

    /// Decode a scale byte plus signed 32-bit mantissa.
    pub fn decode_decimal(&mut self) -> Result<Decimal> {
        let scale = endian::read_u8(&mut self.src)?;
        let mantissa = endian::read_i32(&mut self.src)?;
        Ok(Decimal::new(mantissa < 0, mantissa.unsigned_abs(), scale))
    }

    /// Decode 8-byte unsigned POSIX seconds into a UTC instant.
    pub fn decode_timestamp(&mut self) -> Result<SystemTime> {
        let seconds = endian::read_u64(&mut self.src)?;
        SystemTime::UNIX_EPOCH
            .checked_add(Duration::from_secs(seconds))
            .ok_or(CodecError::TimestampOutOfRange { seconds })
    }

    /// Decode a length-prefixed field array.
    pub fn decode_array(&mut self) -> Result<Vec<FieldValue>> {
        self.decode_array_nested(0)
    }

    /// Decode a length-prefixed field table.
    pub fn decode_table(&mut self) -> Result<FieldTable> {
        self.decode_table_nested(0)
    }

    fn decode_array_nested(&mut self, depth: usize) -> Result<Vec<FieldValue>> {
        let region = self.read_container_region()?;
        parser::parse_array_region(&region, depth + 1)
    }

    fn decode_table_nested(&mut self, depth: usize) -> Result<FieldTable> {
        let region = self.read_container_region()?;
        parser::parse_table_region(&region, depth + 1)
    }

    /// Pull a container's declared payload off the stream in one read.
    ///
    /// The stream path has to copy here: the region's bounds only become
    /// known after reading the length prefix, and parsing needs random
    /// access within them. `SliceDecoder` skips this copy entirely.
    fn read_container_region(&mut self) -> Result<Vec<u8>> {
        let len = endian::read_u32(&mut self.src)? as usize;
        endian::read_bytes(&mut self.src, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(wire: &[u8]) -> Result<FieldValue> {
        ValueDecoder::new(wire).decode_field_value()
    }

    #[test]
    fn boolean_false_and_true() {
        assert_eq!(decode_one(&[b't', 0]).unwrap(), FieldValue::Boolean(false));
        for nonzero in [1u8, 2, 127, 128, 255] {
            assert_eq!(
                decode_one(&[b't', nonzero]).unwrap(),
                FieldValue::Boolean(true)
            );
        }
    }

    #[test]
    fn fixed_width_integers_are_big_endian() {
        assert_eq!(
            decode_one(&[b'U', 0xff, 0xfe]).unwrap(),
            FieldValue::Int16(-2)
        );
        assert_eq!(
            decode_one(&[b'i', 0x00, 0x00, 0x01, 0x00]).unwrap(),
            FieldValue::UInt32(256)
        );
        assert_eq!(
            decode_one(&[b'L', 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap(),
            FieldValue::Int64(-1)
        );
    }

    #[test]
    fn float_decodes_bit_exact() {
        assert_eq!(
            decode_one(&[b'f', 0x3f, 0x00, 0x00, 0x00]).unwrap(),
            FieldValue::Float32(0.5)
        );
        assert_eq!(
            decode_one(&[b'd', 0xbe, 0xef, 0xff, 0xe0, 0x00, 0x1f, 0xff, 0xe0]).unwrap(),
            FieldValue::Float64(-1.0 / 65537.0)
        );
    }

    #[test]
    fn short_string_counts_bytes_not_chars() {
        let wire = [b's', 4, 0xf0, 0x9f, 0x98, 0x84];
        assert_eq!(
            decode_one(&wire).unwrap(),
            FieldValue::ShortString("\u{1f604}".into())
        );

        assert_eq!(
            decode_one(&[b's', 0]).unwrap(),
            FieldValue::ShortString(String::new())
        );
    }

    #[test]
    fn scratch_buffer_survives_across_calls() {
        let wire = [b's', 3, b'a', b'b', b'c', b's', 2, b'x', b'y'];
        let mut decoder = ValueDecoder::new(wire.as_slice());

        assert_eq!(
            decoder.decode_field_value().unwrap(),
            FieldValue::ShortString("abc".into())
        );
        assert_eq!(
            decoder.decode_field_value().unwrap(),
            FieldValue::ShortString("xy".into())
        );
    }

    #[test]
    fn decimal_sign_comes_from_mantissa() {
        let positive = decode_one(&[b'D', 2, 0x00, 0x00, 0x30, 0x39]).unwrap();
        assert_eq!(
            positive,
            FieldValue::Decimal(Decimal::new(false, 12345, 2))
        );

        let negative = decode_one(&[b'D', 2, 0xff, 0xff, 0xcf, 0xc7]).unwrap();
        assert_eq!(negative, FieldValue::Decimal(Decimal::new(true, 12345, 2)));
    }

    #[test]
    fn timestamp_zero_is_the_epoch() {
        assert_eq!(
            decode_one(&[b'T', 0, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            FieldValue::Timestamp(SystemTime::UNIX_EPOCH)
        );

        let end_of_9999 = decode_one(&[b'T', 0x00, 0x00, 0x00, 0x3a, 0xff, 0xf4, 0x41, 0x7f])
            .unwrap();
        assert_eq!(
            end_of_9999,
            FieldValue::Timestamp(
                SystemTime::UNIX_EPOCH + Duration::from_secs(253_402_300_799)
            )
        );
    }

    #[test]
    fn huge_declared_length_fails_on_the_missing_bytes() {
        // A lying length prefix must not cost a multi-gigabyte allocation
        // up front; the decode fails once the input actually runs out.
        let wire = [b'S', 0x7f, 0xff, 0xff, 0xff, b'a', b'b'];
        let err = decode_one(&wire).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnexpectedEnd { need } if need == 0x7fff_ffff - 2
        ));

        let wire = [b'F', 0xff, 0xff, 0xff, 0xff];
        let err = decode_one(&wire).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnexpectedEnd { need } if need == u32::MAX as usize
        ));
    }

    #[test]
    fn unknown_signature_is_fatal() {
        let err = decode_one(&[b'x', 0]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownSignature(0x78)));
    }

    #[test]
    fn truncated_payload_reports_end_of_input() {
        let err = decode_one(&[b'I', 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEnd { .. }));

        let err = decode_one(&[b's', 5, b'a', b'b']).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEnd { .. }));
    }
}
