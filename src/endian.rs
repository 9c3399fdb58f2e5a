//! Fixed network-order wire primitives.
//!
//! Every multi-byte field in the AMQP 0-9-1 field-value grammar is
//! big-endian. The helpers here are free functions on purpose: composite
//! operations such as container length prefixes, the decimal mantissa slot
//! and timestamp seconds must never route through a decoder or encoder
//! entry point that a specialization could replace, otherwise a variant
//! that legitimately changes how it exposes, say, 32-bit integers would
//! silently disturb unrelated framing logic.
//!
//! Host byte order never leaks onto the wire: `byteorder::NetworkEndian`
//! resolves to a pass-through on big-endian hosts and a byte reversal
//! everywhere else, selected at compile time.

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, NetworkEndian, ReadBytesExt, WriteBytesExt};

use crate::{CodecError, Result};

fn eof_to_codec(err: io::Error, need: usize) -> CodecError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::UnexpectedEnd { need }
    } else {
        CodecError::Io(err)
    }
}

pub(crate) fn read_exact<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<()> {
    src.read_exact(buf).map_err(|e| eof_to_codec(e, buf.len()))
}

/// Most bytes a length-prefixed read will allocate before any payload has
/// actually arrived. A lying 32-bit prefix can still claim ~4 GiB, but the
/// buffer only grows as real input does.
const MAX_EAGER_ALLOC: usize = 64 * 1024;

/// Read exactly `len` bytes into a fresh buffer.
pub(crate) fn read_bytes<R: Read>(src: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(len.min(MAX_EAGER_ALLOC));
    let read = src
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut data)
        .map_err(CodecError::Io)?;
    if read < len {
        return Err(CodecError::UnexpectedEnd { need: len - read });
    }
    Ok(data)
}

pub(crate) fn read_u8<R: Read>(src: &mut R) -> Result<u8> {
    src.read_u8().map_err(|e| eof_to_codec(e, 1))
}

pub(crate) fn read_i8<R: Read>(src: &mut R) -> Result<i8> {
    src.read_i8().map_err(|e| eof_to_codec(e, 1))
}

pub(crate) fn read_u16<R: Read>(src: &mut R) -> Result<u16> {
    src.read_u16::<NetworkEndian>().map_err(|e| eof_to_codec(e, 2))
}

pub(crate) fn read_i16<R: Read>(src: &mut R) -> Result<i16> {
    src.read_i16::<NetworkEndian>().map_err(|e| eof_to_codec(e, 2))
}

pub(crate) fn read_u32<R: Read>(src: &mut R) -> Result<u32> {
    src.read_u32::<NetworkEndian>().map_err(|e| eof_to_codec(e, 4))
}

pub(crate) fn read_i32<R: Read>(src: &mut R) -> Result<i32> {
    src.read_i32::<NetworkEndian>().map_err(|e| eof_to_codec(e, 4))
}

pub(crate) fn read_u64<R: Read>(src: &mut R) -> Result<u64> {
    src.read_u64::<NetworkEndian>().map_err(|e| eof_to_codec(e, 8))
}

pub(crate) fn read_i64<R: Read>(src: &mut R) -> Result<i64> {
    src.read_i64::<NetworkEndian>().map_err(|e| eof_to_codec(e, 8))
}

pub(crate) fn read_f32<R: Read>(src: &mut R) -> Result<f32> {
    src.read_f32::<NetworkEndian>().map_err(|e| eof_to_codec(e, 4))
}

pub(crate) fn read_f64<R: Read>(src: &mut R) -> Result<f64> {
    src.read_f64::<NetworkEndian>().map_err(|e| eof_to_codec(e, 8))
}

pub(crate) fn write_u8<W: Write>(dst: &mut W, value: u8) -> Result<()> {
    Ok(dst.write_u8(value)?)
}

pub(crate) fn write_i8<W: Write>(dst: &mut W, value: i8) -> Result<()> {
    Ok(dst.write_i8(value)?)
}

pub(crate) fn write_u16<W: Write>(dst: &mut W, value: u16) -> Result<()> {
    Ok(dst.write_u16::<NetworkEndian>(value)?)
}

pub(crate) fn write_i16<W: Write>(dst: &mut W, value: i16) -> Result<()> {
    Ok(dst.write_i16::<NetworkEndian>(value)?)
}

pub(crate) fn write_u32<W: Write>(dst: &mut W, value: u32) -> Result<()> {
    Ok(dst.write_u32::<NetworkEndian>(value)?)
}

pub(crate) fn write_i32<W: Write>(dst: &mut W, value: i32) -> Result<()> {
    Ok(dst.write_i32::<NetworkEndian>(value)?)
}

pub(crate) fn write_u64<W: Write>(dst: &mut W, value: u64) -> Result<()> {
    Ok(dst.write_u64::<NetworkEndian>(value)?)
}

pub(crate) fn write_i64<W: Write>(dst: &mut W, value: i64) -> Result<()> {
    Ok(dst.write_i64::<NetworkEndian>(value)?)
}

pub(crate) fn write_f32<W: Write>(dst: &mut W, value: f32) -> Result<()> {
    Ok(dst.write_f32::<NetworkEndian>(value)?)
}

pub(crate) fn write_f64<W: Write>(dst: &mut W, value: f64) -> Result<()> {
    Ok(dst.write_f64::<NetworkEndian>(value)?)
}

/// Decode a big-endian u16 from the front of a borrowed window.
pub(crate) fn get_u16(buf: &[u8]) -> u16 {
    NetworkEndian::read_u16(buf)
}

pub(crate) fn get_i16(buf: &[u8]) -> i16 {
    NetworkEndian::read_i16(buf)
}

pub(crate) fn get_u32(buf: &[u8]) -> u32 {
    NetworkEndian::read_u32(buf)
}

pub(crate) fn get_i32(buf: &[u8]) -> i32 {
    NetworkEndian::read_i32(buf)
}

pub(crate) fn get_u64(buf: &[u8]) -> u64 {
    NetworkEndian::read_u64(buf)
}

pub(crate) fn get_i64(buf: &[u8]) -> i64 {
    NetworkEndian::read_i64(buf)
}

pub(crate) fn get_f32(buf: &[u8]) -> f32 {
    NetworkEndian::read_f32(buf)
}

pub(crate) fn get_f64(buf: &[u8]) -> f64 {
    NetworkEndian::read_f64(buf)
}

/// Overwrite four bytes in place with a big-endian u32.
///
/// Used by the write-then-patch container strategy to back-fill a length
/// field that was reserved before its payload was serialized.
pub(crate) fn put_u32_at(buf: &mut [u8], at: usize, value: u32) {
    NetworkEndian::write_u32(&mut buf[at..at + 4], value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_wire_bytes_are_network_order() {
        let mut wire = Vec::new();
        write_f32(&mut wire, 0.5f32).unwrap();
        assert_eq!(wire, [0x3f, 0x00, 0x00, 0x00]);
        assert_eq!(get_f32(&wire), 0.5f32);
    }

    #[test]
    fn u32_roundtrip_through_stream_and_slice() {
        let mut wire = Vec::new();
        write_u32(&mut wire, 0xdead_beef).unwrap();
        assert_eq!(wire, [0xde, 0xad, 0xbe, 0xef]);

        assert_eq!(read_u32(&mut wire.as_slice()).unwrap(), 0xdead_beef);
        assert_eq!(get_u32(&wire), 0xdead_beef);
    }

    #[test]
    fn truncated_read_reports_end_of_input() {
        let short = [0x00u8, 0x01];
        let err = read_u64(&mut short.as_ref()).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEnd { need: 8 }));
    }

    #[test]
    fn patching_overwrites_reserved_length_slot() {
        let mut buf = vec![0u8; 8];
        put_u32_at(&mut buf, 2, 0x0102_0304);
        assert_eq!(buf, [0, 0, 1, 2, 3, 4, 0, 0]);
    }
}
