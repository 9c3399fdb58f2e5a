//! # AMQP 0-9-1 Field-Value Codec
//!
//! Binary codec for the AMQP 0-9-1 "field value" wire format: the tagged,
//! recursively-composable type system carried inside method arguments,
//! message headers and application properties. The crate translates between
//! an in-memory [`FieldValue`] and its exact big-endian byte representation,
//! in both directions, including the length-prefixed container kinds
//! (field arrays and field tables).
//!
//! ## API Surface
//!
//! - **Value model**: [`FieldValue`], [`Decimal`], [`FieldTable`],
//!   [`Signature`] - the closed set of wire variants and their tag bytes
//! - **Decoding**: [`decode_field_value()`] over any `io::Read`, or
//!   [`decode_array()`] / [`decode_table()`] when a raw payload region is
//!   already in hand
//! - **Encoding**: [`encode_field_value()`] over any `io::Write`, or
//!   [`encode_field_value_into()`] to append directly to a byte buffer
//!   without staging copies
//! - **Stateful codecs**: [`ValueDecoder`] / [`ValueEncoder`] for stream
//!   sources and sinks, [`SliceDecoder`] / [`BufEncoder`] for the zero-copy
//!   in-memory paths
//!
//! ## Wire Format
//!
//! Every value is one signature byte followed by its payload; all multi-byte
//! fields are network order with no padding:
//!
//! | Tag | Variant | Payload |
//! |-----|---------|---------|
//! | `t` | Boolean | 1 byte, 0 = false |
//! | `b`/`B` | Int8 / UInt8 | 1 byte |
//! | `U`/`u` | Int16 / UInt16 | 2 bytes |
//! | `I`/`i` | Int32 / UInt32 | 4 bytes |
//! | `L`/`l` | Int64 / UInt64 | 8 bytes |
//! | `f`/`d` | Float32 / Float64 | IEEE-754, 4/8 bytes |
//! | `D` | Decimal | scale byte + signed 32-bit mantissa |
//! | `s` | ShortString | 1-byte length + UTF-8 bytes (max 255) |
//! | `S` | ByteString | 4-byte length + raw bytes |
//! | `T` | Timestamp | 8-byte unsigned POSIX seconds |
//! | `A` | Array | 4-byte payload byte-length + values |
//! | `F` | Table | 4-byte payload byte-length + (name, value) pairs |
//! | `V` | Void | none |
//!
//! Containers are framed by payload **byte length**, not element count: the
//! decoder keeps pulling values until the declared region is exhausted, and
//! a value that crosses the declared end is structural corruption.
//!
//! ## Quick Start
//!
//! ```rust
//! use amqp091_codec::{FieldTable, FieldValue};
//!
//! let mut headers = FieldTable::new();
//! headers.insert("delivery-mode", FieldValue::UInt8(2))?;
//! headers.insert("app-id", FieldValue::ShortString("billing".into()))?;
//!
//! let mut wire = Vec::new();
//! amqp091_codec::encode_field_value(&mut wire, &FieldValue::Table(headers))?;
//!
//! let decoded = amqp091_codec::decode_field_value(&mut wire.as_slice())?;
//! assert!(matches!(decoded, FieldValue::Table(_)));
//! # Ok::<(), amqp091_codec::CodecError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`field::value`] - tagged-union value model and signature dispatch table
//! - [`field::decoder`] - sequential stream decoder
//! - [`field::encoder`] - stream encoder (stage-and-copy containers)
//! - [`field::zero_copy`] - slice-bound decoder and in-buffer encoder
//!   (write-then-patch containers)
//! - [`field::parser`] - container parser driving the zero-copy decoder over
//!   a bounded region
//!
//! The two encoder strategies produce byte-identical output; the zero-copy
//! pair exists purely to avoid copies when the bounds of a nested payload
//! are already known.
//!
//! ## Scope
//!
//! This crate guarantees wire-format correctness of the value representation
//! only. Framing complete methods over a socket, connection and channel
//! lifecycle, and broker semantics all live above it and merely consume the
//! decode/encode entry points.

use std::io::{Read, Write};

use thiserror::Error;

pub mod field;

mod endian;

pub use field::{
    decode_array, decode_table, BufEncoder, Decimal, FieldTable, FieldValue, Signature,
    SliceDecoder, ValueDecoder, ValueEncoder,
};

/// Longest permitted short string, in encoded UTF-8 bytes.
pub const MAX_SHORT_STRING_LEN: usize = 255;

/// Largest decimal scale the one-byte scale field accepts.
pub const MAX_DECIMAL_SCALE: u8 = 127;

/// Largest decimal mantissa magnitude (31 bits; the sign occupies the top
/// bit of the 32-bit wire slot).
pub const MAX_DECIMAL_MAGNITUDE: u32 = i32::MAX as u32;

/// Deepest container nesting accepted by either direction of the codec.
///
/// The wire format itself places no bound on nesting, so unbounded input
/// could otherwise recurse until the call stack is exhausted.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown field signature: 0x{0:02x}")]
    UnknownSignature(u8),

    #[error("unexpected end of input: {need} more byte(s) required")]
    UnexpectedEnd { need: usize },

    #[error("container payload overruns its declared length: declared {declared} bytes, value at offset {offset} crossed the end")]
    StructuralCorruption { declared: usize, offset: usize },

    #[error("short string is {len} bytes encoded (max 255)")]
    StringTooLong { len: usize },

    #[error("decimal out of wire bounds: magnitude {magnitude}, scale {scale}")]
    DecimalOutOfBounds { magnitude: u32, scale: u8 },

    #[error("timestamp predates the Unix epoch")]
    TimeBeforeEpoch,

    #[error("timestamp of {seconds} seconds past the epoch is not representable")]
    TimestampOutOfRange { seconds: u64 },

    #[error("payload of {size} bytes exceeds the 32-bit length field")]
    PayloadTooLarge { size: usize },

    #[error("duplicate table key: {0:?}")]
    DuplicateKey(String),

    #[error("container nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Decode exactly one tagged field value, advancing the source past it.
///
/// Convenience wrapper around [`ValueDecoder`] for one-shot decodes; callers
/// decoding many values from the same source should hold a `ValueDecoder`
/// so its short-string scratch buffer is reused across calls.
pub fn decode_field_value<R: Read>(src: &mut R) -> Result<FieldValue> {
    ValueDecoder::new(src).decode_field_value()
}

/// Append exactly one tagged field value's wire bytes to the sink.
pub fn encode_field_value<W: Write>(sink: &mut W, value: &FieldValue) -> Result<()> {
    ValueEncoder::new(sink).encode_field_value(value)
}

/// Append exactly one tagged field value directly to a byte buffer.
///
/// Output is byte-identical to [`encode_field_value()`], but containers are
/// written in place with their length patched afterwards instead of being
/// staged in a side buffer first.
pub fn encode_field_value_into(buf: &mut Vec<u8>, value: &FieldValue) -> Result<()> {
    BufEncoder::new(buf).encode_field_value(value)
}
