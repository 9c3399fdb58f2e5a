//! Field-value codec: model, decoders, encoders and the container parser.
//!
//! The split mirrors the wire format's two-tier structure. Primitive values
//! are fixed-width or length-prefixed scalars and decode in one step; the
//! container kinds (array `A`, table `F`) declare a payload byte length and
//! are parsed by recursing over exactly that region. The stream codecs
//! ([`ValueDecoder`], [`ValueEncoder`]) work against arbitrary `io` sources
//! and sinks; the zero-copy pair ([`SliceDecoder`], [`BufEncoder`]) bind to
//! a shared backing buffer and specialize only the container operations -
//! every primitive path is byte-for-byte the same code in both tiers.

pub mod decoder;
pub mod encoder;
pub mod parser;
pub mod value;
pub mod zero_copy;

pub use decoder::ValueDecoder;
pub use encoder::ValueEncoder;
pub use parser::{decode_array, decode_table};
pub use value::{Decimal, FieldTable, FieldValue, Signature};
pub use zero_copy::{BufEncoder, SliceDecoder};
