//! # Container Parser
//!
//! ## Purpose
//!
//! Drives a [`SliceDecoder`] over the declared payload region of an array
//! or table. Containers are framed by byte length, not element count, so
//! parsing is "decode values until the region is exhausted": finishing
//! exactly at the boundary is the only success condition.
//!
//! ## Corruption Mapping
//!
//! A value whose payload crosses the declared end would surface from the
//! slice decoder as a plain end-of-input error, but at this layer the
//! region bound is authoritative: the input did not end, the length prefix
//! lied. Such failures are remapped to
//! [`CodecError::StructuralCorruption`] carrying the declared size and the
//! offset of the offending value, which is what a diagnosing operator
//! actually needs.
//!
//! ## Recursion Budget
//!
//! Every region entered here counts one nesting level; crossing
//! [`MAX_NESTING_DEPTH`] aborts the parse before recursing. Hostile input
//! can therefore cost at most a bounded call stack, no matter what the
//! length prefixes claim.

use tracing::debug;

use crate::field::value::{FieldTable, FieldValue};
use crate::field::zero_copy::SliceDecoder;
use crate::{CodecError, Result, MAX_NESTING_DEPTH};

/// Parse a raw field-array payload region (the bytes after the `A` tag and
/// its length prefix).
pub fn decode_array(payload: &[u8]) -> Result<Vec<FieldValue>> {
    parse_array_region(payload, 1)
}

/// Parse a raw field-table payload region (the bytes after the `F` tag and
/// its length prefix).
pub fn decode_table(payload: &[u8]) -> Result<FieldTable> {
    parse_table_region(payload, 1)
}

pub(crate) fn parse_array_region(region: &[u8], depth: usize) -> Result<Vec<FieldValue>> {
    check_depth(depth, region.len())?;

    let mut cursor = SliceDecoder::with_depth(region, depth);
    let mut items = Vec::new();
    while !cursor.is_at_end() {
        let offset = cursor.position();
        let item = cursor
            .decode_field_value()
            .map_err(|e| end_to_corruption(e, region.len(), offset))?;
        items.push(item);
    }
    Ok(items)
}

pub(crate) fn parse_table_region(region: &[u8], depth: usize) -> Result<FieldTable> {
    check_depth(depth, region.len())?;

    let mut cursor = SliceDecoder::with_depth(region, depth);
    let mut table = FieldTable::new();
    while !cursor.is_at_end() {
        let offset = cursor.position();
        let entry = decode_entry(&mut cursor)
            .map_err(|e| end_to_corruption(e, region.len(), offset))?;
        table.insert(entry.0, entry.1)?;
    }
    Ok(table)
}

fn decode_entry(cursor: &mut SliceDecoder<'_>) -> Result<(String, FieldValue)> {
    let key = cursor.decode_short_string()?;
    let value = cursor.decode_field_value()?;
    Ok((key, value))
}

fn check_depth(depth: usize, region_len: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        debug!(
            declared = region_len,
            limit = MAX_NESTING_DEPTH,
            "container nesting exceeds the recursion budget"
        );
        return Err(CodecError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    Ok(())
}

/// Running off the end of a bounded region means the length prefix was
/// wrong, not that input ran out. Errors from deeper regions pass through
/// already mapped.
fn end_to_corruption(err: CodecError, declared: usize, offset: usize) -> CodecError {
    match err {
        CodecError::UnexpectedEnd { .. } => {
            debug!(
                declared,
                offset, "container value crosses its declared region end"
            );
            CodecError::StructuralCorruption { declared, offset }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_is_an_empty_container() {
        assert_eq!(decode_array(&[]).unwrap(), Vec::new());
        assert!(decode_table(&[]).unwrap().is_empty());
    }

    #[test]
    fn array_parses_until_the_region_is_exhausted() {
        let region = [b'B', 1, b'B', 2, b'B', 3];
        assert_eq!(
            decode_array(&region).unwrap(),
            vec![
                FieldValue::UInt8(1),
                FieldValue::UInt8(2),
                FieldValue::UInt8(3)
            ]
        );
    }

    #[test]
    fn table_region_yields_ordered_entries() {
        let region = [
            1, b'a', b't', 1, // "a" -> true
            1, b'b', b'I', 0, 0, 0, 5, // "b" -> 5i32
        ];
        let table = decode_table(&region).unwrap();

        let entries: Vec<_> = table.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("a", &FieldValue::Boolean(true)),
                ("b", &FieldValue::Int32(5))
            ]
        );
    }

    #[test]
    fn value_crossing_region_end_is_structural_corruption() {
        // Declares an i32 but the region holds only two payload bytes.
        let region = [b'B', 1, b'I', 0, 0];
        let err = decode_array(&region).unwrap_err();
        assert!(matches!(
            err,
            CodecError::StructuralCorruption {
                declared: 5,
                offset: 2
            }
        ));
    }

    #[test]
    fn duplicate_table_keys_are_rejected() {
        let region = [
            1, b'k', b'B', 1, //
            1, b'k', b'B', 2,
        ];
        let err = decode_table(&region).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateKey(k) if k == "k"));
    }

    #[test]
    fn inner_corruption_keeps_the_inner_region_coordinates() {
        // Outer array holding one inner array whose element is truncated
        // relative to the inner declared length.
        let region = [b'A', 0, 0, 0, 3, b'I', 0, 0];
        let err = decode_array(&region).unwrap_err();
        assert!(matches!(
            err,
            CodecError::StructuralCorruption {
                declared: 3,
                offset: 0
            }
        ));
    }
}
