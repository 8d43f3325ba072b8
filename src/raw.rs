//! Schemaless raw decoding (C4): parses a byte stream into a sequence of
//! `(field_number, wire_type, raw_payload)` records without interpreting
//! payloads against any schema.

use alloc::vec::Vec;

use ::bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::encoding::{decode_key, Limits, WireType};
use crate::error::decode_error_kind;
use crate::value::RawField;
use crate::DecodeError;

/// Parses every field in `buf` into a flat, schemaless sequence of
/// [`RawField`]s, in stream order.
///
/// This is C4 used standalone. The schema-directed decoder (`from_bytes`,
/// `from_raw_fields`) calls the same parsing logic internally, once per
/// nesting level, to obtain the raw fields it then interprets.
pub fn decode_raw_fields(buf: &mut impl Buf, limits: Limits) -> Result<Vec<RawField>, DecodeError> {
    let mut fields = Vec::new();
    while buf.has_remaining() {
        let (field_number, wire_type) = decode_key(buf)?;
        let raw_payload = decode_raw_payload(wire_type, buf, limits)?;
        fields.push(RawField {
            field_number,
            wire_type,
            raw_payload,
        });
    }
    Ok(fields)
}

fn decode_raw_payload(
    wire_type: WireType,
    buf: &mut impl Buf,
    limits: Limits,
) -> Result<Bytes, DecodeError> {
    match wire_type {
        WireType::Varint => consume_varint_bytes(buf),
        WireType::Fixed32 => take_exact(buf, 4),
        WireType::Fixed64 => take_exact(buf, 8),
        WireType::LengthDelimited => {
            let len = crate::encoding::decode_varint(buf)?;
            limits.check_length(len)?;
            if len > buf.remaining() as u64 {
                return Err(decode_error_kind::TruncatedInput::new().into_error());
            }
            Ok(buf.copy_to_bytes(len as usize))
        }
    }
}

fn take_exact(buf: &mut impl Buf, width: usize) -> Result<Bytes, DecodeError> {
    if buf.remaining() < width {
        return Err(decode_error_kind::TruncatedInput::new().into_error());
    }
    Ok(buf.copy_to_bytes(width))
}

/// Reads one LEB128 varint from `buf`, returning the exact bytes consumed
/// (continuation bit included) rather than the decoded value: C4's raw
/// mode preserves payloads verbatim instead of interpreting them.
fn consume_varint_bytes(buf: &mut impl Buf) -> Result<Bytes, DecodeError> {
    let mut captured = BytesMut::with_capacity(10);
    for i in 0..10 {
        if !buf.has_remaining() {
            return Err(decode_error_kind::TruncatedInput::new().into_error());
        }
        let byte = buf.get_u8();
        captured.put_u8(byte);
        if byte < 0x80 {
            if i == 9 && byte >= 0x02 {
                return Err(decode_error_kind::VarintTooLong::new().into_error());
            }
            return Ok(captured.freeze());
        }
    }
    Err(decode_error_kind::VarintTooLong::new().into_error())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn s1_scalar_raw_field() {
        let bytes: &[u8] = &[0x08, 0x02];
        let fields = decode_raw_fields(&mut &bytes[..], Limits::default()).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_number, 1);
        assert_eq!(fields[0].wire_type, WireType::Varint);
        assert_eq!(&fields[0].raw_payload[..], &[0x02]);
    }

    #[test]
    fn rejects_group_wire_type() {
        let bytes: &[u8] = &[0x0B];
        assert!(decode_raw_fields(&mut &bytes[..], Limits::default()).is_err());
    }

    #[test]
    fn truncated_tag_fails_cleanly() {
        let bytes: &[u8] = &[0x08];
        let result = decode_raw_fields(&mut &bytes[..], Limits::default());
        assert!(result.is_err());
    }

    #[test]
    fn truncated_fixed32_fails() {
        let bytes: &[u8] = &[0x0D, 0x01, 0x02];
        assert!(decode_raw_fields(&mut &bytes[..], Limits::default()).is_err());
    }

    #[test]
    fn length_delimited_over_limit_rejected() {
        let mut buf = Vec::new();
        crate::encoding::encode_key(1, WireType::LengthDelimited, &mut buf);
        crate::encoding::encode_varint(1_000, &mut buf);
        let limits = Limits {
            max_depth: 100,
            max_length: Some(10),
        };
        assert!(decode_raw_fields(&mut &buf[..], limits).is_err());
    }

    #[test]
    fn stream_order_preserved() {
        let bytes: &[u8] = &[0x08, 0x01, 0x10, 0x02, 0x08, 0x03];
        let fields = decode_raw_fields(&mut &bytes[..], Limits::default()).unwrap();
        let numbers: Vec<u32> = fields.iter().map(|f| f.field_number).collect();
        assert_eq!(numbers, alloc::vec![1, 2, 1]);
    }
}
