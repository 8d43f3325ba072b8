//! Encoder (C6): serializes typed fields into the wire format, choosing
//! packed vs. unpacked for repeated values and length-prefixing nested
//! constructs.

use alloc::vec::Vec;

use ::bytes::BufMut;

use crate::encoding::{
    check_field_number_encode, encode_key, encoded_len_varint, fixed, key_len, zigzag,
    EncodeContext, Limits, WireType,
};
use crate::error::encode_error_kind;
use crate::value::{is_self_contained_value, values_compatible};
use crate::{EncodeError, Field, Value};

/// Encodes `fields` into a freshly allocated buffer, using the default
/// [`Limits`].
pub fn to_bytes(fields: &[Field]) -> Result<Vec<u8>, EncodeError> {
    to_bytes_with_limits(fields, Limits::default())
}

/// Like [`to_bytes`] with caller-supplied resource limits.
pub fn to_bytes_with_limits(fields: &[Field], limits: Limits) -> Result<Vec<u8>, EncodeError> {
    let len = encoded_len_with_limits(fields, limits)?;
    let mut buf = Vec::with_capacity(len);
    let ctx = EncodeContext::new(limits);
    for field in fields {
        encode_field(field.field_number, &field.value, &mut buf, ctx)?;
    }
    Ok(buf)
}

/// Encodes `fields` into a caller-provided sink, returning the number of
/// bytes written.
pub fn to_bytes_into_sink(sink: &mut impl BufMut, fields: &[Field]) -> Result<usize, EncodeError> {
    to_bytes_into_sink_with_limits(sink, fields, Limits::default())
}

/// Like [`to_bytes_into_sink`] with caller-supplied resource limits.
pub fn to_bytes_into_sink_with_limits(
    sink: &mut impl BufMut,
    fields: &[Field],
    limits: Limits,
) -> Result<usize, EncodeError> {
    let len = encoded_len_with_limits(fields, limits)?;
    let ctx = EncodeContext::new(limits);
    for field in fields {
        encode_field(field.field_number, &field.value, sink, ctx)?;
    }
    Ok(len)
}

/// Computes the exact encoded length of `fields` without writing anything,
/// using the default [`Limits`]. Used internally to preallocate buffers and
/// to length-prefix nested messages, packed arrays, and map entries; also
/// useful to callers managing their own buffers.
pub fn encoded_len(fields: &[Field]) -> Result<usize, EncodeError> {
    encoded_len_with_limits(fields, Limits::default())
}

/// Like [`encoded_len`] with caller-supplied resource limits.
pub fn encoded_len_with_limits(fields: &[Field], limits: Limits) -> Result<usize, EncodeError> {
    let ctx = EncodeContext::new(limits);
    encoded_len_fields(fields, ctx)
}

fn encoded_len_fields(fields: &[Field], ctx: EncodeContext) -> Result<usize, EncodeError> {
    let mut total = 0;
    for field in fields {
        total += encoded_len_field(field.field_number, &field.value, ctx).map_err(|mut error| {
            error.push_field(field.field_number);
            error
        })?;
    }
    Ok(total)
}

fn encode_fields(
    fields: &[Field],
    buf: &mut impl BufMut,
    ctx: EncodeContext,
) -> Result<(), EncodeError> {
    for field in fields {
        encode_field(field.field_number, &field.value, buf, ctx).map_err(|mut error| {
            error.push_field(field.field_number);
            error
        })?;
    }
    Ok(())
}

fn encoded_len_field(field_number: u32, value: &Value, ctx: EncodeContext) -> Result<usize, EncodeError> {
    check_field_number_encode(field_number)?;
    match value {
        Value::Message(inner) => {
            let next_ctx = ctx.enter_recursion()?;
            let inner_len = encoded_len_fields(inner, next_ctx)?;
            Ok(key_len(field_number) + encoded_len_varint(inner_len as u64) + inner_len)
        }
        Value::Map(pairs) => {
            let next_ctx = ctx.enter_recursion()?;
            let mut total = 0;
            for (key, val) in pairs {
                let entry_len =
                    encoded_len_field(1, key, next_ctx)? + encoded_len_field(2, val, next_ctx)?;
                total += key_len(field_number) + encoded_len_varint(entry_len as u64) + entry_len;
            }
            Ok(total)
        }
        Value::Repeated(values) => encoded_len_repeated(field_number, values, ctx),
        Value::String(text) => Ok(length_delimited_len(field_number, text.len())),
        Value::Bytes(bytes) => Ok(length_delimited_len(field_number, bytes.len())),
        scalar => Ok(key_len(field_number) + encoded_len_scalar_payload(scalar)),
    }
}

fn encode_field(
    field_number: u32,
    value: &Value,
    buf: &mut impl BufMut,
    ctx: EncodeContext,
) -> Result<(), EncodeError> {
    check_field_number_encode(field_number)?;
    match value {
        Value::Message(inner) => {
            let next_ctx = ctx.enter_recursion()?;
            let inner_len = encoded_len_fields(inner, next_ctx)?;
            encode_key(field_number, WireType::LengthDelimited, buf);
            crate::encoding::encode_varint(inner_len as u64, buf);
            encode_fields(inner, buf, next_ctx)
        }
        Value::Map(pairs) => {
            let next_ctx = ctx.enter_recursion()?;
            for (key, val) in pairs {
                let entry_len =
                    encoded_len_field(1, key, next_ctx)? + encoded_len_field(2, val, next_ctx)?;
                encode_key(field_number, WireType::LengthDelimited, buf);
                crate::encoding::encode_varint(entry_len as u64, buf);
                encode_field(1, key, buf, next_ctx)?;
                encode_field(2, val, buf, next_ctx)?;
            }
            Ok(())
        }
        Value::Repeated(values) => encode_repeated(field_number, values, buf, ctx),
        Value::String(text) => {
            encode_key(field_number, WireType::LengthDelimited, buf);
            crate::encoding::encode_varint(text.len() as u64, buf);
            buf.put_slice(text.as_bytes());
            Ok(())
        }
        Value::Bytes(bytes) => {
            encode_key(field_number, WireType::LengthDelimited, buf);
            crate::encoding::encode_varint(bytes.len() as u64, buf);
            buf.put_slice(bytes);
            Ok(())
        }
        scalar => {
            let wire_type =
                scalar_wire_type(scalar).ok_or_else(|| wire_value_mismatch(field_number))?;
            encode_key(field_number, wire_type, buf);
            encode_scalar_payload(scalar, buf);
            Ok(())
        }
    }
}

fn length_delimited_len(field_number: u32, payload_len: usize) -> usize {
    key_len(field_number) + encoded_len_varint(payload_len as u64) + payload_len
}

fn wire_value_mismatch(field_number: u32) -> EncodeError {
    encode_error_kind::WireValueMismatch::new(field_number).into_error()
}

fn scalar_wire_type(value: &Value) -> Option<WireType> {
    use Value::*;
    Some(match value {
        Int32(_) | Int64(_) | UInt32(_) | UInt64(_) | SInt32(_) | SInt64(_) | Bool(_)
        | Enum(_) => WireType::Varint,
        Fixed32(_) | SFixed32(_) | Float(_) => WireType::Fixed32,
        Fixed64(_) | SFixed64(_) | Double(_) => WireType::Fixed64,
        _ => return None,
    })
}

/// Encodes a self-contained scalar's payload with no tag: used both for a
/// standalone field and for each element of a packed array.
fn encode_scalar_payload(value: &Value, buf: &mut impl BufMut) {
    use Value::*;
    match value {
        Int32(v) => crate::encoding::encode_varint(*v as u32 as u64, buf),
        Int64(v) => crate::encoding::encode_varint(*v as u64, buf),
        UInt32(v) => crate::encoding::encode_varint(u64::from(*v), buf),
        UInt64(v) => crate::encoding::encode_varint(*v, buf),
        SInt32(v) => crate::encoding::encode_varint(u64::from(zigzag::zigzag_encode32(*v)), buf),
        SInt64(v) => crate::encoding::encode_varint(zigzag::zigzag_encode64(*v), buf),
        Bool(v) => crate::encoding::encode_varint(u64::from(*v), buf),
        Enum(v) => crate::encoding::encode_varint(*v as u32 as u64, buf),
        Fixed32(v) => fixed::put_fixed32(*v, buf),
        SFixed32(v) => fixed::put_sfixed32(*v, buf),
        Float(v) => fixed::put_float(*v, buf),
        Fixed64(v) => fixed::put_fixed64(*v, buf),
        SFixed64(v) => fixed::put_sfixed64(*v, buf),
        Double(v) => fixed::put_double(*v, buf),
        _ => unreachable!("encode_scalar_payload called with a non-scalar value"),
    }
}

fn encoded_len_scalar_payload(value: &Value) -> usize {
    use Value::*;
    match value {
        Int32(v) => encoded_len_varint(*v as u32 as u64),
        Int64(v) => encoded_len_varint(*v as u64),
        UInt32(v) => encoded_len_varint(u64::from(*v)),
        UInt64(v) => encoded_len_varint(*v),
        SInt32(v) => encoded_len_varint(u64::from(zigzag::zigzag_encode32(*v))),
        SInt64(v) => encoded_len_varint(zigzag::zigzag_encode64(*v)),
        Bool(_) => 1,
        Enum(v) => encoded_len_varint(*v as u32 as u64),
        Fixed32(_) | SFixed32(_) | Float(_) => fixed::FIXED32_LEN,
        Fixed64(_) | SFixed64(_) | Double(_) => fixed::FIXED64_LEN,
        _ => unreachable!("encoded_len_scalar_payload called with a non-scalar value"),
    }
}

fn check_homogeneous(field_number: u32, values: &[Value]) -> Result<(), EncodeError> {
    if let Some(first) = values.first() {
        for other in &values[1..] {
            if !values_compatible(first, other) {
                return Err(encode_error_kind::HeterogeneousRepeated::new(field_number).into_error());
            }
        }
    }
    Ok(())
}

fn encoded_len_repeated(
    field_number: u32,
    values: &[Value],
    ctx: EncodeContext,
) -> Result<usize, EncodeError> {
    check_homogeneous(field_number, values)?;
    match values.len() {
        0 => Ok(key_len(field_number) + 1), // empty packed entry: varint(0) is one byte
        1 => encoded_len_field(field_number, &values[0], ctx),
        _ if is_self_contained_value(&values[0]) => {
            let payload_len: usize = values.iter().map(encoded_len_scalar_payload).sum();
            Ok(key_len(field_number) + encoded_len_varint(payload_len as u64) + payload_len)
        }
        _ => {
            let mut total = 0;
            for value in values {
                total += encoded_len_field(field_number, value, ctx)?;
            }
            Ok(total)
        }
    }
}

fn encode_repeated(
    field_number: u32,
    values: &[Value],
    buf: &mut impl BufMut,
    ctx: EncodeContext,
) -> Result<(), EncodeError> {
    check_homogeneous(field_number, values)?;
    match values.len() {
        0 => {
            encode_key(field_number, WireType::LengthDelimited, buf);
            crate::encoding::encode_varint(0, buf);
            Ok(())
        }
        1 => encode_field(field_number, &values[0], buf, ctx),
        _ if is_self_contained_value(&values[0]) => {
            let payload_len: usize = values.iter().map(encoded_len_scalar_payload).sum();
            encode_key(field_number, WireType::LengthDelimited, buf);
            crate::encoding::encode_varint(payload_len as u64, buf);
            for value in values {
                encode_scalar_payload(value, buf);
            }
            Ok(())
        }
        _ => {
            for value in values {
                encode_field(field_number, value, buf, ctx)?;
            }
            Ok(())
        }
    }
}
