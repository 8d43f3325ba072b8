//! Schema-directed typed decoding (C5): interprets raw wire records against
//! a `[FieldType]` schema, producing typed `Value`s and merging duplicate
//! field numbers per the rules in the merge table below.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use ::bytes::Buf;

use crate::encoding::{check_wire_type, decode_varint, fixed, zigzag, DecodeContext, Limits, WireType};
use crate::error::decode_error_kind;
use crate::raw::decode_raw_fields;
use crate::value::{is_self_contained, is_valid_map_key_type, values_compatible, wire_type_for};
use crate::{DecodeError, Field, FieldType, RawField, Value, ValueType};

/// Parses and interprets `buf` against `schema` in one pass (C4 + C5), using
/// the default [`Limits`].
pub fn from_bytes(buf: &mut impl Buf, schema: &[FieldType]) -> Result<Vec<Field>, DecodeError> {
    from_bytes_with_limits(buf, schema, Limits::default())
}

/// Like [`from_bytes`] with caller-supplied resource limits.
pub fn from_bytes_with_limits(
    buf: &mut impl Buf,
    schema: &[FieldType],
    limits: Limits,
) -> Result<Vec<Field>, DecodeError> {
    let raw_fields = decode_raw_fields(buf, limits)?;
    from_raw_fields_with_limits(&raw_fields, schema, limits)
}

/// Interprets already-parsed raw fields (C5 only) against `schema`, using
/// the default [`Limits`].
pub fn from_raw_fields(raw_fields: &[RawField], schema: &[FieldType]) -> Result<Vec<Field>, DecodeError> {
    from_raw_fields_with_limits(raw_fields, schema, Limits::default())
}

/// Like [`from_raw_fields`] with caller-supplied resource limits.
pub fn from_raw_fields_with_limits(
    raw_fields: &[RawField],
    schema: &[FieldType],
    limits: Limits,
) -> Result<Vec<Field>, DecodeError> {
    let ctx = DecodeContext::new(limits);
    decode_fields(raw_fields, schema, ctx, limits)
}

fn decode_fields(
    raw_fields: &[RawField],
    schema: &[FieldType],
    ctx: DecodeContext,
    limits: Limits,
) -> Result<Vec<Field>, DecodeError> {
    let index: BTreeMap<u32, &ValueType> = schema
        .iter()
        .map(|field_type| (field_type.field_number, &field_type.value_type))
        .collect();

    let mut accumulator: BTreeMap<u32, Value> = BTreeMap::new();
    for raw in raw_fields {
        let value_type = index
            .get(&raw.field_number)
            .ok_or_else(|| decode_error_kind::SchemaMismatch::new(raw.field_number).into_error())?;

        let piece = decode_piece(value_type, raw, ctx, limits).map_err(|mut error| {
            error.push_field(raw.field_number);
            error
        })?;

        match accumulator.remove(&raw.field_number) {
            Some(existing) => {
                let merged = merge_values(existing, piece, raw.field_number)?;
                accumulator.insert(raw.field_number, merged);
            }
            None => {
                accumulator.insert(raw.field_number, piece);
            }
        }
    }

    let mut fields = Vec::with_capacity(accumulator.len());
    for field_type in schema {
        if let Some(value) = accumulator.remove(&field_type.field_number) {
            fields.push(Field {
                field_number: field_type.field_number,
                value,
            });
        }
    }
    Ok(fields)
}

/// Combines a newly decoded occurrence of a field with whatever was
/// accumulated from earlier occurrences of the same field number.
fn merge_values(existing: Value, new: Value, field_number: u32) -> Result<Value, DecodeError> {
    match (existing, new) {
        (Value::Repeated(mut old), Value::Repeated(more)) => {
            old.extend(more);
            Ok(Value::Repeated(old))
        }
        (Value::Map(mut old), Value::Map(more)) => {
            old.extend(more);
            Ok(Value::Map(old))
        }
        (old, new) => {
            if values_compatible(&old, &new) {
                Ok(Value::Repeated(alloc::vec![old, new]))
            } else {
                Err(decode_error_kind::MergeTypeConflict::new(field_number).into_error())
            }
        }
    }
}

fn decode_piece(
    value_type: &ValueType,
    raw: &RawField,
    ctx: DecodeContext,
    limits: Limits,
) -> Result<Value, DecodeError> {
    match value_type {
        ValueType::Repeated(elem) => decode_repeated_piece(elem, raw, ctx, limits),
        ValueType::Map(key_type, val_type) => decode_map_piece(key_type, val_type, raw, ctx, limits),
        ValueType::Message(nested_schema) => decode_message_piece(nested_schema, raw, ctx, limits),
        ValueType::String => {
            check_wire_type(WireType::LengthDelimited, raw.wire_type)?;
            let text = core::str::from_utf8(&raw.raw_payload)
                .map_err(|_| decode_error_kind::InvalidUtf8::new().into_error())?;
            Ok(Value::String(String::from(text)))
        }
        ValueType::Bytes => {
            check_wire_type(WireType::LengthDelimited, raw.wire_type)?;
            Ok(Value::Bytes(raw.raw_payload.clone()))
        }
        scalar => {
            let expected = wire_type_for(scalar).expect("scalar value type has a wire type");
            check_wire_type(expected, raw.wire_type)?;
            let mut payload = raw.raw_payload.clone();
            decode_scalar_payload(scalar, &mut payload, raw.field_number)
        }
    }
}

/// Decodes one self-contained scalar value from `buf`. Used both for a
/// single unpacked occurrence (where `buf` is the field's whole raw
/// payload) and for each element of a packed array (where `buf` is shared
/// across iterations).
fn decode_scalar_payload(
    value_type: &ValueType,
    buf: &mut impl Buf,
    field_number: u32,
) -> Result<Value, DecodeError> {
    use ValueType::*;
    Ok(match value_type {
        Int32 => Value::Int32(decode_varint(buf)? as i32),
        Int64 => Value::Int64(decode_varint(buf)? as i64),
        UInt32 => {
            let value = decode_varint(buf)?;
            if value > u64::from(u32::MAX) {
                return Err(decode_error_kind::VarintOutOfRange::new(field_number).into_error());
            }
            Value::UInt32(value as u32)
        }
        UInt64 => Value::UInt64(decode_varint(buf)?),
        SInt32 => Value::SInt32(zigzag::zigzag_decode32(decode_varint(buf)? as u32)),
        SInt64 => Value::SInt64(zigzag::zigzag_decode64(decode_varint(buf)?)),
        Bool => match decode_varint(buf)? {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            other => return Err(decode_error_kind::InvalidBool::new(other).into_error()),
        },
        Enum => Value::Enum(decode_varint(buf)? as i32),
        Fixed32 => Value::Fixed32(fixed::get_fixed32(buf)?),
        SFixed32 => Value::SFixed32(fixed::get_sfixed32(buf)?),
        Float => Value::Float(fixed::get_float(buf)?),
        Fixed64 => Value::Fixed64(fixed::get_fixed64(buf)?),
        SFixed64 => Value::SFixed64(fixed::get_sfixed64(buf)?),
        Double => Value::Double(fixed::get_double(buf)?),
        String | Bytes | Message(_) | Repeated(_) | Map(_, _) => {
            unreachable!("decode_scalar_payload called with a non-scalar value type")
        }
    })
}

fn decode_repeated_piece(
    elem: &ValueType,
    raw: &RawField,
    ctx: DecodeContext,
    limits: Limits,
) -> Result<Value, DecodeError> {
    if is_self_contained(elem) && raw.wire_type == WireType::LengthDelimited {
        let mut payload = raw.raw_payload.clone();
        let mut values = Vec::new();
        while payload.has_remaining() {
            values.push(decode_scalar_payload(elem, &mut payload, raw.field_number)?);
        }
        Ok(Value::Repeated(values))
    } else {
        let element = decode_piece(elem, raw, ctx, limits)?;
        Ok(Value::Repeated(alloc::vec![element]))
    }
}

fn decode_message_piece(
    nested_schema: &[FieldType],
    raw: &RawField,
    ctx: DecodeContext,
    limits: Limits,
) -> Result<Value, DecodeError> {
    check_wire_type(WireType::LengthDelimited, raw.wire_type)?;
    let next_ctx = ctx.enter_recursion().map_err(|mut error| {
        error.push_field(raw.field_number);
        error
    })?;
    let mut payload = raw.raw_payload.clone();
    let raw_fields = decode_raw_fields(&mut payload, limits)?;
    let fields = decode_fields(&raw_fields, nested_schema, next_ctx, limits)?;
    Ok(Value::Message(fields))
}

fn decode_map_piece(
    key_type: &ValueType,
    val_type: &ValueType,
    raw: &RawField,
    ctx: DecodeContext,
    limits: Limits,
) -> Result<Value, DecodeError> {
    if !is_valid_map_key_type(key_type) {
        return Err(decode_error_kind::InvalidMapKeyType::new(raw.field_number).into_error());
    }

    check_wire_type(WireType::LengthDelimited, raw.wire_type)?;
    let next_ctx = ctx.enter_recursion().map_err(|mut error| {
        error.push_field(raw.field_number);
        error
    })?;
    let mut payload = raw.raw_payload.clone();
    let entry_fields = decode_raw_fields(&mut payload, limits)?;

    let mut key = None;
    let mut value = None;
    for entry in &entry_fields {
        match entry.field_number {
            1 => key = Some(decode_piece(key_type, entry, next_ctx, limits)?),
            2 => value = Some(decode_piece(val_type, entry, next_ctx, limits)?),
            other => return Err(decode_error_kind::InvalidMapEntry::new(other).into_error()),
        }
    }

    let key = key.unwrap_or_else(|| zero_value(key_type));
    let value = value.unwrap_or_else(|| zero_value(val_type));
    Ok(Value::Map(alloc::vec![(key, value)]))
}

/// The proto3 default value for a schema-declared type, used when a map
/// entry is missing its key or value field.
fn zero_value(value_type: &ValueType) -> Value {
    use ValueType::*;
    match value_type {
        Int32 => Value::Int32(0),
        Int64 => Value::Int64(0),
        UInt32 => Value::UInt32(0),
        UInt64 => Value::UInt64(0),
        SInt32 => Value::SInt32(0),
        SInt64 => Value::SInt64(0),
        Bool => Value::Bool(false),
        Enum => Value::Enum(0),
        Fixed32 => Value::Fixed32(0),
        SFixed32 => Value::SFixed32(0),
        Float => Value::Float(0.0),
        Fixed64 => Value::Fixed64(0),
        SFixed64 => Value::SFixed64(0),
        Double => Value::Double(0.0),
        String => Value::String(alloc::string::String::new()),
        Bytes => Value::Bytes(::bytes::Bytes::new()),
        Message(_) => Value::Message(Vec::new()),
        Repeated(_) => Value::Repeated(Vec::new()),
        Map(_, _) => Value::Map(Vec::new()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec;

    fn schema(field_number: u32, value_type: ValueType) -> Vec<FieldType> {
        alloc::vec![FieldType {
            field_number,
            value_type,
        }]
    }

    #[test]
    fn s1_scalar() {
        let bytes: &[u8] = &[0x08, 0x02];
        let fields = from_bytes(&mut &bytes[..], &schema(1, ValueType::UInt64)).unwrap();
        assert_eq!(fields, vec![Field { field_number: 1, value: Value::UInt64(2) }]);
    }

    #[test]
    fn s3_sint32_boundaries() {
        let bytes: &[u8] = &[0x08, 0x01];
        let fields = from_bytes(&mut &bytes[..], &schema(1, ValueType::SInt32)).unwrap();
        assert_eq!(fields[0].value, Value::SInt32(-1));

        let bytes: &[u8] = &[0x08, 0xFE, 0xFF, 0xFF, 0xFF, 0x0F];
        let fields = from_bytes(&mut &bytes[..], &schema(1, ValueType::SInt32)).unwrap();
        assert_eq!(fields[0].value, Value::SInt32(2147483647));
    }

    #[test]
    fn s4_packed_repeated() {
        let bytes: &[u8] = &[0x0A, 0x03, 0x01, 0x02, 0x03];
        let schema = schema(1, ValueType::Repeated(alloc::boxed::Box::new(ValueType::Int32)));
        let fields = from_bytes(&mut &bytes[..], &schema).unwrap();
        assert_eq!(
            fields[0].value,
            Value::Repeated(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)])
        );
    }

    #[test]
    fn s6_merge_across_occurrences() {
        let bytes: &[u8] = &[0x0A, 0x02, 0x01, 0x02, 0x0A, 0x02, 0x03, 0x04];
        let schema = schema(1, ValueType::Repeated(alloc::boxed::Box::new(ValueType::Int32)));
        let fields = from_bytes(&mut &bytes[..], &schema).unwrap();
        assert_eq!(
            fields[0].value,
            Value::Repeated(vec![
                Value::Int32(1),
                Value::Int32(2),
                Value::Int32(3),
                Value::Int32(4)
            ])
        );
    }

    #[test]
    fn singular_scalar_promotes_to_repeated_on_second_occurrence() {
        let bytes: &[u8] = &[0x08, 0x01, 0x08, 0x02];
        let fields = from_bytes(&mut &bytes[..], &schema(1, ValueType::Int32)).unwrap();
        assert_eq!(
            fields[0].value,
            Value::Repeated(vec![Value::Int32(1), Value::Int32(2)])
        );
    }

    #[test]
    fn invalid_utf8_string_fails() {
        let bytes: &[u8] = &[0x0A, 0x02, 0xFF, 0xFE];
        let result = from_bytes(&mut &bytes[..], &schema(1, ValueType::String));
        assert!(result.is_err());
    }

    #[test]
    fn bool_payload_must_be_zero_or_one() {
        let bytes: &[u8] = &[0x08, 0x02];
        let result = from_bytes(&mut &bytes[..], &schema(1, ValueType::Bool));
        assert!(result.is_err());
    }

    #[test]
    fn uint32_overflow_rejected() {
        let bytes: &[u8] = &[0x08, 0x80, 0x80, 0x80, 0x80, 0x10]; // 2^32
        let result = from_bytes(&mut &bytes[..], &schema(1, ValueType::UInt32));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_number_is_schema_mismatch() {
        let bytes: &[u8] = &[0x08, 0x01];
        let result = from_bytes(&mut &bytes[..], &schema(2, ValueType::Int32));
        assert!(result.is_err());
    }

    #[test]
    fn map_entry_with_unknown_tag_rejected() {
        let bytes: &[u8] = &[0x0A, 0x02, 0x18, 0x01]; // map entry with field 3
        let schema = schema(
            1,
            ValueType::Map(
                alloc::boxed::Box::new(ValueType::Int32),
                alloc::boxed::Box::new(ValueType::Int32),
            ),
        );
        let result = from_bytes(&mut &bytes[..], &schema);
        assert!(result.is_err());
    }

    #[test]
    fn map_with_message_key_type_rejected() {
        let bytes: &[u8] = &[0x0A, 0x02, 0x08, 0x05];
        let schema = schema(
            1,
            ValueType::Map(
                alloc::boxed::Box::new(ValueType::Message(Vec::new())),
                alloc::boxed::Box::new(ValueType::Int32),
            ),
        );
        let result = from_bytes(&mut &bytes[..], &schema);
        assert!(result.is_err());
    }

    #[test]
    fn map_entry_defaults_missing_value() {
        let bytes: &[u8] = &[0x0A, 0x02, 0x08, 0x05]; // only key set
        let schema = schema(
            1,
            ValueType::Map(
                alloc::boxed::Box::new(ValueType::Int32),
                alloc::boxed::Box::new(ValueType::String),
            ),
        );
        let fields = from_bytes(&mut &bytes[..], &schema).unwrap();
        assert_eq!(
            fields[0].value,
            Value::Map(vec![(Value::Int32(5), Value::String(String::new()))])
        );
    }

    #[cfg(feature = "std")]
    mod proptests {
        use proptest::prelude::*;

        use super::*;
        use crate::encoding::{encode_key, encode_varint};

        /// Splitting one wire occurrence of a packed repeated int32 field into
        /// several unpacked occurrences must merge to the same result: the
        /// merge rule and the packed/unpacked split are independent encodings
        /// of the same logical sequence.
        proptest! {
            #[test]
            fn packed_and_split_unpacked_merge_identically(values: Vec<i32>) {
                let field_number = 1;
                let elem = ValueType::Repeated(alloc::boxed::Box::new(ValueType::Int32));
                let schema = schema(field_number, elem);

                let mut packed = Vec::new();
                encode_key(field_number, WireType::LengthDelimited, &mut packed);
                let payload_len: usize = values.iter().map(|v| crate::encoding::encoded_len_varint(*v as u32 as u64)).sum();
                encode_varint(payload_len as u64, &mut packed);
                for v in &values {
                    encode_varint(*v as u32 as u64, &mut packed);
                }

                let mut unpacked = Vec::new();
                for v in &values {
                    encode_key(field_number, WireType::Varint, &mut unpacked);
                    encode_varint(*v as u32 as u64, &mut unpacked);
                }

                let from_packed = from_bytes(&mut &packed[..], &schema).unwrap();
                let from_unpacked = from_bytes(&mut &unpacked[..], &schema).unwrap();

                if values.is_empty() {
                    prop_assert!(from_unpacked.is_empty());
                    prop_assert_eq!(&from_packed[0].value, &Value::Repeated(Vec::new()));
                } else {
                    prop_assert_eq!(from_packed, from_unpacked);
                }
            }
        }
    }
}
