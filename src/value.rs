//! The tagged-union value model shared by the decoder and the encoder.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use ::bytes::Bytes;

use crate::encoding::WireType;

/// A decoded or to-be-encoded protobuf value.
///
/// Self-contained variants (everything up through `Double`) encode without
/// an external length prefix and are eligible for inclusion in a packed
/// array. The remaining variants require length-delimited framing.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Value {
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    SInt32(i32),
    SInt64(i64),
    Bool(bool),
    Enum(i32),
    Fixed32(u32),
    SFixed32(i32),
    Float(f32),
    Fixed64(u64),
    SFixed64(i64),
    Double(f64),
    String(String),
    Bytes(Bytes),
    Message(Vec<Field>),
    Repeated(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

/// The type tag of a [`Value`], independent of any particular instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Bool,
    Enum,
    Fixed32,
    SFixed32,
    Float,
    Fixed64,
    SFixed64,
    Double,
    String,
    Bytes,
    Message(Vec<FieldType>),
    Repeated(Box<ValueType>),
    Map(Box<ValueType>, Box<ValueType>),
}

/// A field number paired with its decoded value.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub field_number: u32,
    pub value: Value,
}

/// A field number paired with its schema-declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldType {
    pub field_number: u32,
    pub value_type: ValueType,
}

/// One field as parsed off the wire with no schema applied: a field number,
/// a wire type, and the raw, still-encoded payload bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawField {
    pub field_number: u32,
    pub wire_type: WireType,
    pub raw_payload: Bytes,
}

/// Returns the wire type a scalar or length-delimited `ValueType` maps to.
///
/// `Repeated` has no single wire type of its own — each occurrence on the
/// wire is either the element's own wire type (unpacked) or
/// `LengthDelimited` (packed) — so callers working with `Repeated` schema
/// entries dispatch on the element type instead.
pub fn wire_type_for(value_type: &ValueType) -> Option<WireType> {
    use ValueType::*;
    Some(match value_type {
        Int32 | Int64 | UInt32 | UInt64 | SInt32 | SInt64 | Bool | Enum => WireType::Varint,
        Fixed32 | SFixed32 | Float => WireType::Fixed32,
        Fixed64 | SFixed64 | Double => WireType::Fixed64,
        String | Bytes | Message(_) | Map(_, _) => WireType::LengthDelimited,
        Repeated(_) => return None,
    })
}

/// A value whose encoding requires no external length prefix, and which may
/// therefore appear inside a packed array.
pub fn is_self_contained(value_type: &ValueType) -> bool {
    use ValueType::*;
    matches!(
        value_type,
        Int32
            | Int64
            | UInt32
            | UInt64
            | SInt32
            | SInt64
            | Bool
            | Enum
            | Fixed32
            | SFixed32
            | Float
            | Fixed64
            | SFixed64
            | Double
    )
}

/// Whether `value_type` is legal as a map key: a scalar self-contained type,
/// or `string`/`bytes`. Protobuf forbids `message`, `repeated`, and `map` as
/// map key types since a key must be hashable/comparable by value.
pub fn is_valid_map_key_type(value_type: &ValueType) -> bool {
    is_self_contained(value_type) || matches!(value_type, ValueType::String | ValueType::Bytes)
}

/// A `Value` instance of a self-contained discriminant: the encode-side
/// counterpart to [`is_self_contained`], which classifies a `ValueType`
/// instead. Encoding works directly off `Value`s with no schema in hand, so
/// the packing-policy check operates on instances rather than types.
pub fn is_self_contained_value(value: &Value) -> bool {
    matches!(
        value,
        Value::Int32(_)
            | Value::Int64(_)
            | Value::UInt32(_)
            | Value::UInt64(_)
            | Value::SInt32(_)
            | Value::SInt64(_)
            | Value::Bool(_)
            | Value::Enum(_)
            | Value::Fixed32(_)
            | Value::SFixed32(_)
            | Value::Float(_)
            | Value::Fixed64(_)
            | Value::SFixed64(_)
            | Value::Double(_)
    )
}

/// Returns whether `a` and `b` have the same shape: the same `Value`
/// discriminant, and — for nested messages, maps, and repeated values —
/// recursively compatible element shapes.
///
/// Used both to detect merge conflicts across repeated wire occurrences of
/// a field (decode) and to check repeated-field homogeneity before encoding
/// (encode). `Repeated`/`Map` are compared permissively when either side is
/// empty: an empty collection carries no shape information to conflict with.
pub fn values_compatible(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int32(_), Value::Int32(_))
        | (Value::Int64(_), Value::Int64(_))
        | (Value::UInt32(_), Value::UInt32(_))
        | (Value::UInt64(_), Value::UInt64(_))
        | (Value::SInt32(_), Value::SInt32(_))
        | (Value::SInt64(_), Value::SInt64(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Enum(_), Value::Enum(_))
        | (Value::Fixed32(_), Value::Fixed32(_))
        | (Value::SFixed32(_), Value::SFixed32(_))
        | (Value::Float(_), Value::Float(_))
        | (Value::Fixed64(_), Value::Fixed64(_))
        | (Value::SFixed64(_), Value::SFixed64(_))
        | (Value::Double(_), Value::Double(_))
        | (Value::String(_), Value::String(_))
        | (Value::Bytes(_), Value::Bytes(_)) => true,
        (Value::Message(a_fields), Value::Message(b_fields)) => {
            a_fields.len() == b_fields.len()
                && a_fields.iter().zip(b_fields).all(|(a, b)| {
                    a.field_number == b.field_number && values_compatible(&a.value, &b.value)
                })
        }
        (Value::Repeated(a_elems), Value::Repeated(b_elems)) => {
            match (a_elems.first(), b_elems.first()) {
                (Some(a0), Some(b0)) => values_compatible(a0, b0),
                _ => true,
            }
        }
        (Value::Map(a_pairs), Value::Map(b_pairs)) => match (a_pairs.first(), b_pairs.first()) {
            (Some((ak, av)), Some((bk, bv))) => {
                values_compatible(ak, bk) && values_compatible(av, bv)
            }
            _ => true,
        },
        _ => false,
    }
}
