use crate::error::decode_error_kind;
use crate::DecodeError;

/// The wire type of an encoded protobuf field.
///
/// Group wire types (`StartGroup`/`EndGroup`, values 3 and 4) are not part
/// of this codec's surface: groups are a deprecated proto2 feature and this
/// codec targets proto3 wire semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl TryFrom<u64> for WireType {
    type Error = DecodeError;

    #[inline]
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            _ => Err(decode_error_kind::InvalidWireType::new(value).into_error()),
        }
    }
}

/// Checks that the expected wire type matches the actual wire type,
/// or returns an error result.
#[inline]
pub fn check_wire_type(expected: WireType, actual: WireType) -> Result<(), DecodeError> {
    if expected != actual {
        return Err(decode_error_kind::UnexpectedWireType::new(actual, expected).into_error());
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_group_wire_types() {
        assert!(WireType::try_from(3).is_err());
        assert!(WireType::try_from(4).is_err());
        assert!(WireType::try_from(6).is_err());
    }

    #[test]
    fn accepts_defined_wire_types() {
        assert_eq!(WireType::try_from(0).unwrap(), WireType::Varint);
        assert_eq!(WireType::try_from(1).unwrap(), WireType::Fixed64);
        assert_eq!(WireType::try_from(2).unwrap(), WireType::LengthDelimited);
        assert_eq!(WireType::try_from(5).unwrap(), WireType::Fixed32);
    }

    #[test]
    fn check_wire_type_mismatch() {
        let err = check_wire_type(WireType::Varint, WireType::Fixed32).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid wire type: Fixed32 (expected Varint)"
        );
    }
}
