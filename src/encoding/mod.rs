//! Low-level building blocks for the Protocol Buffers wire format: varint and
//! fixed-width codecs, ZigZag transforms, tag (key) encode/decode, and the
//! recursion/length guards threaded through the schema-directed decoder and
//! encoder.

use ::bytes::{Buf, BufMut};

use crate::error::{decode_error_kind, encode_error_kind};
use crate::{DecodeError, EncodeError};

pub mod fixed;
pub mod length_delimiter;
pub mod varint;
pub mod wire_type;
pub mod zigzag;

pub use length_delimiter::{decode_length_delimiter, encode_length_delimiter, length_delimiter_len};
pub use varint::{decode_varint, encode_varint, encoded_len_varint};
pub use wire_type::{check_wire_type, WireType};

/// Lowest legal field number. Field number 0 is never valid on the wire.
pub const MIN_FIELD_NUMBER: u32 = 1;
/// Highest legal field number, `2^29 - 1`.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Caller-configurable resource guards for decoding and encoding.
///
/// `Limits` is a cheap `Copy` value threaded by value through recursive
/// calls, mirroring how a recursion counter is passed down a call stack
/// rather than stored in shared, mutable state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth for `message` and `map` values. Exceeding this
    /// during decode or encode yields `DepthExceeded`.
    pub max_depth: u32,
    /// Maximum permitted value of a length-delimited prefix. `None` means
    /// no limit beyond what fits in a `usize`. Exceeding this during decode
    /// yields `LengthExceeded`.
    pub max_length: Option<u64>,
}

/// Default recursion depth, matching common protobuf implementation defaults.
pub const DEFAULT_MAX_DEPTH: u32 = 100;
/// Default length-prefix ceiling: 64 MiB, generous enough for legitimate
/// messages while still bounding adversarial length prefixes.
pub const DEFAULT_MAX_LENGTH: u64 = 64 * 1024 * 1024;

impl Default for Limits {
    #[inline]
    fn default() -> Self {
        Limits {
            max_depth: DEFAULT_MAX_DEPTH,
            max_length: Some(DEFAULT_MAX_LENGTH),
        }
    }
}

impl Limits {
    /// Limits with no length ceiling and the default recursion depth.
    pub fn unbounded_length() -> Self {
        Limits {
            max_length: None,
            ..Limits::default()
        }
    }

    #[inline]
    pub(crate) fn check_length(&self, length: u64) -> Result<(), DecodeError> {
        if let Some(max_length) = self.max_length {
            if length > max_length {
                return Err(decode_error_kind::LengthExceeded::new(length).into_error());
            }
        }
        Ok(())
    }
}

/// Recursion guard threaded through the schema-directed decoder.
///
/// Passed by value; `enter_recursion` hands back a new context for the next
/// level of nesting rather than mutating this one, so a caller can safely
/// reuse one `Limits` across independent decodes.
#[derive(Clone, Copy, Debug)]
pub struct DecodeContext {
    remaining_depth: u32,
}

impl DecodeContext {
    #[inline]
    pub fn new(limits: Limits) -> Self {
        DecodeContext {
            remaining_depth: limits.max_depth,
        }
    }

    #[inline]
    pub fn enter_recursion(&self) -> Result<DecodeContext, DecodeError> {
        if self.remaining_depth == 0 {
            return Err(decode_error_kind::DepthExceeded::new().into_error());
        }
        Ok(DecodeContext {
            remaining_depth: self.remaining_depth - 1,
        })
    }
}

/// Recursion guard threaded through the encoder.
#[derive(Clone, Copy, Debug)]
pub struct EncodeContext {
    remaining_depth: u32,
}

impl EncodeContext {
    #[inline]
    pub fn new(limits: Limits) -> Self {
        EncodeContext {
            remaining_depth: limits.max_depth,
        }
    }

    #[inline]
    pub fn enter_recursion(&self) -> Result<EncodeContext, EncodeError> {
        if self.remaining_depth == 0 {
            return Err(encode_error_kind::DepthExceeded::new().into_error());
        }
        Ok(EncodeContext {
            remaining_depth: self.remaining_depth - 1,
        })
    }
}

/// Validates a field number against `[MIN_FIELD_NUMBER, MAX_FIELD_NUMBER]`.
#[inline]
pub fn check_field_number_decode(field_number: u64) -> Result<u32, DecodeError> {
    if field_number < u64::from(MIN_FIELD_NUMBER) || field_number > u64::from(MAX_FIELD_NUMBER) {
        return Err(decode_error_kind::InvalidFieldNumber::new(field_number).into_error());
    }
    Ok(field_number as u32)
}

/// Validates a field number for encoding.
#[inline]
pub fn check_field_number_encode(field_number: u32) -> Result<(), EncodeError> {
    if !(MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER).contains(&field_number) {
        return Err(
            encode_error_kind::InvalidFieldNumber::new(u64::from(field_number)).into_error(),
        );
    }
    Ok(())
}

/// Encodes a field tag, combining a field number and wire type.
#[inline]
pub fn encode_key(field_number: u32, wire_type: WireType, buf: &mut impl BufMut) {
    debug_assert!((MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER).contains(&field_number));
    let key = (u64::from(field_number) << 3) | wire_type as u64;
    encode_varint(key, buf);
}

/// Decodes a field tag into a field number and wire type.
#[inline]
pub fn decode_key(buf: &mut impl Buf) -> Result<(u32, WireType), DecodeError> {
    let key = decode_varint(buf)?;
    let wire_type = WireType::try_from(key & 0x7)?;
    let field_number = check_field_number_decode(key >> 3)?;
    Ok((field_number, wire_type))
}

/// Returns the encoded width of a field tag, in bytes.
#[inline]
pub fn key_len(field_number: u32) -> usize {
    encoded_len_varint(u64::from(field_number) << 3)
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn key_round_trips() {
        let mut buf = Vec::new();
        encode_key(9, WireType::LengthDelimited, &mut buf);
        assert_eq!(key_len(9), buf.len());
        let (field_number, wire_type) = decode_key(&mut &buf[..]).unwrap();
        assert_eq!(field_number, 9);
        assert_eq!(wire_type, WireType::LengthDelimited);
    }

    #[test]
    fn rejects_field_number_zero() {
        let mut buf = Vec::new();
        encode_varint(0, &mut buf); // key with field number 0, wire type varint
        assert!(decode_key(&mut &buf[..]).is_err());
    }

    #[test]
    fn depth_guard_trips() {
        let ctx = DecodeContext::new(Limits {
            max_depth: 1,
            max_length: None,
        });
        let next = ctx.enter_recursion().unwrap();
        assert!(next.enter_recursion().is_err());
    }
}
