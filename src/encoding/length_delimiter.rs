use ::bytes::{Buf, BufMut};

use crate::encoding::varint::{decode_varint, encode_varint, encoded_len_varint};
use crate::error::decode_error_kind;
use crate::DecodeError;

/// Encodes a length delimiter to the buffer.
///
/// The buffer must have enough remaining capacity to hold the encoded delimiter.
#[inline]
pub fn encode_length_delimiter(length: usize, buf: &mut impl BufMut) {
    encode_varint(length as u64, buf);
}

/// Returns the encoded length of a length delimiter.
///
/// Callers may use this to ensure sufficient buffer capacity before calling
/// `encode_length_delimiter`. The returned size will be between 1 and 10, inclusive.
#[inline]
pub fn length_delimiter_len(length: usize) -> usize {
    encoded_len_varint(length as u64)
}

/// Decodes a length delimiter from the buffer, advancing it past the delimiter.
#[inline]
pub fn decode_length_delimiter(mut buf: impl Buf) -> Result<usize, DecodeError> {
    let length = decode_varint(&mut buf)?;
    if length > usize::MAX as u64 {
        return Err(decode_error_kind::LengthExceeded::new(length).into_error());
    }
    Ok(length as usize)
}
