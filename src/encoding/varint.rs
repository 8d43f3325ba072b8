//! LEB128 varint codec: the base-128 encoding every other wire-format
//! constant (tags, length prefixes, varint-class scalars) is built on top
//! of.

use ::bytes::{Buf, BufMut};

use crate::error::decode_error_kind;
use crate::DecodeError;

/// Writes `value` to `buf` as a LEB128 varint: 7 payload bits per byte,
/// continuation bit set on every byte but the last.
#[inline]
pub fn encode_varint(value: u64, buf: &mut impl BufMut) {
    let mut remaining = value;
    loop {
        let low_bits = (remaining & 0x7F) as u8;
        remaining >>= 7;
        if remaining == 0 {
            buf.put_u8(low_bits);
            return;
        }
        buf.put_u8(low_bits | 0x80);
    }
}

/// Width in bytes `value` would occupy once varint-encoded; always in `1..=10`.
#[inline]
pub fn encoded_len_varint(value: u64) -> usize {
    // Every 7-bit group beyond the first needs one more output byte; this is
    // the branch-free form of `1 + (bits_needed - 1) / 7`.
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

/// Reads one LEB128 varint from the front of `buf`, advancing past it.
#[inline]
pub fn decode_varint(buf: &mut impl Buf) -> Result<u64, DecodeError> {
    let chunk = buf.chunk();
    let Some(&first) = chunk.first() else {
        return Err(decode_error_kind::TruncatedInput::new().into_error());
    };

    if first < 0x80 {
        buf.advance(1);
        return Ok(u64::from(first));
    }

    // The unrolled reader needs either a full 10-byte window or a
    // terminator already visible in this chunk; otherwise the varint may
    // straddle a chunk boundary and has to go through the byte-at-a-time path.
    if chunk.len() >= 10 || chunk.last().is_some_and(|&b| b < 0x80) {
        let (value, consumed) = decode_varint_chunk(chunk)?;
        buf.advance(consumed);
        Ok(value)
    } else {
        decode_varint_byte_by_byte(buf)
    }
}

/// Decodes a varint known to be fully present in `chunk`, built out of two
/// 35-bit accumulation passes rather than one 64-bit pass: each pass only
/// ever shifts a `u64` by a constant the compiler can fold, which keeps the
/// hot path branch-predictable.
///
/// ## Safety invariant
///
/// Caller guarantees `chunk` is non-empty and either holds at least 10
/// bytes or ends with a byte `< 0x80` (a varint terminator) within its
/// first 10 bytes.
#[inline]
fn decode_varint_chunk(chunk: &[u8]) -> Result<(u64, usize), DecodeError> {
    debug_assert!(!chunk.is_empty());
    debug_assert!(chunk.len() > 10 || chunk[chunk.len() - 1] < 0x80);

    let mut low: u64 = 0;
    for i in 0..5 {
        // SAFETY: the caller invariant guarantees at least 10 readable
        // bytes whenever a byte at index `i < 10` is reached without an
        // earlier terminator, and a terminator always returns before this
        // bound is exceeded.
        let byte = unsafe { *chunk.get_unchecked(i) };
        low |= u64::from(byte & 0x7F) << (7 * i);
        if byte < 0x80 {
            return Ok((low, i + 1));
        }
    }

    let mut high: u64 = 0;
    for i in 5..10 {
        let byte = unsafe { *chunk.get_unchecked(i) };
        if i == 9 {
            // The 10th byte only has room for one payload bit (64 - 63);
            // anything else means the varint overflows u64.
            if byte >= 0x02 {
                return Err(decode_error_kind::VarintTooLong::new().into_error());
            }
            high |= u64::from(byte & 0x7F) << (7 * (i - 5));
            return Ok((low | (high << 35), 10));
        }
        high |= u64::from(byte & 0x7F) << (7 * (i - 5));
        if byte < 0x80 {
            return Ok((low | (high << 35), i + 1));
        }
    }

    unreachable!("loop above always returns by the 10th byte")
}

/// Byte-at-a-time fallback for a varint that may run past the end of the
/// current chunk (a multi-chunk `Buf` implementation, or fewer than 10
/// bytes remaining with no terminator visible yet).
#[inline(never)]
#[cold]
fn decode_varint_byte_by_byte(buf: &mut impl Buf) -> Result<u64, DecodeError> {
    let mut value: u64 = 0;
    let mut shift = 0;
    while shift < 70 {
        if !buf.has_remaining() {
            return Err(decode_error_kind::TruncatedInput::new().into_error());
        }
        let byte = buf.get_u8();
        if shift == 63 && byte >= 0x02 {
            return Err(decode_error_kind::VarintTooLong::new().into_error());
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte < 0x80 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(decode_error_kind::VarintTooLong::new().into_error())
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec::Vec;

    fn assert_round_trips(value: u64, expected: &[u8]) {
        for capacity in [1, 32] {
            let mut buf = Vec::with_capacity(capacity);
            encode_varint(value, &mut buf);
            assert_eq!(buf, expected);
        }

        assert_eq!(encoded_len_varint(value), expected.len());
        assert_eq!(decode_varint(&mut &expected[..]).unwrap(), value);
        assert_eq!(
            decode_varint_byte_by_byte(&mut &expected[..]).unwrap(),
            value
        );
    }

    #[test]
    fn boundary_values_round_trip() {
        assert_round_trips(0, &[0x00]);
        assert_round_trips(1, &[0x01]);

        assert_round_trips(2u64.pow(7) - 1, &[0x7F]);
        assert_round_trips(2u64.pow(7), &[0x80, 0x01]);
        assert_round_trips(300, &[0xAC, 0x02]);

        assert_round_trips(2u64.pow(14) - 1, &[0xFF, 0x7F]);
        assert_round_trips(2u64.pow(14), &[0x80, 0x80, 0x01]);

        assert_round_trips(2u64.pow(21) - 1, &[0xFF, 0xFF, 0x7F]);
        assert_round_trips(2u64.pow(21), &[0x80, 0x80, 0x80, 0x01]);

        assert_round_trips(2u64.pow(28) - 1, &[0xFF, 0xFF, 0xFF, 0x7F]);
        assert_round_trips(2u64.pow(28), &[0x80, 0x80, 0x80, 0x80, 0x01]);

        assert_round_trips(
            2u64.pow(63) - 1,
            &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F],
        );
        assert_round_trips(
            2u64.pow(63),
            &[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01],
        );

        assert_round_trips(
            u64::MAX,
            &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01],
        );
    }

    const OVERFLOWING_VARINT: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02];

    #[test]
    fn ten_byte_varint_exceeding_u64_is_rejected() {
        decode_varint(&mut OVERFLOWING_VARINT).expect_err("u64::MAX + 1 should not decode");
    }

    #[test]
    fn byte_by_byte_path_also_rejects_overflow() {
        decode_varint_byte_by_byte(&mut OVERFLOWING_VARINT)
            .expect_err("u64::MAX + 1 should not decode via the fallback path either");
    }

    #[test]
    fn ten_byte_varint_leaves_trailing_bytes_untouched() {
        let mut bytes = Vec::from([0x80u8; 9]);
        bytes.push(0x01); // 10th byte terminates the varint: value = 1 << 63
        bytes.extend_from_slice(&[0xAB, 0xCD]); // belongs to whatever comes next

        let mut buf = &bytes[..];
        let value = decode_varint(&mut buf).unwrap();
        assert_eq!(value, 1u64 << 63);
        assert_eq!(buf, &[0xAB, 0xCD]);
    }

    #[cfg(feature = "std")]
    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn round_trips(value: u64) {
                let mut buf = Vec::new();
                encode_varint(value, &mut buf);
                prop_assert_eq!(encoded_len_varint(value), buf.len());
                prop_assert_eq!(decode_varint(&mut &buf[..]).unwrap(), value);
            }

            #[test]
            fn never_exceeds_ten_bytes(value: u64) {
                let mut buf = Vec::new();
                encode_varint(value, &mut buf);
                prop_assert!(buf.len() <= 10);
            }
        }
    }
}
