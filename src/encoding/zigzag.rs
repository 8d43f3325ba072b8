//! ZigZag transforms between signed integers and their unsigned varint-friendly encoding,
//! as used by the `sint32`/`sint64` field types.

/// Maps a signed 32-bit integer to an unsigned 32-bit integer so that numbers with a small
/// absolute value have a small varint encoding.
#[inline]
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`].
#[inline]
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ (-((value & 1) as i32))
}

/// Maps a signed 64-bit integer to an unsigned 64-bit integer so that numbers with a small
/// absolute value have a small varint encoding.
#[inline]
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`].
#[inline]
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ (-((value & 1) as i64))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zigzag32_round_trips() {
        for value in [0, 1, -1, 2, -2, i32::MIN, i32::MAX] {
            assert_eq!(zigzag_decode32(zigzag_encode32(value)), value);
        }
    }

    #[test]
    fn zigzag32_small_magnitudes_are_small() {
        assert_eq!(zigzag_encode32(0), 0);
        assert_eq!(zigzag_encode32(-1), 1);
        assert_eq!(zigzag_encode32(1), 2);
        assert_eq!(zigzag_encode32(-2), 3);
        assert_eq!(zigzag_encode32(2), 4);
    }

    #[test]
    fn zigzag64_round_trips() {
        for value in [0, 1, -1, 2, -2, i64::MIN, i64::MAX] {
            assert_eq!(zigzag_decode64(zigzag_encode64(value)), value);
        }
    }

    #[cfg(feature = "std")]
    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn round_trips32(value: i32) {
                prop_assert_eq!(zigzag_decode32(zigzag_encode32(value)), value);
            }

            #[test]
            fn round_trips64(value: i64) {
                prop_assert_eq!(zigzag_decode64(zigzag_encode64(value)), value);
            }

            #[test]
            fn small_magnitudes_stay_small32(value in -8i32..=8) {
                // |value| <= 8 always zigzags to a value that fits one varint byte group (< 2^7).
                prop_assert!(zigzag_encode32(value) < 0x80);
            }
        }
    }
}
