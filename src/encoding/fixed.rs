//! Little-endian fixed-width read/write helpers for the `fixed32`/`fixed64`/`sfixed32`/
//! `sfixed64`/`float`/`double` field types.

use ::bytes::{Buf, BufMut};

use crate::error::decode_error_kind;
use crate::DecodeError;

pub const FIXED32_LEN: usize = 4;
pub const FIXED64_LEN: usize = 8;

#[inline]
fn check_remaining(buf: &impl Buf, width: usize) -> Result<(), DecodeError> {
    if buf.remaining() < width {
        return Err(decode_error_kind::TruncatedInput::new().into_error());
    }
    Ok(())
}

#[inline]
pub fn get_fixed32(buf: &mut impl Buf) -> Result<u32, DecodeError> {
    check_remaining(buf, FIXED32_LEN)?;
    Ok(buf.get_u32_le())
}

#[inline]
pub fn put_fixed32(value: u32, buf: &mut impl BufMut) {
    buf.put_u32_le(value);
}

#[inline]
pub fn get_fixed64(buf: &mut impl Buf) -> Result<u64, DecodeError> {
    check_remaining(buf, FIXED64_LEN)?;
    Ok(buf.get_u64_le())
}

#[inline]
pub fn put_fixed64(value: u64, buf: &mut impl BufMut) {
    buf.put_u64_le(value);
}

#[inline]
pub fn get_sfixed32(buf: &mut impl Buf) -> Result<i32, DecodeError> {
    check_remaining(buf, FIXED32_LEN)?;
    Ok(buf.get_i32_le())
}

#[inline]
pub fn put_sfixed32(value: i32, buf: &mut impl BufMut) {
    buf.put_i32_le(value);
}

#[inline]
pub fn get_sfixed64(buf: &mut impl Buf) -> Result<i64, DecodeError> {
    check_remaining(buf, FIXED64_LEN)?;
    Ok(buf.get_i64_le())
}

#[inline]
pub fn put_sfixed64(value: i64, buf: &mut impl BufMut) {
    buf.put_i64_le(value);
}

#[inline]
pub fn get_float(buf: &mut impl Buf) -> Result<f32, DecodeError> {
    check_remaining(buf, FIXED32_LEN)?;
    Ok(buf.get_f32_le())
}

#[inline]
pub fn put_float(value: f32, buf: &mut impl BufMut) {
    buf.put_f32_le(value);
}

#[inline]
pub fn get_double(buf: &mut impl Buf) -> Result<f64, DecodeError> {
    check_remaining(buf, FIXED64_LEN)?;
    Ok(buf.get_f64_le())
}

#[inline]
pub fn put_double(value: f64, buf: &mut impl BufMut) {
    buf.put_f64_le(value);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed32_round_trip() {
        let mut buf = Vec::new();
        put_fixed32(0xdead_beef, &mut buf);
        assert_eq!(buf, [0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(get_fixed32(&mut &buf[..]).unwrap(), 0xdead_beef);
    }

    #[test]
    fn fixed64_round_trip() {
        let mut buf = Vec::new();
        put_fixed64(0x0102_0304_0506_0708, &mut buf);
        assert_eq!(get_fixed64(&mut &buf[..]).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn float_round_trip() {
        let mut buf = Vec::new();
        put_float(1.5, &mut buf);
        assert_eq!(get_float(&mut &buf[..]).unwrap(), 1.5);
    }

    #[test]
    fn double_round_trip() {
        let mut buf = Vec::new();
        put_double(core::f64::consts::PI, &mut buf);
        assert_eq!(get_double(&mut &buf[..]).unwrap(), core::f64::consts::PI);
    }

    #[test]
    fn truncated_fixed32_errors() {
        let mut buf: &[u8] = &[0x01, 0x02];
        assert!(get_fixed32(&mut buf).is_err());
    }
}
