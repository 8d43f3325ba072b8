#![doc(html_root_url = "https://docs.rs/protowire/0.1.0")]
#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

// Re-export the alloc crate for use throughout the crate.
#[doc(hidden)]
pub extern crate alloc;

// Re-export the bytes crate: callers supply and receive `Bytes`/`BytesMut`
// values through the public API.
pub use bytes;

mod decode;
mod encode;
mod error;
mod raw;
mod value;

#[doc(hidden)]
pub mod encoding;

pub use crate::decode::{from_bytes, from_bytes_with_limits, from_raw_fields, from_raw_fields_with_limits};
pub use crate::encode::{
    encoded_len, encoded_len_with_limits, to_bytes, to_bytes_into_sink, to_bytes_into_sink_with_limits,
    to_bytes_with_limits,
};
pub use crate::encoding::length_delimiter::{
    decode_length_delimiter, encode_length_delimiter, length_delimiter_len,
};
pub use crate::encoding::{Limits, WireType};
pub use crate::error::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind, ErrorPath};
pub use crate::raw::decode_raw_fields;
pub use crate::value::{Field, FieldType, RawField, Value, ValueType};
