//! Protobuf encoding and decoding errors.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::error::Error;
use core::fmt;

pub use decode_error_kind::DecodeErrorKind;
pub use encode_error_kind::EncodeErrorKind;

use crate::encoding::WireType;

/// A Protobuf message decoding error.
///
/// `DecodeError` indicates that the input buffer does not contain a valid
/// Protobuf message for the schema it was decoded against. The error
/// details should be considered 'best effort': in general it is not
/// possible to exactly pinpoint why data is malformed.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodeError {
    inner: Box<Inner<DecodeErrorKind>>,
}

/// A Protobuf message encoding error.
///
/// `EncodeError` indicates that the caller-supplied fields could not be
/// serialized: an out-of-range field number, a `repeated` value whose
/// elements don't share a shape, or a nesting guard tripping.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodeError {
    inner: Box<Inner<EncodeErrorKind>>,
}

#[derive(Clone, PartialEq, Eq)]
struct Inner<K> {
    /// A 'best effort' root cause description.
    kind: K,
    /// Field-number path from the outermost message down to where the
    /// error occurred. Built innermost-first as the error propagates back
    /// up the recursive call stack, then read outermost-first.
    path: ErrorPath,
}

/// Logical path to the location of an error, expressed as a stack of field
/// numbers rather than field names: this codec has no `.proto` source to
/// recover names from.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ErrorPath {
    segments: Vec<u32>,
}

impl ErrorPath {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Field numbers from the outermost message down to the nested field
    /// where the error occurred.
    pub fn field_numbers(&self) -> &[u32] {
        &self.segments
    }

    fn push_outermost(&mut self, field_number: u32) {
        self.segments.insert(0, field_number);
    }
}

macro_rules! impl_error_common {
    ($error:ident, $kind:ident) => {
        impl $error {
            /// Get details about the error.
            pub fn kind(&self) -> &$kind {
                &self.inner.kind
            }

            /// Get the location where the error occurred as a field-number path.
            pub fn path(&self) -> &ErrorPath {
                &self.inner.path
            }

            /// Record that this error was reached through the nested field
            /// `field_number`. Called once per level of nesting while the
            /// error unwinds, so the outermost call contributes last and
            /// `path()` reads outermost-first.
            pub(crate) fn push_field(&mut self, field_number: u32) {
                self.inner.path.push_outermost(field_number);
            }
        }

        impl From<$kind> for $error {
            fn from(kind: $kind) -> Self {
                $error {
                    inner: Box::new(Inner {
                        kind,
                        path: ErrorPath::new(),
                    }),
                }
            }
        }

        impl fmt::Debug for $error {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($error))
                    .field("kind", &self.inner.kind)
                    .field("path", &self.inner.path)
                    .finish()
            }
        }

        impl fmt::Display for $error {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.inner.kind)?;
                for field_number in self.inner.path.field_numbers() {
                    write!(f, " at field {}", field_number)?;
                }
                Ok(())
            }
        }

        impl Error for $error {
            fn source(&self) -> Option<&(dyn Error + 'static)> {
                Some(self.inner.kind.inner())
            }
        }

        #[cfg(feature = "std")]
        impl From<$error> for std::io::Error {
            fn from(error: $error) -> std::io::Error {
                std::io::Error::new(std::io::ErrorKind::InvalidData, error)
            }
        }
    };
}

impl_error_common!(DecodeError, DecodeErrorKind);
impl_error_common!(EncodeError, EncodeErrorKind);

/// Generates a `#[non_exhaustive]` enum of small `Display`-able structs, one
/// per error kind: each kind carries just the fields it needs to render a
/// useful message, and each converts into the enum and into the owning
/// error type.
macro_rules! impl_error_kind {
    {
        $enum_name:ident, $error:ident;
        $(
            $(#[doc = $doc:literal])*
            #[description($description:literal)]
            pub struct $name:ident {
                $(
                    #[get($field_get:ty)]
                    $field:ident: $field_type:ty
                ),*$(,)?
            }
        )*
    } => {
        #[derive(Clone, Debug, PartialEq, Eq)]
        #[non_exhaustive]
        pub enum $enum_name {
            $(
                $(#[doc = $doc])*
                $name($name),
            )*
        }

        impl $enum_name {
            pub(crate) fn inner(&self) -> &(dyn Error + 'static) {
                match self {
                    $(Self::$name(inner) => inner,)*
                }
            }
        }

        impl fmt::Display for $enum_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$name(inner) => inner.fmt(f),)*
                }
            }
        }

        $(
            $(#[doc = $doc])*
            #[derive(Clone, Debug, PartialEq, Eq)]
            #[non_exhaustive]
            pub struct $name {
                $(pub(crate) $field: $field_type,)*
            }

            impl $name {
                pub(crate) fn new($($field: $field_type,)*) -> Self {
                    Self { $($field,)* }
                }

                pub(crate) fn into_kind(self) -> $enum_name {
                    $enum_name::$name(self)
                }

                pub(crate) fn into_error(self) -> super::$error {
                    super::$error::from(self.into_kind())
                }

                $(
                    pub fn $field(&self) -> $field_get {
                        self.$field
                    }
                )*
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, $description, $($field = self.$field,)*)
                }
            }

            impl Error for $name {}

            impl From<$name> for $enum_name {
                fn from(value: $name) -> Self {
                    value.into_kind()
                }
            }

            impl From<$name> for super::$error {
                fn from(value: $name) -> Self {
                    value.into_error()
                }
            }
        )*
    };
}

pub mod decode_error_kind {
    use super::*;

    impl_error_kind! {
        DecodeErrorKind, DecodeError;

        /// The wire tag, a varint, or a length-delimited payload ended
        /// before it should have.
        #[description("truncated input")]
        pub struct TruncatedInput {}

        /// A varint occupied more than the 10-byte ceiling for a 64-bit value.
        #[description("varint too long")]
        pub struct VarintTooLong {}

        /// A decoded varint does not fit the declared scalar type's range.
        #[description("varint out of range for field {field_number}")]
        pub struct VarintOutOfRange {
            #[get(u32)]
            field_number: u32,
        }

        /// A field number fell outside `[1, 2^29 - 1]`.
        #[description("invalid field number: {value}")]
        pub struct InvalidFieldNumber {
            #[get(u64)]
            value: u64,
        }

        /// The 3-bit wire type code on a tag was not one of 0, 1, 2, 5.
        #[description("invalid wire type value: {value}")]
        pub struct InvalidWireType {
            #[get(u64)]
            value: u64,
        }

        /// A decoded wire type did not match the one the schema required
        /// for this field.
        #[description("invalid wire type: {actual:?} (expected {expected:?})")]
        pub struct UnexpectedWireType {
            #[get(WireType)]
            actual: WireType,
            #[get(WireType)]
            expected: WireType,
        }

        /// A `string` field's payload was not valid UTF-8.
        #[description("invalid string value: data is not UTF-8 encoded")]
        pub struct InvalidUtf8 {}

        /// A `bool` field's payload was neither 0 nor 1.
        #[description("invalid bool value: {value}")]
        pub struct InvalidBool {
            #[get(u64)]
            value: u64,
        }

        /// A field number present on the wire has no entry in the schema.
        #[description("field {field_number} is not present in the schema")]
        pub struct SchemaMismatch {
            #[get(u32)]
            field_number: u32,
        }

        /// A map entry submessage had a field number other than 1 or 2.
        #[description("invalid map entry: unexpected field {field_number}")]
        pub struct InvalidMapEntry {
            #[get(u32)]
            field_number: u32,
        }

        /// A `map` field's schema declared a key type other than a scalar,
        /// `string`, or `bytes`.
        #[description("field {field_number} has an invalid map key type")]
        pub struct InvalidMapKeyType {
            #[get(u32)]
            field_number: u32,
        }

        /// The same field number appeared with incompatible value shapes
        /// across two occurrences on the wire.
        #[description("field {field_number} occurrences have incompatible shapes")]
        pub struct MergeTypeConflict {
            #[get(u32)]
            field_number: u32,
        }

        /// Nested-message or map recursion exceeded the configured limit.
        #[description("recursion limit reached")]
        pub struct DepthExceeded {}

        /// A length-delimited prefix exceeded the configured maximum.
        #[description("length delimiter {value} exceeds the configured maximum")]
        pub struct LengthExceeded {
            #[get(u64)]
            value: u64,
        }
    }
}

pub mod encode_error_kind {
    use super::*;

    impl_error_kind! {
        EncodeErrorKind, EncodeError;

        /// A field number fell outside `[1, 2^29 - 1]`.
        #[description("invalid field number: {value}")]
        pub struct InvalidFieldNumber {
            #[get(u64)]
            value: u64,
        }

        /// A `repeated` value's elements did not share a discriminant/shape.
        #[description("field {field_number} repeated value has heterogeneous elements")]
        pub struct HeterogeneousRepeated {
            #[get(u32)]
            field_number: u32,
        }

        /// A value discriminant had no valid wire-type mapping. Should be
        /// unreachable for a well-formed `Value`; kept as a defensive guard.
        #[description("field {field_number} has no valid wire-type mapping")]
        pub struct WireValueMismatch {
            #[get(u32)]
            field_number: u32,
        }

        /// Nested-message recursion exceeded the configured limit.
        #[description("recursion limit reached")]
        pub struct DepthExceeded {}
    }
}
