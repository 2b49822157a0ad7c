//! Prefixed ULID identifiers.

use crate::{IdError, Ulid};

/// Splits `{prefix}_{ulid}` and checks the prefix. Shared by every type
/// generated through [`define_id!`].
#[doc(hidden)]
pub fn parse_prefixed(input: &str, prefix: &'static str) -> Result<Ulid, IdError> {
    if input.is_empty() {
        return Err(IdError::Empty);
    }
    let (head, tail) = input.split_once('_').ok_or(IdError::MissingSeparator)?;
    if head != prefix {
        return Err(IdError::InvalidPrefix {
            expected: prefix,
            actual: head.to_owned(),
        });
    }
    Ulid::from_string(tail).map_err(|err| IdError::InvalidUlid(err.to_string()))
}

/// Declares a `Copy` identifier wrapping a [`Ulid`], rendered as
/// `{prefix}_{ulid}` in text and in serde.
///
/// ```ignore
/// define_id!(
///     /// A loan.
///     LoanId, "loan"
/// );
/// let id: LoanId = "loan_01HV4Z3MXNKPQR9HSTZ7WCLD4E".parse()?;
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::Ulid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generates a fresh identifier.
            #[must_use]
            pub fn new() -> Self {
                $name($crate::Ulid::new())
            }

            #[must_use]
            pub const fn from_ulid(ulid: $crate::Ulid) -> Self {
                $name(ulid)
            }

            #[must_use]
            pub const fn ulid(&self) -> $crate::Ulid {
                self.0
            }

            /// Milliseconds since the Unix epoch encoded in the ULID.
            pub fn timestamp_ms(&self) -> u64 {
                self.0.timestamp_ms()
            }

            pub fn parse(input: &str) -> Result<Self, $crate::IdError> {
                $crate::macros::parse_prefixed(input, $prefix).map($name)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::new()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, out: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(out, concat!($prefix, "_{}"), self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(input: &str) -> Result<Self, $crate::IdError> {
                $name::parse(input)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<Ser: ::serde::Serializer>(&self, ser: Ser) -> Result<Ser::Ok, Ser::Error> {
                ser.collect_str(self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<De: ::serde::Deserializer<'de>>(de: De) -> Result<Self, De::Error> {
                let raw = <::std::borrow::Cow<'de, str>>::deserialize(de)?;
                $name::parse(&raw).map_err(::serde::de::Error::custom)
            }
        }
    };
}
