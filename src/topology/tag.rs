//! Shared literal handling for the closed direction enumerations.
//!
//! Each tag type stores a small index; the value one past the last valid
//! index is the `null` tag. On the wire a tag is either JSON `null` or a fixed
//! upper-case literal, and `Display`/`FromStr` use the same literals.

use crate::domain_error::DomainError;

/// Common behavior of [`Side`](super::Side), [`Corner`](super::Corner),
/// [`Edge`](super::Edge) and [`Orthant`](super::Orthant).
pub trait DirectionTag: Copy + Eq + Sized {
    /// Type name used in diagnostics.
    const KIND: &'static str;

    /// Literals of the non-null values, in index order.
    fn literals() -> &'static [&'static str];

    /// Raw index; equals `literals().len()` for the null tag.
    fn raw(self) -> usize;

    /// Tag with the given raw index. Out-of-range indices give the null tag.
    fn from_raw(index: usize) -> Self;

    fn null() -> Self {
        Self::from_raw(Self::literals().len())
    }

    fn literal(self) -> Option<&'static str> {
        Self::literals().get(self.raw()).copied()
    }

    /// Index of a concrete tag, or `InvalidDirection` for null.
    fn checked_index(self) -> Result<usize, DomainError> {
        if self.raw() < Self::literals().len() {
            Ok(self.raw())
        } else {
            Err(DomainError::InvalidDirection { kind: Self::KIND })
        }
    }

    fn from_literal(literal: &str) -> Result<Self, DomainError> {
        Self::literals()
            .iter()
            .position(|l| *l == literal)
            .map(Self::from_raw)
            .ok_or_else(|| DomainError::SerializationFormat {
                kind: Self::KIND,
                literal: literal.to_string(),
            })
    }
}

/// Implements serde, `Display` and `FromStr` for a const-generic tag type in
/// terms of its [`DirectionTag`] literals.
macro_rules! direction_tag_impls {
    ($ty:ident) => {
        impl<const D: usize> serde::Serialize for $ty<D> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let literal = $crate::topology::tag::DirectionTag::literal(*self);
                serde::Serialize::serialize(&literal, serializer)
            }
        }

        impl<'de, const D: usize> serde::Deserialize<'de> for $ty<D> {
            fn deserialize<De: serde::Deserializer<'de>>(
                deserializer: De,
            ) -> Result<Self, De::Error> {
                let literal: Option<String> = serde::Deserialize::deserialize(deserializer)?;
                match literal {
                    None => Ok(<Self as $crate::topology::tag::DirectionTag>::null()),
                    Some(lit) => <Self as $crate::topology::tag::DirectionTag>::from_literal(&lit)
                        .map_err(serde::de::Error::custom),
                }
            }
        }

        impl<const D: usize> std::fmt::Display for $ty<D> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::topology::tag::DirectionTag::literal(*self).unwrap_or("null"))
            }
        }

        impl<const D: usize> std::str::FromStr for $ty<D> {
            type Err = $crate::domain_error::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s == "null" {
                    Ok(<Self as $crate::topology::tag::DirectionTag>::null())
                } else {
                    <Self as $crate::topology::tag::DirectionTag>::from_literal(s)
                }
            }
        }
    };
}

pub(crate) use direction_tag_impls;
