/// Declares a catalog row identifier: a transparent `i64` newtype that
/// serializes as a bare number.
///
/// Generated items:
/// - derives for ordering, hashing and serde (`#[serde(transparent)]`)
/// - `Display` and `FromStr` (path segments parse through it)
/// - conversions to and from `i64`
/// - `is_assigned()`: store-issued ids are strictly positive
///
/// Usage:
///   define_row_id!(AuthorId, "author");
#[macro_export]
macro_rules! define_row_id {
    ($name:ident, $entity:literal) => {
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub const ENTITY: &'static str = $entity;

            pub fn new(value: i64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }

            pub fn is_assigned(&self) -> bool {
                self.0 > 0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map($name)
            }
        }

        impl ::std::convert::From<i64> for $name {
            fn from(v: i64) -> Self {
                $name(v)
            }
        }

        impl ::std::convert::From<$name> for i64 {
            fn from(v: $name) -> Self {
                v.0
            }
        }
    };
}
