//! Core identifier types for stubmarket.
//!
//! The marketplace backend keys every record with a positive integer. These
//! newtypes keep a stub ID from being passed where a listing ID is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a positive integer identifier with parsing, display, and serde support.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "` from a raw value.")]
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Return the raw integer value.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: i64 = s
                    .trim()
                    .parse()
                    .map_err(|_| IdError::NotANumber(s.to_string()))?;
                if value <= 0 {
                    return Err(IdError::NotPositive(value));
                }
                Ok(Self(value))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of an uploaded ticket stub.
    StubId
);

numeric_id!(
    /// Identifier of a marketplace listing.
    ListingId
);

numeric_id!(
    /// Identifier of a seller (the user who owns a listing).
    SellerId
);

numeric_id!(
    /// Identifier of a purchase record.
    PurchaseId
);

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not an integer.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// The input is zero or negative.
    #[error("identifier must be positive, got {0}")]
    NotPositive(i64),
}
