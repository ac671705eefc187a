//! Core types and utilities for stubmarket.
//!
//! This crate provides the foundational types shared by the stubmarket client crates:
//!
//! - **Identifiers**: Strongly-typed IDs for stubs, listings, sellers, and purchases
//! - **Credentials**: The access/refresh token pair
//!
//! # Example
//!
//! ```
//! use stubmarket_core::{ListingId, StubId};
//!
//! let stub_id: StubId = "42".parse().unwrap();
//! assert_eq!(stub_id.get(), 42);
//!
//! let listing_id = ListingId::new(7);
//! assert_eq!(listing_id.to_string(), "7");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credentials;
pub mod ids;

pub use credentials::Credentials;
pub use ids::{IdError, ListingId, PurchaseId, SellerId, StubId};
