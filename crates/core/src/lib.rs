//! HOE Core - Shared marketplace types.
//!
//! This crate provides the types used across all HOE client components:
//! - `storefront` - Customer-facing catalog, cart, wishlist and checkout client
//! - `admin` - Admin and vendor portal CRUD client
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! Entities are transient copies of documents owned by the marketplace
//! backend; nothing here persists or enforces referential integrity.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, emails and status enums
//! - [`entities`] - Catalog, cart, wishlist, order and user documents
//! - [`input`] - Form inputs and their validation rules
//! - [`totals`] - Order total arithmetic (flat tax, free shipping)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entities;
pub mod input;
pub mod totals;
pub mod types;

pub use entities::*;
pub use input::*;
pub use totals::{OrderTotals, SHIPPING_FEE, TAX_RATE_PERCENT};
pub use types::*;
