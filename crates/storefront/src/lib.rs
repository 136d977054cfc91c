//! HOE marketplace storefront client.
//!
//! Typed access to the marketplace backend for shoppers: catalog browsing,
//! a server-synchronized cart and wishlist, order history and the Razorpay
//! checkout flow. The admin and vendor portals build on the same
//! [`api::ApiClient`].
//!
//! ```rust,ignore
//! let storefront = Storefront::new(StorefrontConfig::from_env()?, tokens)?;
//! let mut cart = storefront.cart();
//! cart.add(&product_id, 2).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod geocode;
pub mod orders;
pub mod payment;
pub mod session;
pub mod state;
pub mod wishlist;

pub use error::Error;
pub use state::Storefront;
