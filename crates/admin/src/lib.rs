//! HOE marketplace admin and vendor portal client.
//!
//! Both portals manage the same catalog documents through the same REST
//! backend; they differ in route prefix, session and reach:
//!
//! - **Admin** (`admin/...`, admin token): brands, categories,
//!   subcategories, products and every order
//! - **Vendor** (`vendor/...`, vendor token): the vendor's own products and
//!   the orders containing them
//!
//! Inputs are validated before any request is sent.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod collection;
pub mod error;
pub mod orders;
pub mod portal;
pub mod resource;

pub use collection::Collection;
pub use error::AdminError;
pub use orders::{OrderDesk, OrderFilter, ShipmentUpdate};
pub use portal::{Portal, PortalClient};
pub use resource::Resource;
