//! Marketplace documents as returned by the backend.
//!
//! Field names follow the backend's camelCase JSON and `_id` identifiers.
//! Every type is a disposable copy fetched on demand; optional fields default
//! so that partially populated responses still decode.

mod cart;
mod catalog;
mod order;
mod user;

pub use cart::{CartItem, WishlistItem};
pub use catalog::{Brand, Category, Product, ProductAttribute, Subcategory, VendorSummary};
pub use order::{Address, Coordinates, Order, OrderLine, PaymentInfo, Shipment};
pub use user::User;

pub use crate::types::reference::Identified;

use serde::{Deserialize, Deserializer};

pub(crate) const fn default_true() -> bool {
    true
}

/// Accept a string, number or boolean and keep its textual form.
pub(crate) fn string_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
