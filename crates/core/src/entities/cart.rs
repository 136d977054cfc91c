//! Cart line items and wishlist entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Identified, Product};
use crate::types::{CartItemId, Ref, WishlistItemId};

const UNAVAILABLE: &str = "(unavailable product)";

/// A (product, quantity) pairing in a user's server-side cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    #[serde(default)]
    pub product: Ref<Product>,
    pub quantity: u32,
    /// Unit price captured by the backend when the line was added.
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl CartItem {
    /// ID of the product on this line, unless the product is gone.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        self.product.id()
    }

    /// Whether the line still refers to a product. Lines whose product was
    /// deleted stay in the cart until removed but cannot be ordered.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.product.is_missing()
    }

    /// Unit price: the captured line price, else the populated product's
    /// effective price, else zero.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.price
            .or_else(|| self.product.populated().map(Product::effective_price))
            .unwrap_or(Decimal::ZERO)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }

    /// Display name, falling back to the product ID when not populated.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.product.populated() {
            Some(product) => &product.name,
            None => self.product_id().unwrap_or(UNAVAILABLE),
        }
    }
}

impl Identified for CartItem {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

/// A product saved for later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(rename = "_id")]
    pub id: WishlistItemId,
    /// Required so a bare product list never reads as wishlist entries.
    pub product: Ref<Product>,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

impl WishlistItem {
    /// ID of the saved product, unless it is gone.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        self.product.id()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_uses_captured_price() {
        let item: CartItem = serde_json::from_str(
            r#"{"_id":"ci1","product":{"_id":"p1","name":"Mug","price":300},"quantity":2,"price":250}"#,
        )
        .unwrap();
        assert_eq!(item.unit_price(), Decimal::new(250, 0));
        assert_eq!(item.line_total(), Decimal::new(500, 0));
        assert_eq!(item.display_name(), "Mug");
    }

    #[test]
    fn test_line_total_falls_back_to_product_price() {
        let item: CartItem = serde_json::from_str(
            r#"{"_id":"ci1","product":{"_id":"p1","name":"Mug","price":300,"discountPrice":280},"quantity":3}"#,
        )
        .unwrap();
        assert_eq!(item.line_total(), Decimal::new(840, 0));
    }

    #[test]
    fn test_unpopulated_product_without_price_is_zero() {
        let item: CartItem =
            serde_json::from_str(r#"{"_id":"ci1","product":"p9","quantity":1}"#).unwrap();
        assert_eq!(item.product_id(), Some("p9"));
        assert_eq!(item.display_name(), "p9");
        assert_eq!(item.line_total(), Decimal::ZERO);
    }

    #[test]
    fn test_deleted_product_line_still_decodes() {
        let item: CartItem =
            serde_json::from_str(r#"{"_id":"ci2","product":null,"quantity":1,"price":99}"#)
                .unwrap();
        assert!(!item.is_available());
        assert_eq!(item.product_id(), None);
        assert_eq!(item.display_name(), "(unavailable product)");
        assert_eq!(item.line_total(), Decimal::new(99, 0));
    }

    #[test]
    fn test_partially_populated_product_uses_line_price() {
        let item: CartItem = serde_json::from_str(
            r#"{"_id":"ci3","product":{"_id":"p1","name":"Mug","images":[]},"quantity":2,"price":250}"#,
        )
        .unwrap();
        assert!(item.is_available());
        assert_eq!(item.product_id(), Some("p1"));
        assert_eq!(item.line_total(), Decimal::new(500, 0));
    }
}
