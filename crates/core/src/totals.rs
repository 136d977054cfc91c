//! Order total arithmetic.
//!
//! Checkout charges a flat 10% tax on the subtotal and free shipping. Tax is
//! rounded half away from zero to two decimal places; the total is the sum of
//! the rounded parts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::entities::CartItem;
use crate::types::Price;

/// Flat tax rate applied to every order, in percent.
pub const TAX_RATE_PERCENT: u32 = 10;

/// Shipping charge applied to every order.
pub const SHIPPING_FEE: Decimal = Decimal::ZERO;

/// Subtotal, tax, shipping and grand total for a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from `(unit_price, quantity)` pairs.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = (Decimal, u32)>) -> Self {
        let subtotal = lines
            .into_iter()
            .map(|(unit, qty)| unit * Decimal::from(qty))
            .sum::<Decimal>()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self::from_subtotal(subtotal)
    }

    /// Compute totals for cart lines. Lines whose product is gone are not
    /// charged.
    #[must_use]
    pub fn from_cart(items: &[CartItem]) -> Self {
        Self::from_lines(
            items
                .iter()
                .filter(|i| i.is_available())
                .map(|i| (i.unit_price(), i.quantity)),
        )
    }

    /// Compute tax, shipping and total for a known subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let tax = (subtotal * Decimal::from(TAX_RATE_PERCENT) / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let shipping = SHIPPING_FEE;
        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    /// Grand total in rupees.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::inr(self.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_tax_and_free_shipping() {
        let totals = OrderTotals::from_lines([
            (Decimal::new(49_900, 2), 2),
            (Decimal::new(120, 0), 1),
        ]);
        assert_eq!(totals.subtotal, Decimal::new(111_800, 2));
        assert_eq!(totals.tax, Decimal::new(11_180, 2));
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(122_980, 2));
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 10% of 0.05 = 0.005 -> 0.01
        let totals = OrderTotals::from_subtotal(Decimal::new(5, 2));
        assert_eq!(totals.tax, Decimal::new(1, 2));
        assert_eq!(totals.total, Decimal::new(6, 2));
    }

    #[test]
    fn test_empty_lines_are_zero() {
        let totals = OrderTotals::from_lines(std::iter::empty());
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_serializes_as_numbers() {
        let totals = OrderTotals::from_subtotal(Decimal::new(100, 0));
        let json = serde_json::to_value(totals).unwrap();
        assert_eq!(json["tax"], serde_json::json!(10.0));
        assert_eq!(json["total"], serde_json::json!(110.0));
    }

    #[test]
    fn test_cart_totals_skip_deleted_products() {
        let items: Vec<CartItem> = serde_json::from_value(serde_json::json!([
            {"_id": "ci1", "product": "p1", "quantity": 2, "price": 100},
            {"_id": "ci2", "product": null, "quantity": 1, "price": 99}
        ]))
        .unwrap();
        let totals = OrderTotals::from_cart(&items);
        assert_eq!(totals.subtotal, Decimal::new(200, 0));
        assert_eq!(totals.total, Decimal::new(220, 0));
    }
}
