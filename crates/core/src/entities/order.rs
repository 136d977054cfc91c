//! Orders with their address, payment and shipment sub-documents.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Identified, Product, User};
use crate::types::{OrderId, OrderStatus, PaymentStatus, Price, Ref, ShipmentStatus};

/// Latitude/longitude pair obtained from geocoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A postal address as stored on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Address {
    /// Single-line form used for geocoding queries and display.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address_line1.as_str()];
        if let Some(line2) = self.address_line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        parts.extend([
            self.city.as_str(),
            self.state.as_str(),
            self.postal_code.as_str(),
            self.country.as_str(),
        ]);
        parts.join(", ")
    }
}

/// A purchased line, priced at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(default)]
    pub product: Ref<Product>,
    #[serde(default)]
    pub name: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
}

/// Payment sub-document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Shipment sub-document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub status: ShipmentStatus,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// A finalized purchase record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub user: Option<Ref<User>>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub payment: Option<PaymentInfo>,
    #[serde(default)]
    pub shipment: Option<Shipment>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Order total in rupees.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::inr(self.total)
    }

    /// Number of units across all lines, saturating at `u32::MAX`.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count: u32, l| count.saturating_add(l.quantity))
    }

    /// Human-facing reference: the order number when assigned, else the ID.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.order_number.as_deref().unwrap_or(self.id.as_str())
    }
}

impl Identified for Order {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_decodes_with_sub_documents() {
        let order: Order = serde_json::from_str(
            r#"{
                "_id": "o1",
                "items": [{"product": "p1", "quantity": 2, "price": 100}],
                "shippingAddress": {
                    "fullName": "Asha Rao", "phone": "9876543210",
                    "addressLine1": "12 MG Road", "city": "Bengaluru",
                    "state": "Karnataka", "postalCode": "560001", "country": "India",
                    "coordinates": {"lat": 12.97, "lng": 77.59}
                },
                "payment": {"method": "razorpay", "razorpayPaymentId": "pay_1", "status": "paid"},
                "shipment": {"trackingNumber": "TRK1", "status": "in_transit"},
                "subtotal": 200, "tax": 20, "shipping": 0, "total": 220,
                "status": "confirmed",
                "createdAt": "2024-05-01T10:00:00.000Z"
            }"#,
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.unit_count(), 2);
        assert_eq!(order.reference(), "o1");
        assert_eq!(order.payment.as_ref().unwrap().status, PaymentStatus::Paid);
        assert_eq!(order.shipment.as_ref().unwrap().status, ShipmentStatus::InTransit);
        assert_eq!(order.total_price().to_string(), "₹220.00");
    }

    #[test]
    fn test_order_line_for_deleted_product_decodes() {
        let line: OrderLine =
            serde_json::from_str(r#"{"product":null,"name":"Old Mug","quantity":1,"price":99}"#)
                .unwrap();
        assert!(line.product.is_missing());
        assert_eq!(line.name.as_deref(), Some("Old Mug"));
    }

    #[test]
    fn test_address_one_line_skips_empty_line2() {
        let address = Address {
            full_name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            address_line1: "12 MG Road".to_string(),
            address_line2: Some(String::new()),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            postal_code: "560001".to_string(),
            country: "India".to_string(),
            coordinates: None,
        };
        assert_eq!(
            address.one_line(),
            "12 MG Road, Bengaluru, Karnataka, 560001, India"
        );
    }
}
