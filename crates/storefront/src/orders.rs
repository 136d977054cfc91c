//! Order history and order creation.

use hoe_core::{Address, CartItem, Order, OrderId, OrderTotals, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::api::{ApiClient, ApiError, Auth, envelope};
use crate::session::TokenNamespace;

const AUTH: Auth = Auth::Session(TokenNamespace::Customer);

/// A line in an order creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub product: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl NewOrderLine {
    /// The order line for a cart line, or `None` if its product is gone.
    #[must_use]
    pub fn from_cart_item(item: &CartItem) -> Option<Self> {
        Some(Self {
            product: ProductId::new(item.product_id()?),
            name: item.display_name().to_string(),
            quantity: item.quantity,
            price: item.unit_price(),
        })
    }
}

/// Razorpay proof attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderPayment {
    pub method: &'static str,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Body of `POST orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderLine>,
    pub shipping_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    pub payment: NewOrderPayment,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Customer order routes.
#[derive(Clone)]
pub struct OrderClient {
    api: ApiClient,
}

impl OrderClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// The signed-in customer's orders, newest first as the backend sends
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.api.get_list("orders", AUTH).await
    }

    /// One order by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let value = self.api.get::<Value>(&format!("orders/{id}"), AUTH).await?;
        Ok(serde_json::from_value(envelope::unnest(value, "order"))?)
    }

    /// Create an order.
    ///
    /// No idempotency key is sent: repeating a call after a timeout can
    /// create a second order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the order.
    #[instrument(skip(self, order), fields(lines = order.items.len(), total = %order.totals.total))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let value = self.api.post::<Value, _>("orders", order, AUTH).await?;
        let order: Order = serde_json::from_value(envelope::unnest(value, "order"))?;
        info!(order_id = %order.id, "order created");
        Ok(order)
    }
}
