//! Cart client state, synchronized against the remote cart API.
//!
//! The server-side cart is authoritative. Every mutation calls the backend
//! and then unconditionally refetches the whole cart, replacing the local
//! copy; there is no conflict resolution and no offline queue. Item count and
//! subtotal are recomputed from the fetched lines on demand.
//!
//! On failure the cart is refetched so local state reverts to what the server
//! holds. A 401 is the exception: the client has already cleared the
//! customer token, so the local lines are dropped and the error is returned
//! for the caller to send the user to login.

use hoe_core::{CartItem, CartItemId, OrderTotals, ProductId};
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::api::{ApiClient, ApiError, Auth};
use crate::session::TokenNamespace;

const AUTH: Auth = Auth::Session(TokenNamespace::Customer);

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantities must be positive when adding.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Cart payloads arrive as a document with an `items` array or as the bare
/// array of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CartPayload {
    Lines(Vec<CartItem>),
    Document {
        #[serde(default, alias = "cartItems")]
        items: Vec<CartItem>,
    },
}

impl CartPayload {
    fn into_items(self) -> Vec<CartItem> {
        match self {
            Self::Lines(items) | Self::Document { items } => items,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddLine<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct SetQuantity {
    quantity: u32,
}

/// In-memory mirror of the customer's server-side cart.
pub struct CartManager {
    api: ApiClient,
    items: Vec<CartItem>,
}

impl CartManager {
    /// Create an empty, not yet fetched cart.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self {
            api,
            items: Vec::new(),
        }
    }

    /// Lines from the last fetch.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the last fetch returned no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines, saturating at `u32::MAX`.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count: u32, i| count.saturating_add(i.quantity))
    }

    /// Sum of line totals, leaving out lines whose product is gone.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .filter(|i| i.is_available())
            .map(CartItem::line_total)
            .sum()
    }

    /// Subtotal, tax, shipping and total for the current lines.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from_cart(&self.items)
    }

    /// The line holding `product_id`, if any.
    #[must_use]
    pub fn find_by_product(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|i| i.product_id() == Some(product_id.as_str()))
    }

    /// Replace local state with the server's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<&[CartItem], CartError> {
        match self.api.get::<Option<CartPayload>>("cart", AUTH).await {
            Ok(payload) => {
                self.items = payload.map(CartPayload::into_items).unwrap_or_default();
                Ok(&self.items)
            }
            Err(err) => {
                if matches!(err, ApiError::Unauthorized(_)) {
                    self.items.clear();
                }
                Err(err.into())
            }
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` for a zero quantity, otherwise any
    /// backend failure (after local state has been reverted).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&mut self, product_id: &ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        let api = self.api.clone();
        let result = api
            .post::<IgnoredAny, _>(
                "cart",
                &AddLine {
                    product_id,
                    quantity,
                },
                AUTH,
            )
            .await;
        self.reconcile("add", result).await
    }

    /// Remove a line by its cart item ID.
    ///
    /// # Errors
    ///
    /// Returns any backend failure (after local state has been reverted).
    #[instrument(skip(self), fields(cart_item_id = %cart_item_id))]
    pub async fn remove(&mut self, cart_item_id: &CartItemId) -> Result<(), CartError> {
        let api = self.api.clone();
        let result = api
            .delete::<IgnoredAny>(&format!("cart/{cart_item_id}"), AUTH)
            .await;
        self.reconcile("remove", result).await
    }

    /// Remove whichever line holds `product_id`.
    ///
    /// # Errors
    ///
    /// Returns any backend failure (after local state has been reverted).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_by_product_id(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        let api = self.api.clone();
        let result = api
            .delete::<IgnoredAny>(&format!("cart/product/{product_id}"), AUTH)
            .await;
        self.reconcile("remove_by_product_id", result).await
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns any backend failure (after local state has been reverted).
    #[instrument(skip(self), fields(cart_item_id = %cart_item_id))]
    pub async fn set_quantity(
        &mut self,
        cart_item_id: &CartItemId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(cart_item_id).await;
        }
        let api = self.api.clone();
        let result = api
            .put::<IgnoredAny, _>(
                &format!("cart/{cart_item_id}"),
                &SetQuantity { quantity },
                AUTH,
            )
            .await;
        self.reconcile("set_quantity", result).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns any backend failure (after local state has been reverted).
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<(), CartError> {
        let api = self.api.clone();
        let result = api.delete::<IgnoredAny>("cart", AUTH).await;
        self.reconcile("clear", result).await
    }

    /// Refetch after a mutation, whether or not it succeeded.
    async fn reconcile<T>(
        &mut self,
        operation: &'static str,
        result: Result<T, ApiError>,
    ) -> Result<(), CartError> {
        match result {
            Ok(_) => {
                self.refresh().await?;
                Ok(())
            }
            Err(err @ ApiError::Unauthorized(_)) => {
                self.items.clear();
                Err(err.into())
            }
            Err(err) => {
                warn!(operation, error = %err, "cart mutation failed, reverting to server state");
                if let Err(refetch) = self.refresh().await {
                    warn!(operation, error = %refetch, "cart refetch after failure also failed");
                }
                Err(err.into())
            }
        }
    }
}
