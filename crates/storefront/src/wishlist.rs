//! Saved-for-later products.
//!
//! Follows the cart's model: mutate remotely, then refetch the whole list.

use hoe_core::{Product, ProductId, Ref, WishlistItem, WishlistItemId};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::api::{ApiClient, ApiError, Auth};
use crate::cart::{CartError, CartManager};
use crate::session::TokenNamespace;

const AUTH: Auth = Auth::Session(TokenNamespace::Customer);

/// Wishlist payloads: `{ items: [...] }`, the bare entries, or (on older
/// routes) a plain array of products.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WishlistPayload {
    Entries(Vec<WishlistItem>),
    Products(Vec<Product>),
    Document {
        #[serde(default)]
        items: Vec<WishlistItem>,
    },
}

impl WishlistPayload {
    fn into_items(self) -> Vec<WishlistItem> {
        match self {
            Self::Entries(items) | Self::Document { items } => items,
            Self::Products(products) => products
                .into_iter()
                .map(|product| WishlistItem {
                    id: WishlistItemId::new(product.id.as_str()),
                    product: Ref::Populated(Box::new(product)),
                    added_at: None,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddEntry<'a> {
    product_id: &'a ProductId,
}

/// In-memory mirror of the customer's wishlist.
pub struct Wishlist {
    api: ApiClient,
    items: Vec<WishlistItem>,
}

impl Wishlist {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self {
            api,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    /// Whether `product_id` is saved.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items
            .iter()
            .any(|i| i.product_id() == Some(product_id.as_str()))
    }

    /// Replace local state with the server's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the wishlist cannot be fetched.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<&[WishlistItem], ApiError> {
        match self.api.get::<Option<WishlistPayload>>("wishlist", AUTH).await {
            Ok(payload) => {
                self.items = payload
                    .map(WishlistPayload::into_items)
                    .unwrap_or_default();
                Ok(&self.items)
            }
            Err(err) => {
                if matches!(err, ApiError::Unauthorized(_)) {
                    self.items.clear();
                }
                Err(err)
            }
        }
    }

    /// Save a product.
    ///
    /// # Errors
    ///
    /// Returns any backend failure (after local state has been reverted).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&mut self, product_id: &ProductId) -> Result<(), ApiError> {
        let api = self.api.clone();
        let result = api
            .post::<IgnoredAny, _>("wishlist", &AddEntry { product_id }, AUTH)
            .await;
        self.reconcile("add", result).await
    }

    /// Forget a saved product.
    ///
    /// # Errors
    ///
    /// Returns any backend failure (after local state has been reverted).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&mut self, product_id: &ProductId) -> Result<(), ApiError> {
        let api = self.api.clone();
        let result = api
            .delete::<IgnoredAny>(&format!("wishlist/{product_id}"), AUTH)
            .await;
        self.reconcile("remove", result).await
    }

    /// Add one unit to the cart, then drop the product from the wishlist.
    ///
    /// The wishlist entry is kept if the cart add fails.
    ///
    /// # Errors
    ///
    /// Returns the cart error, or the wishlist error wrapped as
    /// `CartError::Api`.
    #[instrument(skip(self, cart), fields(product_id = %product_id))]
    pub async fn move_to_cart(
        &mut self,
        product_id: &ProductId,
        cart: &mut CartManager,
    ) -> Result<(), CartError> {
        cart.add(product_id, 1).await?;
        self.remove(product_id).await?;
        Ok(())
    }

    async fn reconcile<T>(
        &mut self,
        operation: &'static str,
        result: Result<T, ApiError>,
    ) -> Result<(), ApiError> {
        match result {
            Ok(_) => {
                self.refresh().await?;
                Ok(())
            }
            Err(err @ ApiError::Unauthorized(_)) => {
                self.items.clear();
                Err(err)
            }
            Err(err) => {
                warn!(operation, error = %err, "wishlist mutation failed, reverting to server state");
                if let Err(refetch) = self.refresh().await {
                    warn!(operation, error = %refetch, "wishlist refetch after failure also failed");
                }
                Err(err)
            }
        }
    }
}
