//! Shared storefront handle.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::AuthClient;
use crate::cart::CartManager;
use crate::catalog::CatalogClient;
use crate::checkout::{Checkout, CheckoutError, CheckoutServices};
use crate::config::StorefrontConfig;
use crate::error::Error;
use crate::geocode::Geocoder;
use crate::orders::OrderClient;
use crate::payment::PaymentClient;
use crate::session::TokenStore;
use crate::wishlist::Wishlist;

/// Entry point to every storefront client.
///
/// This struct is cheaply cloneable via `Arc`; all clients created from one
/// handle share a connection pool, catalog cache and token store.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    catalog: CatalogClient,
    geocoder: Geocoder,
}

impl Storefront {
    /// Create a storefront handle.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, Error> {
        let api = ApiClient::new(&config, tokens)?;
        let catalog = CatalogClient::new(api.clone(), config.catalog_cache_ttl);
        let geocoder = Geocoder::new(&config)?;

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                catalog,
                geocoder,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The underlying REST client, shared with the admin portals.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn geocoder(&self) -> &Geocoder {
        &self.inner.geocoder
    }

    #[must_use]
    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.inner.api.clone())
    }

    /// A new, not yet fetched cart.
    #[must_use]
    pub fn cart(&self) -> CartManager {
        CartManager::new(self.inner.api.clone())
    }

    /// A new, not yet fetched wishlist.
    #[must_use]
    pub fn wishlist(&self) -> Wishlist {
        Wishlist::new(self.inner.api.clone())
    }

    #[must_use]
    pub fn orders(&self) -> OrderClient {
        OrderClient::new(self.inner.api.clone())
    }

    #[must_use]
    pub fn payments(&self) -> PaymentClient {
        PaymentClient::new(
            self.inner.api.clone(),
            self.inner.config.razorpay_key_id.clone(),
        )
    }

    /// Start a checkout for the cart's current lines.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    pub fn checkout(&self, cart: &CartManager) -> Result<Checkout, CheckoutError> {
        let services = CheckoutServices {
            geocoder: self.inner.geocoder.clone(),
            payments: self.payments(),
            orders: self.orders(),
        };
        Checkout::begin(services, cart)
    }
}
