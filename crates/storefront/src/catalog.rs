//! Catalog reads: brands, categories, subcategories and products.
//!
//! Catalog endpoints are public. Responses are cached in memory via `moka`
//! when a TTL is configured; cart, wishlist and order data never are.

use std::sync::Arc;
use std::time::Duration;

use hoe_core::{Brand, Category, CategoryId, Product, ProductId, Subcategory};
use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::{ApiClient, ApiError, Auth, envelope};

const CACHE_CAPACITY: u64 = 1000;

/// Filters and paging for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// One page of products plus whatever paging metadata the backend sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub pages: Option<u32>,
}

impl ProductPage {
    /// Whether another page is available after this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        matches!((self.page, self.pages), (Some(page), Some(pages)) if page < pages)
    }

    fn from_response(value: Value) -> Result<Self, ApiError> {
        let meta = |keys: &[&str]| -> Option<u64> {
            let data = value.get("data");
            let sources = [
                Some(&value),
                data,
                value.get("pagination"),
                data.and_then(|d| d.get("pagination")),
            ];
            sources
                .into_iter()
                .flatten()
                .flat_map(|v| keys.iter().filter_map(move |k| v.get(*k)))
                .find_map(Value::as_u64)
        };
        let total = meta(&["total", "totalProducts", "count"]);
        let page = meta(&["page", "currentPage"]).and_then(|p| u32::try_from(p).ok());
        let pages = meta(&["pages", "totalPages"]).and_then(|p| u32::try_from(p).ok());

        Ok(Self {
            products: envelope::decode_list(value)?,
            total,
            page,
            pages,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Brands,
    Categories,
    Subcategories(Option<CategoryId>),
    Products(ProductQuery),
    Product(ProductId),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Brands(Arc<Vec<Brand>>),
    Categories(Arc<Vec<Category>>),
    Subcategories(Arc<Vec<Subcategory>>),
    Products(Arc<ProductPage>),
    Product(Arc<Product>),
}

/// Read-only client for the public catalog.
#[derive(Clone)]
pub struct CatalogClient {
    api: ApiClient,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl CatalogClient {
    /// Create a catalog client. `cache_ttl` of `None` disables caching.
    #[must_use]
    pub fn new(api: ApiClient, cache_ttl: Option<Duration>) -> Self {
        let cache = cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });
        Self { api, cache }
    }

    /// Drop every cached catalog response.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let hit = self.cache.as_ref()?.get(key).await;
        if hit.is_some() {
            debug!(?key, "catalog cache hit");
        }
        hit
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.cache {
            cache.insert(key, value).await;
        }
    }

    /// List all brands.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Result<Arc<Vec<Brand>>, ApiError> {
        if let Some(CacheValue::Brands(brands)) = self.cached(&CacheKey::Brands).await {
            return Ok(brands);
        }
        let brands = Arc::new(self.api.get_list::<Brand>("brands", Auth::Public).await?);
        self.store(CacheKey::Brands, CacheValue::Brands(Arc::clone(&brands)))
            .await;
        Ok(brands)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(CacheValue::Categories(categories)) = self.cached(&CacheKey::Categories).await
        {
            return Ok(categories);
        }
        let categories = Arc::new(
            self.api
                .get_list::<Category>("categories", Auth::Public)
                .await?,
        );
        self.store(
            CacheKey::Categories,
            CacheValue::Categories(Arc::clone(&categories)),
        )
        .await;
        Ok(categories)
    }

    /// List subcategories, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_subcategories(
        &self,
        category: Option<&CategoryId>,
    ) -> Result<Arc<Vec<Subcategory>>, ApiError> {
        let key = CacheKey::Subcategories(category.cloned());
        if let Some(CacheValue::Subcategories(subs)) = self.cached(&key).await {
            return Ok(subs);
        }
        let path = category.map_or_else(
            || "subcategories".to_string(),
            |id| format!("subcategories/category/{id}"),
        );
        let subs = Arc::new(self.api.get_list::<Subcategory>(&path, Auth::Public).await?);
        self.store(key, CacheValue::Subcategories(Arc::clone(&subs)))
            .await;
        Ok(subs)
    }

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Arc<ProductPage>, ApiError> {
        let key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(page)) = self.cached(&key).await {
            return Ok(page);
        }
        let raw = self.api.get_raw("products", query, Auth::Public).await?;
        let page = Arc::new(ProductPage::from_response(raw)?);
        self.store(key, CacheValue::Products(Arc::clone(&page)))
            .await;
        Ok(page)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Arc<Product>, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            return Ok(product);
        }
        let value = self
            .api
            .get::<Value>(&format!("products/{id}"), Auth::Public)
            .await?;
        let product = Arc::new(serde_json::from_value::<Product>(envelope::unnest(
            value, "product",
        ))?);
        self.store(key, CacheValue::Product(Arc::clone(&product)))
            .await;
        Ok(product)
    }
}
