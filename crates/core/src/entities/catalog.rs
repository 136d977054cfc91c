//! Brand, category, subcategory and product documents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Identified, default_true, string_or_scalar};
use crate::types::{BrandId, CategoryId, Price, ProductId, Ref, SubcategoryId, VendorId};

/// A marketplace brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A top-level product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A category subdivision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    #[serde(rename = "_id")]
    pub id: SubcategoryId,
    pub name: String,
    #[serde(default)]
    pub category: Option<Ref<Category>>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Seller information embedded in a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSummary {
    #[serde(rename = "_id")]
    pub id: VendorId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
}

/// A name/value attribute such as "Color: Red".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub value: String,
}

/// A product listing with pricing and stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<Ref<Brand>>,
    #[serde(default)]
    pub category: Option<Ref<Category>>,
    #[serde(default)]
    pub subcategory: Option<Ref<Subcategory>>,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub vendor: Option<Ref<VendorSummary>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Product {
    /// The price a shopper pays: the discount price when it undercuts the
    /// list price, otherwise the list price.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.discount_price {
            Some(discount) if discount > Decimal::ZERO && discount < self.price => discount,
            _ => self.price,
        }
    }

    /// Effective price in rupees.
    #[must_use]
    pub fn display_price(&self) -> Price {
        Price::inr(self.effective_price())
    }

    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Look up an attribute value by case-insensitive name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }
}

impl Identified for Brand {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Identified for Category {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Identified for Subcategory {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Identified for VendorSummary {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Identified for Product {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}
