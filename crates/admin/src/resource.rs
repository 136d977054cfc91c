//! Catalog documents managed through the portals.

use std::fmt;

use hoe_core::{
    Brand, BrandId, BrandInput, Category, CategoryId, CategoryInput, Product, ProductId,
    ProductInput, Subcategory, SubcategoryId, SubcategoryInput, Validate,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::portal::Portal;

/// A document kind with its own CRUD routes.
pub trait Resource: DeserializeOwned + Send + Sync {
    /// Identifier type.
    type Id: fmt::Display + Sync;
    /// Create and update form.
    type Input: Validate + Serialize + Sync;

    /// Collection path below the portal prefix.
    const PATH: &'static str;
    /// Key some routes nest a single document under.
    const NAME: &'static str;

    /// Whether `portal` may manage this kind.
    #[must_use]
    fn permitted(portal: Portal) -> bool {
        portal == Portal::Admin
    }
}

impl Resource for Brand {
    type Id = BrandId;
    type Input = BrandInput;
    const PATH: &'static str = "brands";
    const NAME: &'static str = "brand";
}

impl Resource for Category {
    type Id = CategoryId;
    type Input = CategoryInput;
    const PATH: &'static str = "categories";
    const NAME: &'static str = "category";
}

impl Resource for Subcategory {
    type Id = SubcategoryId;
    type Input = SubcategoryInput;
    const PATH: &'static str = "subcategories";
    const NAME: &'static str = "subcategory";
}

impl Resource for Product {
    type Id = ProductId;
    type Input = ProductInput;
    const PATH: &'static str = "products";
    const NAME: &'static str = "product";

    fn permitted(_portal: Portal) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_reach() {
        assert!(Product::permitted(Portal::Vendor));
        assert!(!Brand::permitted(Portal::Vendor));
        assert!(!Category::permitted(Portal::Vendor));
        assert!(!Subcategory::permitted(Portal::Vendor));
        assert!(Subcategory::permitted(Portal::Admin));
    }
}
