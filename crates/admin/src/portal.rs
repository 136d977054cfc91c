//! Portal selection: route prefix and session.

use std::fmt;

use hoe_core::{Brand, Category, Product, Subcategory};
use hoe_storefront::api::{ApiClient, Auth};
use hoe_storefront::session::TokenNamespace;

use crate::collection::Collection;
use crate::error::AdminError;
use crate::orders::OrderDesk;

/// Which back office a request goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Portal {
    Admin,
    Vendor,
}

impl Portal {
    /// Session used by this portal.
    #[must_use]
    pub const fn namespace(self) -> TokenNamespace {
        match self {
            Self::Admin => TokenNamespace::Admin,
            Self::Vendor => TokenNamespace::Vendor,
        }
    }

    #[must_use]
    pub const fn auth(self) -> Auth {
        Auth::Session(self.namespace())
    }

    /// Route prefix, without slashes.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Vendor => "vendor",
        }
    }

    /// Full API path for a resource path such as `products/p1`.
    #[must_use]
    pub fn path(self, resource_path: &str) -> String {
        format!("{}/{}", self.prefix(), resource_path.trim_start_matches('/'))
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl std::str::FromStr for Portal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "vendor" => Ok(Self::Vendor),
            _ => Err(format!("invalid portal: {s}")),
        }
    }
}

/// Entry point for one portal's collections and order desk.
#[derive(Clone)]
pub struct PortalClient {
    api: ApiClient,
    portal: Portal,
}

impl PortalClient {
    #[must_use]
    pub const fn new(api: ApiClient, portal: Portal) -> Self {
        Self { api, portal }
    }

    #[must_use]
    pub const fn portal(&self) -> Portal {
        self.portal
    }

    /// Whether this portal's session token is present.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.api.is_signed_in(self.portal.namespace())
    }

    /// # Errors
    ///
    /// Returns `AdminError::NotPermitted` outside the admin portal.
    pub fn brands(&self) -> Result<Collection<Brand>, AdminError> {
        Collection::new(self.api.clone(), self.portal)
    }

    /// # Errors
    ///
    /// Returns `AdminError::NotPermitted` outside the admin portal.
    pub fn categories(&self) -> Result<Collection<Category>, AdminError> {
        Collection::new(self.api.clone(), self.portal)
    }

    /// # Errors
    ///
    /// Returns `AdminError::NotPermitted` outside the admin portal.
    pub fn subcategories(&self) -> Result<Collection<Subcategory>, AdminError> {
        Collection::new(self.api.clone(), self.portal)
    }

    /// # Errors
    ///
    /// Never fails; both portals manage products.
    pub fn products(&self) -> Result<Collection<Product>, AdminError> {
        Collection::new(self.api.clone(), self.portal)
    }

    #[must_use]
    pub fn orders(&self) -> OrderDesk {
        OrderDesk::new(self.api.clone(), self.portal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_and_sessions() {
        assert_eq!(Portal::Admin.path("brands"), "admin/brands");
        assert_eq!(Portal::Vendor.path("/products/p1"), "vendor/products/p1");
        assert_eq!(Portal::Vendor.namespace(), TokenNamespace::Vendor);
        assert_eq!("admin".parse::<Portal>(), Ok(Portal::Admin));
        assert!("shop".parse::<Portal>().is_err());
    }
}
