//! Form inputs and their validation rules.
//!
//! Inputs are validated on the client before any request is made, so the
//! user sees every field problem at once instead of one backend rejection at
//! a time.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{Address, Coordinates, ProductAttribute};
use crate::types::{BrandId, CategoryId, SubcategoryId};

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name (camelCase, as sent to the backend).
    pub field: &'static str,
    /// Human-readable problem.
    pub message: String,
}

/// All validation failures for a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Record a failure.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Record a failure when `field_value` is blank.
    pub fn require(&mut self, field: &'static str, field_value: &str) {
        if field_value.trim().is_empty() {
            self.push(field, "is required");
        }
    }

    /// Returns `true` if no failures were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Recorded failures in field order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether `field` has a recorded failure.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any were recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{} {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "invalid input: {joined}")
    }
}

impl std::error::Error for ValidationErrors {}

/// Client-side validation of a form.
pub trait Validate {
    /// Check every field and collect failures.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing each failing field.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

// =============================================================================
// Address
// =============================================================================

/// Shipping or billing address as typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl AddressInput {
    /// Phone number reduced to its last ten digits, dropping `+91`/`0`
    /// prefixes and separators.
    #[must_use]
    pub fn normalized_phone(&self) -> String {
        let digits: String = self.phone.chars().filter(char::is_ascii_digit).collect();
        let skip = digits.len().saturating_sub(10);
        digits.chars().skip(skip).collect()
    }

    fn is_india(&self) -> bool {
        matches!(
            self.country.trim().to_ascii_lowercase().as_str(),
            "india" | "in" | "ind"
        )
    }

    /// Attach geocoded coordinates, producing the address sent with orders.
    #[must_use]
    pub fn into_address(self, coordinates: Option<Coordinates>) -> Address {
        let phone = self.normalized_phone();
        Address {
            full_name: self.full_name.trim().to_string(),
            phone,
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self
                .address_line2
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            coordinates,
        }
    }
}

impl Validate for AddressInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("fullName", &self.full_name);
        errors.require("addressLine1", &self.address_line1);
        errors.require("city", &self.city);
        errors.require("state", &self.state);
        errors.require("country", &self.country);

        let raw_digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if self.phone.trim().is_empty() {
            errors.push("phone", "is required");
        } else if !(10..=13).contains(&raw_digits) {
            errors.push("phone", "must be a 10 digit mobile number");
        }

        let postal = self.postal_code.trim();
        if postal.is_empty() {
            errors.push("postalCode", "is required");
        } else if self.is_india() && !(postal.len() == 6 && postal.chars().all(|c| c.is_ascii_digit()))
        {
            errors.push("postalCode", "must be a 6 digit PIN code");
        }

        errors.into_result()
    }
}

// =============================================================================
// Catalog entities
// =============================================================================

/// Create/update form for a brand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Validate for BrandInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("name", &self.name);
        errors.into_result()
    }
}

/// Create/update form for a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Validate for CategoryInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("name", &self.name);
        errors.into_result()
    }
}

/// Create/update form for a subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryInput {
    pub name: String,
    pub category: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for SubcategoryInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("name", &self.name);
        errors.require("category", self.category.as_str());
        errors.into_result()
    }
}

/// Create/update form for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub brand: BrandId,
    pub category: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<SubcategoryId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub discount_price: Option<Decimal>,
    pub stock: i64,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Validate for ProductInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("name", &self.name);
        errors.require("brand", self.brand.as_str());
        errors.require("category", self.category.as_str());

        if self.price <= Decimal::ZERO {
            errors.push("price", "must be greater than zero");
        }
        if let Some(discount) = self.discount_price {
            if discount < Decimal::ZERO {
                errors.push("discountPrice", "cannot be negative");
            } else if discount >= self.price {
                errors.push("discountPrice", "must be lower than the price");
            }
        }
        if self.stock < 0 {
            errors.push("stock", "cannot be negative");
        }
        if self.attributes.iter().any(|a| a.name.trim().is_empty()) {
            errors.push("attributes", "every attribute needs a name");
        }

        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> AddressInput {
        AddressInput {
            full_name: "Asha Rao".to_string(),
            phone: "+91 98765-43210".to_string(),
            address_line1: "12 MG Road".to_string(),
            address_line2: None,
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            postal_code: "560001".to_string(),
            country: "India".to_string(),
        }
    }

    fn product() -> ProductInput {
        ProductInput {
            name: "Linen Shirt".to_string(),
            description: None,
            brand: BrandId::new("b1"),
            category: CategoryId::new("c1"),
            subcategory: None,
            price: Decimal::new(1499, 0),
            discount_price: Some(Decimal::new(1199, 0)),
            stock: 10,
            attributes: vec![],
            images: vec![],
        }
    }

    #[test]
    fn test_valid_address() {
        assert!(address().validate().is_ok());
        assert_eq!(address().normalized_phone(), "9876543210");
    }

    #[test]
    fn test_address_collects_every_failure() {
        let input = AddressInput {
            phone: "12345".to_string(),
            postal_code: "5600".to_string(),
            country: "India".to_string(),
            ..AddressInput::default()
        };
        let errors = input.validate().unwrap_err();
        for field in ["fullName", "addressLine1", "city", "state", "phone", "postalCode"] {
            assert!(errors.has(field), "missing error for {field}");
        }
        assert!(!errors.has("country"));
    }

    #[test]
    fn test_postal_code_rule_only_for_india() {
        let mut input = address();
        input.country = "United Kingdom".to_string();
        input.postal_code = "SW1A 1AA".to_string();
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_into_address_trims_and_normalizes() {
        let mut input = address();
        input.address_line2 = Some("  ".to_string());
        let address = input.into_address(Some(Coordinates { lat: 1.0, lng: 2.0 }));
        assert_eq!(address.phone, "9876543210");
        assert_eq!(address.address_line2, None);
        assert!(address.coordinates.is_some());
    }

    #[test]
    fn test_product_price_rules() {
        assert!(product().validate().is_ok());

        let mut bad = product();
        bad.price = Decimal::ZERO;
        bad.discount_price = Some(Decimal::new(5, 0));
        bad.stock = -1;
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("price"));
        assert!(errors.has("discountPrice"));
        assert!(errors.has("stock"));
    }

    #[test]
    fn test_product_serializes_numbers() {
        let json = serde_json::to_value(product()).unwrap();
        assert_eq!(json["price"], serde_json::json!(1499.0));
        assert_eq!(json["discountPrice"], serde_json::json!(1199.0));
        assert!(json.get("subcategory").is_none());
    }

    #[test]
    fn test_validation_errors_display() {
        let mut errors = ValidationErrors::default();
        errors.push("name", "is required");
        errors.push("price", "must be greater than zero");
        assert_eq!(
            errors.to_string(),
            "invalid input: name is required; price must be greater than zero"
        );
    }
}
