//! Checkout flow: shipping, payment, review and confirmation.
//!
//! A [`Checkout`] snapshots the cart when it starts and moves through
//! [`CheckoutStep`]s only when the caller asks it to. Each step's operations
//! check the current step first and refuse with
//! [`CheckoutError::InvalidStep`] otherwise.
//!
//! ```text
//! Shipping --continue_to_payment--> Payment --pay--> Review --place_order--> Confirmation
//!    ^                                 |
//!    +---------back_to_shipping--------+
//! ```
//!
//! Order creation carries no idempotency key. If `place_order` fails after
//! the backend has stored the order, calling it again creates a duplicate.

use std::fmt;

use hoe_core::{
    Address, AddressInput, CartItem, Coordinates, Order, OrderTotals, Validate, ValidationErrors,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::ApiError;
use crate::cart::CartManager;
use crate::geocode::{GeocodeError, Geocoder, ReverseAddress};
use crate::orders::{NewOrder, NewOrderLine, NewOrderPayment, OrderClient};
use crate::payment::{
    PaymentClient, PaymentPrefill, PaymentReceipt, PaymentSession, PaymentWidget, WidgetOutcome,
};

/// Where a checkout currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Review,
    Confirmation,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Review => "review",
            Self::Confirmation => "confirmation",
        })
    }
}

/// Errors that stop a checkout step.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("cannot do that during {actual}; checkout must be at {expected}")]
    InvalidStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The shipping address could not be located.
    #[error("could not verify address: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("a shipping address is required")]
    MissingShippingAddress,

    #[error("order total {0} cannot be charged")]
    AmountOutOfRange(Decimal),

    #[error("payment was cancelled")]
    PaymentDismissed,

    #[error("payment failed: {0}")]
    PaymentFailed(String),

    #[error("payment could not be verified: {0}")]
    PaymentNotVerified(String),

    /// The widget returned a receipt for a different Razorpay order.
    #[error("payment receipt is for order {actual}, expected {expected}")]
    ReceiptMismatch { expected: String, actual: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Backend collaborators a checkout needs.
#[derive(Clone)]
pub struct CheckoutServices {
    pub geocoder: Geocoder,
    pub payments: PaymentClient,
    pub orders: OrderClient,
}

/// One checkout attempt.
pub struct Checkout {
    services: CheckoutServices,
    step: CheckoutStep,
    lines: Vec<CartItem>,
    totals: OrderTotals,
    shipping_address: Option<Address>,
    billing_address: Option<Address>,
    contact_email: Option<String>,
    payment: Option<(PaymentSession, PaymentReceipt)>,
    order: Option<Order>,
}

impl Checkout {
    /// Start checking out the cart's current lines. Lines whose product has
    /// been deleted are left in the cart and out of the order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to buy.
    pub fn begin(services: CheckoutServices, cart: &CartManager) -> Result<Self, CheckoutError> {
        let lines: Vec<CartItem> = cart
            .items()
            .iter()
            .filter(|item| item.is_available())
            .cloned()
            .collect();
        let skipped = cart.items().len() - lines.len();
        if skipped > 0 {
            warn!(skipped, "cart lines without a product left out of checkout");
        }
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let totals = OrderTotals::from_cart(&lines);
        Ok(Self {
            services,
            step: CheckoutStep::Shipping,
            lines,
            totals,
            shipping_address: None,
            billing_address: None,
            contact_email: None,
            payment: None,
            order: None,
        })
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Lines captured when the checkout began.
    #[must_use]
    pub fn lines(&self) -> &[CartItem] {
        &self.lines
    }

    #[must_use]
    pub const fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    #[must_use]
    pub const fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address.as_ref()
    }

    #[must_use]
    pub const fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    /// The confirmed payment, once past the payment step.
    #[must_use]
    pub fn receipt(&self) -> Option<&PaymentReceipt> {
        self.payment.as_ref().map(|(_, receipt)| receipt)
    }

    /// The created order, once confirmed.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidStep {
                expected,
                actual: self.step,
            })
        }
    }

    // =========================================================================
    // Shipping
    // =========================================================================

    /// Validate and geocode the shipping address.
    ///
    /// # Errors
    ///
    /// Returns the form's `ValidationErrors`, or `CheckoutError::Geocode` if
    /// the address cannot be located. The previous address is kept on error.
    #[instrument(skip(self, input))]
    pub async fn set_shipping_address(
        &mut self,
        input: AddressInput,
    ) -> Result<&Address, CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        let address = self.locate(input).await?;
        Ok(self.shipping_address.insert(address))
    }

    /// Validate and geocode a separate billing address. `None` bills to the
    /// shipping address.
    ///
    /// # Errors
    ///
    /// Same as [`Checkout::set_shipping_address`].
    #[instrument(skip(self, input))]
    pub async fn set_billing_address(
        &mut self,
        input: Option<AddressInput>,
    ) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        self.billing_address = match input {
            Some(input) => Some(self.locate(input).await?),
            None => None,
        };
        Ok(())
    }

    /// Email passed to the payment widget.
    pub fn set_contact_email(&mut self, email: impl Into<String>) {
        self.contact_email = Some(email.into());
    }

    /// Fill the address parts of `form` from a device location.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Geocode` if the location cannot be placed.
    #[instrument(skip(self, form))]
    pub async fn prefill_from_location(
        &self,
        coordinates: Coordinates,
        form: AddressInput,
    ) -> Result<AddressInput, CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        let reverse: ReverseAddress = self.services.geocoder.reverse(coordinates).await?;
        Ok(reverse.fill(form))
    }

    /// Move to the payment step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingShippingAddress` until an address has
    /// been validated.
    pub fn continue_to_payment(&mut self) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        if self.shipping_address.is_none() {
            return Err(CheckoutError::MissingShippingAddress);
        }
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    async fn locate(&self, input: AddressInput) -> Result<Address, CheckoutError> {
        input.validate()?;
        let draft = input.into_address(None);
        let coordinates = self.services.geocoder.lookup(&draft).await?;
        Ok(Address {
            coordinates: Some(coordinates),
            ..draft
        })
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Return to the shipping step to change the address.
    ///
    /// # Errors
    ///
    /// Only allowed from the payment step.
    pub fn back_to_shipping(&mut self) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        self.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// Run the payment handshake: create the Razorpay order, let `widget`
    /// collect payment, then have the backend verify the signature.
    ///
    /// A verified payment moves the checkout to review. Any failure,
    /// including the shopper dismissing the widget, leaves it at payment so
    /// the shopper can try again.
    ///
    /// # Errors
    ///
    /// Returns `PaymentDismissed`, `PaymentFailed`, `ReceiptMismatch`,
    /// `PaymentNotVerified` or the backend's failure.
    #[instrument(skip(self, widget), fields(total = %self.totals.total))]
    pub async fn pay<W: PaymentWidget + Sync>(
        &mut self,
        widget: &W,
    ) -> Result<&PaymentReceipt, CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;

        let session = self.services.payments.initiate(&self.totals).await?;
        let receipt = match widget.collect(&session, &self.prefill()).await {
            WidgetOutcome::Paid(receipt) => receipt,
            WidgetOutcome::Dismissed => {
                info!(razorpay_order_id = %session.razorpay_order_id, "payment widget dismissed");
                return Err(CheckoutError::PaymentDismissed);
            }
            WidgetOutcome::Failed(reason) => {
                warn!(razorpay_order_id = %session.razorpay_order_id, %reason, "payment failed");
                return Err(CheckoutError::PaymentFailed(reason));
            }
        };
        if receipt.order_id != session.razorpay_order_id {
            return Err(CheckoutError::ReceiptMismatch {
                expected: session.razorpay_order_id,
                actual: receipt.order_id,
            });
        }

        self.services.payments.confirm(&receipt).await?;
        self.step = CheckoutStep::Review;
        let (_, receipt) = self.payment.insert((session, receipt));
        Ok(receipt)
    }

    fn prefill(&self) -> PaymentPrefill {
        let address = self.shipping_address.as_ref();
        PaymentPrefill {
            name: address.map(|a| a.full_name.clone()),
            email: self.contact_email.clone(),
            contact: address.map(|a| a.phone.clone()),
        }
    }

    // =========================================================================
    // Review
    // =========================================================================

    /// Create the order, then empty the cart.
    ///
    /// Clearing the cart is best effort: a failure there is logged and the
    /// order is still returned.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure; the checkout stays at review.
    #[instrument(skip(self, cart))]
    pub async fn place_order(&mut self, cart: &mut CartManager) -> Result<&Order, CheckoutError> {
        self.expect_step(CheckoutStep::Review)?;
        let order = self.new_order()?;

        let created = self.services.orders.create_order(&order).await?;
        self.step = CheckoutStep::Confirmation;
        info!(order_id = %created.id, "checkout complete");

        if let Err(err) = cart.clear().await {
            warn!(error = %err, "order placed but the cart could not be cleared");
        }
        Ok(self.order.insert(created))
    }

    fn new_order(&self) -> Result<NewOrder, CheckoutError> {
        let shipping_address = self
            .shipping_address
            .clone()
            .ok_or(CheckoutError::MissingShippingAddress)?;
        let Some((_, receipt)) = &self.payment else {
            return Err(CheckoutError::InvalidStep {
                expected: CheckoutStep::Payment,
                actual: self.step,
            });
        };
        Ok(NewOrder {
            items: self
                .lines
                .iter()
                .filter_map(NewOrderLine::from_cart_item)
                .collect(),
            billing_address: Some(
                self.billing_address
                    .clone()
                    .unwrap_or_else(|| shipping_address.clone()),
            ),
            shipping_address,
            payment: NewOrderPayment {
                method: "razorpay",
                razorpay_order_id: receipt.order_id.clone(),
                razorpay_payment_id: receipt.payment_id.clone(),
                razorpay_signature: receipt.signature.clone(),
            },
            totals: self.totals,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::ApiClient;
    use crate::config::StorefrontConfig;
    use crate::session::MemoryTokenStore;

    fn api() -> (StorefrontConfig, ApiClient) {
        let config = StorefrontConfig::for_base_url("http://127.0.0.1:9").unwrap();
        let api = ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap();
        (config, api)
    }

    fn services() -> CheckoutServices {
        let (config, api) = api();
        CheckoutServices {
            geocoder: Geocoder::new(&config).unwrap(),
            payments: PaymentClient::new(api.clone(), None),
            orders: OrderClient::new(api),
        }
    }

    fn checkout() -> Checkout {
        let lines: Vec<CartItem> = serde_json::from_value(json!([
            {"_id": "ci1", "product": {"_id": "p1", "name": "Mug", "price": 499}, "quantity": 2},
            {"_id": "ci2", "product": "p2", "quantity": 1, "price": 120}
        ]))
        .unwrap();
        let totals = OrderTotals::from_cart(&lines);
        Checkout {
            services: services(),
            step: CheckoutStep::Shipping,
            lines,
            totals,
            shipping_address: None,
            billing_address: None,
            contact_email: None,
            payment: None,
            order: None,
        }
    }

    fn address() -> Address {
        AddressInput {
            full_name: "Asha Rao".to_string(),
            phone: "+91 98765 43210".to_string(),
            address_line1: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            postal_code: "560001".to_string(),
            country: "India".to_string(),
            ..AddressInput::default()
        }
        .into_address(Some(Coordinates {
            lat: 12.97,
            lng: 77.59,
        }))
    }

    #[test]
    fn test_begin_refuses_empty_cart() {
        let cart = CartManager::new(api().1);
        assert!(matches!(
            Checkout::begin(services(), &cart),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_totals_follow_snapshot() {
        let checkout = checkout();
        assert_eq!(checkout.totals().subtotal, Decimal::new(111_800, 2));
        assert_eq!(checkout.totals().tax, Decimal::new(11_180, 2));
        assert_eq!(checkout.totals().total, Decimal::new(122_980, 2));
    }

    #[test]
    fn test_payment_requires_address() {
        let mut checkout = checkout();
        assert!(matches!(
            checkout.continue_to_payment(),
            Err(CheckoutError::MissingShippingAddress)
        ));
        assert_eq!(checkout.step(), CheckoutStep::Shipping);

        checkout.shipping_address = Some(address());
        checkout.continue_to_payment().unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Payment);

        checkout.back_to_shipping().unwrap();
        assert_eq!(checkout.step(), CheckoutStep::Shipping);
    }

    #[tokio::test]
    async fn test_wrong_step_is_refused() {
        let mut checkout = checkout();
        let widget = crate::payment::ProvidedReceipt {
            payment_id: "pay_1".to_string(),
            signature: "sig".to_string(),
        };
        let err = checkout.pay(&widget).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InvalidStep {
                expected: CheckoutStep::Payment,
                actual: CheckoutStep::Shipping
            }
        ));
        assert!(matches!(
            checkout.back_to_shipping(),
            Err(CheckoutError::InvalidStep { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_before_geocoding() {
        let mut checkout = checkout();
        let err = checkout
            .set_shipping_address(AddressInput {
                country: "India".to_string(),
                postal_code: "5600".to_string(),
                ..AddressInput::default()
            })
            .await
            .unwrap_err();
        let CheckoutError::Invalid(errors) = err else {
            panic!("expected validation errors");
        };
        assert!(errors.has("postalCode"));
        assert!(errors.has("fullName"));
        assert!(checkout.shipping_address().is_none());
    }

    #[test]
    fn test_new_order_bills_to_shipping_by_default() {
        let mut checkout = checkout();
        checkout.shipping_address = Some(address());
        checkout.step = CheckoutStep::Review;
        checkout.payment = Some((
            PaymentSession {
                razorpay_order_id: "order_1".to_string(),
                amount: 122_980,
                currency: "INR".to_string(),
                key_id: None,
            },
            PaymentReceipt {
                order_id: "order_1".to_string(),
                payment_id: "pay_1".to_string(),
                signature: "sig".to_string(),
            },
        ));

        let order = checkout.new_order().unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.billing_address, Some(order.shipping_address.clone()));
        assert_eq!(order.payment.razorpay_payment_id, "pay_1");
        assert_eq!(order.totals.total, Decimal::new(122_980, 2));
    }
}
