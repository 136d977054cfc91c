//! Razorpay payment handshake.
//!
//! A payment takes three hops:
//!
//! 1. the backend creates a Razorpay order for the amount in paise
//!    ([`PaymentClient::initiate`]);
//! 2. the Razorpay checkout widget collects the payment and hands back the
//!    payment ID and signature ([`PaymentWidget`]);
//! 3. the backend checks the signature ([`PaymentClient::confirm`]).
//!
//! Only a confirmed receipt may be attached to an order.

use std::future::Future;

use hoe_core::{CurrencyCode, OrderTotals};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, Auth};
use crate::checkout::CheckoutError;
use crate::session::TokenNamespace;

const AUTH: Auth = Auth::Session(TokenNamespace::Customer);

/// A Razorpay order ready to be paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub razorpay_order_id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    /// Publishable key the widget must be opened with.
    pub key_id: Option<String>,
}

/// Details the widget prefills for the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentPrefill {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
}

/// What the widget hands back after a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    #[serde(rename = "razorpay_order_id")]
    pub order_id: String,
    #[serde(rename = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(rename = "razorpay_signature")]
    pub signature: String,
}

/// How a widget session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOutcome {
    Paid(PaymentReceipt),
    /// The shopper closed the widget.
    Dismissed,
    Failed(String),
}

/// The payment collection UI.
pub trait PaymentWidget {
    /// Collect payment for `session`.
    fn collect(
        &self,
        session: &PaymentSession,
        prefill: &PaymentPrefill,
    ) -> impl Future<Output = WidgetOutcome> + Send;
}

/// A widget that replays a payment completed elsewhere, such as in a
/// browser, identified by its payment ID and signature.
#[derive(Debug, Clone)]
pub struct ProvidedReceipt {
    pub payment_id: String,
    pub signature: String,
}

impl PaymentWidget for ProvidedReceipt {
    async fn collect(&self, session: &PaymentSession, _prefill: &PaymentPrefill) -> WidgetOutcome {
        WidgetOutcome::Paid(PaymentReceipt {
            order_id: session.razorpay_order_id.clone(),
            payment_id: self.payment_id.clone(),
            signature: self.signature.clone(),
        })
    }
}

#[derive(Serialize)]
struct CreateOrderBody {
    amount: i64,
    currency: &'static str,
}

/// Payment routes.
#[derive(Clone)]
pub struct PaymentClient {
    api: ApiClient,
    fallback_key_id: Option<String>,
}

impl PaymentClient {
    /// `fallback_key_id` is used when the backend does not return a key.
    #[must_use]
    pub const fn new(api: ApiClient, fallback_key_id: Option<String>) -> Self {
        Self {
            api,
            fallback_key_id,
        }
    }

    /// Create a Razorpay order for the grand total.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AmountOutOfRange` for totals that cannot be
    /// expressed in paise, or the backend's failure.
    #[instrument(skip(self, totals), fields(total = %totals.total))]
    pub async fn initiate(&self, totals: &OrderTotals) -> Result<PaymentSession, CheckoutError> {
        let amount = totals
            .total_price()
            .to_minor_units()
            .filter(|paise| *paise > 0)
            .ok_or(CheckoutError::AmountOutOfRange(totals.total))?;
        let body = CreateOrderBody {
            amount,
            currency: CurrencyCode::INR.code(),
        };
        let value = self
            .api
            .post::<Value, _>("payment/create-order", &body, AUTH)
            .await?;
        let session = self.session_from(amount, &value)?;
        info!(razorpay_order_id = %session.razorpay_order_id, amount, "payment initiated");
        Ok(session)
    }

    /// Have the backend check a receipt's signature.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::PaymentNotVerified` when the signature is
    /// refused, whether as `success: false` or as a 400 or 422.
    #[instrument(skip(self, receipt), fields(razorpay_order_id = %receipt.order_id))]
    pub async fn confirm(&self, receipt: &PaymentReceipt) -> Result<(), CheckoutError> {
        let value = match self.api.post::<Value, _>("payment/verify", receipt, AUTH).await {
            Ok(value) => value,
            Err(
                ApiError::Rejected(message)
                | ApiError::Status {
                    status: 400 | 422,
                    message,
                },
            ) => {
                warn!(%message, "payment signature rejected");
                return Err(CheckoutError::PaymentNotVerified(message));
            }
            Err(err) => return Err(err.into()),
        };
        if value.get("verified") == Some(&Value::Bool(false)) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("signature mismatch")
                .to_string();
            warn!(%message, "payment signature rejected");
            return Err(CheckoutError::PaymentNotVerified(message));
        }
        info!(payment_id = %receipt.payment_id, "payment verified");
        Ok(())
    }

    /// Read the Razorpay order out of a create-order response. Keys are
    /// tried in order across the nested `order` and then the top level, so a
    /// top-level `id` naming the backend's own record loses to `order.id`.
    fn session_from(&self, amount: i64, value: &Value) -> Result<PaymentSession, CheckoutError> {
        let scopes = [value.get("order"), Some(value)];
        let field = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| {
                    scopes
                        .iter()
                        .flatten()
                        .find_map(|scope| scope.get(*key).and_then(Value::as_str))
                })
                .map(str::to_string)
        };

        let razorpay_order_id = field(&["razorpayOrderId", "orderId", "id"]).ok_or_else(|| {
            ApiError::UnexpectedShape("payment order response had no order id".to_string())
        })?;
        let amount = scopes
            .iter()
            .flatten()
            .find_map(|scope| scope.get("amount").and_then(Value::as_i64))
            .unwrap_or(amount);

        Ok(PaymentSession {
            razorpay_order_id,
            amount,
            currency: field(&["currency"]).unwrap_or_else(|| CurrencyCode::INR.code().to_string()),
            key_id: field(&["key", "keyId", "key_id"]).or_else(|| self.fallback_key_id.clone()),
        })
    }
}
