//! Crate-level error type.
//!
//! Every operation returns its own error enum; [`Error`] gathers them so a
//! front end can handle all storefront failures in one place and show the
//! shopper a short message.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::geocode::GeocodeError;
use crate::session::{SessionError, TokenNamespace};

/// Any storefront failure.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

impl Error {
    /// The session the user must sign back into, if this failure was an
    /// expired or missing session.
    #[must_use]
    pub const fn requires_login(&self) -> Option<TokenNamespace> {
        let api = match self {
            Self::Api(err)
            | Self::Auth(AuthError::Api(err))
            | Self::Cart(CartError::Api(err))
            | Self::Checkout(CheckoutError::Api(err)) => err,
            _ => return None,
        };
        match api {
            ApiError::Unauthorized(namespace) => Some(*namespace),
            _ => None,
        }
    }

    /// Short message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        if let Some(namespace) = self.requires_login() {
            return match namespace {
                TokenNamespace::Customer => {
                    "Your session has expired. Run `hoe auth login` to sign in again.".to_string()
                }
                other => format!(
                    "Your {other} session has expired. Run `hoe auth login --as {other}` to sign in again."
                ),
            };
        }
        match self {
            Self::Api(err)
            | Self::Auth(AuthError::Api(err))
            | Self::Cart(CartError::Api(err))
            | Self::Checkout(CheckoutError::Api(err)) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl ApiError {
    /// Short message for a failed backend call. Backend messages are shown
    /// as sent.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => {
                "The marketplace took too long to respond. Please try again.".to_string()
            }
            Self::Http(_) => "Could not reach the marketplace. Check your connection.".to_string(),
            Self::RateLimited(secs) => {
                format!("Too many requests. Please wait {secs} seconds and try again.")
            }
            Self::NotFound(message) | Self::Rejected(message) | Self::Status { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
