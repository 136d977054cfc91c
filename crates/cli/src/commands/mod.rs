//! Command implementations, one module per area.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod wishlist;

use hoe_admin::{AdminError, Portal, PortalClient};
use hoe_core::ValidationErrors;
use hoe_storefront::Storefront;
use hoe_storefront::api::ApiError;
use hoe_storefront::auth::AuthError;
use hoe_storefront::cart::CartError;
use hoe_storefront::checkout::CheckoutError;
use hoe_storefront::geocode::GeocodeError;
use hoe_storefront::session::{SessionError, TokenNamespace};
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Storefront(#[from] hoe_storefront::Error),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// Arguments that parse but make no sense together.
    #[error("{0}")]
    Usage(String),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! storefront_error {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for CommandError {
                fn from(err: $source) -> Self {
                    Self::Storefront(err.into())
                }
            }
        )+
    };
}

storefront_error!(
    ApiError,
    AuthError,
    CartError,
    CheckoutError,
    GeocodeError,
    SessionError,
);

impl CommandError {
    /// The session to sign back into, if the command failed on an expired
    /// session.
    #[must_use]
    pub const fn requires_login(&self) -> Option<TokenNamespace> {
        match self {
            Self::Storefront(err) => err.requires_login(),
            Self::Admin(err) => err.requires_login(),
            _ => None,
        }
    }

    /// Short message for the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storefront(err) => err.user_message(),
            Self::Admin(AdminError::Api(ApiError::Unauthorized(namespace))) => format!(
                "Your {namespace} session has expired. Run `hoe auth login --as {namespace}` to sign in again."
            ),
            Self::Admin(AdminError::Api(err)) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Everything a command needs.
pub struct Context {
    pub storefront: Storefront,
}

impl Context {
    #[must_use]
    pub const fn new(storefront: Storefront) -> Self {
        Self { storefront }
    }

    /// Client for the admin or vendor portal.
    #[must_use]
    pub fn portal(&self, portal: Portal) -> PortalClient {
        PortalClient::new(self.storefront.api().clone(), portal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_portal_session_message() {
        let err = CommandError::from(AdminError::Api(ApiError::Unauthorized(
            TokenNamespace::Vendor,
        )));
        assert_eq!(err.requires_login(), Some(TokenNamespace::Vendor));
        assert!(err.user_message().contains("--as vendor"));
    }

    #[test]
    fn test_storefront_errors_convert() {
        let err = CommandError::from(CheckoutError::EmptyCart);
        assert!(matches!(err, CommandError::Storefront(_)));
        assert_eq!(err.user_message(), "cart is empty");
    }
}
