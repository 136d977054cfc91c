//! Error type for portal operations.

use hoe_core::ValidationErrors;
use hoe_storefront::api::ApiError;
use hoe_storefront::session::TokenNamespace;
use thiserror::Error;

use crate::portal::Portal;

/// Portal operation error.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The portal has no access to this kind of document.
    #[error("the {portal} portal cannot manage {resource}")]
    NotPermitted {
        portal: Portal,
        resource: &'static str,
    },

    /// The form failed client-side validation; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AdminError {
    /// The session that must be renewed, if the portal session expired.
    #[must_use]
    pub const fn requires_login(&self) -> Option<TokenNamespace> {
        match self {
            Self::Api(ApiError::Unauthorized(namespace)) => Some(*namespace),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_permitted_message() {
        let err = AdminError::NotPermitted {
            portal: Portal::Vendor,
            resource: "brands",
        };
        assert_eq!(err.to_string(), "the vendor portal cannot manage brands");
        assert_eq!(err.requires_login(), None);
    }

    #[test]
    fn test_requires_login() {
        let err = AdminError::from(ApiError::Unauthorized(TokenNamespace::Admin));
        assert_eq!(err.requires_login(), Some(TokenNamespace::Admin));
    }
}
