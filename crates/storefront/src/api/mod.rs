//! Marketplace REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - no local persistence, direct calls
//! - Responses arrive either as `{ success, data }` envelopes or as the raw
//!   payload; [`envelope`] accepts both
//! - A 401 on an authenticated request clears that namespace's token before
//!   the error is returned, so the caller only has to send the user to login
//!
//! # Example
//!
//! ```rust,ignore
//! use hoe_storefront::api::{ApiClient, Auth};
//!
//! let api = ApiClient::new(&config, tokens)?;
//! let brands: Vec<Brand> = api.get_list("brands", Auth::Public).await?;
//! ```

mod client;
pub mod envelope;

pub use client::{ApiClient, Auth};

use thiserror::Error;

use crate::session::{SessionError, TokenNamespace};

/// Errors that can occur when talking to the marketplace backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The session for this namespace is missing or expired. Its token has
    /// been cleared.
    #[error("Not signed in ({0} session)")]
    Unauthorized(TokenNamespace),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The backend answered `{ "success": false }`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The response decoded but lacked a field the client needs.
    #[error("Unexpected response: {0}")]
    UnexpectedShape(String),

    /// Reading or clearing a stored token failed.
    #[error("Session storage error: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// HTTP status associated with the error, when there is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
