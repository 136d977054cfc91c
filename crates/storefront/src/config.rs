//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults point at the production backend.
//!
//! - `HOE_API_BASE_URL` - Marketplace REST API root (default: `https://hoe-be.onrender.com/api`)
//! - `HOE_GEOCODER_URL` - Nominatim-compatible geocoder (default: `https://nominatim.openstreetmap.org`)
//! - `HOE_GEOCODER_USER_AGENT` - User agent sent to the geocoder (default: `hoe-storefront/<version>`)
//! - `HOE_TOKEN_FILE` - Where auth tokens are kept between runs (default: `.hoe/tokens.json`)
//! - `HOE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `HOE_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime, `0` disables (default: 300)
//! - `RAZORPAY_KEY_ID` - Razorpay publishable key, used when the backend does not send one
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "https://hoe-be.onrender.com/api";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_TOKEN_FILE: &str = ".hoe/tokens.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Marketplace REST API root, without a trailing slash
    pub api_base_url: String,
    /// Geocoding service configuration
    pub geocoder: GeocoderConfig,
    /// Token persistence file
    pub token_file: PathBuf,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Catalog cache lifetime (`None` disables caching)
    pub catalog_cache_ttl: Option<Duration>,
    /// Razorpay publishable key fallback
    pub razorpay_key_id: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Geocoding service configuration.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Service root, without a trailing slash
    pub base_url: String,
    /// User agent (Nominatim rejects anonymous clients)
    pub user_agent: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = parse_base_url(
            "HOE_API_BASE_URL",
            &get("HOE_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let geocoder = GeocoderConfig {
            base_url: parse_base_url(
                "HOE_GEOCODER_URL",
                &get("HOE_GEOCODER_URL").unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
            )?,
            user_agent: get("HOE_GEOCODER_USER_AGENT").unwrap_or_else(default_user_agent),
        };
        let token_file = get("HOE_TOKEN_FILE").map_or_else(|| DEFAULT_TOKEN_FILE.into(), PathBuf::from);
        let request_timeout = Duration::from_secs(parse_secs(
            "HOE_REQUEST_TIMEOUT_SECS",
            get("HOE_REQUEST_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?);
        let cache_secs = parse_secs(
            "HOE_CATALOG_CACHE_TTL_SECS",
            get("HOE_CATALOG_CACHE_TTL_SECS"),
            DEFAULT_CACHE_TTL_SECS,
        )?;
        let catalog_cache_ttl = (cache_secs > 0).then(|| Duration::from_secs(cache_secs));

        Ok(Self {
            api_base_url,
            geocoder,
            token_file,
            request_timeout,
            catalog_cache_ttl,
            razorpay_key_id: get("RAZORPAY_KEY_ID"),
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing both the API and the geocoder at `base_url`,
    /// with caching disabled. Used against local and fake backends.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let api_base_url = parse_base_url("base_url", base_url)?;
        Ok(Self {
            geocoder: GeocoderConfig {
                base_url: api_base_url.clone(),
                user_agent: default_user_agent(),
            },
            api_base_url,
            token_file: DEFAULT_TOKEN_FILE.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog_cache_ttl: None,
            razorpay_key_id: None,
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn default_user_agent() -> String {
    format!("hoe-storefront/{}", env!("CARGO_PKG_VERSION"))
}

/// Validate an http(s) base URL and strip any trailing slash.
fn parse_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    value.map_or(Ok(default), |v| {
        v.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, "https://hoe-be.onrender.com/api");
        assert_eq!(config.geocoder.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.catalog_cache_ttl, Some(Duration::from_secs(300)));
        assert!(config.geocoder.user_agent.starts_with("hoe-storefront/"));
        assert!(config.razorpay_key_id.is_none());
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let config =
            StorefrontConfig::from_lookup(lookup(&[("HOE_API_BASE_URL", "http://localhost:5000/api/")]))
                .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let config =
            StorefrontConfig::from_lookup(lookup(&[("HOE_CATALOG_CACHE_TTL_SECS", "0")])).unwrap();
        assert!(config.catalog_cache_ttl.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = StorefrontConfig::from_lookup(lookup(&[("HOE_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "HOE_REQUEST_TIMEOUT_SECS"));

        let err =
            StorefrontConfig::from_lookup(lookup(&[("HOE_API_BASE_URL", "ftp://example.com")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(&[("HOE_API_BASE_URL", "  ")])).unwrap();
        assert_eq!(config.api_base_url, "https://hoe-be.onrender.com/api");
    }

    #[test]
    fn test_for_base_url_shares_host() {
        let config = StorefrontConfig::for_base_url("http://127.0.0.1:4000").unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:4000");
        assert_eq!(config.geocoder.base_url, "http://127.0.0.1:4000");
        assert!(config.catalog_cache_ttl.is_none());
    }
}
