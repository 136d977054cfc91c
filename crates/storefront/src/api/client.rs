//! HTTP transport for the marketplace backend.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{ApiError, envelope};
use crate::config::StorefrontConfig;
use crate::session::{TokenNamespace, TokenStore};

/// Maximum number of body characters written to logs.
const LOG_BODY_CHARS: usize = 500;

/// How a request authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// No credentials (catalog reads, login).
    Public,
    /// Bearer token from the given namespace.
    Session(TokenNamespace),
}

impl From<TokenNamespace> for Auth {
    fn from(namespace: TokenNamespace) -> Self {
        Self::Session(namespace)
    }
}

/// Client for the marketplace REST API.
///
/// Cheap to clone; all clones share one connection pool and token store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("hoe-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.trim_end_matches('/').to_string(),
                tokens,
            }),
        })
    }

    /// Token store shared by this client.
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.inner.tokens
    }

    /// Whether a token is present for `namespace`.
    #[must_use]
    pub fn is_signed_in(&self, namespace: TokenNamespace) -> bool {
        self.inner.tokens.get(namespace).is_some()
    }

    /// Absolute URL for an API path such as `cart/123`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// GET and decode an enveloped or raw payload.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport, status, envelope or decode failures.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, auth: Auth) -> Result<T, ApiError> {
        let value = self.send(Method::GET, path, auth, |r| r).await?;
        envelope::decode(value)
    }

    /// GET with query parameters and decode.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport, status, envelope or decode failures.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q, auth: Auth) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let value = self.send(Method::GET, path, auth, |r| r.query(query)).await?;
        envelope::decode(value)
    }

    /// GET a list, accepting every list shape the backend produces.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport, status, envelope or decode failures.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: Auth,
    ) -> Result<Vec<T>, ApiError> {
        let value = self.send(Method::GET, path, auth, |r| r).await?;
        envelope::decode_list(value)
    }

    /// GET the undecoded response body (envelope included).
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport or status failures.
    pub async fn get_raw<Q>(&self, path: &str, query: &Q, auth: Auth) -> Result<Value, ApiError>
    where
        Q: Serialize + ?Sized,
    {
        self.send(Method::GET, path, auth, |r| r.query(query)).await
    }

    /// POST a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport, status, envelope or decode failures.
    pub async fn post<T, B>(&self, path: &str, body: &B, auth: Auth) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.send(Method::POST, path, auth, |r| r.json(body)).await?;
        envelope::decode(value)
    }

    /// POST a JSON body and return the undecoded response.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport or status failures.
    pub async fn post_raw<B>(&self, path: &str, body: &B, auth: Auth) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, auth, |r| r.json(body)).await
    }

    /// PUT a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport, status, envelope or decode failures.
    pub async fn put<T, B>(&self, path: &str, body: &B, auth: Auth) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.send(Method::PUT, path, auth, |r| r.json(body)).await?;
        envelope::decode(value)
    }

    /// PATCH a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport, status, envelope or decode failures.
    pub async fn patch<T, B>(&self, path: &str, body: &B, auth: Auth) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.send(Method::PATCH, path, auth, |r| r.json(body)).await?;
        envelope::decode(value)
    }

    /// DELETE and decode the response.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport, status, envelope or decode failures.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str, auth: Auth) -> Result<T, ApiError> {
        let value = self.send(Method::DELETE, path, auth, |r| r).await?;
        envelope::decode(value)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Send a request and return the parsed (still enveloped) body.
    #[instrument(skip(self, build), fields(url = %self.url(path)))]
    async fn send<F>(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        build: F,
    ) -> Result<Value, ApiError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let request_id = uuid::Uuid::new_v4();
        let mut request = self
            .inner
            .http
            .request(method.clone(), self.url(path))
            .header("X-Request-Id", request_id.to_string())
            .header("Accept", "application/json");

        if let Auth::Session(namespace) = auth {
            let Some(token) = self.inner.tokens.get(namespace) else {
                debug!(%namespace, "no token stored, skipping request");
                return Err(ApiError::Unauthorized(namespace));
            };
            request = request.bearer_auth(token.expose_secret());
        }

        let response = build(request).send().await?;
        let status = response.status();
        debug!(%method, %status, %request_id, "backend responded");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED
            && let Auth::Session(namespace) = auth
        {
            warn!(%namespace, "session rejected by backend, clearing token");
            self.inner.tokens.clear(namespace)?;
            return Err(ApiError::Unauthorized(namespace));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(envelope::error_message(&body)));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: envelope::error_message(&body),
            });
        }

        envelope::parse_body(&body).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "failed to parse backend response"
            );
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::MemoryTokenStore;

    fn client(base: &str) -> ApiClient {
        let config = StorefrontConfig::for_base_url(base).unwrap();
        ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_url_joins_paths() {
        let api = client("http://localhost:5000/api/");
        assert_eq!(api.url("brands"), "http://localhost:5000/api/brands");
        assert_eq!(api.url("/cart/ci1"), "http://localhost:5000/api/cart/ci1");
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        // Port 9 (discard) is never contacted: the request is refused locally.
        let api = client("http://127.0.0.1:9");
        let err = api
            .get::<Value>("cart", Auth::Session(TokenNamespace::Customer))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(TokenNamespace::Customer)));
    }
}
