//! Sign-in, registration and session lookup for all three portals.
//!
//! Each portal has its own auth routes and its own token slot. Signing in as
//! a vendor does not touch the shopper's session and vice versa.

use hoe_core::{Email, User, Validate, ValidationErrors};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{ApiClient, ApiError, Auth, envelope};
use crate::session::{SessionError, TokenNamespace};

const MIN_PASSWORD_CHARS: usize = 6;

/// Errors from auth operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The backend accepted the request but sent no token.
    #[error("sign-in response did not include a token")]
    MissingToken,

    /// Admin accounts are provisioned out of band.
    #[error("{0} accounts cannot be self-registered")]
    RegistrationClosed(TokenNamespace),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Email and password for a login form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials, checking the email and that a password was given.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` naming every bad field.
    pub fn new(email: &str, password: impl Into<String>) -> Result<Self, ValidationErrors> {
        let password: String = password.into();
        let mut errors = ValidationErrors::default();
        let email = Email::parse(email)
            .inspect_err(|e| errors.push("email", e.to_string()))
            .ok();
        if password.is_empty() {
            errors.push("password", "is required");
        }
        match email {
            Some(email) if errors.is_empty() => Ok(Self {
                email,
                password: SecretString::from(password),
            }),
            _ => Err(errors),
        }
    }
}

/// Sign-up form for shoppers and vendors.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub phone: Option<String>,
    /// Vendor store name; ignored for shoppers.
    pub store_name: Option<String>,
}

impl Validate for Registration {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("name", &self.name);
        if let Err(e) = Email::parse(&self.email) {
            errors.push("email", e.to_string());
        }
        if self.password.expose_secret().chars().count() < MIN_PASSWORD_CHARS {
            errors.push(
                "password",
                format!("must be at least {MIN_PASSWORD_CHARS} characters"),
            );
        }
        if let Some(phone) = &self.phone {
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            if !phone.trim().is_empty() && !(10..=13).contains(&digits) {
                errors.push("phone", "must be a 10 digit mobile number");
            }
        }
        errors.into_result()
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_name: Option<&'a str>,
}

/// Auth routes for every portal.
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Sign in and store the session token.
    ///
    /// Returns the user document when the backend includes one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Api` for rejected credentials and
    /// `AuthError::MissingToken` when no token comes back.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(
        &self,
        namespace: TokenNamespace,
        credentials: &Credentials,
    ) -> Result<Option<User>, AuthError> {
        let body = LoginBody {
            email: credentials.email.as_str(),
            password: credentials.password.expose_secret(),
        };
        let path = format!("{}/login", namespace.auth_prefix());
        let raw = self.api.post_raw(&path, &body, Auth::Public).await?;
        let user = self.store_session(namespace, raw)?;
        info!(%namespace, "signed in");
        Ok(user)
    }

    /// Create an account and store the returned session, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RegistrationClosed` for the admin portal,
    /// `AuthError::Invalid` for bad input, or the backend's rejection.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(
        &self,
        namespace: TokenNamespace,
        registration: &Registration,
    ) -> Result<Option<User>, AuthError> {
        if namespace == TokenNamespace::Admin {
            return Err(AuthError::RegistrationClosed(namespace));
        }
        registration.validate()?;

        let body = RegisterBody {
            name: registration.name.trim(),
            email: registration.email.trim(),
            password: registration.password.expose_secret(),
            phone: registration.phone.as_deref().map(str::trim),
            store_name: if namespace == TokenNamespace::Vendor {
                registration.store_name.as_deref().map(str::trim)
            } else {
                None
            },
        };
        let path = format!("{}/register", namespace.auth_prefix());
        let raw = self.api.post_raw(&path, &body, Auth::Public).await?;

        // Some registration routes sign the user in, others just acknowledge.
        envelope::unwrap(raw.clone())?;
        if find_token(&raw).is_none() {
            return Ok(find_user(&raw));
        }
        let user = self.store_session(namespace, raw)?;
        info!(%namespace, "registered and signed in");
        Ok(user)
    }

    /// The signed-in user for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` (wrapped) when there is no valid
    /// session.
    #[instrument(skip(self))]
    pub async fn me(&self, namespace: TokenNamespace) -> Result<User, AuthError> {
        let path = format!("{}/me", namespace.auth_prefix());
        let value = self.api.get::<Value>(&path, Auth::Session(namespace)).await?;
        let user = serde_json::from_value(envelope::unnest(value, "user")).map_err(ApiError::from)?;
        Ok(user)
    }

    /// Forget the token for `namespace` only.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the token store cannot be updated.
    pub fn logout(&self, namespace: TokenNamespace) -> Result<(), AuthError> {
        self.api.tokens().clear(namespace)?;
        info!(%namespace, "signed out");
        Ok(())
    }

    /// Whether a token is held for `namespace`.
    #[must_use]
    pub fn is_signed_in(&self, namespace: TokenNamespace) -> bool {
        self.api.is_signed_in(namespace)
    }

    fn store_session(
        &self,
        namespace: TokenNamespace,
        raw: Value,
    ) -> Result<Option<User>, AuthError> {
        envelope::unwrap(raw.clone())?;
        let token = find_token(&raw).ok_or(AuthError::MissingToken)?;
        self.api
            .tokens()
            .set(namespace, SecretString::from(token.to_string()))?;
        Ok(find_user(&raw))
    }
}

/// Scopes a login response may keep its fields in: the body itself, then
/// `data`.
fn scopes(raw: &Value) -> impl Iterator<Item = &Value> {
    std::iter::once(raw).chain(raw.get("data"))
}

fn find_token(raw: &Value) -> Option<&str> {
    scopes(raw)
        .flat_map(|scope| ["token", "accessToken"].map(|k| scope.get(k)))
        .flatten()
        .find_map(Value::as_str)
        .filter(|t| !t.is_empty())
}

fn find_user(raw: &Value) -> Option<User> {
    scopes(raw)
        .filter_map(|scope| scope.get("user"))
        .find_map(|user| serde_json::from_value(user.clone()).ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_token_locations() {
        assert_eq!(find_token(&json!({"token": "a"})), Some("a"));
        assert_eq!(find_token(&json!({"accessToken": "b"})), Some("b"));
        assert_eq!(
            find_token(&json!({"success": true, "data": {"token": "c"}})),
            Some("c")
        );
        assert_eq!(find_token(&json!({"token": ""})), None);
        assert_eq!(find_token(&json!({"success": true})), None);
    }

    #[test]
    fn test_user_from_nested_data() {
        let raw = json!({
            "success": true,
            "data": {"token": "t", "user": {"_id": "u1", "name": "Asha", "email": "asha@example.com", "role": "vendor"}}
        });
        let user = find_user(&raw).unwrap();
        assert_eq!(user.name, "Asha");
        assert_eq!(user.role, hoe_core::UserRole::Vendor);
    }

    #[test]
    fn test_credentials_collect_every_problem() {
        let errors = Credentials::new("not-an-email", "").unwrap_err();
        assert!(errors.has("email"));
        assert!(errors.has("password"));

        let ok = Credentials::new("  Shopper@Example.com ", "secret").unwrap();
        assert_eq!(ok.email.as_str(), "shopper@example.com");
    }

    #[test]
    fn test_registration_rules() {
        let registration = Registration {
            name: " ".to_string(),
            email: "asha@example.com".to_string(),
            password: SecretString::from("123"),
            phone: Some("98765".to_string()),
            store_name: None,
        };
        let errors = registration.validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("password"));
        assert!(errors.has("phone"));
        assert!(!errors.has("email"));
    }
}
