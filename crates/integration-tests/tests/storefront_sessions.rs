//! Sign-in, registration and session expiry for the three portals.

#![allow(clippy::unwrap_used)]

use hoe_core::{ProductId, UserRole};
use hoe_integration_tests::{ADMIN, CUSTOMER, FakeBackend, MUG, VENDOR, sign_in};
use hoe_storefront::Error;
use hoe_storefront::api::ApiError;
use hoe_storefront::auth::{AuthError, Credentials, Registration};
use hoe_storefront::cart::CartError;
use hoe_storefront::session::TokenNamespace;
use secrecy::SecretString;

fn registration(email: &str) -> Registration {
    Registration {
        name: "Meera Iyer".to_string(),
        email: email.to_string(),
        password: SecretString::from("hunter22"),
        phone: Some("9812345678".to_string()),
        store_name: Some("Meera Handlooms".to_string()),
    }
}

#[tokio::test]
async fn test_login_reads_each_portal_response_shape() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let auth = storefront.auth();

    for (namespace, (email, password), role) in [
        (TokenNamespace::Customer, CUSTOMER, UserRole::Customer),
        (TokenNamespace::Vendor, VENDOR, UserRole::Vendor),
        (TokenNamespace::Admin, ADMIN, UserRole::Admin),
    ] {
        let credentials = Credentials::new(email, password).unwrap();
        let user = auth.login(namespace, &credentials).await.unwrap().unwrap();
        assert_eq!(user.role, role, "{namespace}");
        assert!(auth.is_signed_in(namespace));
        assert_eq!(auth.me(namespace).await.unwrap().email, email);
    }
}

#[tokio::test]
async fn test_wrong_password_stores_nothing() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let auth = storefront.auth();

    let credentials = Credentials::new(CUSTOMER.0, "not-it").unwrap();
    let err = auth
        .login(TokenNamespace::Customer, &credentials)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Api(ApiError::Status { status: 401, .. })));
    assert!(!auth.is_signed_in(TokenNamespace::Customer));
}

#[tokio::test]
async fn test_logout_only_clears_its_own_session() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    sign_in(&storefront, TokenNamespace::Vendor).await;
    let auth = storefront.auth();

    auth.logout(TokenNamespace::Vendor).unwrap();
    assert!(!auth.is_signed_in(TokenNamespace::Vendor));
    assert!(auth.is_signed_in(TokenNamespace::Customer));
    assert_eq!(
        auth.me(TokenNamespace::Customer).await.unwrap().email,
        CUSTOMER.0
    );
}

#[tokio::test]
async fn test_customer_registration_signs_in() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let auth = storefront.auth();

    let user = auth
        .register(TokenNamespace::Customer, &registration("meera@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Meera Iyer");
    assert!(auth.is_signed_in(TokenNamespace::Customer));

    let err = auth
        .register(TokenNamespace::Customer, &registration("meera@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Api(ApiError::Status { status: 400, .. })));
}

#[tokio::test]
async fn test_vendor_registration_waits_for_approval() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let auth = storefront.auth();

    let user = auth
        .register(TokenNamespace::Vendor, &registration("meera@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Meera Handlooms");
    assert_eq!(user.role, UserRole::Vendor);
    assert!(!auth.is_signed_in(TokenNamespace::Vendor));
}

#[tokio::test]
async fn test_admin_registration_and_bad_forms_are_refused_locally() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let auth = storefront.auth();

    let err = auth
        .register(TokenNamespace::Admin, &registration("boss@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RegistrationClosed(TokenNamespace::Admin)));

    let mut weak = registration("meera@example.com");
    weak.password = SecretString::from("123");
    let err = auth
        .register(TokenNamespace::Customer, &weak)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Invalid(ref errors) if errors.has("password")));

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_expired_session_clears_token_and_cart() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    sign_in(&storefront, TokenNamespace::Admin).await;
    let mut cart = storefront.cart();
    cart.add(&ProductId::new(MUG), 1).await.unwrap();

    backend.expire_sessions();
    let err = cart.refresh().await.unwrap_err();
    assert!(matches!(
        err,
        CartError::Api(ApiError::Unauthorized(TokenNamespace::Customer))
    ));
    assert!(cart.is_empty());

    let auth = storefront.auth();
    assert!(!auth.is_signed_in(TokenNamespace::Customer));
    // The admin token is only dropped once the admin portal is refused.
    assert!(auth.is_signed_in(TokenNamespace::Admin));

    let err = Error::from(err);
    assert_eq!(err.requires_login(), Some(TokenNamespace::Customer));
}
