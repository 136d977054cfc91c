//! Catalog browsing, cart synchronisation and the wishlist against the fake
//! backend.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use hoe_core::{CartItem, CategoryId, ProductId};
use hoe_integration_tests::{FakeBackend, MUG, SAREE, SHAWL, sign_in};
use hoe_storefront::api::ApiError;
use hoe_storefront::cart::{CartError, CartManager};
use hoe_storefront::catalog::ProductQuery;
use hoe_storefront::session::TokenNamespace;
use rust_decimal::Decimal;

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_catalog_lists_decode_every_response_shape() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let catalog = storefront.catalog();

    // Raw array, `{data: {categories}}` and `{data: [...]}` respectively.
    assert_eq!(catalog.list_brands().await.unwrap().len(), 2);
    assert_eq!(catalog.list_categories().await.unwrap().len(), 2);
    assert_eq!(catalog.list_subcategories(None).await.unwrap().len(), 2);

    let apparel = CategoryId::new("c-apparel");
    let sarees = catalog.list_subcategories(Some(&apparel)).await.unwrap();
    assert_eq!(sarees.len(), 1);
    assert_eq!(sarees[0].name, "Sarees");
}

#[tokio::test]
async fn test_product_listing_filters_and_pages() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let catalog = storefront.catalog();

    let first = catalog
        .list_products(&ProductQuery {
            limit: Some(2),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(first.products.len(), 2);
    assert_eq!(first.total, Some(3));
    assert!(first.has_more());

    let last = catalog
        .list_products(&ProductQuery {
            page: Some(2),
            limit: Some(2),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(last.products.len(), 1);
    assert!(!last.has_more());

    let loom = catalog
        .list_products(&ProductQuery {
            brand: Some("b-loom".to_string()),
            search: Some("silk".to_string()),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(loom.products.len(), 1);
    assert_eq!(loom.products[0].id.as_str(), SAREE);
}

#[tokio::test]
async fn test_product_detail_and_missing_product() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    let saree = storefront
        .catalog()
        .get_product(&ProductId::new(SAREE))
        .await
        .unwrap();
    assert_eq!(saree.effective_price(), Decimal::new(4499, 0));
    assert_eq!(saree.attribute("Color"), Some("Red"));

    let err = storefront
        .catalog()
        .get_product(&ProductId::new("p-nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(message) if message == "Product not found"));
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    backend.fail_next(StatusCode::TOO_MANY_REQUESTS, "Slow down");

    let err = storefront.catalog().list_brands().await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(7)));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_cart_mutations_refetch_server_state() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut cart = storefront.cart();

    cart.add(&ProductId::new(SAREE), 2).await.unwrap();
    cart.add(&ProductId::new(MUG), 1).await.unwrap();
    cart.add(&ProductId::new(SAREE), 1).await.unwrap();

    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.item_count(), 4);
    // 3 x 4499 discounted + 1 x 499
    assert_eq!(cart.subtotal(), Decimal::new(13_996, 0));
    assert_eq!(cart.totals().tax, Decimal::new(139_960, 2));

    let saree_line = cart.find_by_product(&ProductId::new(SAREE)).unwrap().id.clone();
    cart.set_quantity(&saree_line, 1).await.unwrap();
    assert_eq!(cart.item_count(), 2);

    cart.remove_by_product_id(&ProductId::new(MUG)).await.unwrap();
    assert_eq!(backend.cart_lines(), vec![(SAREE.to_string(), 1)]);

    cart.clear().await.unwrap();
    assert!(cart.is_empty());
    assert!(backend.cart_lines().is_empty());
}

#[tokio::test]
async fn test_cart_reverts_to_server_state_after_refusal() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut cart = storefront.cart();

    cart.add(&ProductId::new(SAREE), 4).await.unwrap();
    let err = cart.add(&ProductId::new(SAREE), 2).await.unwrap_err();
    assert!(matches!(
        err,
        CartError::Api(ApiError::Status { status: 400, ref message }) if message == "Only 5 left in stock"
    ));
    assert_eq!(cart.item_count(), 4);

    let err = cart.add(&ProductId::new(SHAWL), 1).await.unwrap_err();
    assert!(matches!(err, CartError::Api(ApiError::Status { .. })));
    assert!(cart.find_by_product(&ProductId::new(SHAWL)).is_none());
}

#[tokio::test]
async fn test_cart_failure_refetches_after_server_error() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut cart = storefront.cart();
    cart.add(&ProductId::new(MUG), 2).await.unwrap();

    backend.fail_next(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    let err = cart.add(&ProductId::new(MUG), 1).await.unwrap_err();
    assert!(matches!(err, CartError::Api(ApiError::Status { status: 500, .. })));
    assert_eq!(cart.item_count(), 2);

    let requests = backend.requests();
    assert_eq!(requests.last().map(String::as_str), Some("GET /cart"));
}

#[tokio::test]
async fn test_zero_quantity_is_refused_locally() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let before = backend.requests().len();

    let err = storefront
        .cart()
        .add(&ProductId::new(MUG), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::ZeroQuantity));
    assert_eq!(backend.requests().len(), before);
}

#[tokio::test]
async fn test_remove_line_by_item_id() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut cart = storefront.cart();
    cart.add(&ProductId::new(SAREE), 1).await.unwrap();
    cart.add(&ProductId::new(MUG), 3).await.unwrap();

    let mug_line = cart.find_by_product(&ProductId::new(MUG)).unwrap().id.clone();
    cart.remove(&mug_line).await.unwrap();

    assert_eq!(backend.cart_lines(), vec![(SAREE.to_string(), 1)]);
    assert_eq!(cart.items().len(), 1);
    assert!(cart.find_by_product(&ProductId::new(MUG)).is_none());
    assert!(
        backend
            .requests()
            .contains(&format!("DELETE /cart/{mug_line}"))
    );
}

#[tokio::test]
async fn test_zero_quantity_update_removes_the_line() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut cart = storefront.cart();
    cart.add(&ProductId::new(SAREE), 2).await.unwrap();
    cart.add(&ProductId::new(MUG), 1).await.unwrap();

    let saree_line = cart.find_by_product(&ProductId::new(SAREE)).unwrap().id.clone();
    cart.set_quantity(&saree_line, 0).await.unwrap();

    assert_eq!(backend.cart_lines(), vec![(MUG.to_string(), 1)]);
    assert_eq!(cart.item_count(), 1);
    assert!(cart.find_by_product(&ProductId::new(SAREE)).is_none());

    let requests = backend.requests();
    assert!(requests.contains(&format!("DELETE /cart/{saree_line}")));
    assert!(!requests.iter().any(|r| r.starts_with("PUT /cart/")));
}

fn gone_line_total(cart: &CartManager) -> Decimal {
    cart.items()
        .iter()
        .filter(|i| !i.is_available())
        .map(CartItem::line_total)
        .sum()
}

#[tokio::test]
async fn test_cart_survives_a_deleted_product() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut cart = storefront.cart();
    cart.add(&ProductId::new(SAREE), 1).await.unwrap();
    cart.add(&ProductId::new(MUG), 2).await.unwrap();

    backend.delete_document("products", MUG);

    let items = cart.refresh().await.unwrap();
    assert_eq!(items.len(), 2);
    let gone = items.iter().find(|i| !i.is_available()).unwrap().id.clone();
    // The deleted mug is listed but not charged.
    assert_eq!(gone_line_total(&cart), Decimal::new(998, 0));
    assert_eq!(cart.subtotal(), Decimal::new(4499, 0));
    assert_eq!(cart.totals().subtotal, Decimal::new(4499, 0));

    // Mutations still reconcile while the bad line is present.
    let saree_line = cart.find_by_product(&ProductId::new(SAREE)).unwrap().id.clone();
    cart.set_quantity(&saree_line, 2).await.unwrap();
    assert_eq!(cart.item_count(), 4);

    cart.remove(&gone).await.unwrap();
    assert_eq!(cart.items().len(), 1);
    assert!(cart.items().iter().all(|i| i.is_available()));
}

// ============================================================================
// Wishlist
// ============================================================================

#[tokio::test]
async fn test_wishlist_add_and_move_to_cart() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut wishlist = storefront.wishlist();
    let mut cart = storefront.cart();

    wishlist.add(&ProductId::new(SAREE)).await.unwrap();
    wishlist.add(&ProductId::new(MUG)).await.unwrap();
    assert!(wishlist.contains(&ProductId::new(SAREE)));
    assert_eq!(wishlist.items().len(), 2);

    wishlist
        .move_to_cart(&ProductId::new(SAREE), &mut cart)
        .await
        .unwrap();
    assert!(!wishlist.contains(&ProductId::new(SAREE)));
    assert_eq!(cart.item_count(), 1);

    wishlist.remove(&ProductId::new(MUG)).await.unwrap();
    assert!(wishlist.items().is_empty());
}

#[tokio::test]
async fn test_move_to_cart_keeps_entry_when_out_of_stock() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut wishlist = storefront.wishlist();
    let mut cart = storefront.cart();

    wishlist.add(&ProductId::new(SHAWL)).await.unwrap();
    assert!(
        wishlist
            .move_to_cart(&ProductId::new(SHAWL), &mut cart)
            .await
            .is_err()
    );
    assert!(wishlist.contains(&ProductId::new(SHAWL)));
    assert!(cart.is_empty());
}
