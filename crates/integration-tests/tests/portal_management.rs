//! Admin and vendor portals: catalog CRUD, access rules and order
//! fulfilment.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use hoe_admin::{AdminError, OrderFilter, Portal, PortalClient, ShipmentUpdate};
use hoe_core::{
    BrandInput, CategoryId, CategoryInput, Order, OrderStatus, ProductAttribute, ProductId,
    ProductInput, ShipmentStatus, SubcategoryInput,
};
use hoe_integration_tests::{
    FakeBackend, MUG, SAREE, SHAWL, ScriptedWidget, sample_address, sign_in,
};
use hoe_storefront::Storefront;
use hoe_storefront::api::ApiError;
use hoe_storefront::session::TokenNamespace;
use rust_decimal::Decimal;

async fn portal(storefront: &Storefront, portal: Portal) -> PortalClient {
    sign_in(storefront, portal.namespace()).await;
    PortalClient::new(storefront.api().clone(), portal)
}

fn product_input(name: &str) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: Some("Handwoven".to_string()),
        brand: "b-loom".into(),
        category: "c-apparel".into(),
        subcategory: Some("s-sarees".into()),
        price: Decimal::new(3499, 0),
        discount_price: Some(Decimal::new(2999, 0)),
        stock: 7,
        attributes: vec![ProductAttribute {
            name: "Fabric".to_string(),
            value: "Cotton".to_string(),
        }],
        images: vec!["https://cdn.example.com/dupatta.jpg".to_string()],
    }
}

/// Buy one of `product` as the seeded customer.
async fn customer_order(backend: &FakeBackend, product: &str) -> Order {
    let storefront = backend.storefront();
    sign_in(&storefront, TokenNamespace::Customer).await;
    let mut cart = storefront.cart();
    cart.add(&ProductId::new(product), 1).await.unwrap();
    let mut checkout = storefront.checkout(&cart).unwrap();
    checkout
        .set_shipping_address(sample_address())
        .await
        .unwrap();
    checkout.continue_to_payment().unwrap();
    checkout.pay(&ScriptedWidget::Pay).await.unwrap();
    checkout.place_order(&mut cart).await.unwrap().clone()
}

// ============================================================================
// Catalog CRUD
// ============================================================================

#[tokio::test]
async fn test_admin_manages_brands() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let admin = portal(&storefront, Portal::Admin).await;
    let brands = admin.brands().unwrap();

    let created = brands
        .create(&BrandInput {
            name: "Kalki".to_string(),
            description: None,
            logo: Some("https://cdn.example.com/kalki.png".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(created.name, "Kalki");
    assert_eq!(brands.list().await.unwrap().len(), 3);

    let renamed = brands
        .update(
            &created.id,
            &BrandInput {
                name: "Kalki Fashion".to_string(),
                description: Some("Ethnic wear".to_string()),
                logo: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Kalki Fashion");
    assert_eq!(brands.get(&created.id).await.unwrap().name, "Kalki Fashion");

    brands.delete(&created.id).await.unwrap();
    assert_eq!(brands.list().await.unwrap().len(), 2);
    assert!(backend.document("brands", created.id.as_str()).is_none());
    assert!(matches!(
        brands.get(&created.id).await,
        Err(AdminError::Api(ApiError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_admin_manages_categories_and_subcategories() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let admin = portal(&storefront, Portal::Admin).await;

    let jewellery = admin
        .categories()
        .unwrap()
        .create(&CategoryInput {
            name: "Jewellery".to_string(),
            description: None,
            image: None,
        })
        .await
        .unwrap();

    let subcategories = admin.subcategories().unwrap();
    let earrings = subcategories
        .create(&SubcategoryInput {
            name: "Earrings".to_string(),
            category: jewellery.id.clone(),
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(
        earrings.category.as_ref().and_then(|c| c.id()),
        Some(jewellery.id.as_str())
    );

    let listed = storefront
        .catalog()
        .list_subcategories(Some(&jewellery.id))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_invalid_forms_are_never_sent() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let admin = portal(&storefront, Portal::Admin).await;
    let before = backend.requests().len();

    let err = admin
        .subcategories()
        .unwrap()
        .create(&SubcategoryInput {
            name: "  ".to_string(),
            category: CategoryId::new("c-apparel"),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Invalid(ref errors) if errors.has("name")));

    let overpriced_sale = ProductInput {
        price: Decimal::new(100, 0),
        discount_price: Some(Decimal::new(150, 0)),
        ..product_input("Dupatta")
    };
    let err = admin
        .products()
        .unwrap()
        .create(&overpriced_sale)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Invalid(ref errors) if errors.has("discountPrice")));

    assert_eq!(backend.requests().len(), before);
}

#[tokio::test]
async fn test_vendor_only_reaches_its_own_products() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let vendor = portal(&storefront, Portal::Vendor).await;

    assert!(matches!(
        vendor.brands(),
        Err(AdminError::NotPermitted {
            portal: Portal::Vendor,
            resource: "brands"
        })
    ));
    assert!(vendor.categories().is_err());
    assert!(vendor.subcategories().is_err());

    let products = vendor.products().unwrap();
    let mine: Vec<String> = products
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(mine, vec![SAREE.to_string(), SHAWL.to_string()]);

    let dupatta = products.create(&product_input("Dupatta")).await.unwrap();
    assert_eq!(dupatta.attribute("Fabric"), Some("Cotton"));
    assert_eq!(
        backend.document("products", dupatta.id.as_str()).unwrap()["vendor"],
        "v-kalki"
    );

    let err = products
        .update(&ProductId::new(MUG), &product_input("Brass Mug"))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Api(ApiError::NotFound(_))));

    products.delete(&dupatta.id).await.unwrap();
    assert_eq!(products.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_expired_portal_session_needs_login() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();
    let admin = portal(&storefront, Portal::Admin).await;

    backend.expire_sessions();
    let err = admin.products().unwrap().list().await.unwrap_err();
    assert_eq!(err.requires_login(), Some(TokenNamespace::Admin));
    assert!(!admin.is_signed_in());
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_admin_fulfils_an_order() {
    let backend = FakeBackend::start().await;
    let placed = customer_order(&backend, SAREE).await;
    let storefront = backend.storefront();
    let desk = portal(&storefront, Portal::Admin).await.orders();

    let pending = desk
        .list(&OrderFilter {
            status: Some(OrderStatus::Pending),
            ..OrderFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    let shipped = desk
        .list(&OrderFilter {
            status: Some(OrderStatus::Shipped),
            ..OrderFilter::default()
        })
        .await
        .unwrap();
    assert!(shipped.is_empty());

    let confirmed = desk
        .update_status(&placed.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let eta = Utc.with_ymd_and_hms(2026, 11, 2, 0, 0, 0).unwrap();
    let tracked = desk
        .update_shipment(
            &placed.id,
            &ShipmentUpdate {
                carrier: Some("Delhivery".to_string()),
                tracking_number: Some("DL123".to_string()),
                status: Some(ShipmentStatus::InTransit),
                estimated_delivery: Some(eta),
            },
        )
        .await
        .unwrap();
    let shipment = tracked.shipment.unwrap();
    assert_eq!(shipment.tracking_number.as_deref(), Some("DL123"));
    assert_eq!(shipment.status, ShipmentStatus::InTransit);
    assert_eq!(shipment.estimated_delivery, Some(eta));

    assert_eq!(
        desk.get(&placed.id).await.unwrap().status,
        OrderStatus::Confirmed
    );
}

#[tokio::test]
async fn test_order_updates_are_checked_before_sending() {
    let backend = FakeBackend::start().await;
    let placed = customer_order(&backend, SAREE).await;
    let storefront = backend.storefront();
    let desk = portal(&storefront, Portal::Admin).await.orders();
    let before = backend.requests().len();

    assert!(matches!(
        desk.update_status(&placed.id, OrderStatus::Unknown).await,
        Err(AdminError::Invalid(_))
    ));
    assert!(matches!(
        desk.update_shipment(&placed.id, &ShipmentUpdate::default())
            .await,
        Err(AdminError::Invalid(_))
    ));
    assert_eq!(backend.requests().len(), before);
}

#[tokio::test]
async fn test_vendor_sees_orders_for_its_products() {
    let backend = FakeBackend::start().await;
    let saree_order = customer_order(&backend, SAREE).await;
    let mug_order = customer_order(&backend, MUG).await;
    let storefront = backend.storefront();
    let desk = portal(&storefront, Portal::Vendor).await.orders();

    let visible = desk.list(&OrderFilter::default()).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, saree_order.id);

    assert!(matches!(
        desk.get(&mug_order.id).await,
        Err(AdminError::Api(ApiError::NotFound(_)))
    ));
}
