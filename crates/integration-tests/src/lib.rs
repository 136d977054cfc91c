//! Integration tests for the HOE marketplace clients.
//!
//! [`FakeBackend`] serves the marketplace REST routes and the geocoder's
//! `/search` and `/reverse` routes from one in-process axum server, seeded
//! with a small catalog and one account per portal. Tests point a real
//! [`Storefront`] at it, so requests travel over HTTP exactly as they would
//! against the hosted backend.
//!
//! # Test Categories
//!
//! - `storefront_shopping` - catalog, cart and wishlist synchronisation
//! - `storefront_sessions` - logins, registrations and expired sessions
//! - `storefront_checkout` - geocoding, payment handshake and order creation
//! - `portal_management` - admin and vendor CRUD and order fulfilment
//!
//! Responses deliberately mix enveloped and raw shapes, the way the real
//! backend does.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, RETRY_AFTER};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use hmac::{Hmac, Mac};
use hoe_core::AddressInput;
use hoe_storefront::Storefront;
use hoe_storefront::auth::Credentials;
use hoe_storefront::config::StorefrontConfig;
use hoe_storefront::payment::{
    PaymentPrefill, PaymentReceipt, PaymentSession, PaymentWidget, WidgetOutcome,
};
use hoe_storefront::session::{MemoryTokenStore, TokenNamespace};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sha2::Sha256;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type HmacSha256 = Hmac<Sha256>;

/// Secret the fake uses to check Razorpay signatures.
pub const RAZORPAY_SECRET: &str = "fake-razorpay-secret";
/// Publishable key returned with every payment order.
pub const RAZORPAY_KEY_ID: &str = "rzp_test_fake";

/// Seeded accounts: `(email, password)`.
pub const CUSTOMER: (&str, &str) = ("asha@example.com", "secret123");
pub const VENDOR: (&str, &str) = ("seller@example.com", "vendorpass");
pub const ADMIN: (&str, &str) = ("admin@example.com", "adminpass");

/// Seeded product IDs.
pub const SAREE: &str = "p-saree";
pub const MUG: &str = "p-mug";
pub const SHAWL: &str = "p-shawl";

/// A query containing this word finds no geocoding match.
pub const UNKNOWN_PLACE: &str = "Atlantis";

/// Signature Razorpay would hand back for a payment.
#[must_use]
pub fn sign_payment(order_id: &str, payment_id: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(RAZORPAY_SECRET.as_bytes()) else {
        return String::new();
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// A shipping form the fake geocoder can place.
#[must_use]
pub fn sample_address() -> AddressInput {
    AddressInput {
        full_name: "Asha Rao".to_string(),
        phone: "+91 98765 43210".to_string(),
        address_line1: "12 MG Road".to_string(),
        address_line2: None,
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        postal_code: "560001".to_string(),
        country: "India".to_string(),
    }
}

/// Sign `storefront` into `namespace` with the seeded account.
///
/// # Panics
///
/// Panics if the login is refused.
pub async fn sign_in(storefront: &Storefront, namespace: TokenNamespace) {
    let (email, password) = match namespace {
        TokenNamespace::Customer => CUSTOMER,
        TokenNamespace::Vendor => VENDOR,
        TokenNamespace::Admin => ADMIN,
    };
    let credentials = Credentials::new(email, password).expect("seeded credentials");
    storefront
        .auth()
        .login(namespace, &credentials)
        .await
        .expect("seeded login");
}

/// Widget outcomes for driving the payment step.
pub enum ScriptedWidget {
    /// Pays and returns a correctly signed receipt.
    Pay,
    /// Pays but returns a signature the backend will refuse.
    Forge,
    /// The shopper closes the widget.
    Dismiss,
    /// Returns a receipt for some other Razorpay order.
    WrongOrder,
}

impl PaymentWidget for ScriptedWidget {
    async fn collect(&self, session: &PaymentSession, _prefill: &PaymentPrefill) -> WidgetOutcome {
        let order_id = session.razorpay_order_id.clone();
        let payment_id = format!("pay_{order_id}");
        match self {
            Self::Dismiss => WidgetOutcome::Dismissed,
            Self::Pay => WidgetOutcome::Paid(PaymentReceipt {
                signature: sign_payment(&order_id, &payment_id),
                order_id,
                payment_id,
            }),
            Self::Forge => WidgetOutcome::Paid(PaymentReceipt {
                order_id,
                payment_id,
                signature: "0".repeat(64),
            }),
            Self::WrongOrder => WidgetOutcome::Paid(PaymentReceipt {
                signature: sign_payment("order-elsewhere", &payment_id),
                order_id: "order-elsewhere".to_string(),
                payment_id,
            }),
        }
    }
}

// =============================================================================
// Backend state
// =============================================================================

struct Account {
    id: String,
    namespace: &'static str,
    name: String,
    email: String,
    password: String,
    role: &'static str,
}

impl Account {
    fn to_json(&self) -> Value {
        json!({"_id": self.id, "name": self.name, "email": self.email, "role": self.role})
    }
}

#[derive(Default)]
struct Backend {
    next_id: u64,
    accounts: Vec<Account>,
    /// token -> (namespace, account id)
    sessions: HashMap<String, (&'static str, String)>,
    /// collection name -> documents
    documents: HashMap<&'static str, Vec<Value>>,
    carts: HashMap<String, Vec<Value>>,
    wishlists: HashMap<String, Vec<String>>,
    /// Razorpay order id -> amount in paise
    payment_orders: HashMap<String, i64>,
    verified_payments: Vec<String>,
    orders: Vec<Value>,
    fail_next: Option<(StatusCode, String)>,
    /// `METHOD /path` -> injected failure for the next matching request
    fail_route: Option<(String, StatusCode, String)>,
    requests: Vec<String>,
}

impl Backend {
    fn seeded() -> Self {
        let mut backend = Self::default();
        for (namespace, role, id, name, (email, password)) in [
            ("customer", "customer", "u-asha", "Asha Rao", CUSTOMER),
            ("vendor", "vendor", "v-kalki", "Kalki Weaves", VENDOR),
            ("admin", "admin", "a-root", "Root Admin", ADMIN),
        ] {
            backend.accounts.push(Account {
                id: id.to_string(),
                namespace,
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role,
            });
        }

        let loom = json!({"_id": "b-loom", "name": "Loom", "isActive": true});
        let apparel = json!({"_id": "c-apparel", "name": "Apparel"});
        backend.documents.insert("brands", vec![
            loom.clone(),
            json!({"_id": "b-dhatu", "name": "Dhatu", "logo": "https://cdn.example.com/dhatu.png"}),
        ]);
        backend.documents.insert("categories", vec![
            apparel.clone(),
            json!({"_id": "c-home", "name": "Home"}),
        ]);
        backend.documents.insert("subcategories", vec![
            json!({"_id": "s-sarees", "name": "Sarees", "category": apparel.clone()}),
            json!({"_id": "s-kitchen", "name": "Kitchen", "category": "c-home"}),
        ]);
        backend.documents.insert("products", vec![
            json!({
                "_id": SAREE, "name": "Silk Saree", "price": 4999, "discountPrice": 4499,
                "stock": 5, "brand": loom, "category": apparel, "subcategory": "s-sarees",
                "attributes": [{"name": "Color", "value": "Red"}],
                "images": ["https://cdn.example.com/saree.jpg"], "vendor": "v-kalki"
            }),
            json!({
                "_id": MUG, "name": "Brass Mug", "price": "499", "stock": 20,
                "brand": "b-dhatu", "category": "c-home", "subcategory": "s-kitchen",
                "vendor": "v-other"
            }),
            json!({
                "_id": SHAWL, "name": "Pashmina Shawl", "price": 2999, "stock": 0,
                "brand": "b-loom", "category": "c-apparel", "vendor": "v-kalki"
            }),
        ]);
        backend
    }

    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn collection(&mut self, name: &'static str) -> &mut Vec<Value> {
        self.documents.entry(name).or_default()
    }

    fn product(&self, id: &str) -> Option<&Value> {
        self.documents
            .get("products")
            .and_then(|products| products.iter().find(|p| doc_id(p) == Some(id)))
    }

    fn session(&self, headers: &HeaderMap, namespace: &str) -> Result<String, Response> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match token.and_then(|t| self.sessions.get(t)) {
            Some((ns, account)) if *ns == namespace => Ok(account.clone()),
            _ => Err(fail(StatusCode::UNAUTHORIZED, "Not authorized, token failed")),
        }
    }

    fn cart_json(&self, account: &str) -> Value {
        let items: Vec<Value> = self
            .carts
            .get(account)
            .into_iter()
            .flatten()
            .map(|line| {
                let product_id = line["product"].as_str().unwrap_or_default();
                // A deleted product populates as null; the line keeps the
                // price captured when it was added.
                let (product, price) = self.product(product_id).map_or_else(
                    || (Value::Null, line["price"].clone()),
                    |p| (p.clone(), json!(effective_price(p))),
                );
                json!({
                    "_id": line["_id"],
                    "product": product,
                    "quantity": line["quantity"],
                    "price": price,
                })
            })
            .collect();
        json!({"items": items})
    }
}

type Shared = Arc<Mutex<Backend>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Backend> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn doc_id(doc: &Value) -> Option<&str> {
    doc.as_str().or_else(|| doc.get("_id").and_then(Value::as_str))
}

fn number(value: &Value) -> f64 {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .unwrap_or_default()
}

fn effective_price(product: &Value) -> f64 {
    let price = number(&product["price"]);
    match product.get("discountPrice").map(number) {
        Some(discount) if discount > 0.0 && discount < price => discount,
        _ => price,
    }
}

fn ok(data: Value) -> Response {
    Json(json!({"success": true, "data": data})).into_response()
}

fn created(data: Value) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "data": data})),
    )
        .into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": false, "message": message}))).into_response()
}

/// 200 with `success: false`, as some routes report refusals.
fn refused(message: &str) -> Response {
    Json(json!({"success": false, "message": message})).into_response()
}

// =============================================================================
// Server
// =============================================================================

/// A running fake backend. The server stops when this is dropped.
pub struct FakeBackend {
    base_url: String,
    shared: Shared,
    task: JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl FakeBackend {
    /// Bind to a free local port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let shared: Shared = Arc::new(Mutex::new(Backend::seeded()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let address = listener.local_addr().expect("fake backend address");
        let app = router(Arc::clone(&shared));
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{address}"),
            shared,
            task,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A storefront pointed at this backend, with in-memory tokens and no
    /// catalog cache.
    ///
    /// # Panics
    ///
    /// Panics if the storefront cannot be built.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        let config = StorefrontConfig::for_base_url(&self.base_url).expect("fake backend URL");
        Storefront::new(config, Arc::new(MemoryTokenStore::new())).expect("storefront")
    }

    /// Answer the next request with `status` and `message`.
    pub fn fail_next(&self, status: StatusCode, message: &str) {
        lock(&self.shared).fail_next = Some((status, message.to_string()));
    }

    /// Answer the next `METHOD /path` request (say `"DELETE /cart"`) with
    /// `status` and `message`; other requests are served normally.
    pub fn fail_next_request(&self, route: &str, status: StatusCode, message: &str) {
        lock(&self.shared).fail_route = Some((route.to_string(), status, message.to_string()));
    }

    /// Remove a catalog document, leaving any cart lines that refer to it.
    pub fn delete_document(&self, collection: &'static str, id: &str) {
        lock(&self.shared)
            .collection(collection)
            .retain(|doc| doc_id(doc) != Some(id));
    }

    /// Invalidate every issued token, as if they had all expired.
    pub fn expire_sessions(&self) {
        lock(&self.shared).sessions.clear();
    }

    /// `METHOD /path` of every request served so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.shared).requests.clone()
    }

    /// Product IDs and quantities in the seeded customer's cart.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<(String, u64)> {
        lock(&self.shared)
            .carts
            .get("u-asha")
            .into_iter()
            .flatten()
            .map(|line| {
                (
                    line["product"].as_str().unwrap_or_default().to_string(),
                    line["quantity"].as_u64().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Every order stored so far.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.shared).orders.clone()
    }

    /// A stored catalog document.
    #[must_use]
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        lock(&self.shared)
            .documents
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id)).cloned())
    }
}

fn router(shared: Shared) -> Router {
    let mut router = Router::new()
        // Geocoder
        .route("/search", get(geocode_search))
        .route("/reverse", get(geocode_reverse))
        // Catalog
        .route("/brands", get(list_brands))
        .route("/categories", get(list_categories))
        .route("/subcategories", get(list_subcategories))
        .route("/subcategories/category/{id}", get(list_subcategories_of))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        // Cart
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/{id}", put(update_cart_line).delete(remove_cart_line))
        .route("/cart/product/{id}", axum::routing::delete(remove_cart_product))
        // Wishlist
        .route("/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/wishlist/{id}", axum::routing::delete(remove_from_wishlist))
        // Payment and orders
        .route("/payment/create-order", post(create_payment_order))
        .route("/payment/verify", post(verify_payment))
        .route("/orders", get(list_my_orders).post(create_order))
        .route("/orders/{id}", get(get_my_order));

    for (prefix, namespace) in [
        ("auth", "customer"),
        ("vendor/auth", "vendor"),
        ("admin/auth", "admin"),
    ] {
        router = router
            .route(
                &format!("/{prefix}/login"),
                post(move |state: State<Shared>, body: Json<LoginBody>| login(state, body, namespace)),
            )
            .route(
                &format!("/{prefix}/register"),
                post(move |state: State<Shared>, body: Json<RegisterBody>| {
                    register(state, body, namespace)
                }),
            )
            .route(
                &format!("/{prefix}/me"),
                get(move |state: State<Shared>, headers: HeaderMap| me(state, headers, namespace)),
            );
    }

    for (portal, resources) in [
        ("admin", &["brands", "categories", "subcategories", "products"][..]),
        ("vendor", &["products"][..]),
    ] {
        for &resource in resources {
            router = router
                .route(
                    &format!("/{portal}/{resource}"),
                    get(move |state: State<Shared>, headers: HeaderMap| {
                        portal_list(state, headers, portal, resource)
                    })
                    .post(
                        move |state: State<Shared>, headers: HeaderMap, body: Json<Value>| {
                            portal_create(state, headers, body, portal, resource)
                        },
                    ),
                )
                .route(
                    &format!("/{portal}/{resource}/{{id}}"),
                    get(
                        move |state: State<Shared>, headers: HeaderMap, id: Path<String>| {
                            portal_get(state, headers, id, portal, resource)
                        },
                    )
                    .put(
                        move |state: State<Shared>,
                              headers: HeaderMap,
                              id: Path<String>,
                              body: Json<Value>| {
                            portal_update(state, headers, id, body, portal, resource)
                        },
                    )
                    .delete(
                        move |state: State<Shared>, headers: HeaderMap, id: Path<String>| {
                            portal_delete(state, headers, id, portal, resource)
                        },
                    ),
                );
        }
        router = router
            .route(
                &format!("/{portal}/orders"),
                get(
                    move |state: State<Shared>, headers: HeaderMap, query: Query<OrderQuery>| {
                        portal_orders(state, headers, query, portal)
                    },
                ),
            )
            .route(
                &format!("/{portal}/orders/{{id}}"),
                get(
                    move |state: State<Shared>, headers: HeaderMap, id: Path<String>| {
                        portal_order(state, headers, id, portal)
                    },
                ),
            )
            .route(
                &format!("/{portal}/orders/{{id}}/status"),
                put(
                    move |state: State<Shared>,
                          headers: HeaderMap,
                          id: Path<String>,
                          body: Json<Value>| {
                        portal_order_update(state, headers, id, body, portal, "status")
                    },
                ),
            )
            .route(
                &format!("/{portal}/orders/{{id}}/shipment"),
                put(
                    move |state: State<Shared>,
                          headers: HeaderMap,
                          id: Path<String>,
                          body: Json<Value>| {
                        portal_order_update(state, headers, id, body, portal, "shipment")
                    },
                ),
            );
    }

    router
        .layer(middleware::from_fn_with_state(
            Arc::clone(&shared),
            intercept,
        ))
        .with_state(shared)
}

/// Log every request and serve any injected failure.
async fn intercept(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    let injected = {
        let mut backend = lock(&shared);
        let route = format!("{} {}", request.method(), request.uri().path());
        let routed = match backend.fail_route.take() {
            Some((target, status, message)) if target == route => Some((status, message)),
            other => {
                backend.fail_route = other;
                None
            }
        };
        backend.requests.push(route);
        backend.fail_next.take().or(routed)
    };
    if let Some((status, message)) = injected {
        let mut response = fail(status, &message);
        if status == StatusCode::TOO_MANY_REQUESTS {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static("7"));
        }
        return response;
    }
    next.run(request).await
}

// =============================================================================
// Geocoder
// =============================================================================

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

async fn geocode_search(Query(query): Query<SearchQuery>) -> Response {
    if query.q.contains(UNKNOWN_PLACE) {
        return Json(json!([])).into_response();
    }
    Json(json!([{"lat": "12.9716", "lon": "77.5946", "display_name": query.q}])).into_response()
}

#[derive(Deserialize)]
struct ReverseQuery {
    lat: f64,
    lon: f64,
}

async fn geocode_reverse(Query(query): Query<ReverseQuery>) -> Response {
    if query.lat.abs() < f64::EPSILON && query.lon.abs() < f64::EPSILON {
        return Json(json!({"error": "Unable to geocode"})).into_response();
    }
    Json(json!({
        "display_name": "12, MG Road, Shanthala Nagar, Bengaluru, Karnataka, 560001, India",
        "address": {
            "house_number": "12",
            "road": "MG Road",
            "suburb": "Shanthala Nagar",
            "city": "Bengaluru",
            "state": "Karnataka",
            "postcode": "560001",
            "country": "India"
        }
    }))
    .into_response()
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(shared): State<Shared>,
    Json(body): Json<LoginBody>,
    namespace: &'static str,
) -> Response {
    let mut backend = lock(&shared);
    let Some(user) = backend
        .accounts
        .iter()
        .find(|a| a.namespace == namespace && a.email == body.email && a.password == body.password)
        .map(Account::to_json)
    else {
        return fail(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };
    let token = backend.id(&format!("tok-{namespace}"));
    let account = user["_id"].as_str().unwrap_or_default().to_string();
    backend.sessions.insert(token.clone(), (namespace, account));

    // Each portal answers in a different shape.
    match namespace {
        "customer" => ok(json!({"token": token, "user": user})),
        "vendor" => Json(json!({"success": true, "token": token, "user": user})).into_response(),
        _ => Json(json!({"accessToken": token, "user": user})).into_response(),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    store_name: Option<String>,
}

async fn register(
    State(shared): State<Shared>,
    Json(body): Json<RegisterBody>,
    namespace: &'static str,
) -> Response {
    let mut backend = lock(&shared);
    if backend
        .accounts
        .iter()
        .any(|a| a.namespace == namespace && a.email == body.email)
    {
        return fail(StatusCode::BAD_REQUEST, "User already exists");
    }
    let id = backend.id(if namespace == "vendor" { "v" } else { "u" });
    let account = Account {
        id: id.clone(),
        namespace,
        name: body.store_name.unwrap_or(body.name),
        email: body.email,
        password: body.password,
        role: namespace,
    };
    let user = account.to_json();
    backend.accounts.push(account);

    if namespace == "vendor" {
        // Vendors wait for approval and are not signed in.
        return created(json!({"message": "Registration submitted for approval", "user": user}));
    }
    let token = backend.id("tok-customer");
    backend.sessions.insert(token.clone(), (namespace, id));
    created(json!({"token": token, "user": user}))
}

async fn me(State(shared): State<Shared>, headers: HeaderMap, namespace: &'static str) -> Response {
    let backend = lock(&shared);
    let account = match backend.session(&headers, namespace) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match backend.accounts.iter().find(|a| a.id == account) {
        Some(user) => ok(json!({"user": user.to_json()})),
        None => fail(StatusCode::NOT_FOUND, "User not found"),
    }
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_brands(State(shared): State<Shared>) -> Response {
    let backend = lock(&shared);
    Json(Value::Array(
        backend.documents.get("brands").cloned().unwrap_or_default(),
    ))
    .into_response()
}

async fn list_categories(State(shared): State<Shared>) -> Response {
    let backend = lock(&shared);
    ok(json!({"categories": backend.documents.get("categories").cloned().unwrap_or_default()}))
}

async fn list_subcategories(State(shared): State<Shared>) -> Response {
    let backend = lock(&shared);
    ok(Value::Array(
        backend
            .documents
            .get("subcategories")
            .cloned()
            .unwrap_or_default(),
    ))
}

async fn list_subcategories_of(
    State(shared): State<Shared>,
    Path(category): Path<String>,
) -> Response {
    let backend = lock(&shared);
    let subs: Vec<Value> = backend
        .documents
        .get("subcategories")
        .into_iter()
        .flatten()
        .filter(|s| doc_id(&s["category"]) == Some(category.as_str()))
        .cloned()
        .collect();
    ok(Value::Array(subs))
}

#[derive(Deserialize)]
struct ProductFilter {
    brand: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    search: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_products(
    State(shared): State<Shared>,
    Query(filter): Query<ProductFilter>,
) -> Response {
    let backend = lock(&shared);
    let matches = |product: &&Value| {
        let field = |key: &str, wanted: &Option<String>| {
            wanted
                .as_deref()
                .is_none_or(|w| doc_id(&product[key]) == Some(w))
        };
        let text = filter.search.as_deref().is_none_or(|s| {
            product["name"]
                .as_str()
                .is_some_and(|n| n.to_lowercase().contains(&s.to_lowercase()))
        });
        field("brand", &filter.brand)
            && field("category", &filter.category)
            && field("subcategory", &filter.subcategory)
            && text
    };
    let found: Vec<Value> = backend
        .documents
        .get("products")
        .into_iter()
        .flatten()
        .filter(matches)
        .cloned()
        .collect();

    let limit = filter.limit.unwrap_or(12).max(1);
    let page = filter.page.unwrap_or(1).max(1);
    let pages = found.len().div_ceil(limit).max(1);
    let products: Vec<Value> = found
        .iter()
        .skip((page - 1) * limit)
        .take(limit)
        .cloned()
        .collect();
    ok(json!({"products": products, "page": page, "pages": pages, "total": found.len()}))
}

async fn get_product(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    let backend = lock(&shared);
    match backend.product(&id) {
        Some(product) => ok(json!({"product": product})),
        None => fail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartBody {
    product_id: String,
    quantity: u64,
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: u64,
}

fn stock_of(backend: &Backend, product_id: &str) -> Option<u64> {
    backend
        .product(product_id)
        .map(|p| p["stock"].as_u64().unwrap_or_default())
}

async fn get_cart(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let backend = lock(&shared);
    match backend.session(&headers, "customer") {
        Ok(account) => ok(backend.cart_json(&account)),
        Err(response) => response,
    }
}

async fn add_to_cart(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartBody>,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    let Some(stock) = stock_of(&backend, &body.product_id) else {
        return fail(StatusCode::NOT_FOUND, "Product not found");
    };
    let held = backend
        .carts
        .get(&account)
        .into_iter()
        .flatten()
        .find(|l| l["product"] == body.product_id.as_str())
        .and_then(|l| l["quantity"].as_u64())
        .unwrap_or_default();
    if held + body.quantity > stock {
        return fail(
            StatusCode::BAD_REQUEST,
            &format!("Only {stock} left in stock"),
        );
    }

    let line_id = backend.id("ci");
    let price = backend.product(&body.product_id).map(effective_price);
    let lines = backend.carts.entry(account.clone()).or_default();
    if let Some(line) = lines
        .iter_mut()
        .find(|l| l["product"] == body.product_id.as_str())
    {
        line["quantity"] = json!(held + body.quantity);
    } else {
        lines.push(json!({
            "_id": line_id,
            "product": body.product_id,
            "quantity": body.quantity,
            "price": price,
        }));
    }
    ok(backend.cart_json(&account))
}

async fn update_cart_line(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<QuantityBody>,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    let product = backend
        .carts
        .get(&account)
        .into_iter()
        .flatten()
        .find(|l| l["_id"] == id.as_str())
        .and_then(|l| l["product"].as_str().map(str::to_string));
    let Some(product) = product else {
        return fail(StatusCode::NOT_FOUND, "Cart item not found");
    };
    if body.quantity > stock_of(&backend, &product).unwrap_or_default() {
        return fail(StatusCode::BAD_REQUEST, "Not enough stock");
    }
    if let Some(line) = backend
        .carts
        .get_mut(&account)
        .and_then(|lines| lines.iter_mut().find(|l| l["_id"] == id.as_str()))
    {
        line["quantity"] = json!(body.quantity);
    }
    ok(backend.cart_json(&account))
}

async fn remove_cart_line(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    remove_lines(&shared, &headers, |line| line["_id"] == id.as_str())
}

async fn remove_cart_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    remove_lines(&shared, &headers, |line| line["product"] == id.as_str())
}

async fn clear_cart(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    remove_lines(&shared, &headers, |_| true)
}

fn remove_lines(shared: &Shared, headers: &HeaderMap, matches: impl Fn(&Value) -> bool) -> Response {
    let mut backend = lock(shared);
    let account = match backend.session(headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    let lines = backend.carts.entry(account).or_default();
    let before = lines.len();
    lines.retain(|line| !matches(line));
    if before == lines.len() && before > 0 {
        return fail(StatusCode::NOT_FOUND, "Cart item not found");
    }
    ok(json!({"message": "Cart updated"}))
}

// =============================================================================
// Wishlist
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WishlistBody {
    product_id: String,
}

async fn get_wishlist(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let backend = lock(&shared);
    let account = match backend.session(&headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    // Older route: a plain array of products.
    let products: Vec<Value> = backend
        .wishlists
        .get(&account)
        .into_iter()
        .flatten()
        .filter_map(|id| backend.product(id).cloned())
        .collect();
    ok(Value::Array(products))
}

async fn add_to_wishlist(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<WishlistBody>,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    if backend.product(&body.product_id).is_none() {
        return fail(StatusCode::NOT_FOUND, "Product not found");
    }
    let saved = backend.wishlists.entry(account).or_default();
    if saved.contains(&body.product_id) {
        return fail(StatusCode::BAD_REQUEST, "Product already in wishlist");
    }
    saved.push(body.product_id);
    ok(json!({"message": "Added to wishlist"}))
}

async fn remove_from_wishlist(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    backend.wishlists.entry(account).or_default().retain(|p| *p != id);
    ok(json!({"message": "Removed from wishlist"}))
}

// =============================================================================
// Payment and orders
// =============================================================================

#[derive(Deserialize)]
struct PaymentOrderBody {
    amount: i64,
    currency: String,
}

async fn create_payment_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<PaymentOrderBody>,
) -> Response {
    let mut backend = lock(&shared);
    if let Err(response) = backend.session(&headers, "customer") {
        return response;
    }
    if body.amount <= 0 {
        return fail(StatusCode::BAD_REQUEST, "Invalid amount");
    }
    let order_id = backend.id("order");
    backend.payment_orders.insert(order_id.clone(), body.amount);
    ok(json!({
        "order": {"id": order_id, "amount": body.amount, "currency": body.currency},
        "key": RAZORPAY_KEY_ID
    }))
}

#[derive(Deserialize)]
struct VerifyBody {
    razorpay_order_id: String,
    razorpay_payment_id: String,
    razorpay_signature: String,
}

async fn verify_payment(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<VerifyBody>,
) -> Response {
    let mut backend = lock(&shared);
    if let Err(response) = backend.session(&headers, "customer") {
        return response;
    }
    if !backend.payment_orders.contains_key(&body.razorpay_order_id) {
        return refused("Unknown payment order");
    }
    if sign_payment(&body.razorpay_order_id, &body.razorpay_payment_id) != body.razorpay_signature {
        return fail(StatusCode::BAD_REQUEST, "Invalid payment signature");
    }
    backend.verified_payments.push(body.razorpay_payment_id);
    ok(json!({"verified": true}))
}

async fn create_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    if body["items"].as_array().is_none_or(Vec::is_empty) {
        return fail(StatusCode::BAD_REQUEST, "No order items");
    }
    let payment_id = body["payment"]["razorpayPaymentId"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    if !backend.verified_payments.contains(&payment_id) {
        return fail(StatusCode::BAD_REQUEST, "Payment not verified");
    }

    let id = backend.id("o");
    let mut order = Map::new();
    order.insert("_id".to_string(), json!(id));
    order.insert(
        "orderNumber".to_string(),
        json!(format!("HOE-{}", 10_000 + backend.orders.len())),
    );
    order.insert("user".to_string(), json!(account));
    for key in [
        "items",
        "shippingAddress",
        "billingAddress",
        "subtotal",
        "tax",
        "shipping",
        "total",
    ] {
        order.insert(key.to_string(), body[key].clone());
    }
    let mut payment = body["payment"].clone();
    payment["status"] = json!("paid");
    order.insert("payment".to_string(), payment);
    order.insert("status".to_string(), json!("pending"));
    order.insert("createdAt".to_string(), json!("2026-10-19T10:00:00Z"));

    let order = Value::Object(order);
    backend.orders.push(order.clone());
    created(json!({"order": order}))
}

async fn list_my_orders(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let backend = lock(&shared);
    let account = match backend.session(&headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    let mine: Vec<Value> = backend
        .orders
        .iter()
        .filter(|o| o["user"] == account.as_str())
        .cloned()
        .collect();
    ok(Value::Array(mine))
}

async fn get_my_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let backend = lock(&shared);
    let account = match backend.session(&headers, "customer") {
        Ok(account) => account,
        Err(response) => return response,
    };
    match backend
        .orders
        .iter()
        .find(|o| o["_id"] == id.as_str() && o["user"] == account.as_str())
    {
        Some(order) => ok(json!({"order": order})),
        None => fail(StatusCode::NOT_FOUND, "Order not found"),
    }
}

// =============================================================================
// Admin and vendor portals
// =============================================================================

fn singular(resource: &str) -> &str {
    match resource {
        "categories" => "category",
        "subcategories" => "subcategory",
        "brands" => "brand",
        _ => "product",
    }
}

fn collection_name(resource: &str) -> &'static str {
    match resource {
        "brands" => "brands",
        "categories" => "categories",
        "subcategories" => "subcategories",
        _ => "products",
    }
}

/// Whether a vendor `account` may see `doc`. Admins see everything.
fn visible(portal: &str, account: &str, doc: &Value) -> bool {
    portal == "admin" || doc_id(&doc["vendor"]) == Some(account)
}

async fn portal_list(
    State(shared): State<Shared>,
    headers: HeaderMap,
    portal: &'static str,
    resource: &'static str,
) -> Response {
    let backend = lock(&shared);
    let account = match backend.session(&headers, portal) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let docs: Vec<Value> = backend
        .documents
        .get(collection_name(resource))
        .into_iter()
        .flatten()
        .filter(|d| visible(portal, &account, d))
        .cloned()
        .collect();
    ok(json!({ resource: docs }))
}

async fn portal_create(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
    portal: &'static str,
    resource: &'static str,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, portal) {
        Ok(account) => account,
        Err(response) => return response,
    };
    if body["name"].as_str().is_none_or(str::is_empty) {
        return fail(StatusCode::BAD_REQUEST, "Name is required");
    }
    let id = backend.id(singular(resource));
    let mut doc = body;
    doc["_id"] = json!(id);
    doc["isActive"] = json!(true);
    if resource == "products" {
        doc["vendor"] = json!(if portal == "vendor" { account } else { "v-house".to_string() });
    }
    backend.collection(collection_name(resource)).push(doc.clone());
    created(json!({ singular(resource): doc }))
}

async fn portal_get(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    portal: &'static str,
    resource: &'static str,
) -> Response {
    let backend = lock(&shared);
    let account = match backend.session(&headers, portal) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match backend
        .documents
        .get(collection_name(resource))
        .into_iter()
        .flatten()
        .find(|d| doc_id(d) == Some(id.as_str()) && visible(portal, &account, d))
    {
        // Detail routes return the bare document.
        Some(doc) => ok(doc.clone()),
        None => fail(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn portal_update(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
    portal: &'static str,
    resource: &'static str,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, portal) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let Some(doc) = backend
        .collection(collection_name(resource))
        .iter_mut()
        .find(|d| doc_id(d) == Some(id.as_str()) && visible(portal, &account, d))
    else {
        return fail(StatusCode::NOT_FOUND, "Not found");
    };
    if let (Some(target), Value::Object(fields)) = (doc.as_object_mut(), body) {
        target.extend(fields);
    }
    let updated = doc.clone();
    ok(json!({ singular(resource): updated }))
}

async fn portal_delete(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    portal: &'static str,
    resource: &'static str,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, portal) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let docs = backend.collection(collection_name(resource));
    let before = docs.len();
    docs.retain(|d| !(doc_id(d) == Some(id.as_str()) && visible(portal, &account, d)));
    if docs.len() == before {
        return fail(StatusCode::NOT_FOUND, "Not found");
    }
    ok(json!({"message": "Deleted"}))
}

#[derive(Deserialize)]
struct OrderQuery {
    status: Option<String>,
}

/// Whether `portal` may see `order`: vendors only see orders holding one of
/// their products.
fn order_visible(backend: &Backend, portal: &str, account: &str, order: &Value) -> bool {
    portal == "admin"
        || order["items"].as_array().into_iter().flatten().any(|line| {
            doc_id(&line["product"])
                .and_then(|id| backend.product(id))
                .is_some_and(|p| doc_id(&p["vendor"]) == Some(account))
        })
}

async fn portal_orders(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<OrderQuery>,
    portal: &'static str,
) -> Response {
    let backend = lock(&shared);
    let account = match backend.session(&headers, portal) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let orders: Vec<Value> = backend
        .orders
        .iter()
        .filter(|o| order_visible(&backend, portal, &account, o))
        .filter(|o| {
            query
                .status
                .as_deref()
                .is_none_or(|s| o["status"] == s)
        })
        .cloned()
        .collect();
    ok(json!({"orders": orders}))
}

async fn portal_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    portal: &'static str,
) -> Response {
    let backend = lock(&shared);
    let account = match backend.session(&headers, portal) {
        Ok(account) => account,
        Err(response) => return response,
    };
    match backend
        .orders
        .iter()
        .find(|o| o["_id"] == id.as_str() && order_visible(&backend, portal, &account, o))
    {
        Some(order) => ok(json!({"order": order})),
        None => fail(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn portal_order_update(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
    portal: &'static str,
    field: &'static str,
) -> Response {
    let mut backend = lock(&shared);
    let account = match backend.session(&headers, portal) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let Some(index) = backend
        .orders
        .iter()
        .position(|o| o["_id"] == id.as_str() && order_visible(&backend, portal, &account, o))
    else {
        return fail(StatusCode::NOT_FOUND, "Order not found");
    };
    let Some(order) = backend.orders.get_mut(index) else {
        return fail(StatusCode::NOT_FOUND, "Order not found");
    };
    if field == "status" {
        order["status"] = body["status"].clone();
    } else {
        if !order["shipment"].is_object() {
            order["shipment"] = json!({});
        }
        if let (Some(shipment), Value::Object(fields)) = (order["shipment"].as_object_mut(), body)
        {
            shipment.extend(fields);
        }
    }
    // Shipment updates answer with the bare order.
    let order = order.clone();
    if field == "status" {
        ok(json!({"order": order}))
    } else {
        ok(order)
    }
}
