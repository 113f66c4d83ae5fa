//! End-to-end tests for the Shopfront client.
//!
//! [`FakeBackend`] serves the storefront REST API from memory on an
//! ephemeral port, so the real `reqwest` client, the cart synchronizer and
//! checkout run against HTTP without any external services.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Seeded Data
//!
//! - Products `p-mug`, `p-teapot`, `p-towel`
//! - Account `ada@example.com` / `correct-horse`, customer `cust-ada`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, RETRY_AFTER};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use shopfront_client::api::ApiClient;
use shopfront_client::cart::CartSynchronizer;
use shopfront_client::config::ClientConfig;
use shopfront_client::session::SessionHandle;

/// Customer ID of the seeded account.
pub const CUSTOMER: &str = "cust-ada";
/// Email of the seeded account.
pub const EMAIL: &str = "ada@example.com";
/// Password of the seeded account.
pub const PASSWORD: &str = "correct-horse";

/// Orders per page in order history.
const ORDER_PAGE_SIZE: usize = 10;

/// Synchronizer wired to the real HTTP client.
pub type LiveCart = CartSynchronizer<ApiClient, ApiClient, SessionHandle>;

// =============================================================================
// Recorded traffic
// =============================================================================

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub idempotency_key: Option<String>,
}

/// A cart delta as received, with the HTTP method that carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedDelta {
    pub method: &'static str,
    pub product_id: String,
    pub quantity: i64,
}

// =============================================================================
// Backend state
// =============================================================================

#[derive(Debug, Clone)]
struct Listing {
    id: String,
    name: String,
    description: String,
    cents: i64,
    inventory: u32,
}

impl Listing {
    fn new(id: &str, name: &str, description: &str, cents: i64, inventory: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            cents,
            inventory,
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "price": dollars(self.cents),
            "categoryId": "kitchen",
            "inventory": self.inventory,
            "imageUrl": format!("https://img.example.com/{}.jpg", self.id),
            "active": true,
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[derive(Debug, Default)]
struct BackendState {
    listings: Vec<Listing>,
    broken: HashSet<String>,
    listing_as_page: bool,
    accounts: HashMap<String, (String, String)>,
    tokens: HashMap<String, String>,
    carts: HashMap<String, Vec<(String, i64)>>,
    orders: Vec<(String, Value)>,
    idempotency: HashMap<String, usize>,
    requests: Vec<RecordedRequest>,
    deltas: Vec<ReceivedDelta>,
    rate_limit_next: Option<u64>,
}

impl BackendState {
    fn seeded() -> Self {
        let mut state = Self {
            listings: vec![
                Listing::new("p-mug", "Coffee Mug", "Stoneware mug, 350ml", 850, 25),
                Listing::new("p-teapot", "Teapot", "Cast iron teapot", 2400, 4),
                Listing::new("p-towel", "Tea Towel", "Linen, hand woven", 600, 40),
            ],
            ..Self::default()
        };
        state.accounts.insert(
            EMAIL.to_string(),
            (PASSWORD.to_string(), CUSTOMER.to_string()),
        );
        state
    }

    fn listing(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    fn authorize(&self, headers: &HeaderMap, customer: &str) -> Result<(), StatusCode> {
        let token = header(headers, AUTHORIZATION.as_str())
            .and_then(|h| h.strip_prefix("Bearer ").map(str::to_owned))
            .ok_or(StatusCode::UNAUTHORIZED)?;
        match self.tokens.get(&token) {
            Some(owner) if owner == customer => Ok(()),
            Some(_) => Err(StatusCode::FORBIDDEN),
            None => Err(StatusCode::UNAUTHORIZED),
        }
    }

    fn cart_json(&self, customer: &str) -> Value {
        let items: Vec<Value> = self
            .carts
            .get(customer)
            .into_iter()
            .flatten()
            .map(|(product_id, quantity)| {
                let (name, cents) = self
                    .listing(product_id)
                    .map_or((String::new(), 0), |l| (l.name.clone(), l.cents));
                json!({
                    "productId": product_id,
                    "productName": name,
                    "quantity": quantity,
                    "priceAtAddedTime": dollars(cents),
                })
            })
            .collect();
        json!({ "items": items })
    }

    fn apply_delta(&mut self, customer: &str, product_id: &str, change: i64) {
        let lines = self.carts.entry(customer.to_string()).or_default();
        match lines.iter_mut().find(|(id, _)| id == product_id) {
            Some((_, quantity)) => *quantity += change,
            None if change > 0 => lines.push((product_id.to_string(), change)),
            None => {}
        }
        lines.retain(|(_, quantity)| *quantity > 0);
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

// =============================================================================
// Handlers
// =============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_owned),
        authorization: header(request.headers(), AUTHORIZATION.as_str()),
        idempotency_key: header(request.headers(), "idempotency-key"),
    };
    let limited = {
        let mut state = lock(&state);
        state.requests.push(recorded);
        state.rate_limit_next.take()
    };
    if let Some(seconds) = limited {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(RETRY_AFTER, seconds.to_string())],
            "slow down",
        )
            .into_response();
    }
    next.run(request).await
}

async fn list_products(State(state): State<Shared>) -> Json<Value> {
    let state = lock(&state);
    let products: Vec<Value> = state.listings.iter().map(Listing::to_json).collect();
    if state.listing_as_page {
        let total = products.len();
        Json(json!({
            "content": products,
            "totalPages": 1,
            "totalElements": total,
            "last": true,
            "size": 20,
            "number": 0,
        }))
    } else {
        Json(Value::Array(products))
    }
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = lock(&state);
    if state.broken.contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "catalog unavailable").into_response();
    }
    match state.listing(&id) {
        Some(listing) => Json(listing.to_json()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("no product {id}")).into_response(),
    }
}

async fn get_cart(
    State(state): State<Shared>,
    Path(customer): Path<String>,
    headers: HeaderMap,
) -> Response {
    let state = lock(&state);
    if let Err(status) = state.authorize(&headers, &customer) {
        return status.into_response();
    }
    Json(state.cart_json(&customer)).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeltaBody {
    product_id: String,
    quantity: i64,
}

async fn add_to_cart(
    State(state): State<Shared>,
    Path(customer): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DeltaBody>,
) -> Response {
    change_cart(&state, &customer, &headers, "POST", &body)
}

async fn remove_from_cart(
    State(state): State<Shared>,
    Path(customer): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DeltaBody>,
) -> Response {
    change_cart(&state, &customer, &headers, "DELETE", &body)
}

fn change_cart(
    state: &Shared,
    customer: &str,
    headers: &HeaderMap,
    method: &'static str,
    body: &DeltaBody,
) -> Response {
    let mut state = lock(state);
    if let Err(status) = state.authorize(headers, customer) {
        return status.into_response();
    }
    if body.quantity <= 0 {
        return (StatusCode::BAD_REQUEST, "quantity must be positive").into_response();
    }
    state.deltas.push(ReceivedDelta {
        method,
        product_id: body.product_id.clone(),
        quantity: body.quantity,
    });
    let change = if method == "POST" {
        body.quantity
    } else {
        -body.quantity
    };
    state.apply_delta(customer, &body.product_id, change);
    StatusCode::OK.into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut state = lock(&state);
    let Some((password, customer)) = state.accounts.get(&body.email).cloned() else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if password != body.password {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let token = format!("token-{customer}-{}", state.tokens.len());
    state.tokens.insert(token.clone(), customer.clone());
    Json(json!({ "token": token, "id": customer })).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let has_address = body["address"]
        .as_array()
        .is_some_and(|a| a.len() == 1 && a.first().is_some_and(|addr| addr["zipCode"].is_string()));
    if email.is_empty() || password.is_empty() || !has_address {
        return (StatusCode::BAD_REQUEST, "incomplete registration").into_response();
    }
    if state.accounts.contains_key(&email) {
        return (StatusCode::CONFLICT, "email already registered").into_response();
    }
    let customer = format!("cust-{}", state.accounts.len() + 1);
    state.accounts.insert(email, (password, customer.clone()));
    (StatusCode::CREATED, Json(json!({ "id": customer }))).into_response()
}

async fn place_order(
    State(state): State<Shared>,
    Path(customer): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = lock(&state);
    if let Err(status) = state.authorize(&headers, &customer) {
        return status.into_response();
    }
    let Some(key) = header(&headers, "idempotency-key") else {
        return (StatusCode::BAD_REQUEST, "missing Idempotency-Key").into_response();
    };
    if let Some(order) = state
        .idempotency
        .get(&key)
        .and_then(|&idx| state.orders.get(idx))
    {
        return Json(order.1.clone()).into_response();
    }

    let lines = state.carts.remove(&customer).unwrap_or_default();
    if lines.is_empty() {
        return (StatusCode::BAD_REQUEST, "cart is empty").into_response();
    }

    let order_id = format!("ord-{}", state.orders.len() + 1);
    let mut total = 0;
    let items: Vec<Value> = lines
        .iter()
        .enumerate()
        .filter_map(|(n, (product_id, quantity))| {
            let listing = state.listing(product_id)?;
            total += listing.cents * quantity;
            Some(json!({
                "id": format!("{order_id}-{n}"),
                "product": listing.to_json(),
                "quantity": quantity,
                "priceAtPurchase": dollars(listing.cents),
            }))
        })
        .collect();
    let order = json!({
        "id": order_id,
        "orderItems": items,
        "totalPrice": dollars(total),
        "status": "PENDING",
        "createdAt": "2025-03-01T12:00:00",
        "updatedAt": "2025-03-01T12:00:00",
    });

    state.orders.push((customer, order.clone()));
    let idx = state.orders.len() - 1;
    state.idempotency.insert(key, idx);
    (StatusCode::CREATED, Json(order)).into_response()
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: usize,
}

async fn order_history(
    State(state): State<Shared>,
    Path(customer): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let state = lock(&state);
    if let Err(status) = state.authorize(&headers, &customer) {
        return status.into_response();
    }
    let mine: Vec<Value> = state
        .orders
        .iter()
        .rev()
        .filter(|(owner, _)| *owner == customer)
        .map(|(_, order)| order.clone())
        .collect();
    let total = mine.len();
    let pages = total.div_ceil(ORDER_PAGE_SIZE);
    let content: Vec<Value> = mine
        .into_iter()
        .skip(query.page * ORDER_PAGE_SIZE)
        .take(ORDER_PAGE_SIZE)
        .collect();
    Json(json!({
        "content": content,
        "totalPages": pages,
        "totalElements": total,
        "last": query.page + 1 >= pages,
        "size": ORDER_PAGE_SIZE,
        "number": query.page,
    }))
    .into_response()
}

async fn pay(State(state): State<Shared>, Path(order_id): Path<String>) -> Response {
    let mut state = lock(&state);
    let Some((_, order)) = state.orders.iter_mut().find(|(_, o)| o["id"] == order_id) else {
        return (StatusCode::NOT_FOUND, format!("no order {order_id}")).into_response();
    };
    if order["status"] != "PENDING" {
        return (StatusCode::CONFLICT, "order already paid").into_response();
    }
    order["status"] = json!("PAID");
    Json(json!({ "orderId": order_id, "status": "SUCCESS" })).into_response()
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/product", get(list_products))
        .route("/product/{id}", get(get_product))
        .route(
            "/shopping-cart/{customer}",
            get(get_cart).post(add_to_cart).delete(remove_from_cart),
        )
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/order/{customer}", post(place_order))
        .route("/order/customer/{customer}", get(order_history))
        .route("/payment/{order_id}", post(pay));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

// =============================================================================
// Harness
// =============================================================================

/// In-memory storefront backend listening on `127.0.0.1`.
pub struct FakeBackend {
    /// Base URL including the `/api/` prefix.
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    /// Start a backend with the seeded catalog and account.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::seeded()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to read local address");
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Self {
            base_url: format!("http://{addr}/api/"),
            state,
        }
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_api_url(&self.base_url).expect("Fake backend URL is valid")
    }

    /// An anonymous client and its session slot.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        self.client_with(&self.config())
    }

    /// An anonymous client built from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client_with(&self, config: &ClientConfig) -> ApiClient {
        ApiClient::new(config, SessionHandle::anonymous()).expect("Failed to build API client")
    }

    /// A cart wired to a fresh anonymous client.
    #[must_use]
    pub fn cart(&self) -> (ApiClient, LiveCart) {
        let api = self.client();
        let cart = CartSynchronizer::new(api.clone(), api.clone(), api.session().clone());
        (api, cart)
    }

    /// Put `quantity` of a product straight into a customer's remote cart.
    pub fn seed_cart(&self, customer: &str, product_id: &str, quantity: i64) {
        lock(&self.state).apply_delta(customer, product_id, quantity);
    }

    /// Quantity of a product in a customer's remote cart.
    #[must_use]
    pub fn cart_quantity(&self, customer: &str, product_id: &str) -> i64 {
        lock(&self.state)
            .carts
            .get(customer)
            .and_then(|lines| lines.iter().find(|(id, _)| id == product_id))
            .map_or(0, |(_, quantity)| *quantity)
    }

    /// Make lookups of one product fail with a 500.
    pub fn break_product(&self, product_id: &str) {
        lock(&self.state).broken.insert(product_id.to_string());
    }

    /// Serve `GET product` as a page object instead of a bare list.
    pub fn serve_listing_as_page(&self) {
        lock(&self.state).listing_as_page = true;
    }

    /// Answer the next request with 429 and `Retry-After: seconds`.
    pub fn rate_limit_next(&self, seconds: u64) {
        lock(&self.state).rate_limit_next = Some(seconds);
    }

    /// Issue a token for a customer without going through login.
    #[must_use]
    pub fn issue_token(&self, customer: &str) -> String {
        let mut state = lock(&self.state);
        let token = format!("token-{customer}-{}", state.tokens.len());
        state.tokens.insert(token.clone(), customer.to_string());
        token
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Requests whose path starts with `/api/{prefix}`.
    #[must_use]
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        let prefix = format!("/api/{prefix}");
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(&prefix))
            .collect()
    }

    /// Cart deltas received so far, in order.
    #[must_use]
    pub fn deltas(&self) -> Vec<ReceivedDelta> {
        lock(&self.state).deltas.clone()
    }

    /// Number of orders created.
    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.state).orders.len()
    }
}
