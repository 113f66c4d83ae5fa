//! Wire types for the storefront REST backend.
//!
//! Field names follow the backend's camelCase JSON.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shopfront_core::{CategoryId, CustomerId, Email, OrderId, OrderStatus, Price, ProductId};

// =============================================================================
// Catalog
// =============================================================================

/// Full product record from the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub category_id: CategoryId,
    #[serde(default)]
    pub inventory: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl Product {
    /// A stand-in product built only from the fields the cart service
    /// denormalizes onto its lines. Catalog metadata is defaulted.
    #[must_use]
    pub fn degraded(id: ProductId, name: String, price: Price) -> Self {
        Self {
            id,
            name,
            description: String::new(),
            price,
            category_id: CategoryId::default(),
            inventory: 0,
            image_url: None,
            active: true,
        }
    }

    /// Case-insensitive substring match on name or description.
    ///
    /// An empty or whitespace-only query matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Cart contents as held by the remote cart service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
}

/// One line of the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    pub quantity: i64,
    pub price_at_added_time: Price,
}

/// Incremental change sent to the remote cart.
///
/// The same body shape is used for adds (POST) and removals (DELETE);
/// `quantity` is always the amount to change by, never an absolute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDelta {
    pub product_id: ProductId,
    pub quantity: u32,
}

// =============================================================================
// Auth
// =============================================================================

/// Login request body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a Email,
    pub password: &'a str,
}

/// Login response body.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub id: CustomerId,
}

/// Postal address collected at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// New account details.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: secrecy::SecretString,
    pub phone_number: String,
    pub address: Address,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("phone_number", &self.phone_number)
            .field("address", &self.address)
            .finish()
    }
}

/// Registration request body. The backend takes a list of addresses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub password: &'a str,
    pub phone_number: &'a str,
    pub address: [&'a Address; 1],
}

// =============================================================================
// Orders
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    pub total_price: Price,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub product: Product,
    pub quantity: u32,
    pub price_at_purchase: Price,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub last: bool,
    pub size: u32,
    pub number: u32,
}
