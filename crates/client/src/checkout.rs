//! Order placement.
//!
//! The backend builds the order from the customer's remote cart, so checkout
//! refreshes the cart first and refuses to order nothing. Each attempt
//! carries a fresh idempotency key; on success the local cart is cleared
//! since the backend has consumed the remote one.

use std::future::Future;

use shopfront_core::CustomerId;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::{ApiError, Order};
use crate::cart::{CartError, CartSynchronizer, ProductCatalog, RemoteCartService};
use crate::session::{SessionMode, SessionProvider};

/// Creates orders from a customer's remote cart.
pub trait OrderService: Send + Sync {
    /// Turn the remote cart into an order.
    fn place_order(
        &self,
        customer: &CustomerId,
        idempotency_key: Uuid,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;
}

impl<T: OrderService> OrderService for std::sync::Arc<T> {
    fn place_order(
        &self,
        customer: &CustomerId,
        idempotency_key: Uuid,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send {
        (**self).place_order(customer, idempotency_key)
    }
}

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("sign in to place an order")]
    NotSignedIn,

    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("order failed: {0}")]
    Order(#[from] ApiError),
}

/// Place an order for everything in the signed-in customer's cart.
///
/// # Errors
///
/// - [`CheckoutError::NotSignedIn`] for an anonymous session
/// - [`CheckoutError::Cart`] if the cart cannot be refreshed
/// - [`CheckoutError::EmptyCart`] if the refreshed cart has no lines
/// - [`CheckoutError::Order`] if the backend rejects the order; the local
///   cart is kept so the customer can retry
#[instrument(skip_all)]
pub async fn place_order<R, C, S, O>(
    cart: &CartSynchronizer<R, C, S>,
    orders: &O,
) -> Result<Order, CheckoutError>
where
    R: RemoteCartService,
    C: ProductCatalog,
    S: SessionProvider,
    O: OrderService,
{
    let SessionMode::Authenticated(customer) = cart.session_mode() else {
        return Err(CheckoutError::NotSignedIn);
    };

    cart.fetch_and_reconcile().await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let key = Uuid::new_v4();
    let order = orders.place_order(&customer, key).await?;
    cart.clear();

    info!(order_id = %order.id, customer_id = %customer, "checkout complete");
    Ok(order)
}
