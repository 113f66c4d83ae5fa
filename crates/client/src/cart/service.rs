//! Remote collaborators of the cart synchronizer.
//!
//! [`ApiClient`](crate::api::ApiClient) implements both traits over HTTP;
//! tests substitute in-memory fakes.

use std::future::Future;

use shopfront_core::{CustomerId, ProductId};

use crate::api::{ApiError, CartDelta, Product, RemoteCart};

/// Authoritative cart store keyed by customer.
///
/// Mutations are deltas only: there is no "set quantity to N".
pub trait RemoteCartService: Send + Sync {
    /// Read the full cart.
    fn fetch_cart(
        &self,
        customer: &CustomerId,
    ) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send;

    /// Add `delta.quantity` units of a product.
    fn add_items(
        &self,
        customer: &CustomerId,
        delta: &CartDelta,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Remove `delta.quantity` units of a product.
    fn remove_items(
        &self,
        customer: &CustomerId,
        delta: &CartDelta,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Product metadata lookup.
pub trait ProductCatalog: Send + Sync {
    /// Resolve a product ID to its full record.
    fn product(&self, id: &ProductId) -> impl Future<Output = Result<Product, ApiError>> + Send;
}

impl<T: RemoteCartService> RemoteCartService for std::sync::Arc<T> {
    fn fetch_cart(
        &self,
        customer: &CustomerId,
    ) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send {
        (**self).fetch_cart(customer)
    }

    fn add_items(
        &self,
        customer: &CustomerId,
        delta: &CartDelta,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        (**self).add_items(customer, delta)
    }

    fn remove_items(
        &self,
        customer: &CustomerId,
        delta: &CartDelta,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        (**self).remove_items(customer, delta)
    }
}

impl<T: ProductCatalog> ProductCatalog for std::sync::Arc<T> {
    fn product(&self, id: &ProductId) -> impl Future<Output = Result<Product, ApiError>> + Send {
        (**self).product(id)
    }
}
