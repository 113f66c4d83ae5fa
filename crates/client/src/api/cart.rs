//! Remote cart endpoints.

use reqwest::Method;
use shopfront_core::CustomerId;
use tracing::instrument;

use super::{ApiClient, ApiError, CartDelta, RemoteCart};
use crate::cart::RemoteCartService;

impl RemoteCartService for ApiClient {
    #[instrument(skip_all, fields(customer_id = %customer))]
    async fn fetch_cart(&self, customer: &CustomerId) -> Result<RemoteCart, ApiError> {
        let request = self.request(Method::GET, &["shopping-cart", customer.as_str()])?;
        self.execute_json(request).await
    }

    #[instrument(skip_all, fields(customer_id = %customer, product_id = %delta.product_id, quantity = delta.quantity))]
    async fn add_items(&self, customer: &CustomerId, delta: &CartDelta) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, &["shopping-cart", customer.as_str()])?
            .json(delta);
        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(customer_id = %customer, product_id = %delta.product_id, quantity = delta.quantity))]
    async fn remove_items(&self, customer: &CustomerId, delta: &CartDelta) -> Result<(), ApiError> {
        let request = self
            .request(Method::DELETE, &["shopping-cart", customer.as_str()])?
            .json(delta);
        self.execute(request).await?;
        Ok(())
    }
}
