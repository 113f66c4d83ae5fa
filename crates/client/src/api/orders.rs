//! Order and payment endpoints.

use reqwest::Method;
use shopfront_core::{CustomerId, OrderId};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{ApiClient, ApiError, Order, Page};
use crate::checkout::OrderService;

/// Header carrying the client-generated key that makes order creation safe
/// to retry.
const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

impl ApiClient {
    /// One page of a customer's orders, newest first as the backend sorts them.
    ///
    /// `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(customer_id = %customer))]
    pub async fn order_history(
        &self,
        customer: &CustomerId,
        page: u32,
    ) -> Result<Page<Order>, ApiError> {
        let mut url = self.endpoint(&["order", "customer", customer.as_str()])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());
        self.execute_json(self.request_url(Method::GET, url)).await
    }

    /// Pay for an order. The backend simulates the payment provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is rejected or the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn pay(&self, order_id: &OrderId) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &["payment", order_id.as_str()])?;
        self.execute(request).await?;
        info!("Payment accepted");
        Ok(())
    }
}

impl OrderService for ApiClient {
    #[instrument(skip(self), fields(customer_id = %customer, idempotency_key = %idempotency_key))]
    async fn place_order(
        &self,
        customer: &CustomerId,
        idempotency_key: Uuid,
    ) -> Result<Order, ApiError> {
        let request = self
            .request(Method::POST, &["order", customer.as_str()])?
            .header(IDEMPOTENCY_KEY, idempotency_key.to_string())
            .json(&serde_json::Map::new());
        let order: Order = self.execute_json(request).await?;
        info!(order_id = %order.id, total = %order.total_price, "Order placed");
        Ok(order)
    }
}
