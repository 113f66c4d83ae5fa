//! Checkout, order history and payment.

use shopfront_client::checkout::{self, CheckoutError};
use shopfront_client::session::SessionMode;
use shopfront_client::{Error, Result};
use shopfront_core::OrderId;

use crate::app::App;
use crate::output;

/// `shopfront checkout`
pub async fn checkout(app: &App) -> Result<()> {
    let order = checkout::place_order(&app.cart, &app.api).await?;
    output::order(&order);
    if order.status.awaiting_payment() {
        output::message(&format!("Pay with: shopfront pay {}", order.id));
    }
    Ok(())
}

/// `shopfront orders [--page n]`
pub async fn history(app: &App, page: u32) -> Result<()> {
    let SessionMode::Authenticated(customer) = app.cart.session_mode() else {
        return Err(CheckoutError::NotSignedIn.into());
    };
    let orders = app.api.order_history(&customer, page).await?;
    output::orders(&orders);
    Ok(())
}

/// `shopfront pay <order-id>`
pub async fn pay(app: &App, order_id: &str) -> Result<()> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(Error::InvalidInput("order ID must not be empty".to_string()));
    }
    app.api.pay(&OrderId::new(order_id)).await?;
    output::message(&format!("Order {order_id} paid."));
    Ok(())
}
