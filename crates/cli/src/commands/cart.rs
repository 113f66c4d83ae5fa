//! Cart commands.
//!
//! Signed in, every change goes to the remote cart and the local copy is
//! refreshed from it; otherwise the local cart is the only copy.

use shopfront_client::Result;

use super::product_id;
use crate::app::App;
use crate::output;

/// `shopfront cart show`
#[allow(clippy::unnecessary_wraps)]
pub fn show(app: &App) -> Result<()> {
    output::cart(&app.cart.lines(), app.cart.total(), app.cart.line_count());
    Ok(())
}

/// `shopfront cart add <id>`
pub async fn add(app: &App, id: &str) -> Result<()> {
    let product = app.api.get_product(&product_id(id)?).await?;
    let outcome = app.cart.add_one(&product).await?;
    output::outcome(outcome);
    show(app)
}

/// `shopfront cart remove <id>`
pub async fn remove(app: &App, id: &str) -> Result<()> {
    let outcome = app.cart.remove_all(&product_id(id)?).await?;
    output::outcome(outcome);
    show(app)
}

/// `shopfront cart set <id> <quantity>`
pub async fn set(app: &App, id: &str, quantity: i64) -> Result<()> {
    let outcome = app.cart.set_quantity(&product_id(id)?, quantity).await?;
    output::outcome(outcome);
    show(app)
}

/// `shopfront cart clear`
#[allow(clippy::unnecessary_wraps)]
pub fn clear(app: &App) -> Result<()> {
    app.cart.clear();
    output::message("Cart cleared.");
    Ok(())
}

/// `shopfront cart sync`
pub async fn sync(app: &App) -> Result<()> {
    let outcome = app.cart.fetch_and_reconcile().await?;
    output::outcome(outcome);
    show(app)
}
