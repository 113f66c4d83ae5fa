//! Subcommand implementations.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;

use shopfront_client::Error;
use shopfront_core::ProductId;

/// Reject blank IDs before they reach the backend.
fn product_id(raw: &str) -> Result<ProductId, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("product ID must not be empty".to_string()));
    }
    Ok(ProductId::new(trimmed))
}
