//! Unified error type for callers driving the whole client.
//!
//! Each module has its own error enum; [`Error`] wraps them so a front end
//! can use one `Result` type and `?` throughout.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// Any error the storefront client can return.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Checkout failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Local state file could not be read or written.
    #[error("State error: {0}")]
    Store(#[from] StoreError),

    /// Caller supplied something unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
