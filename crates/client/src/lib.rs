//! Shopfront storefront client.
//!
//! Talks to the storefront REST backend and keeps a local shopping cart in
//! step with the customer's remote cart.
//!
//! # Modules
//!
//! - [`api`] - HTTP client for catalog, cart, auth, order and payment endpoints
//! - [`cart`] - Local cart state and the [`CartSynchronizer`](cart::CartSynchronizer)
//! - [`checkout`] - Order placement from the remote cart
//! - [`session`] - Current identity, shared between the client and the cart
//! - [`store`] - Session and cart snapshot persisted between runs
//! - [`config`] - Environment-based configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;

pub use error::{Error, Result};
