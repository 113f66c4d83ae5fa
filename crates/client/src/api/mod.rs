//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per process, cheaply cloneable (`Arc` inner)
//! - `reqwest` for HTTP, JSON bodies via `serde`
//! - Bearer token read from the shared [`SessionHandle`] on every request,
//!   so signing in or out takes effect without rebuilding the client
//! - Product lookups cached in memory via `moka`
//!
//! # Endpoints
//!
//! | Concern  | Method | Path                              |
//! |----------|--------|-----------------------------------|
//! | Cart     | GET    | `shopping-cart/{customerId}`      |
//! | Cart     | POST   | `shopping-cart/{customerId}`      |
//! | Cart     | DELETE | `shopping-cart/{customerId}`      |
//! | Catalog  | GET    | `product`, `product/{id}`         |
//! | Auth     | POST   | `auth/login`, `auth/register`     |
//! | Orders   | POST   | `order/{customerId}`              |
//! | Orders   | GET    | `order/customer/{customerId}`     |
//! | Payments | POST   | `payment/{orderId}`               |

mod auth;
mod cache;
mod cart;
mod catalog;
mod orders;
pub mod types;

pub use types::*;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::session::SessionHandle;

use cache::{CacheKey, CacheValue};

/// Longest response body excerpt kept in errors and logs.
const BODY_PREVIEW_CHARS: usize = 200;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built from the configured base.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
}

/// Client for the storefront REST backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: SessionHandle,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: SessionHandle) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("shopfront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                session,
                cache,
            }),
        })
    }

    /// The session slot this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request, attaching the bearer token when signed in.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.request_url(method, self.endpoint(segments)?))
    }

    fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match self.inner.session.bearer_token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(preview(&body))),
            _ => {
                tracing::error!(
                    status = %status,
                    body = %preview(&body),
                    "Backend returned non-success status"
                );
                Err(ApiError::Status {
                    status: status.as_u16(),
                    body: preview(&body),
                })
            }
        }
    }

    /// Send a request and decode a JSON response body.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %preview(&body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(url: &str) -> ApiClient {
        let config = ClientConfig::for_api_url(url).unwrap();
        ApiClient::new(&config, SessionHandle::anonymous()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let api = client("https://shop.example.com/api");
        let url = api.endpoint(&["shopping-cart", "c-1"]).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/shopping-cart/c-1");
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let api = client("https://shop.example.com/api/");
        let url = api.endpoint(&["product", "p1"]).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/product/p1");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = client("http://localhost:8080/");
        let url = api.endpoint(&["product", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/product/a%2Fb%20c");
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(500);
        assert_eq!(preview(&long).len(), BODY_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
        assert_eq!(
            ApiError::RateLimited(3).to_string(),
            "Rate limited, retry after 3 seconds"
        );
    }
}
