//! Product catalog endpoints.

use reqwest::Method;
use serde::Deserialize;
use shopfront_core::ProductId;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError, Page, Product};
use crate::cart::ProductCatalog;

/// `GET product` answers with either a bare list or a page of products.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductListing {
    List(Vec<Product>),
    Page(Page<Product>),
}

impl ProductListing {
    fn into_products(self) -> Vec<Product> {
        match self {
            Self::List(products) => products,
            Self::Page(page) => page.content,
        }
    }
}

impl ApiClient {
    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the backend has no such product, or
    /// another error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(cache) = &self.inner.cache
            && let Some(CacheValue::Product(product)) = cache.get(&cache_key).await
        {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self.request(Method::GET, &["product", id.as_str()])?;
        let product: Product = self.execute_json(request).await.map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::NotFound(format!("Product not found: {id}")),
            other => other,
        })?;

        if let Some(cache) = &self.inner.cache {
            cache
                .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }

        Ok(product)
    }

    /// List every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(cache) = &self.inner.cache
            && let Some(CacheValue::Products(products)) = cache.get(&CacheKey::AllProducts).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let request = self.request(Method::GET, &["product"])?;
        let products = self
            .execute_json::<ProductListing>(request)
            .await?
            .into_products();
        debug!(count = products.len(), "Fetched product listing");

        if let Some(cache) = &self.inner.cache {
            cache
                .insert(CacheKey::AllProducts, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Products whose name or description contains `query`, ignoring case.
    ///
    /// The backend has no search endpoint, so this filters the listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let mut products = self.list_products().await?;
        products.retain(|p| p.matches(query));
        Ok(products)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, id: &ProductId) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate(&CacheKey::Product(id.clone())).await;
        }
    }
}

impl ProductCatalog for ApiClient {
    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.get_product(id).await
    }
}
