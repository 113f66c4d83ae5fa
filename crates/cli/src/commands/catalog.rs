//! Catalog browsing.

use shopfront_client::Result;

use super::product_id;
use crate::app::App;
use crate::output;

/// `shopfront products [--search q]`
pub async fn list(app: &App, search: Option<&str>) -> Result<()> {
    let products = match search {
        Some(query) => app.api.search_products(query).await?,
        None => app.api.list_products().await?,
    };
    output::products(&products);
    Ok(())
}

/// `shopfront product <id>`
pub async fn show(app: &App, id: &str) -> Result<()> {
    let product = app.api.get_product(&product_id(id)?).await?;
    output::product(&product);
    Ok(())
}
