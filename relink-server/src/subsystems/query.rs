//! Read side: linked products for one (source, type), the data the
//! storefront carousels render. Only enabled, catalog-visible products are
//! returned, in position order.

use relink_core::catalog::{LinkStore, ProductLookup};
use relink_core::error::RelinkError;
use relink_core::models::LinkType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkedItem {
    pub sku: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkedProductsReport {
    pub sku: String,
    pub link_type: LinkType,
    pub count: usize,
    pub products: Vec<LinkedItem>,
}

pub async fn linked_products(
    products: &dyn ProductLookup,
    links: &dyn LinkStore,
    sku: &str,
    link_type: LinkType,
) -> Result<LinkedProductsReport, RelinkError> {
    // Resolve the source first so an unknown SKU surfaces as not-found
    // rather than an empty listing.
    let source = products.get(sku).await?;

    let listed: Vec<LinkedItem> = links
        .linked_products(&source.sku, link_type)
        .await?
        .into_iter()
        .map(|p| LinkedItem {
            sku: p.sku,
            name: p.name,
        })
        .collect();

    Ok(LinkedProductsReport {
        sku: source.sku,
        link_type,
        count: listed.len(),
        products: listed,
    })
}
