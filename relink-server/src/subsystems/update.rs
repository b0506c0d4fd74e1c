//! Single-type link update: validate the source product, reconcile the
//! candidate list for one link type, report the buckets.

use relink_core::catalog::{LinkStore, ProductLookup};
use relink_core::error::RelinkError;
use relink_core::models::LinkType;
use relink_core::reconcile::{self, AcceptedLink, RejectedSku};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub sku: String,
    pub name: String,
}

/// Response body for the single-type update operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateReport {
    pub product: ProductSummary,
    pub link_type: LinkType,
    pub success: bool,
    pub message: String,
    pub successful: Vec<AcceptedLink>,
    pub rejected: Vec<RejectedSku>,
    pub duplicate: Vec<String>,
    pub already_linked: Vec<String>,
}

pub async fn update_links(
    products: &dyn ProductLookup,
    links: &dyn LinkStore,
    sku: &str,
    linked_skus: &[String],
    link_type: LinkType,
    position: i32,
) -> Result<UpdateReport, RelinkError> {
    let product = reconcile::get_enabled_product(products, sku).await?;
    let outcome =
        reconcile::reconcile(products, links, sku, linked_skus, link_type, position).await?;

    Ok(UpdateReport {
        product: ProductSummary {
            sku: product.sku,
            name: product.name,
        },
        link_type: outcome.link_type,
        success: outcome.success,
        message: outcome.message,
        successful: outcome.successful,
        rejected: outcome.rejected,
        duplicate: outcome.duplicate,
        already_linked: outcome.already_linked,
    })
}
