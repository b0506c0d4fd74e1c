//! All-types link update: one request reconciles similar, repair and
//! functional links for a source product. The three runs are independent
//! and non-transactional; overall success is the OR of the per-type flags.

use relink_core::catalog::{LinkStore, ProductLookup};
use relink_core::error::RelinkError;
use relink_core::reconcile::{self, TypeOutcome};
use serde::{Deserialize, Serialize};

use super::update::ProductSummary;

pub const MSG_AT_LEAST_ONE: &str =
    "At least one of similar_skus, repair_skus, or functional_skus must be provided";

/// Response body for the all-types update operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAllReport {
    pub product: ProductSummary,
    pub success: bool,
    pub message: String,
    pub similar: TypeOutcome,
    pub repair: TypeOutcome,
    pub functional: TypeOutcome,
}

pub async fn update_all_links(
    products: &dyn ProductLookup,
    links: &dyn LinkStore,
    sku: &str,
    similar_skus: &[String],
    repair_skus: &[String],
    functional_skus: &[String],
    position: i32,
) -> Result<UpdateAllReport, RelinkError> {
    if similar_skus.is_empty() && repair_skus.is_empty() && functional_skus.is_empty() {
        return Err(RelinkError::MissingInput(MSG_AT_LEAST_ONE.to_string()));
    }

    let product = reconcile::get_enabled_product(products, sku).await?;
    let outcome = reconcile::reconcile_all(
        products,
        links,
        sku,
        similar_skus,
        repair_skus,
        functional_skus,
        position,
    )
    .await?;

    Ok(UpdateAllReport {
        product: ProductSummary {
            sku: product.sku,
            name: product.name,
        },
        success: outcome.success,
        message: outcome.message,
        similar: outcome.similar,
        repair: outcome.repair,
        functional: outcome.functional,
    })
}
