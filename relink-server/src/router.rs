use crate::backend::Backend;
use crate::subsystems::{query, update, update_all};
use relink_core::error::RelinkError;
use relink_core::ipc::{RelinkRequest, RelinkResponse};

pub async fn handle_request(request: RelinkRequest, backend: &Backend) -> RelinkResponse {
    match request {
        RelinkRequest::Ping => RelinkResponse::pong(),
        RelinkRequest::Health => health(backend).await,
        RelinkRequest::UpdateLinks {
            sku,
            link_type,
            linked_skus,
            position,
        } => {
            match update::update_links(
                backend.products.as_ref(),
                backend.links.as_ref(),
                &sku,
                &linked_skus,
                link_type,
                position,
            )
            .await
            {
                Ok(report) => ok_json(&report),
                Err(e) => RelinkResponse::err(update_error_message(&e)),
            }
        }
        RelinkRequest::UpdateAllLinks {
            sku,
            similar_skus,
            repair_skus,
            functional_skus,
            position,
        } => {
            match update_all::update_all_links(
                backend.products.as_ref(),
                backend.links.as_ref(),
                &sku,
                &similar_skus,
                &repair_skus,
                &functional_skus,
                position,
            )
            .await
            {
                Ok(report) => ok_json(&report),
                Err(e) => RelinkResponse::err(update_error_message(&e)),
            }
        }
        RelinkRequest::LinkedProducts { sku, link_type } => {
            match query::linked_products(
                backend.products.as_ref(),
                backend.links.as_ref(),
                &sku,
                link_type,
            )
            .await
            {
                Ok(report) => ok_json(&report),
                Err(e) => RelinkResponse::err(e.to_string()),
            }
        }
    }
}

async fn health(backend: &Backend) -> RelinkResponse {
    match &backend.pool {
        Some(pool) => {
            let pg_ver = match relink_core::db::health_check(pool).await {
                Ok(v) => v,
                Err(e) => return RelinkResponse::err(format!("DB Health Check failed: {}", e)),
            };
            let link_types = match relink_core::db::check_link_types(pool).await {
                Ok(n) => n,
                Err(e) => return RelinkResponse::err(format!("Link type check failed: {}", e)),
            };
            RelinkResponse::ok(serde_json::json!({
                "postgresql": pg_ver,
                "link_types": link_types,
                "status": "healthy"
            }))
        }
        None => RelinkResponse::ok(serde_json::json!({
            "storage": "memory",
            "status": "healthy"
        })),
    }
}

/// Validation errors keep their own wording; anything else from a
/// collaborator is rewrapped as a generic update failure.
pub fn update_error_message(e: &RelinkError) -> String {
    match e {
        RelinkError::MissingInput(_)
        | RelinkError::ProductNotFound(_)
        | RelinkError::ProductDisabled(_)
        | RelinkError::UnknownLinkType(_) => e.to_string(),
        other => format!("An error occurred while updating product links: {}", other),
    }
}

fn ok_json<T: serde::Serialize>(report: &T) -> RelinkResponse {
    match serde_json::to_value(report) {
        Ok(data) => RelinkResponse::ok(data),
        Err(e) => RelinkResponse::err(format!("Serialization error: {}", e)),
    }
}
