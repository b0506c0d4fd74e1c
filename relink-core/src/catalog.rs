//! Catalog collaborators: product lookup and link persistence.
//!
//! The reconciliation core only sees the two capability traits below.
//! `PgCatalog` is the production backend; `MemoryCatalog` backs tests and
//! `--memory` development runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::RelinkError;
use crate::models::product::{status, visibility};
use crate::models::{LinkType, Product, ProductLink};

/// Resolves a SKU to a product. Missing products surface as
/// `RelinkError::ProductNotFound`.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn get(&self, sku: &str) -> Result<Product, RelinkError>;
}

/// Owns link persistence. `replace_links` replaces all existing records of
/// the link type(s) present in the batch for that source SKU — never merges.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Linked target SKUs for (source, type), in position order.
    async fn linked_skus(&self, sku: &str, link_type: LinkType)
        -> Result<Vec<String>, RelinkError>;

    /// Linked products for storefront display: enabled and visible in the
    /// catalog, in position order.
    async fn linked_products(
        &self,
        sku: &str,
        link_type: LinkType,
    ) -> Result<Vec<Product>, RelinkError>;

    async fn replace_links(&self, sku: &str, links: &[ProductLink]) -> Result<(), RelinkError>;
}

// ============================================================================
// Postgres backend
// ============================================================================

pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductLookup for PgCatalog {
    async fn get(&self, sku: &str) -> Result<Product, RelinkError> {
        let row = sqlx::query_as::<_, Product>(
            "SELECT sku, name, status, visibility, created_at FROM products WHERE sku = $1",
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RelinkError::ProductNotFound(sku.to_string()))
    }
}

#[async_trait]
impl LinkStore for PgCatalog {
    async fn linked_skus(
        &self,
        sku: &str,
        link_type: LinkType,
    ) -> Result<Vec<String>, RelinkError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT linked_sku
            FROM product_links
            WHERE sku = $1 AND link_type_id = $2
            ORDER BY position
            "#,
        )
        .bind(sku)
        .bind(link_type.type_id())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    async fn linked_products(
        &self,
        sku: &str,
        link_type: LinkType,
    ) -> Result<Vec<Product>, RelinkError> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.sku, p.name, p.status, p.visibility, p.created_at
            FROM product_links l
            JOIN products p ON p.sku = l.linked_sku
            WHERE l.sku = $1
              AND l.link_type_id = $2
              AND p.status = $3
              AND p.visibility = ANY($4)
            ORDER BY l.position
            "#,
        )
        .bind(sku)
        .bind(link_type.type_id())
        .bind(status::ENABLED)
        .bind(&visibility::VISIBLE_IN_CATALOG[..])
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn replace_links(&self, sku: &str, links: &[ProductLink]) -> Result<(), RelinkError> {
        let mut type_ids: Vec<i32> = links.iter().map(|l| l.link_type.type_id()).collect();
        type_ids.sort_unstable();
        type_ids.dedup();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_links WHERE sku = $1 AND link_type_id = ANY($2)")
            .bind(sku)
            .bind(&type_ids)
            .execute(&mut *tx)
            .await?;

        for link in links {
            sqlx::query(
                r#"
                INSERT INTO product_links (sku, linked_sku, link_type_id, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&link.sku)
            .bind(&link.linked_sku)
            .bind(link.link_type.type_id())
            .bind(link.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// In-memory catalog for tests and development runs without Postgres.
#[derive(Default)]
pub struct MemoryCatalog {
    products: Mutex<HashMap<String, Product>>,
    links: Mutex<HashMap<(String, i32), Vec<ProductLink>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&self, sku: &str, name: &str, product_status: i16, vis: i16) {
        let product = Product {
            sku: sku.to_string(),
            name: name.to_string(),
            status: product_status,
            visibility: vis,
            created_at: Utc::now(),
        };
        self.products
            .lock()
            .expect("products lock poisoned")
            .insert(sku.to_string(), product);
    }

    /// Convenience: an enabled, catalog-visible product.
    pub fn insert_enabled(&self, sku: &str, name: &str) {
        self.insert_product(sku, name, status::ENABLED, visibility::BOTH);
    }

    /// Current links of (source, type), in position order. Used by tests to
    /// observe replace-all behavior.
    pub fn stored_links(&self, sku: &str, link_type: LinkType) -> Vec<ProductLink> {
        let links = self.links.lock().expect("links lock poisoned");
        let mut out = links
            .get(&(sku.to_string(), link_type.type_id()))
            .cloned()
            .unwrap_or_default();
        out.sort_by_key(|l| l.position);
        out
    }
}

#[async_trait]
impl ProductLookup for MemoryCatalog {
    async fn get(&self, sku: &str) -> Result<Product, RelinkError> {
        let products = self.products.lock().expect("products lock poisoned");
        products
            .get(sku)
            .cloned()
            .ok_or_else(|| RelinkError::ProductNotFound(sku.to_string()))
    }
}

#[async_trait]
impl LinkStore for MemoryCatalog {
    async fn linked_skus(
        &self,
        sku: &str,
        link_type: LinkType,
    ) -> Result<Vec<String>, RelinkError> {
        Ok(self
            .stored_links(sku, link_type)
            .into_iter()
            .map(|l| l.linked_sku)
            .collect())
    }

    async fn linked_products(
        &self,
        sku: &str,
        link_type: LinkType,
    ) -> Result<Vec<Product>, RelinkError> {
        let linked = self.stored_links(sku, link_type);
        let products = self.products.lock().expect("products lock poisoned");
        Ok(linked
            .iter()
            .filter_map(|l| products.get(&l.linked_sku))
            .filter(|p| p.is_enabled() && p.is_visible_in_catalog())
            .cloned()
            .collect())
    }

    async fn replace_links(&self, sku: &str, links: &[ProductLink]) -> Result<(), RelinkError> {
        let mut store = self.links.lock().expect("links lock poisoned");
        let mut type_ids: Vec<i32> = links.iter().map(|l| l.link_type.type_id()).collect();
        type_ids.sort_unstable();
        type_ids.dedup();

        for type_id in type_ids {
            store.remove(&(sku.to_string(), type_id));
        }
        for link in links {
            store
                .entry((sku.to_string(), link.link_type.type_id()))
                .or_default()
                .push(link.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_lookup_not_found() {
        let catalog = MemoryCatalog::new();
        let err = catalog.get("GHOST").await.unwrap_err();
        assert!(matches!(err, RelinkError::ProductNotFound(sku) if sku == "GHOST"));
    }

    #[tokio::test]
    async fn test_memory_replace_is_not_a_merge() {
        let catalog = MemoryCatalog::new();
        let old = ProductLink {
            sku: "A".into(),
            linked_sku: "OLD".into(),
            link_type: LinkType::Similar,
            position: 0,
        };
        let new = ProductLink {
            sku: "A".into(),
            linked_sku: "NEW".into(),
            link_type: LinkType::Similar,
            position: 0,
        };
        catalog.replace_links("A", &[old]).await.unwrap();
        catalog.replace_links("A", &[new]).await.unwrap();

        let skus = catalog.linked_skus("A", LinkType::Similar).await.unwrap();
        assert_eq!(skus, vec!["NEW".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_replace_leaves_other_types_alone() {
        let catalog = MemoryCatalog::new();
        let repair = ProductLink {
            sku: "A".into(),
            linked_sku: "R1".into(),
            link_type: LinkType::Repair,
            position: 0,
        };
        let similar = ProductLink {
            sku: "A".into(),
            linked_sku: "S1".into(),
            link_type: LinkType::Similar,
            position: 0,
        };
        catalog.replace_links("A", &[repair]).await.unwrap();
        catalog.replace_links("A", &[similar]).await.unwrap();

        assert_eq!(
            catalog.linked_skus("A", LinkType::Repair).await.unwrap(),
            vec!["R1".to_string()]
        );
        assert_eq!(
            catalog.linked_skus("A", LinkType::Similar).await.unwrap(),
            vec!["S1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_memory_linked_products_filters_hidden_and_disabled() {
        let catalog = MemoryCatalog::new();
        catalog.insert_enabled("A", "Source");
        catalog.insert_enabled("VIS", "Visible");
        catalog.insert_product("DIS", "Disabled", status::DISABLED, visibility::BOTH);
        catalog.insert_product("HID", "Search only", status::ENABLED, visibility::IN_SEARCH);

        let links: Vec<ProductLink> = ["VIS", "DIS", "HID"]
            .iter()
            .enumerate()
            .map(|(i, sku)| ProductLink {
                sku: "A".into(),
                linked_sku: (*sku).into(),
                link_type: LinkType::Functional,
                position: i as i32,
            })
            .collect();
        catalog.replace_links("A", &links).await.unwrap();

        let visible = catalog
            .linked_products("A", LinkType::Functional)
            .await
            .unwrap();
        let skus: Vec<&str> = visible.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["VIS"]);
    }
}
