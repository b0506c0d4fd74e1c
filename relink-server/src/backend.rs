//! Storage backend wiring.
//!
//! The request path only sees the two catalog capability traits; this module
//! pairs them with an optional pool handle for health reporting and picks
//! the concrete backend at startup.

use std::sync::Arc;

use relink_core::catalog::{LinkStore, MemoryCatalog, PgCatalog, ProductLookup};
use sqlx::PgPool;

#[derive(Clone)]
pub struct Backend {
    pub products: Arc<dyn ProductLookup>,
    pub links: Arc<dyn LinkStore>,
    /// Present for the Postgres backend; used by health checks only.
    pub pool: Option<PgPool>,
}

impl Backend {
    pub fn postgres(pool: PgPool) -> Self {
        let catalog = Arc::new(PgCatalog::new(pool.clone()));
        Self {
            products: catalog.clone(),
            links: catalog,
            pool: Some(pool),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryCatalog::new()))
    }

    /// Wrap an existing in-memory catalog, e.g. one pre-seeded by tests.
    pub fn from_memory(catalog: Arc<MemoryCatalog>) -> Self {
        Self {
            products: catalog.clone(),
            links: catalog,
            pool: None,
        }
    }
}
