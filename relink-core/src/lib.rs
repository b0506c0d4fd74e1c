pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod ipc;
pub mod models;
pub mod reconcile;
pub mod setup;

pub use catalog::{LinkStore, MemoryCatalog, PgCatalog, ProductLookup};
pub use config::RelinkConfig;
pub use error::RelinkError;
pub use models::{LinkType, Product, ProductLink};
pub use reconcile::{AllOutcome, TypeOutcome};
