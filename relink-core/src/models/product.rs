use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product enable/disable status codes, as stored in the catalog.
pub mod status {
    pub const ENABLED: i16 = 1;
    pub const DISABLED: i16 = 2;
}

/// Product visibility codes. Storefront listings only surface products
/// visible in the catalog.
pub mod visibility {
    pub const NOT_VISIBLE: i16 = 1;
    pub const IN_CATALOG: i16 = 2;
    pub const IN_SEARCH: i16 = 3;
    pub const BOTH: i16 = 4;

    pub const VISIBLE_IN_CATALOG: [i16; 2] = [IN_CATALOG, BOTH];
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub status: i16,
    pub visibility: i16,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_enabled(&self) -> bool {
        self.status == status::ENABLED
    }

    pub fn is_visible_in_catalog(&self) -> bool {
        visibility::VISIBLE_IN_CATALOG.contains(&self.visibility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(status: i16, visibility: i16) -> Product {
        Product {
            sku: "SKU-1".to_string(),
            name: "Test product".to_string(),
            status,
            visibility,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_enabled_status() {
        assert!(product(status::ENABLED, visibility::BOTH).is_enabled());
        assert!(!product(status::DISABLED, visibility::BOTH).is_enabled());
    }

    #[test]
    fn test_catalog_visibility() {
        assert!(product(status::ENABLED, visibility::IN_CATALOG).is_visible_in_catalog());
        assert!(product(status::ENABLED, visibility::BOTH).is_visible_in_catalog());
        assert!(!product(status::ENABLED, visibility::IN_SEARCH).is_visible_in_catalog());
        assert!(!product(status::ENABLED, visibility::NOT_VISIBLE).is_visible_in_catalog());
    }
}
