use serde::{Deserialize, Serialize};

use crate::models::LinkType;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RelinkRequest {
    Ping,
    Health,
    UpdateLinks {
        sku: String,
        link_type: LinkType,
        linked_skus: Vec<String>,
        #[serde(default)]
        position: i32,
    },
    UpdateAllLinks {
        sku: String,
        #[serde(default)]
        similar_skus: Vec<String>,
        #[serde(default)]
        repair_skus: Vec<String>,
        #[serde(default)]
        functional_skus: Vec<String>,
        #[serde(default)]
        position: i32,
    },
    LinkedProducts {
        sku: String,
        link_type: LinkType,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RelinkResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl RelinkResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }
}
