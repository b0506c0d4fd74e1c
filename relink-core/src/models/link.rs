use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RelinkError;

/// The three custom relationship types. Type ids and codes are registered
/// once at install time and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Similar,
    Repair,
    Functional,
}

impl LinkType {
    pub const ALL: [LinkType; 3] = [LinkType::Similar, LinkType::Repair, LinkType::Functional];

    /// Numeric id stored in the link-type registry and on link rows.
    pub fn type_id(self) -> i32 {
        match self {
            LinkType::Similar => 10,
            LinkType::Repair => 11,
            LinkType::Functional => 12,
        }
    }

    /// Registered string code.
    pub fn code(self) -> &'static str {
        match self {
            LinkType::Similar => "similarlink",
            LinkType::Repair => "repairlink",
            LinkType::Functional => "functionallink",
        }
    }

    /// Short human label used in messages and URLs.
    pub fn label(self) -> &'static str {
        match self {
            LinkType::Similar => "similar",
            LinkType::Repair => "repair",
            LinkType::Functional => "functional",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LinkType {
    type Err = RelinkError;

    /// Accepts both the short label and the registered code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "similar" | "similarlink" => Ok(LinkType::Similar),
            "repair" | "repairlink" => Ok(LinkType::Repair),
            "functional" | "functionallink" => Ok(LinkType::Functional),
            other => Err(RelinkError::UnknownLinkType(other.to_string())),
        }
    }
}

/// One directed relationship record between two products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLink {
    pub sku: String,
    pub linked_sku: String,
    pub link_type: LinkType,
    pub position: i32,
}
