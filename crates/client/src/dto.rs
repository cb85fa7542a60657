//! Request bodies for the catalog's write endpoints.

use serde::Serialize;

use shelfwatch_core::{MarketMetadata, Price, Variant};

/// Item fields a client may set on creation (the service assigns id and timestamps).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewItem {
    pub sku: String,
    pub base_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub prices: Vec<Price>,
    pub variants: Vec<Variant>,
    pub metadata: Vec<MarketMetadata>,
}

impl NewItem {
    pub fn new(sku: impl Into<String>, base_title: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            base_title: base_title.into(),
            description: None,
            prices: Vec::new(),
            variants: Vec::new(),
            metadata: Vec::new(),
        }
    }
}

/// Partial update; absent fields are left untouched by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<Vec<Price>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<Variant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<MarketMetadata>>,
}
