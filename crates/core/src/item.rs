//! Catalog item model (matches the catalog service's JSON shape).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::ItemId;

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Price in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub amount: f64,
}

/// Stock count held at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    #[serde(default)]
    pub location_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: i64,
}

/// A sellable variant of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: Vec<StockLevel>,
}

impl Variant {
    pub fn new(id: impl Into<String>, sku: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sku: sku.into(),
            attributes: Map::new(),
            stock: Vec::new(),
        }
    }

    pub fn with_stock(mut self, location_id: impl Into<String>, quantity: i64) -> Self {
        self.stock.push(StockLevel {
            location_id: location_id.into(),
            quantity,
        });
        self
    }

    /// Sum of stock across all locations, saturating at the `i64` bounds.
    pub fn total_stock(&self) -> i64 {
        self.stock.iter().map(|s| s.quantity).fold(0, i64::saturating_add)
    }
}

/// Per-market listing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMetadata {
    pub market: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

/// A catalog product entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub base_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prices: Vec<Price>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variants: Vec<Variant>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Vec<MarketMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Minimal item with no variants, prices or market metadata.
    pub fn new(id: impl Into<ItemId>, sku: impl Into<String>, base_title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sku: sku.into(),
            base_title: base_title.into(),
            description: None,
            prices: Vec::new(),
            variants: Vec::new(),
            metadata: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn with_market(mut self, market: impl Into<String>, title: impl Into<String>) -> Self {
        self.metadata.push(MarketMetadata {
            market: market.into(),
            title: title.into(),
            description: None,
            keywords: None,
        });
        self
    }

    /// Total stock: every location of every variant. Missing data counts as zero.
    pub fn total_stock(&self) -> i64 {
        self.variants.iter().map(Variant::total_stock).fold(0, i64::saturating_add)
    }

    /// Markets this item is listed in, in payload order.
    pub fn markets(&self) -> impl Iterator<Item = &str> {
        self.metadata.iter().map(|m| m.market.as_str())
    }

    /// Reject items that cannot be keyed.
    pub fn validate(&self) -> DomainResult<()> {
        if self.id.is_blank() {
            return Err(DomainError::validation("item id cannot be empty"));
        }
        Ok(())
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
