use shelfwatch_core::{Item, ItemId};

/// One card as the list screen renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: ItemId,
    pub sku: String,
    pub title: String,
    pub total_stock: i64,
    /// Market badges, in payload order.
    pub markets: Vec<String>,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            sku: item.sku.clone(),
            title: item.base_title.clone(),
            total_stock: item.total_stock(),
            markets: item.markets().map(str::to_string).collect(),
        }
    }
}

/// Everything the list screen shows at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListSnapshot {
    pub items: Vec<ItemSummary>,
    /// Real-time channel connected ("Live" indicator).
    pub live: bool,
    pub loading: bool,
    pub has_more: bool,
    pub current_page: u32,
    /// Message of the last failed page load; cleared by the next success.
    pub last_error: Option<String>,
}

impl ListSnapshot {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Stock across every resident item.
    pub fn total_stock(&self) -> i64 {
        self.items.iter().map(|i| i.total_stock).fold(0, i64::saturating_add)
    }
}
