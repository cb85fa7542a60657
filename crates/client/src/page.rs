//! One page of catalog items plus pagination metadata.

use serde::Deserialize;

use shelfwatch_core::Item;

/// A page as consumed by the list view. Produced once per request, then its
/// items are moved into the resident list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: Option<u64>,
}

impl Page {
    /// Empty page, as returned for a no-content response.
    pub fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            current_page: page,
            total_pages: page,
            total_items: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Nested pagination block (`pagination` on the wire).
#[derive(Debug, Deserialize)]
struct PaginationMeta {
    current_page: Option<u32>,
    total_pages: Option<u32>,
    total_items: Option<u64>,
}

/// Accepts both `{data, current_page, total_pages}` and
/// `{data, pagination: {current_page, page_size, total_items, total_pages}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct PageResponse {
    #[serde(default)]
    data: Option<Vec<Item>>,
    #[serde(default)]
    current_page: Option<u32>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    pagination: Option<PaginationMeta>,
}

impl PageResponse {
    /// Resolve metadata, falling back to the requested page. A response with
    /// no page count is treated as the last page.
    pub(crate) fn into_page(self, requested: u32) -> Page {
        let nested = self.pagination.as_ref();
        let current_page = self
            .current_page
            .or_else(|| nested.and_then(|p| p.current_page))
            .unwrap_or(requested);
        let total_pages = self
            .total_pages
            .or_else(|| nested.and_then(|p| p.total_pages))
            .unwrap_or(current_page);

        Page {
            items: self.data.unwrap_or_default(),
            current_page,
            total_pages,
            total_items: nested.and_then(|p| p.total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value, requested: u32) -> Page {
        serde_json::from_value::<PageResponse>(value).unwrap().into_page(requested)
    }

    #[test]
    fn reads_flat_metadata() {
        let page = parse(
            json!({ "data": [{ "id": "p-1" }, { "id": "p-2" }], "current_page": 1, "total_pages": 2 }),
            1,
        );
        assert_eq!(page.items.len(), 2);
        assert_eq!((page.current_page, page.total_pages), (1, 2));
        assert!(page.has_more());
    }

    #[test]
    fn reads_nested_pagination_block() {
        let page = parse(
            json!({
                "data": [],
                "pagination": { "current_page": 3, "page_size": 24, "total_items": 60, "total_pages": 3 }
            }),
            3,
        );
        assert_eq!((page.current_page, page.total_pages), (3, 3));
        assert_eq!(page.total_items, Some(60));
        assert!(!page.has_more());
    }

    #[test]
    fn missing_metadata_means_last_page() {
        let page = parse(json!({ "data": null }), 4);
        assert!(page.items.is_empty());
        assert_eq!((page.current_page, page.total_pages), (4, 4));
        assert!(!Page::empty(2).has_more());
    }

    #[test]
    fn items_with_partial_stock_records_still_parse() {
        let page = parse(
            json!({
                "data": [{ "id": "p-1" }, { "id": "p-2", "variants": [{ "stock": [{ "quantity": 1 }] }] }],
                "current_page": 1,
                "total_pages": 1
            }),
            1,
        );
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].total_stock(), 1);
    }
}
