use shelfwatch_client::Page;

/// Which page was loaded last and whether the server has more.
///
/// `has_more` only turns back on through a fresh page-1 load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaginationCursor {
    current_page: u32,
    has_more: bool,
}

impl PaginationCursor {
    /// Zero before the first successful load.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn next_page(&self) -> u32 {
        self.current_page.saturating_add(1)
    }

    /// Record a successful load of `requested`. The response only
    /// contributes its page count.
    pub fn record(&mut self, requested: u32, page: &Page) {
        let more = requested < page.total_pages;
        self.current_page = requested;
        self.has_more = if requested == 1 {
            more
        } else {
            self.has_more && more
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(current_page: u32, total_pages: u32) -> Page {
        Page {
            items: Vec::new(),
            current_page,
            total_pages,
            total_items: None,
        }
    }

    #[test]
    fn starts_before_the_first_page_with_nothing_more() {
        let cursor = PaginationCursor::default();
        assert_eq!(cursor.current_page(), 0);
        assert_eq!(cursor.next_page(), 1);
        assert!(!cursor.has_more());
    }

    #[test]
    fn has_more_turns_off_exactly_at_the_last_page() {
        let mut cursor = PaginationCursor::default();
        cursor.record(1, &page(1, 3));
        assert!(cursor.has_more());
        cursor.record(2, &page(2, 3));
        assert!(cursor.has_more());
        cursor.record(3, &page(3, 3));
        assert!(!cursor.has_more());
        assert_eq!(cursor.current_page(), 3);
    }

    #[test]
    fn only_a_first_page_load_can_reopen_pagination() {
        let mut cursor = PaginationCursor::default();
        cursor.record(1, &page(1, 1));
        assert!(!cursor.has_more());

        // A later page claiming more does not reopen it.
        cursor.record(2, &page(2, 5));
        assert!(!cursor.has_more());

        cursor.record(1, &page(1, 5));
        assert!(cursor.has_more());
        assert_eq!(cursor.current_page(), 1);
    }

    #[test]
    fn advances_to_the_requested_page_whatever_the_response_echoes() {
        let mut cursor = PaginationCursor::default();
        cursor.record(1, &page(1, 3));

        cursor.record(2, &page(1, 3));
        assert_eq!(cursor.current_page(), 2);
        assert_eq!(cursor.next_page(), 3);
        assert!(cursor.has_more());

        cursor.record(3, &page(1, 3));
        assert_eq!(cursor.current_page(), 3);
        assert!(!cursor.has_more());
    }
}
