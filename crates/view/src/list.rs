//! Resident list reconciliation: page loads and real-time events.

use tracing::{debug, info, warn};

use shelfwatch_client::{Page, TransportError};
use shelfwatch_core::{Entity, Item, ItemId};
use shelfwatch_events::{ItemChange, RealtimeEvent};

use crate::cursor::PaginationCursor;
use crate::estimator::{PageSizeEstimate, PageSizeEstimator, ViewConfig, Viewport};
use crate::snapshot::{ItemSummary, ListSnapshot};

/// A page fetch the owner has to perform and report back through
/// [`ListViewModel::complete_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

/// The list screen's state: resident items, pagination cursor and the
/// single in-flight page load.
///
/// Pure state machine. It never performs IO; loads are handed out as
/// [`PageRequest`]s and their results fed back in.
#[derive(Debug, Clone)]
pub struct ListViewModel {
    items: Vec<Item>,
    cursor: PaginationCursor,
    in_flight: Option<PageRequest>,
    last_error: Option<String>,
    estimator: PageSizeEstimator,
    estimate: PageSizeEstimate,
    fixed_page_size: Option<u32>,
    page_size: u32,
}

impl ListViewModel {
    pub fn new(config: ViewConfig, viewport: Viewport) -> Self {
        let estimator = PageSizeEstimator::new(config);
        let estimate = estimator.estimate(viewport);
        Self {
            items: Vec::new(),
            cursor: PaginationCursor::default(),
            in_flight: None,
            last_error: None,
            estimator,
            estimate,
            fixed_page_size: None,
            page_size: estimate.page_size,
        }
    }

    /// Request `page_size` items per page instead of the estimate.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        self.fixed_page_size = Some(page_size);
        self.page_size = page_size;
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|i| i.id() == id)
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.cursor
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<PageRequest> {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Page size used for the current pagination run.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn estimate(&self) -> PageSizeEstimate {
        self.estimate
    }

    pub fn total_stock(&self) -> i64 {
        self.items.iter().map(Item::total_stock).fold(0, i64::saturating_add)
    }

    /// Start loading `page`. `None` while another load is in flight.
    ///
    /// Page 1 starts a new pagination run and picks up the latest page size
    /// estimate; later pages keep the run's size so offsets line up.
    pub fn request_page(&mut self, page: u32) -> Option<PageRequest> {
        if page == 0 {
            return None;
        }
        if let Some(busy) = self.in_flight {
            debug!(page, in_flight = busy.page, "page load already in flight");
            return None;
        }

        if page == 1 {
            self.page_size = self.fixed_page_size.unwrap_or(self.estimate.page_size);
        }
        let request = PageRequest {
            page,
            page_size: self.page_size,
        };
        self.in_flight = Some(request);
        debug!(page, page_size = request.page_size, "requesting page");
        Some(request)
    }

    /// Reload from the first page.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        self.request_page(1)
    }

    /// The sentinel after the last rendered item became visible.
    pub fn on_sentinel_visible(&mut self) -> Option<PageRequest> {
        if !self.cursor.has_more() {
            return None;
        }
        self.request_page(self.cursor.next_page())
    }

    /// Re-estimate for new geometry. Loads the next page if the resident
    /// list no longer covers the viewport.
    pub fn resize(&mut self, viewport: Viewport) -> Option<PageRequest> {
        self.estimate = self.estimator.estimate(viewport);
        self.fill_viewport()
    }

    fn fill_viewport(&mut self) -> Option<PageRequest> {
        if self.cursor.current_page() == 0
            || !self.cursor.has_more()
            || !self.estimate.needs_more(self.items.len())
        {
            return None;
        }
        debug!(
            resident = self.items.len(),
            needed = self.estimate.needed,
            "viewport not covered, loading next page"
        );
        self.request_page(self.cursor.next_page())
    }

    /// Feed back the outcome of `request`. May hand out a follow-up request
    /// when a first page leaves the viewport short.
    ///
    /// A failure leaves items and cursor untouched and records the error.
    pub fn complete_load(
        &mut self,
        request: PageRequest,
        result: Result<Page, TransportError>,
    ) -> Option<PageRequest> {
        if self.in_flight != Some(request) {
            warn!(page = request.page, "ignoring completion for a load that is not in flight");
            return None;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                self.apply_page(request.page, page);
                if request.page == 1 {
                    self.fill_viewport()
                } else {
                    None
                }
            }
            Err(e) => {
                warn!(page = request.page, error = %e, "page load failed");
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    fn apply_page(&mut self, requested: u32, page: Page) {
        self.cursor.record(requested, &page);
        self.last_error = None;

        if requested == 1 {
            self.items = page.items;
        } else {
            for item in page.items {
                if self.contains(&item.id) {
                    debug!(item_id = %item.id, "skipping item already resident");
                    continue;
                }
                self.items.push(item);
            }
        }

        info!(
            page = requested,
            resident = self.items.len(),
            has_more = self.cursor.has_more(),
            "page loaded"
        );
    }

    /// Merge one delivered batch in order. Returns how many events changed
    /// the list.
    pub fn apply_batch<'a>(&mut self, events: impl IntoIterator<Item = &'a RealtimeEvent>) -> usize {
        let mut applied = 0;
        for event in events {
            if self.apply_event(event) {
                applied += 1;
            }
        }
        applied
    }

    pub fn apply_event(&mut self, event: &RealtimeEvent) -> bool {
        let change = match event.change() {
            Ok(change) => change,
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "skipping invalid event");
                return false;
            }
        };

        match change {
            ItemChange::Created(item) => {
                // Off the first page the item's position is unknown.
                if self.cursor.current_page() != 1 || self.contains(&item.id) {
                    return false;
                }
                self.items.insert(0, item.clone());
                true
            }
            ItemChange::Updated(item) => match self.position(&item.id) {
                Some(at) => {
                    self.items[at] = item.clone();
                    true
                }
                None => false,
            },
            ItemChange::Deleted(id) => match self.position(id) {
                Some(at) => {
                    self.items.remove(at);
                    true
                }
                None => false,
            },
        }
    }

    pub fn snapshot(&self, live: bool) -> ListSnapshot {
        ListSnapshot {
            items: self.items.iter().map(ItemSummary::from).collect(),
            live,
            loading: self.is_loading(),
            has_more: self.cursor.has_more(),
            current_page: self.cursor.current_page(),
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for ListViewModel {
    fn default() -> Self {
        Self::new(ViewConfig::default(), Viewport::default())
    }
}
