//! `shelfwatch-view`: the catalog list screen without the screen.
//!
//! - [`ListViewModel`]: resident list, pagination cursor and merge rules
//! - [`PageSizeEstimator`]: first page size from visible capacity
//! - [`LiveList`]: single owner task wiring a [`shelfwatch_client::PageSource`]
//!   and a [`shelfwatch_realtime::RealtimeChannel`] into published snapshots

pub mod cursor;
pub mod estimator;
pub mod list;
pub mod live;
pub mod snapshot;

pub use cursor::PaginationCursor;
pub use estimator::{PageSizeEstimate, PageSizeEstimator, ViewConfig, Viewport};
pub use list::{ListViewModel, PageRequest};
pub use live::{LiveList, LiveListHandle, ViewportSignal};
pub use snapshot::{ItemSummary, ListSnapshot};
