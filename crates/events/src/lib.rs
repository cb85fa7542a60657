//! `shelfwatch-events`: real-time catalog events and the bookkeeping that
//! makes an at-least-once, out-of-order stream safe to consume.
//!
//! Pure logic only; the connection and timers live in `shelfwatch-realtime`.

pub mod error;
pub mod event;
pub mod history;
pub mod realtime;
pub mod sequence;

pub use error::EventError;
pub use event::Event;
pub use history::{EventHistory, DEFAULT_HISTORY_LIMIT};
pub use realtime::{EventData, EventKind, ItemChange, RealtimeEvent};
pub use sequence::{SequenceTracker, DEFAULT_CAPACITY, DEFAULT_RETAIN};
