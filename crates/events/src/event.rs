use chrono::{DateTime, Utc};

use shelfwatch_core::EventId;

/// A sequenced event as seen by the consumer.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **sequenced per identifier**: for one `event_id`, a higher `sequence`
///   supersedes every lower one
/// - delivered **at least once**, in no particular order
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "product.created").
    fn event_type(&self) -> &'static str;

    /// Identifier the sequence number is scoped to.
    fn event_id(&self) -> &EventId;

    /// Position within the identifier's stream.
    fn sequence(&self) -> u64;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
