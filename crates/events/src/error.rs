use thiserror::Error;

use shelfwatch_core::{DomainError, ItemId};

/// Reasons an inbound event is rejected before it reaches any consumer state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EventError {
    #[error("failed to decode event: {0}")]
    Decode(String),

    #[error("event has an empty identifier")]
    MissingEventId,

    #[error("event references an empty item id")]
    MissingItemId,

    #[error("{event_type} event for {item_id} carries no item payload")]
    MissingPayload {
        event_type: &'static str,
        item_id: ItemId,
    },

    #[error("event references {referenced} but carries item {carried}")]
    ItemMismatch { referenced: ItemId, carried: ItemId },

    #[error("invalid item payload: {0}")]
    InvalidItem(#[from] DomainError),
}
