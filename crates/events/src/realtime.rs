//! Wire shape of the catalog's real-time product events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwatch_core::{EventId, Item, ItemId};

use crate::error::EventError;
use crate::event::Event;

/// Event type tag (`type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "product.created")]
    Created,
    #[serde(rename = "product.updated")]
    Updated,
    #[serde(rename = "product.deleted")]
    Deleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "product.created",
            EventKind::Updated => "product.updated",
            EventKind::Deleted => "product.deleted",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event body (`data` on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub product_id: ItemId,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Item>,
}

/// One real-time notification about a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub id: EventId,
    pub sequence: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
}

/// What a validated event asks the resident list to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemChange<'a> {
    Created(&'a Item),
    Updated(&'a Item),
    Deleted(&'a ItemId),
}

impl RealtimeEvent {
    pub fn created(id: impl Into<EventId>, sequence: u64, item: Item) -> Self {
        Self::with_item(id.into(), sequence, EventKind::Created, item)
    }

    pub fn updated(id: impl Into<EventId>, sequence: u64, item: Item) -> Self {
        Self::with_item(id.into(), sequence, EventKind::Updated, item)
    }

    pub fn deleted(id: impl Into<EventId>, sequence: u64, item_id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            sequence,
            kind: EventKind::Deleted,
            data: EventData {
                product_id: item_id.into(),
                action: "deleted".to_string(),
                product: None,
            },
            timestamp: Utc::now(),
        }
    }

    fn with_item(id: EventId, sequence: u64, kind: EventKind, item: Item) -> Self {
        let action = match kind {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
        };
        Self {
            id,
            sequence,
            kind,
            data: EventData {
                product_id: item.id.clone(),
                action: action.to_string(),
                product: Some(item),
            },
            timestamp: Utc::now(),
        }
    }

    /// Decode one text frame and validate it. Anything malformed is an error;
    /// callers drop it rather than let it near consumer state.
    pub fn decode(text: &str) -> Result<Self, EventError> {
        let event: Self =
            serde_json::from_str(text).map_err(|e| EventError::Decode(e.to_string()))?;
        event.validate()?;
        Ok(event)
    }

    pub fn item_id(&self) -> &ItemId {
        &self.data.product_id
    }

    /// Check the shape invariants the merge rules rely on.
    pub fn validate(&self) -> Result<(), EventError> {
        self.change().map(|_| ())
    }

    /// Interpret the event as a list change, validating it on the way.
    pub fn change(&self) -> Result<ItemChange<'_>, EventError> {
        if self.id.is_blank() {
            return Err(EventError::MissingEventId);
        }
        if self.data.product_id.is_blank() {
            return Err(EventError::MissingItemId);
        }

        match self.kind {
            EventKind::Deleted => Ok(ItemChange::Deleted(&self.data.product_id)),
            kind @ (EventKind::Created | EventKind::Updated) => {
                let item = self.data.product.as_ref().ok_or_else(|| EventError::MissingPayload {
                    event_type: kind.as_str(),
                    item_id: self.data.product_id.clone(),
                })?;
                item.validate()?;
                if item.id != self.data.product_id {
                    return Err(EventError::ItemMismatch {
                        referenced: self.data.product_id.clone(),
                        carried: item.id.clone(),
                    });
                }
                Ok(match kind {
                    EventKind::Created => ItemChange::Created(item),
                    _ => ItemChange::Updated(item),
                })
            }
        }
    }
}

impl Event for RealtimeEvent {
    fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    fn event_id(&self) -> &EventId {
        &self.id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(kind: &str, product: serde_json::Value) -> String {
        json!({
            "id": "evt-1",
            "sequence": 4,
            "type": kind,
            "data": { "product_id": "p-1", "action": "x", "product": product },
            "timestamp": "2024-05-01T10:00:00Z"
        })
        .to_string()
    }

    #[test]
    fn decodes_created_event_from_wire() {
        let text = wire("product.created", json!({ "id": "p-1", "sku": "S", "base_title": "Chair" }));
        let event = RealtimeEvent::decode(&text).unwrap();

        assert_eq!(event.kind, EventKind::Created);
        assert_eq!(event.sequence, 4);
        assert_eq!(event.event_type(), "product.created");
        match event.change().unwrap() {
            ItemChange::Created(item) => assert_eq!(item.base_title, "Chair"),
            other => panic!("Expected Created, got {other:?}"),
        }
    }

    #[test]
    fn decodes_delete_without_payload() {
        let text = json!({
            "id": "evt-2",
            "sequence": 1,
            "type": "product.deleted",
            "data": { "product_id": "p-7", "action": "deleted" },
            "timestamp": "2024-05-01T10:00:00Z"
        })
        .to_string();

        let event = RealtimeEvent::decode(&text).unwrap();
        assert_eq!(event.change().unwrap(), ItemChange::Deleted(&ItemId::new("p-7")));
    }

    #[test]
    fn rejects_unknown_type_and_garbage() {
        let text = wire("product.renamed", json!(null));
        assert!(matches!(RealtimeEvent::decode(&text), Err(EventError::Decode(_))));
        assert!(matches!(RealtimeEvent::decode("{not json"), Err(EventError::Decode(_))));
    }

    #[test]
    fn rejects_update_without_payload() {
        let text = wire("product.updated", json!(null));
        match RealtimeEvent::decode(&text).unwrap_err() {
            EventError::MissingPayload { event_type, item_id } => {
                assert_eq!(event_type, "product.updated");
                assert_eq!(item_id, ItemId::new("p-1"));
            }
            other => panic!("Expected MissingPayload, got {other:?}"),
        }
    }

    #[test]
    fn rejects_payload_for_a_different_item() {
        let text = wire("product.updated", json!({ "id": "p-2" }));
        assert!(matches!(
            RealtimeEvent::decode(&text),
            Err(EventError::ItemMismatch { .. })
        ));
    }

    #[test]
    fn rejects_blank_identifiers() {
        let mut event = RealtimeEvent::deleted("evt", 1, "p-1");
        event.id = EventId::new("");
        assert_eq!(event.validate(), Err(EventError::MissingEventId));

        let event = RealtimeEvent::deleted("evt", 1, " ");
        assert_eq!(event.validate(), Err(EventError::MissingItemId));
    }

    #[test]
    fn constructors_round_trip_through_the_wire_format() {
        let event = RealtimeEvent::created("evt-9", 2, Item::new("p-9", "S", "Desk"));
        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains("\"type\":\"product.created\""));
        assert_eq!(RealtimeEvent::decode(&text).unwrap(), event);
    }
}
