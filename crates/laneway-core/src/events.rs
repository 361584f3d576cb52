//! Realtime event payloads delivered to board subscribers.
//!
//! The realtime feed is a cache-invalidation hint, not a source of truth:
//! events carry enough to render a toast and decide what to re-fetch, never
//! the full ledger delta. Subscribers reconcile against the board snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ChangeKind, ChangeRecord};

/// A committed change, as broadcast to the owning board's subscribers.
///
/// Delivery order matches commit order: `seq` is the board's change
/// sequence, so a subscriber observing `seq` N has seen every earlier event
/// it was connected for.
#[derive(Debug, Clone, Serialize)]
pub struct BoardEvent {
    pub board_id: Uuid,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
    pub summary: String,
    pub seq: i64,
    pub at: DateTime<Utc>,
}

impl BoardEvent {
    /// Build the broadcast payload for a committed change record.
    pub fn for_record(record: &ChangeRecord) -> Self {
        Self {
            board_id: record.board_id,
            kind: record.kind,
            item_id: record.item_id,
            summary: record.summary.clone(),
            seq: record.seq,
            at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuid_utils::new_v7;

    #[test]
    fn test_for_record_copies_the_wire_fields() {
        let record = ChangeRecord {
            id: new_v7(),
            board_id: new_v7(),
            item_id: Some(new_v7()),
            actor_id: new_v7(),
            kind: ChangeKind::Moved,
            summary: "moved \"Fix login\" to \"Done\"".to_string(),
            seq: 42,
            created_at: Utc::now(),
        };
        let event = BoardEvent::for_record(&record);
        assert_eq!(event.board_id, record.board_id);
        assert_eq!(event.kind, ChangeKind::Moved);
        assert_eq!(event.item_id, record.item_id);
        assert_eq!(event.summary, record.summary);
        assert_eq!(event.seq, 42);
    }

    #[test]
    fn test_event_serializes_kind_snake_case_and_skips_empty_item() {
        let event = BoardEvent {
            board_id: new_v7(),
            kind: ChangeKind::MemberAdded,
            item_id: None,
            summary: "added an assignee".to_string(),
            seq: 7,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "member_added");
        assert_eq!(json["seq"], 7);
        assert!(json.get("item_id").is_none());
    }
}
