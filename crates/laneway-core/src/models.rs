//! Core data models for laneway.
//!
//! These types are shared across all laneway crates and represent the
//! positioning engine's domain entities. Positions are plain dense integers
//! (`0..N-1` within the owning container) maintained by shifting neighbors
//! on every mutation; there are no fractional ranks and no periodic
//! rebalancing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// BOARD TYPES
// =============================================================================

/// A board: the collaboration scope that groups queues and bounds realtime
/// fan-out. Change sequences are per-board.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    /// Highest change sequence issued on this board (0 = no changes yet).
    pub activity_seq: i64,
    pub created_at: DateTime<Utc>,
}

/// A queue: one ordered column of items on a board.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Queue {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    /// Position among the board's queues (dense, 0-based).
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ITEM TYPES
// =============================================================================

/// A work item. Owned by exactly one queue; `position` is its dense 0-based
/// index within that queue.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub board_id: Uuid,
    pub queue_id: Uuid,
    pub title: String,
    pub body: String,
    pub position: i32,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An item together with its membership facets, as served in board
/// snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ItemView {
    pub item: Item,
    pub assignees: Vec<Uuid>,
    pub labels: Vec<String>,
}

/// A comment on an item.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub item_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CHANGE LOG TYPES
// =============================================================================

/// Classification of a committed change.
///
/// Closed set: feed consumers switch on this to pick icons and copy, so a
/// new category is a breaking change for them. Mutations without a category
/// of their own (deletes, label edits, assignee removals) are classified as
/// `Updated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Completed,
    Moved,
    MemberAdded,
    Commented,
}

/// One immutable entry in a board's change history.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChangeRecord {
    pub id: Uuid,
    pub board_id: Uuid,
    /// Affected item. `None` for queue-level changes, and cleared when the
    /// item is later deleted (history survives its subject).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
    pub actor_id: Uuid,
    pub kind: ChangeKind,
    /// Human-readable one-line description of the change.
    pub summary: String,
    /// Commit sequence within the board, strictly increasing. Doubles as
    /// the broadcast order for subscribers.
    pub seq: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// NOTIFICATION TYPES
// =============================================================================

/// A durable per-user notification, created in the same transaction as the
/// change record it points at.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Notification {
    pub id: Uuid,
    /// The change record that produced this notification.
    pub activity_id: Uuid,
    pub recipient_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// MUTATION TYPES
// =============================================================================

/// A positioning mutation submitted for serialized application.
///
/// Every variant names its board up front so the engine can verify scope
/// before taking any locks. Item-addressed variants carry no queue: the
/// owning queue is resolved under the engine's serialization, so a mutation
/// racing a move lands on wherever the item actually is.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// Add an item at the end of a queue.
    CreateItem {
        board_id: Uuid,
        queue_id: Uuid,
        title: String,
        #[serde(default)]
        body: String,
        /// Initial assignees; these are also the notification targets.
        #[serde(default)]
        assignees: Vec<Uuid>,
        #[serde(default)]
        labels: Vec<String>,
        #[serde(default)]
        due_at: Option<DateTime<Utc>>,
    },
    /// Edit an item's fields. Setting `completed: true` classifies the
    /// change as a completion rather than a generic update.
    UpdateItem {
        board_id: Uuid,
        item_id: Uuid,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        due_at: Option<DateTime<Utc>>,
        #[serde(default)]
        completed: Option<bool>,
    },
    /// Relocate an item, within its queue or across queues on the same
    /// board. Out-of-range positions clamp to the nearest valid slot.
    MoveItem {
        board_id: Uuid,
        item_id: Uuid,
        to_queue: Uuid,
        to_position: i32,
    },
    /// Remove an item. Its history remains with the item reference cleared.
    DeleteItem { board_id: Uuid, item_id: Uuid },
    /// Add a user to an item's assignee set.
    AddAssignee {
        board_id: Uuid,
        item_id: Uuid,
        user_id: Uuid,
    },
    /// Remove a user from an item's assignee set.
    RemoveAssignee {
        board_id: Uuid,
        item_id: Uuid,
        user_id: Uuid,
    },
    /// Attach a label to an item.
    AddLabel {
        board_id: Uuid,
        item_id: Uuid,
        label: String,
    },
    /// Detach a label from an item.
    RemoveLabel {
        board_id: Uuid,
        item_id: Uuid,
        label: String,
    },
    /// Comment on an item.
    AddComment {
        board_id: Uuid,
        item_id: Uuid,
        body: String,
    },
    /// Reorder a queue among its board's columns. Same dense placement
    /// rules as item moves, applied to `display_order`.
    MoveQueue {
        board_id: Uuid,
        queue_id: Uuid,
        to_order: i32,
    },
}

impl Mutation {
    /// The board this mutation is scoped to.
    pub fn board_id(&self) -> Uuid {
        match self {
            Mutation::CreateItem { board_id, .. }
            | Mutation::UpdateItem { board_id, .. }
            | Mutation::MoveItem { board_id, .. }
            | Mutation::DeleteItem { board_id, .. }
            | Mutation::AddAssignee { board_id, .. }
            | Mutation::RemoveAssignee { board_id, .. }
            | Mutation::AddLabel { board_id, .. }
            | Mutation::RemoveLabel { board_id, .. }
            | Mutation::AddComment { board_id, .. }
            | Mutation::MoveQueue { board_id, .. } => *board_id,
        }
    }

    /// The addressed item, where the variant names one.
    pub fn item_id(&self) -> Option<Uuid> {
        match self {
            Mutation::UpdateItem { item_id, .. }
            | Mutation::MoveItem { item_id, .. }
            | Mutation::DeleteItem { item_id, .. }
            | Mutation::AddAssignee { item_id, .. }
            | Mutation::RemoveAssignee { item_id, .. }
            | Mutation::AddLabel { item_id, .. }
            | Mutation::RemoveLabel { item_id, .. }
            | Mutation::AddComment { item_id, .. } => Some(*item_id),
            Mutation::CreateItem { .. } | Mutation::MoveQueue { .. } => None,
        }
    }

    /// Stable lowercase name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CreateItem { .. } => "create_item",
            Mutation::UpdateItem { .. } => "update_item",
            Mutation::MoveItem { .. } => "move_item",
            Mutation::DeleteItem { .. } => "delete_item",
            Mutation::AddAssignee { .. } => "add_assignee",
            Mutation::RemoveAssignee { .. } => "remove_assignee",
            Mutation::AddLabel { .. } => "add_label",
            Mutation::RemoveLabel { .. } => "remove_label",
            Mutation::AddComment { .. } => "add_comment",
            Mutation::MoveQueue { .. } => "move_queue",
        }
    }
}

// =============================================================================
// OUTCOME & SNAPSHOT TYPES
// =============================================================================

/// What a submitted mutation produced once the engine finished with it.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommitOutcome {
    pub board_id: Uuid,
    /// Post-commit item state. `None` for deletions, queue reorders, and
    /// no-ops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
    /// The appended change record. `None` when the mutation matched
    /// existing state and nothing was committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ChangeRecord>,
    /// Durable notifications created alongside the record.
    pub notifications_created: usize,
}

impl CommitOutcome {
    /// Outcome for an idempotent mutation that committed nothing: no ledger
    /// write, no record, no broadcast, no notifications.
    pub fn noop(board_id: Uuid) -> Self {
        Self {
            board_id,
            item: None,
            record: None,
            notifications_created: 0,
        }
    }

    /// Whether the mutation committed anything.
    pub fn is_noop(&self) -> bool {
        self.record.is_none()
    }
}

/// One queue with its items in position order.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QueueView {
    pub queue: Queue,
    pub items: Vec<ItemView>,
}

/// Full read-model of a board: queues in display order, each with items in
/// position order. Served outside the engine's serialization; pair it with
/// the realtime feed to stay current.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BoardSnapshot {
    pub board: Board,
    pub queues: Vec<QueueView>,
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request to create a board.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateBoardRequest {
    pub name: String,
}

/// Request to add a queue at the end of a board's columns.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateQueueRequest {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ChangeKind::MemberAdded).unwrap(),
            "\"member_added\""
        );
        assert_eq!(
            serde_json::to_string(&ChangeKind::Created).unwrap(),
            "\"created\""
        );
    }

    #[test]
    fn test_mutation_deserializes_from_tagged_json() {
        let json = r#"{
            "type": "create_item",
            "board_id": "01890a5d-ac96-774b-b9aa-a52a47702b5d",
            "queue_id": "01890a5d-ac96-774b-b9aa-a52a47702b5e",
            "title": "Fix login"
        }"#;
        let mutation: Mutation = serde_json::from_str(json).unwrap();
        match mutation {
            Mutation::CreateItem {
                title,
                body,
                assignees,
                labels,
                due_at,
                ..
            } => {
                assert_eq!(title, "Fix login");
                assert_eq!(body, "");
                assert!(assignees.is_empty());
                assert!(labels.is_empty());
                assert!(due_at.is_none());
            }
            other => panic!("wrong variant: {}", other.name()),
        }
    }

    #[test]
    fn test_mutation_board_id_covers_all_variants() {
        let board = Uuid::new_v4();
        let item = Uuid::new_v4();
        let mutation = Mutation::DeleteItem {
            board_id: board,
            item_id: item,
        };
        assert_eq!(mutation.board_id(), board);
        assert_eq!(mutation.item_id(), Some(item));
        assert_eq!(mutation.name(), "delete_item");
    }

    #[test]
    fn test_create_and_move_queue_address_no_item() {
        let mutation = Mutation::MoveQueue {
            board_id: Uuid::new_v4(),
            queue_id: Uuid::new_v4(),
            to_order: 2,
        };
        assert_eq!(mutation.item_id(), None);
    }

    #[test]
    fn test_noop_outcome_is_empty() {
        let board = Uuid::new_v4();
        let outcome = CommitOutcome::noop(board);
        assert!(outcome.is_noop());
        assert!(outcome.item.is_none());
        assert!(outcome.record.is_none());
        assert_eq!(outcome.notifications_created, 0);
        assert_eq!(outcome.board_id, board);
    }
}
