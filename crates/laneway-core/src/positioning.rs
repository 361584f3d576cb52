//! Dense-position placement math and the planned ledger deltas that store
//! executors apply.
//!
//! Every container (a queue's items, a board's queues) keeps its members at
//! dense positions `0..N-1`. Mutations never leave gaps and never reject a
//! position: out-of-range requests clamp to the nearest valid slot, so a
//! drag computed against a stale snapshot still lands somewhere sensible.
//!
//! The engine computes placement exactly once, under the owning locks, and
//! encodes the result as a [`ChangePlan`]. Executors (the PostgreSQL ledger
//! and the in-memory store) only shift neighbors and write rows as the plan
//! dictates; they never re-derive placement. That split is what keeps the
//! two backends in lockstep.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::ChangeKind;

// =============================================================================
// SLOT CLAMPING
// =============================================================================

/// Clamp a requested slot for inserting a NEW element into a container of
/// `len` members. Valid slots are `0..=len` (a new element may land after
/// the current last).
pub fn insertion_slot(len: usize, requested: i32) -> i32 {
    requested.clamp(0, len as i32)
}

/// Clamp a requested slot for relocating an EXISTING element within its
/// container of `len` members. Valid slots are `0..=len-1`; an empty
/// container clamps to 0, though callers never relocate within one.
pub fn relocation_slot(len: usize, requested: i32) -> i32 {
    requested.clamp(0, len.saturating_sub(1) as i32)
}

// =============================================================================
// PLANNED CHANGES
// =============================================================================

/// Field edits applied by [`PlannedChange::Patch`]. `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}

impl ItemPatch {
    /// Whether the patch touches any field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.due_at.is_none()
            && self.completed.is_none()
    }
}

/// A new item row placed by [`PlannedChange::Insert`]. `position` is final
/// (creation appends, so it equals the queue length at planning time).
#[derive(Debug, Clone)]
pub struct NewItem {
    pub id: Uuid,
    pub board_id: Uuid,
    pub queue_id: Uuid,
    pub title: String,
    pub body: String,
    pub position: i32,
    pub due_at: Option<DateTime<Utc>>,
    pub assignees: Vec<Uuid>,
    pub labels: Vec<String>,
}

/// A new comment row placed by [`PlannedChange::Comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
    pub id: Uuid,
    pub item_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
}

/// A position-resolved ledger delta.
///
/// Every position in a variant is already clamped and final. The shifting
/// each variant implies:
///
/// - `Insert`: members at `position..` shift +1 (vacuous for an append)
/// - `Remove`: members after `position` shift -1
/// - `MoveWithin`: members between `from` and `to` shift toward the vacated
///   slot
/// - `MoveAcross`: source members after `from` shift -1, destination members
///   at `to..` shift +1
/// - `ReorderQueue`: as `MoveWithin`, applied to queue display order
#[derive(Debug, Clone)]
pub enum PlannedChange {
    /// Insert a new item at its final position.
    Insert { item: NewItem },
    /// Remove an item, closing its gap.
    Remove {
        queue_id: Uuid,
        item_id: Uuid,
        position: i32,
    },
    /// Relocate an item within one queue.
    MoveWithin {
        queue_id: Uuid,
        item_id: Uuid,
        from: i32,
        to: i32,
    },
    /// Re-parent an item across queues on the same board.
    MoveAcross {
        item_id: Uuid,
        from_queue: Uuid,
        from: i32,
        to_queue: Uuid,
        to: i32,
    },
    /// Field edits only; positions are untouched.
    Patch { item_id: Uuid, patch: ItemPatch },
    /// Add a user to an item's assignee set.
    Assign { item_id: Uuid, user_id: Uuid },
    /// Remove a user from an item's assignee set.
    Unassign { item_id: Uuid, user_id: Uuid },
    /// Attach a label to an item.
    Label { item_id: Uuid, label: String },
    /// Detach a label from an item.
    Unlabel { item_id: Uuid, label: String },
    /// Append a comment to an item.
    Comment { comment: NewComment },
    /// Relocate a queue within its board's display order.
    ReorderQueue {
        board_id: Uuid,
        queue_id: Uuid,
        from: i32,
        to: i32,
    },
}

/// Draft of the change record appended with a plan. The per-board sequence
/// and timestamp are assigned by the executor at commit time, inside the
/// same transaction as the ledger delta.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub id: Uuid,
    pub board_id: Uuid,
    /// Item reference carried by the record; `None` for deletions and
    /// queue-level changes.
    pub item_id: Option<Uuid>,
    pub actor_id: Uuid,
    pub kind: ChangeKind,
    pub summary: String,
}

/// The atomic commit unit handed to a ledger executor: one position delta,
/// one change record, and the record's durable notifications. All three
/// land together or not at all.
#[derive(Debug, Clone)]
pub struct ChangePlan {
    pub board_id: Uuid,
    pub change: PlannedChange,
    pub record: RecordDraft,
    /// Recipients for the notifications created with the record. Already
    /// deduplicated with the actor excluded.
    pub recipients: Vec<Uuid>,
}
