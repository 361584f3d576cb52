//! Store contracts for laneway backends.
//!
//! These traits define the interfaces the engine coordinates against,
//! enabling pluggable backends: `laneway-db` implements them over
//! PostgreSQL, `laneway-engine` ships an in-memory implementation used by
//! the property tests and for ephemeral deployments.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::positioning::ChangePlan;

// =============================================================================
// PLANNING FACTS
// =============================================================================

/// Queue facts the engine plans against. Read under the queue's lock, so
/// `len` is exact until that lock is released.
#[derive(Debug, Clone)]
pub struct QueueMeta {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    /// Number of items currently in the queue.
    pub len: usize,
}

/// Item facts the engine plans against. Read under the owning queue's lock.
#[derive(Debug, Clone)]
pub struct ItemMeta {
    pub id: Uuid,
    pub board_id: Uuid,
    pub queue_id: Uuid,
    pub position: i32,
    pub title: String,
    pub completed: bool,
    pub assignees: Vec<Uuid>,
    pub labels: Vec<String>,
}

/// What a ledger executor committed for one plan.
#[derive(Debug, Clone)]
pub struct CommittedChange {
    /// The appended record, with its per-board sequence assigned.
    pub record: ChangeRecord,
    /// Post-commit item state for item-affecting changes.
    pub item: Option<Item>,
    /// Notifications created with the record, one per plan recipient.
    pub notifications: Vec<Notification>,
}

// =============================================================================
// LEDGER STORE
// =============================================================================

/// Transactional store for the position ledger.
///
/// `commit` is the only write path for mutations: the position delta, the
/// change record (with the next per-board sequence), and the notifications
/// land in one transaction or not at all. Reads here are planning reads;
/// the engine calls them while holding the relevant locks.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Whether a board exists.
    async fn board_exists(&self, board_id: Uuid) -> Result<bool>;

    /// Queue facts for planning. `Err(QueueNotFound)` when absent.
    async fn queue_meta(&self, queue_id: Uuid) -> Result<QueueMeta>;

    /// Item facts for planning. `Err(ItemNotFound)` when absent.
    async fn item_meta(&self, item_id: Uuid) -> Result<ItemMeta>;

    /// Queue IDs of a board in display order.
    async fn queue_order(&self, board_id: Uuid) -> Result<Vec<Uuid>>;

    /// Apply a plan atomically and return what was committed.
    async fn commit(&self, plan: ChangePlan) -> Result<CommittedChange>;

    /// Rewrite a queue's positions to dense `0..N-1`, preserving relative
    /// order. Returns the number of rows that changed. Positions only go
    /// non-dense through outside interference (manual SQL, partial
    /// restores), so this is a repair tool, not part of the mutation path.
    async fn reindex_queue(&self, queue_id: Uuid) -> Result<u64>;
}

// =============================================================================
// ACTIVITY LOG
// =============================================================================

/// Read access to committed change history.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// A board's history, newest first. `before_seq` pages backwards:
    /// only records with `seq < before_seq` are returned.
    async fn by_board(
        &self,
        board_id: Uuid,
        before_seq: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>>;

    /// Changes authored by a user, newest first, optionally scoped to one
    /// board.
    async fn by_actor(
        &self,
        actor_id: Uuid,
        board_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>>;
}

// =============================================================================
// NOTIFICATION STORE
// =============================================================================

/// Durable per-user notifications. Creation happens inside
/// [`LedgerStore::commit`]; this trait covers the recipient-facing
/// lifecycle.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// A recipient's notifications, newest first.
    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>>;

    /// Mark one notification read. Scoped to the recipient:
    /// `Err(NotificationNotFound)` if the ID exists but belongs to someone
    /// else.
    async fn mark_read(&self, notification_id: Uuid, recipient_id: Uuid) -> Result<Notification>;

    /// Mark all of a recipient's notifications read; returns how many
    /// flipped.
    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64>;

    /// Number of unread notifications for a recipient.
    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64>;
}

// =============================================================================
// BOARD STORE
// =============================================================================

/// Board and queue administration plus snapshot reads.
///
/// Creation endpoints are bootstrap operations: they produce no change
/// record and no broadcast. Snapshots are unlocked reads; pair them with
/// the realtime feed.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Create a board.
    async fn create_board(&self, name: &str) -> Result<Board>;

    /// Fetch a board. `Err(BoardNotFound)` when absent.
    async fn get_board(&self, board_id: Uuid) -> Result<Board>;

    /// All boards, newest first.
    async fn list_boards(&self) -> Result<Vec<Board>>;

    /// Add a queue at the end of a board's columns.
    async fn create_queue(&self, board_id: Uuid, name: &str) -> Result<Queue>;

    /// Full read-model of a board: queues in display order, items in
    /// position order, facets attached.
    async fn snapshot(&self, board_id: Uuid) -> Result<BoardSnapshot>;

    /// An item's comments, oldest first.
    async fn list_comments(&self, item_id: Uuid) -> Result<Vec<Comment>>;
}
