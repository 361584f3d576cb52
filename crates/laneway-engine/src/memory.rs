//! In-memory implementation of the full store contract.
//!
//! Backs the engine's property tests and ephemeral single-process
//! deployments. One mutex guards all state, so each commit is trivially
//! atomic; cross-mutation serialization still belongs to the coordinator,
//! exactly as with the PostgreSQL store.
//!
//! Semantics mirror the SQL executor deliberately, including the subtle
//! corners: deleting an item clears the item reference on its history
//! records but keeps them, and notifications outlive the item because they
//! hang off the records.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use laneway_core::{
    new_v7, ActivityLog, Board, BoardSnapshot, BoardStore, ChangePlan, ChangeRecord, Comment,
    CommittedChange, Error, Item, ItemMeta, ItemView, LedgerStore, NewItem, Notification,
    NotificationStore, PlannedChange, Queue, QueueMeta, QueueView, Result,
};

struct ItemState {
    item: Item,
    assignees: Vec<Uuid>,
    labels: Vec<String>,
    comments: Vec<Comment>,
}

#[derive(Default)]
struct Inner {
    boards: HashMap<Uuid, Board>,
    /// Queue IDs per board, in display order.
    board_queues: HashMap<Uuid, Vec<Uuid>>,
    queues: HashMap<Uuid, Queue>,
    /// Item IDs per queue, in position order. This vec is the truth;
    /// `Item::position` is kept in sync after every structural change.
    queue_items: HashMap<Uuid, Vec<Uuid>>,
    items: HashMap<Uuid, ItemState>,
    /// Change records per board, in seq order.
    activity: HashMap<Uuid, Vec<ChangeRecord>>,
    notifications: Vec<Notification>,
}

impl Inner {
    fn renumber_queue(&mut self, queue_id: Uuid) {
        if let Some(order) = self.queue_items.get(&queue_id) {
            for (index, item_id) in order.clone().iter().enumerate() {
                if let Some(state) = self.items.get_mut(item_id) {
                    state.item.position = index as i32;
                    state.item.queue_id = queue_id;
                }
            }
        }
    }

    fn renumber_board(&mut self, board_id: Uuid) {
        if let Some(order) = self.board_queues.get(&board_id) {
            for (index, queue_id) in order.clone().iter().enumerate() {
                if let Some(queue) = self.queues.get_mut(queue_id) {
                    queue.display_order = index as i32;
                }
            }
        }
    }

    fn insert_item(&mut self, new: &NewItem, now: chrono::DateTime<chrono::Utc>) -> Item {
        let order = self.queue_items.entry(new.queue_id).or_default();
        let index = (new.position.max(0) as usize).min(order.len());
        order.insert(index, new.id);

        let mut seen = HashSet::new();
        let assignees: Vec<Uuid> = new
            .assignees
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        let mut seen_labels = HashSet::new();
        let labels: Vec<String> = new
            .labels
            .iter()
            .filter(|label| seen_labels.insert((*label).clone()))
            .cloned()
            .collect();

        let item = Item {
            id: new.id,
            board_id: new.board_id,
            queue_id: new.queue_id,
            title: new.title.clone(),
            body: new.body.clone(),
            position: index as i32,
            completed: false,
            due_at: new.due_at,
            created_at: now,
            updated_at: now,
        };
        self.items.insert(
            new.id,
            ItemState {
                item: item.clone(),
                assignees,
                labels,
                comments: Vec::new(),
            },
        );
        self.renumber_queue(new.queue_id);
        item
    }

    fn remove_from_queue(&mut self, queue_id: Uuid, item_id: Uuid) {
        if let Some(order) = self.queue_items.get_mut(&queue_id) {
            order.retain(|id| *id != item_id);
        }
        self.renumber_queue(queue_id);
    }

    fn item_snapshot(&self, item_id: Uuid) -> Result<Item> {
        self.items
            .get(&item_id)
            .map(|state| state.item.clone())
            .ok_or(Error::ItemNotFound(item_id))
    }

    fn apply(&mut self, change: &PlannedChange, now: chrono::DateTime<chrono::Utc>) -> Result<Option<Item>> {
        match change {
            PlannedChange::Insert { item } => Ok(Some(self.insert_item(item, now))),

            PlannedChange::Remove {
                queue_id, item_id, ..
            } => {
                self.items.remove(item_id);
                self.remove_from_queue(*queue_id, *item_id);
                // History survives its subject with the reference cleared.
                for records in self.activity.values_mut() {
                    for record in records.iter_mut() {
                        if record.item_id == Some(*item_id) {
                            record.item_id = None;
                        }
                    }
                }
                Ok(None)
            }

            PlannedChange::MoveWithin {
                queue_id,
                item_id,
                to,
                ..
            } => {
                let order = self
                    .queue_items
                    .get_mut(queue_id)
                    .ok_or(Error::QueueNotFound(*queue_id))?;
                order.retain(|id| *id != *item_id);
                let index = (to.max(&0).to_owned() as usize).min(order.len());
                order.insert(index, *item_id);
                self.renumber_queue(*queue_id);
                if let Some(state) = self.items.get_mut(item_id) {
                    state.item.updated_at = now;
                }
                Ok(Some(self.item_snapshot(*item_id)?))
            }

            PlannedChange::MoveAcross {
                item_id,
                from_queue,
                to_queue,
                to,
                ..
            } => {
                if let Some(order) = self.queue_items.get_mut(from_queue) {
                    order.retain(|id| *id != *item_id);
                }
                self.renumber_queue(*from_queue);
                let dest = self.queue_items.entry(*to_queue).or_default();
                let index = (to.max(&0).to_owned() as usize).min(dest.len());
                dest.insert(index, *item_id);
                self.renumber_queue(*to_queue);
                if let Some(state) = self.items.get_mut(item_id) {
                    state.item.updated_at = now;
                }
                Ok(Some(self.item_snapshot(*item_id)?))
            }

            PlannedChange::Patch { item_id, patch } => {
                let state = self
                    .items
                    .get_mut(item_id)
                    .ok_or(Error::ItemNotFound(*item_id))?;
                if let Some(title) = &patch.title {
                    state.item.title = title.clone();
                }
                if let Some(body) = &patch.body {
                    state.item.body = body.clone();
                }
                if let Some(due_at) = patch.due_at {
                    state.item.due_at = Some(due_at);
                }
                if let Some(completed) = patch.completed {
                    state.item.completed = completed;
                }
                state.item.updated_at = now;
                Ok(Some(state.item.clone()))
            }

            PlannedChange::Assign { item_id, user_id } => {
                let state = self
                    .items
                    .get_mut(item_id)
                    .ok_or(Error::ItemNotFound(*item_id))?;
                if !state.assignees.contains(user_id) {
                    state.assignees.push(*user_id);
                }
                state.item.updated_at = now;
                Ok(Some(state.item.clone()))
            }

            PlannedChange::Unassign { item_id, user_id } => {
                let state = self
                    .items
                    .get_mut(item_id)
                    .ok_or(Error::ItemNotFound(*item_id))?;
                state.assignees.retain(|id| id != user_id);
                state.item.updated_at = now;
                Ok(Some(state.item.clone()))
            }

            PlannedChange::Label { item_id, label } => {
                let state = self
                    .items
                    .get_mut(item_id)
                    .ok_or(Error::ItemNotFound(*item_id))?;
                if !state.labels.contains(label) {
                    state.labels.push(label.clone());
                }
                state.item.updated_at = now;
                Ok(Some(state.item.clone()))
            }

            PlannedChange::Unlabel { item_id, label } => {
                let state = self
                    .items
                    .get_mut(item_id)
                    .ok_or(Error::ItemNotFound(*item_id))?;
                state.labels.retain(|l| l != label);
                state.item.updated_at = now;
                Ok(Some(state.item.clone()))
            }

            PlannedChange::Comment { comment } => {
                let state = self
                    .items
                    .get_mut(&comment.item_id)
                    .ok_or(Error::ItemNotFound(comment.item_id))?;
                state.comments.push(Comment {
                    id: comment.id,
                    item_id: comment.item_id,
                    author_id: comment.author_id,
                    body: comment.body.clone(),
                    created_at: now,
                });
                Ok(Some(state.item.clone()))
            }

            PlannedChange::ReorderQueue {
                board_id,
                queue_id,
                to,
                ..
            } => {
                let order = self
                    .board_queues
                    .get_mut(board_id)
                    .ok_or(Error::BoardNotFound(*board_id))?;
                order.retain(|id| *id != *queue_id);
                let index = (to.max(&0).to_owned() as usize).min(order.len());
                order.insert(index, *queue_id);
                self.renumber_board(*board_id);
                Ok(None)
            }
        }
    }
}

/// In-memory store. Cloning is not provided; share it behind an `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn board_exists(&self, board_id: Uuid) -> Result<bool> {
        Ok(self.inner.lock().await.boards.contains_key(&board_id))
    }

    async fn queue_meta(&self, queue_id: Uuid) -> Result<QueueMeta> {
        let inner = self.inner.lock().await;
        let queue = inner
            .queues
            .get(&queue_id)
            .ok_or(Error::QueueNotFound(queue_id))?;
        let len = inner
            .queue_items
            .get(&queue_id)
            .map(|order| order.len())
            .unwrap_or(0);
        Ok(QueueMeta {
            id: queue.id,
            board_id: queue.board_id,
            name: queue.name.clone(),
            len,
        })
    }

    async fn item_meta(&self, item_id: Uuid) -> Result<ItemMeta> {
        let inner = self.inner.lock().await;
        let state = inner
            .items
            .get(&item_id)
            .ok_or(Error::ItemNotFound(item_id))?;
        Ok(ItemMeta {
            id: state.item.id,
            board_id: state.item.board_id,
            queue_id: state.item.queue_id,
            position: state.item.position,
            title: state.item.title.clone(),
            completed: state.item.completed,
            assignees: state.assignees.clone(),
            labels: state.labels.clone(),
        })
    }

    async fn queue_order(&self, board_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .inner
            .lock()
            .await
            .board_queues
            .get(&board_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit(&self, plan: ChangePlan) -> Result<CommittedChange> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();

        let board = inner
            .boards
            .get_mut(&plan.board_id)
            .ok_or(Error::BoardNotFound(plan.board_id))?;
        board.activity_seq += 1;
        let seq = board.activity_seq;

        let item = inner.apply(&plan.change, now)?;

        let record = ChangeRecord {
            id: plan.record.id,
            board_id: plan.record.board_id,
            item_id: plan.record.item_id,
            actor_id: plan.record.actor_id,
            kind: plan.record.kind,
            summary: plan.record.summary,
            seq,
            created_at: now,
        };
        inner
            .activity
            .entry(plan.board_id)
            .or_default()
            .push(record.clone());

        let mut notifications = Vec::with_capacity(plan.recipients.len());
        for recipient_id in plan.recipients {
            let notification = Notification {
                id: new_v7(),
                activity_id: record.id,
                recipient_id,
                read: false,
                created_at: now,
            };
            inner.notifications.push(notification.clone());
            notifications.push(notification);
        }

        Ok(CommittedChange {
            record,
            item,
            notifications,
        })
    }

    async fn reindex_queue(&self, queue_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        if !inner.queues.contains_key(&queue_id) {
            return Err(Error::QueueNotFound(queue_id));
        }
        let order = inner
            .queue_items
            .get(&queue_id)
            .cloned()
            .unwrap_or_default();
        let mut repaired = 0;
        for (index, item_id) in order.iter().enumerate() {
            if let Some(state) = inner.items.get_mut(item_id) {
                if state.item.position != index as i32 {
                    state.item.position = index as i32;
                    repaired += 1;
                }
            }
        }
        Ok(repaired)
    }
}

#[async_trait]
impl ActivityLog for MemoryStore {
    async fn by_board(
        &self,
        board_id: Uuid,
        before_seq: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>> {
        let inner = self.inner.lock().await;
        let records = inner.activity.get(&board_id);
        Ok(records
            .map(|records| {
                records
                    .iter()
                    .rev()
                    .filter(|record| before_seq.is_none_or(|before| record.seq < before))
                    .take(limit.max(0) as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn by_actor(
        &self,
        actor_id: Uuid,
        board_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>> {
        let inner = self.inner.lock().await;
        let mut records: Vec<ChangeRecord> = inner
            .activity
            .iter()
            .filter(|(board, _)| board_id.is_none_or(|wanted| **board == wanted))
            .flat_map(|(_, records)| records.iter())
            .filter(|record| record.actor_id == actor_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let inner = self.inner.lock().await;
        let mut list: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && (!unread_only || !n.read))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        list.truncate(limit.max(0) as usize);
        Ok(list)
    }

    async fn mark_read(&self, notification_id: Uuid, recipient_id: Uuid) -> Result<Notification> {
        let mut inner = self.inner.lock().await;
        let notification = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.recipient_id == recipient_id)
            .ok_or(Error::NotificationNotFound(notification_id))?;
        notification.read = true;
        Ok(notification.clone())
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let mut flipped = 0;
        for notification in inner
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
        {
            notification.read = true;
            flipped += 1;
        }
        Ok(flipped)
    }

    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
            .count() as i64)
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn create_board(&self, name: &str) -> Result<Board> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("board name must not be empty".into()));
        }
        let mut inner = self.inner.lock().await;
        let board = Board {
            id: new_v7(),
            name: name.to_string(),
            activity_seq: 0,
            created_at: Utc::now(),
        };
        inner.board_queues.insert(board.id, Vec::new());
        inner.boards.insert(board.id, board.clone());
        Ok(board)
    }

    async fn get_board(&self, board_id: Uuid) -> Result<Board> {
        self.inner
            .lock()
            .await
            .boards
            .get(&board_id)
            .cloned()
            .ok_or(Error::BoardNotFound(board_id))
    }

    async fn list_boards(&self) -> Result<Vec<Board>> {
        let inner = self.inner.lock().await;
        let mut boards: Vec<Board> = inner.boards.values().cloned().collect();
        boards.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(boards)
    }

    async fn create_queue(&self, board_id: Uuid, name: &str) -> Result<Queue> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("queue name must not be empty".into()));
        }
        let mut inner = self.inner.lock().await;
        if !inner.boards.contains_key(&board_id) {
            return Err(Error::BoardNotFound(board_id));
        }
        let order = inner.board_queues.entry(board_id).or_default();
        let queue = Queue {
            id: new_v7(),
            board_id,
            name: name.to_string(),
            display_order: order.len() as i32,
            created_at: Utc::now(),
        };
        order.push(queue.id);
        inner.queue_items.insert(queue.id, Vec::new());
        inner.queues.insert(queue.id, queue.clone());
        Ok(queue)
    }

    async fn snapshot(&self, board_id: Uuid) -> Result<BoardSnapshot> {
        let inner = self.inner.lock().await;
        let board = inner
            .boards
            .get(&board_id)
            .cloned()
            .ok_or(Error::BoardNotFound(board_id))?;
        let queue_ids = inner.board_queues.get(&board_id).cloned().unwrap_or_default();
        let mut queues = Vec::with_capacity(queue_ids.len());
        for queue_id in queue_ids {
            let Some(queue) = inner.queues.get(&queue_id).cloned() else {
                continue;
            };
            let items = inner
                .queue_items
                .get(&queue_id)
                .map(|order| {
                    order
                        .iter()
                        .filter_map(|item_id| inner.items.get(item_id))
                        .map(|state| ItemView {
                            item: state.item.clone(),
                            assignees: state.assignees.clone(),
                            labels: state.labels.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            queues.push(QueueView { queue, items });
        }
        Ok(BoardSnapshot { board, queues })
    }

    async fn list_comments(&self, item_id: Uuid) -> Result<Vec<Comment>> {
        let inner = self.inner.lock().await;
        let state = inner
            .items
            .get(&item_id)
            .ok_or(Error::ItemNotFound(item_id))?;
        Ok(state.comments.clone())
    }
}
