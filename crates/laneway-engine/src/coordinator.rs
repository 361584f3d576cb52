//! The ordering coordinator: laneway's serialization authority.
//!
//! Every mutation passes through [`Coordinator::submit`], which pins the
//! queue(s) the mutation touches, computes the position delta against the
//! true current state, and hands the resulting plan to the store for an
//! atomic commit. Mutations against the same queue apply strictly one after
//! another in arrival order; mutations against disjoint queues run
//! concurrently.
//!
//! Lock order is global and fixed: queue locks in ascending ID order, then
//! the board's commit guard. The guard spans sequence assignment, commit,
//! and publish, so a later commit on the same board can never broadcast
//! ahead of an earlier one.
//!
//! Cancellation: a caller that goes away while waiting for a lock simply
//! leaves the wait queue (tokio mutexes are cancel-safe) and its mutation is
//! never applied. Once planning succeeds, the commit runs on a detached task
//! that the caller merely awaits, so a caller dropped mid-commit cannot
//! abort a half-applied transaction.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use laneway_core::{
    defaults::OWNER_RESOLVE_RETRIES, insertion_slot, new_v7, recipients, relocation_slot,
    BoardEvent, ChangeKind, ChangePlan, CommitOutcome, Error, ItemMeta, ItemPatch, LedgerStore,
    Mutation, NewComment, NewItem, PlannedChange, QueueMeta, RecordDraft, Result,
};

use crate::locks::LockRegistry;
use crate::router::BoardRouter;

/// What planning decided to do with a mutation.
enum Planned {
    /// Commit this plan while holding these queue locks.
    Commit(Vec<OwnedMutexGuard<()>>, ChangePlan),
    /// The mutation matches existing state; nothing to commit.
    Noop,
}

/// Serializes mutations per queue and owns the commit/publish pipeline.
/// Cloning shares the coordinator.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn LedgerStore>,
    router: BoardRouter,
    /// Per-queue serialization domains. Board-structural mutations
    /// (MoveQueue) lock the board ID in the same registry; board and queue
    /// IDs never collide.
    queue_locks: LockRegistry,
    /// Per-board guards spanning sequence assignment, commit, and publish.
    commit_guards: LockRegistry,
}

impl Coordinator {
    pub fn new(store: Arc<dyn LedgerStore>, router: BoardRouter) -> Self {
        Self {
            store,
            router,
            queue_locks: LockRegistry::new(),
            commit_guards: LockRegistry::new(),
        }
    }

    /// The fan-out router this coordinator publishes to.
    pub fn router(&self) -> &BoardRouter {
        &self.router
    }

    /// Apply one mutation under full serialization and return what
    /// committed.
    ///
    /// Blocks (suspends) only while waiting for the touched queues'
    /// serialization. Idempotent facet mutations that match existing state
    /// return a no-op outcome: no record, no broadcast, no notifications.
    pub async fn submit(&self, actor_id: Uuid, mutation: Mutation) -> Result<CommitOutcome> {
        let started = Instant::now();
        let board_id = mutation.board_id();
        let op = mutation.name();

        let result = self.submit_inner(actor_id, &mutation).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(outcome) if outcome.is_noop() => {
                debug!(
                    subsystem = "engine",
                    component = "coordinator",
                    op,
                    board_id = %board_id,
                    actor_id = %actor_id,
                    duration_ms,
                    "Mutation was a no-op"
                );
            }
            Ok(outcome) => {
                info!(
                    subsystem = "engine",
                    component = "coordinator",
                    op,
                    board_id = %board_id,
                    actor_id = %actor_id,
                    seq = outcome.record.as_ref().map(|r| r.seq),
                    duration_ms,
                    "Mutation committed"
                );
            }
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    component = "coordinator",
                    op,
                    board_id = %board_id,
                    actor_id = %actor_id,
                    duration_ms,
                    error = %e,
                    "Mutation rejected"
                );
            }
        }
        result
    }

    async fn submit_inner(&self, actor_id: Uuid, mutation: &Mutation) -> Result<CommitOutcome> {
        let board_id = mutation.board_id();
        let (queue_guards, plan) = match self.plan_under_locks(actor_id, mutation).await? {
            Planned::Commit(guards, plan) => (guards, plan),
            Planned::Noop => return Ok(CommitOutcome::noop(board_id)),
        };

        // Commit guard comes strictly after the queue locks in the global
        // lock order. It aligns publish order with sequence order when two
        // queues of one board commit around the same time.
        let commit_guard = self.commit_guards.acquire(board_id).await;

        // Detached section: once a mutation starts applying it runs to
        // completion, even if the caller has already hung up.
        let store = self.store.clone();
        let router = self.router.clone();
        let handle = tokio::spawn(async move {
            let _queue_guards = queue_guards;
            let _commit_guard = commit_guard;
            let committed = store.commit(plan).await?;
            router.publish(BoardEvent::for_record(&committed.record)).await;
            Ok::<_, Error>(committed)
        });
        let committed = handle
            .await
            .map_err(|e| Error::Internal(format!("commit task failed: {e}")))??;

        Ok(CommitOutcome {
            board_id,
            item: committed.item,
            record: Some(committed.record),
            notifications_created: committed.notifications.len(),
        })
    }

    /// Resolve and acquire the mutation's serialization domain, then build
    /// its plan against state read under those locks.
    async fn plan_under_locks(&self, actor_id: Uuid, mutation: &Mutation) -> Result<Planned> {
        let board_id = mutation.board_id();
        // Missing board reads as BoardNotFound, not as whatever child
        // resolution happens to fail first.
        if !self.store.board_exists(board_id).await? {
            return Err(Error::BoardNotFound(board_id));
        }
        match mutation {
            Mutation::CreateItem { queue_id, .. } => {
                let guard = self.queue_locks.acquire(*queue_id).await;
                let queue = self.queue_meta_on_board(*queue_id, board_id).await?;
                Ok(Planned::Commit(
                    vec![guard],
                    self.plan_create(actor_id, mutation, &queue),
                ))
            }

            Mutation::MoveQueue {
                queue_id, to_order, ..
            } => {
                // Board-structural domain: one lock per board, in the same
                // registry as the queue locks.
                let guard = self.queue_locks.acquire(board_id).await;
                let queue = self.queue_meta_on_board(*queue_id, board_id).await?;
                let order = self.store.queue_order(board_id).await?;
                let from = order
                    .iter()
                    .position(|id| *id == *queue_id)
                    .ok_or(Error::QueueNotFound(*queue_id))? as i32;
                let to = relocation_slot(order.len(), *to_order);
                let plan = ChangePlan {
                    board_id,
                    change: PlannedChange::ReorderQueue {
                        board_id,
                        queue_id: *queue_id,
                        from,
                        to,
                    },
                    record: RecordDraft {
                        id: new_v7(),
                        board_id,
                        item_id: None,
                        actor_id,
                        kind: ChangeKind::Moved,
                        summary: format!("moved queue \"{}\"", queue.name),
                    },
                    recipients: recipients(mutation, &[], actor_id),
                };
                Ok(Planned::Commit(vec![guard], plan))
            }

            // Item-addressed mutations: resolve the owning queue, lock it,
            // then re-verify ownership under the lock. A concurrent move
            // committed in the gap sends us around again.
            _ => {
                let item_id = mutation
                    .item_id()
                    .ok_or_else(|| Error::Internal("mutation addresses no item".into()))?;
                for _ in 0..OWNER_RESOLVE_RETRIES {
                    let resolved = self.item_meta_on_board(item_id, board_id).await?;
                    let guards = match mutation {
                        Mutation::MoveItem { to_queue, .. } => {
                            self.queue_locks.acquire_pair(resolved.queue_id, *to_queue).await
                        }
                        _ => vec![self.queue_locks.acquire(resolved.queue_id).await],
                    };
                    let meta = self.item_meta_on_board(item_id, board_id).await?;
                    if meta.queue_id != resolved.queue_id {
                        debug!(
                            subsystem = "engine",
                            component = "coordinator",
                            op = mutation.name(),
                            item_id = %item_id,
                            queue_id = %meta.queue_id,
                            "Item moved while locking; re-resolving owner"
                        );
                        continue;
                    }
                    return Ok(match self.plan_item(actor_id, mutation, meta).await? {
                        Some(plan) => Planned::Commit(guards, plan),
                        None => Planned::Noop,
                    });
                }
                Err(Error::Internal(format!(
                    "could not pin owning queue for item {item_id}"
                )))
            }
        }
    }

    /// Build the plan for an item-addressed mutation whose owning queue is
    /// locked and verified. Returns `None` for idempotent no-ops. The queue
    /// guards stay with the caller.
    async fn plan_item(
        &self,
        actor_id: Uuid,
        mutation: &Mutation,
        meta: ItemMeta,
    ) -> Result<Option<ChangePlan>> {
        let board_id = mutation.board_id();
        let wrap = |change: PlannedChange, record: RecordDraft| ChangePlan {
            board_id,
            change,
            record,
            recipients: recipients(mutation, &meta.assignees, actor_id),
        };
        let draft = |kind: ChangeKind, item_id: Option<Uuid>, summary: String| RecordDraft {
            id: new_v7(),
            board_id,
            item_id,
            actor_id,
            kind,
            summary,
        };

        let plan = match mutation {
            Mutation::UpdateItem {
                title,
                body,
                due_at,
                completed,
                ..
            } => {
                let patch = ItemPatch {
                    title: title.clone(),
                    body: body.clone(),
                    due_at: *due_at,
                    completed: *completed,
                };
                if patch.is_empty() {
                    return Ok(None);
                }
                // Completion takes precedence over a generic field edit.
                let (kind, verb) = if patch.completed == Some(true) {
                    (ChangeKind::Completed, "completed")
                } else {
                    (ChangeKind::Updated, "updated")
                };
                let shown_title = patch.title.as_deref().unwrap_or(&meta.title);
                let summary = format!("{verb} \"{shown_title}\"");
                wrap(
                    PlannedChange::Patch {
                        item_id: meta.id,
                        patch,
                    },
                    draft(kind, Some(meta.id), summary),
                )
            }

            Mutation::MoveItem {
                to_queue,
                to_position,
                ..
            } => {
                let dest = self.queue_meta_on_board(*to_queue, board_id).await?;
                let summary = format!("moved \"{}\" to \"{}\"", meta.title, dest.name);
                let change = if dest.id == meta.queue_id {
                    PlannedChange::MoveWithin {
                        queue_id: meta.queue_id,
                        item_id: meta.id,
                        from: meta.position,
                        to: relocation_slot(dest.len, *to_position),
                    }
                } else {
                    PlannedChange::MoveAcross {
                        item_id: meta.id,
                        from_queue: meta.queue_id,
                        from: meta.position,
                        to_queue: dest.id,
                        to: insertion_slot(dest.len, *to_position),
                    }
                };
                wrap(change, draft(ChangeKind::Moved, Some(meta.id), summary))
            }

            Mutation::DeleteItem { .. } => wrap(
                PlannedChange::Remove {
                    queue_id: meta.queue_id,
                    item_id: meta.id,
                    position: meta.position,
                },
                // History survives the item; the record carries no item
                // reference from the start.
                draft(
                    ChangeKind::Updated,
                    None,
                    format!("deleted \"{}\"", meta.title),
                ),
            ),

            Mutation::AddAssignee { user_id, .. } => {
                if meta.assignees.contains(user_id) {
                    return Ok(None);
                }
                wrap(
                    PlannedChange::Assign {
                        item_id: meta.id,
                        user_id: *user_id,
                    },
                    draft(
                        ChangeKind::MemberAdded,
                        Some(meta.id),
                        format!("added an assignee to \"{}\"", meta.title),
                    ),
                )
            }

            Mutation::RemoveAssignee { user_id, .. } => {
                if !meta.assignees.contains(user_id) {
                    return Ok(None);
                }
                wrap(
                    PlannedChange::Unassign {
                        item_id: meta.id,
                        user_id: *user_id,
                    },
                    draft(
                        ChangeKind::Updated,
                        Some(meta.id),
                        format!("removed an assignee from \"{}\"", meta.title),
                    ),
                )
            }

            Mutation::AddLabel { label, .. } => {
                if meta.labels.contains(label) {
                    return Ok(None);
                }
                wrap(
                    PlannedChange::Label {
                        item_id: meta.id,
                        label: label.clone(),
                    },
                    draft(
                        ChangeKind::Updated,
                        Some(meta.id),
                        format!("added label \"{label}\" to \"{}\"", meta.title),
                    ),
                )
            }

            Mutation::RemoveLabel { label, .. } => {
                if !meta.labels.contains(label) {
                    return Ok(None);
                }
                wrap(
                    PlannedChange::Unlabel {
                        item_id: meta.id,
                        label: label.clone(),
                    },
                    draft(
                        ChangeKind::Updated,
                        Some(meta.id),
                        format!("removed label \"{label}\" from \"{}\"", meta.title),
                    ),
                )
            }

            Mutation::AddComment { body, .. } => wrap(
                PlannedChange::Comment {
                    comment: NewComment {
                        id: new_v7(),
                        item_id: meta.id,
                        author_id: actor_id,
                        body: body.clone(),
                    },
                },
                draft(
                    ChangeKind::Commented,
                    Some(meta.id),
                    format!("commented on \"{}\"", meta.title),
                ),
            ),

            Mutation::CreateItem { .. } | Mutation::MoveQueue { .. } => {
                return Err(Error::Internal("not an item-addressed mutation".into()))
            }
        };
        Ok(Some(plan))
    }

    fn plan_create(&self, actor_id: Uuid, mutation: &Mutation, queue: &QueueMeta) -> ChangePlan {
        let Mutation::CreateItem {
            board_id,
            queue_id,
            title,
            body,
            assignees,
            labels,
            due_at,
        } = mutation
        else {
            unreachable!("plan_create called for {}", mutation.name());
        };
        let item_id = new_v7();
        // Creation always appends; position-targeted placement is a move.
        let position = insertion_slot(queue.len, queue.len as i32);
        ChangePlan {
            board_id: *board_id,
            change: PlannedChange::Insert {
                item: NewItem {
                    id: item_id,
                    board_id: *board_id,
                    queue_id: *queue_id,
                    title: title.clone(),
                    body: body.clone(),
                    position,
                    due_at: *due_at,
                    assignees: assignees.clone(),
                    labels: labels.clone(),
                },
            },
            record: RecordDraft {
                id: new_v7(),
                board_id: *board_id,
                item_id: Some(item_id),
                actor_id,
                kind: ChangeKind::Created,
                summary: format!("created \"{}\" in \"{}\"", title, queue.name),
            },
            recipients: recipients(mutation, assignees, actor_id),
        }
    }

    /// Queue facts, rejecting queues outside the mutation's board. A queue
    /// on a foreign board is indistinguishable from a missing one to the
    /// caller.
    async fn queue_meta_on_board(&self, queue_id: Uuid, board_id: Uuid) -> Result<QueueMeta> {
        let queue = self.store.queue_meta(queue_id).await?;
        if queue.board_id != board_id {
            return Err(Error::QueueNotFound(queue_id));
        }
        Ok(queue)
    }

    /// Item facts, rejecting items outside the mutation's board.
    async fn item_meta_on_board(&self, item_id: Uuid, board_id: Uuid) -> Result<ItemMeta> {
        let meta = self.store.item_meta(item_id).await?;
        if meta.board_id != board_id {
            return Err(Error::ItemNotFound(item_id));
        }
        Ok(meta)
    }

    /// Repair a queue to dense `0..N-1` under its serialization. Produces no
    /// change record and no broadcast; returns the number of rows repaired.
    pub async fn reindex_queue(&self, queue_id: Uuid) -> Result<u64> {
        let _guard = self.queue_locks.acquire(queue_id).await;
        let repaired = self.store.reindex_queue(queue_id).await?;
        if repaired > 0 {
            warn!(
                subsystem = "engine",
                component = "coordinator",
                op = "reindex_queue",
                queue_id = %queue_id,
                result_count = repaired,
                "Reindex repaired non-dense positions"
            );
        }
        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use laneway_core::{BoardStore, NotificationStore};

    async fn engine() -> (Arc<MemoryStore>, Coordinator) {
        let store = Arc::new(MemoryStore::new());
        let coordinator = Coordinator::new(store.clone(), BoardRouter::new());
        (store, coordinator)
    }

    async fn create_item(
        coordinator: &Coordinator,
        actor: Uuid,
        board_id: Uuid,
        queue_id: Uuid,
        title: &str,
    ) -> laneway_core::Item {
        coordinator
            .submit(
                actor,
                Mutation::CreateItem {
                    board_id,
                    queue_id,
                    title: title.to_string(),
                    body: String::new(),
                    assignees: vec![],
                    labels: vec![],
                    due_at: None,
                },
            )
            .await
            .unwrap()
            .item
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_appends_and_records() {
        let (store, coordinator) = engine().await;
        let actor = Uuid::new_v4();
        let board = store.create_board("b").await.unwrap();
        let queue = store.create_queue(board.id, "Todo").await.unwrap();

        let first = create_item(&coordinator, actor, board.id, queue.id, "a").await;
        let second = create_item(&coordinator, actor, board.id, queue.id, "b").await;
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);

        let records = laneway_core::ActivityLog::by_board(&*store, board.id, None, 10)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, ChangeKind::Created);
        assert_eq!(records[0].seq, 2);
        assert!(records[0].summary.contains("\"b\""));
    }

    #[tokio::test]
    async fn test_create_into_foreign_board_queue_is_not_found() {
        let (store, coordinator) = engine().await;
        let board = store.create_board("mine").await.unwrap();
        let other = store.create_board("theirs").await.unwrap();
        let foreign_queue = store.create_queue(other.id, "Todo").await.unwrap();

        let err = coordinator
            .submit(
                Uuid::new_v4(),
                Mutation::CreateItem {
                    board_id: board.id,
                    queue_id: foreign_queue.id,
                    title: "x".to_string(),
                    body: String::new(),
                    assignees: vec![],
                    labels: vec![],
                    due_at: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QueueNotFound(_)));
    }

    #[tokio::test]
    async fn test_mutation_against_missing_board_is_board_not_found() {
        let (store, coordinator) = engine().await;
        let board = store.create_board("b").await.unwrap();
        let queue = store.create_queue(board.id, "Todo").await.unwrap();

        let err = coordinator
            .submit(
                Uuid::new_v4(),
                Mutation::CreateItem {
                    board_id: Uuid::new_v4(),
                    queue_id: queue.id,
                    title: "x".to_string(),
                    body: String::new(),
                    assignees: vec![],
                    labels: vec![],
                    due_at: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BoardNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_update_is_a_noop() {
        let (store, coordinator) = engine().await;
        let actor = Uuid::new_v4();
        let board = store.create_board("b").await.unwrap();
        let queue = store.create_queue(board.id, "Todo").await.unwrap();
        let item = create_item(&coordinator, actor, board.id, queue.id, "a").await;

        let outcome = coordinator
            .submit(
                actor,
                Mutation::UpdateItem {
                    board_id: board.id,
                    item_id: item.id,
                    title: None,
                    body: None,
                    due_at: None,
                    completed: None,
                },
            )
            .await
            .unwrap();
        assert!(outcome.is_noop());
    }

    #[tokio::test]
    async fn test_completion_takes_precedence_over_edit() {
        let (store, coordinator) = engine().await;
        let actor = Uuid::new_v4();
        let board = store.create_board("b").await.unwrap();
        let queue = store.create_queue(board.id, "Todo").await.unwrap();
        let item = create_item(&coordinator, actor, board.id, queue.id, "a").await;

        let outcome = coordinator
            .submit(
                actor,
                Mutation::UpdateItem {
                    board_id: board.id,
                    item_id: item.id,
                    title: Some("renamed".to_string()),
                    body: None,
                    due_at: None,
                    completed: Some(true),
                },
            )
            .await
            .unwrap();
        let record = outcome.record.unwrap();
        assert_eq!(record.kind, ChangeKind::Completed);
        assert!(record.summary.starts_with("completed"));
        assert!(outcome.item.unwrap().completed);
    }

    #[tokio::test]
    async fn test_delete_clears_item_reference_but_keeps_history() {
        let (store, coordinator) = engine().await;
        let actor = Uuid::new_v4();
        let board = store.create_board("b").await.unwrap();
        let queue = store.create_queue(board.id, "Todo").await.unwrap();
        let item = create_item(&coordinator, actor, board.id, queue.id, "doomed").await;

        let outcome = coordinator
            .submit(
                actor,
                Mutation::DeleteItem {
                    board_id: board.id,
                    item_id: item.id,
                },
            )
            .await
            .unwrap();
        assert!(outcome.item.is_none());
        assert!(outcome.record.unwrap().item_id.is_none());

        // The create record survives, its item reference cleared.
        let records = laneway_core::ActivityLog::by_board(&*store, board.id, None, 10)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.item_id.is_none()));
    }

    #[tokio::test]
    async fn test_move_position_clamps_to_queue_length() {
        let (store, coordinator) = engine().await;
        let actor = Uuid::new_v4();
        let board = store.create_board("b").await.unwrap();
        let todo = store.create_queue(board.id, "Todo").await.unwrap();
        let done = store.create_queue(board.id, "Done").await.unwrap();
        let item = create_item(&coordinator, actor, board.id, todo.id, "a").await;
        create_item(&coordinator, actor, board.id, done.id, "existing").await;

        // Client computed position 99 against a stale snapshot.
        let outcome = coordinator
            .submit(
                actor,
                Mutation::MoveItem {
                    board_id: board.id,
                    item_id: item.id,
                    to_queue: done.id,
                    to_position: 99,
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.item.unwrap().position, 1);
    }

    #[tokio::test]
    async fn test_add_comment_notifies_assignees_not_actor() {
        let (store, coordinator) = engine().await;
        let actor = Uuid::new_v4();
        let watcher = Uuid::new_v4();
        let board = store.create_board("b").await.unwrap();
        let queue = store.create_queue(board.id, "Todo").await.unwrap();
        let item = coordinator
            .submit(
                actor,
                Mutation::CreateItem {
                    board_id: board.id,
                    queue_id: queue.id,
                    title: "a".to_string(),
                    body: String::new(),
                    assignees: vec![actor, watcher],
                    labels: vec![],
                    due_at: None,
                },
            )
            .await
            .unwrap()
            .item
            .unwrap();

        let outcome = coordinator
            .submit(
                actor,
                Mutation::AddComment {
                    board_id: board.id,
                    item_id: item.id,
                    body: "done?".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.notifications_created, 1);
        assert_eq!(
            store.unread_count(watcher).await.unwrap(),
            2 // one from the create, one from the comment
        );
        assert_eq!(store.unread_count(actor).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_move_queue_reorders_display_order() {
        let (store, coordinator) = engine().await;
        let actor = Uuid::new_v4();
        let board = store.create_board("b").await.unwrap();
        let todo = store.create_queue(board.id, "Todo").await.unwrap();
        let doing = store.create_queue(board.id, "Doing").await.unwrap();
        let done = store.create_queue(board.id, "Done").await.unwrap();

        let outcome = coordinator
            .submit(
                actor,
                Mutation::MoveQueue {
                    board_id: board.id,
                    queue_id: done.id,
                    to_order: 0,
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.record.unwrap().kind, ChangeKind::Moved);

        let order = LedgerStore::queue_order(&*store, board.id).await.unwrap();
        assert_eq!(order, vec![done.id, todo.id, doing.id]);
    }

    #[tokio::test]
    async fn test_reindex_on_dense_queue_repairs_nothing() {
        let (store, coordinator) = engine().await;
        let actor = Uuid::new_v4();
        let board = store.create_board("b").await.unwrap();
        let queue = store.create_queue(board.id, "Todo").await.unwrap();
        create_item(&coordinator, actor, board.id, queue.id, "a").await;
        create_item(&coordinator, actor, board.id, queue.id, "b").await;

        assert_eq!(coordinator.reindex_queue(queue.id).await.unwrap(), 0);
        let missing = coordinator.reindex_queue(Uuid::new_v4()).await.unwrap_err();
        assert!(missing.is_not_found());
    }
}
