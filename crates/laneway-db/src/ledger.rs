//! Transactional executor for the position ledger.
//!
//! `commit` applies one [`ChangePlan`] — position delta, change record,
//! notifications — in a single transaction. Placement was already resolved
//! by the engine under its locks; this module only shifts neighbors and
//! writes rows exactly as the plan dictates.
//!
//! The per-board sequence is assigned here, via `UPDATE .. RETURNING` on
//! the board row. That UPDATE takes the row lock, so even if two commits
//! for one board ever raced past the engine, the database would still
//! serialize their sequences.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use laneway_core::{
    new_v7, ChangePlan, ChangeRecord, CommittedChange, Error, Item, ItemMeta, LedgerStore,
    Notification, PlannedChange, QueueMeta, Result,
};

use crate::activity::kind_to_str;

const ITEM_COLUMNS: &str =
    "id, board_id, queue_id, title, body, position, completed, due_at, created_at, updated_at";

/// PostgreSQL implementation of LedgerStore.
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Create a new PgLedgerStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &PgRow) -> Item {
        Item {
            id: row.get("id"),
            board_id: row.get("board_id"),
            queue_id: row.get("queue_id"),
            title: row.get("title"),
            body: row.get("body"),
            position: row.get("position"),
            completed: row.get("completed"),
            due_at: row.get("due_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    async fn fetch_item(tx: &mut Transaction<'_, Postgres>, item_id: Uuid) -> Result<Item> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM item WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ItemNotFound(item_id))?;
        Ok(Self::row_to_item(&row))
    }

    /// Bump `updated_at` and return the fresh row in one statement.
    async fn touch_item(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Item> {
        let row = sqlx::query(&format!(
            "UPDATE item SET updated_at = $2 WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item_id)
        .bind(now)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ItemNotFound(item_id))?;
        Ok(Self::row_to_item(&row))
    }

    /// Apply the position delta of a plan. Returns the post-commit item
    /// state for item-affecting changes.
    async fn apply_change(
        tx: &mut Transaction<'_, Postgres>,
        change: &PlannedChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Item>> {
        match change {
            PlannedChange::Insert { item } => {
                // Vacuous for appends, but the contract covers arbitrary
                // final positions.
                sqlx::query(
                    "UPDATE item SET position = position + 1
                     WHERE queue_id = $1 AND position >= $2",
                )
                .bind(item.queue_id)
                .bind(item.position)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;

                let row = sqlx::query(&format!(
                    "INSERT INTO item
                         (id, board_id, queue_id, title, body, position, completed, due_at, created_at, updated_at)
                     VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8, $8)
                     RETURNING {ITEM_COLUMNS}"
                ))
                .bind(item.id)
                .bind(item.board_id)
                .bind(item.queue_id)
                .bind(&item.title)
                .bind(&item.body)
                .bind(item.position)
                .bind(item.due_at)
                .bind(now)
                .fetch_one(&mut **tx)
                .await
                .map_err(Error::Database)?;

                // Request-supplied facet lists may contain duplicates.
                for user_id in &item.assignees {
                    sqlx::query(
                        "INSERT INTO item_assignee (item_id, user_id, added_at)
                         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
                    )
                    .bind(item.id)
                    .bind(user_id)
                    .bind(now)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                }
                for label in &item.labels {
                    sqlx::query(
                        "INSERT INTO item_label (item_id, label, added_at)
                         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
                    )
                    .bind(item.id)
                    .bind(label)
                    .bind(now)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                }

                Ok(Some(Self::row_to_item(&row)))
            }

            PlannedChange::Remove {
                queue_id,
                item_id,
                position,
            } => {
                // Activity rows pointing at the item get their reference
                // cleared by the FK (ON DELETE SET NULL).
                sqlx::query("DELETE FROM item WHERE id = $1")
                    .bind(item_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                sqlx::query(
                    "UPDATE item SET position = position - 1
                     WHERE queue_id = $1 AND position > $2",
                )
                .bind(queue_id)
                .bind(position)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
                Ok(None)
            }

            PlannedChange::MoveWithin {
                queue_id,
                item_id,
                from,
                to,
            } => {
                // Shift the span between the vacated and the target slot;
                // both ranges exclude the moving item itself.
                if from < to {
                    sqlx::query(
                        "UPDATE item SET position = position - 1
                         WHERE queue_id = $1 AND position > $2 AND position <= $3",
                    )
                    .bind(queue_id)
                    .bind(from)
                    .bind(to)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                } else if from > to {
                    sqlx::query(
                        "UPDATE item SET position = position + 1
                         WHERE queue_id = $1 AND position >= $3 AND position < $2",
                    )
                    .bind(queue_id)
                    .bind(from)
                    .bind(to)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                }

                let row = sqlx::query(&format!(
                    "UPDATE item SET position = $2, updated_at = $3
                     WHERE id = $1 RETURNING {ITEM_COLUMNS}"
                ))
                .bind(item_id)
                .bind(to)
                .bind(now)
                .fetch_one(&mut **tx)
                .await
                .map_err(Error::Database)?;
                Ok(Some(Self::row_to_item(&row)))
            }

            PlannedChange::MoveAcross {
                item_id,
                from_queue,
                from,
                to_queue,
                to,
            } => {
                // Close the source gap, open one at the destination.
                sqlx::query(
                    "UPDATE item SET position = position - 1
                     WHERE queue_id = $1 AND position > $2",
                )
                .bind(from_queue)
                .bind(from)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
                sqlx::query(
                    "UPDATE item SET position = position + 1
                     WHERE queue_id = $1 AND position >= $2",
                )
                .bind(to_queue)
                .bind(to)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;

                let row = sqlx::query(&format!(
                    "UPDATE item SET queue_id = $2, position = $3, updated_at = $4
                     WHERE id = $1 RETURNING {ITEM_COLUMNS}"
                ))
                .bind(item_id)
                .bind(to_queue)
                .bind(to)
                .bind(now)
                .fetch_one(&mut **tx)
                .await
                .map_err(Error::Database)?;
                Ok(Some(Self::row_to_item(&row)))
            }

            PlannedChange::Patch { item_id, patch } => {
                let row = sqlx::query(&format!(
                    "UPDATE item SET
                         title = COALESCE($2, title),
                         body = COALESCE($3, body),
                         due_at = COALESCE($4, due_at),
                         completed = COALESCE($5, completed),
                         updated_at = $6
                     WHERE id = $1 RETURNING {ITEM_COLUMNS}"
                ))
                .bind(item_id)
                .bind(&patch.title)
                .bind(&patch.body)
                .bind(patch.due_at)
                .bind(patch.completed)
                .bind(now)
                .fetch_optional(&mut **tx)
                .await
                .map_err(Error::Database)?
                .ok_or(Error::ItemNotFound(*item_id))?;
                Ok(Some(Self::row_to_item(&row)))
            }

            PlannedChange::Assign { item_id, user_id } => {
                sqlx::query(
                    "INSERT INTO item_assignee (item_id, user_id, added_at) VALUES ($1, $2, $3)",
                )
                .bind(item_id)
                .bind(user_id)
                .bind(now)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
                Ok(Some(Self::touch_item(tx, *item_id, now).await?))
            }

            PlannedChange::Unassign { item_id, user_id } => {
                sqlx::query("DELETE FROM item_assignee WHERE item_id = $1 AND user_id = $2")
                    .bind(item_id)
                    .bind(user_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                Ok(Some(Self::touch_item(tx, *item_id, now).await?))
            }

            PlannedChange::Label { item_id, label } => {
                sqlx::query("INSERT INTO item_label (item_id, label, added_at) VALUES ($1, $2, $3)")
                    .bind(item_id)
                    .bind(label)
                    .bind(now)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                Ok(Some(Self::touch_item(tx, *item_id, now).await?))
            }

            PlannedChange::Unlabel { item_id, label } => {
                sqlx::query("DELETE FROM item_label WHERE item_id = $1 AND label = $2")
                    .bind(item_id)
                    .bind(label)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                Ok(Some(Self::touch_item(tx, *item_id, now).await?))
            }

            PlannedChange::Comment { comment } => {
                sqlx::query(
                    "INSERT INTO item_comment (id, item_id, author_id, body, created_at)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(comment.id)
                .bind(comment.item_id)
                .bind(comment.author_id)
                .bind(&comment.body)
                .bind(now)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
                // Commenting is not an item edit; updated_at stays put.
                Ok(Some(Self::fetch_item(tx, comment.item_id).await?))
            }

            PlannedChange::ReorderQueue {
                board_id,
                queue_id,
                from,
                to,
            } => {
                if from < to {
                    sqlx::query(
                        "UPDATE queue SET display_order = display_order - 1
                         WHERE board_id = $1 AND display_order > $2 AND display_order <= $3",
                    )
                    .bind(board_id)
                    .bind(from)
                    .bind(to)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                } else if from > to {
                    sqlx::query(
                        "UPDATE queue SET display_order = display_order + 1
                         WHERE board_id = $1 AND display_order >= $3 AND display_order < $2",
                    )
                    .bind(board_id)
                    .bind(from)
                    .bind(to)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                }
                sqlx::query("UPDATE queue SET display_order = $2 WHERE id = $1")
                    .bind(queue_id)
                    .bind(to)
                    .execute(&mut **tx)
                    .await
                    .map_err(Error::Database)?;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn board_exists(&self, board_id: Uuid) -> Result<bool> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM board WHERE id = $1")
            .bind(board_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(found.is_some())
    }

    async fn queue_meta(&self, queue_id: Uuid) -> Result<QueueMeta> {
        let row = sqlx::query(
            "SELECT q.id, q.board_id, q.name,
                    (SELECT COUNT(*) FROM item i WHERE i.queue_id = q.id) AS item_count
             FROM queue q WHERE q.id = $1",
        )
        .bind(queue_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::QueueNotFound(queue_id))?;

        Ok(QueueMeta {
            id: row.get("id"),
            board_id: row.get("board_id"),
            name: row.get("name"),
            len: row.get::<i64, _>("item_count") as usize,
        })
    }

    async fn item_meta(&self, item_id: Uuid) -> Result<ItemMeta> {
        let row = sqlx::query(
            "SELECT id, board_id, queue_id, position, title, completed FROM item WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ItemNotFound(item_id))?;

        let assignees: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM item_assignee WHERE item_id = $1 ORDER BY added_at, user_id",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let labels: Vec<String> = sqlx::query_scalar(
            "SELECT label FROM item_label WHERE item_id = $1 ORDER BY added_at, label",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(ItemMeta {
            id: row.get("id"),
            board_id: row.get("board_id"),
            queue_id: row.get("queue_id"),
            position: row.get("position"),
            title: row.get("title"),
            completed: row.get("completed"),
            assignees,
            labels,
        })
    }

    async fn queue_order(&self, board_id: Uuid) -> Result<Vec<Uuid>> {
        sqlx::query_scalar("SELECT id FROM queue WHERE board_id = $1 ORDER BY display_order")
            .bind(board_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn commit(&self, plan: ChangePlan) -> Result<CommittedChange> {
        let start = std::time::Instant::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let now = Utc::now();

        let seq: i64 = sqlx::query_scalar(
            "UPDATE board SET activity_seq = activity_seq + 1 WHERE id = $1 RETURNING activity_seq",
        )
        .bind(plan.board_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::BoardNotFound(plan.board_id))?;

        let item = Self::apply_change(&mut tx, &plan.change, now).await?;

        sqlx::query(
            "INSERT INTO activity (id, board_id, item_id, actor_id, kind, summary, seq, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(plan.record.id)
        .bind(plan.record.board_id)
        .bind(plan.record.item_id)
        .bind(plan.record.actor_id)
        .bind(kind_to_str(plan.record.kind))
        .bind(&plan.record.summary)
        .bind(seq)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let mut notifications = Vec::with_capacity(plan.recipients.len());
        for recipient_id in &plan.recipients {
            let id = new_v7();
            sqlx::query(
                "INSERT INTO notification (id, activity_id, recipient_id, read, created_at)
                 VALUES ($1, $2, $3, FALSE, $4)",
            )
            .bind(id)
            .bind(plan.record.id)
            .bind(recipient_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
            notifications.push(Notification {
                id,
                activity_id: plan.record.id,
                recipient_id: *recipient_id,
                read: false,
                created_at: now,
            });
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "ledger",
            op = "commit",
            board_id = %plan.board_id,
            seq,
            duration_ms = start.elapsed().as_millis() as u64,
            "Committed change plan"
        );

        Ok(CommittedChange {
            record: ChangeRecord {
                id: plan.record.id,
                board_id: plan.record.board_id,
                item_id: plan.record.item_id,
                actor_id: plan.record.actor_id,
                kind: plan.record.kind,
                summary: plan.record.summary,
                seq,
                created_at: now,
            },
            item,
            notifications,
        })
    }

    async fn reindex_queue(&self, queue_id: Uuid) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM queue WHERE id = $1 FOR UPDATE")
            .bind(queue_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if found.is_none() {
            return Err(Error::QueueNotFound(queue_id));
        }

        // Dense renumbering that preserves relative order; ties (which only
        // exist in damaged data) break by age.
        let changed = sqlx::query(
            "UPDATE item SET position = dense.new_position
             FROM (
                 SELECT id,
                        (ROW_NUMBER() OVER (ORDER BY position, created_at, id) - 1)::INT
                            AS new_position
                 FROM item WHERE queue_id = $1
             ) AS dense
             WHERE item.id = dense.id AND item.position <> dense.new_position",
        )
        .bind(queue_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        let repaired = changed.rows_affected();
        if repaired > 0 {
            warn!(
                subsystem = "db",
                component = "ledger",
                op = "reindex_queue",
                queue_id = %queue_id,
                result_count = repaired,
                "Reindex repaired non-dense positions"
            );
        }
        Ok(repaired)
    }
}
