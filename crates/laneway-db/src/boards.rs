//! Board and queue administration plus snapshot reads.
//!
//! Creation here is bootstrap: no change record, no broadcast. The
//! snapshot is the authoritative read-model clients reconcile against
//! after realtime events; it is assembled in four fixed queries regardless
//! of board size.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use laneway_core::{
    new_v7, Board, BoardSnapshot, BoardStore, Comment, Error, Item, ItemView, Queue, QueueView,
    Result,
};

fn row_to_board(row: &PgRow) -> Board {
    Board {
        id: row.get("id"),
        name: row.get("name"),
        activity_seq: row.get("activity_seq"),
        created_at: row.get("created_at"),
    }
}

fn row_to_queue(row: &PgRow) -> Queue {
    Queue {
        id: row.get("id"),
        board_id: row.get("board_id"),
        name: row.get("name"),
        display_order: row.get("display_order"),
        created_at: row.get("created_at"),
    }
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

/// PostgreSQL implementation of BoardStore.
pub struct PgBoardStore {
    pool: PgPool,
}

impl PgBoardStore {
    /// Create a new PgBoardStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BoardStore for PgBoardStore {
    async fn create_board(&self, name: &str) -> Result<Board> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("board name must not be empty".into()));
        }

        let id = new_v7();
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO board (id, name, activity_seq, created_at)
             VALUES ($1, $2, 0, $3)
             RETURNING id, name, activity_seq, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "boards",
            op = "create_board",
            board_id = %id,
            "Created board"
        );
        Ok(row_to_board(&row))
    }

    async fn get_board(&self, board_id: Uuid) -> Result<Board> {
        let row = sqlx::query("SELECT id, name, activity_seq, created_at FROM board WHERE id = $1")
            .bind(board_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::BoardNotFound(board_id))?;
        Ok(row_to_board(&row))
    }

    async fn list_boards(&self) -> Result<Vec<Board>> {
        let rows = sqlx::query(
            "SELECT id, name, activity_seq, created_at FROM board ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(row_to_board).collect())
    }

    async fn create_queue(&self, board_id: Uuid, name: &str) -> Result<Queue> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("queue name must not be empty".into()));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // The board row lock serializes concurrent queue creations, so two
        // racing bootstraps cannot claim the same display_order.
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM board WHERE id = $1 FOR UPDATE")
            .bind(board_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if found.is_none() {
            return Err(Error::BoardNotFound(board_id));
        }

        let id = new_v7();
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO queue (id, board_id, name, display_order, created_at)
             SELECT $1, $2, $3, COALESCE(MAX(display_order) + 1, 0), $4
             FROM queue WHERE board_id = $2
             RETURNING id, board_id, name, display_order, created_at",
        )
        .bind(id)
        .bind(board_id)
        .bind(name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "boards",
            op = "create_queue",
            board_id = %board_id,
            queue_id = %id,
            "Created queue"
        );
        Ok(row_to_queue(&row))
    }

    async fn snapshot(&self, board_id: Uuid) -> Result<BoardSnapshot> {
        let board = self.get_board(board_id).await?;

        let queue_rows = sqlx::query(
            "SELECT id, board_id, name, display_order, created_at
             FROM queue WHERE board_id = $1
             ORDER BY display_order",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let item_rows = sqlx::query(
            "SELECT id, board_id, queue_id, title, body, position, completed, due_at,
                    created_at, updated_at
             FROM item WHERE board_id = $1
             ORDER BY queue_id, position",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let assignee_rows = sqlx::query(
            "SELECT ia.item_id, ia.user_id
             FROM item_assignee ia
             JOIN item i ON i.id = ia.item_id
             WHERE i.board_id = $1
             ORDER BY ia.added_at, ia.user_id",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let label_rows = sqlx::query(
            "SELECT il.item_id, il.label
             FROM item_label il
             JOIN item i ON i.id = il.item_id
             WHERE i.board_id = $1
             ORDER BY il.added_at, il.label",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut assignees: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in &assignee_rows {
            assignees
                .entry(row.get("item_id"))
                .or_default()
                .push(row.get("user_id"));
        }
        let mut labels: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in &label_rows {
            labels
                .entry(row.get("item_id"))
                .or_default()
                .push(row.get("label"));
        }

        let mut items_by_queue: HashMap<Uuid, Vec<ItemView>> = HashMap::new();
        for row in &item_rows {
            let item = row_to_item(row);
            let view = ItemView {
                assignees: assignees.remove(&item.id).unwrap_or_default(),
                labels: labels.remove(&item.id).unwrap_or_default(),
                item,
            };
            items_by_queue
                .entry(view.item.queue_id)
                .or_default()
                .push(view);
        }

        let queues = queue_rows
            .iter()
            .map(|row| {
                let queue = row_to_queue(row);
                let items = items_by_queue.remove(&queue.id).unwrap_or_default();
                QueueView { queue, items }
            })
            .collect();

        Ok(BoardSnapshot { board, queues })
    }

    async fn list_comments(&self, item_id: Uuid) -> Result<Vec<Comment>> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM item WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        if found.is_none() {
            return Err(Error::ItemNotFound(item_id));
        }

        let rows = sqlx::query(
            "SELECT id, item_id, author_id, body, created_at
             FROM item_comment WHERE item_id = $1
             ORDER BY created_at, id",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| Comment {
                id: row.get("id"),
                item_id: row.get("item_id"),
                author_id: row.get("author_id"),
                body: row.get("body"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
