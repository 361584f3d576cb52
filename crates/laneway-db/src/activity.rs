//! Change history repository.
//!
//! Activity rows are written by the ledger executor inside commit
//! transactions; this repository only reads them back for the feeds.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use laneway_core::{ActivityLog, ChangeKind, ChangeRecord, Error, Result};

/// Convert ChangeKind to its stored string form.
pub(crate) fn kind_to_str(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Created => "created",
        ChangeKind::Updated => "updated",
        ChangeKind::Completed => "completed",
        ChangeKind::Moved => "moved",
        ChangeKind::MemberAdded => "member_added",
        ChangeKind::Commented => "commented",
    }
}

/// Convert a stored string back to ChangeKind.
pub(crate) fn str_to_kind(s: &str) -> ChangeKind {
    match s {
        "created" => ChangeKind::Created,
        "updated" => ChangeKind::Updated,
        "completed" => ChangeKind::Completed,
        "moved" => ChangeKind::Moved,
        "member_added" => ChangeKind::MemberAdded,
        "commented" => ChangeKind::Commented,
        _ => ChangeKind::Updated, // fallback
    }
}

pub(crate) fn row_to_record(row: &PgRow) -> ChangeRecord {
    ChangeRecord {
        id: row.get("id"),
        board_id: row.get("board_id"),
        item_id: row.get("item_id"),
        actor_id: row.get("actor_id"),
        kind: str_to_kind(row.get("kind")),
        summary: row.get("summary"),
        seq: row.get("seq"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of ActivityLog.
pub struct PgActivityLog {
    pool: PgPool,
}

impl PgActivityLog {
    /// Create a new PgActivityLog with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLog for PgActivityLog {
    async fn by_board(
        &self,
        board_id: Uuid,
        before_seq: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>> {
        let rows = sqlx::query(
            "SELECT id, board_id, item_id, actor_id, kind, summary, seq, created_at
             FROM activity
             WHERE board_id = $1 AND ($2::BIGINT IS NULL OR seq < $2)
             ORDER BY seq DESC
             LIMIT $3",
        )
        .bind(board_id)
        .bind(before_seq)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn by_actor(
        &self,
        actor_id: Uuid,
        board_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>> {
        let rows = sqlx::query(
            "SELECT id, board_id, item_id, actor_id, kind, summary, seq, created_at
             FROM activity
             WHERE actor_id = $1 AND ($2::UUID IS NULL OR board_id = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3",
        )
        .bind(actor_id)
        .bind(board_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_storage_form() {
        let kinds = [
            ChangeKind::Created,
            ChangeKind::Updated,
            ChangeKind::Completed,
            ChangeKind::Moved,
            ChangeKind::MemberAdded,
            ChangeKind::Commented,
        ];
        for kind in kinds {
            assert_eq!(str_to_kind(kind_to_str(kind)), kind);
        }
    }

    #[test]
    fn test_unknown_kind_falls_back_to_updated() {
        assert_eq!(str_to_kind("archived"), ChangeKind::Updated);
        assert_eq!(str_to_kind(""), ChangeKind::Updated);
    }

    #[test]
    fn test_storage_form_matches_wire_form() {
        // The stored string and the serde representation must stay in sync;
        // feed consumers see both.
        for kind in [ChangeKind::MemberAdded, ChangeKind::Created] {
            let wire = serde_json::to_string(&kind).unwrap();
            assert_eq!(wire.trim_matches('"'), kind_to_str(kind));
        }
    }
}
