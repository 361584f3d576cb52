//! Change history feeds.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use laneway_core::{
    defaults::{ACTIVITY_PAGE_LIMIT, ACTIVITY_PAGE_LIMIT_MAX},
    ActivityLog, BoardStore, ChangeRecord,
};

use super::{clamp_limit, ApiError, ListResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BoardActivityQuery {
    pub limit: Option<i64>,
    /// Keyset cursor: return only records with `seq` below this.
    pub before_seq: Option<i64>,
}

/// `GET /api/v1/boards/:id/activity` — a board's history, newest first.
pub async fn board_activity(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Query(query): Query<BoardActivityQuery>,
) -> Result<Json<ListResponse<ChangeRecord>>, ApiError> {
    // A vanished board is a 404, not an empty feed.
    state.boards.get_board(board_id).await?;
    let limit = clamp_limit(query.limit, ACTIVITY_PAGE_LIMIT, ACTIVITY_PAGE_LIMIT_MAX);
    let records = state
        .activity
        .by_board(board_id, query.before_seq, limit)
        .await?;
    Ok(Json(ListResponse::new(records, limit)))
}

#[derive(Debug, Deserialize)]
pub struct UserActivityQuery {
    pub board_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// `GET /api/v1/users/:id/activity` — changes the user authored, newest
/// first, optionally scoped to one board.
pub async fn user_activity(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<UserActivityQuery>,
) -> Result<Json<ListResponse<ChangeRecord>>, ApiError> {
    let limit = clamp_limit(query.limit, ACTIVITY_PAGE_LIMIT, ACTIVITY_PAGE_LIMIT_MAX);
    let records = state
        .activity
        .by_actor(user_id, query.board_id, limit)
        .await?;
    Ok(Json(ListResponse::new(records, limit)))
}
