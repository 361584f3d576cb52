//! Board bootstrap and read-model endpoints.
//!
//! Creation here is administration, not an engine mutation: no change
//! record, no broadcast. The snapshot is the re-sync path clients use after
//! connecting or reconnecting; the realtime feed only tells them when to
//! re-fetch.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use laneway_core::{
    Board, BoardSnapshot, BoardStore, Comment, CreateBoardRequest, CreateQueueRequest, Queue,
};

use super::ApiError;
use crate::AppState;

/// `POST /api/v1/boards`
pub async fn create_board(
    State(state): State<AppState>,
    Json(request): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>), ApiError> {
    let board = state.boards.create_board(&request.name).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// `GET /api/v1/boards`
pub async fn list_boards(State(state): State<AppState>) -> Result<Json<Vec<Board>>, ApiError> {
    Ok(Json(state.boards.list_boards().await?))
}

/// `GET /api/v1/boards/:id` — full snapshot: queues in display order, items
/// in position order, facets attached.
pub async fn board_snapshot(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
) -> Result<Json<BoardSnapshot>, ApiError> {
    Ok(Json(state.boards.snapshot(board_id).await?))
}

/// `POST /api/v1/boards/:id/queues` — append a queue to the board's columns.
pub async fn create_queue(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Json(request): Json<CreateQueueRequest>,
) -> Result<(StatusCode, Json<Queue>), ApiError> {
    let queue = state.boards.create_queue(board_id, &request.name).await?;
    Ok((StatusCode::CREATED, Json(queue)))
}

/// `GET /api/v1/items/:id/comments` — an item's comments, oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.boards.list_comments(item_id).await?))
}

/// `POST /api/v1/queues/:id/reindex` — rewrite a queue's positions to dense
/// `0..N-1`, under the queue's serialization. Returns how many rows were
/// rewritten.
pub async fn reindex_queue(
    State(state): State<AppState>,
    Path(queue_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repaired = state.coordinator.reindex_queue(queue_id).await?;
    Ok(Json(serde_json::json!({ "repaired": repaired })))
}
