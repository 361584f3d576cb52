//! HTTP handlers for the laneway gateway.
//!
//! Handlers are thin: extract the actor, hand off to the coordinator or a
//! store, map the result. The error mapping here is the only place engine
//! errors become HTTP statuses.

pub mod activity;
pub mod boards;
pub mod mutations;
pub mod notifications;

pub use activity::{board_activity, user_activity};
pub use boards::{
    board_snapshot, create_board, create_queue, list_boards, list_comments, reindex_queue,
};
pub use mutations::submit_mutation;
pub use notifications::{list_notifications, mark_all_read, mark_read, unread_count};

use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use laneway_core::Error;

/// Header carrying the acting user's ID. Identity is taken on faith here;
/// authentication is out of scope for this service.
pub const ACTOR_HEADER: HeaderName = HeaderName::from_static("x-actor-id");

/// Extract and parse the actor header, or reject the request.
pub fn actor_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get(&ACTOR_HEADER)
        .ok_or_else(|| ApiError::BadRequest("missing x-actor-id header".to_string()))?;
    raw.to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| ApiError::BadRequest("x-actor-id must be a UUID".to_string()))
}

/// Resolve a requested page size against a default and a hard cap.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}

// =============================================================================
// LIST RESPONSES
// =============================================================================

/// Pagination metadata attached to list responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub count: usize,
    pub limit: i64,
}

/// Standard envelope for bounded list endpoints.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, limit: i64) -> Self {
        let meta = PaginationMeta {
            count: data.len(),
            limit,
        };
        Self { data, meta }
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Engine(Error),
    BadRequest(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Engine(err) => {
                let status = match &err {
                    e if e.is_not_found() => StatusCode::NOT_FOUND,
                    Error::Conflict(_) => StatusCode::CONFLICT,
                    Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    // The durable store cannot commit: retryable 503, never
                    // a silent retry here.
                    Error::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };
        let body = Json(serde_json::json!({ "error": message }));
        (status, body).into_response()
    }
}
