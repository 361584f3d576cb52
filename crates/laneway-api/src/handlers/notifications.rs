//! Notification lifecycle endpoints. Every route is scoped to the
//! requesting recipient via the actor header.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use laneway_core::{
    defaults::{NOTIFICATION_PAGE_LIMIT, NOTIFICATION_PAGE_LIMIT_MAX},
    Notification, NotificationStore,
};

use super::{actor_id, clamp_limit, ApiError, ListResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

/// `GET /api/v1/notifications` — the actor's notifications, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ListResponse<Notification>>, ApiError> {
    let actor = actor_id(&headers)?;
    let limit = clamp_limit(
        query.limit,
        NOTIFICATION_PAGE_LIMIT,
        NOTIFICATION_PAGE_LIMIT_MAX,
    );
    let notifications = state
        .notifications
        .list_for_recipient(actor, query.unread_only, limit)
        .await?;
    Ok(Json(ListResponse::new(notifications, limit)))
}

/// `POST /api/v1/notifications/:id/read` — 404 unless the notification
/// belongs to the actor.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Notification>, ApiError> {
    let actor = actor_id(&headers)?;
    let notification = state.notifications.mark_read(notification_id, actor).await?;
    Ok(Json(notification))
}

/// `POST /api/v1/notifications/read-all`
pub async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = actor_id(&headers)?;
    let marked = state.notifications.mark_all_read(actor).await?;
    Ok(Json(serde_json::json!({ "marked_read": marked })))
}

/// `GET /api/v1/notifications/unread-count`
pub async fn unread_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = actor_id(&headers)?;
    let unread = state.notifications.unread_count(actor).await?;
    Ok(Json(serde_json::json!({ "unread": unread })))
}
