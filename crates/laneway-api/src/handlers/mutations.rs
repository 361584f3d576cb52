//! Mutation submission: the single write endpoint.

use axum::{extract::State, http::HeaderMap, Json};

use laneway_core::{CommitOutcome, Mutation};

use super::{actor_id, ApiError};
use crate::AppState;

/// `POST /api/v1/mutations`
///
/// Submits one tagged mutation for serialized application. The response is
/// the committed state: the post-commit item (where one exists), the change
/// record with its assigned sequence, and the notification count. A no-op
/// outcome carries no record.
pub async fn submit_mutation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mutation): Json<Mutation>,
) -> Result<Json<CommitOutcome>, ApiError> {
    let actor = actor_id(&headers)?;
    let outcome = state.coordinator.submit(actor, mutation).await?;
    Ok(Json(outcome))
}
