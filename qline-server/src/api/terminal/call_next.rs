use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use super::TerminalApiError;
use crate::api::to_response;
use crate::state::AppState;

/// Request body for claiming the next ticket.
#[derive(Debug, Deserialize)]
pub(super) struct CallNextRequest {
    pub provider_id: Uuid,
}

/// `POST /points/{point_id}/next` — claim the oldest eligible ticket.
///
/// Returns `204 No Content` when nothing is waiting. That is the common
/// idle case, not an error; terminals poll at their own cadence.
pub(super) async fn call_next(
    state: State<AppState>,
    Path(point_id): Path<Uuid>,
    Json(body): Json<CallNextRequest>,
) -> Result<impl IntoResponse, TerminalApiError> {
    match state
        .coordinator
        .request_next(point_id, body.provider_id)
        .await?
    {
        Some(ticket) => Ok(Json(to_response(&ticket)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
