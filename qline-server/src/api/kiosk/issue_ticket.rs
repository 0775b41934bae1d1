use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::KioskApiError;
use crate::api::to_response;
use crate::state::AppState;

/// Request body for check-in.
#[derive(Debug, Deserialize)]
pub(super) struct IssueTicketRequest {
    pub service_id: Uuid,
}

/// `POST /tickets` — issue the next sequential ticket for a service.
pub(super) async fn issue_ticket(
    state: State<AppState>,
    Json(body): Json<IssueTicketRequest>,
) -> Result<impl IntoResponse, KioskApiError> {
    let ticket = state.coordinator.issue_ticket(body.service_id).await?;
    Ok((StatusCode::CREATED, Json(to_response(&ticket))))
}
