use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use qline_core::entities::TicketId;
use serde::Deserialize;
use uuid::Uuid;

use super::TerminalApiError;
use crate::api::to_response;
use crate::state::AppState;

/// Request body for transferring a ticket.
#[derive(Debug, Deserialize)]
pub(super) struct TransferRequest {
    pub to_point_id: Uuid,
}

/// `POST /tickets/{ticket_id}/transfer` — return a called ticket to the
/// waiting pool, aimed at another point.
///
/// The target point is announced to displays, but the ticket stays eligible
/// to every point mapped to its service.
pub(super) async fn transfer(
    state: State<AppState>,
    Path(ticket_id): Path<TicketId>,
    Json(body): Json<TransferRequest>,
) -> Result<impl IntoResponse, TerminalApiError> {
    let ticket = state.lifecycle.transfer(ticket_id, body.to_point_id).await?;
    Ok(Json(to_response(&ticket)))
}
