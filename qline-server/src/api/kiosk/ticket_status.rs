use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use qline_core::entities::TicketId;
use qline_core::store::TicketStore;
use serde::Serialize;

use super::KioskApiError;
use crate::api::{TicketResponse, to_response};
use crate::state::AppState;

/// Ticket status as shown on the kiosk after check-in.
#[derive(Debug, Serialize)]
pub(super) struct TicketStatusResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    /// Waiting tickets of the same service ahead of this one; absent once
    /// the ticket is no longer waiting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ahead: Option<usize>,
}

/// `GET /tickets/{ticket_id}` — current status and queue position.
pub(super) async fn ticket_status(
    state: State<AppState>,
    Path(ticket_id): Path<TicketId>,
) -> Result<impl IntoResponse, KioskApiError> {
    let ticket = state.store.get(ticket_id).await?;
    let ahead = state.coordinator.queue_position(ticket_id).await?;

    Ok(Json(TicketStatusResponse {
        ticket: to_response(&ticket),
        ahead,
    }))
}
