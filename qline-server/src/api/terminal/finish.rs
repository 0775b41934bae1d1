use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use qline_core::entities::TicketId;

use super::TerminalApiError;
use crate::api::to_response;
use crate::state::AppState;

/// `POST /tickets/{ticket_id}/finish` — record a completed service.
pub(super) async fn finish(
    state: State<AppState>,
    Path(ticket_id): Path<TicketId>,
) -> Result<impl IntoResponse, TerminalApiError> {
    let ticket = state.lifecycle.finish(ticket_id).await?;
    Ok(Json(to_response(&ticket)))
}
