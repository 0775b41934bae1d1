use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use qline_core::entities::TicketId;

use super::TerminalApiError;
use crate::api::to_response;
use crate::state::AppState;

/// `POST /tickets/{ticket_id}/recall` — call the same ticket again.
pub(super) async fn recall(
    state: State<AppState>,
    Path(ticket_id): Path<TicketId>,
) -> Result<impl IntoResponse, TerminalApiError> {
    let ticket = state.lifecycle.recall(ticket_id).await?;
    Ok(Json(to_response(&ticket)))
}
