use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use qline_core::entities::TicketId;

use super::TerminalApiError;
use crate::api::to_response;
use crate::state::AppState;

/// `POST /tickets/{ticket_id}/no-show` — the called customer never appeared.
pub(super) async fn no_show(
    state: State<AppState>,
    Path(ticket_id): Path<TicketId>,
) -> Result<impl IntoResponse, TerminalApiError> {
    let ticket = state.lifecycle.mark_no_show(ticket_id).await?;
    Ok(Json(to_response(&ticket)))
}
