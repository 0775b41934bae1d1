use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use qline_core::entities::TicketStatus;
use qline_core::store::TicketStore;
use serde::Deserialize;

use super::AdminApiError;
use crate::api::to_response;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;

/// Query parameters for the ticket listing.
#[derive(Debug, Deserialize)]
pub(super) struct ListTicketsQuery {
    pub status: Option<TicketStatus>,
    pub limit: Option<usize>,
}

/// `GET /tickets` — recent tickets, newest first.
pub(super) async fn list_tickets(
    state: State<AppState>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let tickets = state.store.list(query.status, limit).await?;
    Ok(Json(
        tickets.iter().map(to_response).collect::<Vec<_>>(),
    ))
}
