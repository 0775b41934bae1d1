use axum::{Json, extract::State, response::IntoResponse};
use qline_core::store::TicketStore;
use serde::Serialize;
use uuid::Uuid;

use super::KioskApiError;
use crate::state::AppState;

/// One selectable service on the kiosk screen.
#[derive(Debug, Serialize)]
pub(super) struct ServiceEntry {
    pub id: Uuid,
    pub name: String,
    pub prefix: char,
    /// Tickets currently waiting for this service.
    pub waiting: usize,
}

/// `GET /services` — active services with their queue lengths.
pub(super) async fn list_services(
    state: State<AppState>,
) -> Result<impl IntoResponse, KioskApiError> {
    let directory = state.directory.snapshot().await;

    let mut entries = Vec::new();
    for service in directory.active_services() {
        let waiting = state.store.list_waiting(&[service.id]).await?.len();
        entries.push(ServiceEntry {
            id: service.id,
            name: service.name.clone(),
            prefix: service.prefix,
            waiting,
        });
    }

    Ok(Json(entries))
}
