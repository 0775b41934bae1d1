//! Kiosk API handlers.
//!
//! These endpoints are called by check-in kiosks and waiting-room displays.
//!
//! # Endpoints
//!
//! - `GET  /services`      – active services with queue lengths
//! - `POST /tickets`       – issue a ticket (check-in)
//! - `GET  /tickets/{id}`  – ticket status and queue position
//! - `GET  /board/ws`      – WebSocket board update stream

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use qline_core::EngineError;

use crate::state::AppState;

mod board_ws;
mod issue_ticket;
mod list_services;
mod ticket_status;

/// Build the Kiosk API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/services", get(list_services::list_services))
        .route("/tickets", post(issue_ticket::issue_ticket))
        .route("/tickets/{ticket_id}", get(ticket_status::ticket_status))
        .route("/board/ws", get(board_ws::board_ws))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Kiosk API handlers.
#[derive(Debug)]
enum KioskApiError {
    /// An engine operation failed.
    Engine(EngineError),
}

impl From<EngineError> for KioskApiError {
    fn from(e: EngineError) -> Self {
        KioskApiError::Engine(e)
    }
}

impl IntoResponse for KioskApiError {
    fn into_response(self) -> axum::response::Response {
        let KioskApiError::Engine(e) = self;
        match e {
            EngineError::TicketNotFound(_) => {
                (StatusCode::NOT_FOUND, "ticket not found").into_response()
            }
            EngineError::ServiceNotFound(_) => {
                (StatusCode::NOT_FOUND, "service not found").into_response()
            }
            EngineError::ServiceInactive(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "service is not issuing tickets",
            )
                .into_response(),
            EngineError::AllocationConflict => (
                StatusCode::CONFLICT,
                "check-in is busy, please try again",
            )
                .into_response(),
            other => {
                tracing::error!(error = %other, "Kiosk API engine error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
