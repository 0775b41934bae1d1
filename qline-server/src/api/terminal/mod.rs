//! Terminal API handlers.
//!
//! These endpoints are called by service-point terminals (the operator's
//! screen at a counter).
//!
//! # Endpoints
//!
//! - `POST /points/{point_id}/next`      – claim the next eligible ticket
//! - `POST /tickets/{id}/finish`         – record a completed service
//! - `POST /tickets/{id}/no-show`        – record a no-show
//! - `POST /tickets/{id}/recall`         – call the same ticket again
//! - `POST /tickets/{id}/transfer`       – send the ticket back to the pool

use axum::{Router, http::StatusCode, response::IntoResponse, routing::post};
use qline_core::EngineError;

use crate::state::AppState;

mod call_next;
mod finish;
mod no_show;
mod recall;
mod transfer;

/// Build the Terminal API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/points/{point_id}/next", post(call_next::call_next))
        .route("/tickets/{ticket_id}/finish", post(finish::finish))
        .route("/tickets/{ticket_id}/no-show", post(no_show::no_show))
        .route("/tickets/{ticket_id}/recall", post(recall::recall))
        .route("/tickets/{ticket_id}/transfer", post(transfer::transfer))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Terminal API handlers.
#[derive(Debug)]
enum TerminalApiError {
    /// An engine operation failed.
    Engine(EngineError),
}

impl From<EngineError> for TerminalApiError {
    fn from(e: EngineError) -> Self {
        TerminalApiError::Engine(e)
    }
}

impl IntoResponse for TerminalApiError {
    fn into_response(self) -> axum::response::Response {
        let TerminalApiError::Engine(e) = self;
        match e {
            EngineError::TicketNotFound(_) => {
                (StatusCode::NOT_FOUND, "ticket not found").into_response()
            }
            EngineError::PointNotFound(_) => {
                (StatusCode::NOT_FOUND, "service point not found").into_response()
            }
            EngineError::InvalidTransition { status, event } => {
                tracing::warn!(%status, event, "rejected illegal ticket transition");
                (
                    StatusCode::CONFLICT,
                    format!("cannot {event} a {status} ticket"),
                )
                    .into_response()
            }
            EngineError::AllocationConflict => (
                StatusCode::CONFLICT,
                "the queue is busy, please try again",
            )
                .into_response(),
            other => {
                tracing::error!(error = %other, "Terminal API engine error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
