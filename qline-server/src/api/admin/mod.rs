//! Admin API handlers.
//!
//! Back-office endpoints for supervisors.
//!
//! # Endpoints
//!
//! - `GET /tickets?status=&limit=`             – ticket listing
//! - `GET /reports/performance?group_by=`      – wait/service time report

use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use qline_core::EngineError;

use crate::state::AppState;

mod list_tickets;
mod performance_report;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(list_tickets::list_tickets))
        .route(
            "/reports/performance",
            get(performance_report::performance_report),
        )
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
enum AdminApiError {
    /// An engine operation failed.
    Engine(EngineError),
}

impl From<EngineError> for AdminApiError {
    fn from(e: EngineError) -> Self {
        AdminApiError::Engine(e)
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        let AdminApiError::Engine(e) = self;
        tracing::error!(error = %e, "Admin API engine error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
    }
}
