use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use qline_core::stats::ReportGroupBy;
use serde::Deserialize;

use super::AdminApiError;
use crate::state::AppState;

/// Query parameters for the performance report.
#[derive(Debug, Deserialize)]
pub(super) struct ReportQuery {
    pub group_by: Option<ReportGroupBy>,
}

/// `GET /reports/performance` — completed-ticket counts with average wait
/// and service times, grouped by point (default) or provider.
pub(super) async fn performance_report(
    state: State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let group_by = query.group_by.unwrap_or(ReportGroupBy::Point);
    let rows = state.reports.report(group_by).await?;
    Ok(Json(rows))
}
