//! Application state shared across all request handlers.

use qline_core::config::DirectoryStore;
use qline_core::events::BoardUpdateSender;
use qline_core::store::TicketStore;
use qline_core::{AssignmentCoordinator, LifecycleController, PerformanceAggregator};
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// Cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Check-in and "next ticket" orchestration.
    pub coordinator: Arc<AssignmentCoordinator>,
    /// Operator actions (finish, no-show, recall, transfer).
    pub lifecycle: Arc<LifecycleController>,
    /// Direct store access for listings.
    pub store: Arc<dyn TicketStore>,
    /// Performance report builder.
    pub reports: Arc<PerformanceAggregator>,
    /// Service directory (reloaded via SIGHUP).
    pub directory: DirectoryStore,
    /// Board update fan-out for WebSocket subscribers.
    pub board_tx: BoardUpdateSender,
}
