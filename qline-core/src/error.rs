//! Engine error taxonomy.
//!
//! Three families, handled differently by callers:
//!
//! - `AllocationConflict`: transient; a sequence reservation or claim lost a
//!   race. Retried internally with a small fixed bound, then surfaced.
//! - `InvalidTransition`: caller error; the requested state change is not
//!   legal from the ticket's current status. Never retried, never mutates.
//! - `*NotFound` / `ServiceInactive`: lookup errors. Never retried.

use crate::entities::{TicketId, TicketStatus};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the ticket allocation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A sequence reservation or ticket claim lost a race and should be
    /// retried with a bounded number of attempts.
    #[error("allocation conflict, retry")]
    AllocationConflict,

    /// The requested lifecycle event is not legal from the current status.
    #[error("cannot apply {event} to a {status} ticket")]
    InvalidTransition {
        status: TicketStatus,
        event: &'static str,
    },

    /// No ticket with this id exists.
    #[error("ticket {0} not found")]
    TicketNotFound(TicketId),

    /// No service with this id exists in the directory.
    #[error("service {0} not found")]
    ServiceNotFound(Uuid),

    /// No service point with this id exists in the directory.
    #[error("service point {0} not found")]
    PointNotFound(Uuid),

    /// The service exists but is not currently issuing tickets.
    #[error("service {0} is inactive")]
    ServiceInactive(Uuid),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl EngineError {
    /// Whether a bounded retry is worthwhile.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::AllocationConflict)
    }
}
