//! HTTP API surfaces.
//!
//! Three routers, one concern each:
//!
//! - `kiosk` – check-in and waiting-room displays
//! - `terminal` – service-point operations
//! - `admin` – back-office listings and reports
//!
//! Handlers are thin: they translate between HTTP and the engine and never
//! touch ticket state directly.

pub mod admin;
pub mod kiosk;
pub mod terminal;

use qline_core::entities::{Ticket, TicketStatus};
use serde::Serialize;
use uuid::Uuid;

/// Wire representation of a ticket. Timestamps are unix seconds.
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: i64,
    pub number: String,
    pub service_id: Uuid,
    pub status: TicketStatus,
    pub issued_at: i64,
    pub called_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub service_point_id: Option<Uuid>,
    pub service_provider_id: Option<Uuid>,
    pub transferred_from_point_id: Option<Uuid>,
}

/// Convert a `Ticket` (engine model) into a `TicketResponse` (API model).
pub fn to_response(ticket: &Ticket) -> TicketResponse {
    TicketResponse {
        id: ticket.id,
        number: ticket.number.clone(),
        service_id: ticket.service_id,
        status: ticket.status,
        issued_at: ticket.issued_at.unix_timestamp(),
        called_at: ticket.called_at.map(|t| t.unix_timestamp()),
        finished_at: ticket.finished_at.map(|t| t.unix_timestamp()),
        service_point_id: ticket.service_point_id,
        service_provider_id: ticket.service_provider_id,
        transferred_from_point_id: ticket.transferred_from_point_id,
    }
}
