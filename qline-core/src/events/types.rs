//! Event type definitions.

use crate::entities::TicketId;
use serde::Serialize;
use uuid::Uuid;

/// A lifecycle transition that collaborators may want to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
    /// A ticket entered the waiting pool via check-in.
    Issued {
        ticket_id: TicketId,
        number: String,
        service_id: Uuid,
    },
    /// A service point claimed the ticket.
    Called {
        ticket_id: TicketId,
        number: String,
        service_id: Uuid,
        point_id: Uuid,
        provider_id: Uuid,
    },
    /// The same ticket was called again.
    Recalled {
        ticket_id: TicketId,
        number: String,
        point_id: Option<Uuid>,
    },
    /// Service completed.
    Finished {
        ticket_id: TicketId,
        number: String,
        point_id: Option<Uuid>,
    },
    /// The called customer never appeared.
    NoShow { ticket_id: TicketId, number: String },
    /// The ticket went back to the waiting pool. `requested_point_id` names
    /// the point the operator sent it towards; eligibility is still decided
    /// by the service mapping alone.
    Transferred {
        ticket_id: TicketId,
        number: String,
        from_point_id: Option<Uuid>,
        requested_point_id: Uuid,
    },
}

impl TicketEvent {
    pub fn number(&self) -> &str {
        match self {
            TicketEvent::Issued { number, .. }
            | TicketEvent::Called { number, .. }
            | TicketEvent::Recalled { number, .. }
            | TicketEvent::Finished { number, .. }
            | TicketEvent::NoShow { number, .. }
            | TicketEvent::Transferred { number, .. } => number,
        }
    }
}

/// What waiting-room displays render: the raw event plus a ready-made
/// announcement line for call and recall.
#[derive(Debug, Clone, Serialize)]
pub struct BoardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<String>,
    pub event: TicketEvent,
}
