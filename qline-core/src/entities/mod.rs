pub mod ticket;

pub use ticket::{NewTicket, Ticket, TicketId, TicketPatch};

use serde::{Deserialize, Serialize};

/// Ticket lifecycle status.
///
/// `Waiting` and `Called` are the live states; `NoShow` and `Finished` are
/// terminal. A transferred ticket goes back to `Waiting` with its origin
/// recorded in `transferred_from_point_id`, so no distinct transferred
/// status is ever stored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case", type_name = "ticket_status")]
pub enum TicketStatus {
    Waiting,
    Called,
    NoShow,
    Finished,
}

impl TicketStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::NoShow | TicketStatus::Finished)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TicketStatus::Waiting => "waiting",
            TicketStatus::Called => "called",
            TicketStatus::NoShow => "no_show",
            TicketStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}
