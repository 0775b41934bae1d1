use super::TicketStatus;
use time::OffsetDateTime;
use uuid::Uuid;

/// Ticket identity. Assigned monotonically at creation, never reused;
/// doubles as the FIFO tie-break key when two tickets share an issue time.
pub type TicketId = i64;

/// A single customer's request for service.
///
/// Created once by the check-in flow and never deleted; every later change
/// goes through a lifecycle transition. `id`, `number`, `service_id` and
/// `issued_at` are immutable for the lifetime of the ticket (transfer does
/// not reset `issued_at`, so a transferred ticket keeps its original queue
/// priority).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Ticket {
    pub id: TicketId,
    /// Human-readable number: service prefix plus zero-padded sequence
    /// within that prefix, e.g. `A007`.
    pub number: String,
    pub service_id: Uuid,
    pub status: TicketStatus,
    pub issued_at: OffsetDateTime,
    pub called_at: Option<OffsetDateTime>,
    pub finished_at: Option<OffsetDateTime>,
    pub service_point_id: Option<Uuid>,
    pub service_provider_id: Option<Uuid>,
    /// The point a transferred ticket was called at before it re-entered
    /// the waiting pool. Kept as provenance once set.
    pub transferred_from_point_id: Option<Uuid>,
}

impl Ticket {
    /// Replace the mutable portion of the ticket with a transition result.
    pub fn apply(&mut self, patch: &TicketPatch) {
        self.status = patch.status;
        self.called_at = patch.called_at;
        self.finished_at = patch.finished_at;
        self.service_point_id = patch.service_point_id;
        self.service_provider_id = patch.service_provider_id;
        self.transferred_from_point_id = patch.transferred_from_point_id;
    }
}

/// Input to `TicketStore::insert`. The store assigns `id` and `issued_at`.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub number: String,
    pub service_id: Uuid,
}

/// The complete set of mutable ticket fields after a transition.
///
/// Applied as a unit: a transition either lands every field or none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPatch {
    pub status: TicketStatus,
    pub called_at: Option<OffsetDateTime>,
    pub finished_at: Option<OffsetDateTime>,
    pub service_point_id: Option<Uuid>,
    pub service_provider_id: Option<Uuid>,
    pub transferred_from_point_id: Option<Uuid>,
}
