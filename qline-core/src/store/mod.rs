//! Ticket storage.
//!
//! The store is the single shared mutable resource of the engine. Two
//! backends implement the same contract: [`MemoryTicketStore`] for
//! single-process deployments and tests, [`PgTicketStore`] for durable
//! multi-process deployments. Both guarantee:
//!
//! - `claim_oldest_eligible` hands any given ticket to exactly one caller,
//!   no matter how many points race for it; a loser gets the next-oldest
//!   eligible ticket or nothing. Contention is scoped to individual tickets
//!   (try-lock skip in memory, `FOR UPDATE SKIP LOCKED` in Postgres), never
//!   a store-wide lock.
//! - `apply_transition` validates against the current status via the pure
//!   transition function and lands the whole patch or nothing.

mod memory;
mod postgres;

pub use memory::MemoryTicketStore;
pub use postgres::{PgSequenceAllocator, PgTicketStore};

use crate::entities::{NewTicket, Ticket, TicketId, TicketStatus};
use crate::error::EngineError;
use crate::lifecycle::LifecycleEvent;
use async_trait::async_trait;
use uuid::Uuid;

/// Durable mapping from ticket identity to ticket state.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Create a ticket in `Waiting` with `issued_at = now`.
    async fn insert(&self, new: NewTicket) -> Result<Ticket, EngineError>;

    /// Fetch a ticket by id.
    async fn get(&self, id: TicketId) -> Result<Ticket, EngineError>;

    /// Atomically claim the oldest waiting ticket whose service is in
    /// `eligible_services`: smallest `(issued_at, id)` wins, and the ticket
    /// moves to `Called` bound to `point_id`/`provider_id`. `None` when no
    /// eligible waiting ticket exists, which is a normal outcome.
    async fn claim_oldest_eligible(
        &self,
        point_id: Uuid,
        eligible_services: &[Uuid],
        provider_id: Uuid,
    ) -> Result<Option<Ticket>, EngineError>;

    /// Validate `event` against the ticket's current status and apply the
    /// resulting patch atomically. Returns the updated ticket.
    async fn apply_transition(
        &self,
        id: TicketId,
        event: LifecycleEvent,
    ) -> Result<Ticket, EngineError>;

    /// Recent tickets, newest first, optionally filtered by status.
    async fn list(
        &self,
        status: Option<TicketStatus>,
        limit: usize,
    ) -> Result<Vec<Ticket>, EngineError>;

    /// Waiting tickets for the given services in FIFO order
    /// (`(issued_at, id)` ascending).
    async fn list_waiting(&self, service_ids: &[Uuid]) -> Result<Vec<Ticket>, EngineError>;

    /// All finished tickets, for performance aggregation.
    async fn list_finished(&self) -> Result<Vec<Ticket>, EngineError>;
}
