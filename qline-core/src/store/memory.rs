//! In-process ticket store.
//!
//! Immutable ticket fields (`id`, `number`, `service_id`, `issued_at`) live
//! outside a per-ticket mutex; everything a transition may touch lives
//! inside. The claim path scans eligible candidates in FIFO order and
//! `try_lock`s each one, skipping tickets whose lock is held by another
//! in-flight operation, so concurrent claimants make progress on different
//! tickets instead of queueing behind a store-wide lock. The outer `RwLock`
//! only guards the id map and is held for map access, never across a
//! transition.

use super::TicketStore;
use crate::entities::{NewTicket, Ticket, TicketId, TicketPatch, TicketStatus};
use crate::error::EngineError;
use crate::lifecycle::{self, LifecycleEvent};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// The mutable portion of a ticket, guarded per ticket.
#[derive(Debug, Clone)]
struct TicketState {
    status: TicketStatus,
    called_at: Option<OffsetDateTime>,
    finished_at: Option<OffsetDateTime>,
    service_point_id: Option<Uuid>,
    service_provider_id: Option<Uuid>,
    transferred_from_point_id: Option<Uuid>,
}

impl TicketState {
    fn waiting() -> Self {
        Self {
            status: TicketStatus::Waiting,
            called_at: None,
            finished_at: None,
            service_point_id: None,
            service_provider_id: None,
            transferred_from_point_id: None,
        }
    }

    fn apply(&mut self, patch: &TicketPatch) {
        self.status = patch.status;
        self.called_at = patch.called_at;
        self.finished_at = patch.finished_at;
        self.service_point_id = patch.service_point_id;
        self.service_provider_id = patch.service_provider_id;
        self.transferred_from_point_id = patch.transferred_from_point_id;
    }
}

struct TicketSlot {
    id: TicketId,
    number: String,
    service_id: Uuid,
    issued_at: OffsetDateTime,
    state: Mutex<TicketState>,
}

impl TicketSlot {
    fn view(&self, state: &TicketState) -> Ticket {
        Ticket {
            id: self.id,
            number: self.number.clone(),
            service_id: self.service_id,
            status: state.status,
            issued_at: self.issued_at,
            called_at: state.called_at,
            finished_at: state.finished_at,
            service_point_id: state.service_point_id,
            service_provider_id: state.service_provider_id,
            transferred_from_point_id: state.transferred_from_point_id,
        }
    }
}

struct Inner {
    by_id: BTreeMap<TicketId, Arc<TicketSlot>>,
    next_id: TicketId,
}

/// In-memory [`TicketStore`] backend.
#[derive(Clone)]
pub struct MemoryTicketStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                by_id: BTreeMap::new(),
                next_id: 0,
            })),
        }
    }

    async fn slot(&self, id: TicketId) -> Result<Arc<TicketSlot>, EngineError> {
        self.inner
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or(EngineError::TicketNotFound(id))
    }

    /// Eligible candidate slots in FIFO order. Status is checked later,
    /// under each ticket's own lock.
    async fn candidates(&self, service_ids: &[Uuid]) -> Vec<Arc<TicketSlot>> {
        let inner = self.inner.read().await;
        let mut slots: Vec<Arc<TicketSlot>> = inner
            .by_id
            .values()
            .filter(|slot| service_ids.contains(&slot.service_id))
            .cloned()
            .collect();
        slots.sort_by_key(|slot| (slot.issued_at, slot.id));
        slots
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn insert(&self, new: NewTicket) -> Result<Ticket, EngineError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let state = TicketState::waiting();
        let slot = Arc::new(TicketSlot {
            id: inner.next_id,
            number: new.number,
            service_id: new.service_id,
            issued_at: OffsetDateTime::now_utc(),
            state: Mutex::new(state.clone()),
        });
        let ticket = slot.view(&state);
        inner.by_id.insert(slot.id, slot);
        Ok(ticket)
    }

    async fn get(&self, id: TicketId) -> Result<Ticket, EngineError> {
        let slot = self.slot(id).await?;
        let state = slot.state.lock().await;
        Ok(slot.view(&state))
    }

    async fn claim_oldest_eligible(
        &self,
        point_id: Uuid,
        eligible_services: &[Uuid],
        provider_id: Uuid,
    ) -> Result<Option<Ticket>, EngineError> {
        if eligible_services.is_empty() {
            return Ok(None);
        }

        let event = LifecycleEvent::Claim {
            point_id,
            provider_id,
        };
        for slot in self.candidates(eligible_services).await {
            // Skip tickets another operation holds right now; the next
            // candidate is the next-oldest eligible ticket.
            let Ok(mut state) = slot.state.try_lock() else {
                continue;
            };
            if state.status != TicketStatus::Waiting {
                continue;
            }
            let current = slot.view(&state);
            let patch = lifecycle::transition(&current, &event, OffsetDateTime::now_utc())?;
            state.apply(&patch);
            tracing::debug!(
                ticket_id = slot.id,
                number = %slot.number,
                point_id = %point_id,
                "claimed oldest eligible ticket"
            );
            return Ok(Some(slot.view(&state)));
        }
        Ok(None)
    }

    async fn apply_transition(
        &self,
        id: TicketId,
        event: LifecycleEvent,
    ) -> Result<Ticket, EngineError> {
        let slot = self.slot(id).await?;
        // Blocking is scoped to this one ticket.
        let mut state = slot.state.lock().await;
        let current = slot.view(&state);
        let patch = lifecycle::transition(&current, &event, OffsetDateTime::now_utc())?;
        state.apply(&patch);
        Ok(slot.view(&state))
    }

    async fn list(
        &self,
        status: Option<TicketStatus>,
        limit: usize,
    ) -> Result<Vec<Ticket>, EngineError> {
        let slots: Vec<Arc<TicketSlot>> =
            self.inner.read().await.by_id.values().cloned().collect();
        let mut tickets = Vec::new();
        // Newest first.
        for slot in slots.into_iter().rev() {
            if tickets.len() == limit {
                break;
            }
            let state = slot.state.lock().await;
            if status.is_none_or(|s| state.status == s) {
                tickets.push(slot.view(&state));
            }
        }
        Ok(tickets)
    }

    async fn list_waiting(&self, service_ids: &[Uuid]) -> Result<Vec<Ticket>, EngineError> {
        let mut tickets = Vec::new();
        for slot in self.candidates(service_ids).await {
            let state = slot.state.lock().await;
            if state.status == TicketStatus::Waiting {
                tickets.push(slot.view(&state));
            }
        }
        Ok(tickets)
    }

    async fn list_finished(&self) -> Result<Vec<Ticket>, EngineError> {
        let slots: Vec<Arc<TicketSlot>> =
            self.inner.read().await.by_id.values().cloned().collect();
        let mut tickets = Vec::new();
        for slot in slots {
            let state = slot.state.lock().await;
            if state.status == TicketStatus::Finished {
                tickets.push(slot.view(&state));
            }
        }
        Ok(tickets)
    }
}
