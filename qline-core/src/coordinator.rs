//! Check-in and "next ticket" orchestration.
//!
//! The coordinator owns no state of its own: the directory store, sequence
//! allocator, and ticket store are injected, and every operation works on a
//! directory snapshot taken at entry. Transient allocation conflicts are
//! retried here with a small fixed bound; everything else propagates.

use crate::config::DirectoryStore;
use crate::entities::{NewTicket, Ticket, TicketId};
use crate::error::EngineError;
use crate::events::{TicketEvent, TicketEventSender};
use crate::sequence::{format_ticket_number, SequenceAllocator};
use crate::store::TicketStore;
use std::sync::Arc;
use uuid::Uuid;

/// Bounded retries for transient allocation conflicts.
const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

/// Orchestrates ticket issuance and service-point claims.
pub struct AssignmentCoordinator {
    store: Arc<dyn TicketStore>,
    sequences: Arc<dyn SequenceAllocator>,
    directory: DirectoryStore,
    events: TicketEventSender,
}

impl AssignmentCoordinator {
    pub fn new(
        store: Arc<dyn TicketStore>,
        sequences: Arc<dyn SequenceAllocator>,
        directory: DirectoryStore,
        events: TicketEventSender,
    ) -> Self {
        Self {
            store,
            sequences,
            directory,
            events,
        }
    }

    /// Issue a ticket for `service_id`: allocate the next number for the
    /// service's prefix, format it, and insert the ticket in `Waiting`.
    pub async fn issue_ticket(&self, service_id: Uuid) -> Result<Ticket, EngineError> {
        let directory = self.directory.snapshot().await;
        let service = directory
            .service(service_id)
            .ok_or(EngineError::ServiceNotFound(service_id))?;
        if !service.active {
            return Err(EngineError::ServiceInactive(service_id));
        }

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let number = match self.sequences.next_number(service.prefix).await {
                Ok(n) => format_ticket_number(service.prefix, n),
                Err(e) if e.is_transient() => {
                    tracing::warn!(attempt, service_id = %service_id, "sequence allocation conflict");
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self
                .store
                .insert(NewTicket {
                    number: number.clone(),
                    service_id,
                })
                .await
            {
                Ok(ticket) => {
                    tracing::info!(
                        ticket_id = ticket.id,
                        number = %ticket.number,
                        service_id = %service_id,
                        "ticket issued"
                    );
                    self.emit(TicketEvent::Issued {
                        ticket_id: ticket.id,
                        number: ticket.number.clone(),
                        service_id,
                    })
                    .await;
                    return Ok(ticket);
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(attempt, number = %number, "ticket insert conflict");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::AllocationConflict)
    }

    /// Hand the oldest eligible waiting ticket to `point_id`, or `None`
    /// when there is nothing to serve. An empty pool is a normal outcome,
    /// not an error.
    pub async fn request_next(
        &self,
        point_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<Ticket>, EngineError> {
        let directory = self.directory.snapshot().await;
        let eligible = directory
            .eligible_services(point_id)
            .ok_or(EngineError::PointNotFound(point_id))?;
        if eligible.is_empty() {
            return Ok(None);
        }

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            match self
                .store
                .claim_oldest_eligible(point_id, eligible, provider_id)
                .await
            {
                Ok(Some(ticket)) => {
                    tracing::info!(
                        ticket_id = ticket.id,
                        number = %ticket.number,
                        point_id = %point_id,
                        provider_id = %provider_id,
                        "ticket called"
                    );
                    self.emit(TicketEvent::Called {
                        ticket_id: ticket.id,
                        number: ticket.number.clone(),
                        service_id: ticket.service_id,
                        point_id,
                        provider_id,
                    })
                    .await;
                    return Ok(Some(ticket));
                }
                Ok(None) => return Ok(None),
                Err(e) if e.is_transient() => {
                    tracing::warn!(attempt, point_id = %point_id, "claim conflict");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::AllocationConflict)
    }

    /// How many waiting tickets of the same service are ahead of this one;
    /// `None` once the ticket is no longer waiting.
    pub async fn queue_position(&self, ticket_id: TicketId) -> Result<Option<usize>, EngineError> {
        let ticket = self.store.get(ticket_id).await?;
        let waiting = self.store.list_waiting(&[ticket.service_id]).await?;
        Ok(waiting.iter().position(|t| t.id == ticket_id))
    }

    async fn emit(&self, event: TicketEvent) {
        if let Err(e) = self.events.send(event).await {
            tracing::error!(error = %e, "failed to emit ticket event");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::{ServiceConfig, ServiceDirectory, ServicePointConfig};
    use crate::entities::TicketStatus;
    use crate::events::ticket_event_channel;
    use crate::lifecycle::LifecycleController;
    use crate::sequence::MemorySequenceAllocator;
    use crate::store::MemoryTicketStore;

    struct Fixture {
        coordinator: AssignmentCoordinator,
        lifecycle: LifecycleController,
        service_id: Uuid,
        point_id: Uuid,
        provider_id: Uuid,
    }

    /// One service "General" (prefix A) mapped to one point.
    fn fixture() -> Fixture {
        let service_id = Uuid::new_v4();
        let point_id = Uuid::new_v4();
        let directory = ServiceDirectory::new(
            vec![ServiceConfig {
                id: service_id,
                name: "General".to_string(),
                prefix: 'A',
                active: true,
            }],
            vec![ServicePointConfig {
                id: point_id,
                name: "Counter 1".to_string(),
                services: vec![service_id],
            }],
            vec![],
        )
        .unwrap();

        let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
        let (events, _rx) = ticket_event_channel();
        Fixture {
            coordinator: AssignmentCoordinator::new(
                store.clone(),
                Arc::new(MemorySequenceAllocator::new()),
                DirectoryStore::new(directory),
                events.clone(),
            ),
            lifecycle: LifecycleController::new(store, events),
            service_id,
            point_id,
            provider_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn issue_call_finish_flow() {
        let fx = fixture();

        // Three check-ins get sequential numbers.
        let mut numbers = Vec::new();
        for _ in 0..3 {
            numbers.push(fx.coordinator.issue_ticket(fx.service_id).await.unwrap());
        }
        assert_eq!(
            numbers.iter().map(|t| t.number.as_str()).collect::<Vec<_>>(),
            ["A001", "A002", "A003"]
        );

        // The point pulls the oldest.
        let first = fx
            .coordinator
            .request_next(fx.point_id, fx.provider_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.number, "A001");
        assert_eq!(first.status, TicketStatus::Called);

        let finished = fx.lifecycle.finish(first.id).await.unwrap();
        assert_eq!(finished.status, TicketStatus::Finished);
        assert!(finished.finished_at.is_some());

        // Next pull continues in FIFO order.
        let second = fx
            .coordinator
            .request_next(fx.point_id, fx.provider_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.number, "A002");
    }

    #[tokio::test]
    async fn issuing_for_unknown_or_inactive_service_fails() {
        let fx = fixture();
        let unknown = Uuid::new_v4();
        assert!(matches!(
            fx.coordinator.issue_ticket(unknown).await.unwrap_err(),
            EngineError::ServiceNotFound(id) if id == unknown
        ));

        let retired = Uuid::new_v4();
        let directory = ServiceDirectory::new(
            vec![ServiceConfig {
                id: retired,
                name: "Retired".to_string(),
                prefix: 'R',
                active: false,
            }],
            vec![],
            vec![],
        )
        .unwrap();
        let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
        let (events, _rx) = ticket_event_channel();
        let coordinator = AssignmentCoordinator::new(
            store,
            Arc::new(MemorySequenceAllocator::new()),
            DirectoryStore::new(directory),
            events,
        );
        assert!(matches!(
            coordinator.issue_ticket(retired).await.unwrap_err(),
            EngineError::ServiceInactive(id) if id == retired
        ));
    }

    #[tokio::test]
    async fn request_next_for_unknown_point_fails() {
        let fx = fixture();
        let unknown = Uuid::new_v4();
        assert!(matches!(
            fx.coordinator
                .request_next(unknown, fx.provider_id)
                .await
                .unwrap_err(),
            EngineError::PointNotFound(id) if id == unknown
        ));
    }

    #[tokio::test]
    async fn empty_pool_is_a_normal_none() {
        let fx = fixture();
        assert!(fx
            .coordinator
            .request_next(fx.point_id, fx.provider_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn two_points_racing_for_one_ticket() {
        let service_id = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let directory = ServiceDirectory::new(
            vec![ServiceConfig {
                id: service_id,
                name: "General".to_string(),
                prefix: 'A',
                active: true,
            }],
            vec![
                ServicePointConfig {
                    id: p1,
                    name: "Counter 1".to_string(),
                    services: vec![service_id],
                },
                ServicePointConfig {
                    id: p2,
                    name: "Counter 2".to_string(),
                    services: vec![service_id],
                },
            ],
            vec![],
        )
        .unwrap();

        let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
        let (events, _rx) = ticket_event_channel();
        let coordinator = Arc::new(AssignmentCoordinator::new(
            store,
            Arc::new(MemorySequenceAllocator::new()),
            DirectoryStore::new(directory),
            events,
        ));

        let ticket = coordinator.issue_ticket(service_id).await.unwrap();

        let a = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.request_next(p1, Uuid::new_v4()).await.unwrap() })
        };
        let b = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.request_next(p2, Uuid::new_v4()).await.unwrap() })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let claimed: Vec<_> = results.iter().flatten().collect();
        // Exactly one point received the ticket; the other got nothing.
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, ticket.id);
    }

    #[tokio::test]
    async fn queue_position_counts_earlier_waiting_tickets() {
        let fx = fixture();
        let first = fx.coordinator.issue_ticket(fx.service_id).await.unwrap();
        let second = fx.coordinator.issue_ticket(fx.service_id).await.unwrap();
        let third = fx.coordinator.issue_ticket(fx.service_id).await.unwrap();

        assert_eq!(fx.coordinator.queue_position(first.id).await.unwrap(), Some(0));
        assert_eq!(fx.coordinator.queue_position(third.id).await.unwrap(), Some(2));

        fx.coordinator
            .request_next(fx.point_id, fx.provider_id)
            .await
            .unwrap()
            .unwrap();
        // The called ticket no longer has a queue position.
        assert_eq!(fx.coordinator.queue_position(first.id).await.unwrap(), None);
        assert_eq!(fx.coordinator.queue_position(second.id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn transfer_re_enters_the_pool_for_any_mapped_point() {
        let fx = fixture();
        fx.coordinator.issue_ticket(fx.service_id).await.unwrap();
        let called = fx
            .coordinator
            .request_next(fx.point_id, fx.provider_id)
            .await
            .unwrap()
            .unwrap();

        let target = Uuid::new_v4();
        let transferred = fx.lifecycle.transfer(called.id, target).await.unwrap();
        assert_eq!(transferred.status, TicketStatus::Waiting);
        assert_eq!(transferred.transferred_from_point_id, Some(fx.point_id));
        assert!(transferred.service_point_id.is_none());
        assert!(transferred.service_provider_id.is_none());
        assert!(transferred.called_at.is_none());

        // The original point can claim it again: the named target is not a
        // restriction.
        let reclaimed = fx
            .coordinator
            .request_next(fx.point_id, fx.provider_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reclaimed.id, called.id);
    }
}
