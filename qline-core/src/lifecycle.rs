//! Ticket lifecycle state machine.
//!
//! Each transition is a pure function from (current ticket, event, timestamp)
//! to a [`TicketPatch`], independent of the storage backend. Stores apply the
//! patch atomically; an illegal (status, event) pair fails with
//! [`EngineError::InvalidTransition`] and mutates nothing.
//!
//! Transition table:
//!
//! | From    | Event        | To       |
//! |---------|--------------|----------|
//! | Waiting | Claim        | Called   |
//! | Called  | Finish       | Finished |
//! | Called  | NoShow       | NoShow   |
//! | Called  | Recall       | Called   |
//! | Called  | Transfer     | Waiting  |
//!
//! `NoShow` and `Finished` are terminal. A transfer folds back into
//! `Waiting` with the old point recorded as provenance; the requested target
//! point is reported in events but does not restrict which point may claim
//! the ticket next.

use crate::entities::{Ticket, TicketId, TicketPatch, TicketStatus};
use crate::error::EngineError;
use crate::events::{TicketEvent, TicketEventSender};
use crate::store::TicketStore;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// A requested state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A service point claims the ticket.
    Claim {
        point_id: Uuid,
        provider_id: Uuid,
    },
    /// The operator recorded a completed service.
    Finish,
    /// The customer did not appear when called.
    NoShow,
    /// Call the same ticket again; the call timestamp restarts.
    Recall,
    /// Return the ticket to the waiting pool. The target point is carried
    /// for announcements only; eligibility stays with the service mapping.
    Transfer { to_point_id: Uuid },
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Claim { .. } => "claim",
            LifecycleEvent::Finish => "finish",
            LifecycleEvent::NoShow => "no_show",
            LifecycleEvent::Recall => "recall",
            LifecycleEvent::Transfer { .. } => "transfer",
        }
    }
}

/// Compute the patch for applying `event` to `current` at time `now`.
///
/// Pure: no storage access, no side effects.
pub fn transition(
    current: &Ticket,
    event: &LifecycleEvent,
    now: OffsetDateTime,
) -> Result<TicketPatch, EngineError> {
    match (current.status, event) {
        (TicketStatus::Waiting, LifecycleEvent::Claim { point_id, provider_id }) => {
            Ok(TicketPatch {
                status: TicketStatus::Called,
                called_at: Some(now),
                finished_at: None,
                service_point_id: Some(*point_id),
                service_provider_id: Some(*provider_id),
                transferred_from_point_id: current.transferred_from_point_id,
            })
        }
        (TicketStatus::Called, LifecycleEvent::Finish) => Ok(TicketPatch {
            status: TicketStatus::Finished,
            called_at: current.called_at,
            finished_at: Some(now),
            // Finished keeps the assignment for reporting.
            service_point_id: current.service_point_id,
            service_provider_id: current.service_provider_id,
            transferred_from_point_id: current.transferred_from_point_id,
        }),
        (TicketStatus::Called, LifecycleEvent::NoShow) => Ok(TicketPatch {
            status: TicketStatus::NoShow,
            called_at: current.called_at,
            finished_at: None,
            // Only Called and Finished tickets carry an assignment.
            service_point_id: None,
            service_provider_id: None,
            transferred_from_point_id: current.transferred_from_point_id,
        }),
        (TicketStatus::Called, LifecycleEvent::Recall) => Ok(TicketPatch {
            status: TicketStatus::Called,
            called_at: Some(now),
            finished_at: None,
            service_point_id: current.service_point_id,
            service_provider_id: current.service_provider_id,
            transferred_from_point_id: current.transferred_from_point_id,
        }),
        (TicketStatus::Called, LifecycleEvent::Transfer { .. }) => Ok(TicketPatch {
            status: TicketStatus::Waiting,
            called_at: None,
            finished_at: None,
            service_point_id: None,
            service_provider_id: None,
            transferred_from_point_id: current.service_point_id,
        }),
        (status, event) => Err(EngineError::InvalidTransition {
            status,
            event: event.name(),
        }),
    }
}

/// Applies operator actions to tickets and emits the matching events.
///
/// All ticket mutation outside the claim path goes through here; the store
/// guarantees each applied patch is atomic per ticket.
pub struct LifecycleController {
    store: Arc<dyn TicketStore>,
    events: TicketEventSender,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn TicketStore>, events: TicketEventSender) -> Self {
        Self { store, events }
    }

    /// Record a completed service. `Called` → `Finished`.
    pub async fn finish(&self, ticket_id: TicketId) -> Result<Ticket, EngineError> {
        let ticket = self
            .store
            .apply_transition(ticket_id, LifecycleEvent::Finish)
            .await?;
        tracing::info!(ticket_id, number = %ticket.number, "ticket finished");
        self.emit(TicketEvent::Finished {
            ticket_id,
            number: ticket.number.clone(),
            point_id: ticket.service_point_id,
        })
        .await;
        Ok(ticket)
    }

    /// Record that the called customer never appeared. `Called` → `NoShow`.
    pub async fn mark_no_show(&self, ticket_id: TicketId) -> Result<Ticket, EngineError> {
        let ticket = self
            .store
            .apply_transition(ticket_id, LifecycleEvent::NoShow)
            .await?;
        tracing::info!(ticket_id, number = %ticket.number, "ticket marked no-show");
        self.emit(TicketEvent::NoShow {
            ticket_id,
            number: ticket.number.clone(),
        })
        .await;
        Ok(ticket)
    }

    /// Call the same ticket again. `Called` → `Called` with a fresh call time.
    pub async fn recall(&self, ticket_id: TicketId) -> Result<Ticket, EngineError> {
        let ticket = self
            .store
            .apply_transition(ticket_id, LifecycleEvent::Recall)
            .await?;
        tracing::info!(ticket_id, number = %ticket.number, "ticket recalled");
        self.emit(TicketEvent::Recalled {
            ticket_id,
            number: ticket.number.clone(),
            point_id: ticket.service_point_id,
        })
        .await;
        Ok(ticket)
    }

    /// Return a called ticket to the waiting pool. `Called` → `Waiting`,
    /// with the old point kept as provenance.
    pub async fn transfer(
        &self,
        ticket_id: TicketId,
        to_point_id: Uuid,
    ) -> Result<Ticket, EngineError> {
        let ticket = self
            .store
            .apply_transition(ticket_id, LifecycleEvent::Transfer { to_point_id })
            .await?;
        tracing::info!(
            ticket_id,
            number = %ticket.number,
            from_point = ?ticket.transferred_from_point_id,
            to_point = %to_point_id,
            "ticket transferred back to waiting pool"
        );
        self.emit(TicketEvent::Transferred {
            ticket_id,
            number: ticket.number.clone(),
            from_point_id: ticket.transferred_from_point_id,
            requested_point_id: to_point_id,
        })
        .await;
        Ok(ticket)
    }

    async fn emit(&self, event: TicketEvent) {
        if let Err(e) = self.events.send(event).await {
            tracing::error!(error = %e, "failed to emit ticket event");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn waiting_ticket() -> Ticket {
        Ticket {
            id: 1,
            number: "A001".to_string(),
            service_id: Uuid::new_v4(),
            status: TicketStatus::Waiting,
            issued_at: OffsetDateTime::UNIX_EPOCH,
            called_at: None,
            finished_at: None,
            service_point_id: None,
            service_provider_id: None,
            transferred_from_point_id: None,
        }
    }

    fn called_ticket(point: Uuid, provider: Uuid) -> Ticket {
        let mut t = waiting_ticket();
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(30);
        let patch = transition(
            &t,
            &LifecycleEvent::Claim {
                point_id: point,
                provider_id: provider,
            },
            now,
        )
        .unwrap();
        t.apply(&patch);
        t
    }

    #[test]
    fn claim_sets_assignment_and_call_time() {
        let point = Uuid::new_v4();
        let provider = Uuid::new_v4();
        let t = called_ticket(point, provider);

        assert_eq!(t.status, TicketStatus::Called);
        assert!(t.called_at.is_some());
        assert_eq!(t.service_point_id, Some(point));
        assert_eq!(t.service_provider_id, Some(provider));
        assert!(t.finished_at.is_none());
    }

    #[test]
    fn finish_sets_finish_time_and_keeps_assignment() {
        let point = Uuid::new_v4();
        let mut t = called_ticket(point, Uuid::new_v4());
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(90);

        let patch = transition(&t, &LifecycleEvent::Finish, now).unwrap();
        t.apply(&patch);

        assert_eq!(t.status, TicketStatus::Finished);
        assert_eq!(t.finished_at, Some(now));
        assert_eq!(t.service_point_id, Some(point));
        assert!(t.called_at.is_some());
    }

    #[test]
    fn no_show_clears_assignment() {
        let mut t = called_ticket(Uuid::new_v4(), Uuid::new_v4());
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(90);

        let patch = transition(&t, &LifecycleEvent::NoShow, now).unwrap();
        t.apply(&patch);

        assert_eq!(t.status, TicketStatus::NoShow);
        assert!(t.service_point_id.is_none());
        assert!(t.service_provider_id.is_none());
        // The call time survives for the record.
        assert!(t.called_at.is_some());
    }

    #[test]
    fn recall_restarts_the_call_time() {
        let mut t = called_ticket(Uuid::new_v4(), Uuid::new_v4());
        let first_call = t.called_at;
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(120);

        let patch = transition(&t, &LifecycleEvent::Recall, now).unwrap();
        t.apply(&patch);

        assert_eq!(t.status, TicketStatus::Called);
        assert_eq!(t.called_at, Some(now));
        assert_ne!(t.called_at, first_call);
        assert!(t.finished_at.is_none());
    }

    #[test]
    fn transfer_folds_back_to_waiting_with_provenance() {
        let point = Uuid::new_v4();
        let mut t = called_ticket(point, Uuid::new_v4());
        let issued_at = t.issued_at;
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(120);

        let patch = transition(
            &t,
            &LifecycleEvent::Transfer {
                to_point_id: Uuid::new_v4(),
            },
            now,
        )
        .unwrap();
        t.apply(&patch);

        assert_eq!(t.status, TicketStatus::Waiting);
        assert_eq!(t.transferred_from_point_id, Some(point));
        assert!(t.service_point_id.is_none());
        assert!(t.service_provider_id.is_none());
        assert!(t.called_at.is_none());
        // Original queue priority is preserved.
        assert_eq!(t.issued_at, issued_at);
    }

    #[test]
    fn transferred_ticket_can_be_claimed_again() {
        let first_point = Uuid::new_v4();
        let mut t = called_ticket(first_point, Uuid::new_v4());
        let now = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(120);

        let patch = transition(
            &t,
            &LifecycleEvent::Transfer {
                to_point_id: Uuid::new_v4(),
            },
            now,
        )
        .unwrap();
        t.apply(&patch);

        let second_point = Uuid::new_v4();
        let patch = transition(
            &t,
            &LifecycleEvent::Claim {
                point_id: second_point,
                provider_id: Uuid::new_v4(),
            },
            now + time::Duration::seconds(10),
        )
        .unwrap();
        t.apply(&patch);

        assert_eq!(t.status, TicketStatus::Called);
        assert_eq!(t.service_point_id, Some(second_point));
        // Provenance from the transfer survives the re-claim.
        assert_eq!(t.transferred_from_point_id, Some(first_point));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let waiting = waiting_ticket();
        let called = called_ticket(Uuid::new_v4(), Uuid::new_v4());

        let mut finished = called.clone();
        let patch = transition(&finished, &LifecycleEvent::Finish, now).unwrap();
        finished.apply(&patch);

        let mut no_show = called.clone();
        let patch = transition(&no_show, &LifecycleEvent::NoShow, now).unwrap();
        no_show.apply(&patch);

        let claim = LifecycleEvent::Claim {
            point_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
        };
        let transfer = LifecycleEvent::Transfer {
            to_point_id: Uuid::new_v4(),
        };

        // Waiting admits only Claim.
        for event in [&LifecycleEvent::Finish, &LifecycleEvent::NoShow, &LifecycleEvent::Recall, &transfer] {
            assert!(matches!(
                transition(&waiting, event, now),
                Err(EngineError::InvalidTransition { .. })
            ));
        }
        // Called admits everything except Claim.
        assert!(matches!(
            transition(&called, &claim, now),
            Err(EngineError::InvalidTransition { .. })
        ));
        // Terminal states admit nothing.
        for terminal in [&finished, &no_show] {
            for event in [
                &claim,
                &LifecycleEvent::Finish,
                &LifecycleEvent::NoShow,
                &LifecycleEvent::Recall,
                &transfer,
            ] {
                assert!(matches!(
                    transition(terminal, event, now),
                    Err(EngineError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn rejected_transition_reports_status_and_event() {
        let waiting = waiting_ticket();
        let err = transition(&waiting, &LifecycleEvent::Finish, OffsetDateTime::UNIX_EPOCH)
            .unwrap_err();
        match err {
            EngineError::InvalidTransition { status, event } => {
                assert_eq!(status, TicketStatus::Waiting);
                assert_eq!(event, "finish");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
