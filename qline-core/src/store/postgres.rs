//! Postgres ticket store.
//!
//! The claim is one statement: the inner select picks the oldest eligible
//! waiting row with `FOR UPDATE SKIP LOCKED`, so concurrent claimants never
//! queue behind each other; a claimant whose candidate row is locked by an
//! in-flight claim is handed the next-oldest row instead. Other transitions
//! are status-guarded conditional updates validated through the pure
//! transition function; a guard miss means a lost race and is retried
//! against fresh state.
//!
//! Queries use the runtime API rather than the compile-time checked macros
//! so the workspace builds without a database. Schema lives in
//! `migrations/` at the workspace root.

use super::TicketStore;
use crate::entities::{NewTicket, Ticket, TicketId, TicketStatus};
use crate::error::EngineError;
use crate::lifecycle::{self, LifecycleEvent};
use crate::sequence::SequenceAllocator;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

/// Attempts at a status-guarded update before giving up as a conflict.
const MAX_TRANSITION_ATTEMPTS: u32 = 3;

const CLAIM_SQL: &str = r#"
UPDATE tickets SET
    status = 'called',
    called_at = $1,
    service_point_id = $2,
    service_provider_id = $3
WHERE id = (
    SELECT id FROM tickets
    WHERE status = 'waiting' AND service_id = ANY($4)
    ORDER BY issued_at, id
    LIMIT 1
    FOR UPDATE SKIP LOCKED
)
RETURNING id, number, service_id, status, issued_at, called_at, finished_at,
          service_point_id, service_provider_id, transferred_from_point_id
"#;

const INSERT_SQL: &str = r#"
INSERT INTO tickets (number, service_id, status, issued_at)
VALUES ($1, $2, 'waiting', $3)
RETURNING id, number, service_id, status, issued_at, called_at, finished_at,
          service_point_id, service_provider_id, transferred_from_point_id
"#;

const GET_SQL: &str = r#"
SELECT id, number, service_id, status, issued_at, called_at, finished_at,
       service_point_id, service_provider_id, transferred_from_point_id
FROM tickets
WHERE id = $1
"#;

const TRANSITION_SQL: &str = r#"
UPDATE tickets SET
    status = $2,
    called_at = $3,
    finished_at = $4,
    service_point_id = $5,
    service_provider_id = $6,
    transferred_from_point_id = $7
WHERE id = $1 AND status = $8
RETURNING id, number, service_id, status, issued_at, called_at, finished_at,
          service_point_id, service_provider_id, transferred_from_point_id
"#;

/// Map backend failures onto the engine taxonomy: unique-constraint and
/// serialization losses are transient conflicts, everything else is storage.
fn map_db_error(e: sqlx::Error) -> EngineError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return EngineError::AllocationConflict;
        }
        // 40001 serialization_failure, 40P01 deadlock_detected
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return EngineError::AllocationConflict;
        }
    }
    EngineError::Storage(e)
}

/// Durable [`TicketStore`] backend.
#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn insert(&self, new: NewTicket) -> Result<Ticket, EngineError> {
        sqlx::query_as::<_, Ticket>(INSERT_SQL)
            .bind(&new.number)
            .bind(new.service_id)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn get(&self, id: TicketId) -> Result<Ticket, EngineError> {
        sqlx::query_as::<_, Ticket>(GET_SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or(EngineError::TicketNotFound(id))
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
        let claimed = sqlx::query_as::<_, Ticket>(CLAIM_SQL)
            .bind(OffsetDateTime::now_utc())
            .bind(point_id)
            .bind(provider_id)
            .bind(eligible_services)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        if let Some(ticket) = &claimed {
            tracing::debug!(
                ticket_id = ticket.id,
                number = %ticket.number,
                point_id = %point_id,
                "claimed oldest eligible ticket"
            );
        }
        Ok(claimed)
    }

    async fn apply_transition(
        &self,
        id: TicketId,
        event: LifecycleEvent,
    ) -> Result<Ticket, EngineError> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let current = self.get(id).await?;
            let patch = lifecycle::transition(&current, &event, OffsetDateTime::now_utc())?;

            let updated = sqlx::query_as::<_, Ticket>(TRANSITION_SQL)
                .bind(id)
                .bind(patch.status)
                .bind(patch.called_at)
                .bind(patch.finished_at)
                .bind(patch.service_point_id)
                .bind(patch.service_provider_id)
                .bind(patch.transferred_from_point_id)
                .bind(current.status)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

            match updated {
                Some(ticket) => return Ok(ticket),
                // The status guard missed: someone else transitioned the
                // ticket in between. Re-validate against fresh state.
                None => continue,
            }
        }
        Err(EngineError::AllocationConflict)
    }

    async fn list(
        &self,
        status: Option<TicketStatus>,
        limit: usize,
    ) -> Result<Vec<Ticket>, EngineError> {
        let sql = r#"
SELECT id, number, service_id, status, issued_at, called_at, finished_at,
       service_point_id, service_provider_id, transferred_from_point_id
FROM tickets
WHERE ($1::ticket_status IS NULL OR status = $1)
ORDER BY id DESC
LIMIT $2
"#;
        sqlx::query_as::<_, Ticket>(sql)
            .bind(status)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn list_waiting(&self, service_ids: &[Uuid]) -> Result<Vec<Ticket>, EngineError> {
        let sql = r#"
SELECT id, number, service_id, status, issued_at, called_at, finished_at,
       service_point_id, service_provider_id, transferred_from_point_id
FROM tickets
WHERE status = 'waiting' AND service_id = ANY($1)
ORDER BY issued_at, id
"#;
        sqlx::query_as::<_, Ticket>(sql)
            .bind(service_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn list_finished(&self) -> Result<Vec<Ticket>, EngineError> {
        let sql = r#"
SELECT id, number, service_id, status, issued_at, called_at, finished_at,
       service_point_id, service_provider_id, transferred_from_point_id
FROM tickets
WHERE status = 'finished'
ORDER BY id
"#;
        sqlx::query_as::<_, Ticket>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)
    }
}

/// Durable per-prefix sequence: one upsert, atomic under the row lock, so
/// numbering stays gapless across processes and restarts.
#[derive(Clone)]
pub struct PgSequenceAllocator {
    pool: PgPool,
}

impl PgSequenceAllocator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceAllocator for PgSequenceAllocator {
    async fn next_number(&self, prefix: char) -> Result<u32, EngineError> {
        let sql = r#"
INSERT INTO ticket_sequences (prefix, last_number) VALUES ($1, 1)
ON CONFLICT (prefix) DO UPDATE SET last_number = ticket_sequences.last_number + 1
RETURNING last_number
"#;
        let number: i32 = sqlx::query_scalar(sql)
            .bind(prefix.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(number as u32)
    }
}

// Exercised against a live database only: `cargo test -- --ignored` with
// DATABASE_URL pointing at a migrated instance.
#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::entities::NewTicket;
    use crate::store::TicketStore;

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgPool::connect(&url).await.expect("database connection")
    }

    #[tokio::test]
    #[ignore]
    async fn pg_claim_hands_out_each_ticket_once() {
        let store = PgTicketStore::new(pool().await);
        let service = Uuid::new_v4();
        let point = Uuid::new_v4();

        let first = store
            .insert(NewTicket {
                number: format!("T{}", Uuid::new_v4().simple()),
                service_id: service,
            })
            .await
            .unwrap();

        let claimed = store
            .claim_oldest_eligible(point, &[service], Uuid::new_v4())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.id, first.id);
        assert_eq!(claimed.status, TicketStatus::Called);

        assert!(store
            .claim_oldest_eligible(point, &[service], Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn pg_sequence_counts_up_per_prefix() {
        let allocator = PgSequenceAllocator::new(pool().await);
        let first = allocator.next_number('Z').await.unwrap();
        let second = allocator.next_number('Z').await.unwrap();
        assert_eq!(second, first + 1);
    }
}
