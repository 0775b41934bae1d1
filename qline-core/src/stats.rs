//! Wait-time and service-time statistics.
//!
//! Aggregation is a pure function over finished tickets; the store-backed
//! wrapper only fetches rows and resolves display names. Nothing here
//! mutates, so there are no ordering or locking concerns.

use crate::config::DirectoryStore;
use crate::entities::{Ticket, TicketStatus};
use crate::error::EngineError;
use crate::store::TicketStore;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Which assignment field the report groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportGroupBy {
    Point,
    Provider,
}

/// One report row: a point or provider with its completed-ticket averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRow {
    pub name: String,
    pub count: u64,
    /// Average `called_at − issued_at`, seconds.
    pub avg_wait_seconds: f64,
    /// Average `finished_at − called_at`, seconds.
    pub avg_service_seconds: f64,
}

/// Aggregate finished tickets by point or provider.
///
/// Only `Finished` tickets with both timestamps contribute; waiting, called,
/// no-show, and transferred-back tickets have no completed service to count.
/// Returns `(group id, row)` pairs with no name resolution.
pub fn aggregate(tickets: &[Ticket], group_by: ReportGroupBy) -> Vec<(Uuid, PerformanceRow)> {
    let groups = tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Finished)
        .filter_map(|t| {
            let key = match group_by {
                ReportGroupBy::Point => t.service_point_id,
                ReportGroupBy::Provider => t.service_provider_id,
            }?;
            let called_at = t.called_at?;
            let finished_at = t.finished_at?;
            let wait = (called_at - t.issued_at).as_seconds_f64();
            let service = (finished_at - called_at).as_seconds_f64();
            Some((key, (wait, service)))
        })
        .into_group_map();

    let mut rows: Vec<(Uuid, PerformanceRow)> = groups
        .into_iter()
        .map(|(key, samples)| {
            let count = samples.len() as u64;
            let (wait_sum, service_sum) = samples
                .iter()
                .fold((0.0, 0.0), |(w, s), (wait, service)| (w + wait, s + service));
            (
                key,
                PerformanceRow {
                    name: String::new(),
                    count,
                    avg_wait_seconds: wait_sum / count as f64,
                    avg_service_seconds: service_sum / count as f64,
                },
            )
        })
        .collect();
    rows.sort_by_key(|(key, _)| *key);
    rows
}

/// Store-backed report builder.
pub struct PerformanceAggregator {
    store: Arc<dyn TicketStore>,
    directory: DirectoryStore,
}

impl PerformanceAggregator {
    pub fn new(store: Arc<dyn TicketStore>, directory: DirectoryStore) -> Self {
        Self { store, directory }
    }

    /// Build the report, resolving group ids to directory names. Groups
    /// whose id has left the directory keep the id as their name.
    pub async fn report(&self, group_by: ReportGroupBy) -> Result<Vec<PerformanceRow>, EngineError> {
        let finished = self.store.list_finished().await?;
        let directory = self.directory.snapshot().await;

        let mut rows: Vec<PerformanceRow> = aggregate(&finished, group_by)
            .into_iter()
            .map(|(key, mut row)| {
                let name = match group_by {
                    ReportGroupBy::Point => directory.point_name(key),
                    ReportGroupBy::Provider => directory.provider_name(key),
                };
                row.name = name.map_or_else(|| key.to_string(), str::to_string);
                row
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use time::OffsetDateTime;

    fn finished_ticket(
        id: i64,
        point: Uuid,
        provider: Uuid,
        issued_s: i64,
        called_s: i64,
        finished_s: i64,
    ) -> Ticket {
        let at = |s| OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(s);
        Ticket {
            id,
            number: format!("A{id:03}"),
            service_id: Uuid::new_v4(),
            status: TicketStatus::Finished,
            issued_at: at(issued_s),
            called_at: Some(at(called_s)),
            finished_at: Some(at(finished_s)),
            service_point_id: Some(point),
            service_provider_id: Some(provider),
            transferred_from_point_id: None,
        }
    }

    #[test]
    fn single_ticket_averages() {
        let point = Uuid::new_v4();
        let tickets = [finished_ticket(1, point, Uuid::new_v4(), 0, 30, 90)];

        let rows = aggregate(&tickets, ReportGroupBy::Point);
        assert_eq!(rows.len(), 1);
        let (key, row) = &rows[0];
        assert_eq!(*key, point);
        assert_eq!(row.count, 1);
        assert_eq!(row.avg_wait_seconds, 30.0);
        assert_eq!(row.avg_service_seconds, 60.0);
    }

    #[test]
    fn averages_are_per_group() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let provider = Uuid::new_v4();
        let tickets = [
            finished_ticket(1, p1, provider, 0, 10, 40),
            finished_ticket(2, p1, provider, 0, 30, 50),
            finished_ticket(3, p2, provider, 0, 5, 10),
        ];

        let by_point = aggregate(&tickets, ReportGroupBy::Point);
        assert_eq!(by_point.len(), 2);
        let row1 = &by_point.iter().find(|(k, _)| *k == p1).unwrap().1;
        assert_eq!(row1.count, 2);
        assert_eq!(row1.avg_wait_seconds, 20.0);
        assert_eq!(row1.avg_service_seconds, 25.0);

        // Grouped by provider, all three collapse into one row.
        let by_provider = aggregate(&tickets, ReportGroupBy::Provider);
        assert_eq!(by_provider.len(), 1);
        assert_eq!(by_provider[0].1.count, 3);
    }

    #[test]
    fn unfinished_tickets_contribute_nothing() {
        let point = Uuid::new_v4();
        let mut waiting = finished_ticket(1, point, Uuid::new_v4(), 0, 30, 90);
        waiting.status = TicketStatus::Waiting;
        waiting.called_at = None;
        waiting.finished_at = None;
        waiting.service_point_id = None;
        waiting.service_provider_id = None;

        let mut no_show = finished_ticket(2, point, Uuid::new_v4(), 0, 30, 90);
        no_show.status = TicketStatus::NoShow;
        no_show.finished_at = None;
        no_show.service_point_id = None;
        no_show.service_provider_id = None;

        assert!(aggregate(&[waiting, no_show], ReportGroupBy::Point).is_empty());
    }
}
