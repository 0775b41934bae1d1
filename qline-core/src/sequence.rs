//! Per-prefix ticket number allocation.
//!
//! `next_number` hands out the smallest unused positive integer for a prefix
//! (max + 1, starting at 1) and must reserve it atomically with respect to
//! concurrent callers on the same prefix: no two calls may observe the same
//! maximum. Formatting the human-readable number is the coordinator's job;
//! the allocator deals in integers only.

use crate::error::EngineError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Atomic per-prefix sequence source.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Reserve and return the next number for `prefix`.
    ///
    /// Fails with [`EngineError::AllocationConflict`] when the backend lost
    /// a reservation race; callers retry with a small fixed bound.
    async fn next_number(&self, prefix: char) -> Result<u32, EngineError>;
}

/// In-process allocator: one counter per prefix behind a mutex.
///
/// Reservation happens inside the lock, so conflicts cannot occur and
/// numbering is gapless by construction.
#[derive(Default)]
pub struct MemorySequenceAllocator {
    counters: Mutex<HashMap<char, u32>>,
}

impl MemorySequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceAllocator for MemorySequenceAllocator {
    async fn next_number(&self, prefix: char) -> Result<u32, EngineError> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(prefix).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

/// Compose the human-readable ticket number: prefix plus the zero-padded
/// sequence, e.g. `A007`. Widens naturally past 999.
pub fn format_ticket_number(prefix: char, number: u32) -> String {
    format!("{prefix}{number:03}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn formats_with_three_digit_padding() {
        assert_eq!(format_ticket_number('A', 7), "A007");
        assert_eq!(format_ticket_number('B', 42), "B042");
        assert_eq!(format_ticket_number('C', 999), "C999");
        assert_eq!(format_ticket_number('C', 1000), "C1000");
    }

    #[tokio::test]
    async fn sequential_allocation_is_gapless_per_prefix() {
        let allocator = MemorySequenceAllocator::new();
        for expected in 1..=5 {
            assert_eq!(allocator.next_number('A').await.unwrap(), expected);
        }
        // Another prefix starts at 1 independently.
        assert_eq!(allocator.next_number('B').await.unwrap(), 1);
        assert_eq!(allocator.next_number('A').await.unwrap(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocation_yields_distinct_numbers() {
        const TASKS: usize = 64;
        let allocator = Arc::new(MemorySequenceAllocator::new());

        let mut handles = Vec::with_capacity(TASKS);
        for _ in 0..TASKS {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                allocator.next_number('A').await.unwrap()
            }));
        }

        let mut numbers = HashSet::new();
        for handle in handles {
            assert!(numbers.insert(handle.await.unwrap()));
        }
        // Distinct and gapless: exactly 1..=TASKS.
        assert_eq!(numbers.len(), TASKS);
        assert_eq!(*numbers.iter().min().unwrap(), 1);
        assert_eq!(*numbers.iter().max().unwrap(), TASKS as u32);
    }
}
