//! CallAnnouncer processor.
//!
//! The CallAnnouncer is responsible for:
//! - Receiving `TicketEvent`s from the engine
//! - Resolving point names through the directory for call/recall lines
//! - Broadcasting `BoardUpdate`s to waiting-room display subscribers
//!
//! Displays are a live view: subscribers that lag are skipped past by the
//! broadcast channel and simply miss updates.

use crate::config::DirectoryStore;
use crate::events::{BoardUpdate, BoardUpdateSender, TicketEvent, TicketEventReceiver};
use tokio::sync::watch;
use tracing::{debug, info};

/// CallAnnouncer turns ticket events into board updates.
pub struct CallAnnouncer {
    directory: DirectoryStore,
    event_rx: TicketEventReceiver,
    board_tx: BoardUpdateSender,
    shutdown_rx: watch::Receiver<bool>,
}

impl CallAnnouncer {
    pub fn new(
        directory: DirectoryStore,
        event_rx: TicketEventReceiver,
        board_tx: BoardUpdateSender,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            directory,
            event_rx,
            board_tx,
            shutdown_rx,
        }
    }

    /// Run the CallAnnouncer until shutdown is signaled or every event
    /// sender is gone.
    pub async fn run(mut self) {
        info!("CallAnnouncer started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("CallAnnouncer received shutdown signal");
                        break;
                    }
                }

                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.publish(event).await,
                        None => {
                            info!("ticket event channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("CallAnnouncer shutdown complete");
    }

    async fn publish(&self, event: TicketEvent) {
        let announcement = self.announcement(&event).await;
        if let Some(line) = &announcement {
            info!(number = %event.number(), announcement = %line, "announcing");
        }

        // Err only means there are no subscribers right now.
        if self
            .board_tx
            .send(BoardUpdate {
                announcement,
                event,
            })
            .is_err()
        {
            debug!("no board subscribers");
        }
    }

    /// The spoken/displayed line for call and recall; other events update
    /// the board silently.
    async fn announcement(&self, event: &TicketEvent) -> Option<String> {
        let point_id = match event {
            TicketEvent::Called { point_id, .. } => Some(*point_id),
            TicketEvent::Recalled { point_id, .. } => *point_id,
            _ => return None,
        };
        let directory = self.directory.snapshot().await;
        let point = point_id
            .and_then(|id| directory.point_name(id).map(str::to_string))
            .unwrap_or_else(|| "the counter".to_string());
        Some(format!("Ticket {}, please proceed to {point}", event.number()))
    }
}
