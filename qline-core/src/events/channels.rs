//! Event channel factories and handles.

use super::types::{BoardUpdate, TicketEvent};
use tokio::sync::{broadcast, mpsc};

/// Default buffer size for event channels.
///
/// Enough to absorb bursts of concurrent check-ins and claims while keeping
/// memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for TicketEvent events.
pub type TicketEventSender = mpsc::Sender<TicketEvent>;
/// Receiver handle for TicketEvent events.
pub type TicketEventReceiver = mpsc::Receiver<TicketEvent>;

/// Sender handle for BoardUpdate fan-out.
pub type BoardUpdateSender = broadcast::Sender<BoardUpdate>;
/// Receiver handle for BoardUpdate fan-out.
pub type BoardUpdateReceiver = broadcast::Receiver<BoardUpdate>;

/// Create the TicketEvent channel consumed by the [`CallAnnouncer`].
///
/// Multiple senders can be cloned from the returned sender; the engine hands
/// one to the coordinator and one to the lifecycle controller.
///
/// [`CallAnnouncer`]: crate::processors::CallAnnouncer
pub fn ticket_event_channel() -> (TicketEventSender, TicketEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create the BoardUpdate broadcast channel for display subscribers.
///
/// Subscribers that fall behind see `Lagged` and skip ahead; the board is a
/// live view, not a durable feed.
pub fn board_update_channel() -> (BoardUpdateSender, BoardUpdateReceiver) {
    broadcast::channel(DEFAULT_CHANNEL_BUFFER)
}
