//! Ticket event system.
//!
//! Every applied lifecycle transition emits a [`TicketEvent`]. Events are
//! ephemeral notifications: they carry the ticket number and the ids needed
//! to render an announcement, not authoritative state. Consumers that need
//! current state fetch it from the store.
//!
//! # Event Flow
//!
//! 1. `AssignmentCoordinator` / `LifecycleController` emit `TicketEvent`
//! 2. `CallAnnouncer` consumes the channel, formats announcements, and fans
//!    out [`BoardUpdate`]s on a broadcast channel for display subscribers

pub mod channels;
pub mod types;

pub use channels::{
    BoardUpdateReceiver, BoardUpdateSender, TicketEventReceiver, TicketEventSender,
    board_update_channel, ticket_event_channel, DEFAULT_CHANNEL_BUFFER,
};
pub use types::{BoardUpdate, TicketEvent};
