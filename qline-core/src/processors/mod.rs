//! Event processors.
//!
//! - `CallAnnouncer`: consumes `TicketEvent`s, formats public announcements
//!   for calls and recalls, and fans everything out to board subscribers.

pub mod announcer;

pub use announcer::CallAnnouncer;
