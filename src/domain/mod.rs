//! Domain types: event records and the wallet session.

pub mod event;
pub mod session;

pub use event::{verified_display, EventKind, EventRecord, NewEvent};
pub use session::Session;
