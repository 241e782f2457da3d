//! Wire protocol of the collaborative editor service

pub mod messages;

pub use messages::{Action, ChangeMsg, Event, EventKind, LoginMsg, Range};
