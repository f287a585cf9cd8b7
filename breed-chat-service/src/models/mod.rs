//! Domain models for the breed chat service.

pub mod session;

pub use session::{Conversation, HistoryEntry, Part, Role, SessionKey, Turn};
