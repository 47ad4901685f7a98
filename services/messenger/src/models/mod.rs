//! Messenger models

pub mod message;
pub mod user;

// Re-export for convenience
pub use message::{InboxMessage, Message, MessageDetail, NewMessage, OutboxMessage};
pub use user::{NewUser, User, UserDetail, UserSummary};
