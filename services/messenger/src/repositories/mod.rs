//! Record stores for users and messages
//!
//! The service only talks to the [`UserStore`] and [`MessageStore`] traits.
//! [`PgUserRepository`] and [`PgMessageRepository`] back them with
//! PostgreSQL; [`MemoryStore`] keeps everything in process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{InboxMessage, Message, MessageDetail, OutboxMessage, User, UserSummary};

pub mod memory;
pub mod message;
pub mod user;

pub use memory::MemoryStore;
pub use message::PgMessageRepository;
pub use user::PgUserRepository;

/// Persistence of user records and the user-centric message projections
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user, returning `None` if the username is already taken
    async fn insert_user(&self, user: &User) -> DatabaseResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    async fn list_users(&self) -> DatabaseResult<Vec<UserSummary>>;

    /// Set `last_login_at`, returning `false` if no such user exists
    async fn update_last_login(&self, username: &str, at: DateTime<Utc>) -> DatabaseResult<bool>;

    /// Messages received by `username`, joined with the sender's profile
    async fn messages_to(&self, username: &str) -> DatabaseResult<Vec<InboxMessage>>;

    /// Messages sent by `username`, joined with the recipient's profile
    async fn messages_from(&self, username: &str) -> DatabaseResult<Vec<OutboxMessage>>;
}

/// Persistence of message records
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a message, returning `None` if either party does not exist
    async fn insert_message(&self, message: &Message) -> DatabaseResult<Option<Message>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Message>>;

    /// Load a message joined with both parties' profiles
    async fn find_detail(&self, id: Uuid) -> DatabaseResult<Option<MessageDetail>>;

    /// Set `read_at` to `at` unless already set, returning the stored message
    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<Option<Message>>;
}
