//! Message model and its joined projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserSummary;

/// Message record as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Whether `username` may mark this message as read
    pub fn is_recipient(&self, username: &str) -> bool {
        self.to_username == username
    }
}

/// New message creation payload
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub from_username: String,
    pub to_username: String,
    pub body: String,
}

/// Message with both parties' profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    pub id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserSummary,
    pub to_user: UserSummary,
}

impl MessageDetail {
    /// Whether `username` is the sender or the recipient
    pub fn is_party(&self, username: &str) -> bool {
        self.from_user.username == username || self.to_user.username == username
    }
}

/// Message as listed in a recipient's inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserSummary,
}

/// Message as listed in a sender's outbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub to_user: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_recipient() {
        let message = Message {
            id: Uuid::new_v4(),
            from_username: "alice".to_string(),
            to_username: "bob".to_string(),
            body: "hi".to_string(),
            sent_at: Utc::now(),
            read_at: None,
        };

        assert!(message.is_recipient("bob"));
        assert!(!message.is_recipient("alice"));
        assert!(!message.is_recipient("Bob"));
    }
}
