//! In-process record store
//!
//! Implements both [`UserStore`] and [`MessageStore`] over one shared map so
//! the joined projections see the same data. Used by the test suites and by
//! `MESSENGER_STORE=memory` for local runs without PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MessageStore, UserStore};
use crate::models::{
    InboxMessage, Message, MessageDetail, OutboxMessage, User, UserSummary,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    /// Insertion order, so listings are stable
    messages: Vec<Message>,
}

impl Tables {
    fn summary(&self, username: &str) -> Option<UserSummary> {
        self.users.get(username).map(UserSummary::from)
    }
}

/// Shared in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> DatabaseResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.username) {
            return Ok(None);
        }
        tables.users.insert(user.username.clone(), user.clone());
        Ok(Some(user.clone()))
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        Ok(self.tables.read().await.users.get(username).cloned())
    }

    async fn list_users(&self) -> DatabaseResult<Vec<UserSummary>> {
        let tables = self.tables.read().await;
        let mut users: Vec<UserSummary> = tables.users.values().map(UserSummary::from).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_last_login(&self, username: &str, at: DateTime<Utc>) -> DatabaseResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(username) {
            Some(user) => {
                user.last_login_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn messages_to(&self, username: &str) -> DatabaseResult<Vec<InboxMessage>> {
        let tables = self.tables.read().await;
        let messages = tables
            .messages
            .iter()
            .filter(|m| m.to_username == username)
            .filter_map(|m| {
                Some(InboxMessage {
                    id: m.id,
                    body: m.body.clone(),
                    sent_at: m.sent_at,
                    read_at: m.read_at,
                    from_user: tables.summary(&m.from_username)?,
                })
            })
            .collect();
        Ok(messages)
    }

    async fn messages_from(&self, username: &str) -> DatabaseResult<Vec<OutboxMessage>> {
        let tables = self.tables.read().await;
        let messages = tables
            .messages
            .iter()
            .filter(|m| m.from_username == username)
            .filter_map(|m| {
                Some(OutboxMessage {
                    id: m.id,
                    body: m.body.clone(),
                    sent_at: m.sent_at,
                    read_at: m.read_at,
                    to_user: tables.summary(&m.to_username)?,
                })
            })
            .collect();
        Ok(messages)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: &Message) -> DatabaseResult<Option<Message>> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&message.from_username)
            || !tables.users.contains_key(&message.to_username)
        {
            return Ok(None);
        }
        tables.messages.push(message.clone());
        Ok(Some(message.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Message>> {
        let tables = self.tables.read().await;
        Ok(tables.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn find_detail(&self, id: Uuid) -> DatabaseResult<Option<MessageDetail>> {
        let tables = self.tables.read().await;
        let detail = tables.messages.iter().find(|m| m.id == id).and_then(|m| {
            Some(MessageDetail {
                id: m.id,
                body: m.body.clone(),
                sent_at: m.sent_at,
                read_at: m.read_at,
                from_user: tables.summary(&m.from_username)?,
                to_user: tables.summary(&m.to_username)?,
            })
        });
        Ok(detail)
    }

    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<Option<Message>> {
        let mut tables = self.tables.write().await;
        let message = tables.messages.iter_mut().find(|m| m.id == id).map(|m| {
            m.read_at.get_or_insert(at);
            m.clone()
        });
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> User {
        User {
            username: username.to_string(),
            password_hash: "unused".to_string(),
            first_name: username.to_uppercase(),
            last_name: "Test".to_string(),
            phone: "555-0100".to_string(),
            joined_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn message(from: &str, to: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            from_username: from.to_string(),
            to_username: to.to_string(),
            body: "hello".to_string(),
            sent_at: Utc::now(),
            read_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_user_rejects_duplicate_username() {
        let store = MemoryStore::new();
        assert!(store.insert_user(&user("alice")).await.unwrap().is_some());
        assert!(store.insert_user(&user("alice")).await.unwrap().is_none());
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_message_requires_both_parties() {
        let store = MemoryStore::new();
        store.insert_user(&user("alice")).await.unwrap();

        let orphan = message("alice", "nobody");
        assert!(store.insert_message(&orphan).await.unwrap().is_none());
        assert!(store.find_by_id(orphan.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_read_keeps_first_timestamp() {
        let store = MemoryStore::new();
        store.insert_user(&user("alice")).await.unwrap();
        store.insert_user(&user("bob")).await.unwrap();
        let sent = store
            .insert_message(&message("alice", "bob"))
            .await
            .unwrap()
            .unwrap();

        let first = Utc::now();
        let later = first + chrono::Duration::seconds(30);
        let once = store.mark_read(sent.id, first).await.unwrap().unwrap();
        let twice = store.mark_read(sent.id, later).await.unwrap().unwrap();

        assert_eq!(once.read_at, Some(first));
        assert_eq!(twice.read_at, Some(first));
    }

    #[tokio::test]
    async fn test_projections_join_counterpart_profile() {
        let store = MemoryStore::new();
        store.insert_user(&user("alice")).await.unwrap();
        store.insert_user(&user("bob")).await.unwrap();
        let sent = store
            .insert_message(&message("alice", "bob"))
            .await
            .unwrap()
            .unwrap();

        let inbox = store.messages_to("bob").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, sent.id);
        assert_eq!(inbox[0].from_user.first_name, "ALICE");

        let outbox = store.messages_from("alice").await.unwrap();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to_user.username, "bob");

        assert!(store.messages_to("alice").await.unwrap().is_empty());

        let detail = store.find_detail(sent.id).await.unwrap().unwrap();
        assert_eq!(detail.from_user.username, "alice");
        assert_eq!(detail.to_user.username, "bob");
    }
}
