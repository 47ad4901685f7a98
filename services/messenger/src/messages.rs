//! Per-message access rules
//!
//! Ownership checks run against the loaded record: the two usernames stored
//! on a message are the only source of truth for who may act on it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Message, MessageDetail, NewMessage},
    repositories::{MessageStore, UserStore},
};

/// Message access controller
#[derive(Clone)]
pub struct MessageAccessController {
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserStore>,
}

impl MessageAccessController {
    /// Create a new message access controller
    pub fn new(messages: Arc<dyn MessageStore>, users: Arc<dyn UserStore>) -> Self {
        Self { messages, users }
    }

    /// Get a message with both parties' profiles
    ///
    /// Only the sender and the recipient may read a message.
    pub async fn get(&self, id: Uuid, caller: &str) -> ApiResult<MessageDetail> {
        let message = self
            .messages
            .find_detail(id)
            .await?
            .ok_or(ApiError::NotFound("Message"))?;

        if !message.is_party(caller) {
            warn!("User {} denied access to message {}", caller, id);
            return Err(ApiError::Forbidden);
        }

        Ok(message)
    }

    /// Send a message
    ///
    /// `new_message.from_username` must be the authenticated caller; it is
    /// never taken from the request body. A caller whose account no longer
    /// exists holds a stale session and is rejected as unauthorized.
    pub async fn create(&self, new_message: NewMessage) -> ApiResult<Message> {
        if self
            .users
            .find_by_username(&new_message.from_username)
            .await?
            .is_none()
        {
            warn!(
                "Session for unknown user {} tried to send a message",
                new_message.from_username
            );
            return Err(ApiError::Unauthorized);
        }

        let message = Message {
            id: Uuid::new_v4(),
            from_username: new_message.from_username,
            to_username: new_message.to_username,
            body: new_message.body,
            sent_at: Utc::now(),
            read_at: None,
        };

        let created = self
            .messages
            .insert_message(&message)
            .await?
            .ok_or_else(|| ApiError::Validation("Unknown recipient".to_string()))?;

        info!(
            "Message {} sent from {} to {}",
            created.id, created.from_username, created.to_username
        );
        Ok(created)
    }

    /// Mark a message as read
    ///
    /// Only the recipient may do this. Marking an already-read message
    /// succeeds and keeps the original `read_at`.
    pub async fn mark_read(&self, id: Uuid, caller: &str) -> ApiResult<Message> {
        let message = self
            .messages
            .find_by_id(id)
            .await?
            .ok_or(ApiError::NotFound("Message"))?;

        if !message.is_recipient(caller) {
            warn!("User {} is not the recipient of message {}", caller, id);
            return Err(ApiError::Forbidden);
        }

        if message.read_at.is_some() {
            return Ok(message);
        }

        self.messages
            .mark_read(id, Utc::now())
            .await?
            .ok_or(ApiError::NotFound("Message"))
    }
}
