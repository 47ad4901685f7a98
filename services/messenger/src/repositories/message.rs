//! PostgreSQL message repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use super::MessageStore;
use crate::models::{Message, MessageDetail, UserSummary};

/// Message repository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageRepository {
    async fn insert_message(&self, message: &Message) -> DatabaseResult<Option<Message>> {
        info!(
            "Creating message {} from {} to {}",
            message.id, message.from_username, message.to_username
        );

        let result = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, from_username, to_username, body, sent_at, read_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, from_username, to_username, body, sent_at, read_at
            "#,
        )
        .bind(message.id)
        .bind(&message.from_username)
        .bind(&message.to_username)
        .bind(&message.body)
        .bind(message.sent_at)
        .bind(message.read_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query);

        match result {
            Ok(message) => Ok(Some(message)),
            Err(e) if e.is_foreign_key_violation() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, from_username, to_username, body, sent_at, read_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(message)
    }

    async fn find_detail(&self, id: Uuid) -> DatabaseResult<Option<MessageDetail>> {
        let row = sqlx::query(
            r#"
            SELECT m.id, m.body, m.sent_at, m.read_at,
                   f.username AS f_username, f.first_name AS f_first_name,
                   f.last_name AS f_last_name, f.phone AS f_phone,
                   t.username AS t_username, t.first_name AS t_first_name,
                   t.last_name AS t_last_name, t.phone AS t_phone
            FROM messages m
            JOIN users f ON f.username = m.from_username
            JOIN users t ON t.username = m.to_username
            WHERE m.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        match row {
            Some(row) => {
                let detail = MessageDetail {
                    id: row.get("id"),
                    body: row.get("body"),
                    sent_at: row.get("sent_at"),
                    read_at: row.get("read_at"),
                    from_user: UserSummary {
                        username: row.get("f_username"),
                        first_name: row.get("f_first_name"),
                        last_name: row.get("f_last_name"),
                        phone: row.get("f_phone"),
                    },
                    to_user: UserSummary {
                        username: row.get("t_username"),
                        first_name: row.get("t_first_name"),
                        last_name: row.get("t_last_name"),
                        phone: row.get("t_phone"),
                    },
                };
                Ok(Some(detail))
            }
            None => Ok(None),
        }
    }

    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<Option<Message>> {
        // COALESCE keeps the first timestamp when two requests race
        let message = sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages
            SET read_at = COALESCE(read_at, $2)
            WHERE id = $1
            RETURNING id, from_username, to_username, body, sent_at, read_at
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(message)
    }
}
