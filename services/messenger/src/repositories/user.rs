//! PostgreSQL user repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use super::UserStore;
use crate::models::{InboxMessage, OutboxMessage, User, UserSummary};

/// User repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Read the counterpart profile selected as `u_*` columns
fn counterpart(row: &PgRow) -> UserSummary {
    UserSummary {
        username: row.get("u_username"),
        first_name: row.get("u_first_name"),
        last_name: row.get("u_last_name"),
        phone: row.get("u_phone"),
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn insert_user(&self, user: &User) -> DatabaseResult<Option<User>> {
        info!("Creating new user: {}", user.username);

        // ON CONFLICT keeps the uniqueness check and the insert in one statement
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, phone, joined_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (username) DO NOTHING
            RETURNING username, password_hash, first_name, last_name, phone, joined_at, last_login_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.joined_at)
        .bind(user.last_login_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, password_hash, first_name, last_name, phone, joined_at, last_login_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(user)
    }

    async fn list_users(&self) -> DatabaseResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT username, first_name, last_name, phone
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(users)
    }

    async fn update_last_login(&self, username: &str, at: DateTime<Utc>) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = $2
            WHERE username = $1
            "#,
        )
        .bind(username)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn messages_to(&self, username: &str) -> DatabaseResult<Vec<InboxMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.body, m.sent_at, m.read_at,
                   u.username AS u_username, u.first_name AS u_first_name,
                   u.last_name AS u_last_name, u.phone AS u_phone
            FROM messages m
            JOIN users u ON u.username = m.from_username
            WHERE m.to_username = $1
            ORDER BY m.sent_at
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        let messages = rows
            .into_iter()
            .map(|row| InboxMessage {
                from_user: counterpart(&row),
                id: row.get("id"),
                body: row.get("body"),
                sent_at: row.get("sent_at"),
                read_at: row.get("read_at"),
            })
            .collect();

        Ok(messages)
    }

    async fn messages_from(&self, username: &str) -> DatabaseResult<Vec<OutboxMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.body, m.sent_at, m.read_at,
                   u.username AS u_username, u.first_name AS u_first_name,
                   u.last_name AS u_last_name, u.phone AS u_phone
            FROM messages m
            JOIN users u ON u.username = m.to_username
            WHERE m.from_username = $1
            ORDER BY m.sent_at
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        let messages = rows
            .into_iter()
            .map(|row| OutboxMessage {
                to_user: counterpart(&row),
                id: row.get("id"),
                body: row.get("body"),
                sent_at: row.get("sent_at"),
                read_at: row.get("read_at"),
            })
            .collect();

        Ok(messages)
    }
}
