//! User registration, authentication and user-centric reads

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    models::{InboxMessage, NewUser, OutboxMessage, User, UserDetail, UserSummary},
    password::CredentialVerifier,
    repositories::UserStore,
};

/// Identity service
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialVerifier>,
}

impl IdentityService {
    /// Create a new identity service
    pub fn new(users: Arc<dyn UserStore>, credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self { users, credentials }
    }

    /// Register a new user
    ///
    /// The new record has `joined_at = now` and no `last_login_at`.
    pub async fn register(&self, new_user: NewUser) -> ApiResult<User> {
        self.create(new_user, false).await
    }

    /// Register a new user who is logged in by the same request
    ///
    /// The record is written with `last_login_at = joined_at` in a single
    /// store insert, so a failure leaves no user behind.
    pub async fn sign_up(&self, new_user: NewUser) -> ApiResult<User> {
        self.create(new_user, true).await
    }

    async fn create(&self, new_user: NewUser, logged_in: bool) -> ApiResult<User> {
        let password_hash = self.credentials.hash(&new_user.password).map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::InternalServerError
        })?;

        let now = Utc::now();
        let user = User {
            username: new_user.username,
            password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
            joined_at: now,
            last_login_at: logged_in.then_some(now),
        };

        let created = self
            .users
            .insert_user(&user)
            .await?
            .ok_or(ApiError::DuplicateUser)?;

        info!("Registered user: {}", created.username);
        Ok(created)
    }

    /// Check a username/password pair
    ///
    /// An unknown username yields `false`, exactly like a wrong password.
    pub async fn authenticate(&self, username: &str, password: &str) -> ApiResult<bool> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Ok(false);
        };

        self.credentials
            .verify(password, &user.password_hash)
            .map_err(|e| {
                error!("Stored password hash for {} is unusable: {}", username, e);
                ApiError::InternalServerError
            })
    }

    /// Stamp `last_login_at` with the current time
    pub async fn record_login(&self, username: &str) -> ApiResult<()> {
        if self.users.update_last_login(username, Utc::now()).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound("User"))
        }
    }

    /// Get a user's profile and account timestamps
    pub async fn get(&self, username: &str) -> ApiResult<UserDetail> {
        self.users
            .find_by_username(username)
            .await?
            .map(UserDetail::from)
            .ok_or(ApiError::NotFound("User"))
    }

    /// List all users' public profiles
    pub async fn list(&self) -> ApiResult<Vec<UserSummary>> {
        Ok(self.users.list_users().await?)
    }

    /// Messages received by `username`
    pub async fn messages_to(&self, username: &str) -> ApiResult<Vec<InboxMessage>> {
        Ok(self.users.messages_to(username).await?)
    }

    /// Messages sent by `username`
    pub async fn messages_from(&self, username: &str) -> ApiResult<Vec<OutboxMessage>> {
        Ok(self.users.messages_from(username).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{password::Argon2Verifier, repositories::MemoryStore};
    use argon2::Params;

    fn service() -> (IdentityService, MemoryStore) {
        let store = MemoryStore::new();
        let credentials = Argon2Verifier::with_params(Params::new(1024, 1, 1, None).unwrap());
        let service = IdentityService::new(Arc::new(store.clone()), Arc::new(credentials));
        (service, store)
    }

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (service, _) = service();
        let user = service.register(new_user("alice", "pw1")).await.unwrap();

        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw1");
        assert!(user.last_login_at.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_stamps_login_in_one_write() {
        let (service, _) = service();
        let user = service.sign_up(new_user("alice", "pw1")).await.unwrap();

        assert_eq!(user.last_login_at, Some(user.joined_at));
        let detail = service.get("alice").await.unwrap();
        assert_eq!(detail.last_login_at, Some(detail.joined_at));
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_username_keeps_existing_record() {
        let (service, _) = service();
        let first = service.register(new_user("alice", "pw1")).await.unwrap();

        let result = service.sign_up(new_user("alice", "pw2")).await;
        assert!(matches!(result, Err(ApiError::DuplicateUser)));

        let detail = service.get("alice").await.unwrap();
        assert_eq!(detail.joined_at, first.joined_at);
        assert!(detail.last_login_at.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (service, _) = service();
        service.register(new_user("alice", "pw1")).await.unwrap();

        let result = service.register(new_user("alice", "other")).await;
        assert!(matches!(result, Err(ApiError::DuplicateUser)));

        // The original credentials are untouched
        assert!(service.authenticate("alice", "pw1").await.unwrap());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (service, _) = service();
        service.register(new_user("alice", "pw1")).await.unwrap();

        assert!(service.authenticate("alice", "pw1").await.unwrap());
        assert!(!service.authenticate("alice", "wrong").await.unwrap());
        assert!(!service.authenticate("nobody", "pw1").await.unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_with_corrupt_hash_is_internal_error() {
        let (service, store) = service();
        store
            .insert_user(&User {
                username: "broken".to_string(),
                password_hash: "plaintext?".to_string(),
                first_name: "B".to_string(),
                last_name: "R".to_string(),
                phone: "1".to_string(),
                joined_at: Utc::now(),
                last_login_at: None,
            })
            .await
            .unwrap();

        let result = service.authenticate("broken", "plaintext?").await;
        assert!(matches!(result, Err(ApiError::InternalServerError)));
    }

    #[tokio::test]
    async fn test_record_login_updates_timestamp() {
        let (service, _) = service();
        let user = service.register(new_user("alice", "pw1")).await.unwrap();

        service.record_login("alice").await.unwrap();

        let detail = service.get("alice").await.unwrap();
        let last_login = detail.last_login_at.expect("last login recorded");
        assert!(last_login >= user.joined_at);
    }

    #[tokio::test]
    async fn test_record_login_unknown_user() {
        let (service, _) = service();
        assert!(matches!(
            service.record_login("ghost").await,
            Err(ApiError::NotFound("User"))
        ));
    }

    #[tokio::test]
    async fn test_get_and_list() {
        let (service, _) = service();
        service.register(new_user("bob", "pw")).await.unwrap();
        service.register(new_user("alice", "pw")).await.unwrap();

        let users = service.list().await.unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);

        assert!(matches!(
            service.get("carol").await,
            Err(ApiError::NotFound("User"))
        ));
    }
}
