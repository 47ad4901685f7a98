//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    identity::IdentityService,
    jwt::TokenCodec,
    messages::MessageAccessController,
    password::CredentialVerifier,
    repositories::{MessageStore, UserStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService,
    pub messages: MessageAccessController,
    pub tokens: Arc<dyn TokenCodec>,
}

impl AppState {
    /// Wire the services over the given stores and crypto strategies
    pub fn new(
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        credentials: Arc<dyn CredentialVerifier>,
        tokens: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            messages: MessageAccessController::new(messages, users.clone()),
            identity: IdentityService::new(users, credentials),
            tokens,
        }
    }
}
