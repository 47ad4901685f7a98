//! Messenger routes

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, Guard, guarded},
    models::{NewMessage, NewUser},
    validation,
};

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Request for sending a message
///
/// There is no sender field: the sender is always the caller.
#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub to_username: Option<String>,
    pub body: Option<String>,
}

/// Response for login and registration
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Create the router for the messenger service
pub fn create_router(state: AppState) -> Router {
    let authenticated = guarded(
        Router::new()
            .route("/users", get(list_users))
            .route("/messages", post(create_message))
            .route("/messages/:id", get(get_message))
            .route("/messages/:id/read", post(mark_read)),
        &[Guard::Authenticated],
        &state,
    );

    let self_only = guarded(
        Router::new()
            .route("/users/:username", get(get_user))
            .route("/users/:username/to", get(messages_to))
            .route("/users/:username/from", get(messages_from)),
        &[Guard::Authenticated, Guard::SelfOnly],
        &state,
    );

    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/register", post(register))
        .merge(authenticated)
        .merge(self_only)
        .fallback(not_found)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "messenger"
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route")
}

/// Unwrap a JSON body, reporting malformed input as a validation error
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

/// Take a required field, treating an empty string as missing
fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{} is required", field)))
}

/// Message ids that do not parse cannot exist
fn message_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Message"))
}

/// Sign a session token for `username`
fn issue_token(state: &AppState, username: &str) -> ApiResult<TokenResponse> {
    let token = state.tokens.issue(username).map_err(|e| {
        error!("Failed to issue session token: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(TokenResponse { token })
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let payload = body(payload)?;
    let (Some(username), Some(password)) = (
        payload.username.filter(|v| !v.is_empty()),
        payload.password.filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::Validation(
            "Username and password required".to_string(),
        ));
    };

    info!("Login attempt for user: {}", username);

    if !state.identity.authenticate(&username, &password).await? {
        warn!("Failed login for user: {}", username);
        return Err(ApiError::Authentication);
    }

    // Signing is pure, so do it before any write. The login timestamp is
    // stored before the token leaves the service.
    let token = issue_token(&state, &username)?;
    state.identity.record_login(&username).await?;

    Ok(Json(token))
}

/// Registration endpoint, logs the new user in
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let payload = body(payload)?;
    let new_user = NewUser {
        username: required(payload.username, "Username")?,
        password: required(payload.password, "Password")?,
        first_name: required(payload.first_name, "First name")?,
        last_name: required(payload.last_name, "Last name")?,
        phone: required(payload.phone, "Phone")?,
    };

    validation::validate_username(&new_user.username).map_err(ApiError::Validation)?;
    validation::validate_password(&new_user.password).map_err(ApiError::Validation)?;
    validation::validate_required("First name", &new_user.first_name)
        .map_err(ApiError::Validation)?;
    validation::validate_required("Last name", &new_user.last_name)
        .map_err(ApiError::Validation)?;
    validation::validate_phone(&new_user.phone).map_err(ApiError::Validation)?;

    let token = issue_token(&state, &new_user.username)?;
    state.identity.sign_up(new_user).await?;

    Ok(Json(token))
}

/// List all users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.identity.list().await?;
    Ok(Json(json!({ "users": users })))
}

/// Get the caller's own profile
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = state.identity.get(&username).await?;
    Ok(Json(json!({ "user": user })))
}

/// Messages received by the caller
pub async fn messages_to(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.identity.messages_to(&username).await?;
    Ok(Json(json!({ "messages": messages })))
}

/// Messages sent by the caller
pub async fn messages_from(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.identity.messages_from(&username).await?;
    Ok(Json(json!({ "messages": messages })))
}

/// Get a message the caller sent or received
pub async fn get_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .messages
        .get(message_id(&id)?, &user.username)
        .await
        .map_err(|e| e.conceal("Message"))?;

    Ok(Json(json!({ "message": message })))
}

/// Send a message as the caller
pub async fn create_message(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = body(payload)?;
    let to_username = required(payload.to_username, "Recipient")?;
    let text = required(payload.body, "Message body")?;
    validation::validate_body(&text).map_err(ApiError::Validation)?;

    let message = state
        .messages
        .create(NewMessage {
            from_username: user.username,
            to_username,
            body: text,
        })
        .await?;

    Ok(Json(json!({ "message": message })))
}

/// Mark a message addressed to the caller as read
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .messages
        .mark_read(message_id(&id)?, &user.username)
        .await
        .map_err(|e| e.conceal("Message"))?;

    Ok(Json(json!({ "message": message })))
}
