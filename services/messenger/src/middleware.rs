//! Request guards for session validation and ownership checks
//!
//! A route group declares the [`Guard`]s it needs and [`guarded`] layers
//! them so they run in the declared order. The first failing guard answers
//! the request; later guards and the handler never run.

use std::collections::HashMap;

use axum::{
    Router, async_trait,
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::{self, Next},
    response::Response,
};
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Authenticated caller, attached to the request by [`authenticated`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Checks a route can require before its handler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// A valid session token must be presented
    Authenticated,
    /// The `:username` path parameter must be the caller
    SelfOnly,
}

/// Apply `guards` to every route in `router`, first guard outermost
pub fn guarded(router: Router<AppState>, guards: &[Guard], state: &AppState) -> Router<AppState> {
    // The layer added last runs first, so fold from the back
    guards.iter().rev().fold(router, |router, guard| match guard {
        Guard::Authenticated => {
            router.route_layer(middleware::from_fn_with_state(state.clone(), authenticated))
        }
        Guard::SelfOnly => router.route_layer(middleware::from_fn(self_only)),
    })
}

/// Extract the session token from the request
///
/// Accepts `Authorization: Bearer <token>`, falling back to a `_token`
/// query parameter.
pub fn session_token<B>(req: &Request<B>) -> Option<String> {
    if let Some(header) = req.headers().get(AUTHORIZATION) {
        return header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);
    }

    Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove("_token"))
}

/// Fail with [`ApiError::Forbidden`] unless `owner` is the caller
pub fn require_self(user: &AuthUser, owner: &str) -> ApiResult<()> {
    if user.username == owner {
        Ok(())
    } else {
        warn!("User {} denied access to resources of {}", user.username, owner);
        Err(ApiError::Forbidden)
    }
}

/// Validate the session token and attach the caller as [`AuthUser`]
pub async fn authenticated(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&req).ok_or(ApiError::Unauthorized)?;
    let username = state.tokens.verify(&token)?;

    req.extensions_mut().insert(AuthUser { username });

    Ok(next.run(req).await)
}

/// Reject callers acting on another user's `:username` resources
pub async fn self_only(
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthorized)?;
    let owner = params.get("username").ok_or(ApiError::Forbidden)?;

    require_self(user, owner)?;

    Ok(next.run(req).await)
}
