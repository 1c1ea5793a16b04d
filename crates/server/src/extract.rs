//! Request extractors shared by the route modules.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use service::auth::{domain::AuthUser, errors::AuthError};
use service::authz::Actor;
use tracing::debug;

use crate::errors::ApiError;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// The authenticated caller. Rejects with 401 when no valid token is sent.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl CurrentUser {
    pub fn actor(&self) -> Actor { Actor::from(&self.0) }
}

/// `Authorization: Bearer <token>`, falling back to the `auth_token` cookie.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

#[axum::async_trait]
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let denied = || ApiError::Unauthorized("Not authorized to access this route".into());
        let Some(token) = token_from_parts(parts) else {
            debug!(path = %parts.uri.path(), "no credentials on request");
            return Err(denied());
        };
        match state.auth.resolve(&token).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(AuthError::Repository(msg)) => Err(ApiError::Internal(msg)),
            Err(_) => Err(denied()),
        }
    }
}
