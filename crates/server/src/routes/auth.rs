use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use service::auth::domain::{AuthSession, AuthUser, LoginInput, RegisterInput, UpdateDetailsInput, UpdatePasswordInput};

use crate::envelope::{Empty, Envelope, WithStatus};
use crate::errors::ApiError;
use crate::extract::{CurrentUser, AUTH_COOKIE};
use crate::state::ServerState;

#[derive(Serialize)]
pub struct LoginOutput {
    pub success: bool,
    pub token: String,
    pub data: AuthUser,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<WithStatus<AuthUser>, ApiError> {
    let Json(input) = body?;
    let user = state.auth.register(input).await?;
    Ok(WithStatus(StatusCode::CREATED, Envelope::data(user)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginOutput>), ApiError> {
    let Json(input) = body?;
    let session = state.auth.login(input).await?;
    Ok(with_session_cookie(jar, session))
}

/// Token response plus the HttpOnly cookie carrying the same token.
fn with_session_cookie(jar: CookieJar, session: AuthSession) -> (CookieJar, Json<LoginOutput>) {
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let out = LoginOutput { success: true, token: session.token, data: session.user };
    (jar.add(cookie), Json(out))
}

#[utoipa::path(get, path = "/auth/logout", tag = "auth", responses((status = 200, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, Envelope::data(Empty::default()))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")), security(("bearer" = [])))]
pub async fn me(user: CurrentUser) -> Envelope<AuthUser> {
    Envelope::data(user.0)
}

#[utoipa::path(put, path = "/auth/updatedetails", tag = "auth", request_body = crate::openapi::UpdateDetailsRequest, responses((status = 200, description = "Updated user"), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized"), (status = 409, description = "Email taken")), security(("bearer" = [])))]
pub async fn update_details(
    State(state): State<ServerState>,
    user: CurrentUser,
    body: Result<Json<UpdateDetailsInput>, JsonRejection>,
) -> Result<Envelope<AuthUser>, ApiError> {
    let Json(input) = body?;
    Ok(Envelope::data(state.auth.update_details(&user.0, input).await?))
}

#[utoipa::path(put, path = "/auth/updatepassword", tag = "auth", request_body = crate::openapi::UpdatePasswordRequest, responses((status = 200, description = "Password changed, new token issued"), (status = 400, description = "Bad Request"), (status = 401, description = "Wrong current password")), security(("bearer" = [])))]
pub async fn update_password(
    State(state): State<ServerState>,
    jar: CookieJar,
    user: CurrentUser,
    body: Result<Json<UpdatePasswordInput>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginOutput>), ApiError> {
    let Json(input) = body?;
    let session = state.auth.update_password(&user.0, input).await?;
    Ok(with_session_cookie(jar, session))
}
