use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::errors::FieldError;
use serde_json::json;
use service::{auth::errors::AuthError, errors::ServiceError};
use thiserror::Error;
use tracing::{error, warn};

/// Failure half of the response envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => json!({"success": false, "errors": errors}),
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                json!({"success": false, "error": "Server Error"})
            }
            other => json!({"success": false, "error": other.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(fields) => ApiError::Validation(fields),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Db(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(fields) => ApiError::Validation(fields),
            AuthError::Conflict => ApiError::Conflict("User already exists".into()),
            AuthError::NotFound => ApiError::NotFound("User not found".into()),
            AuthError::Unauthorized => ApiError::Unauthorized("Invalid credentials".into()),
            other => {
                warn!(code = other.code(), "auth failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
    fn from(r: PathRejection) -> Self { ApiError::BadRequest(format!("Invalid id: {}", r.body_text())) }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ApiError::from(ServiceError::invalid("title", "title is required")), StatusCode::BAD_REQUEST),
            (ApiError::from(ServiceError::not_found("Post")), StatusCode::NOT_FOUND),
            (ApiError::from(ServiceError::Unauthorized("nope".into())), StatusCode::UNAUTHORIZED),
            (ApiError::from(ServiceError::Db("pool timed out".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(AuthError::Conflict), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let resp = ApiError::Internal("password=hunter2".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
