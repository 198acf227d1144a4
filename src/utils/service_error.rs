// Service error type carrying the HTTP error taxonomy.
//
// Validation problems surface as 400, authorization as 401/403, unsupported
// event mutations as 405, and anything unexpected collapses into a generic
// 500 body so internals never leak to callers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::ValidationError(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
            ServiceError::NotFound => error_response(StatusCode::NOT_FOUND, "Resource not found"),
            ServiceError::Unauthorized => {
                error_response(StatusCode::UNAUTHORIZED, "Authentication required")
            }
            ServiceError::Forbidden => error_response(StatusCode::FORBIDDEN, "Forbidden"),
            ServiceError::MethodNotAllowed => {
                error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }
            ServiceError::UpstreamError(msg) => {
                tracing::error!("Upstream error: {}", msg);
                server_failure()
            }
            ServiceError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                server_failure()
            }
            ServiceError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                server_failure()
            }
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = Json(json!({
        "error": message,
        "status": status.as_u16()
    }));
    (status, body).into_response()
}

/// Generic 500 body; details stay in the logs
fn server_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "details": "server failure" })),
    )
        .into_response()
}

impl From<diesel::result::Error> for ServiceError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => ServiceError::NotFound,
            _ => ServiceError::DatabaseError(error.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for ServiceError {
    fn from(error: bcrypt::BcryptError) -> Self {
        ServiceError::InternalError(format!("Password hashing failed: {}", error))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        ServiceError::UpstreamError(error.to_string())
    }
}
