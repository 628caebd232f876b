use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with, mapped deterministically to a status
/// code by the `IntoResponse` impl below.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("username must be between 3 and 30 characters")]
    InvalidUsername,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least 6 characters and contain an uppercase letter, a lowercase letter and a digit")]
    WeakPassword,
    #[error("user with this email or username already exists")]
    Conflict,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid ad id")]
    InvalidId,
    #[error("ad not found")]
    NotFound,
    #[error("not authorized to modify this ad")]
    Forbidden,
    #[error("invalid or expired token")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    UploadRejected(String),
    #[error("{0}")]
    RateLimited(&'static str),
    #[error("store failure")]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        use ApiError::*;
        match self {
            MissingField(_) | InvalidUsername | InvalidEmail | WeakPassword | Conflict
            | UserNotFound | InvalidCredentials | InvalidId | Validation(_)
            | UploadRejected(_) => StatusCode::BAD_REQUEST,
            Unauthorized => StatusCode::UNAUTHORIZED,
            Forbidden => StatusCode::FORBIDDEN,
            NotFound => StatusCode::NOT_FOUND,
            RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Store(_) | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Persistence errors are logged here and surfaced as a generic body,
        // never the underlying driver message.
        let message = match &self {
            ApiError::Store(e) => {
                error!(error = %e, "store failure");
                "Server error".to_string()
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::Conflict.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::RateLimited("slow down").status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ApiError::InvalidId.status(), StatusCode::BAD_REQUEST);
    }
}
