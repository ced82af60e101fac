//! API error taxonomy and its HTTP mapping.
//!
//! Every handler returns `Result<_, ApiError>`. Failures are turned into a
//! short JSON body at the request boundary:
//!
//! ```json
//! { "error": "forbidden", "message": "This place belongs to another account" }
//! ```
//!
//! Upstream failures (store, object storage) are logged with their full
//! context chain and reported to the client without internal detail.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::database::StoreError;
use crate::storage::ObjectStoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request field
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Missing or invalid credential
    #[error("Authentication required")]
    Unauthenticated,

    /// Login failed; does not say whether the email or the password was wrong
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but not the owner of the resource
    #[error("{0}")]
    Forbidden(String),

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Uniqueness violation (email already registered, guide already exists)
    #[error("{0}")]
    Conflict(String),

    /// Store or object storage failure
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a required field that was absent or blank
    pub fn missing(field: &str) -> Self {
        Self::validation(field, format!("{field} is required"))
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Upstream(_) => "upstream_failure",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::Backend(e) => Self::Upstream(e),
        }
    }
}

impl From<ObjectStoreError> for ApiError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::Fetch { .. } => Self::validation("link", err.to_string()),
            other => Self::Upstream(anyhow::Error::new(other)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("body", rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::validation("body", err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream(e) => tracing::error!("Upstream failure: {:#}", e),
            Self::Unauthenticated | Self::InvalidCredentials | Self::Forbidden(_) => {
                tracing::warn!("Rejected request: {}", self)
            }
            _ => tracing::debug!("Client error: {}", self),
        }

        let message = match &self {
            Self::Upstream(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let field = match &self {
            Self::Validation { field, .. } => Some(field.as_str()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.code(),
            message: &message,
            field,
        };

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::missing("title").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::Forbidden("no".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("Place").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("dup".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Upstream(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_upstream_error_hides_detail() {
        let response = ApiError::Upstream(anyhow::anyhow!("connection refused to 10.0.0.3")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "upstream_failure");
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let response = ApiError::missing("email").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], "email");
        assert_eq!(body["message"], "email is required");
    }
}
