use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use super::access::AccessDenied;
use super::identity::CredentialError;
use super::repository::RepositoryError;

/// Outcome taxonomy shared by every portal operation.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PortalError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::Conflict(_) => StatusCode::CONFLICT,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            PortalError::Internal(cause) => {
                error!(%cause, "portal operation failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<RepositoryError> for PortalError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(message) => PortalError::Conflict(message),
            RepositoryError::NotFound => PortalError::NotFound("record not found".to_string()),
            RepositoryError::Unavailable(cause) => PortalError::Internal(cause),
        }
    }
}

impl From<AccessDenied> for PortalError {
    fn from(value: AccessDenied) -> Self {
        match value {
            AccessDenied::Unauthenticated => PortalError::Unauthorized(value.to_string()),
            AccessDenied::PendingApproval
            | AccessDenied::NotApproved
            | AccessDenied::InsufficientPermissions => PortalError::Forbidden(value.to_string()),
        }
    }
}

impl From<CredentialError> for PortalError {
    fn from(value: CredentialError) -> Self {
        PortalError::Internal(value.to_string())
    }
}
