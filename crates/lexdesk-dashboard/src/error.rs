//! Error types for the dashboard crate.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lexdesk_core::ValidationError;
use lexdesk_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur in the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Failed to start the server.
    #[error("failed to start dashboard: {0}")]
    StartupFailed(String),

    /// No valid session.
    #[error("Unauthorized")]
    Unauthenticated,

    /// Signed in, but the role does not allow the action.
    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for DashboardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Validation(inner) => Self::Validation(inner),
            other => Self::Store(other),
        }
    }
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Store(err) if err.is_conflict() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            json!({ "message": "Internal Server Error" })
        } else if let Self::Validation(err) = &self {
            json!({ "message": err.to_string(), "field": err.field() })
        } else {
            json!({ "message": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdesk_core::EntityKind;

    #[test]
    fn store_errors_map_to_http_status() {
        let missing = DashboardError::from(StoreError::not_found(EntityKind::Client, "c1"));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let in_use = DashboardError::from(StoreError::InUse {
            entity: EntityKind::Client,
            id: "c1".into(),
            referenced_by: "contracts.client_id".into(),
        });
        assert_eq!(in_use.status(), StatusCode::CONFLICT);

        let backend = DashboardError::from(StoreError::Backend("lock poisoned".into()));
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_is_bad_request() {
        let err = DashboardError::from(ValidationError::MissingField("title".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
