//! Server error types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use deal_store::DealStoreError;
use serde::Serialize;
use serde_json::json;

/// A single rejected field in a request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payload failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication required.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Duplicate resource.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store failure, reported with a generic message.
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: DealStoreError,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Maps a store error. Constraint failures keep their meaning; anything
    /// else becomes a 500 carrying `context` as the client message.
    pub fn store(context: &'static str) -> impl FnOnce(DealStoreError) -> Self {
        move |source| match source {
            DealStoreError::NotFound { entity_type, .. } => {
                Self::NotFound(format!("{entity_type} not found"))
            }
            DealStoreError::AlreadyExists { entity_type, id } => {
                Self::Conflict(format!("{entity_type} \"{id}\" already exists"))
            }
            DealStoreError::ForeignKeyViolation(detail) => {
                tracing::debug!(%detail, "Rejected dangling reference");
                Self::InvalidRequest("Referenced make, model or user does not exist".to_string())
            }
            source => Self::Store { context, source },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match &self {
            ServerError::InvalidRequest(msg)
            | ServerError::NotFound(msg)
            | ServerError::PermissionDenied(msg)
            | ServerError::Conflict(msg) => (msg.clone(), None),
            ServerError::AuthenticationRequired => ("Authentication required".to_string(), None),
            ServerError::Validation(fields) => ("Validation failed".to_string(), Some(json!(fields))),
            ServerError::Store { context, source } => {
                tracing::error!(error = %source, "{context}");
                let details = cfg!(debug_assertions).then(|| json!(source.to_string()));
                (context.to_string(), details)
            }
            ServerError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                let details = cfg!(debug_assertions).then(|| json!(msg));
                ("Internal server error".to_string(), details)
            }
        };

        let mut error = json!({
            "code": status.as_u16(),
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
