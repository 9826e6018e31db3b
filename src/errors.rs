use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::request_id::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "NOT_FOUND",
    "message": "Restaurant 550e8400-e29b-41d4-a716-446655440000 not found",
    "details": null,
    "request_id": "0e8cbd4e-7b3f-4d2a-9c3e-1f2a6b7c8d90",
    "timestamp": "2025-11-02T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Machine-distinguishable error kind
    #[schema(example = "NOT_FOUND")]
    pub error: String,
    /// Human-readable description
    pub message: String,
    /// Optional extra detail (field-level validation output)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Correlation id for support and log searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp of the failure
    pub timestamp: String,
}

/// Unified service-layer error. Handlers return this directly; the
/// `IntoResponse` impl maps each variant onto an HTTP status and the
/// standard [`ErrorResponse`] body.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Illegal status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::JwtError(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidStatusTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DatabaseError(_) | Self::HashError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable kind carried in the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) | Self::JwtError(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::HashError(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Message suitable for the wire. Internal failures collapse to a
    /// generic message so implementation details never leak.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::HashError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::ValidationError(errors.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.response_message(),
            details: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
