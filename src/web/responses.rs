//! HTTP response types and utilities
//!
//! JSON endpoints answer with an [`ApiResponse`] envelope. Preview responses
//! are raw JPEG bytes and only fall back to the envelope for errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::errors::{AppError, PreviewError};
use crate::services::CacheStats;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Request timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an error response
    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Body of a successful `POST /clear`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub message: String,
    pub cleared_entries: usize,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub cache: CacheStats,
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Preview request failed: {}", self);
        } else {
            warn!("Rejected preview request: {}", self);
        }

        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> Response {
    let (status, message) = match error {
        AppError::Preview(preview_error) => return preview_error.into_response(),
        AppError::Cache(cache_error) => {
            error!("Cache operation failed: {}", cache_error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Cache operation failed: {cache_error}"),
            )
        }
        AppError::Configuration { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Configuration error: {message}"),
        ),
    };

    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

/// Success response helper
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}
