use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unified error type for the kanban-relay service.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No bootstrap credential is available (neither a persisted token
    /// record nor a configured seed refresh token).
    #[error("Credential configuration missing: {0}")]
    Configuration(String),

    /// The identity provider rejected or was unreachable during a token
    /// refresh. The previously persisted record is left untouched.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The drive's version token no longer matches the caller's. The caller
    /// must re-read and resubmit.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success response from the storage provider.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Token cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),

    #[error("Token cache format error: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::Conflict(_) => {
                let body = json!({
                    "message": "Conflict detected",
                    "hint": "Re-read the latest revision and merge before saving",
                });
                (StatusCode::CONFLICT, axum::Json(body)).into_response()
            }
            _ => {
                let body = json!({ "error": self.to_string() });
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
        }
    }
}
