use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use notebridge_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Most bodies are `{"error": ..., "code": ...}`; workflow failures on the
/// spreadsheet-facing endpoints use `{"status": "error", "message": ...}`,
/// which is what the spreadsheet scripts read.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `notebridge_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request, echoing the raw body when it helps the caller.
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        received_data: Option<String>,
    },

    /// A lookup miss with a caller-facing message.
    #[error("{0}")]
    NotFound(String),

    /// Any method other than POST on a POST-only route.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A spreadsheet workflow failed; reported as a status envelope.
    #[error("{0}")]
    SyncFailed(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            received_data: None,
        }
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string()),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                other => {
                    tracing::error!(error = %other, "Request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        other.to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest {
                message,
                received_data,
            } => {
                let mut body = json!({ "error": message, "code": "BAD_REQUEST" });
                if let Some(raw) = received_data {
                    body["received_data"] = json!(raw);
                }
                return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "Method not allowed. Use POST.".to_string(),
            ),
            AppError::SyncFailed(msg) => {
                tracing::error!(error = %msg, "Workflow failed");
                let body = json!({ "status": "error", "message": msg });
                return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
