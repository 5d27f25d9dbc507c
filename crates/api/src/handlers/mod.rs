//! Request handlers for the workflow endpoints.
//!
//! Handlers parse the loosely-typed bodies the spreadsheet scripts and the
//! review system's action menu send, delegate to `notebridge_pipeline`, and
//! map failures via [`AppError`].

pub mod sheet_prep;
pub mod sync_notes;
pub mod sync_playlist;

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// Sheet read when a request names none.
pub const DEFAULT_SHEET_NAME: &str = "Notes Back";

/// Fallback for POST-only routes.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Decode a non-empty JSON object body. Anything else (empty body, invalid
/// JSON, `{}`, arrays) is "No JSON data provided".
pub(crate) fn json_object<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    let value: Value = serde_json::from_slice(body)
        .ok()
        .filter(|v: &Value| v.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| AppError::bad_request("No JSON data provided"))?;
    serde_json::from_value(value)
        .map_err(|e| AppError::bad_request(format!("Invalid request body: {e}")))
}

/// Required, non-blank string field.
pub(crate) fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::bad_request(format!("Missing required parameter: {name}")))
}
