//! Success envelopes returned to the spreadsheet scripts.

use serde::Serialize;

/// `{"status": "success", "message": ..., "details": ...}`.
#[derive(Debug, Serialize)]
pub struct StatusResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    pub details: T,
}

impl<T: Serialize> StatusResponse<T> {
    pub fn success(message: impl Into<String>, details: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            details,
        }
    }
}
