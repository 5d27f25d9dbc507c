use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use notebridge_core::error::CoreError;
use notebridge_core::import::ImportReport;

use crate::error::{AppError, AppResult};
use crate::handlers::{json_object, required, DEFAULT_SHEET_NAME};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncNotesRequest {
    pub spreadsheet_id: Option<String>,
    pub user_email: Option<String>,
    pub sheet_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncNotesResponse {
    pub status: &'static str,
    pub message: String,
    pub spreadsheet_id: String,
    pub user_email: Option<String>,
    pub details: ImportReport,
}

/// POST /sync-notes
///
/// Push the "Notes Back" rows of a spreadsheet to the review system.
pub async fn sync_notes(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<SyncNotesResponse>> {
    let input: SyncNotesRequest = json_object(&body)?;
    let spreadsheet_id = required(input.spreadsheet_id.as_deref(), "spreadsheetId")?;
    let sheet_name = input
        .sheet_name
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SHEET_NAME);
    let user_email = input.user_email.filter(|e| !e.trim().is_empty());

    tracing::info!(spreadsheet_id, sheet = sheet_name, user = ?user_email, "Sync notes requested");

    let report = state
        .importer()
        .import(spreadsheet_id, sheet_name, user_email.as_deref())
        .await
        .map_err(sync_failure)?;

    Ok(Json(SyncNotesResponse {
        status: "success",
        message: "Notes synced to ShotGrid successfully".to_string(),
        spreadsheet_id: spreadsheet_id.to_string(),
        user_email,
        details: report,
    }))
}

/// Content problems keep their own message; everything else is reported as
/// a failed sync.
fn sync_failure(err: CoreError) -> AppError {
    match err {
        CoreError::Data(msg) => AppError::SyncFailed(msg),
        err @ CoreError::Schema { .. } => AppError::SyncFailed(err.to_string()),
        other => AppError::SyncFailed(format!("Failed to sync notes: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use notebridge_core::error::RemoteError;

    use super::*;

    #[test]
    fn data_errors_keep_their_message() {
        assert_matches!(
            sync_failure(CoreError::Data("No valid note data found in sheet 'Notes Back'".into())),
            AppError::SyncFailed(msg) if msg == "No valid note data found in sheet 'Notes Back'"
        );
    }

    #[test]
    fn remote_errors_are_prefixed() {
        let err = sync_failure(CoreError::Remote(RemoteError::Api {
            service: "Google Sheets",
            status: 403,
            body: "forbidden".into(),
        }));
        assert_matches!(err, AppError::SyncFailed(msg) if msg.starts_with("Failed to sync notes: "));
    }
}
