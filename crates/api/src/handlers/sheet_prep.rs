//! Sheet preparation endpoints, called from the spreadsheet's script menu.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use notebridge_core::error::CoreError;
use notebridge_pipeline::prep::{MatchSummary, PrepSummary, ResetSummary};

use crate::error::{AppError, AppResult};
use crate::handlers::{json_object, required, DEFAULT_SHEET_NAME};
use crate::response::StatusResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRequest {
    pub spreadsheet_id: Option<String>,
    pub sheet_name: Option<String>,
}

impl SheetRequest {
    fn parse(body: &Bytes) -> AppResult<(String, String)> {
        let input: Self = json_object(body)?;
        let spreadsheet_id = required(input.spreadsheet_id.as_deref(), "spreadsheetId")?.to_string();
        let sheet_name = input
            .sheet_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());
        Ok((spreadsheet_id, sheet_name))
    }
}

fn prep_failure(action: &str) -> impl FnOnce(CoreError) -> AppError + '_ {
    move |err| match err {
        CoreError::Data(msg) => AppError::SyncFailed(msg),
        other => AppError::SyncFailed(format!("Failed to {action}: {other}")),
    }
}

/// POST /match-versions
pub async fn match_versions(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<StatusResponse<MatchSummary>>> {
    let (spreadsheet_id, sheet_name) = SheetRequest::parse(&body)?;
    let summary = state
        .sheet_prep()
        .match_versions(&spreadsheet_id, &sheet_name)
        .await
        .map_err(prep_failure("match versions"))?;

    let message = format!(
        "Matched {} client versions, {} without a match",
        summary.matched, summary.unmatched
    );
    Ok(Json(StatusResponse::success(message, summary)))
}

/// POST /prepare-notes
pub async fn prepare_notes(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<StatusResponse<PrepSummary>>> {
    let (spreadsheet_id, sheet_name) = SheetRequest::parse(&body)?;
    let summary = state
        .sheet_prep()
        .prepare_notes(&spreadsheet_id, &sheet_name)
        .await
        .map_err(prep_failure("prepare notes"))?;

    let message = format!(
        "Prepared {} note rows, cleared {}",
        summary.filled_rows, summary.cleared_rows
    );
    Ok(Json(StatusResponse::success(message, summary)))
}

/// POST /reset-highlights
pub async fn reset_highlights(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<StatusResponse<ResetSummary>>> {
    let (spreadsheet_id, sheet_name) = SheetRequest::parse(&body)?;
    let summary = state
        .sheet_prep()
        .reset_highlights(&spreadsheet_id, &sheet_name)
        .await
        .map_err(prep_failure("reset highlights"))?;

    let message = format!("Cleared highlights on {} rows", summary.cleared_rows);
    Ok(Json(StatusResponse::success(message, summary)))
}
