//! Sheet preparation between export and import.

use std::sync::Arc;

use serde::Serialize;

use notebridge_core::error::CoreError;
use notebridge_core::matching::match_client_versions;
use notebridge_core::prep::{highlighted_spans, plan_note_prep};
use notebridge_core::remote::{SpreadsheetService, ValueInput, ValueRender};
use notebridge_core::sheet::{find_worksheet, SheetRange, FIRST_DATA_ROW};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub matched: usize,
    pub unmatched: usize,
    /// Client versions no internal code claimed.
    pub unplaced: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrepSummary {
    pub filled_rows: usize,
    pub cleared_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub cleared_rows: usize,
}

pub struct SheetPrep {
    sheets: Arc<dyn SpreadsheetService>,
}

impl SheetPrep {
    pub fn new(sheets: Arc<dyn SpreadsheetService>) -> Self {
        Self { sheets }
    }

    /// Re-seat client versions (B, with notes in C) beside the internal
    /// codes in A that share their shot base. The header row is untouched.
    pub async fn match_versions(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<MatchSummary, CoreError> {
        let values = self
            .sheets
            .read_values(spreadsheet_id, &SheetRange::columns(sheet_name, 0, 2), ValueRender::Formatted)
            .await?;
        let data_rows = data_rows(&values, sheet_name)?;

        let outcome = match_client_versions(data_rows);
        let last_row = FIRST_DATA_ROW + outcome.rows.len() - 1;
        self.sheets
            .write_values(
                spreadsheet_id,
                &SheetRange::block(sheet_name, 0, FIRST_DATA_ROW, 2, last_row),
                outcome.rows,
                ValueInput::Raw,
            )
            .await?;

        if !outcome.unplaced.is_empty() {
            tracing::warn!(unplaced = ?outcome.unplaced, "Client versions without an internal match");
        }
        tracing::info!(matched = outcome.matched, unmatched = outcome.unmatched, "Client versions matched");
        Ok(MatchSummary {
            matched: outcome.matched,
            unmatched: outcome.unmatched,
            unplaced: outcome.unplaced,
        })
    }

    /// Copy the template row's E/F formulas onto every note row and clear
    /// D–F on rows without a client version.
    pub async fn prepare_notes(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<PrepSummary, CoreError> {
        let values = self
            .sheets
            .read_values(spreadsheet_id, &SheetRange::whole(sheet_name), ValueRender::Formula)
            .await?;
        data_rows(&values, sheet_name)?;

        let plan = plan_note_prep(sheet_name, &values);
        self.sheets
            .write_batch(spreadsheet_id, plan.formulas, ValueInput::UserEntered)
            .await?;
        self.sheets
            .write_batch(spreadsheet_id, plan.clears, ValueInput::Raw)
            .await?;

        tracing::info!(filled = plan.filled_rows, cleared = plan.cleared_rows, "Note rows prepared");
        Ok(PrepSummary {
            filled_rows: plan.filled_rows,
            cleared_rows: plan.cleared_rows,
        })
    }

    /// Clear the D–F background of every data row with content there.
    pub async fn reset_highlights(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<ResetSummary, CoreError> {
        let worksheets = self.sheets.worksheets(spreadsheet_id).await?;
        let worksheet = find_worksheet(&worksheets, sheet_name).ok_or_else(|| CoreError::NotFound {
            entity: "Worksheet",
            key: sheet_name.to_string(),
        })?;

        let values = self
            .sheets
            .read_values(spreadsheet_id, &SheetRange::whole(sheet_name), ValueRender::Formatted)
            .await?;
        let spans = highlighted_spans(&values);
        self.sheets
            .set_backgrounds(spreadsheet_id, worksheet.sheet_id, &spans, None)
            .await?;

        tracing::info!(rows = spans.len(), "Highlights cleared");
        Ok(ResetSummary {
            cleared_rows: spans.len(),
        })
    }
}

/// Rows below the header; `Data` error when there are none.
fn data_rows<'a>(values: &'a [Vec<String>], sheet_name: &str) -> Result<&'a [Vec<String>], CoreError> {
    match values {
        [_, rest @ ..] if !rest.is_empty() => Ok(rest),
        _ => Err(CoreError::Data(format!("No data rows found in sheet '{sheet_name}'"))),
    }
}
