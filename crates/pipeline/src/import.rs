//! "Notes Back" rows → review-system notes and status updates.

use std::sync::Arc;

use notebridge_core::error::CoreError;
use notebridge_core::import::{
    note_links, parse_note_rows, FailedNote, ImportReport, NoteRow, VERSION_NOT_FOUND,
};
use notebridge_core::remote::{ReviewSystem, SpreadsheetService, ValueRender};
use notebridge_core::schema::SheetSchema;
use notebridge_core::sheet::{
    find_worksheet, rectangular, GridRect, SheetRange, Worksheet, LIME_GREEN,
};
use notebridge_core::types::{EntityId, EntityRef};

use crate::review;

/// Why a single row did not produce a note.
enum RowFailure {
    VersionNotFound,
    Remote(CoreError),
}

impl From<CoreError> for RowFailure {
    fn from(err: CoreError) -> Self {
        Self::Remote(err)
    }
}

pub struct NotesImporter {
    review: Arc<dyn ReviewSystem>,
    sheets: Arc<dyn SpreadsheetService>,
}

impl NotesImporter {
    pub fn new(review: Arc<dyn ReviewSystem>, sheets: Arc<dyn SpreadsheetService>) -> Self {
        Self { review, sheets }
    }

    /// Push every valid row of `sheet_name` to the review system as a note.
    ///
    /// Rows are independent: a failing row is reported in the result and
    /// the rest still run. Only a missing sheet, missing headers, an empty
    /// sheet or an unreadable sheet fail the whole import.
    pub async fn import(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        author_email: Option<&str>,
    ) -> Result<ImportReport, CoreError> {
        tracing::info!(spreadsheet_id, sheet = sheet_name, "Syncing notes");

        let worksheets = self.sheets.worksheets(spreadsheet_id).await?;
        let worksheet = find_worksheet(&worksheets, sheet_name)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "Worksheet",
                key: sheet_name.to_string(),
            })?;

        let values = rectangular(
            self.sheets
                .read_values(spreadsheet_id, &SheetRange::whole(sheet_name), ValueRender::Formatted)
                .await?,
        );
        let Some((headers, data_rows)) = values.split_first().filter(|(_, rest)| !rest.is_empty())
        else {
            return Err(CoreError::Data(format!(
                "No data found in sheet '{sheet_name}' (only headers or empty)"
            )));
        };

        let schema = SheetSchema::resolve(sheet_name, headers)?;
        let parsed = parse_note_rows(&schema, data_rows);
        if parsed.rows.is_empty() {
            return Err(CoreError::Data(format!(
                "No valid note data found in sheet '{sheet_name}'"
            )));
        }
        tracing::info!(notes = parsed.rows.len(), skipped = parsed.skipped_rows, "Valid notes found");

        let mut author: Option<EntityRef> = None;
        let mut successful_rows = Vec::new();
        let mut failures = Vec::new();

        for row in &parsed.rows {
            match self.sync_row(row, author_email, &mut author).await {
                Ok(note_id) => {
                    tracing::info!(note_id, version = %row.version_code, "Note created");
                    successful_rows.push(row.row_number);
                }
                Err(RowFailure::VersionNotFound) => {
                    tracing::warn!(version = %row.version_code, "Version not found");
                    failures.push(FailedNote {
                        version_code: row.version_code.clone(),
                        error: VERSION_NOT_FOUND.to_string(),
                    });
                }
                Err(RowFailure::Remote(e)) => {
                    tracing::error!(version = %row.version_code, error = %e, "Note sync failed");
                    failures.push(FailedNote {
                        version_code: row.version_code.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.highlight(spreadsheet_id, &worksheet, &schema, &successful_rows)
            .await;

        let report = ImportReport::summarize(&parsed, &successful_rows, failures, author_email);
        tracing::info!(
            succeeded = report.success_count,
            failed = report.failed_count,
            "Notes sync finished"
        );
        Ok(report)
    }

    async fn sync_row(
        &self,
        row: &NoteRow,
        author_email: Option<&str>,
        author: &mut Option<EntityRef>,
    ) -> Result<EntityId, RowFailure> {
        let review = self.review.as_ref();

        let version = review::version_by_code(review, &row.version_code)
            .await?
            .ok_or(RowFailure::VersionNotFound)?;

        let user = match author {
            Some(user) => user.clone(),
            None => {
                let user = review::resolve_author(review, author_email).await?;
                *author = Some(user.clone());
                user
            }
        };

        let note_id = review::create_note(
            review,
            version.project.as_ref(),
            &row.body,
            &note_links(&version),
            &user,
        )
        .await?;

        if !row.status_code.is_empty() {
            if let Err(e) = review::set_version_status(review, version.id, &row.status_code).await {
                tracing::warn!(version = %row.version_code, error = %e, "Failed to update version status");
            }
        }
        Ok(note_id)
    }

    /// Lime-green the four source cells of every synced row in one call.
    async fn highlight(
        &self,
        spreadsheet_id: &str,
        worksheet: &Worksheet,
        schema: &SheetSchema,
        rows: &[usize],
    ) {
        if rows.is_empty() {
            return;
        }
        let cells: Vec<GridRect> = rows
            .iter()
            .flat_map(|&row| schema.positions().map(|col| GridRect::cell(row, col)))
            .collect();

        match self
            .sheets
            .set_backgrounds(spreadsheet_id, worksheet.sheet_id, &cells, Some(LIME_GREEN))
            .await
        {
            Ok(()) => tracing::info!(rows = rows.len(), "Highlighted synced rows"),
            Err(e) => tracing::warn!(error = %e, "Failed to highlight synced rows"),
        }
    }
}
