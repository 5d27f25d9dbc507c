//! Playlist → cloned spreadsheet.

use std::collections::HashMap;
use std::sync::Arc;

use notebridge_core::error::CoreError;
use notebridge_core::export::{
    build_rows, distinct_shots, latest_client_note, notes_back_write, sort_by_shot_code,
    submission_writes,
};
use notebridge_core::remote::{
    FileStore, Permission, ReviewSystem, Role, SpreadsheetService, ValueInput,
};
use notebridge_core::sheet::{
    find_worksheet, first_worksheet, spreadsheet_url, Worksheet, NOTES_BACK_COLUMNS,
    NOTES_BACK_ROWS, NOTES_BACK_SHEET,
};
use notebridge_core::types::{EntityId, EntityRef, Version};

use crate::review;

/// Where new spreadsheets come from and who they are shared with.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// File id of the template spreadsheet.
    pub template_file_id: String,
    /// Organisational domain granted write access to each copy.
    pub share_domain: String,
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub spreadsheet_id: String,
    pub url: String,
    pub playlist_name: String,
    pub version_count: usize,
}

pub struct PlaylistExporter {
    review: Arc<dyn ReviewSystem>,
    sheets: Arc<dyn SpreadsheetService>,
    files: Arc<dyn FileStore>,
    settings: ExportSettings,
}

impl PlaylistExporter {
    pub fn new(
        review: Arc<dyn ReviewSystem>,
        sheets: Arc<dyn SpreadsheetService>,
        files: Arc<dyn FileStore>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            review,
            sheets,
            files,
            settings,
        }
    }

    /// Export the playlist's versions in `project_name` into a fresh copy of
    /// the template.
    ///
    /// Fails with `NotFound` when the playlist does not exist (entity
    /// `Playlist`, keyed by id) or has no matching versions (entity
    /// `Version`, keyed by playlist name). Resources created before a later
    /// failure are left in place.
    pub async fn export(
        &self,
        playlist_id: EntityId,
        project_name: &str,
    ) -> Result<ExportOutcome, CoreError> {
        let review = self.review.as_ref();

        let playlist = review::playlist(review, playlist_id).await?;
        let playlist_name = playlist.display_name().to_string();

        let frame_handles = match review::project_by_name(review, project_name).await {
            Ok(project) => project.and_then(|p| p.frame_handles),
            Err(e) => {
                tracing::warn!(project = project_name, error = %e, "Frame handles lookup failed");
                None
            }
        };

        let mut versions = review::playlist_versions(review, playlist_id, project_name).await?;
        if versions.is_empty() {
            return Err(CoreError::NotFound {
                entity: "Version",
                key: playlist_name,
            });
        }
        sort_by_shot_code(&mut versions);
        tracing::info!(playlist = %playlist_name, versions = versions.len(), "Exporting playlist");

        let notes_by_shot = self.latest_notes(&versions).await;
        let rows = build_rows(&versions, &notes_by_shot, frame_handles);

        let spreadsheet_id = self.create_shared_copy(&playlist_name).await?;
        let (submission, notes_back) = self.target_sheets(&spreadsheet_id).await?;

        let mut writes = submission_writes(&submission.title, &playlist_name, &rows);
        writes.extend(notes_back_write(&notes_back.title, &rows));
        self.sheets
            .write_batch(&spreadsheet_id, writes, ValueInput::Raw)
            .await?;

        tracing::info!(spreadsheet_id = %spreadsheet_id, rows = rows.len(), "Playlist exported");
        Ok(ExportOutcome {
            url: spreadsheet_url(&spreadsheet_id),
            spreadsheet_id,
            playlist_name,
            version_count: rows.len(),
        })
    }

    /// Shot code → latest client note text. Failures for one shot are
    /// logged and that shot is left out.
    async fn latest_notes(&self, versions: &[Version]) -> HashMap<String, String> {
        let mut notes = HashMap::new();
        for shot in distinct_shots(versions) {
            match self.shot_note(&shot).await {
                Ok(Some((code, text))) => {
                    notes.insert(code, text);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(shot_id = shot.id, error = %e, "Skipping notes for shot");
                }
            }
        }
        tracing::debug!(shots = notes.len(), "Collected latest client notes");
        notes
    }

    async fn shot_note(&self, shot: &EntityRef) -> Result<Option<(String, String)>, CoreError> {
        let review = self.review.as_ref();
        let Some(code) = review::shot(review, shot).await?.and_then(|s| s.code) else {
            tracing::warn!(shot_id = shot.id, "Shot has no code");
            return Ok(None);
        };
        let notes = review::shot_notes(review, shot).await?;
        Ok(latest_client_note(&notes).map(|text| (code, text.to_string())))
    }

    async fn create_shared_copy(&self, name: &str) -> Result<String, CoreError> {
        let id = self
            .files
            .copy_file(&self.settings.template_file_id, name)
            .await?;

        let grants = [
            Permission::Domain {
                domain: self.settings.share_domain.clone(),
                role: Role::Writer,
            },
            Permission::AnyoneWithLink { role: Role::Writer },
        ];
        for permission in &grants {
            self.files.grant_permission(&id, permission).await?;
        }
        tracing::info!(spreadsheet_id = %id, "Created and shared spreadsheet");
        Ok(id)
    }

    /// The first sheet, and "Notes Back" (created when missing).
    async fn target_sheets(&self, spreadsheet_id: &str) -> Result<(Worksheet, Worksheet), CoreError> {
        let worksheets = self.sheets.worksheets(spreadsheet_id).await?;
        let submission = first_worksheet(&worksheets)
            .cloned()
            .ok_or_else(|| CoreError::Data("Spreadsheet has no sheets".to_string()))?;

        let notes_back = match find_worksheet(&worksheets, NOTES_BACK_SHEET) {
            Some(sheet) => sheet.clone(),
            None => {
                self.sheets
                    .add_worksheet(spreadsheet_id, NOTES_BACK_SHEET, NOTES_BACK_ROWS, NOTES_BACK_COLUMNS)
                    .await?
            }
        };
        Ok((submission, notes_back))
    }
}
