//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;

use notebridge_core::testing::{MemoryReviewSystem, MemorySpreadsheets};
use notebridge_pipeline::{ExportSettings, NotesImporter, PlaylistExporter, SheetPrep};

pub const TEMPLATE_ID: &str = "template";
pub const NOTES_SHEET_ID: &str = "notes-sheet";
pub const SHARE_DOMAIN: &str = "willow.example";

pub const PROJECT_ID: i64 = 70;
pub const PLAYLIST_ID: i64 = 3;

pub struct Fixture {
    pub review: Arc<MemoryReviewSystem>,
    pub sheets: Arc<MemorySpreadsheets>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            review: Arc::new(MemoryReviewSystem::new()),
            sheets: Arc::new(MemorySpreadsheets::new()),
        }
    }

    pub fn exporter(&self) -> PlaylistExporter {
        PlaylistExporter::new(
            self.review.clone(),
            self.sheets.clone(),
            self.sheets.clone(),
            ExportSettings {
                template_file_id: TEMPLATE_ID.to_string(),
                share_domain: SHARE_DOMAIN.to_string(),
            },
        )
    }

    pub fn importer(&self) -> NotesImporter {
        NotesImporter::new(self.review.clone(), self.sheets.clone())
    }

    pub fn prep(&self) -> SheetPrep {
        SheetPrep::new(self.sheets.clone())
    }

    /// Template with only the submission sheet.
    pub fn seed_template(&self) {
        self.sheets.add_spreadsheet(
            TEMPLATE_ID,
            "Submission Template",
            &[("submission", vec![submission_header()])],
        );
    }

    /// Project "Hallows" with 8 frame handles and playlist REV_010.
    pub fn seed_project(&self) {
        self.review.insert(
            "Project",
            json!({"id": PROJECT_ID, "name": "Hallows", "sg_frame_handles": 8}),
        );
        self.review
            .insert("Playlist", json!({"id": PLAYLIST_ID, "code": "REV_010"}));
    }

    pub fn add_shot(&self, id: i64, code: &str) {
        self.review.insert("Shot", json!({"id": id, "code": code}));
    }

    /// A version on REV_010 under the given shot.
    pub fn add_version(&self, id: i64, code: &str, shot: (i64, &str), extra: serde_json::Value) {
        let mut version = json!({
            "id": id,
            "code": code,
            "sg_shot_code": shot.1,
            "client_code": format!("CLI_{code}"),
            "sg_work_description": "comp",
            "entity": {"type": "Shot", "id": shot.0, "name": shot.1},
            "playlists": [{"type": "Playlist", "id": PLAYLIST_ID, "name": "REV_010"}],
            "project": {"type": "Project", "id": PROJECT_ID, "name": "Hallows"},
        });
        if let (Some(target), Some(fields)) = (version.as_object_mut(), extra.as_object()) {
            target.extend(fields.clone());
        }
        self.review.insert("Version", version);
    }

    pub fn add_shot_note(&self, shot_id: i64, content: &str, created_at: &str) {
        self.review.insert(
            "Note",
            json!({
                "content": content,
                "created_at": created_at,
                "note_links": [{"type": "Shot", "id": shot_id}],
            }),
        );
    }

    /// A "Notes Back" spreadsheet with the standard header and these rows.
    pub fn seed_notes_sheet(&self, rows: &[[&str; 4]]) {
        let mut values = vec![vec!["Version Code", "Version Status", "Body", "Links"]];
        values.extend(rows.iter().map(|r| r.to_vec()));
        self.sheets
            .add_spreadsheet(NOTES_SHEET_ID, "REV_010", &[("Notes Back", values)]);
    }
}

pub fn submission_header() -> Vec<&'static str> {
    vec![
        "#",
        "Playlist",
        "Shot",
        "Version",
        "Description",
        "Latest Client Note",
        "Submitted For",
        "",
        "Frames",
        "Handles",
        "Status / Slate",
    ]
}
