//! "Notes Back" rows → review-system notes.
//!
//! Row parsing, note-link construction, author fallback, and the summary
//! report returned to the caller. The remote calls themselves live in the
//! pipeline crate.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::{NoteColumn, SheetSchema};
use crate::sheet::FIRST_DATA_ROW;
use crate::status::{import_status_code, IMPORT_STATUS_CODES};
use crate::types::{EntityRef, Version, VERSION};

/// Per-row failure text when no Version carries the row's code.
pub const VERSION_NOT_FOUND: &str = "Version not found in ShotGrid";

/// Cap on failures listed in the report; `failed_count` still counts all.
pub const MAX_REPORTED_FAILURES: usize = 10;

/// One annotated row that carries enough data to become a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    /// One-based sheet row number (row 1 is the header).
    pub row_number: usize,
    pub version_code: String,
    pub status_label: String,
    /// `status_label` translated through the import table.
    pub status_code: String,
    pub body: String,
    pub links: String,
}

/// Outcome of scanning the data rows of a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNotes {
    pub rows: Vec<NoteRow>,
    pub total_rows: usize,
    pub skipped_rows: usize,
}

/// Turn the data rows (header excluded) into [`NoteRow`]s.
///
/// A row is skipped when it is too short to reach every required column,
/// or when its version code or body is blank after trimming.
pub fn parse_note_rows(schema: &SheetSchema, data_rows: &[Vec<String>]) -> ParsedNotes {
    let width = schema.required_width();
    let mut parsed = ParsedNotes {
        total_rows: data_rows.len(),
        ..Default::default()
    };

    for (idx, row) in data_rows.iter().enumerate() {
        if row.len() < width {
            parsed.skipped_rows += 1;
            continue;
        }

        let cell = |column: NoteColumn| row[schema.position(column)].trim().to_string();
        let version_code = cell(NoteColumn::VersionCode);
        let body = cell(NoteColumn::Body);
        if version_code.is_empty() || body.is_empty() {
            parsed.skipped_rows += 1;
            continue;
        }

        let status_label = cell(NoteColumn::VersionStatus);
        parsed.rows.push(NoteRow {
            row_number: idx + FIRST_DATA_ROW,
            status_code: import_status_code(&status_label).to_string(),
            status_label,
            version_code,
            body,
            links: cell(NoteColumn::Links),
        });
    }

    parsed
}

/// Links for a new note: the Version, plus its parent only when that
/// parent is a Shot.
pub fn note_links(version: &Version) -> Vec<EntityRef> {
    let mut links = vec![EntityRef::new(VERSION, version.id)];
    if let Some(shot) = version.parent_shot() {
        links.push(shot.clone());
    }
    links
}

/// Login tried when no user has the exact email: the part before `@`.
pub fn login_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Import-table entries whose label was used by at least one row.
pub fn status_conversions(rows: &[NoteRow]) -> BTreeMap<String, String> {
    IMPORT_STATUS_CODES
        .iter()
        .filter(|(label, _)| rows.iter().any(|r| r.status_label == *label))
        .map(|(label, code)| (label.to_string(), code.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedNote {
    pub version_code: String,
    pub error: String,
}

/// Summary returned by an import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub processed_rows: usize,
    pub skipped_rows: usize,
    pub success_count: usize,
    pub failed_count: usize,
    /// First [`MAX_REPORTED_FAILURES`] failures.
    pub failed_notes: Vec<FailedNote>,
    pub processed_by: Option<String>,
    pub highlighted_rows: usize,
    pub status_conversions: BTreeMap<String, String>,
}

impl ImportReport {
    pub fn summarize(
        parsed: &ParsedNotes,
        successful_rows: &[usize],
        mut failures: Vec<FailedNote>,
        processed_by: Option<&str>,
    ) -> Self {
        let failed_count = failures.len();
        failures.truncate(MAX_REPORTED_FAILURES);

        Self {
            total_rows: parsed.total_rows,
            processed_rows: parsed.rows.len(),
            skipped_rows: parsed.skipped_rows,
            success_count: successful_rows.len(),
            failed_count,
            failed_notes: failures,
            processed_by: processed_by.map(str::to_string),
            highlighted_rows: successful_rows.len(),
            status_conversions: status_conversions(&parsed.rows),
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Processed {} notes: {} succeeded, {} failed",
            self.processed_rows, self.success_count, self.failed_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SHOT;

    fn schema() -> SheetSchema {
        let headers: Vec<String> = ["Version Code", "Client", "Notes", "Version Status", "Body", "Links"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        SheetSchema::resolve("Notes Back", &headers).unwrap()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_complete_row() {
        let parsed = parse_note_rows(
            &schema(),
            &[row(&["SH010_v001", "", "", "Client Note", " Needs color fix ", ""])],
        );
        assert_eq!(parsed.skipped_rows, 0);
        assert_eq!(
            parsed.rows,
            vec![NoteRow {
                row_number: 2,
                version_code: "SH010_v001".to_string(),
                status_label: "Client Note".to_string(),
                status_code: "note".to_string(),
                body: "Needs color fix".to_string(),
                links: String::new(),
            }]
        );
    }

    #[test]
    fn blank_body_or_code_is_skipped() {
        let parsed = parse_note_rows(
            &schema(),
            &[
                row(&["SH010_v001", "", "", "Client Note", "   ", ""]),
                row(&["", "", "", "Client Note", "Fix it", ""]),
                row(&["SH020_v002", "", "", "", "Fix it", ""]),
            ],
        );
        assert_eq!(parsed.skipped_rows, 2);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].row_number, 4);
        assert_eq!(parsed.rows[0].status_code, "");
    }

    #[test]
    fn short_row_is_skipped() {
        let parsed = parse_note_rows(&schema(), &[row(&["SH010_v001", "", "", "Client Note", "Fix"])]);
        assert_eq!(parsed.skipped_rows, 1);
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.total_rows, 1);
    }

    #[test]
    fn unknown_label_passes_through() {
        let parsed = parse_note_rows(&schema(), &[row(&["SH010_v001", "", "", "Foo", "Body", ""])]);
        assert_eq!(parsed.rows[0].status_code, "Foo");
    }

    #[test]
    fn links_include_parent_shot_only() {
        let mut version = Version {
            id: 5,
            entity: Some(EntityRef::new(SHOT, 9)),
            ..Default::default()
        };
        assert_eq!(
            note_links(&version),
            vec![EntityRef::new(VERSION, 5), EntityRef::new(SHOT, 9)]
        );

        version.entity = Some(EntityRef::new("Asset", 9));
        assert_eq!(note_links(&version), vec![EntityRef::new(VERSION, 5)]);

        version.entity = None;
        assert_eq!(note_links(&version), vec![EntityRef::new(VERSION, 5)]);
    }

    #[test]
    fn login_is_local_part() {
        assert_eq!(login_from_email("jane.doe@studio.com"), "jane.doe");
        assert_eq!(login_from_email("jdoe"), "jdoe");
    }

    #[test]
    fn report_truncates_failures_but_counts_all() {
        let parsed = ParsedNotes::default();
        let failures: Vec<FailedNote> = (0..12)
            .map(|i| FailedNote {
                version_code: format!("V{i}"),
                error: VERSION_NOT_FOUND.to_string(),
            })
            .collect();
        let report = ImportReport::summarize(&parsed, &[], failures, Some("a@b.com"));
        assert_eq!(report.failed_count, 12);
        assert_eq!(report.failed_notes.len(), MAX_REPORTED_FAILURES);
        assert_eq!(report.failed_notes[0].version_code, "V0");
    }

    #[test]
    fn conversions_only_list_used_labels() {
        let parsed = parse_note_rows(
            &schema(),
            &[
                row(&["A", "", "", "Hero Shot", "b", ""]),
                row(&["B", "", "", "Foo", "b", ""]),
            ],
        );
        let report = ImportReport::summarize(&parsed, &[2, 3], Vec::new(), None);
        assert_eq!(
            report.status_conversions,
            BTreeMap::from([("Hero Shot".to_string(), "hero".to_string())])
        );
        assert_eq!(report.message(), "Processed 2 notes: 2 succeeded, 0 failed");
        assert_eq!(report.highlighted_rows, 2);
    }
}
