//! Version → submission-sheet mapping.
//!
//! Pure functions turning fetched Versions (plus the per-shot note lookup
//! and the project's frame handles) into the cell blocks written to the
//! cloned template.

use std::collections::HashMap;

use crate::sheet::{SheetRange, FIRST_DATA_ROW};
use crate::status::export_status_label;
use crate::types::{EntityRef, Note, Version};

/// Marker text identifying a client note (matched case-insensitively).
pub const CLIENT_NOTE_MARKER: &str = "client note";

// Submission sheet columns (zero-based).
pub const PLAYLIST_COLUMN: usize = 1; // B
pub const CORE_FIRST_COLUMN: usize = 2; // C
pub const CORE_LAST_COLUMN: usize = 6; // G
pub const FRAME_COUNT_COLUMN: usize = 8; // I
pub const FRAME_HANDLES_COLUMN: usize = 9; // J
pub const STATUS_SLATE_COLUMN: usize = 10; // K

/// "Notes Back" column holding the internal version code.
pub const NOTES_BACK_VERSION_COLUMN: usize = 0; // A

/// One submission-sheet row, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub shot_code: String,
    pub client_code: String,
    pub work_description: String,
    pub latest_note: String,
    pub status_label: String,
    /// Empty when either frame bound is missing.
    pub frame_count: String,
    pub frame_handles: String,
    pub status_and_slate: String,
    /// Internal code, written to "Notes Back".
    pub version_code: String,
}

/// A block of values destined for one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWrite {
    pub range: SheetRange,
    pub values: Vec<Vec<String>>,
}

/// Inclusive frame count, or `None` unless both bounds are known.
pub fn frame_count(first: Option<i64>, last: Option<i64>) -> Option<i64> {
    match (first, last) {
        (Some(first), Some(last)) => Some(last - first + 1),
        _ => None,
    }
}

/// `"{label} - {slate notes}"`; the separator stays even with no slate notes.
pub fn status_with_slate(label: &str, slate_notes: Option<&str>) -> String {
    format!("{label} - {}", slate_notes.unwrap_or_default())
}

/// Stable ascending sort by shot code; a missing code sorts as `""`.
pub fn sort_by_shot_code(versions: &mut [Version]) {
    versions.sort_by(|a, b| {
        let a = a.shot_code.as_deref().unwrap_or_default();
        let b = b.shot_code.as_deref().unwrap_or_default();
        a.cmp(b)
    });
}

/// Distinct parent Shots of the given Versions, in first-seen order.
pub fn distinct_shots(versions: &[Version]) -> Vec<EntityRef> {
    let mut shots: Vec<EntityRef> = Vec::new();
    for shot in versions.iter().filter_map(Version::parent_shot) {
        if !shots.iter().any(|s| s.same_entity(shot)) {
            shots.push(shot.clone());
        }
    }
    shots
}

/// Whether a note's text marks it as a client note.
pub fn is_client_note(content: &str) -> bool {
    content.to_lowercase().contains(CLIENT_NOTE_MARKER)
}

/// Text of the note shown as "latest client note" for a shot.
///
/// Picks the most recently created note whose content mentions
/// [`CLIENT_NOTE_MARKER`]; when none does, the most recent note of any kind.
/// Notes without a timestamp count as oldest; among equal timestamps the
/// earlier entry wins. An empty chosen note yields `None`.
pub fn latest_client_note(notes: &[Note]) -> Option<&str> {
    let client = newest(
        notes
            .iter()
            .filter(|n| n.content.as_deref().is_some_and(is_client_note)),
    );
    let chosen = client.or_else(|| newest(notes.iter()))?;

    chosen.content.as_deref().filter(|c| !c.is_empty())
}

fn newest<'a>(notes: impl Iterator<Item = &'a Note>) -> Option<&'a Note> {
    notes.fold(None, |best: Option<&'a Note>, note| match best {
        Some(b) if b.created_at >= note.created_at => Some(b),
        _ => Some(note),
    })
}

/// Map sorted Versions onto display rows.
///
/// `notes_by_shot` is keyed by shot *code* and joined through each
/// Version's `sg_shot_code`, as the template groups by code.
pub fn build_rows(
    versions: &[Version],
    notes_by_shot: &HashMap<String, String>,
    frame_handles: Option<i64>,
) -> Vec<ExportRow> {
    let handles = frame_handles.map(|h| h.to_string()).unwrap_or_default();

    versions
        .iter()
        .map(|version| {
            let shot_code = version.shot_code.clone().unwrap_or_default();
            let status_label = version
                .status
                .as_deref()
                .map(export_status_label)
                .unwrap_or_default()
                .to_string();

            ExportRow {
                latest_note: notes_by_shot.get(&shot_code).cloned().unwrap_or_default(),
                client_code: version.client_code.clone().unwrap_or_default(),
                work_description: version.work_description.clone().unwrap_or_default(),
                frame_count: frame_count(version.first_frame, version.last_frame)
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
                frame_handles: handles.clone(),
                status_and_slate: status_with_slate(&status_label, version.slate_notes.as_deref()),
                version_code: version.code.clone().unwrap_or_default(),
                status_label,
                shot_code,
            }
        })
        .collect()
}

fn single_column(rows: &[ExportRow], cell: impl Fn(&ExportRow) -> String) -> Vec<Vec<String>> {
    rows.iter().map(|row| vec![cell(row)]).collect()
}

/// The five submission-sheet writes, all covering rows `2..=n+1`:
/// core columns C–G, playlist name (B), frame count (I), frame handles (J),
/// and status with slate notes (K). Empty when there are no rows.
pub fn submission_writes(sheet: &str, playlist_name: &str, rows: &[ExportRow]) -> Vec<RangeWrite> {
    if rows.is_empty() {
        return Vec::new();
    }
    let last_row = FIRST_DATA_ROW + rows.len() - 1;
    let column = |col: usize| SheetRange::block(sheet, col, FIRST_DATA_ROW, col, last_row);

    vec![
        RangeWrite {
            range: SheetRange::block(sheet, CORE_FIRST_COLUMN, FIRST_DATA_ROW, CORE_LAST_COLUMN, last_row),
            values: rows
                .iter()
                .map(|row| {
                    vec![
                        row.shot_code.clone(),
                        row.client_code.clone(),
                        row.work_description.clone(),
                        row.latest_note.clone(),
                        row.status_label.clone(),
                    ]
                })
                .collect(),
        },
        RangeWrite {
            range: column(PLAYLIST_COLUMN),
            values: single_column(rows, |_| playlist_name.to_string()),
        },
        RangeWrite {
            range: column(FRAME_COUNT_COLUMN),
            values: single_column(rows, |row| row.frame_count.clone()),
        },
        RangeWrite {
            range: column(FRAME_HANDLES_COLUMN),
            values: single_column(rows, |row| row.frame_handles.clone()),
        },
        RangeWrite {
            range: column(STATUS_SLATE_COLUMN),
            values: single_column(rows, |row| row.status_and_slate.clone()),
        },
    ]
}

/// Version codes for the "Notes Back" sheet, column A from row 2.
pub fn notes_back_write(sheet: &str, rows: &[ExportRow]) -> Option<RangeWrite> {
    if rows.is_empty() {
        return None;
    }
    Some(RangeWrite {
        range: SheetRange::column_run(sheet, NOTES_BACK_VERSION_COLUMN, FIRST_DATA_ROW, rows.len()),
        values: single_column(rows, |row| row.version_code.clone()),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::SHOT;

    fn version(id: i64, shot: Option<&str>) -> Version {
        Version {
            id,
            shot_code: shot.map(str::to_string),
            ..Default::default()
        }
    }

    fn note(id: i64, content: &str, hour: u32) -> Note {
        Note {
            id,
            content: Some(content.to_string()),
            created_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()),
        }
    }

    // -- frame_count ---------------------------------------------------------

    #[test]
    fn frame_count_is_inclusive() {
        assert_eq!(frame_count(Some(1001), Some(1010)), Some(10));
        assert_eq!(frame_count(Some(1001), Some(1001)), Some(1));
    }

    #[test]
    fn frame_count_needs_both_bounds() {
        assert_eq!(frame_count(None, Some(1010)), None);
        assert_eq!(frame_count(Some(1001), None), None);
        assert_eq!(frame_count(None, None), None);
    }

    // -- status_with_slate ---------------------------------------------------

    #[test]
    fn slate_notes_are_appended() {
        assert_eq!(status_with_slate("WIP", Some("retime")), "WIP - retime");
    }

    #[test]
    fn empty_slate_keeps_separator() {
        assert_eq!(status_with_slate("For Final", None), "For Final - ");
        assert_eq!(status_with_slate("For Final", Some("")), "For Final - ");
    }

    // -- sorting and shots ---------------------------------------------------

    #[test]
    fn sort_is_stable_by_shot_code() {
        let mut versions = vec![
            version(1, Some("SH020")),
            version(2, Some("SH010")),
            version(3, None),
            version(4, Some("SH010")),
        ];
        sort_by_shot_code(&mut versions);
        let ids: Vec<i64> = versions.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn distinct_shots_dedupes_by_identity() {
        let mut a = version(1, Some("SH010"));
        a.entity = Some(EntityRef::new(SHOT, 10));
        let mut b = version(2, Some("SH010"));
        b.entity = Some(EntityRef {
            name: Some("SH010".to_string()),
            ..EntityRef::new(SHOT, 10)
        });
        let mut c = version(3, Some("AS001"));
        c.entity = Some(EntityRef::new("Asset", 11));

        let shots = distinct_shots(&[a, b, c]);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].id, 10);
    }

    // -- latest_client_note --------------------------------------------------

    #[test]
    fn client_note_wins_over_newer_regular_note() {
        let notes = vec![
            note(1, "Client Note: looks great", 9),
            note(2, "regular note", 11),
        ];
        assert_eq!(latest_client_note(&notes), Some("Client Note: looks great"));
    }

    #[test]
    fn most_recent_client_note_is_picked() {
        let notes = vec![
            note(1, "regular note", 8),
            note(2, "Client Note: looks great", 10),
            note(3, "CLIENT NOTE: older", 9),
        ];
        assert_eq!(latest_client_note(&notes), Some("Client Note: looks great"));
    }

    #[test]
    fn falls_back_to_most_recent_note() {
        let notes = vec![note(1, "first pass", 8), note(2, "tweak the grade", 12)];
        assert_eq!(latest_client_note(&notes), Some("tweak the grade"));
    }

    #[test]
    fn no_notes_gives_none() {
        assert_eq!(latest_client_note(&[]), None);
    }

    #[test]
    fn empty_latest_note_gives_none() {
        let notes = vec![note(1, "older", 8), note(2, "", 12)];
        assert_eq!(latest_client_note(&notes), None);
    }

    // -- build_rows / writes -------------------------------------------------

    #[test]
    fn rows_carry_derived_fields() {
        let mut v = version(1, Some("SH010"));
        v.code = Some("SH010_comp_v001".to_string());
        v.client_code = Some("SH010_v001".to_string());
        v.status = Some("sndcli".to_string());
        v.first_frame = Some(1001);
        v.last_frame = Some(1010);
        v.slate_notes = Some("new grade".to_string());

        let notes = HashMap::from([("SH010".to_string(), "Client Note: ok".to_string())]);
        let rows = build_rows(&[v, version(2, Some("SH020"))], &notes, Some(8));

        assert_eq!(rows[0].status_label, "For Final");
        assert_eq!(rows[0].frame_count, "10");
        assert_eq!(rows[0].frame_handles, "8");
        assert_eq!(rows[0].status_and_slate, "For Final - new grade");
        assert_eq!(rows[0].latest_note, "Client Note: ok");
        assert_eq!(rows[1].frame_count, "");
        assert_eq!(rows[1].status_label, "");
        assert_eq!(rows[1].status_and_slate, " - ");
        assert_eq!(rows[1].latest_note, "");
    }

    #[test]
    fn missing_handles_leave_cell_empty() {
        let rows = build_rows(&[version(1, Some("SH010"))], &HashMap::new(), None);
        assert_eq!(rows[0].frame_handles, "");
    }

    #[test]
    fn five_writes_share_the_row_span() {
        let rows = build_rows(
            &[version(1, Some("SH010")), version(2, Some("SH020"))],
            &HashMap::new(),
            None,
        );
        let writes = submission_writes("Submission", "REV_010", &rows);
        let ranges: Vec<String> = writes.iter().map(|w| w.range.to_a1()).collect();
        assert_eq!(
            ranges,
            vec![
                "'Submission'!C2:G3",
                "'Submission'!B2:B3",
                "'Submission'!I2:I3",
                "'Submission'!J2:J3",
                "'Submission'!K2:K3",
            ]
        );
        assert_eq!(writes[1].values, vec![vec!["REV_010"], vec!["REV_010"]]);
    }

    #[test]
    fn no_rows_no_writes() {
        assert!(submission_writes("Submission", "REV", &[]).is_empty());
        assert!(notes_back_write("Notes Back", &[]).is_none());
    }

    #[test]
    fn notes_back_gets_version_codes() {
        let mut v = version(1, Some("SH010"));
        v.code = Some("SH010_comp_v001".to_string());
        let rows = build_rows(&[v], &HashMap::new(), None);
        let write = notes_back_write("Notes Back", &rows).unwrap();
        assert_eq!(write.range.to_a1(), "'Notes Back'!A2:A2");
        assert_eq!(write.values, vec![vec!["SH010_comp_v001"]]);
    }
}
