//! Spreadsheet addressing: A1 ranges, grid rectangles, colours, and the
//! layout constants of the review template.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Title of the secondary sheet that collects client notes.
pub const NOTES_BACK_SHEET: &str = "Notes Back";

/// Size of the "Notes Back" sheet when it has to be created.
pub const NOTES_BACK_ROWS: u32 = 1000;
pub const NOTES_BACK_COLUMNS: u32 = 26;

/// First data row; row 1 holds the template headers.
pub const FIRST_DATA_ROW: usize = 2;

const SPREADSHEET_URL_PREFIX: &str = "https://docs.google.com/spreadsheets/d/";

/// One sheet (tab) inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    /// Numeric sheet id, stable across renames (`gid` in URLs).
    pub sheet_id: i64,
    pub title: String,
    /// Position of the tab, zero-based.
    pub index: usize,
}

/// Find a worksheet by exact title.
pub fn find_worksheet<'a>(worksheets: &'a [Worksheet], title: &str) -> Option<&'a Worksheet> {
    worksheets.iter().find(|w| w.title == title)
}

/// The first tab of a spreadsheet (the submission sheet of the template).
pub fn first_worksheet(worksheets: &[Worksheet]) -> Option<&Worksheet> {
    worksheets.iter().min_by_key(|w| w.index)
}

/// Letter name of a zero-based column index: `0 → A`, `25 → Z`, `26 → AA`.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A rectangular A1 range on a named sheet.
///
/// Columns are zero-based, rows one-based, both inclusive. An open
/// `last_col` / `last_row` extends to the edge of the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub(crate) sheet: String,
    pub(crate) first_col: usize,
    pub(crate) last_col: Option<usize>,
    pub(crate) first_row: usize,
    pub(crate) last_row: Option<usize>,
}

impl SheetRange {
    /// Every populated cell of the sheet.
    pub fn whole(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            first_col: 0,
            last_col: None,
            first_row: 1,
            last_row: None,
        }
    }

    /// Full-height column span, e.g. `A:C`.
    pub fn columns(sheet: &str, first_col: usize, last_col: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            first_col,
            last_col: Some(last_col),
            first_row: 1,
            last_row: None,
        }
    }

    /// Closed block, e.g. `C2:G11`.
    pub fn block(
        sheet: &str,
        first_col: usize,
        first_row: usize,
        last_col: usize,
        last_row: usize,
    ) -> Self {
        Self {
            sheet: sheet.to_string(),
            first_col,
            last_col: Some(last_col),
            first_row,
            last_row: Some(last_row),
        }
    }

    /// A single column from `first_row` down `len` rows.
    pub fn column_run(sheet: &str, col: usize, first_row: usize, len: usize) -> Self {
        Self::block(sheet, col, first_row, col, first_row + len.saturating_sub(1))
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Number of rows covered, if closed.
    pub fn row_count(&self) -> Option<usize> {
        self.last_row.map(|last| last + 1 - self.first_row)
    }

    /// A1 notation with a quoted sheet title, e.g. `'Notes Back'!A2:A5`.
    pub fn to_a1(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.sheet.replace('\'', "''"))?;
        let start_col = column_letter(self.first_col);
        match (self.last_col, self.last_row) {
            (None, None) => Ok(()),
            (Some(last_col), None) => write!(f, "!{start_col}:{}", column_letter(last_col)),
            (Some(last_col), Some(last_row)) => write!(
                f,
                "!{start_col}{}:{}{last_row}",
                self.first_row,
                column_letter(last_col)
            ),
            (None, Some(last_row)) => write!(f, "!{}:{last_row}", self.first_row),
        }
    }
}

/// Zero-based, half-open cell rectangle addressed by numeric sheet id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridRect {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl GridRect {
    /// One cell, given its one-based sheet row and zero-based column.
    pub fn cell(row_number: usize, col: usize) -> Self {
        Self {
            start_row: row_number - 1,
            end_row: row_number,
            start_col: col,
            end_col: col + 1,
        }
    }

    /// A horizontal run of cells on one sheet row.
    pub fn row_span(row_number: usize, first_col: usize, last_col: usize) -> Self {
        Self {
            start_row: row_number - 1,
            end_row: row_number,
            start_col: first_col,
            end_col: last_col + 1,
        }
    }

    pub fn contains(&self, row_index: usize, col: usize) -> bool {
        (self.start_row..self.end_row).contains(&row_index)
            && (self.start_col..self.end_col).contains(&col)
    }
}

/// Background colour with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// Marks "Notes Back" rows that were pushed to the review system.
pub const LIME_GREEN: Rgb = Rgb {
    red: 0.0,
    green: 1.0,
    blue: 0.35,
};

/// Pad ragged rows with empty cells to the width of the widest row, so
/// trailing blanks the values API leaves out read as empty strings.
pub fn rectangular(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    rows
}

/// Browser URL of a spreadsheet.
pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("{SPREADSHEET_URL_PREFIX}{spreadsheet_id}")
}

/// Accept either a bare file id or a full spreadsheet URL and return the id.
pub fn spreadsheet_id_from(id_or_url: &str) -> &str {
    let trimmed = id_or_url.trim();
    match trimmed.strip_prefix(SPREADSHEET_URL_PREFIX) {
        Some(rest) => rest.split(['/', '?', '#']).next().unwrap_or(rest),
        None => trimmed,
    }
}
