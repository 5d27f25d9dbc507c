//! Sheet preparation between export and import: formula propagation from
//! the template row and clearing of processed-row highlights.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::export::RangeWrite;
use crate::sheet::{GridRect, SheetRange};

/// Row whose formulas serve as the template for every note row.
pub const TEMPLATE_ROW: usize = 2;

/// Column whose content decides whether a row gets formulas (B).
pub const TRIGGER_COLUMN: usize = 1;

/// Dropdown column cleared on rows without content (D).
pub const STATUS_DROPDOWN_COLUMN: usize = 3;

/// Columns whose template formulas are copied down (E, F).
pub const FORMULA_COLUMNS: [usize; 2] = [4, 5];

static CELL_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)(\$?)([0-9]+)").expect("valid regex"));

/// Point relative references to `source_row` at `target_row` instead.
///
/// Row-absolute references (`E$2`) and references to other rows are left
/// alone; a column-absolute `$E2` keeps its `$` and moves.
pub fn adjust_formula(formula: &str, source_row: usize, target_row: usize) -> String {
    CELL_REF_RE
        .replace_all(formula, |caps: &Captures| {
            let row: Option<usize> = caps[3].parse().ok();
            if &caps[2] == "$" || row != Some(source_row) {
                caps[0].to_string()
            } else {
                format!("{}{target_row}", &caps[1])
            }
        })
        .into_owned()
}

/// Writes needed to prepare the note rows of a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePrepPlan {
    /// Formula cells, to be written as user-entered input.
    pub formulas: Vec<RangeWrite>,
    /// D–F blocks to empty on rows without content in B.
    pub clears: Vec<RangeWrite>,
    pub filled_rows: usize,
    pub cleared_rows: usize,
}

/// Plan formula propagation for a sheet read with formulas rendered.
///
/// `rows` is the whole sheet including the header. Every row below the
/// template row with content in column B receives the template's E and F
/// formulas, rebased onto that row; empty template cells are not copied.
/// Rows without content in B have D, E and F emptied.
pub fn plan_note_prep(sheet: &str, rows: &[Vec<String>]) -> NotePrepPlan {
    let template: Vec<(usize, &str)> = FORMULA_COLUMNS
        .iter()
        .map(|&col| (col, rows.get(TEMPLATE_ROW - 1).map_or("", |r| cell(r, col))))
        .filter(|(_, formula)| !formula.is_empty())
        .collect();

    let mut plan = NotePrepPlan::default();
    for (idx, row) in rows.iter().enumerate().skip(TEMPLATE_ROW) {
        let row_number = idx + 1;
        if cell(row, TRIGGER_COLUMN).is_empty() {
            plan.cleared_rows += 1;
            plan.clears.push(RangeWrite {
                range: SheetRange::block(sheet, STATUS_DROPDOWN_COLUMN, row_number, FORMULA_COLUMNS[1], row_number),
                values: vec![vec![String::new(); FORMULA_COLUMNS[1] - STATUS_DROPDOWN_COLUMN + 1]],
            });
        } else {
            plan.filled_rows += 1;
            plan.formulas.extend(template.iter().map(|(col, formula)| RangeWrite {
                range: SheetRange::block(sheet, *col, row_number, *col, row_number),
                values: vec![vec![adjust_formula(formula, TEMPLATE_ROW, row_number)]],
            }));
        }
    }
    plan
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or_default()
}

/// Rows (D–F) to un-highlight: every data row with content in D, E or F.
pub fn highlighted_spans(rows: &[Vec<String>]) -> Vec<GridRect> {
    let first = STATUS_DROPDOWN_COLUMN;
    let last = FORMULA_COLUMNS[1];
    rows.iter()
        .enumerate()
        .skip(1)
        .filter(|(_, row)| (first..=last).any(|col| row.get(col).is_some_and(|c| !c.is_empty())))
        .map(|(idx, _)| GridRect::row_span(idx + 1, first, last))
        .collect()
}
