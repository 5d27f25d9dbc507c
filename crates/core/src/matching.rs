//! Re-pairing client version names with internal version codes.
//!
//! Clients return notes against their own version names (column B, with
//! the note text in C). Column A holds the internal codes and never moves;
//! client entries are re-seated onto the row whose internal code shares
//! their shot base.

use std::collections::{HashMap, VecDeque};

/// First three `_`-separated parts of a version name, e.g.
/// `HAL_122_1020_COMP_v016 → HAL_122_1020`. Names with fewer parts are
/// returned whole.
pub fn shot_base(version: &str) -> &str {
    match version.match_indices('_').nth(2) {
        Some((idx, _)) => &version[..idx],
        None => version,
    }
}

/// Rewritten A–C block plus bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// One `[internal, client, notes]` row per input data row.
    pub rows: Vec<Vec<String>>,
    pub matched: usize,
    /// Internal codes that found no client entry.
    pub unmatched: usize,
    /// Client entries that no internal code claimed; they are not written back.
    pub unplaced: Vec<String>,
}

/// Re-seat client entries next to their internal codes.
///
/// Client entries are queued per shot base in sheet order and handed out
/// first-come to internal codes with the same base. `data_rows` excludes
/// the header; missing cells read as empty.
pub fn match_client_versions(data_rows: &[Vec<String>]) -> MatchOutcome {
    let cell = |row: &Vec<String>, col: usize| row.get(col).cloned().unwrap_or_default();

    let mut queues: HashMap<String, VecDeque<(String, String)>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for row in data_rows {
        let client = cell(row, 1);
        if client.is_empty() {
            continue;
        }
        let base = shot_base(&client).to_string();
        if !queues.contains_key(&base) {
            order.push(base.clone());
        }
        queues.entry(base).or_default().push_back((client, cell(row, 2)));
    }

    let mut outcome = MatchOutcome::default();
    for row in data_rows {
        let internal = cell(row, 0);
        let claimed = if internal.is_empty() {
            None
        } else {
            queues
                .get_mut(shot_base(&internal))
                .and_then(VecDeque::pop_front)
        };

        match claimed {
            Some((client, notes)) => {
                outcome.matched += 1;
                outcome.rows.push(vec![internal, client, notes]);
            }
            None => {
                if !internal.is_empty() {
                    outcome.unmatched += 1;
                }
                outcome.rows.push(vec![internal, String::new(), String::new()]);
            }
        }
    }

    outcome.unplaced = order
        .iter()
        .filter_map(|base| queues.remove(base))
        .flat_map(|queue| queue.into_iter().map(|(client, _)| client))
        .collect();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn shot_base_takes_three_parts() {
        assert_eq!(shot_base("HAL_122_1020_COMP_v016"), "HAL_122_1020");
        assert_eq!(shot_base("HAL_122_1020"), "HAL_122_1020");
        assert_eq!(shot_base("HAL_122"), "HAL_122");
        assert_eq!(shot_base(""), "");
    }

    #[test]
    fn client_entries_follow_internal_codes() {
        let outcome = match_client_versions(&[
            row(&["HAL_122_1020_COMP_v016", "HAL_122_1030_v003", "darker"]),
            row(&["HAL_122_1030_COMP_v004", "HAL_122_1020_v015", "more flare"]),
        ]);
        assert_eq!(
            outcome.rows,
            vec![
                row(&["HAL_122_1020_COMP_v016", "HAL_122_1020_v015", "more flare"]),
                row(&["HAL_122_1030_COMP_v004", "HAL_122_1030_v003", "darker"]),
            ]
        );
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.unmatched, 0);
        assert!(outcome.unplaced.is_empty());
    }

    #[test]
    fn same_shot_entries_are_handed_out_in_order() {
        let outcome = match_client_versions(&[
            row(&["HAL_1_10_A_v1", "HAL_1_10_c1", "first"]),
            row(&["HAL_1_10_B_v1", "HAL_1_10_c2", "second"]),
        ]);
        assert_eq!(outcome.rows[0][1], "HAL_1_10_c1");
        assert_eq!(outcome.rows[1][1], "HAL_1_10_c2");
    }

    #[test]
    fn unmatched_rows_get_empty_client_cells() {
        let outcome = match_client_versions(&[
            row(&["HAL_1_10_A_v1"]),
            row(&["", "HAL_9_90_c1", "orphan"]),
        ]);
        assert_eq!(outcome.rows[0], row(&["HAL_1_10_A_v1", "", ""]));
        assert_eq!(outcome.rows[1], row(&["", "", ""]));
        assert_eq!(outcome.unmatched, 1);
        assert_eq!(outcome.unplaced, vec!["HAL_9_90_c1"]);
    }
}
