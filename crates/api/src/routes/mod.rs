pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers::{self, method_not_allowed};
use crate::state::AppState;

/// Build the POST-only workflow routes, mounted at the root.
///
/// ```text
/// /sync-playlist        playlist → new spreadsheet (302 to the sheet)
/// /sync-notes           "Notes Back" rows → review-system notes
/// /match-versions       re-seat client versions by shot base
/// /prepare-notes        copy template-row formulas down
/// /reset-highlights     clear synced-row highlights
/// ```
///
/// Any other method on these paths answers 405.
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sync-playlist",
            post(handlers::sync_playlist::sync_playlist).fallback(method_not_allowed),
        )
        .route(
            "/sync-notes",
            post(handlers::sync_notes::sync_notes).fallback(method_not_allowed),
        )
        .route(
            "/match-versions",
            post(handlers::sheet_prep::match_versions).fallback(method_not_allowed),
        )
        .route(
            "/prepare-notes",
            post(handlers::sheet_prep::prepare_notes).fallback(method_not_allowed),
        )
        .route(
            "/reset-highlights",
            post(handlers::sheet_prep::reset_highlights).fallback(method_not_allowed),
        )
}
