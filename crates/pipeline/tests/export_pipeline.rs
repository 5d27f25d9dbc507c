mod common;

use assert_matches::assert_matches;
use serde_json::json;

use common::{Fixture, PLAYLIST_ID, SHARE_DOMAIN, TEMPLATE_ID};
use notebridge_core::error::CoreError;
use notebridge_core::remote::{Permission, Role};
use notebridge_core::testing::{ReviewOp, SheetOp};

/// REV_010 with SH020 (no frame range) listed before SH010 (1001-1010).
fn rev_010() -> Fixture {
    let fx = Fixture::new();
    fx.seed_template();
    fx.seed_project();
    fx.add_shot(11, "SH010");
    fx.add_shot(12, "SH020");
    fx.add_version(
        102,
        "SH020_v002",
        (12, "SH020"),
        json!({"sg_status_list": "sndwip"}),
    );
    fx.add_version(
        101,
        "SH010_v001",
        (11, "SH010"),
        json!({
            "sg_status_list": "apv",
            "sg_first_frame": 1001,
            "sg_last_frame": 1010,
            "sg_slate_notes": "retime",
        }),
    );
    fx
}

#[tokio::test]
async fn exports_rev_010_sorted_by_shot() {
    let fx = rev_010();
    fx.add_shot_note(11, "Internal check", "2025-03-01T10:00:00Z");
    fx.add_shot_note(11, "Client Note: looks great", "2025-03-01T11:00:00Z");

    let outcome = fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap();

    assert_eq!(outcome.spreadsheet_id, "copy-1");
    assert_eq!(outcome.url, "https://docs.google.com/spreadsheets/d/copy-1");
    assert_eq!(outcome.version_count, 2);
    assert_eq!(fx.sheets.file_name("copy-1").as_deref(), Some("REV_010"));

    let rows = fx.sheets.values("copy-1", "submission");
    assert_eq!(
        rows[1],
        vec![
            "", "REV_010", "SH010", "CLI_SH010_v001", "comp", "Client Note: looks great",
            "Delivery", "", "10", "8", "Delivery - retime",
        ]
    );
    assert_eq!(
        rows[2],
        vec!["", "REV_010", "SH020", "CLI_SH020_v002", "comp", "", "WIP", "", "", "8", "WIP - "]
    );

    let notes_back = fx.sheets.values("copy-1", "Notes Back");
    assert_eq!(notes_back[1], vec!["SH010_v001"]);
    assert_eq!(notes_back[2], vec!["SH020_v002"]);
    // Both tabs go out in a single values call.
    assert_eq!(fx.sheets.write_log().len(), 1);
}

#[tokio::test]
async fn copy_is_shared_with_domain_and_link() {
    let fx = rev_010();
    fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap();

    assert_eq!(
        fx.sheets.permissions("copy-1"),
        vec![
            Permission::Domain {
                domain: SHARE_DOMAIN.to_string(),
                role: Role::Writer,
            },
            Permission::AnyoneWithLink { role: Role::Writer },
        ]
    );
}

#[tokio::test]
async fn notes_back_is_created_once() {
    let fx = rev_010();
    fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap();
    assert_eq!(fx.sheets.tab_titles("copy-1"), vec!["submission", "Notes Back"]);
}

#[tokio::test]
async fn existing_notes_back_is_reused() {
    let fx = Fixture::new();
    fx.sheets.add_spreadsheet(
        TEMPLATE_ID,
        "Template",
        &[
            ("submission", vec![common::submission_header()]),
            ("Notes Back", vec![vec!["Version Code", "Version Status", "Body", "Links"]]),
        ],
    );
    fx.seed_project();
    fx.add_shot(11, "SH010");
    fx.add_version(101, "SH010_v001", (11, "SH010"), json!({}));

    fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap();

    assert_eq!(fx.sheets.tab_titles("copy-1"), vec!["submission", "Notes Back"]);
    let notes_back = fx.sheets.values("copy-1", "Notes Back");
    assert_eq!(notes_back[0][0], "Version Code");
    assert_eq!(notes_back[1], vec!["SH010_v001"]);
}

#[tokio::test]
async fn falls_back_to_most_recent_note() {
    let fx = rev_010();
    fx.add_shot_note(11, "first pass", "2025-03-01T09:00:00Z");
    fx.add_shot_note(11, "second pass", "2025-03-02T09:00:00Z");

    fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap();

    let rows = fx.sheets.values("copy-1", "submission");
    assert_eq!(rows[1][5], "second pass");
}

#[tokio::test]
async fn note_lookup_failure_does_not_abort() {
    let fx = rev_010();
    fx.add_shot_note(11, "Client Note: looks great", "2025-03-01T11:00:00Z");
    fx.review.fail(ReviewOp::Find, "Note");

    fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap();

    let rows = fx.sheets.values("copy-1", "submission");
    assert_eq!(rows[1][5], "");
}

#[tokio::test]
async fn missing_project_leaves_handles_empty() {
    let fx = Fixture::new();
    fx.seed_template();
    fx.review
        .insert("Playlist", json!({"id": PLAYLIST_ID, "code": "REV_010"}));
    fx.add_shot(11, "SH010");
    fx.add_version(101, "SH010_v001", (11, "SH010"), json!({"sg_status_list": "apv"}));

    fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap();

    let rows = fx.sheets.values("copy-1", "submission");
    assert_eq!(rows[1][9], "");
    assert_eq!(rows[1][10], "Delivery - ");
}

#[tokio::test]
async fn unknown_playlist_is_not_found() {
    let fx = rev_010();

    let err = fx.exporter().export(999, "Hallows").await.unwrap_err();

    assert_matches!(err, CoreError::NotFound { entity: "Playlist", ref key } if key == "999");
    assert_eq!(fx.sheets.spreadsheet_ids(), vec![TEMPLATE_ID]);
}

#[tokio::test]
async fn playlist_without_versions_in_project_is_not_found() {
    let fx = rev_010();

    let err = fx.exporter().export(PLAYLIST_ID, "Other Project").await.unwrap_err();

    assert_matches!(err, CoreError::NotFound { entity: "Version", ref key } if key == "REV_010");
    assert_eq!(fx.sheets.spreadsheet_ids(), vec![TEMPLATE_ID]);
}

#[tokio::test]
async fn copy_failure_surfaces_remote_error() {
    let fx = rev_010();
    fx.sheets.fail(SheetOp::Copy);

    let err = fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap_err();
    assert_matches!(err, CoreError::Remote(_));
}

#[tokio::test]
async fn write_failure_leaves_the_copy_behind() {
    let fx = rev_010();
    fx.sheets.fail(SheetOp::Write);

    let err = fx.exporter().export(PLAYLIST_ID, "Hallows").await.unwrap_err();

    assert_matches!(err, CoreError::Remote(_));
    assert!(fx.sheets.spreadsheet_ids().contains(&"copy-1".to_string()));
}
