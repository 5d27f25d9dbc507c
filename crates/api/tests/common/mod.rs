#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use notebridge_api::config::ServerConfig;
use notebridge_api::router::build_app_router;
use notebridge_api::state::AppState;
use notebridge_core::testing::{MemoryReviewSystem, MemorySpreadsheets};

pub const TEMPLATE_ID: &str = "template";
pub const NOTES_SHEET_ID: &str = "notes-sheet";
pub const EMAIL: &str = "jo.artist@willow.example";

/// Build a test `ServerConfig` with safe defaults.
///
/// The template id is given as a full sheet URL, the way operators paste it.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["https://docs.google.com".to_string()],
        request_timeout_secs: 30,
        credentials_path: "willow.json".into(),
        shotgrid_url: "https://willow.shotgunstudio.com".to_string(),
        shotgrid_script_name: "notebridge".to_string(),
        template_spreadsheet_id: format!(
            "https://docs.google.com/spreadsheets/d/{TEMPLATE_ID}/edit?gid=0#gid=0"
        ),
        share_domain: "willow.example".to_string(),
    }
}

/// The application router over in-memory remote services.
pub struct TestApp {
    pub review: Arc<MemoryReviewSystem>,
    pub sheets: Arc<MemorySpreadsheets>,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            review: Arc::new(MemoryReviewSystem::new()),
            sheets: Arc::new(MemorySpreadsheets::new()),
        }
    }

    /// A fresh router sharing this app's fakes; `oneshot` consumes it.
    pub fn router(&self) -> Router {
        let config = test_config();
        let state = AppState {
            config: Arc::new(config.clone()),
            review: self.review.clone(),
            sheets: self.sheets.clone(),
            files: self.sheets.clone(),
        };
        build_app_router(state, &config)
    }

    /// Template spreadsheet plus project "Hallows", playlist 3 (REV_010)
    /// and one version on shot SH010.
    pub fn seed_export(&self) {
        self.sheets.add_spreadsheet(
            TEMPLATE_ID,
            "Submission Template",
            &[("submission", vec![vec!["#", "Playlist", "Shot"]])],
        );
        self.review
            .insert("Project", json!({"id": 70, "name": "Hallows", "sg_frame_handles": 8}));
        self.review.insert("Playlist", json!({"id": 3, "code": "REV_010"}));
        self.review.insert("Playlist", json!({"id": 4, "code": "REV_011"}));
        self.review.insert("Shot", json!({"id": 11, "code": "SH010"}));
        self.review.insert(
            "Version",
            json!({
                "id": 101,
                "code": "SH010_v001",
                "sg_shot_code": "SH010",
                "sg_status_list": "apv",
                "entity": {"type": "Shot", "id": 11, "name": "SH010"},
                "playlists": [{"type": "Playlist", "id": 3, "name": "REV_010"}],
                "project": {"type": "Project", "id": 70, "name": "Hallows"},
            }),
        );
    }

    /// Version SH010_v001, its user, and a "Notes Back" sheet with these rows.
    pub fn seed_import(&self, rows: &[[&str; 4]]) {
        self.review.insert("Project", json!({"id": 70, "name": "Hallows"}));
        self.review.insert(
            "Version",
            json!({
                "id": 101,
                "code": "SH010_v001",
                "sg_status_list": "sndcli",
                "entity": {"type": "Shot", "id": 11, "name": "SH010"},
                "project": {"type": "Project", "id": 70, "name": "Hallows"},
            }),
        );
        self.review
            .insert("HumanUser", json!({"id": 5, "email": EMAIL, "login": "jo.artist"}));

        let mut values = vec![vec!["Version Code", "Version Status", "Body", "Links"]];
        values.extend(rows.iter().map(|r| r.to_vec()));
        self.sheets
            .add_spreadsheet(NOTES_SHEET_ID, "REV_010", &[("Notes Back", values)]);
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some("application/json"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn post_form(app: Router, uri: &str, body: &str) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some("application/x-www-form-urlencoded"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    send(app, Method::POST, uri, None, Body::from(body.to_string())).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: Body,
) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        request = request.header(CONTENT_TYPE, content_type);
    }
    app.oneshot(request.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
