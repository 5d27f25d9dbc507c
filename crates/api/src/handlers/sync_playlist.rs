//! Playlist export, triggered from the review system's action menu.
//!
//! The action menu posts a form body, some integrations send JSON instead;
//! fields present in a JSON object override the form fields.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

use notebridge_core::error::CoreError;
use notebridge_core::types::EntityId;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Parameters of a playlist export request, before validation.
#[derive(Debug, Default, PartialEq)]
pub struct PlaylistRequest {
    pub selected_ids: Option<Value>,
    pub project_name: Option<Value>,
    pub user_login: Option<Value>,
}

impl PlaylistRequest {
    /// Merge form fields and JSON fields from one body.
    pub fn from_body(headers: &HeaderMap, body: &[u8]) -> Self {
        let mut request = Self::default();

        let is_form = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(FORM_CONTENT_TYPE));
        if is_form {
            for (key, value) in url::form_urlencoded::parse(body) {
                let slot = match &*key {
                    "selected_ids" => &mut request.selected_ids,
                    "project_name" => &mut request.project_name,
                    "user_login" => &mut request.user_login,
                    _ => continue,
                };
                if slot.is_none() {
                    *slot = Some(Value::String(value.into_owned()));
                }
            }
        }

        if let Ok(Value::Object(json)) = serde_json::from_slice::<Value>(body) {
            request.override_with(json);
        }
        request
    }

    fn override_with(&mut self, mut json: Map<String, Value>) {
        for (key, slot) in [
            ("selected_ids", &mut self.selected_ids),
            ("project_name", &mut self.project_name),
            ("user_login", &mut self.user_login),
        ] {
            if let Some(value) = json.remove(key) {
                *slot = Some(value);
            }
        }
    }
}

/// Falsy values (absent, null, empty string or list, zero, false) count as
/// missing.
fn is_blank(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The first selected id, when it is all ASCII digits. A string is split on
/// commas; a list is taken as-is.
pub fn first_playlist_id(selected: &Value) -> Option<EntityId> {
    let first = match selected {
        Value::String(s) => s.split(',').next().map(str::to_string),
        Value::Array(items) => items.first().and_then(scalar_text),
        _ => None,
    }?;
    if first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    first.parse().ok()
}

/// POST /sync-playlist
///
/// Export a playlist into a new copy of the template and redirect the
/// browser to it.
pub async fn sync_playlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let raw = String::from_utf8_lossy(&body).trim().to_string();
    let input = PlaylistRequest::from_body(&headers, &body);

    tracing::info!(
        selected_ids = ?input.selected_ids,
        project_name = ?input.project_name,
        user_login = ?input.user_login,
        "Playlist export requested"
    );

    let bad_request = |message: &str| AppError::BadRequest {
        message: message.to_string(),
        received_data: Some(raw.clone()),
    };

    if is_blank(&input.selected_ids) {
        return Err(bad_request("Missing 'selected_ids'"));
    }
    if is_blank(&input.project_name) {
        return Err(bad_request("Missing 'project_name'"));
    }
    let playlist_id = input
        .selected_ids
        .as_ref()
        .and_then(first_playlist_id)
        .ok_or_else(|| bad_request("Invalid or missing selected playlist ID"))?;
    let project_name = input
        .project_name
        .as_ref()
        .and_then(scalar_text)
        .ok_or_else(|| bad_request("Missing 'project_name'"))?;

    let outcome = state
        .exporter()
        .export(playlist_id, &project_name)
        .await
        .map_err(export_failure)?;

    tracing::info!(
        playlist = %outcome.playlist_name,
        versions = outcome.version_count,
        url = %outcome.url,
        "Playlist exported"
    );

    Ok((StatusCode::FOUND, [(LOCATION, outcome.url)]).into_response())
}

fn export_failure(err: CoreError) -> AppError {
    match err {
        CoreError::NotFound {
            entity: "Playlist",
            key,
        } => AppError::NotFound(format!("No playlist found with ID: {key}")),
        CoreError::NotFound {
            entity: "Version",
            key,
        } => AppError::NotFound(format!("No versions found for playlist {key}")),
        other => AppError::Core(other),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    fn form_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        headers
    }

    #[test]
    fn form_fields_are_read() {
        let request = PlaylistRequest::from_body(
            &form_headers(),
            b"selected_ids=12%2C13&project_name=Hallows&user_login=jo",
        );
        assert_eq!(request.selected_ids, Some(json!("12,13")));
        assert_eq!(request.project_name, Some(json!("Hallows")));
        assert_eq!(request.user_login, Some(json!("jo")));
    }

    #[test]
    fn json_fields_override_and_fill_in() {
        let request = PlaylistRequest::from_body(
            &HeaderMap::new(),
            br#"{"selected_ids": ["7"], "project_name": "Hallows"}"#,
        );
        assert_eq!(request.selected_ids, Some(json!(["7"])));
        assert_eq!(request.project_name, Some(json!("Hallows")));
        assert_eq!(request.user_login, None);
    }

    #[test]
    fn form_body_without_form_content_type_is_ignored() {
        let request = PlaylistRequest::from_body(&HeaderMap::new(), b"selected_ids=12");
        assert_eq!(request, PlaylistRequest::default());
    }

    #[test]
    fn first_id_must_be_digits() {
        assert_eq!(first_playlist_id(&json!("12,13")), Some(12));
        assert_eq!(first_playlist_id(&json!(["5", "x"])), Some(5));
        assert_eq!(first_playlist_id(&json!([9])), Some(9));
        assert_eq!(first_playlist_id(&json!("abc")), None);
        assert_eq!(first_playlist_id(&json!(" 12")), None);
        assert_eq!(first_playlist_id(&json!(",12")), None);
        assert_eq!(first_playlist_id(&json!([-3])), None);
    }

    #[test]
    fn blank_values() {
        assert!(is_blank(&None));
        assert!(is_blank(&Some(json!(""))));
        assert!(is_blank(&Some(json!([]))));
        assert!(!is_blank(&Some(json!("0"))));
    }
}
