//! Review-system records as read by the bridge.
//!
//! Every record arrives as a flat JSON object (`type`, `id`, then the
//! requested fields, with links rendered as [`EntityRef`] objects). The
//! structs here name the fields the mapping actually uses; anything else
//! in the payload is ignored.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// Review-system record identifier.
pub type EntityId = i64;

/// A raw review-system record: `type`, `id` and whatever fields were asked for.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub const PLAYLIST: &str = "Playlist";
pub const VERSION: &str = "Version";
pub const SHOT: &str = "Shot";
pub const NOTE: &str = "Note";
pub const PROJECT: &str = "Project";
pub const HUMAN_USER: &str = "HumanUser";
pub const API_USER: &str = "ApiUser";

/// Fields fetched for each Version on export.
pub const VERSION_EXPORT_FIELDS: &[&str] = &[
    "sg_shot_code",
    "client_code",
    "code",
    "sg_work_description",
    "entity",
    "sg_status_list",
    "sg_first_frame",
    "sg_last_frame",
    "sg_slate_notes",
];

/// Fields fetched for a Version resolved by code on import.
pub const VERSION_LINK_FIELDS: &[&str] = &["id", "entity", "project"];

pub const NOTE_FIELDS: &[&str] = &["content", "created_at"];

/// Link to another record, as stored in entity and multi-entity fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRef {
    pub fn new(entity_type: &str, id: EntityId) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            id,
            name: None,
        }
    }

    /// Whether this link points at a record of the given type.
    pub fn is(&self, entity_type: &str) -> bool {
        self.entity_type == entity_type
    }

    /// Identity comparison that ignores the display name.
    pub fn same_entity(&self, other: &EntityRef) -> bool {
        self.entity_type == other.entity_type && self.id == other.id
    }
}

/// The API script identity used as note author when no human user matches.
pub fn api_script_user() -> EntityRef {
    EntityRef::new(API_USER, 1)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub id: EntityId,
    #[serde(default)]
    pub code: Option<String>,
}

impl Playlist {
    /// Display name, used as the new spreadsheet's title and in column B.
    pub fn display_name(&self) -> &str {
        self.code.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "sg_frame_handles", default)]
    pub frame_handles: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Version {
    pub id: EntityId,
    /// Internal version code, e.g. `HAL_122_1020_COMP_v016`.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(rename = "sg_shot_code", default)]
    pub shot_code: Option<String>,
    /// Client-facing version name.
    #[serde(default)]
    pub client_code: Option<String>,
    #[serde(rename = "sg_work_description", default)]
    pub work_description: Option<String>,
    #[serde(rename = "sg_first_frame", default)]
    pub first_frame: Option<i64>,
    #[serde(rename = "sg_last_frame", default)]
    pub last_frame: Option<i64>,
    #[serde(rename = "sg_status_list", default)]
    pub status: Option<String>,
    #[serde(rename = "sg_slate_notes", default)]
    pub slate_notes: Option<String>,
    /// Parent entity; a Shot for shot work, anything else otherwise.
    #[serde(default)]
    pub entity: Option<EntityRef>,
    #[serde(default)]
    pub project: Option<EntityRef>,
}

impl Version {
    /// The parent Shot link, if the parent entity is a Shot.
    pub fn parent_shot(&self) -> Option<&EntityRef> {
        self.entity.as_ref().filter(|e| e.is(SHOT))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Shot {
    pub id: EntityId,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Note {
    pub id: EntityId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HumanUser {
    pub id: EntityId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
}

/// Decode a raw record into one of the typed records above.
pub fn decode<T: DeserializeOwned>(entity: &'static str, record: Record) -> Result<T, RemoteError> {
    serde_json::from_value(serde_json::Value::Object(record)).map_err(|e| RemoteError::Decode {
        entity,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn version_decodes_shotgrid_field_names() {
        let version: Version = decode(
            VERSION,
            record(json!({
                "type": "Version",
                "id": 7,
                "code": "SH010_comp_v003",
                "sg_shot_code": "SH010",
                "sg_first_frame": 1001,
                "sg_last_frame": null,
                "entity": {"type": "Shot", "id": 42, "name": "SH010"},
            })),
        )
        .unwrap();

        assert_eq!(version.shot_code.as_deref(), Some("SH010"));
        assert_eq!(version.first_frame, Some(1001));
        assert_eq!(version.last_frame, None);
        assert_eq!(version.parent_shot().map(|s| s.id), Some(42));
    }

    #[test]
    fn non_shot_parent_is_not_a_shot() {
        let version = Version {
            id: 1,
            entity: Some(EntityRef::new("Asset", 3)),
            ..Default::default()
        };
        assert!(version.parent_shot().is_none());
    }

    #[test]
    fn decode_reports_entity_on_mismatch() {
        let err = decode::<Playlist>(PLAYLIST, record(json!({"code": "REV_010"}))).unwrap_err();
        assert!(err.to_string().starts_with("Unexpected Playlist payload"));
    }

    #[test]
    fn same_entity_ignores_display_name() {
        let mut a = EntityRef::new(SHOT, 5);
        a.name = Some("SH050".to_string());
        assert!(a.same_entity(&EntityRef::new(SHOT, 5)));
        assert!(!a.same_entity(&EntityRef::new(VERSION, 5)));
    }

    #[test]
    fn entity_ref_serializes_without_empty_name() {
        let value = serde_json::to_value(api_script_user()).unwrap();
        assert_eq!(value, json!({"type": "ApiUser", "id": 1}));
    }
}
