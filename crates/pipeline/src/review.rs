//! Typed queries against the review system.

use serde_json::{json, Map, Value};

use notebridge_core::error::CoreError;
use notebridge_core::remote::{Direction, Filter, FindQuery, ReviewSystem};
use notebridge_core::types::{
    api_script_user, decode, EntityId, EntityRef, Note, Playlist, Project, Shot, Version,
    HUMAN_USER, NOTE, NOTE_FIELDS, PLAYLIST, PROJECT, SHOT, VERSION, VERSION_EXPORT_FIELDS,
    VERSION_LINK_FIELDS,
};

fn entity_value(entity: &EntityRef) -> Value {
    json!({ "type": entity.entity_type, "id": entity.id })
}

/// Playlist by id; `NotFound` when absent.
pub async fn playlist(review: &dyn ReviewSystem, id: EntityId) -> Result<Playlist, CoreError> {
    let record = review
        .find_one(PLAYLIST, FindQuery::new(vec![Filter::is("id", id)]).fields(&["code"]))
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: PLAYLIST,
            key: id.to_string(),
        })?;
    Ok(decode(PLAYLIST, record)?)
}

pub async fn project_by_name(
    review: &dyn ReviewSystem,
    name: &str,
) -> Result<Option<Project>, CoreError> {
    let query = FindQuery::new(vec![Filter::is("name", name)]).fields(&["name", "sg_frame_handles"]);
    match review.find_one(PROJECT, query).await? {
        Some(record) => Ok(Some(decode(PROJECT, record)?)),
        None => Ok(None),
    }
}

/// Versions on the playlist that belong to the named project.
pub async fn playlist_versions(
    review: &dyn ReviewSystem,
    playlist_id: EntityId,
    project_name: &str,
) -> Result<Vec<Version>, CoreError> {
    let playlist = EntityRef::new(PLAYLIST, playlist_id);
    let query = FindQuery::new(vec![
        Filter::in_list("playlists", vec![entity_value(&playlist)]),
        Filter::is("project.Project.name", project_name),
    ])
    .fields(VERSION_EXPORT_FIELDS);

    review
        .find(VERSION, query)
        .await?
        .into_iter()
        .map(|record| decode(VERSION, record).map_err(CoreError::from))
        .collect()
}

pub async fn shot(review: &dyn ReviewSystem, shot: &EntityRef) -> Result<Option<Shot>, CoreError> {
    let query = FindQuery::new(vec![Filter::is("id", shot.id)]).fields(&["code"]);
    match review.find_one(SHOT, query).await? {
        Some(record) => Ok(Some(decode(SHOT, record)?)),
        None => Ok(None),
    }
}

/// Every note linked to the shot, newest first.
pub async fn shot_notes(review: &dyn ReviewSystem, shot: &EntityRef) -> Result<Vec<Note>, CoreError> {
    let query = FindQuery::new(vec![Filter::is("note_links", entity_value(shot))])
        .fields(NOTE_FIELDS)
        .order_by("created_at", Direction::Desc);

    review
        .find(NOTE, query)
        .await?
        .into_iter()
        .map(|record| decode(NOTE, record).map_err(CoreError::from))
        .collect()
}

/// Version by exact code.
pub async fn version_by_code(
    review: &dyn ReviewSystem,
    code: &str,
) -> Result<Option<Version>, CoreError> {
    let query = FindQuery::new(vec![Filter::is("code", code)]).fields(VERSION_LINK_FIELDS);
    match review.find_one(VERSION, query).await? {
        Some(record) => Ok(Some(decode(VERSION, record)?)),
        None => Ok(None),
    }
}

async fn human_user_where(
    review: &dyn ReviewSystem,
    field: &str,
    value: &str,
) -> Result<Option<EntityRef>, CoreError> {
    let query = FindQuery::new(vec![Filter::is(field, value)]).fields(&["id"]);
    Ok(review
        .find_one(HUMAN_USER, query)
        .await?
        .and_then(|record| record.get("id").and_then(Value::as_i64))
        .map(|id| EntityRef::new(HUMAN_USER, id)))
}

/// Note author for an email: the user with that email, else the user whose
/// login is the email's local part, else the API script identity.
pub async fn resolve_author(
    review: &dyn ReviewSystem,
    email: Option<&str>,
) -> Result<EntityRef, CoreError> {
    let Some(email) = email.filter(|e| !e.is_empty()) else {
        return Ok(api_script_user());
    };
    if let Some(user) = human_user_where(review, "email", email).await? {
        return Ok(user);
    }
    let login = notebridge_core::import::login_from_email(email);
    if let Some(user) = human_user_where(review, "login", login).await? {
        return Ok(user);
    }
    tracing::warn!(email, "No ShotGrid user for email, using script identity");
    Ok(api_script_user())
}

/// Create a note and return its id.
pub async fn create_note(
    review: &dyn ReviewSystem,
    project: Option<&EntityRef>,
    content: &str,
    links: &[EntityRef],
    author: &EntityRef,
) -> Result<EntityId, CoreError> {
    let mut data = Map::new();
    data.insert(
        "project".to_string(),
        project.map(entity_value).unwrap_or(Value::Null),
    );
    data.insert("content".to_string(), Value::from(content));
    data.insert(
        "note_links".to_string(),
        Value::Array(links.iter().map(entity_value).collect()),
    );
    data.insert("user".to_string(), entity_value(author));

    let created = review.create(NOTE, data).await?;
    created
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| CoreError::Data("Created note has no id".to_string()))
}

pub async fn set_version_status(
    review: &dyn ReviewSystem,
    version_id: EntityId,
    status_code: &str,
) -> Result<(), CoreError> {
    let mut data = Map::new();
    data.insert("sg_status_list".to_string(), Value::from(status_code));
    review.update(VERSION, version_id, data).await?;
    Ok(())
}
