//! Mapping between bridge records and REST v1 resources.

use std::future::Future;

use serde_json::{json, Map, Value};

use notebridge_core::remote::{Direction, FindQuery, Order};
use notebridge_core::types::Record;

use crate::error::ShotgridError;

/// REST collection names for the entity types the bridge touches.
const COLLECTIONS: &[(&str, &str)] = &[
    ("Playlist", "playlists"),
    ("Version", "versions"),
    ("Shot", "shots"),
    ("Note", "notes"),
    ("Project", "projects"),
    ("HumanUser", "human_users"),
    ("ApiUser", "api_users"),
];

/// Collection path segment for an entity type (`HumanUser` → `human_users`).
pub fn collection(entity_type: &str) -> Result<&'static str, ShotgridError> {
    COLLECTIONS
        .iter()
        .find(|(name, _)| *name == entity_type)
        .map(|(_, plural)| *plural)
        .ok_or_else(|| ShotgridError::UnknownEntity(entity_type.to_string()))
}

/// `sort` parameter: comma-separated fields, `-` prefix for descending.
pub fn sort_param(order: &[Order]) -> Option<String> {
    if order.is_empty() {
        return None;
    }
    let parts: Vec<String> = order
        .iter()
        .map(|o| match o.direction {
            Direction::Asc => o.field.clone(),
            Direction::Desc => format!("-{}", o.field),
        })
        .collect();
    Some(parts.join(","))
}

/// Largest page the REST API serves.
pub const PAGE_SIZE: usize = 500;

/// Body for one page of `POST /entity/{collection}/_search` in
/// array-filter form. Page numbers start at 1.
pub fn search_body(query: &FindQuery, page_number: usize, page_size: usize) -> Value {
    let fields: Vec<&str> = if query.fields.is_empty() {
        vec!["*"]
    } else {
        query.fields.iter().map(String::as_str).collect()
    };

    let mut body = json!({
        "filters": query.filters,
        "fields": fields,
    });
    if let Some(sort) = sort_param(&query.order) {
        body["sort"] = Value::String(sort);
    }
    body["page"] = json!({ "number": page_number, "size": page_size });
    body
}

/// Run a search page by page and concatenate the results.
///
/// `fetch` receives each page body in turn. Paging stops at the first
/// short page or once the query limit is met.
pub async fn collect_pages<F, Fut>(query: &FindQuery, mut fetch: F) -> Result<Vec<Record>, ShotgridError>
where
    F: FnMut(Value) -> Fut,
    Fut: Future<Output = Result<Vec<Record>, ShotgridError>>,
{
    let page_size = query.limit.map_or(PAGE_SIZE, |limit| limit.clamp(1, PAGE_SIZE));
    let mut records = Vec::new();
    for page_number in 1.. {
        let page = fetch(search_body(query, page_number, page_size)).await?;
        let short = page.len() < page_size;
        records.extend(page);
        if short || query.limit.is_some_and(|limit| records.len() >= limit) {
            break;
        }
    }
    if let Some(limit) = query.limit {
        records.truncate(limit);
    }
    Ok(records)
}

/// Flatten one JSON:API resource (`{type, id, attributes, relationships}`)
/// into a record where link fields hold `{type, id, name}` values directly.
pub fn flatten(resource: Value) -> Result<Record, ShotgridError> {
    let Value::Object(mut resource) = resource else {
        return Err(ShotgridError::Payload("resource is not an object".into()));
    };

    let mut record = Map::new();
    for key in ["type", "id"] {
        if let Some(value) = resource.remove(key) {
            record.insert(key.to_string(), value);
        }
    }
    if !record.contains_key("id") {
        return Err(ShotgridError::Payload("resource has no id".into()));
    }

    if let Some(Value::Object(attributes)) = resource.remove("attributes") {
        record.extend(attributes);
    }
    if let Some(Value::Object(relationships)) = resource.remove("relationships") {
        for (field, relation) in relationships {
            let data = match relation {
                Value::Object(mut rel) => rel.remove("data").unwrap_or(Value::Null),
                _ => Value::Null,
            };
            record.insert(field, strip_links(data));
        }
    }
    Ok(record)
}

/// Linked entities carry their own `links` block; drop it.
fn strip_links(value: Value) -> Value {
    match value {
        Value::Object(mut obj) => {
            obj.remove("links");
            Value::Object(obj)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(strip_links).collect()),
        other => other,
    }
}

/// Pull the `data` member out of a response envelope.
pub fn data(envelope: Value) -> Result<Value, ShotgridError> {
    match envelope {
        Value::Object(mut obj) => obj
            .remove("data")
            .ok_or_else(|| ShotgridError::Payload("response has no data member".into())),
        _ => Err(ShotgridError::Payload("response is not an object".into())),
    }
}

/// Flatten every resource of a list response.
pub fn flatten_list(envelope: Value) -> Result<Vec<Record>, ShotgridError> {
    match data(envelope)? {
        Value::Array(items) => items.into_iter().map(flatten).collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(ShotgridError::Payload("data is not a list".into())),
    }
}
