//! Seams to the three remote collaborators.
//!
//! Handlers and the pipeline only ever talk to the review system, the
//! spreadsheet service and the file store through these traits, so the
//! HTTP clients can be swapped for the in-memory fakes in tests.

use async_trait::async_trait;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

use crate::error::RemoteError;
use crate::export::RangeWrite;
use crate::sheet::{GridRect, Rgb, SheetRange, Worksheet};
use crate::types::{EntityId, Record};

// ---------------------------------------------------------------------------
// Review system
// ---------------------------------------------------------------------------

/// Filter relation supported by the review-system query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Is,
    In,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::In => "in",
        }
    }
}

/// One `[field, relation, value]` condition. Fields may follow links with
/// the `link.Type.field` path syntax (e.g. `project.Project.name`).
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub relation: Relation,
    pub value: Value,
}

impl Filter {
    pub fn is(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            relation: Relation::Is,
            value: value.into(),
        }
    }

    pub fn in_list(field: &str, values: Vec<Value>) -> Self {
        Self {
            field: field.to_string(),
            relation: Relation::In,
            value: Value::Array(values),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.field)?;
        seq.serialize_element(self.relation.as_str())?;
        seq.serialize_element(&self.value)?;
        seq.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

/// A `find` request: filters are AND-ed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filters: Vec<Filter>,
    pub fields: Vec<String>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl FindQuery {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order.push(Order {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Production-tracking service holding Playlists, Versions, Shots, Notes,
/// Projects and users.
#[async_trait]
pub trait ReviewSystem: Send + Sync {
    /// Records of `entity_type` matching every filter of the query.
    async fn find(&self, entity_type: &str, query: FindQuery) -> Result<Vec<Record>, RemoteError>;

    /// First record matching the query, if any.
    async fn find_one(
        &self,
        entity_type: &str,
        query: FindQuery,
    ) -> Result<Option<Record>, RemoteError> {
        Ok(self.find(entity_type, query.limit(1)).await?.into_iter().next())
    }

    /// Create a record and return it with its assigned `id`.
    async fn create(&self, entity_type: &str, data: Record) -> Result<Record, RemoteError>;

    /// Update fields of an existing record.
    async fn update(
        &self,
        entity_type: &str,
        id: EntityId,
        data: Record,
    ) -> Result<Record, RemoteError>;
}

// ---------------------------------------------------------------------------
// Spreadsheet service
// ---------------------------------------------------------------------------

/// How cell values are returned when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRender {
    /// Displayed values, as the user sees them.
    Formatted,
    /// Formulas where present, plain values otherwise.
    Formula,
}

/// How written strings are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInput {
    /// Stored verbatim as text.
    Raw,
    /// Parsed as if typed into the UI (formulas, numbers, dates).
    UserEntered,
}

#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// All tabs of the spreadsheet.
    async fn worksheets(&self, spreadsheet_id: &str) -> Result<Vec<Worksheet>, RemoteError>;

    /// Append a new tab with the given grid size.
    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<Worksheet, RemoteError>;

    /// Cell values of a range, row-major. Trailing empty cells and rows are
    /// omitted, so rows may be ragged.
    async fn read_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
        render: ValueRender,
    ) -> Result<Vec<Vec<String>>, RemoteError>;

    /// Overwrite a range with the given rows.
    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
        values: Vec<Vec<String>>,
        input: ValueInput,
    ) -> Result<(), RemoteError>;

    /// Overwrite several ranges in one call. All ranges share one input
    /// mode; an empty batch sends nothing.
    async fn write_batch(
        &self,
        spreadsheet_id: &str,
        writes: Vec<RangeWrite>,
        input: ValueInput,
    ) -> Result<(), RemoteError>;

    /// Set (or with `None`, clear) the background colour of every rectangle
    /// in one batched call.
    async fn set_backgrounds(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        cells: &[GridRect],
        color: Option<Rgb>,
    ) -> Result<(), RemoteError>;
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Access level granted on a shared file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Writer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Writer => "writer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Everyone in an organisational domain.
    Domain { domain: String, role: Role },
    /// Anyone holding the link; never listed in search results.
    AnyoneWithLink { role: Role },
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Duplicate a file under a new name and return the copy's id.
    async fn copy_file(&self, file_id: &str, name: &str) -> Result<String, RemoteError>;

    async fn grant_permission(
        &self,
        file_id: &str,
        permission: &Permission,
    ) -> Result<(), RemoteError>;
}
