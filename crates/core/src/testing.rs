//! In-memory stand-ins for the remote collaborators.
//!
//! [`MemoryReviewSystem`] evaluates the small filter language the bridge
//! uses (`is`, `in`, link paths such as `project.Project.name`)
//! over JSON records. [`MemorySpreadsheets`] keeps spreadsheets as string
//! grids and doubles as the file store that copies and shares them.
//! Both can be told to fail a given operation.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteError;
use crate::export::RangeWrite;
use crate::remote::{
    Direction, FileStore, Filter, FindQuery, Permission, Relation, ReviewSystem,
    SpreadsheetService, ValueInput, ValueRender,
};
use crate::sheet::{GridRect, Rgb, SheetRange, Worksheet};
use crate::types::{EntityId, Record};

// ---------------------------------------------------------------------------
// Review system
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewOp {
    Find,
    Create,
    Update,
}

#[derive(Default)]
struct ReviewState {
    records: HashMap<String, Vec<Record>>,
    next_id: EntityId,
    failing: HashSet<(ReviewOp, String)>,
}

#[derive(Default)]
pub struct MemoryReviewSystem {
    state: Mutex<ReviewState>,
}

impl MemoryReviewSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record; `type` is filled in and an `id` assigned when absent.
    pub fn insert(&self, entity_type: &str, value: Value) -> EntityId {
        let mut record = value.as_object().cloned().unwrap_or_default();
        let mut state = self.state.lock().expect("review state poisoned");
        let id = match record.get("id").and_then(Value::as_i64) {
            Some(id) => {
                state.next_id = state.next_id.max(id);
                id
            }
            None => {
                state.next_id += 1;
                state.next_id
            }
        };
        record.insert("type".to_string(), Value::from(entity_type));
        record.insert("id".to_string(), Value::from(id));
        state
            .records
            .entry(entity_type.to_string())
            .or_default()
            .push(record);
        id
    }

    /// Snapshot of every stored record of a type, in insertion order.
    pub fn records(&self, entity_type: &str) -> Vec<Record> {
        let state = self.state.lock().expect("review state poisoned");
        state.records.get(entity_type).cloned().unwrap_or_default()
    }

    pub fn record(&self, entity_type: &str, id: EntityId) -> Option<Record> {
        self.records(entity_type)
            .into_iter()
            .find(|r| r.get("id").and_then(Value::as_i64) == Some(id))
    }

    /// Make every later `op` on `entity_type` fail with a 500.
    pub fn fail(&self, op: ReviewOp, entity_type: &str) {
        let mut state = self.state.lock().expect("review state poisoned");
        state.failing.insert((op, entity_type.to_string()));
    }

    fn check(state: &ReviewState, op: ReviewOp, entity_type: &str) -> Result<(), RemoteError> {
        if state.failing.contains(&(op, entity_type.to_string())) {
            return Err(RemoteError::Api {
                service: "ShotGrid",
                status: 500,
                body: format!("{op:?} {entity_type} unavailable"),
            });
        }
        Ok(())
    }
}

/// Follow a `field` or `link.Type.field` path through a record.
fn lookup<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut value = record.get(parts.next()?)?;
    let rest: Vec<&str> = parts.collect();
    for pair in rest.chunks(2) {
        let field = pair.get(1)?;
        value = value.get(field)?;
    }
    Some(value)
}

fn same_value(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(a), Value::Object(e)) if e.contains_key("type") && e.contains_key("id") => {
            a.get("type") == e.get("type") && a.get("id") == e.get("id")
        }
        _ => actual == expected,
    }
}

fn matches(record: &Record, filter: &Filter) -> bool {
    let actual = lookup(record, &filter.field).unwrap_or(&Value::Null);
    match filter.relation {
        Relation::Is => match actual {
            // Multi-entity fields match when any member is the value.
            Value::Array(items) => items.iter().any(|item| same_value(item, &filter.value)),
            other => same_value(other, &filter.value),
        },
        Relation::In => {
            let candidates = filter.value.as_array().cloned().unwrap_or_default();
            match actual {
                Value::Array(items) => items
                    .iter()
                    .any(|item| candidates.iter().any(|c| same_value(item, c))),
                other => candidates.iter().any(|c| same_value(other, c)),
            }
        }
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl ReviewSystem for MemoryReviewSystem {
    async fn find(&self, entity_type: &str, query: FindQuery) -> Result<Vec<Record>, RemoteError> {
        let state = self.state.lock().expect("review state poisoned");
        Self::check(&state, ReviewOp::Find, entity_type)?;

        let mut found: Vec<Record> = state
            .records
            .get(entity_type)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| query.filters.iter().all(|f| matches(r, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for order in query.order.iter().rev() {
            found.sort_by(|a, b| {
                let ord = compare(a.get(&order.field), b.get(&order.field));
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn create(&self, entity_type: &str, data: Record) -> Result<Record, RemoteError> {
        {
            let state = self.state.lock().expect("review state poisoned");
            Self::check(&state, ReviewOp::Create, entity_type)?;
        }
        let id = self.insert(entity_type, Value::Object(data));
        self.record(entity_type, id).ok_or(RemoteError::Decode {
            entity: "created record",
            message: "vanished after insert".to_string(),
        })
    }

    async fn update(
        &self,
        entity_type: &str,
        id: EntityId,
        data: Record,
    ) -> Result<Record, RemoteError> {
        let mut state = self.state.lock().expect("review state poisoned");
        Self::check(&state, ReviewOp::Update, entity_type)?;

        let record = state
            .records
            .get_mut(entity_type)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_i64) == Some(id))
            })
            .ok_or_else(|| RemoteError::Api {
                service: "ShotGrid",
                status: 404,
                body: format!("{entity_type} {id} not found"),
            })?;
        record.extend(data);
        Ok(record.clone())
    }
}

// ---------------------------------------------------------------------------
// Spreadsheets and file store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetOp {
    Worksheets,
    AddWorksheet,
    Read,
    Write,
    Format,
    Copy,
    Share,
}

#[derive(Debug, Clone)]
struct MemoryTab {
    worksheet: Worksheet,
    cells: Vec<Vec<String>>,
    backgrounds: HashMap<(usize, usize), Rgb>,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    name: String,
    tabs: Vec<MemoryTab>,
    permissions: Vec<Permission>,
}

#[derive(Default)]
struct SheetsState {
    files: HashMap<String, MemoryFile>,
    copies: usize,
    next_sheet_id: i64,
    failing: HashSet<SheetOp>,
    writes: Vec<String>,
}

#[derive(Default)]
pub struct MemorySpreadsheets {
    state: Mutex<SheetsState>,
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::Api {
        service: "Google Sheets",
        status: 404,
        body: format!("{what} not found"),
    }
}

impl SheetsState {
    fn check(&self, op: SheetOp) -> Result<(), RemoteError> {
        if self.failing.contains(&op) {
            return Err(RemoteError::Api {
                service: "Google Sheets",
                status: 500,
                body: format!("{op:?} unavailable"),
            });
        }
        Ok(())
    }

    fn file(&mut self, spreadsheet_id: &str) -> Result<&mut MemoryFile, RemoteError> {
        self.files
            .get_mut(spreadsheet_id)
            .ok_or_else(|| not_found(spreadsheet_id))
    }

    fn put(
        &mut self,
        spreadsheet_id: &str,
        range: &SheetRange,
        values: Vec<Vec<String>>,
    ) -> Result<(), RemoteError> {
        let tab = self.tab_by_title(spreadsheet_id, &range.sheet)?;
        for (r, row) in values.into_iter().enumerate() {
            let row_idx = range.first_row - 1 + r;
            if tab.cells.len() <= row_idx {
                tab.cells.resize(row_idx + 1, Vec::new());
            }
            let cells = &mut tab.cells[row_idx];
            for (c, value) in row.into_iter().enumerate() {
                let col = range.first_col + c;
                if cells.len() <= col {
                    cells.resize(col + 1, String::new());
                }
                cells[col] = value;
            }
        }
        Ok(())
    }

    fn tab_by_title(&mut self, spreadsheet_id: &str, title: &str) -> Result<&mut MemoryTab, RemoteError> {
        self.file(spreadsheet_id)?
            .tabs
            .iter_mut()
            .find(|t| t.worksheet.title == title)
            .ok_or_else(|| not_found(title))
    }
}

/// Drop trailing empty cells and rows, the way the values API reports them.
fn trimmed(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|mut row| {
            while row.last().is_some_and(String::is_empty) {
                row.pop();
            }
            row
        })
        .collect();
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }
    rows
}

impl MemorySpreadsheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spreadsheet whose tabs are given in order with their rows.
    pub fn add_spreadsheet(&self, spreadsheet_id: &str, name: &str, tabs: &[(&str, Vec<Vec<&str>>)]) {
        let mut state = self.state.lock().expect("sheets state poisoned");
        let mut memory_tabs = Vec::new();
        for (index, (title, rows)) in tabs.iter().enumerate() {
            let sheet_id = state.next_sheet_id;
            state.next_sheet_id += 1;
            memory_tabs.push(MemoryTab {
                worksheet: Worksheet {
                    sheet_id,
                    title: title.to_string(),
                    index,
                },
                cells: rows
                    .iter()
                    .map(|row| row.iter().map(|c| c.to_string()).collect())
                    .collect(),
                backgrounds: HashMap::new(),
            });
        }
        state.files.insert(
            spreadsheet_id.to_string(),
            MemoryFile {
                name: name.to_string(),
                tabs: memory_tabs,
                permissions: Vec::new(),
            },
        );
    }

    /// Make every later `op` fail with a 500.
    pub fn fail(&self, op: SheetOp) {
        self.state.lock().expect("sheets state poisoned").failing.insert(op);
    }

    /// Ids of every spreadsheet, including copies.
    pub fn spreadsheet_ids(&self) -> Vec<String> {
        let state = self.state.lock().expect("sheets state poisoned");
        let mut ids: Vec<String> = state.files.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn file_name(&self, spreadsheet_id: &str) -> Option<String> {
        let state = self.state.lock().expect("sheets state poisoned");
        state.files.get(spreadsheet_id).map(|f| f.name.clone())
    }

    pub fn permissions(&self, spreadsheet_id: &str) -> Vec<Permission> {
        let state = self.state.lock().expect("sheets state poisoned");
        state
            .files
            .get(spreadsheet_id)
            .map(|f| f.permissions.clone())
            .unwrap_or_default()
    }

    /// Tab titles in order.
    pub fn tab_titles(&self, spreadsheet_id: &str) -> Vec<String> {
        let state = self.state.lock().expect("sheets state poisoned");
        state
            .files
            .get(spreadsheet_id)
            .map(|f| f.tabs.iter().map(|t| t.worksheet.title.clone()).collect())
            .unwrap_or_default()
    }

    /// Trimmed contents of a tab.
    pub fn values(&self, spreadsheet_id: &str, title: &str) -> Vec<Vec<String>> {
        let state = self.state.lock().expect("sheets state poisoned");
        state
            .files
            .get(spreadsheet_id)
            .and_then(|f| f.tabs.iter().find(|t| t.worksheet.title == title))
            .map(|t| trimmed(t.cells.clone()))
            .unwrap_or_default()
    }

    /// Background of a cell, by one-based row number and zero-based column.
    pub fn background(&self, spreadsheet_id: &str, title: &str, row_number: usize, col: usize) -> Option<Rgb> {
        let state = self.state.lock().expect("sheets state poisoned");
        state
            .files
            .get(spreadsheet_id)
            .and_then(|f| f.tabs.iter().find(|t| t.worksheet.title == title))
            .and_then(|t| t.backgrounds.get(&(row_number - 1, col)).copied())
    }

    /// A1 notation of every successful write call, in call order. A batch is
    /// one entry with its ranges joined by ` + `.
    pub fn write_log(&self) -> Vec<String> {
        self.state.lock().expect("sheets state poisoned").writes.clone()
    }
}

#[async_trait]
impl SpreadsheetService for MemorySpreadsheets {
    async fn worksheets(&self, spreadsheet_id: &str) -> Result<Vec<Worksheet>, RemoteError> {
        let mut state = self.state.lock().expect("sheets state poisoned");
        state.check(SheetOp::Worksheets)?;
        Ok(state
            .file(spreadsheet_id)?
            .tabs
            .iter()
            .map(|t| t.worksheet.clone())
            .collect())
    }

    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: u32,
        _cols: u32,
    ) -> Result<Worksheet, RemoteError> {
        let mut state = self.state.lock().expect("sheets state poisoned");
        state.check(SheetOp::AddWorksheet)?;
        let sheet_id = state.next_sheet_id;
        state.next_sheet_id += 1;

        let file = state.file(spreadsheet_id)?;
        let worksheet = Worksheet {
            sheet_id,
            title: title.to_string(),
            index: file.tabs.len(),
        };
        file.tabs.push(MemoryTab {
            worksheet: worksheet.clone(),
            cells: Vec::with_capacity(rows as usize),
            backgrounds: HashMap::new(),
        });
        Ok(worksheet)
    }

    async fn read_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
        _render: ValueRender,
    ) -> Result<Vec<Vec<String>>, RemoteError> {
        let mut state = self.state.lock().expect("sheets state poisoned");
        state.check(SheetOp::Read)?;
        let tab = state.tab_by_title(spreadsheet_id, &range.sheet)?;

        let rows = tab
            .cells
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let number = idx + 1;
                number >= range.first_row && range.last_row.is_none_or(|last| number <= last)
            })
            .map(|(_, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(col, _)| {
                        *col >= range.first_col && range.last_col.is_none_or(|last| *col <= last)
                    })
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect();
        Ok(trimmed(rows))
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
        values: Vec<Vec<String>>,
        _input: ValueInput,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock().expect("sheets state poisoned");
        state.check(SheetOp::Write)?;
        state.put(spreadsheet_id, range, values)?;
        state.writes.push(range.to_a1());
        Ok(())
    }

    async fn write_batch(
        &self,
        spreadsheet_id: &str,
        writes: Vec<RangeWrite>,
        _input: ValueInput,
    ) -> Result<(), RemoteError> {
        if writes.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock().expect("sheets state poisoned");
        state.check(SheetOp::Write)?;
        let ranges: Vec<String> = writes.iter().map(|w| w.range.to_a1()).collect();
        for write in writes {
            state.put(spreadsheet_id, &write.range, write.values)?;
        }
        state.writes.push(ranges.join(" + "));
        Ok(())
    }

    async fn set_backgrounds(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        cells: &[GridRect],
        color: Option<Rgb>,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock().expect("sheets state poisoned");
        state.check(SheetOp::Format)?;
        let tab = state
            .file(spreadsheet_id)?
            .tabs
            .iter_mut()
            .find(|t| t.worksheet.sheet_id == sheet_id)
            .ok_or_else(|| not_found(&format!("sheet {sheet_id}")))?;

        for rect in cells {
            for row in rect.start_row..rect.end_row {
                for col in rect.start_col..rect.end_col {
                    match color {
                        Some(rgb) => {
                            tab.backgrounds.insert((row, col), rgb);
                        }
                        None => {
                            tab.backgrounds.remove(&(row, col));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemorySpreadsheets {
    async fn copy_file(&self, file_id: &str, name: &str) -> Result<String, RemoteError> {
        let mut state = self.state.lock().expect("sheets state poisoned");
        state.check(SheetOp::Copy)?;
        let mut copy = state.file(file_id)?.clone();
        copy.name = name.to_string();
        copy.permissions.clear();

        state.copies += 1;
        let id = format!("copy-{}", state.copies);
        state.files.insert(id.clone(), copy);
        Ok(id)
    }

    async fn grant_permission(
        &self,
        file_id: &str,
        permission: &Permission,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock().expect("sheets state poisoned");
        state.check(SheetOp::Share)?;
        state.file(file_id)?.permissions.push(permission.clone());
        Ok(())
    }
}
