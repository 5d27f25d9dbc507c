//! Sheets API v4: worksheets, value ranges and background formatting.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use notebridge_core::error::RemoteError;
use notebridge_core::export::RangeWrite;
use notebridge_core::remote::{SpreadsheetService, ValueInput, ValueRender};
use notebridge_core::sheet::{GridRect, Rgb, SheetRange, Worksheet};

use crate::auth::ServiceAccountAuth;
use crate::error::GoogleApiError;

const SERVICE: &str = "Google Sheets";
const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const BACKGROUND_FIELD_MASK: &str = "userEnteredFormat.backgroundColor";

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
    #[serde(default)]
    index: usize,
}

impl From<SheetProperties> for Worksheet {
    fn from(p: SheetProperties) -> Self {
        Worksheet {
            sheet_id: p.sheet_id,
            title: p.title,
            index: p.index,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct ValueRangeBody {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

// ── Request builders ────────────────────────────────────────────────

fn render_option(render: ValueRender) -> &'static str {
    match render {
        ValueRender::Formatted => "FORMATTED_VALUE",
        ValueRender::Formula => "FORMULA",
    }
}

fn input_option(input: ValueInput) -> &'static str {
    match input {
        ValueInput::Raw => "RAW",
        ValueInput::UserEntered => "USER_ENTERED",
    }
}

/// `batchUpdate` body appending a tab with the given grid size.
pub fn add_sheet_request(title: &str, rows: u32, cols: u32) -> Value {
    json!({
        "requests": [{
            "addSheet": {
                "properties": {
                    "title": title,
                    "gridProperties": { "rowCount": rows, "columnCount": cols }
                }
            }
        }]
    })
}

/// `values:batchUpdate` body writing every range with one input option.
pub fn values_batch_request(writes: Vec<RangeWrite>, input: ValueInput) -> Value {
    let data: Vec<Value> = writes
        .into_iter()
        .map(|write| {
            json!({
                "range": write.range.to_a1(),
                "majorDimension": "ROWS",
                "values": write.values,
            })
        })
        .collect();
    json!({ "valueInputOption": input_option(input), "data": data })
}

/// `batchUpdate` body with one `repeatCell` per rectangle. `None` clears the
/// background by writing an empty format under the same field mask.
pub fn background_request(sheet_id: i64, cells: &[GridRect], color: Option<Rgb>) -> Value {
    let format = match color {
        Some(rgb) => json!({ "backgroundColor": rgb }),
        None => json!({}),
    };
    let requests: Vec<Value> = cells
        .iter()
        .map(|rect| {
            json!({
                "repeatCell": {
                    "range": {
                        "sheetId": sheet_id,
                        "startRowIndex": rect.start_row,
                        "endRowIndex": rect.end_row,
                        "startColumnIndex": rect.start_col,
                        "endColumnIndex": rect.end_col,
                    },
                    "cell": { "userEnteredFormat": format },
                    "fields": BACKGROUND_FIELD_MASK,
                }
            })
        })
        .collect();
    json!({ "requests": requests })
}

/// Cell text as the UI would show it. Unformatted numbers and booleans can
/// appear when reading formulas.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn into_rows(body: ValueRangeBody) -> Vec<Vec<String>> {
    body.values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect()
}

// ── Client ──────────────────────────────────────────────────────────

/// Sheets API client sharing the service-account token.
pub struct SheetsClient {
    client: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    base_url: String,
}

impl SheetsClient {
    pub fn new(client: reqwest::Client, auth: Arc<ServiceAccountAuth>) -> Self {
        Self {
            client,
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, GoogleApiError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| GoogleApiError::Payload(format!("{} cannot be a base", self.base_url)))?
            .extend(segments);
        Ok(url)
    }

    async fn sheet_properties(&self, spreadsheet_id: &str) -> Result<Vec<Worksheet>, GoogleApiError> {
        let mut url = self.url(&[spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title,index)");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.bearer().await?)
            .send()
            .await?;
        let meta: SpreadsheetMeta = parse_response(response).await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.into()).collect())
    }

    async fn batch_update(&self, spreadsheet_id: &str, body: &Value) -> Result<Value, GoogleApiError> {
        let url = self.url(&[&format!("{spreadsheet_id}:batchUpdate")])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.bearer().await?)
            .json(body)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
        render: ValueRender,
    ) -> Result<Vec<Vec<String>>, GoogleApiError> {
        let mut url = self.url(&[spreadsheet_id, "values", &range.to_a1()])?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", render_option(render));

        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.bearer().await?)
            .send()
            .await?;
        let body: ValueRangeBody = parse_response(response).await?;
        Ok(into_rows(body))
    }

    async fn put_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
        values: Vec<Vec<String>>,
        input: ValueInput,
    ) -> Result<(), GoogleApiError> {
        let a1 = range.to_a1();
        let mut url = self.url(&[spreadsheet_id, "values", &a1])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input_option(input));

        let response = self
            .client
            .put(url)
            .bearer_auth(self.auth.bearer().await?)
            .json(&json!({ "range": a1, "majorDimension": "ROWS", "values": values }))
            .send()
            .await?;
        ensure_success(response).await?;
        tracing::debug!(spreadsheet_id, range = %a1, "Sheet range written");
        Ok(())
    }

    async fn post_values_batch(
        &self,
        spreadsheet_id: &str,
        writes: Vec<RangeWrite>,
        input: ValueInput,
    ) -> Result<(), GoogleApiError> {
        let count = writes.len();
        let url = self.url(&[spreadsheet_id, "values:batchUpdate"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.bearer().await?)
            .json(&values_batch_request(writes, input))
            .send()
            .await?;
        ensure_success(response).await?;
        tracing::debug!(spreadsheet_id, ranges = count, "Sheet ranges written");
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GoogleApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(GoogleApiError::ApiError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GoogleApiError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

fn remote(err: GoogleApiError) -> RemoteError {
    err.into_remote(SERVICE)
}

#[async_trait]
impl SpreadsheetService for SheetsClient {
    async fn worksheets(&self, spreadsheet_id: &str) -> Result<Vec<Worksheet>, RemoteError> {
        self.sheet_properties(spreadsheet_id).await.map_err(remote)
    }

    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<Worksheet, RemoteError> {
        let reply = self
            .batch_update(spreadsheet_id, &add_sheet_request(title, rows, cols))
            .await
            .map_err(remote)?;
        let properties = reply
            .pointer("/replies/0/addSheet/properties")
            .cloned()
            .ok_or_else(|| remote(GoogleApiError::Payload("addSheet reply missing".into())))?;
        let properties: SheetProperties = serde_json::from_value(properties)
            .map_err(|e| remote(GoogleApiError::Payload(e.to_string())))?;
        tracing::info!(spreadsheet_id, title, "Worksheet added");
        Ok(properties.into())
    }

    async fn read_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
        render: ValueRender,
    ) -> Result<Vec<Vec<String>>, RemoteError> {
        self.get_values(spreadsheet_id, range, render).await.map_err(remote)
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
        values: Vec<Vec<String>>,
        input: ValueInput,
    ) -> Result<(), RemoteError> {
        self.put_values(spreadsheet_id, range, values, input)
            .await
            .map_err(remote)
    }

    async fn write_batch(
        &self,
        spreadsheet_id: &str,
        writes: Vec<RangeWrite>,
        input: ValueInput,
    ) -> Result<(), RemoteError> {
        if writes.is_empty() {
            return Ok(());
        }
        self.post_values_batch(spreadsheet_id, writes, input)
            .await
            .map_err(remote)
    }

    async fn set_backgrounds(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        cells: &[GridRect],
        color: Option<Rgb>,
    ) -> Result<(), RemoteError> {
        if cells.is_empty() {
            return Ok(());
        }
        self.batch_update(spreadsheet_id, &background_request(sheet_id, cells, color))
            .await
            .map_err(remote)?;
        Ok(())
    }
}
