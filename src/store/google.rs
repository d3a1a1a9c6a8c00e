use super::auth::TokenProvider;
use super::SpreadsheetStore;
use crate::errors::{AppError, AppResult};
use crate::models::WorksheetHandle;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    properties: Option<SpreadsheetProperties>,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    // Omitted by the API for the default first sheet.
    #[serde(default)]
    sheet_id: i64,
    title: String,
}

/// Google Sheets API v4 client bound to one spreadsheet.
#[derive(Debug)]
pub struct GoogleSheetsStore {
    api_base: String,
    spreadsheet_key: String,
    http: reqwest::Client,
    tokens: TokenProvider,
}

impl GoogleSheetsStore {
    /// Opens the spreadsheet by key, failing early when it does not exist or
    /// the service account cannot see it.
    pub async fn open(spreadsheet_key: impl Into<String>, tokens: TokenProvider, http: reqwest::Client) -> AppResult<Self> {
        Self::open_with_base(SHEETS_API_BASE, spreadsheet_key, tokens, http).await
    }

    pub async fn open_with_base(
        api_base: impl Into<String>,
        spreadsheet_key: impl Into<String>,
        tokens: TokenProvider,
        http: reqwest::Client,
    ) -> AppResult<Self> {
        let store = Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            spreadsheet_key: spreadsheet_key.into(),
            http,
            tokens,
        };

        let metadata = store.metadata("spreadsheetId,properties.title").await.map_err(|error| match error {
            AppError::NotFound(_) => AppError::NotFound(format!("spreadsheet {} not found", store.spreadsheet_key)),
            AppError::RemoteStore(message) if message.starts_with("403") => AppError::RemoteStore(format!(
                "spreadsheet {} is not shared with {} ({})",
                store.spreadsheet_key,
                store.tokens.client_email(),
                message
            )),
            other => other,
        })?;

        tracing::info!(
            spreadsheet = %store.spreadsheet_key,
            title = metadata.properties.as_ref().map(|p| p.title.as_str()).unwrap_or(""),
            "opened spreadsheet"
        );
        Ok(store)
    }

    async fn metadata(&self, fields: &str) -> AppResult<SpreadsheetMetadata> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(format!("{}/{}", self.api_base, self.spreadsheet_key))
            .query(&[("fields", fields)])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn batch_update(&self, requests: Vec<Value>) -> AppResult<Value> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(format!("{}/{}:batchUpdate", self.api_base, self.spreadsheet_key))
            .bearer_auth(token)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_response(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(body.trim().to_string()));
    }
    Err(AppError::RemoteStore(format!("{} {}", status.as_u16(), body.trim())))
}

fn find_sheet(metadata: &SpreadsheetMetadata, title: &str) -> Option<WorksheetHandle> {
    metadata
        .sheets
        .iter()
        .find(|sheet| sheet.properties.title == title)
        .map(|sheet| WorksheetHandle {
            sheet_id: sheet.properties.sheet_id,
            title: sheet.properties.title.clone(),
        })
}

/// Numbers go in as number cells so charts can plot them; everything else is
/// written verbatim as text.
fn cell_value(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => json!({ "userEnteredValue": { "numberValue": number } }),
        _ => json!({ "userEnteredValue": { "stringValue": raw } }),
    }
}

fn add_sheet_request(title: &str, rows: u32, cols: u32) -> Value {
    json!({
        "addSheet": {
            "properties": {
                "title": title,
                "gridProperties": { "rowCount": rows, "columnCount": cols }
            }
        }
    })
}

fn update_cells_request(sheet_id: i64, row: u32, col: u32, values: &[&str]) -> Value {
    json!({
        "updateCells": {
            "start": {
                "sheetId": sheet_id,
                "rowIndex": row.saturating_sub(1),
                "columnIndex": col.saturating_sub(1)
            },
            "rows": [{ "values": values.iter().map(|value| cell_value(value)).collect::<Vec<_>>() }],
            "fields": "userEnteredValue"
        }
    })
}

fn clear_row_request(sheet_id: i64, row: u32, col: u32) -> Value {
    json!({
        "updateCells": {
            "range": {
                "sheetId": sheet_id,
                "startRowIndex": row.saturating_sub(1),
                "endRowIndex": row,
                "startColumnIndex": col.saturating_sub(1)
            },
            "fields": "userEnteredValue"
        }
    })
}

fn insert_dimension_request(sheet_id: i64, index: u32) -> Value {
    json!({
        "insertDimension": {
            "range": {
                "sheetId": sheet_id,
                "dimension": "ROWS",
                "startIndex": index.saturating_sub(1),
                "endIndex": index
            },
            "inheritFromBefore": false
        }
    })
}

fn added_sheet(reply: &Value) -> AppResult<WorksheetHandle> {
    let properties = reply
        .pointer("/replies/0/addSheet/properties")
        .ok_or_else(|| AppError::RemoteStore("addSheet reply is missing sheet properties".to_string()))?;
    let properties: SheetProperties = serde_json::from_value(properties.clone())?;
    Ok(WorksheetHandle {
        sheet_id: properties.sheet_id,
        title: properties.title,
    })
}

impl SpreadsheetStore for GoogleSheetsStore {
    async fn find_worksheet(&self, title: &str) -> AppResult<Option<WorksheetHandle>> {
        let metadata = self.metadata("sheets.properties(sheetId,title)").await?;
        Ok(find_sheet(&metadata, title))
    }

    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> AppResult<WorksheetHandle> {
        let reply = self.batch_update(vec![add_sheet_request(title, rows, cols)]).await?;
        let sheet = added_sheet(&reply)?;
        tracing::info!(worksheet = %sheet.title, sheet_id = sheet.sheet_id, rows, cols, "created worksheet");
        Ok(sheet)
    }

    async fn update_cell(&self, sheet: &WorksheetHandle, row: u32, col: u32, value: &str) -> AppResult<()> {
        self.batch_update(vec![update_cells_request(sheet.sheet_id, row, col, &[value])])
            .await?;
        Ok(())
    }

    async fn clear_row_from(&self, sheet: &WorksheetHandle, row: u32, col: u32) -> AppResult<()> {
        self.batch_update(vec![clear_row_request(sheet.sheet_id, row, col)]).await?;
        Ok(())
    }

    async fn insert_row(&self, sheet: &WorksheetHandle, values: &[String], index: u32) -> AppResult<()> {
        let values = values.iter().map(String::as_str).collect::<Vec<_>>();
        self.batch_update(vec![
            insert_dimension_request(sheet.sheet_id, index),
            update_cells_request(sheet.sheet_id, index, 1, &values),
        ])
        .await?;
        Ok(())
    }
}
