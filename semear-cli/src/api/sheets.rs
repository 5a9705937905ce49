//! Google-Sheets-shaped REST backend
//!
//! Implements [`TableStore`] against the v4 spreadsheets API. One spreadsheet
//! is the whole store; worksheets are its tables. Authentication is a
//! pre-acquired bearer token (obtaining it is the connection bootstrap, which
//! lives outside this crate).

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::error::{StoreError, StoreResult};
use super::store::{CellWrite, TableStore};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
        }
    }

    /// Point the client at a different endpoint (local emulator, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn values_url(&self, table: &str, suffix: &str) -> String {
        // Quoting the sheet name makes the whole-sheet range unambiguous.
        let quoted = format!("'{}'", table);
        let range = urlencoding::encode(&quoted);
        format!(
            "{}/{}/values/{}{}",
            self.base_url, self.spreadsheet_id, range, suffix
        )
    }

    fn spreadsheet_url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base_url, self.spreadsheet_id, suffix)
    }

    /// Map a non-success response onto the error taxonomy. `table` gives the
    /// not-found variants their context.
    async fn into_store_error(table: &str, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => String::new(),
        };

        match status.as_u16() {
            401 | 403 => StoreError::Auth(message),
            429 => StoreError::RateLimited { retry_after },
            404 => StoreError::TableNotFound(table.to_string()),
            // The values API reports a missing worksheet as an unparseable range.
            400 if message.contains("Unable to parse range") => {
                StoreError::TableNotFound(table.to_string())
            }
            400 => StoreError::InvalidRequest(message),
            code => StoreError::Api {
                status: code,
                message,
            },
        }
    }

    async fn expect_ok(table: &str, response: reqwest::Response) -> StoreResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::into_store_error(table, response).await)
        }
    }

    /// Resolve a worksheet title to its numeric sheet id. Needed only for
    /// structural requests (row deletion); the values API addresses by title.
    async fn sheet_id(&self, table: &str) -> StoreResult<i64> {
        let url = self.spreadsheet_url("?fields=sheets.properties");
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let response = Self::expect_ok(table, response).await?;
        let meta: SpreadsheetMeta = response.json().await?;

        meta.sheets
            .into_iter()
            .find(|s| s.properties.title == table)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    fn cell_to_string(cell: &serde_json::Value) -> String {
        match cell {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl TableStore for SheetsClient {
    async fn get_all_values(&self, table: &str) -> StoreResult<Vec<Vec<String>>> {
        let url = self.values_url(table, "?valueRenderOption=FORMATTED_VALUE");
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let response = Self::expect_ok(table, response).await?;
        let range: ValueRange = response.json().await?;

        let grid: Vec<Vec<String>> = range
            .values
            .iter()
            .map(|row| row.iter().map(Self::cell_to_string).collect())
            .collect();
        debug!("fetched {} raw rows from '{}'", grid.len(), table);
        Ok(grid)
    }

    async fn append_rows(&self, table: &str, rows: &[Vec<String>]) -> StoreResult<()> {
        let url = self.values_url(
            table,
            ":append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
        );
        let body = json!({ "values": rows });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::expect_ok(table, response).await?;
        debug!("appended {} row(s) to '{}'", rows.len(), table);
        Ok(())
    }

    async fn update_cells(&self, table: &str, cells: &[CellWrite]) -> StoreResult<()> {
        if cells.is_empty() {
            return Ok(());
        }
        let data: Vec<serde_json::Value> = cells
            .iter()
            .map(|cell| {
                json!({
                    "range": format!("'{}'!R{}C{}", table, cell.row, cell.col),
                    "values": [[cell.value]],
                })
            })
            .collect();
        let body = json!({ "valueInputOption": "RAW", "data": data });
        let url = self.spreadsheet_url("/values:batchUpdate");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::expect_ok(table, response).await?;
        debug!("updated {} cell(s) in '{}'", cells.len(), table);
        Ok(())
    }

    async fn delete_row(&self, table: &str, row: usize) -> StoreResult<()> {
        if row == 0 {
            return Err(StoreError::InvalidRequest(
                "row numbers are 1-based".to_string(),
            ));
        }
        let sheet_id = self.sheet_id(table).await?;
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            }]
        });
        let url = self.spreadsheet_url(":batchUpdate");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::expect_ok(table, response).await?;
        debug!("deleted row {} from '{}'", row, table);
        Ok(())
    }

    async fn create_table(&self, table: &str, header: &[String]) -> StoreResult<()> {
        let body = json!({
            "requests": [{
                "addSheet": { "properties": { "title": table } }
            }]
        });
        let url = self.spreadsheet_url(":batchUpdate");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::expect_ok(table, response).await?;

        // Seed the header row in place so the new table has its wire contract.
        let url = self.values_url(table, "?valueInputOption=RAW");
        let body = json!({ "values": [header] });
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::expect_ok(table, response).await?;
        debug!("created table '{}' with {} column(s)", table, header.len());
        Ok(())
    }
}
