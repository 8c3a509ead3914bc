use crate::app_config::LedgerConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tally_core::{LedgerStore, StoreError};
use tracing::debug;

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
/// Column span of every table's data region; the header row above it is
/// never touched.
const DATA_REGION: &str = "A2:F";

/// `LedgerStore` over the Google Sheets values API.
///
/// Order tables live in one spreadsheet, the stock table in another; the
/// table name decides which one a call is routed to.
pub struct SheetsLedgerStore {
    http: reqwest::Client,
    spreadsheet_id: String,
    stock_spreadsheet_id: String,
    stock_table: String,
    token: String,
}

impl SheetsLedgerStore {
    pub fn new(config: &LedgerConfig, stock_table: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            stock_spreadsheet_id: config.stock_spreadsheet_id.clone(),
            stock_table: stock_table.to_string(),
            token: config.access_token.clone(),
        }
    }

    fn spreadsheet_for(&self, table: &str) -> &str {
        if table == self.stock_table {
            &self.stock_spreadsheet_id
        } else {
            &self.spreadsheet_id
        }
    }

    fn values_url(&self, table: &str, range: &str) -> String {
        format!(
            "{BASE_URL}/{}/values/{}",
            self.spreadsheet_for(table),
            encode_range(&format!("'{table}'!{range}"))
        )
    }

    async fn get_values(&self, table: &str, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let response = self
            .http
            .get(self.values_url(table, range))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response, table)?;
        let body: ValuesResponse = response
            .json()
            .await
            .map_err(|err| StoreError::Payload(err.to_string()))?;
        Ok(body.values)
    }

    async fn put_values(
        &self,
        table: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), StoreError> {
        let url = format!("{}?valueInputOption=RAW", self.values_url(table, range));
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": values }))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response, table)?;
        Ok(())
    }

    async fn clear_values(&self, table: &str, range: &str) -> Result<(), StoreError> {
        let url = format!("{}:clear", self.values_url(table, range));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response, table)?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[async_trait]
impl LedgerStore for SheetsLedgerStore {
    async fn read_table(&self, table: &str) -> Result<Vec<Vec<String>>, StoreError> {
        self.get_values(table, DATA_REGION).await
    }

    async fn write_table(&self, table: &str, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        // The values API has no partial-row update, so the data region is
        // cleared and rewritten wholesale.
        debug!(table, rows = rows.len(), "rewriting table");
        self.clear_values(table, DATA_REGION).await?;
        if rows.is_empty() {
            return Ok(());
        }
        self.put_values(table, "A2", rows).await
    }

    async fn read_cell(&self, table: &str, cell: &str) -> Result<Option<String>, StoreError> {
        let values = self.get_values(table, cell).await?;
        Ok(values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|value| !value.is_empty()))
    }

    async fn write_cell(&self, table: &str, cell: &str, value: &str) -> Result<(), StoreError> {
        self.put_values(table, cell, vec![vec![value.to_string()]])
            .await
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

fn ensure_success(
    response: reqwest::Response,
    table: &str,
) -> Result<reqwest::Response, StoreError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(StoreError::Transport(format!(
            "{} from sheets api for table {table}",
            response.status()
        )))
    }
}

/// Minimal percent-encoding for A1 ranges embedded in a URL path.
fn encode_range(range: &str) -> String {
    range
        .replace('%', "%25")
        .replace(' ', "%20")
        .replace('\'', "%27")
}
