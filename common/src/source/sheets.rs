// Google Sheets values API record source

use crate::config::{ColumnLayout, SourceConfig};
use crate::errors::SourceError;
use crate::models::{Record, Snapshot};
use crate::source::RecordSource;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Body of a `spreadsheets.values.get` response
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// SheetsRecordSource reads a fixed range of one spreadsheet with an API key
pub struct SheetsRecordSource {
    client: Client,
    url: Url,
    api_key: String,
    columns: ColumnLayout,
}

impl SheetsRecordSource {
    /// Create a new source from settings
    ///
    /// Fails when the HTTP client cannot be built or identifiers are missing.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        if config.spreadsheet_id.is_empty() {
            return Err(SourceError::Client("spreadsheet id is empty".to_string()));
        }
        if config.api_key.is_empty() {
            return Err(SourceError::Client("API key is empty".to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout_seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout_seconds));
        }
        let client = builder
            .build()
            .map_err(|e| SourceError::Client(format!("Failed to create HTTP client: {}", e)))?;

        let url = Self::values_url(&config.base_url, &config.spreadsheet_id, &config.range)?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            columns: config.columns,
        })
    }

    /// Build `<base>/v4/spreadsheets/<id>/values/<range>` with encoded segments
    fn values_url(base_url: &str, spreadsheet_id: &str, range: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| SourceError::Client(format!("Invalid base URL '{}': {}", base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| SourceError::Client(format!("Base URL '{}' cannot be a base", base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);

        Ok(url)
    }
}

#[async_trait]
impl RecordSource for SheetsRecordSource {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self) -> Result<Snapshot, SourceError> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value_range: ValueRange = response.json().await?;

        if value_range.values.is_empty() {
            tracing::info!("No data found");
            return Ok(Snapshot::default());
        }

        let snapshot = rows_to_snapshot(value_range.values, &self.columns);
        tracing::debug!(records = snapshot.len(), "Fetched records from sheet");
        Ok(snapshot)
    }
}

/// Map raw sheet rows onto records
///
/// The values API drops trailing empty cells, so a missing cell reads as an
/// empty string. Rows with no text at all are skipped.
fn rows_to_snapshot(rows: Vec<Vec<Value>>, columns: &ColumnLayout) -> Snapshot {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            if row.iter().all(|cell| cell_text(cell).trim().is_empty()) {
                tracing::warn!(row = index, cells = row.len(), "Skipping blank row");
                return None;
            }

            let text_at = |col: usize| row.get(col).map(cell_text).unwrap_or_default();
            let agent_name = columns
                .agent_name
                .map(text_at)
                .filter(|name| !name.is_empty());

            Some(Record {
                name: text_at(columns.name),
                address: text_at(columns.address),
                agent_name,
                agent_number: text_at(columns.agent_number),
            })
        })
        .collect()
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
