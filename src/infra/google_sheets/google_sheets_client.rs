// =============================================================================
// GOOGLE SHEETS CLIENT
// =============================================================================
//
// Reads cell ranges through the Sheets v4 `values.get` endpoint:
//
//   GET https://sheets.googleapis.com/v4/spreadsheets/{id}/values/{range}
//
// The response looks like:
//
//   { "range": "2024!E2:E55", "majorDimension": "ROWS",
//     "values": [["3"], [], ["N/A"]] }
//
// `values` is left out entirely when the range is empty, blank rows come back
// as `[]`, and trailing blank rows are dropped.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::alert::{AlertError, SpreadsheetReader};
use crate::infra::google_auth::Credential;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Errors raised by the Sheets API.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Google Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[allow(dead_code)]
    range: Option<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Client for reading spreadsheet values with a bearer token.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl GoogleSheetsClient {
    pub fn new(credential: Credential) -> Self {
        Self::with_base_url(credential, SHEETS_API_BASE)
    }

    pub fn with_base_url(credential: Credential, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// Builds `{base}/{id}/values/{range}` with each part percent-encoded as a
    /// path segment, so sheet names with spaces or slashes survive.
    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, SheetsError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| SheetsError::InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.base_url.clone()))?
            .push(spreadsheet_id)
            .push("values")
            .push(range);

        Ok(url)
    }

    /// Fetches one range as rows of display strings.
    pub async fn fetch_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(spreadsheet_id, range)?;

        tracing::debug!("Fetching range {} from spreadsheet {}", range, spreadsheet_id);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.credential.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await?;
            return Err(SheetsError::Api {
                status,
                message: api_error_message(&text),
            });
        }

        let body = response.text().await?;
        parse_value_range(&body)
    }
}

/// Pulls `error.message` out of a Google error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(status) => format!("{} {}", status, parsed.error.message),
            None => parsed.error.message,
        },
        Err(_) => body.to_string(),
    }
}

fn parse_value_range(body: &str) -> Result<Vec<Vec<String>>, SheetsError> {
    let value_range: ValueRange = serde_json::from_str(body).map_err(|e| SheetsError::Api {
        status: 200,
        message: format!("unexpected response body: {}", e),
    })?;

    Ok(value_range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

/// Formatted values are strings, but be lenient with numbers and booleans.
fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SpreadsheetReader for GoogleSheetsClient {
    async fn get_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, AlertError> {
        self.fetch_values(spreadsheet_id, range)
            .await
            .map_err(|e| AlertError::Spreadsheet {
                range: range.to_string(),
                source: Box::new(e),
            })
    }
}
