// src/sheets/client.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

use super::{auth::TokenSource, RowStore, SheetRow, SheetsError};
use crate::util::column_letters;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentProperties {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
struct SpreadsheetRaw {
    #[serde(default)]
    properties: DocumentProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

/// Document title plus its worksheets, in tab order.
#[derive(Debug, Clone)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub sheets: Vec<SheetProperties>,
}

impl SpreadsheetInfo {
    pub fn sheet_by_title(&self, title: &str) -> Option<&SheetProperties> {
        self.sheets.iter().find(|s| s.title == title)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

/// Sheets v4 REST client bound to one spreadsheet.
#[derive(Clone)]
pub struct SpreadsheetClient {
    http_client: Client,
    base_url: Url,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl SpreadsheetClient {
    pub fn new(spreadsheet_id: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: Url::parse(SHEETS_API_BASE).expect("static Sheets base URL should parse"),
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        }
    }

    /// Point at a different API root (must end with `/`).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url =
            Url::parse(base_url).with_context(|| format!("parsing Sheets base URL {}", base_url))?;
        Ok(self)
    }

    /// `<base>/<id>[/<segments>...]`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.join(&self.spreadsheet_id)?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("base URL cannot take path segments"))?;
            for seg in segments {
                path.push(seg);
            }
        }
        Ok(url)
    }

    async fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SheetsError::Api {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    /// Document metadata: title and worksheet properties.
    #[instrument(level = "debug", skip(self), fields(id = %self.spreadsheet_id))]
    pub async fn load_info(&self) -> Result<SpreadsheetInfo> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties");
        let token = self.tokens.access_token().await?;

        let resp = self
            .http_client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;
        let raw: SpreadsheetRaw = Self::check(resp)
            .await?
            .json()
            .await
            .context("decoding spreadsheet metadata")?;

        Ok(SpreadsheetInfo {
            title: raw.properties.title,
            sheets: raw.sheets.into_iter().map(|s| s.properties).collect(),
        })
    }

    /// Worksheet handle for `title`, or `SheetNotFound`.
    pub fn worksheet(&self, info: &SpreadsheetInfo, title: &str) -> Result<Worksheet, SheetsError> {
        let props = info
            .sheet_by_title(title)
            .ok_or_else(|| SheetsError::SheetNotFound(title.to_string()))?;
        Ok(Worksheet {
            client: self.clone(),
            title: props.title.clone(),
        })
    }
}

/// One tab of the spreadsheet. Row 1 holds headers; data starts at row 2.
#[derive(Clone)]
pub struct Worksheet {
    client: SpreadsheetClient,
    title: String,
}

impl Worksheet {
    pub fn title(&self) -> &str {
        &self.title
    }

    /// `'Title'!<rest>`, with embedded quotes doubled.
    pub fn a1(&self, rest: &str) -> String {
        format!("'{}'!{}", self.title.replace('\'', "''"), rest)
    }
}

#[async_trait]
impl RowStore for Worksheet {
    #[instrument(level = "debug", skip(self), fields(sheet = %self.title))]
    async fn get_rows(&self, limit: usize) -> Result<Vec<SheetRow>> {
        // header row plus `limit` data rows
        let range = self.a1(&format!("1:{}", limit.saturating_add(1)));
        let mut url = self.client.url(&["values", range.as_str()])?;
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        let token = self.client.tokens.access_token().await?;

        let resp = self
            .client
            .http_client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;
        let vr: ValueRange = SpreadsheetClient::check(resp)
            .await?
            .json()
            .await
            .with_context(|| format!("decoding values for {}", range))?;

        let mut lines = vr.values.into_iter();
        let headers = Arc::new(lines.next().unwrap_or_default());
        let rows: Vec<SheetRow> = lines
            .take(limit)
            .enumerate()
            .map(|(i, values)| SheetRow::new(i + 2, Arc::clone(&headers), values))
            .collect();

        debug!(headers = headers.len(), rows = rows.len(), "loaded rows");
        Ok(rows)
    }

    async fn save_row(&self, row: &SheetRow) -> Result<()> {
        let values = row.padded_values();
        let last = column_letters(values.len().saturating_sub(1));
        let range = self.a1(&format!("A{n}:{last}{n}", n = row.row_number()));

        let mut url = self.client.url(&["values", range.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        let token = self.client.tokens.access_token().await?;

        let body = ValueRangeBody {
            range: &range,
            major_dimension: "ROWS",
            values: vec![values],
        };
        let resp = self
            .client
            .http_client
            .put(url.clone())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("PUT {}", url))?;
        SpreadsheetClient::check(resp)
            .await
            .with_context(|| format!("saving row {}", row.row_number()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::StaticToken;

    fn client() -> SpreadsheetClient {
        SpreadsheetClient::new("doc-id", Arc::new(StaticToken("t".into())))
    }

    #[test]
    fn test_url_encodes_range_segment() {
        let url = client().url(&["values", "'Conceptos'!1:1001"]).unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/doc-id/values/"));
        assert!(!url.path().contains(' '));
        assert!(url.path().ends_with("1:1001"));
    }

    #[test]
    fn test_a1_quotes_title() {
        let info = SpreadsheetInfo {
            title: "Doc".into(),
            sheets: vec![SheetProperties {
                title: "Juan's".into(),
            }],
        };
        let ws = client().worksheet(&info, "Juan's").unwrap();
        assert_eq!(ws.a1("A2:D2"), "'Juan''s'!A2:D2");
    }

    #[test]
    fn test_missing_worksheet() {
        let info = SpreadsheetInfo {
            title: "Doc".into(),
            sheets: vec![],
        };
        let err = client().worksheet(&info, "Conceptos").err().unwrap();
        assert_eq!(err.to_string(), "Sheet Conceptos not found");
    }
}
