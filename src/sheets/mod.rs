// src/sheets/mod.rs

pub mod auth;
pub mod client;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use auth::{GoogleTokenSource, StaticToken, TokenSource};
pub use client::{SpreadsheetClient, SpreadsheetInfo, Worksheet};
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Sheet {0} not found")]
    SheetNotFound(String),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("Sheets API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("header {0:?} not present in sheet")]
    MissingHeader(String),
}

/// Ordered rows of one worksheet, with per-row persistence.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Up to `limit` data rows in sheet order (the header row is not a data row).
    async fn get_rows(&self, limit: usize) -> Result<Vec<SheetRow>>;

    /// Write the row's current values back to its sheet position.
    async fn save_row(&self, row: &SheetRow) -> Result<()>;
}

/// Detached view of one sheet row. Mutations stay local until
/// [`RowStore::save_row`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    row_number: usize,
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl SheetRow {
    pub fn new(row_number: usize, headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        Self {
            row_number,
            headers,
            values,
        }
    }

    /// 1-based row number in the sheet; the first data row is 2.
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn column_of(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// `None` if the header is unknown or the cell lies past the row's
    /// returned values; `Some("")` for a blank cell inside the row.
    pub fn get(&self, header: &str) -> Option<&str> {
        let idx = self.column_of(header)?;
        self.values.get(idx).map(String::as_str)
    }

    pub fn set(&mut self, header: &str, value: impl Into<String>) -> Result<(), SheetsError> {
        let idx = self
            .column_of(header)
            .ok_or_else(|| SheetsError::MissingHeader(header.to_string()))?;
        if self.values.len() <= idx {
            self.values.resize(idx + 1, String::new());
        }
        self.values[idx] = value.into();
        Ok(())
    }

    /// Values padded to the header width, as written on save.
    pub fn padded_values(&self) -> Vec<String> {
        let mut out = self.values.clone();
        if out.len() < self.headers.len() {
            out.resize(self.headers.len(), String::new());
        }
        out
    }
}
