use anyhow::{bail, Result};
use async_trait::async_trait;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use super::{RowStore, SheetRow};

/// In-process worksheet. Records every save so callers can assert on
/// exactly what would have been written.
pub struct MemoryStore {
    rows: Mutex<Vec<SheetRow>>,
    saves: Mutex<Vec<SheetRow>>,
    failing_rows: Mutex<HashSet<usize>>,
}

impl MemoryStore {
    /// Rows are numbered from 2, below the header row.
    pub fn new(headers: &[&str], rows: Vec<Vec<&str>>) -> Self {
        let headers = Arc::new(headers.iter().map(|h| h.to_string()).collect::<Vec<_>>());
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, vals)| {
                SheetRow::new(
                    i + 2,
                    Arc::clone(&headers),
                    vals.into_iter().map(String::from).collect(),
                )
            })
            .collect();
        Self {
            rows: Mutex::new(rows),
            saves: Mutex::new(Vec::new()),
            failing_rows: Mutex::new(HashSet::new()),
        }
    }

    /// Make `save_row` fail for the given sheet row number.
    pub fn fail_saves_for(&self, row_number: usize) {
        self.failing_rows.lock().unwrap().insert(row_number);
    }

    /// Every row passed to `save_row`, in call order.
    pub fn saves(&self) -> Vec<SheetRow> {
        self.saves.lock().unwrap().clone()
    }

    /// Current stored state.
    pub fn rows(&self) -> Vec<SheetRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn get_rows(&self, limit: usize) -> Result<Vec<SheetRow>> {
        Ok(self.rows.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn save_row(&self, row: &SheetRow) -> Result<()> {
        if self.failing_rows.lock().unwrap().contains(&row.row_number()) {
            bail!("save rejected for row {}", row.row_number());
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.row_number() == row.row_number()) {
            Some(slot) => *slot = row.clone(),
            None => bail!("row {} does not exist", row.row_number()),
        }
        self.saves.lock().unwrap().push(row.clone());
        Ok(())
    }
}
