//! In-memory store backend
//!
//! Behaves like the remote spreadsheet down to 1-based addressing and
//! grow-on-write cells. Used by the test suite and for offline
//! experimentation; it is deliberately unforgiving about missing tables so
//! callers exercise the same error paths as against the real backend.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::{StoreError, StoreResult};
use super::store::{CellWrite, TableStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<BTreeMap<String, Vec<Vec<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with raw rows (first row is the header).
    pub fn with_table(self, name: &str, rows: Vec<Vec<String>>) -> Self {
        self.tables.lock().unwrap().insert(name.to_string(), rows);
        self
    }

    /// Copy of a table's current raw grid, if the table exists.
    pub fn snapshot(&self, name: &str) -> Option<Vec<Vec<String>>> {
        self.tables.lock().unwrap().get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.lock().unwrap().keys().cloned().collect()
    }
}

/// Convenience for building raw grids in tests and seeds.
pub fn raw_row<I, S>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    cells.into_iter().map(Into::into).collect()
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn get_all_values(&self, table: &str) -> StoreResult<Vec<Vec<String>>> {
        let tables = self.tables.lock().unwrap();
        tables
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn append_rows(&self, table: &str, rows: &[Vec<String>]) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let grid = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        grid.extend(rows.iter().cloned());
        Ok(())
    }

    async fn update_cells(&self, table: &str, cells: &[CellWrite]) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let grid = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        for cell in cells {
            if cell.row == 0 || cell.col == 0 {
                return Err(StoreError::InvalidRequest(format!(
                    "cell addresses are 1-based, got ({}, {})",
                    cell.row, cell.col
                )));
            }
            // The spreadsheet grows to fit any addressed cell.
            if grid.len() < cell.row {
                grid.resize(cell.row, Vec::new());
            }
            let row = &mut grid[cell.row - 1];
            if row.len() < cell.col {
                row.resize(cell.col, String::new());
            }
            row[cell.col - 1] = cell.value.clone();
        }
        Ok(())
    }

    async fn delete_row(&self, table: &str, row: usize) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let grid = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        if row == 0 || row > grid.len() {
            return Err(StoreError::InvalidRequest(format!(
                "row {} out of range for table '{}' with {} rows",
                row,
                table,
                grid.len()
            )));
        }
        grid.remove(row - 1);
        Ok(())
    }

    async fn create_table(&self, table: &str, header: &[String]) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(table) {
            return Err(StoreError::InvalidRequest(format!(
                "table '{}' already exists",
                table
            )));
        }
        tables.insert(table.to_string(), vec![header.to_vec()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_table_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_all_values("NOPE").await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn update_grows_the_grid() {
        let store = MemoryStore::new().with_table("T", vec![raw_row(["A", "B"])]);

        store
            .update_cells("T", &[CellWrite::new(3, 2, "x")])
            .await
            .unwrap();

        let grid = store.snapshot("T").unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[2], vec!["".to_string(), "x".to_string()]);
    }

    #[tokio::test]
    async fn delete_shifts_rows_up() {
        let store = MemoryStore::new().with_table(
            "T",
            vec![raw_row(["H"]), raw_row(["one"]), raw_row(["two"])],
        );

        store.delete_row("T", 2).await.unwrap();

        let grid = store.snapshot("T").unwrap();
        assert_eq!(grid, vec![raw_row(["H"]), raw_row(["two"])]);
    }

    #[tokio::test]
    async fn create_refuses_duplicates() {
        let store = MemoryStore::new();
        store.create_table("T", &[String::from("A")]).await.unwrap();
        let err = store
            .create_table("T", &[String::from("A")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }
}
