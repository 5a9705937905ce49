//! Grid fetching and parsing
//!
//! Turns the raw 2D string grid of a remote table into a header-addressed
//! [`Table`]. Every operation that mutates remote state starts from a fresh
//! read; nothing here is cached across operations.

use std::collections::HashMap;

use log::{debug, warn};

use crate::api::TableStore;

use super::error::{EngineError, EngineResult};
use super::schema::TableSchema;
use super::value::CellValue;

/// Rows below the header start at sheet row 2.
pub const FIRST_DATA_ROW: usize = 2;

/// One logical row: header name to raw string cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw cell value, empty string when the field is absent.
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    /// Lenient numeric read (non-numeric cells count as zero).
    pub fn get_int(&self, field: &str) -> i64 {
        CellValue::parse_int(self.get(field))
    }

    /// Lenient boolean read (case-insensitive "TRUE").
    pub fn get_bool(&self, field: &str) -> bool {
        CellValue::parse_bool(self.get(field))
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }
}

/// An ordered header plus the parsed data rows of one table.
///
/// Invariant: data row `i` (0-based) sits at remote row number `i + 2`; the
/// header occupies row 1. Row order carries no meaning but is preserved so
/// that mapping stays valid.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Row>,
    /// False when the remote grid was completely empty and the headers here
    /// came from the declared schema instead of the wire.
    remote_header: bool,
}

impl Table {
    /// A table with the schema's headers and no data rows.
    pub fn empty(schema: &TableSchema) -> Self {
        Self {
            name: schema.name().to_string(),
            headers: schema.headers().to_vec(),
            rows: Vec::new(),
            remote_header: false,
        }
    }

    /// Parse a raw grid. Header names are trimmed; short data rows are
    /// padded with empty cells and cells beyond the header are dropped.
    pub fn from_grid(name: &str, grid: Vec<Vec<String>>) -> Self {
        let mut iter = grid.into_iter();
        let headers: Vec<String> = iter
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = iter
            .map(|raw| {
                let mut row = Row::new();
                for (i, header) in headers.iter().enumerate() {
                    let cell = raw.get(i).cloned().unwrap_or_default();
                    row.set(header.clone(), cell);
                }
                row
            })
            .collect();

        Self {
            name: name.to_string(),
            headers,
            rows,
            remote_header: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the header row actually exists in the remote grid.
    pub fn has_remote_header(&self) -> bool {
        self.remote_header
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 0-based column position of a header. With duplicate header names the
    /// first occurrence wins (duplicate headers are undefined behavior of
    /// the source data, see the schema contract).
    pub fn col_index(&self, field: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == field)
    }

    /// 1-based sheet column for a header.
    pub fn sheet_col(&self, field: &str) -> Option<usize> {
        self.col_index(field).map(|i| i + 1)
    }

    /// 1-based sheet row number for data row `index`.
    pub fn sheet_row(index: usize) -> usize {
        index + FIRST_DATA_ROW
    }

    /// Data rows whose `field` equals `value`, with their sheet row numbers.
    pub fn rows_where<'a>(
        &'a self,
        field: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = (usize, &'a Row)> {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, row)| row.get(field) == value)
            .map(|(i, row)| (Self::sheet_row(i), row))
    }

    /// Whether any data row carries `value` in `field`.
    pub fn contains_value(&self, field: &str, value: &str) -> bool {
        self.rows.iter().any(|row| row.get(field) == value)
    }
}

/// Fetches and parses table grids.
///
/// `read` treats a missing table as an error; `read_or_create` seeds a
/// missing table with the schema's header row first. Which one applies is
/// the caller's policy, not the reader's.
pub struct GridReader<'a> {
    store: &'a dyn TableStore,
}

impl<'a> GridReader<'a> {
    pub fn new(store: &'a dyn TableStore) -> Self {
        Self { store }
    }

    /// Fetch the current grid. An existing-but-empty grid parses to a table
    /// with the schema's headers and no rows.
    pub async fn read(&self, schema: &TableSchema) -> EngineResult<Table> {
        let grid = self
            .store
            .get_all_values(schema.name())
            .await
            .map_err(|e| EngineError::from_fetch(schema.name(), e))?;

        if grid.is_empty() {
            debug!("table '{}' is empty", schema.name());
            return Ok(Table::empty(schema));
        }

        let table = Table::from_grid(schema.name(), grid);
        if table.headers() != schema.headers() {
            warn!(
                "table '{}' header differs from declared schema (found {} column(s), declared {})",
                schema.name(),
                table.headers().len(),
                schema.headers().len()
            );
        }
        debug!(
            "read {} data row(s) from '{}'",
            table.rows().len(),
            schema.name()
        );
        Ok(table)
    }

    /// Fetch the current grid, creating the table with the schema's header
    /// row when it does not exist, and seeding the header row when the table
    /// exists but is completely empty.
    pub async fn read_or_create(&self, schema: &TableSchema) -> EngineResult<Table> {
        match self.read(schema).await {
            Err(EngineError::TableMissing(_)) => {
                debug!(
                    "table '{}' missing, creating with declared header",
                    schema.name()
                );
                self.store
                    .create_table(schema.name(), schema.headers())
                    .await
                    .map_err(EngineError::Transport)?;
                Ok(Table::empty(schema))
            }
            Ok(table) if !table.has_remote_header() => {
                debug!("table '{}' has no header row, seeding one", schema.name());
                self.store
                    .append_row(schema.name(), schema.headers().to_vec())
                    .await
                    .map_err(EngineError::Transport)?;
                Ok(table)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::api::memory::raw_row;

    fn schema() -> TableSchema {
        TableSchema::new("T", ["Username", "Qtd"], ["Username"])
    }

    #[tokio::test]
    async fn parses_header_and_rows() {
        let store = MemoryStore::new().with_table(
            "T",
            vec![
                raw_row(["  Username ", "Qtd"]),
                raw_row(["ana", "3"]),
                raw_row(["bia"]),
            ],
        );

        let table = GridReader::new(&store).read(&schema()).await.unwrap();

        assert_eq!(table.headers(), ["Username", "Qtd"]);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].get("Username"), "ana");
        assert_eq!(table.rows()[0].get_int("Qtd"), 3);
        // Short row padded with an empty cell.
        assert_eq!(table.rows()[1].get("Qtd"), "");
    }

    #[tokio::test]
    async fn empty_grid_yields_schema_headers() {
        let store = MemoryStore::new().with_table("T", vec![]);
        let table = GridReader::new(&store).read(&schema()).await.unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers(), ["Username", "Qtd"]);
    }

    #[tokio::test]
    async fn missing_table_fails_plain_read() {
        let store = MemoryStore::new();
        let err = GridReader::new(&store).read(&schema()).await.unwrap_err();
        assert!(matches!(err, EngineError::TableMissing(_)));
    }

    #[tokio::test]
    async fn read_or_create_seeds_the_header() {
        let store = MemoryStore::new();
        let table = GridReader::new(&store)
            .read_or_create(&schema())
            .await
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(
            store.snapshot("T").unwrap(),
            vec![raw_row(["Username", "Qtd"])]
        );
    }

    #[tokio::test]
    async fn read_or_create_backfills_header_on_empty_grid() {
        let store = MemoryStore::new().with_table("T", vec![]);
        let table = GridReader::new(&store)
            .read_or_create(&schema())
            .await
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(
            store.snapshot("T").unwrap(),
            vec![raw_row(["Username", "Qtd"])]
        );
    }

    #[test]
    fn sheet_row_offsets_past_the_header() {
        assert_eq!(Table::sheet_row(0), 2);
        assert_eq!(Table::sheet_row(4), 6);
    }
}
