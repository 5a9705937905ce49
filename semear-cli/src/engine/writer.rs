//! Diff-based batch cell writes
//!
//! Converts an edited in-memory table into one batch of cell writes. The
//! writer rewrites every tracked field of every touched row unconditionally
//! rather than comparing old and new values: the cost is bandwidth, the
//! payoff is no second read and no stale-comparison edge cases.

use log::{debug, info};

use crate::api::{CellWrite, TableStore};

use super::error::{EngineError, EngineResult};
use super::grid::Table;
use super::index::{KeyedRowIndex, NaturalKey};
use super::value::CellValue;

/// Pending field edits keyed by natural key. Entry order is preserved and
/// becomes the order of the emitted cell writes.
#[derive(Debug, Default)]
pub struct ChangeSet {
    entries: Vec<(NaturalKey, Vec<(String, CellValue)>)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new value for one field of the row identified by `key`.
    /// Setting the same field twice keeps the latest value.
    pub fn set(&mut self, key: NaturalKey, field: impl Into<String>, value: impl Into<CellValue>) {
        let field = field.into();
        let value = value.into();
        let entry_idx = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                self.entries.push((key, Vec::new()));
                self.entries.len() - 1
            }
        };
        let fields = &mut self.entries[entry_idx].1;
        match fields.iter().position(|(f, _)| *f == field) {
            Some(i) => fields[i].1 = value,
            None => fields.push((field, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&NaturalKey, &[(String, CellValue)])> {
        self.entries.iter().map(|(k, f)| (k, f.as_slice()))
    }
}

/// Outcome of one batch write.
#[derive(Debug, Default)]
pub struct WriteReport {
    /// Rows that resolved to a sheet row and had cells submitted.
    pub rows_written: usize,
    /// Cell instructions submitted in the batch.
    pub cells_written: usize,
    /// Keys with no matching row. Skipped, not fatal: whether an unresolved
    /// edit is an error is the caller's decision.
    pub unresolved: Vec<NaturalKey>,
}

pub struct CellDiffWriter<'a> {
    store: &'a dyn TableStore,
}

impl<'a> CellDiffWriter<'a> {
    pub fn new(store: &'a dyn TableStore) -> Self {
        Self { store }
    }

    /// Resolve every change against `index` and submit one batch of cell
    /// writes covering each tracked field of each resolved row.
    ///
    /// The batch is a single remote call. If the call fails, how many of its
    /// cells the store applied is unknowable from here; the resulting
    /// `PartialWrite` error says what was submitted and leaves state as the
    /// remote service left it.
    pub async fn write(
        &self,
        table: &Table,
        index: &KeyedRowIndex,
        changes: &ChangeSet,
        tracked_fields: &[&str],
    ) -> EngineResult<WriteReport> {
        let mut report = WriteReport::default();
        let mut batch: Vec<CellWrite> = Vec::new();

        for (key, fields) in changes.entries() {
            let Some(row_number) = index.lookup(key) else {
                debug!(
                    "no row in '{}' for key {}, skipping its edits",
                    table.name(),
                    key
                );
                report.unresolved.push(key.clone());
                continue;
            };

            let before = batch.len();
            for tracked in tracked_fields {
                let Some(col) = table.sheet_col(tracked) else {
                    continue;
                };
                let Some((_, value)) = fields.iter().find(|(f, _)| f == tracked) else {
                    continue;
                };
                batch.push(CellWrite::new(row_number, col, value.to_wire()));
            }
            report.cells_written += batch.len() - before;
            report.rows_written += 1;
        }

        if !batch.is_empty() {
            let submitted = batch.len();
            self.store
                .update_cells(table.name(), &batch)
                .await
                .map_err(|source| EngineError::PartialWrite {
                    table: table.name().to_string(),
                    cells: submitted,
                    source,
                })?;
        }

        info!(
            "write to '{}' complete: {} row(s), {} cell(s), {} unresolved",
            table.name(),
            report.rows_written,
            report.cells_written,
            report.unresolved.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::api::memory::raw_row;
    use crate::engine::grid::GridReader;
    use crate::engine::schema::TableSchema;

    fn schema() -> TableSchema {
        TableSchema::new(
            "T",
            ["Username", "Materia", "Seg", "Ter"],
            ["Username", "Materia"],
        )
    }

    fn seeded_store() -> MemoryStore {
        MemoryStore::new().with_table(
            "T",
            vec![
                raw_row(["Username", "Materia", "Seg", "Ter"]),
                raw_row(["ana", "Fisica", "1", "2"]),
                raw_row(["ana", "Quimica", "0", "0"]),
            ],
        )
    }

    #[tokio::test]
    async fn writes_every_tracked_field_of_every_touched_row() {
        let store = seeded_store();
        let schema = schema();
        let table = GridReader::new(&store).read(&schema).await.unwrap();
        let index = KeyedRowIndex::build(&table, &["Username", "Materia"]);

        let mut changes = ChangeSet::new();
        // "Seg" keeps its current value; it must still be rewritten.
        changes.set(NaturalKey::new(["ana", "Fisica"]), "Seg", 1i64);
        changes.set(NaturalKey::new(["ana", "Fisica"]), "Ter", 5i64);
        changes.set(NaturalKey::new(["ana", "Quimica"]), "Seg", 3i64);
        changes.set(NaturalKey::new(["ana", "Quimica"]), "Ter", 4i64);

        let report = CellDiffWriter::new(&store)
            .write(&table, &index, &changes, &["Seg", "Ter"])
            .await
            .unwrap();

        // 2 rows x 2 tracked fields, no diffing against current values.
        assert_eq!(report.rows_written, 2);
        assert_eq!(report.cells_written, 4);
        assert!(report.unresolved.is_empty());

        let grid = store.snapshot("T").unwrap();
        assert_eq!(grid[1], raw_row(["ana", "Fisica", "1", "5"]));
        assert_eq!(grid[2], raw_row(["ana", "Quimica", "3", "4"]));
    }

    #[tokio::test]
    async fn unresolved_keys_are_reported_not_raised() {
        let store = seeded_store();
        let schema = schema();
        let table = GridReader::new(&store).read(&schema).await.unwrap();
        let index = KeyedRowIndex::build(&table, &["Username", "Materia"]);

        let mut changes = ChangeSet::new();
        changes.set(NaturalKey::new(["bia", "Fisica"]), "Seg", 9i64);

        let report = CellDiffWriter::new(&store)
            .write(&table, &index, &changes, &["Seg", "Ter"])
            .await
            .unwrap();

        assert_eq!(report.rows_written, 0);
        assert_eq!(report.cells_written, 0);
        assert_eq!(report.unresolved, vec![NaturalKey::new(["bia", "Fisica"])]);
        // Nothing was submitted, nothing changed.
        assert_eq!(store.snapshot("T").unwrap()[1][2], "1");
    }

    #[tokio::test]
    async fn untracked_and_unknown_fields_emit_nothing() {
        let store = seeded_store();
        let schema = schema();
        let table = GridReader::new(&store).read(&schema).await.unwrap();
        let index = KeyedRowIndex::build(&table, &["Username", "Materia"]);

        let mut changes = ChangeSet::new();
        changes.set(NaturalKey::new(["ana", "Fisica"]), "Seg", 7i64);
        changes.set(NaturalKey::new(["ana", "Fisica"]), "Materia", "Hacked");
        changes.set(NaturalKey::new(["ana", "Fisica"]), "Inexistente", 1i64);

        let report = CellDiffWriter::new(&store)
            .write(&table, &index, &changes, &["Seg", "Inexistente"])
            .await
            .unwrap();

        // "Materia" is not tracked; "Inexistente" is tracked but not a header.
        assert_eq!(report.cells_written, 1);
        let grid = store.snapshot("T").unwrap();
        assert_eq!(grid[1], raw_row(["ana", "Fisica", "7", "2"]));
    }

    #[tokio::test]
    async fn booleans_land_in_canonical_form() {
        let store = MemoryStore::new().with_table(
            "T",
            vec![
                raw_row(["Username", "Materia", "Seg", "Ter"]),
                raw_row(["ana", "Fisica", "", ""]),
            ],
        );
        let schema = schema();
        let table = GridReader::new(&store).read(&schema).await.unwrap();
        let index = KeyedRowIndex::build(&table, &["Username", "Materia"]);

        let mut changes = ChangeSet::new();
        changes.set(NaturalKey::new(["ana", "Fisica"]), "Seg", true);
        changes.set(NaturalKey::new(["ana", "Fisica"]), "Ter", false);

        CellDiffWriter::new(&store)
            .write(&table, &index, &changes, &["Seg", "Ter"])
            .await
            .unwrap();

        let grid = store.snapshot("T").unwrap();
        assert_eq!(grid[1], raw_row(["ana", "Fisica", "TRUE", "FALSE"]));
    }
}
