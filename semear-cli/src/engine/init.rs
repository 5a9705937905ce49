//! Idempotent baseline seeding for entities
//!
//! New entities (students) get a full baseline row-set in each table the
//! first time a workflow touches them: one row per hour template, one per
//! baseline subject, a clone of the template block. Seeding keys off a
//! single membership check, so re-running it against a fresh snapshot is a
//! no-op.

use log::{info, warn};

use crate::api::TableStore;

use super::error::{EngineError, EngineResult};
use super::grid::Table;
use super::schema::TableSchema;

/// Produces the baseline rows for an entity absent from a table.
///
/// Rows are raw wire rows in header order. The current table snapshot is
/// available for providers that derive the baseline from existing data
/// (e.g. cloning template rows).
pub trait SeedRowsProvider: Send + Sync {
    fn seed_rows(&self, entity_key: &str, table: &Table) -> Vec<Vec<String>>;
}

impl<F> SeedRowsProvider for F
where
    F: Fn(&str, &Table) -> Vec<Vec<String>> + Send + Sync,
{
    fn seed_rows(&self, entity_key: &str, table: &Table) -> Vec<Vec<String>> {
        self(entity_key, table)
    }
}

pub struct UpsertInitializer<'a> {
    store: &'a dyn TableStore,
}

impl<'a> UpsertInitializer<'a> {
    pub fn new(store: &'a dyn TableStore) -> Self {
        Self { store }
    }

    /// Seed `entity_key`'s baseline rows if the table has none for it.
    /// Returns true when rows were appended.
    ///
    /// After a true return the caller MUST re-read the grid before any
    /// diff-write: row numbers computed against the pre-seed snapshot are
    /// invalid once the append lands.
    ///
    /// The append is one batch call. If it fails, the entity may be left
    /// with part of its baseline; the error says so, and a later call will
    /// see the entity as present and not re-seed. Repairing a partial
    /// baseline is an operator action, not something the engine retries.
    pub async fn ensure_initialized(
        &self,
        table: &Table,
        schema: &TableSchema,
        entity_key: &str,
        provider: &dyn SeedRowsProvider,
    ) -> EngineResult<bool> {
        let entity_field = schema.entity_field();
        if table.contains_value(entity_field, entity_key) {
            return Ok(false);
        }

        let rows = provider.seed_rows(entity_key, table);
        if rows.is_empty() {
            warn!(
                "no baseline rows produced for '{}' in table '{}', nothing seeded",
                entity_key,
                schema.name()
            );
            return Ok(false);
        }

        let width = schema.headers().len();
        let entity_col = table
            .col_index(entity_field)
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "table '{}' has no '{}' column",
                    schema.name(),
                    entity_field
                ))
            })?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(EngineError::Validation(format!(
                    "baseline row {} for '{}' has {} cell(s), table '{}' has {} column(s)",
                    i,
                    entity_key,
                    row.len(),
                    schema.name(),
                    width
                )));
            }
            if row[entity_col] != entity_key {
                return Err(EngineError::Validation(format!(
                    "baseline row {} for '{}' carries '{}' in its {} column",
                    i, entity_key, row[entity_col], entity_field
                )));
            }
        }

        let count = rows.len();
        self.store
            .append_rows(schema.name(), &rows)
            .await
            .map_err(|source| EngineError::IncompleteInit {
                table: schema.name().to_string(),
                entity: entity_key.to_string(),
                source,
            })?;

        info!(
            "seeded {} baseline row(s) for '{}' in table '{}'",
            count,
            entity_key,
            schema.name()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::api::memory::raw_row;
    use crate::engine::grid::GridReader;

    fn schema() -> TableSchema {
        TableSchema::new("T", ["Username", "Materia", "Qtd"], ["Username", "Materia"])
    }

    fn subjects_provider(entity: &str, _table: &Table) -> Vec<Vec<String>> {
        ["Fisica", "Quimica"]
            .iter()
            .map(|m| raw_row([entity, m, "0"]))
            .collect()
    }

    #[tokio::test]
    async fn seeds_absent_entity_once() {
        let store =
            MemoryStore::new().with_table("T", vec![raw_row(["Username", "Materia", "Qtd"])]);
        let reader = GridReader::new(&store);
        let init = UpsertInitializer::new(&store);
        let schema = schema();

        let table = reader.read(&schema).await.unwrap();
        let seeded = init
            .ensure_initialized(&table, &schema, "ana", &subjects_provider)
            .await
            .unwrap();
        assert!(seeded);

        // Mandatory re-read after a true init, then the second call no-ops.
        let table = reader.read(&schema).await.unwrap();
        let seeded = init
            .ensure_initialized(&table, &schema, "ana", &subjects_provider)
            .await
            .unwrap();
        assert!(!seeded);

        let grid = store.snapshot("T").unwrap();
        assert_eq!(grid.len(), 3); // header + exactly one baseline, not two
    }

    #[tokio::test]
    async fn present_entity_is_untouched() {
        let store = MemoryStore::new().with_table(
            "T",
            vec![
                raw_row(["Username", "Materia", "Qtd"]),
                raw_row(["ana", "Fisica", "7"]),
            ],
        );
        let schema = schema();
        let table = GridReader::new(&store).read(&schema).await.unwrap();

        let seeded = UpsertInitializer::new(&store)
            .ensure_initialized(&table, &schema, "ana", &subjects_provider)
            .await
            .unwrap();

        assert!(!seeded);
        assert_eq!(store.snapshot("T").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejects_misshapen_baseline_rows() {
        let store =
            MemoryStore::new().with_table("T", vec![raw_row(["Username", "Materia", "Qtd"])]);
        let schema = schema();
        let table = GridReader::new(&store).read(&schema).await.unwrap();

        let short_rows = |entity: &str, _table: &Table| vec![raw_row([entity])];
        let err = UpsertInitializer::new(&store)
            .ensure_initialized(&table, &schema, "ana", &short_rows)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn empty_baseline_seeds_nothing() {
        let store =
            MemoryStore::new().with_table("T", vec![raw_row(["Username", "Materia", "Qtd"])]);
        let schema = schema();
        let table = GridReader::new(&store).read(&schema).await.unwrap();

        let empty = |_: &str, _: &Table| Vec::<Vec<String>>::new();
        let seeded = UpsertInitializer::new(&store)
            .ensure_initialized(&table, &schema, "ana", &empty)
            .await
            .unwrap();

        assert!(!seeded);
        assert_eq!(store.snapshot("T").unwrap().len(), 1);
    }
}
