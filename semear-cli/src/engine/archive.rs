//! Periodic archive rollover
//!
//! Moves a period's accumulated per-category totals into a history table,
//! then zeroes the tracked day cells in the source. The two phases are two
//! independent remote calls (the store has no transactions), so the
//! ordering is the only safety there is: snapshot first, and no reset
//! unless the snapshot landed.

use log::{debug, info};

use crate::api::{CellWrite, TableStore};

use super::error::{EngineError, EngineResult, RollPhase};
use super::grid::Table;
use super::schema::TableSchema;

/// Parameters of one rollover.
pub struct RollRequest<'a> {
    /// Schema of the table holding the period's accumulated values.
    pub source: &'a TableSchema,
    /// Schema of the append-only history table. Must declare exactly four
    /// columns: entity, period label, category, aggregated value.
    pub history: &'a TableSchema,
    /// The entity whose rows are rolled.
    pub entity_key: &'a str,
    /// Label stamped on every archive record (e.g. "Semana 04/08/2026").
    pub period_label: &'a str,
    /// Fields summed per row and zeroed afterwards.
    pub day_fields: &'a [&'a str],
    /// Field naming the category a row accumulates for.
    pub category_field: &'a str,
}

/// Counts from a completed roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollReport {
    /// Categories with a non-zero total, i.e. history rows appended.
    pub archived_categories: usize,
    /// Day cells zeroed in the source table.
    pub reset_cells: usize,
}

pub struct ArchiveRoller<'a> {
    store: &'a dyn TableStore,
}

impl<'a> ArchiveRoller<'a> {
    pub fn new(store: &'a dyn TableStore) -> Self {
        Self { store }
    }

    /// Run the two-phase rollover for one entity against a fresh snapshot.
    ///
    /// Phase 1 sums `day_fields` per row and appends one history record per
    /// category whose total is strictly positive. Phase 2 zeroes the day
    /// cells of every one of the entity's rows. If phase 1 fails nothing has
    /// been lost and phase 2 never runs. If phase 2 fails, history is
    /// recorded but the source still holds the counts; rolling again before
    /// the source is repaired would double-count, which is the documented
    /// hazard of the non-transactional store.
    pub async fn roll(&self, table: &Table, request: &RollRequest<'_>) -> EngineResult<RollReport> {
        if request.history.headers().len() != 4 {
            return Err(EngineError::Validation(format!(
                "history table '{}' must have 4 columns, has {}",
                request.history.name(),
                request.history.headers().len()
            )));
        }

        let entity_field = request.source.entity_field();
        let mut history_rows: Vec<Vec<String>> = Vec::new();
        let mut reset_batch: Vec<CellWrite> = Vec::new();

        for (row_number, row) in table.rows_where(entity_field, request.entity_key) {
            let total: i64 = request
                .day_fields
                .iter()
                .map(|field| row.get_int(field))
                .sum();
            let category = row.get(request.category_field);

            if total > 0 {
                debug!(
                    "archiving {}={} for '{}' ({})",
                    category, total, request.entity_key, request.period_label
                );
                history_rows.push(vec![
                    request.entity_key.to_string(),
                    request.period_label.to_string(),
                    category.to_string(),
                    total.to_string(),
                ]);
            }

            for field in request.day_fields {
                if let Some(col) = table.sheet_col(field) {
                    reset_batch.push(CellWrite::new(row_number, col, "0"));
                }
            }
        }

        // Phase 1: snapshot. Must land before any reset write goes out.
        let archived_categories = history_rows.len();
        if !history_rows.is_empty() {
            self.store
                .append_rows(request.history.name(), &history_rows)
                .await
                .map_err(|source| EngineError::Roll {
                    phase: RollPhase::Snapshot,
                    entity: request.entity_key.to_string(),
                    source: Box::new(EngineError::Transport(source)),
                })?;
        }

        // Phase 2: reset. From here on a failure leaves the documented
        // inconsistency window: history written, source not zeroed.
        let reset_cells = reset_batch.len();
        if !reset_batch.is_empty() {
            self.store
                .update_cells(request.source.name(), &reset_batch)
                .await
                .map_err(|source| EngineError::Roll {
                    phase: RollPhase::Reset,
                    entity: request.entity_key.to_string(),
                    source: Box::new(EngineError::PartialWrite {
                        table: request.source.name().to_string(),
                        cells: reset_cells,
                        source,
                    }),
                })?;
        }

        info!(
            "rolled '{}' into '{}' as '{}': {} category record(s), {} cell(s) reset",
            request.entity_key,
            request.history.name(),
            request.period_label,
            archived_categories,
            reset_cells
        );
        Ok(RollReport {
            archived_categories,
            reset_cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::api::memory::raw_row;
    use crate::api::{MemoryStore, StoreError, StoreResult};
    use crate::engine::grid::GridReader;

    const DAYS: [&str; 7] = [
        "Segunda", "Terca", "Quarta", "Quinta", "Sexta", "Sabado", "Domingo",
    ];

    fn source_schema() -> TableSchema {
        let mut headers = vec!["Username", "Materia"];
        headers.extend(DAYS);
        TableSchema::new("QUESTOES_DIARIAS", headers, vec!["Username", "Materia"])
    }

    fn history_schema() -> TableSchema {
        TableSchema::new(
            "QUESTOES_HISTORICO",
            ["Username", "Semana", "Materia", "Qtd"],
            ["Username"],
        )
    }

    fn seeded_store() -> MemoryStore {
        MemoryStore::new()
            .with_table(
                "QUESTOES_DIARIAS",
                vec![
                    raw_row([
                        "Username", "Materia", "Segunda", "Terca", "Quarta", "Quinta", "Sexta",
                        "Sabado", "Domingo",
                    ]),
                    raw_row(["ana", "Matematica", "2", "0", "3", "0", "0", "5", "0"]),
                    raw_row(["ana", "Fisica", "1", "1", "1", "1", "1", "0", "0"]),
                    raw_row(["ana", "Quimica", "0", "0", "0", "0", "0", "0", "0"]),
                    raw_row(["bia", "Matematica", "9", "9", "9", "9", "9", "9", "9"]),
                ],
            )
            .with_table(
                "QUESTOES_HISTORICO",
                vec![raw_row(["Username", "Semana", "Materia", "Qtd"])],
            )
    }

    fn request<'a>(source: &'a TableSchema, history: &'a TableSchema) -> RollRequest<'a> {
        RollRequest {
            source,
            history,
            entity_key: "ana",
            period_label: "Semana 04/08/2026",
            day_fields: &DAYS,
            category_field: "Materia",
        }
    }

    #[tokio::test]
    async fn rolls_totals_into_history_and_zeroes_source() {
        let store = seeded_store();
        let source = source_schema();
        let history = history_schema();
        let table = GridReader::new(&store).read(&source).await.unwrap();

        let report = ArchiveRoller::new(&store)
            .roll(&table, &request(&source, &history))
            .await
            .unwrap();

        // Matematica (10) and Fisica (5) archived; all-zero Quimica skipped.
        assert_eq!(report.archived_categories, 2);
        // All three of ana's rows get their 7 day cells zeroed.
        assert_eq!(report.reset_cells, 21);

        let hist = store.snapshot("QUESTOES_HISTORICO").unwrap();
        assert_eq!(
            hist[1],
            raw_row(["ana", "Semana 04/08/2026", "Matematica", "10"])
        );
        assert_eq!(hist[2], raw_row(["ana", "Semana 04/08/2026", "Fisica", "5"]));

        let source_grid = store.snapshot("QUESTOES_DIARIAS").unwrap();
        for row in &source_grid[1..=3] {
            assert!(row[2..].iter().all(|c| c == "0"));
        }
        // Another student's counts are untouched.
        assert_eq!(source_grid[4][2], "9");
    }

    #[tokio::test]
    async fn nothing_to_archive_still_resets() {
        let store = seeded_store();
        let source = source_schema();
        let history = history_schema();
        let table = GridReader::new(&store).read(&source).await.unwrap();

        let mut req = request(&source, &history);
        req.entity_key = "ana";
        // Roll once to zero everything, then roll again.
        ArchiveRoller::new(&store).roll(&table, &req).await.unwrap();
        let table = GridReader::new(&store).read(&source).await.unwrap();
        let report = ArchiveRoller::new(&store).roll(&table, &req).await.unwrap();

        assert_eq!(report.archived_categories, 0);
        assert_eq!(report.reset_cells, 21);
        // No empty-total records were appended on the second roll.
        assert_eq!(store.snapshot("QUESTOES_HISTORICO").unwrap().len(), 3);
    }

    /// Store whose appends always fail, for forcing a snapshot-phase error.
    struct AppendFails(MemoryStore);

    #[async_trait]
    impl crate::api::TableStore for AppendFails {
        async fn get_all_values(&self, table: &str) -> StoreResult<Vec<Vec<String>>> {
            self.0.get_all_values(table).await
        }
        async fn append_rows(&self, _table: &str, _rows: &[Vec<String>]) -> StoreResult<()> {
            Err(StoreError::Api {
                status: 500,
                message: "backend unavailable".to_string(),
            })
        }
        async fn update_cells(&self, table: &str, cells: &[CellWrite]) -> StoreResult<()> {
            self.0.update_cells(table, cells).await
        }
        async fn delete_row(&self, table: &str, row: usize) -> StoreResult<()> {
            self.0.delete_row(table, row).await
        }
        async fn create_table(&self, table: &str, header: &[String]) -> StoreResult<()> {
            self.0.create_table(table, header).await
        }
    }

    #[tokio::test]
    async fn failed_snapshot_leaves_source_untouched() {
        let store = AppendFails(seeded_store());
        let source = source_schema();
        let history = history_schema();
        let table = GridReader::new(&store).read(&source).await.unwrap();

        let err = ArchiveRoller::new(&store)
            .roll(&table, &request(&source, &history))
            .await
            .unwrap_err();

        match err {
            EngineError::Roll { phase, entity, .. } => {
                assert_eq!(phase, RollPhase::Snapshot);
                assert_eq!(entity, "ana");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Reset never ran: the source still holds the week's counts.
        let grid = store.0.snapshot("QUESTOES_DIARIAS").unwrap();
        assert_eq!(grid[1], raw_row(["ana", "Matematica", "2", "0", "3", "0", "0", "5", "0"]));
        assert_eq!(store.0.snapshot("QUESTOES_HISTORICO").unwrap().len(), 1);
    }
}
