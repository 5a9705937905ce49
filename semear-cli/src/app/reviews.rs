//! Spaced-repetition reviews (REVISOES)
//!
//! Append-only entries scheduling a review of one subject on one date, with
//! the review cadence and how many questions it covered.

use log::debug;

use crate::api::TableStore;
use crate::engine::{
    CellDiffWriter, ChangeSet, EngineError, EngineResult, GridReader, KeyedRowIndex, NaturalKey,
    WriteReport,
};

use super::context::SessionContext;
use super::tables;

/// Review cadences the sheet recognizes.
pub const REVIEW_KINDS: [&str; 4] = ["Semanal", "Quinzenal", "Mensal", "Trimestral"];

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    pub data: String,
    pub tipo: String,
    pub materia: String,
    pub questoes: i64,
}

/// All of the student's scheduled reviews, in sheet order.
pub async fn list(store: &dyn TableStore, ctx: &SessionContext) -> EngineResult<Vec<ReviewEntry>> {
    let schema = tables::reviews();
    let table = GridReader::new(store).read_or_create(&schema).await?;

    let entries: Vec<ReviewEntry> = table
        .rows_where(schema.entity_field(), ctx.student())
        .map(|(_, row)| ReviewEntry {
            data: row.get("Data").to_string(),
            tipo: row.get("Tipo_Revisao").to_string(),
            materia: row.get("Materia").to_string(),
            questoes: row.get_int("Qtd_Questoes"),
        })
        .collect();
    debug!("loaded {} review(s) for '{}'", entries.len(), ctx.student());
    Ok(entries)
}

/// Append a new review entry.
pub async fn add(
    store: &dyn TableStore,
    ctx: &SessionContext,
    entry: &ReviewEntry,
) -> EngineResult<()> {
    if !REVIEW_KINDS.contains(&entry.tipo.as_str()) {
        return Err(EngineError::Validation(format!(
            "'{}' is not a review cadence (expected one of {})",
            entry.tipo,
            REVIEW_KINDS.join(", ")
        )));
    }
    let schema = tables::reviews();
    GridReader::new(store).read_or_create(&schema).await?;
    store
        .append_row(
            schema.name(),
            vec![
                ctx.student().to_string(),
                entry.data.clone(),
                entry.tipo.clone(),
                entry.materia.clone(),
                entry.questoes.to_string(),
            ],
        )
        .await
        .map_err(EngineError::Transport)
}

/// Update the cadence and question count of an existing entry.
pub async fn update(
    store: &dyn TableStore,
    ctx: &SessionContext,
    entry: &ReviewEntry,
) -> EngineResult<WriteReport> {
    let schema = tables::reviews();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Data", "Materia"]);

    let key = NaturalKey::new([ctx.student(), &entry.data, &entry.materia]);
    let mut changes = ChangeSet::new();
    changes.set(key.clone(), "Tipo_Revisao", entry.tipo.as_str());
    changes.set(key.clone(), "Qtd_Questoes", entry.questoes);

    let report = CellDiffWriter::new(store)
        .write(&table, &index, &changes, &["Tipo_Revisao", "Qtd_Questoes"])
        .await?;
    if !report.unresolved.is_empty() {
        return Err(EngineError::RowNotFound {
            table: schema.name().to_string(),
            key,
        });
    }
    Ok(report)
}

/// Delete a review entry by key.
pub async fn remove(
    store: &dyn TableStore,
    ctx: &SessionContext,
    data: &str,
    materia: &str,
) -> EngineResult<()> {
    let schema = tables::reviews();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Data", "Materia"]);

    let key = NaturalKey::new([ctx.student(), data, materia]);
    let row = index.lookup(&key).ok_or_else(|| EngineError::RowNotFound {
        table: schema.name().to_string(),
        key: key.clone(),
    })?;
    store
        .delete_row(schema.name(), row)
        .await
        .map_err(EngineError::Transport)
}
