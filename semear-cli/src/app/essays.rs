//! Essay scores (REDACOES)
//!
//! One row per essay theme per student, scored across the five competencies
//! with the final grade stored as their sum.

use log::debug;

use crate::api::TableStore;
use crate::engine::{
    CellDiffWriter, ChangeSet, EngineError, EngineResult, GridReader, KeyedRowIndex, NaturalKey,
    WriteReport,
};

use super::context::SessionContext;
use super::tables;

/// The competency columns, in sheet order.
pub const COMPETENCY_FIELDS: [&str; 5] = ["C1", "C2", "C3", "C4", "C5"];

#[derive(Debug, Clone, PartialEq)]
pub struct Essay {
    pub tema: String,
    /// Scores aligned with [`COMPETENCY_FIELDS`].
    pub competencias: [i64; 5],
}

impl Essay {
    pub fn nota_final(&self) -> i64 {
        self.competencias.iter().sum()
    }
}

/// All of the student's essays, in sheet order.
pub async fn list(store: &dyn TableStore, ctx: &SessionContext) -> EngineResult<Vec<Essay>> {
    let schema = tables::essays();
    let table = GridReader::new(store).read_or_create(&schema).await?;

    let essays: Vec<Essay> = table
        .rows_where(schema.entity_field(), ctx.student())
        .map(|(_, row)| Essay {
            tema: row.get("Tema").to_string(),
            competencias: COMPETENCY_FIELDS.map(|c| row.get_int(c)),
        })
        .collect();
    debug!("loaded {} essay(s) for '{}'", essays.len(), ctx.student());
    Ok(essays)
}

/// Append a new essay record.
pub async fn add(store: &dyn TableStore, ctx: &SessionContext, essay: &Essay) -> EngineResult<()> {
    if essay.tema.trim().is_empty() {
        return Err(EngineError::Validation(
            "essay theme must not be empty".to_string(),
        ));
    }
    let schema = tables::essays();
    GridReader::new(store).read_or_create(&schema).await?;

    let mut row = vec![ctx.student().to_string(), essay.tema.trim().to_string()];
    row.extend(essay.competencias.iter().map(i64::to_string));
    row.push(essay.nota_final().to_string());
    store
        .append_row(schema.name(), row)
        .await
        .map_err(EngineError::Transport)
}

/// Rewrite an essay's competency scores and final grade.
pub async fn update_scores(
    store: &dyn TableStore,
    ctx: &SessionContext,
    essay: &Essay,
) -> EngineResult<WriteReport> {
    let schema = tables::essays();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Tema"]);

    let key = NaturalKey::new([ctx.student(), essay.tema.as_str()]);
    let mut changes = ChangeSet::new();
    for (field, score) in COMPETENCY_FIELDS.iter().zip(essay.competencias) {
        changes.set(key.clone(), *field, score);
    }
    changes.set(key.clone(), "Nota_Final", essay.nota_final());

    let mut tracked: Vec<&str> = COMPETENCY_FIELDS.to_vec();
    tracked.push("Nota_Final");
    let report = CellDiffWriter::new(store)
        .write(&table, &index, &changes, &tracked)
        .await?;
    if !report.unresolved.is_empty() {
        return Err(EngineError::RowNotFound {
            table: schema.name().to_string(),
            key,
        });
    }
    Ok(report)
}

/// Delete an essay record by theme.
pub async fn remove(store: &dyn TableStore, ctx: &SessionContext, tema: &str) -> EngineResult<()> {
    let schema = tables::essays();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Tema"]);

    let key = NaturalKey::new([ctx.student(), tema]);
    let row = index.lookup(&key).ok_or_else(|| EngineError::RowNotFound {
        table: schema.name().to_string(),
        key: key.clone(),
    })?;
    store
        .delete_row(schema.name(), row)
        .await
        .map_err(EngineError::Transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;

    fn ctx() -> SessionContext {
        SessionContext::new("mentor", "ana")
    }

    fn essay() -> Essay {
        Essay {
            tema: "Mobilidade urbana".to_string(),
            competencias: [160, 120, 160, 140, 120],
        }
    }

    #[tokio::test]
    async fn add_stores_the_final_grade() {
        let store = MemoryStore::new();
        add(&store, &ctx(), &essay()).await.unwrap();

        let grid = store.snapshot("REDACOES").unwrap();
        assert_eq!(grid[1][7], "700");

        let essays = list(&store, &ctx()).await.unwrap();
        assert_eq!(essays[0].nota_final(), 700);
    }

    #[tokio::test]
    async fn update_rewrites_all_competencies() {
        let store = MemoryStore::new();
        add(&store, &ctx(), &essay()).await.unwrap();

        let mut regraded = essay();
        regraded.competencias = [200, 200, 160, 160, 200];
        let report = update_scores(&store, &ctx(), &regraded).await.unwrap();
        // Five competencies plus the final grade.
        assert_eq!(report.cells_written, 6);

        let essays = list(&store, &ctx()).await.unwrap();
        assert_eq!(essays[0].competencias, [200, 200, 160, 160, 200]);
        assert_eq!(essays[0].nota_final(), 920);
    }

    #[tokio::test]
    async fn remove_unknown_theme_is_row_not_found() {
        let store = MemoryStore::new();
        add(&store, &ctx(), &essay()).await.unwrap();
        let err = remove(&store, &ctx(), "Outro tema").await.unwrap_err();
        assert!(matches!(err, EngineError::RowNotFound { .. }));
    }
}
