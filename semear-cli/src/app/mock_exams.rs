//! Mock exam records (SIMULADOS)
//!
//! One row per mock exam per student: the four knowledge-area scores, the
//! essay score, and the stored total.

use log::debug;

use crate::api::TableStore;
use crate::engine::{EngineError, EngineResult, GridReader, KeyedRowIndex, NaturalKey};

use super::context::SessionContext;
use super::tables;

#[derive(Debug, Clone, PartialEq)]
pub struct MockExam {
    pub nome: String,
    pub data: String,
    pub linguagens: i64,
    pub humanas: i64,
    pub natureza: i64,
    pub matematica: i64,
    pub redacao: i64,
}

impl MockExam {
    /// Stored alongside the per-area scores so the sheet stays chartable
    /// without formulas.
    pub fn total(&self) -> i64 {
        self.linguagens + self.humanas + self.natureza + self.matematica + self.redacao
    }
}

/// All of the student's mock exams, in sheet order.
pub async fn list(store: &dyn TableStore, ctx: &SessionContext) -> EngineResult<Vec<MockExam>> {
    let schema = tables::mock_exams();
    let table = GridReader::new(store).read_or_create(&schema).await?;

    let exams: Vec<MockExam> = table
        .rows_where(schema.entity_field(), ctx.student())
        .map(|(_, row)| MockExam {
            nome: row.get("Nome_Simulado").to_string(),
            data: row.get("Data").to_string(),
            linguagens: row.get_int("Linguagens"),
            humanas: row.get_int("Humanas"),
            natureza: row.get_int("Natureza"),
            matematica: row.get_int("Matematica"),
            redacao: row.get_int("Redacao"),
        })
        .collect();
    debug!("loaded {} mock exam(s) for '{}'", exams.len(), ctx.student());
    Ok(exams)
}

/// Append a new mock exam record.
pub async fn add(store: &dyn TableStore, ctx: &SessionContext, exam: &MockExam) -> EngineResult<()> {
    if exam.nome.trim().is_empty() {
        return Err(EngineError::Validation(
            "mock exam name must not be empty".to_string(),
        ));
    }
    let schema = tables::mock_exams();
    GridReader::new(store).read_or_create(&schema).await?;
    store
        .append_row(
            schema.name(),
            vec![
                ctx.student().to_string(),
                exam.nome.trim().to_string(),
                exam.data.clone(),
                exam.linguagens.to_string(),
                exam.humanas.to_string(),
                exam.natureza.to_string(),
                exam.matematica.to_string(),
                exam.redacao.to_string(),
                exam.total().to_string(),
            ],
        )
        .await
        .map_err(EngineError::Transport)
}

/// Delete a mock exam record by name.
pub async fn remove(store: &dyn TableStore, ctx: &SessionContext, nome: &str) -> EngineResult<()> {
    let schema = tables::mock_exams();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Nome_Simulado"]);

    let key = NaturalKey::new([ctx.student(), nome]);
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

    fn exam() -> MockExam {
        MockExam {
            nome: "ENEM 1".to_string(),
            data: "01/08/2026".to_string(),
            linguagens: 620,
            humanas: 650,
            natureza: 580,
            matematica: 700,
            redacao: 840,
        }
    }

    #[tokio::test]
    async fn add_stores_the_computed_total() {
        let store = MemoryStore::new();
        add(&store, &ctx(), &exam()).await.unwrap();

        let grid = store.snapshot("SIMULADOS").unwrap();
        assert_eq!(grid[1][8], "3390");

        let exams = list(&store, &ctx()).await.unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].total(), 3390);
    }

    #[tokio::test]
    async fn remove_targets_the_named_exam() {
        let store = MemoryStore::new();
        add(&store, &ctx(), &exam()).await.unwrap();
        let mut second = exam();
        second.nome = "ENEM 2".to_string();
        add(&store, &ctx(), &second).await.unwrap();

        remove(&store, &ctx(), "ENEM 1").await.unwrap();

        let exams = list(&store, &ctx()).await.unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].nome, "ENEM 2");
    }
}
