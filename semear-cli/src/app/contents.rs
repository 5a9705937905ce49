//! Syllabus tracker (CONTEUDOS)
//!
//! The sheet ships a template block: rows whose Username is blank, one per
//! content item of the full syllabus. A student's first contact clones that
//! block with their username substituted; progress edits then rewrite the
//! tracked status fields row by row.

use log::debug;

use crate::api::TableStore;
use crate::engine::{
    CellDiffWriter, ChangeSet, EngineResult, GridReader, KeyedRowIndex, NaturalKey, Table,
    UpsertInitializer, WriteReport,
};

use super::context::SessionContext;
use super::tables;

/// Fields a progress save rewrites.
pub const PROGRESS_FIELDS: [&str; 13] = [
    "Importancia",
    "Status_Dado",
    "Status_Estudado",
    "Qtd_Exercicios",
    "Qtd_Acertos",
    "R1_Feita",
    "R1_Qtd",
    "R2_Feita",
    "R2_Qtd",
    "R3_Feita",
    "R3_Qtd",
    "R4_Feita",
    "R4_Qtd",
];

/// One revision checkpoint: done flag plus question count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Revision {
    pub done: bool,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub materia: String,
    pub frente: String,
    pub parte: String,
    pub conteudo: String,
    pub importancia: String,
    pub dado: bool,
    pub estudado: bool,
    pub exercicios: i64,
    pub acertos: i64,
    pub revisions: [Revision; 4],
}

impl ContentItem {
    /// The natural key addressing this item's row for a student.
    pub fn key(&self, student: &str) -> NaturalKey {
        NaturalKey::new([
            student,
            &self.materia,
            &self.frente,
            &self.parte,
            &self.conteudo,
        ])
    }
}

/// Clone the template block (blank Username) for a new student, preserving
/// every other column as-is.
fn clone_template(entity: &str, table: &Table) -> Vec<Vec<String>> {
    table
        .rows_where("Username", "")
        .map(|(_, row)| {
            table
                .headers()
                .iter()
                .map(|header| {
                    if header == "Username" {
                        entity.to_string()
                    } else {
                        row.get(header).to_string()
                    }
                })
                .collect()
        })
        .collect()
}

/// Read the student's syllabus, cloning the template block on first contact.
pub async fn load(store: &dyn TableStore, ctx: &SessionContext) -> EngineResult<Vec<ContentItem>> {
    let schema = tables::contents();
    let reader = GridReader::new(store);

    // No auto-creation here: without its template block this sheet is
    // useless, so a missing table is an error for the operator.
    let mut table = reader.read(&schema).await?;
    let seeded = UpsertInitializer::new(store)
        .ensure_initialized(&table, &schema, ctx.student(), &clone_template)
        .await?;
    if seeded {
        table = reader.read(&schema).await?;
    }

    let items: Vec<ContentItem> = table
        .rows_where(schema.entity_field(), ctx.student())
        .map(|(_, row)| ContentItem {
            materia: row.get("Materia").to_string(),
            frente: row.get("Frente").to_string(),
            parte: row.get("Parte").to_string(),
            conteudo: row.get("Conteudo").to_string(),
            importancia: row.get("Importancia").to_string(),
            dado: row.get_bool("Status_Dado"),
            estudado: row.get_bool("Status_Estudado"),
            exercicios: row.get_int("Qtd_Exercicios"),
            acertos: row.get_int("Qtd_Acertos"),
            revisions: [1, 2, 3, 4].map(|n| Revision {
                done: row.get_bool(&format!("R{}_Feita", n)),
                count: row.get_int(&format!("R{}_Qtd", n)),
            }),
        })
        .collect();
    debug!("loaded {} content item(s) for '{}'", items.len(), ctx.student());
    Ok(items)
}

/// Persist a batch of progress edits across the tracked fields.
pub async fn save_progress(
    store: &dyn TableStore,
    changes: &ChangeSet,
) -> EngineResult<WriteReport> {
    let schema = tables::contents();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(
        &table,
        &["Username", "Materia", "Frente", "Parte", "Conteudo"],
    );
    CellDiffWriter::new(store)
        .write(&table, &index, changes, &PROGRESS_FIELDS)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::api::memory::raw_row;
    use crate::engine::CellValue;

    fn ctx() -> SessionContext {
        SessionContext::new("mentor", "ana")
    }

    fn template_row(materia: &str, conteudo: &str) -> Vec<String> {
        let mut row = raw_row(["", materia, "Frente 1", "Parte 1", conteudo, "Baixa"]);
        // Status flags, counters and the four revision pairs, all blank/zero.
        row.extend(raw_row([
            "FALSE", "FALSE", "0", "0", "FALSE", "0", "FALSE", "0", "FALSE", "0", "FALSE", "0",
        ]));
        row
    }

    fn seeded_store() -> MemoryStore {
        let headers: Vec<String> = tables::contents()
            .headers()
            .iter()
            .map(String::from)
            .collect();
        MemoryStore::new().with_table(
            "CONTEUDOS",
            vec![
                headers,
                template_row("Matematica", "Funcoes"),
                template_row("Fisica", "Cinematica"),
            ],
        )
    }

    #[tokio::test]
    async fn first_load_clones_the_template_block() {
        let store = seeded_store();
        let items = load(&store, &ctx()).await.unwrap();

        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|i| i.conteudo == "Funcoes"));
        assert!(!items[0].estudado);

        // Template rows stay behind for the next student.
        let grid = store.snapshot("CONTEUDOS").unwrap();
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[1][0], "");
        assert_eq!(grid[3][0], "ana");

        // Second load does not clone again.
        let again = load(&store, &ctx()).await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(store.snapshot("CONTEUDOS").unwrap().len(), 5);
    }

    #[tokio::test]
    async fn progress_edits_rewrite_tracked_fields() {
        let store = seeded_store();
        let items = load(&store, &ctx()).await.unwrap();
        let funcoes = items.iter().find(|i| i.conteudo == "Funcoes").unwrap();

        let key = funcoes.key("ana");
        let mut changes = ChangeSet::new();
        changes.set(key.clone(), "Status_Estudado", true);
        changes.set(key.clone(), "Qtd_Exercicios", 30i64);
        changes.set(key.clone(), "Qtd_Acertos", 24i64);
        changes.set(key.clone(), "R1_Feita", true);
        changes.set(key, "R1_Qtd", CellValue::Int(10));

        let report = save_progress(&store, &changes).await.unwrap();
        assert_eq!(report.cells_written, 5);

        let items = load(&store, &ctx()).await.unwrap();
        let funcoes = items.iter().find(|i| i.conteudo == "Funcoes").unwrap();
        assert!(funcoes.estudado);
        assert_eq!(funcoes.exercicios, 30);
        assert_eq!(funcoes.acertos, 24);
        assert_eq!(funcoes.revisions[0], Revision { done: true, count: 10 });
        // Untouched item unchanged.
        let cinematica = items.iter().find(|i| i.conteudo == "Cinematica").unwrap();
        assert!(!cinematica.estudado);
    }

    #[tokio::test]
    async fn empty_template_seeds_nothing() {
        let headers: Vec<String> = tables::contents()
            .headers()
            .iter()
            .map(String::from)
            .collect();
        let store = MemoryStore::new().with_table("CONTEUDOS", vec![headers]);

        let items = load(&store, &ctx()).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(store.snapshot("CONTEUDOS").unwrap().len(), 1);
    }
}
