//! Goal tracking (METAS)
//!
//! Free-form goals per student, each either pending or done. No baseline
//! seeding here: goals only exist once someone writes one.

use log::debug;

use crate::api::TableStore;
use crate::engine::{
    CellDiffWriter, ChangeSet, EngineError, EngineResult, GridReader, KeyedRowIndex, NaturalKey,
    WriteReport,
};

use super::context::SessionContext;
use super::tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Pending,
    Done,
}

impl GoalStatus {
    /// Status strings as the sheet carries them.
    pub fn to_wire(self) -> &'static str {
        match self {
            GoalStatus::Pending => "Pendente",
            GoalStatus::Done => "Concluida",
        }
    }

    /// Anything that is not exactly "Concluida" counts as pending.
    pub fn from_wire(raw: &str) -> Self {
        if raw.trim() == "Concluida" {
            GoalStatus::Done
        } else {
            GoalStatus::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub description: String,
    pub status: GoalStatus,
}

/// All of the student's goals, in sheet order.
pub async fn list(store: &dyn TableStore, ctx: &SessionContext) -> EngineResult<Vec<Goal>> {
    let schema = tables::goals();
    let table = GridReader::new(store).read_or_create(&schema).await?;

    let goals: Vec<Goal> = table
        .rows_where(schema.entity_field(), ctx.student())
        .map(|(_, row)| Goal {
            description: row.get("Descricao").to_string(),
            status: GoalStatus::from_wire(row.get("Status")),
        })
        .collect();
    debug!("loaded {} goal(s) for '{}'", goals.len(), ctx.student());
    Ok(goals)
}

/// Append a new pending goal.
pub async fn add(
    store: &dyn TableStore,
    ctx: &SessionContext,
    description: &str,
) -> EngineResult<()> {
    let description = description.trim();
    if description.is_empty() {
        return Err(EngineError::Validation(
            "goal description must not be empty".to_string(),
        ));
    }
    let schema = tables::goals();
    GridReader::new(store).read_or_create(&schema).await?;
    store
        .append_row(
            schema.name(),
            vec![
                ctx.student().to_string(),
                description.to_string(),
                GoalStatus::Pending.to_wire().to_string(),
            ],
        )
        .await
        .map_err(EngineError::Transport)
}

/// Flip a goal's status (conclude or reopen).
pub async fn set_status(
    store: &dyn TableStore,
    ctx: &SessionContext,
    description: &str,
    status: GoalStatus,
) -> EngineResult<WriteReport> {
    let schema = tables::goals();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Descricao"]);

    let key = NaturalKey::new([ctx.student(), description]);
    let mut changes = ChangeSet::new();
    changes.set(key.clone(), "Status", status.to_wire());

    let report = CellDiffWriter::new(store)
        .write(&table, &index, &changes, &["Status"])
        .await?;
    if !report.unresolved.is_empty() {
        return Err(EngineError::RowNotFound {
            table: schema.name().to_string(),
            key,
        });
    }
    Ok(report)
}

/// Delete a goal row by key.
pub async fn remove(
    store: &dyn TableStore,
    ctx: &SessionContext,
    description: &str,
) -> EngineResult<()> {
    let schema = tables::goals();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Descricao"]);

    let key = NaturalKey::new([ctx.student(), description]);
    let row = index.lookup(&key).ok_or_else(|| EngineError::RowNotFound {
        table: schema.name().to_string(),
        key: key.clone(),
    })?;
    store
        .delete_row(schema.name(), row)
        .await
        .map_err(EngineError::Transport)
}
