//! Weekly planner workflow (HORARIO)
//!
//! Each student owns one row per hour slot; day columns hold either "Livre"
//! or the subject planned for that slot.

use log::debug;

use crate::api::TableStore;
use crate::engine::{
    CellDiffWriter, ChangeSet, EngineError, EngineResult, GridReader, KeyedRowIndex, NaturalKey,
    Table, UpsertInitializer, WriteReport,
};

use super::context::SessionContext;
use super::tables::{self, DAY_FIELDS};

/// Slot value meaning "nothing planned".
pub const SLOT_FREE: &str = "Livre";

/// One hour slot of the student's week, day values aligned with
/// [`DAY_FIELDS`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSlot {
    pub hora: String,
    pub days: Vec<String>,
}

/// The hour template every new student starts from: 05:00 through 23:00,
/// plus the midnight slot (stored in its long form, as the sheet has it).
fn hour_template() -> Vec<String> {
    let mut hours: Vec<String> = (5..24).map(|h| format!("{:02}:00", h)).collect();
    hours.push("00:00:00".to_string());
    hours
}

fn baseline_rows(entity: &str, _table: &Table) -> Vec<Vec<String>> {
    hour_template()
        .into_iter()
        .map(|hora| {
            let mut row = vec![entity.to_string(), hora];
            row.extend(DAY_FIELDS.iter().map(|_| SLOT_FREE.to_string()));
            row
        })
        .collect()
}

/// Read the student's planner, seeding the hour template on first contact.
pub async fn load(store: &dyn TableStore, ctx: &SessionContext) -> EngineResult<Vec<ScheduleSlot>> {
    let schema = tables::schedule();
    let reader = GridReader::new(store);

    let mut table = reader.read_or_create(&schema).await?;
    let seeded = UpsertInitializer::new(store)
        .ensure_initialized(&table, &schema, ctx.student(), &baseline_rows)
        .await?;
    if seeded {
        // Seeding shifted row numbers; the snapshot is stale.
        table = reader.read(&schema).await?;
    }

    let mut slots: Vec<ScheduleSlot> = table
        .rows_where(schema.entity_field(), ctx.student())
        .map(|(_, row)| ScheduleSlot {
            hora: row.get("Hora").to_string(),
            days: DAY_FIELDS.iter().map(|d| row.get(d).to_string()).collect(),
        })
        .collect();
    slots.sort_by(|a, b| a.hora.cmp(&b.hora));
    debug!("loaded {} slot(s) for '{}'", slots.len(), ctx.student());
    Ok(slots)
}

/// Persist a batch of slot edits. Change-set keys are (student, hour)
/// pairs; values go into the day columns named by each entry.
pub async fn save(store: &dyn TableStore, changes: &ChangeSet) -> EngineResult<WriteReport> {
    let schema = tables::schedule();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Hora"]);
    CellDiffWriter::new(store)
        .write(&table, &index, changes, &DAY_FIELDS)
        .await
}

/// Plan one slot: `day` must be one of the day columns.
pub async fn set_slot(
    store: &dyn TableStore,
    ctx: &SessionContext,
    hora: &str,
    day: &str,
    value: &str,
) -> EngineResult<WriteReport> {
    if !DAY_FIELDS.contains(&day) {
        return Err(EngineError::Validation(format!(
            "'{}' is not a day column (expected one of {})",
            day,
            DAY_FIELDS.join(", ")
        )));
    }
    let mut changes = ChangeSet::new();
    changes.set(NaturalKey::new([ctx.student(), hora]), day, value);
    let report = save(store, &changes).await?;
    if !report.unresolved.is_empty() {
        return Err(EngineError::RowNotFound {
            table: tables::schedule().name().to_string(),
            key: NaturalKey::new([ctx.student(), hora]),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;

    fn ctx() -> SessionContext {
        SessionContext::new("mentor", "ana")
    }

    #[tokio::test]
    async fn first_load_seeds_the_hour_template() {
        let store = MemoryStore::new();
        let slots = load(&store, &ctx()).await.unwrap();

        // 19 hour slots plus midnight.
        assert_eq!(slots.len(), 20);
        assert!(slots.iter().all(|s| s.days.iter().all(|d| d == SLOT_FREE)));
        // Sorted ascending, midnight first.
        assert_eq!(slots[0].hora, "00:00:00");
        assert_eq!(slots[1].hora, "05:00");

        // A second load does not duplicate the template.
        let again = load(&store, &ctx()).await.unwrap();
        assert_eq!(again.len(), 20);
    }

    #[tokio::test]
    async fn set_slot_updates_one_cell() {
        let store = MemoryStore::new();
        load(&store, &ctx()).await.unwrap();

        let report = set_slot(&store, &ctx(), "07:00", "Terca", "Matematica")
            .await
            .unwrap();
        assert_eq!(report.cells_written, 1);

        let slots = load(&store, &ctx()).await.unwrap();
        let slot = slots.iter().find(|s| s.hora == "07:00").unwrap();
        assert_eq!(slot.days[1], "Matematica");
        assert_eq!(slot.days[0], SLOT_FREE);
    }

    #[tokio::test]
    async fn set_slot_rejects_unknown_day_and_hour() {
        let store = MemoryStore::new();
        load(&store, &ctx()).await.unwrap();

        let err = set_slot(&store, &ctx(), "07:00", "Feriado", "X")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = set_slot(&store, &ctx(), "99:00", "Terca", "X")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RowNotFound { .. }));
    }
}
