//! Daily question tracking and the weekly close (QUESTOES_DIARIAS)
//!
//! One row per subject per student accumulates question counts across the
//! week's day columns next to a weekly goal. Closing the week archives the
//! per-subject totals into QUESTOES_HISTORICO and zeroes the day columns.

use chrono::NaiveDate;
use log::debug;

use crate::api::TableStore;
use crate::engine::{
    ArchiveRoller, CellDiffWriter, ChangeSet, EngineError, EngineResult, GridReader, KeyedRowIndex,
    NaturalKey, RollReport, RollRequest, Table, UpsertInitializer, WriteReport,
};

use super::context::SessionContext;
use super::tables::{self, BASELINE_SUBJECTS, DAY_FIELDS};

/// Fields rewritten by a save: the weekly goal plus the seven day columns.
const TRACKED_FIELDS: [&str; 8] = [
    "Meta_Semanal",
    "Segunda",
    "Terca",
    "Quarta",
    "Quinta",
    "Sexta",
    "Sabado",
    "Domingo",
];

/// One subject's running week.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectWeek {
    pub materia: String,
    pub meta: i64,
    /// Counts aligned with [`DAY_FIELDS`].
    pub days: Vec<i64>,
}

impl SubjectWeek {
    pub fn total(&self) -> i64 {
        self.days.iter().sum()
    }
}

fn baseline_rows(entity: &str, _table: &Table) -> Vec<Vec<String>> {
    BASELINE_SUBJECTS
        .iter()
        .map(|materia| {
            let mut row = vec![entity.to_string(), materia.to_string()];
            // Meta_Semanal plus the seven day columns, all zeroed.
            row.extend(std::iter::repeat_n("0".to_string(), 1 + DAY_FIELDS.len()));
            row
        })
        .collect()
}

/// Read the student's week, seeding the baseline subject rows on first
/// contact.
pub async fn load(store: &dyn TableStore, ctx: &SessionContext) -> EngineResult<Vec<SubjectWeek>> {
    let schema = tables::daily_questions();
    let reader = GridReader::new(store);

    let mut table = reader.read_or_create(&schema).await?;
    let seeded = UpsertInitializer::new(store)
        .ensure_initialized(&table, &schema, ctx.student(), &baseline_rows)
        .await?;
    if seeded {
        table = reader.read(&schema).await?;
    }

    let weeks: Vec<SubjectWeek> = table
        .rows_where(schema.entity_field(), ctx.student())
        .map(|(_, row)| SubjectWeek {
            materia: row.get("Materia").to_string(),
            meta: row.get_int("Meta_Semanal"),
            days: DAY_FIELDS.iter().map(|d| row.get_int(d)).collect(),
        })
        .collect();
    debug!("loaded {} subject row(s) for '{}'", weeks.len(), ctx.student());
    Ok(weeks)
}

/// Persist a batch of edits to goals and day counts.
pub async fn save(store: &dyn TableStore, changes: &ChangeSet) -> EngineResult<WriteReport> {
    let schema = tables::daily_questions();
    let table = GridReader::new(store).read(&schema).await?;
    let index = KeyedRowIndex::build(&table, &["Username", "Materia"]);
    CellDiffWriter::new(store)
        .write(&table, &index, changes, &TRACKED_FIELDS)
        .await
}

/// Record one day's count for one subject.
pub async fn log_day(
    store: &dyn TableStore,
    ctx: &SessionContext,
    materia: &str,
    day: &str,
    count: i64,
) -> EngineResult<WriteReport> {
    if !DAY_FIELDS.contains(&day) {
        return Err(EngineError::Validation(format!(
            "'{}' is not a day column (expected one of {})",
            day,
            DAY_FIELDS.join(", ")
        )));
    }
    let key = NaturalKey::new([ctx.student(), materia]);
    let mut changes = ChangeSet::new();
    changes.set(key.clone(), day, count);
    let report = save(store, &changes).await?;
    if !report.unresolved.is_empty() {
        return Err(EngineError::RowNotFound {
            table: tables::daily_questions().name().to_string(),
            key,
        });
    }
    Ok(report)
}

/// Set the weekly goal for one subject.
pub async fn set_goal(
    store: &dyn TableStore,
    ctx: &SessionContext,
    materia: &str,
    meta: i64,
) -> EngineResult<WriteReport> {
    let key = NaturalKey::new([ctx.student(), materia]);
    let mut changes = ChangeSet::new();
    changes.set(key.clone(), "Meta_Semanal", meta);
    let report = save(store, &changes).await?;
    if !report.unresolved.is_empty() {
        return Err(EngineError::RowNotFound {
            table: tables::daily_questions().name().to_string(),
            key,
        });
    }
    Ok(report)
}

/// Label for the week being closed, from its closing date.
pub fn week_label(date: NaiveDate) -> String {
    format!("Semana {}", date.format("%d/%m/%Y"))
}

/// Close the student's week: archive per-subject totals into the history
/// table (created with its header on first use), then zero the day columns.
pub async fn close_week(
    store: &dyn TableStore,
    ctx: &SessionContext,
    period_label: &str,
) -> EngineResult<RollReport> {
    let source = tables::daily_questions();
    let history = tables::questions_history();
    let reader = GridReader::new(store);

    // Creating the history table up front is this caller's policy; the
    // roller itself only appends.
    reader.read_or_create(&history).await?;
    let table = reader.read(&source).await?;

    ArchiveRoller::new(store)
        .roll(
            &table,
            &RollRequest {
                source: &source,
                history: &history,
                entity_key: ctx.student(),
                period_label,
                day_fields: &DAY_FIELDS,
                category_field: "Materia",
            },
        )
        .await
}
