//! Engine error taxonomy

use thiserror::Error;

use crate::api::StoreError;

use super::index::NaturalKey;

pub type EngineResult<T> = Result<T, EngineError>;

/// Which phase of an archive roll failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollPhase {
    /// Appending archive records to the history table.
    Snapshot,
    /// Zeroing the tracked cells in the source table.
    Reset,
}

impl std::fmt::Display for RollPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollPhase::Snapshot => write!(f, "snapshot"),
            RollPhase::Reset => write!(f, "reset"),
        }
    }
}

/// A failure inside the synchronization engine.
///
/// Each variant carries enough context (table, entity, phase) for the caller
/// to report the failure and retry manually. The engine never compensates on
/// its own: a successful snapshot is not rolled back when the reset fails.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The resilience layer gave up on a remote call.
    #[error("transport failure talking to the remote store: {0}")]
    Transport(#[from] StoreError),

    /// The table does not exist and the caller did not ask for creation.
    #[error("table '{0}' does not exist in the remote store")]
    TableMissing(String),

    /// No row matches the key, in a context where one was required.
    #[error("no row matches key {key} in table '{table}'")]
    RowNotFound { table: String, key: NaturalKey },

    /// A row or value failed a shape check before it was sent anywhere.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Seeding an entity's baseline rows failed partway. The entity may be
    /// left with some but not all of its rows; a later init call will see it
    /// as present and not re-seed, so the gap needs external repair.
    #[error("seeding '{entity}' in table '{table}' may be incomplete: {source}")]
    IncompleteInit {
        table: String,
        entity: String,
        source: StoreError,
    },

    /// A batch cell write failed. How much of the batch the remote store
    /// applied before failing is opaque; state is whatever it left behind.
    #[error("batch write of {cells} cell(s) to table '{table}' failed: {source}")]
    PartialWrite {
        table: String,
        cells: usize,
        source: StoreError,
    },

    /// An archive roll failed, tagged with the phase. A snapshot failure
    /// leaves the source untouched; a reset failure leaves history recorded
    /// but the source not zeroed, so rolling again would double-count.
    #[error("archive roll for '{entity}' failed during {phase}: {source}")]
    Roll {
        phase: RollPhase,
        entity: String,
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Fold a store-level "table not found" into the engine variant so
    /// callers match on one taxonomy.
    pub(crate) fn from_fetch(table: &str, err: StoreError) -> Self {
        match err {
            StoreError::TableNotFound(_) => EngineError::TableMissing(table.to_string()),
            other => EngineError::Transport(other),
        }
    }
}
