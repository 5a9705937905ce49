//! Keyed tabular synchronization engine
//!
//! Turns the header-described 2D grids of the remote store into typed,
//! key-addressed row sets with idempotent seeding, diff-based batch writes,
//! and the two-phase archive rollover. Every operation re-reads the
//! authoritative grid before mutating it; nothing is cached across
//! operations, and no locking exists between concurrent callers: two
//! interactions racing on the same entity can lose the earlier write, which
//! is a property of the backing store this engine documents rather than
//! hides.

pub mod archive;
pub mod error;
pub mod grid;
pub mod index;
pub mod init;
pub mod schema;
pub mod value;
pub mod writer;

pub use archive::{ArchiveRoller, RollReport, RollRequest};
pub use error::{EngineError, EngineResult, RollPhase};
pub use grid::{FIRST_DATA_ROW, GridReader, Row, Table};
pub use index::{KeyedRowIndex, NaturalKey};
pub use init::{SeedRowsProvider, UpsertInitializer};
pub use schema::TableSchema;
pub use value::CellValue;
pub use writer::{CellDiffWriter, ChangeSet, WriteReport};
