//! Worksheet workflows
//!
//! One thin module per sheet, all built on the same engine primitives:
//! fresh read, optional baseline seeding, keyed diff-write.

pub mod contents;
pub mod context;
pub mod essays;
pub mod goals;
pub mod mock_exams;
pub mod questions;
pub mod reviews;
pub mod schedule;
pub mod tables;

pub use context::SessionContext;
