//! Remote tabular store access
//!
//! The store is a spreadsheet: named tables of raw string cells, a header
//! row as the wire contract, and single-call row/cell mutation primitives
//! with no cross-call transactions. [`TableStore`] is the seam; the REST
//! backend and the in-memory backend both implement it, and
//! [`RetryingStore`] wraps either with bounded retry/backoff.

pub mod error;
pub mod memory;
pub mod resilience;
pub mod sheets;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use resilience::{RetryConfig, RetryPolicy, RetryableError};
pub use sheets::SheetsClient;
pub use store::{CellWrite, RetryingStore, TableStore};
