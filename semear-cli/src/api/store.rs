//! The abstract tabular store surface
//!
//! Everything the engine needs from the backend is a handful of row/cell
//! primitives on named tables. The store offers no transactions and no
//! queries; each method is one remote call.

use async_trait::async_trait;

use super::error::StoreResult;
use super::resilience::{RetryConfig, RetryPolicy};

/// One cell mutation. Rows and columns are 1-based, matching the remote
/// store's addressing (row 1 is the header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

impl CellWrite {
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

/// Row/cell primitives over named tables in a remote tabular store.
///
/// Implementations must treat each call as an independent unit of work:
/// there is no way to group calls atomically, and the engine is written
/// around that limitation.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch the full grid of a table as raw strings. The first row is the
    /// header. An empty vec means the table exists but holds nothing.
    async fn get_all_values(&self, table: &str) -> StoreResult<Vec<Vec<String>>>;

    /// Append rows after the last non-empty row, in one call.
    async fn append_rows(&self, table: &str, rows: &[Vec<String>]) -> StoreResult<()>;

    /// Append a single row.
    async fn append_row(&self, table: &str, row: Vec<String>) -> StoreResult<()> {
        self.append_rows(table, std::slice::from_ref(&row)).await
    }

    /// Apply a batch of cell writes in one call. Atomic only as far as the
    /// backend makes that single call atomic; partial application on error
    /// is possible and surfaced to the caller as-is.
    async fn update_cells(&self, table: &str, cells: &[CellWrite]) -> StoreResult<()>;

    /// Update a single cell.
    async fn update_cell(&self, table: &str, cell: CellWrite) -> StoreResult<()> {
        self.update_cells(table, std::slice::from_ref(&cell)).await
    }

    /// Delete one row by its 1-based number. Rows below shift up.
    async fn delete_row(&self, table: &str, row: usize) -> StoreResult<()>;

    /// Create a table with the given header row. Fails if it already exists.
    async fn create_table(&self, table: &str, header: &[String]) -> StoreResult<()>;
}

/// Decorator that routes every [`TableStore`] call through a [`RetryPolicy`].
///
/// Note that `append_rows` is not idempotent: if an append fails ambiguously
/// (request sent, response lost) a retry may duplicate rows. See
/// [`RetryPolicy::execute`] for why this is accepted rather than hidden.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self {
            inner,
            policy: RetryPolicy::new(config),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: TableStore> TableStore for RetryingStore<S> {
    async fn get_all_values(&self, table: &str) -> StoreResult<Vec<Vec<String>>> {
        self.policy
            .execute("get_all_values", || self.inner.get_all_values(table))
            .await
    }

    async fn append_rows(&self, table: &str, rows: &[Vec<String>]) -> StoreResult<()> {
        self.policy
            .execute("append_rows", || self.inner.append_rows(table, rows))
            .await
    }

    async fn update_cells(&self, table: &str, cells: &[CellWrite]) -> StoreResult<()> {
        self.policy
            .execute("update_cells", || self.inner.update_cells(table, cells))
            .await
    }

    async fn delete_row(&self, table: &str, row: usize) -> StoreResult<()> {
        self.policy
            .execute("delete_row", || self.inner.delete_row(table, row))
            .await
    }

    async fn create_table(&self, table: &str, header: &[String]) -> StoreResult<()> {
        self.policy
            .execute("create_table", || self.inner.create_table(table, header))
            .await
    }
}
