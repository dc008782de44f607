//! Table-store capability used by the service layer.
//!
//! The service never talks to storage directly: everything goes through
//! [`TableStoreBackend`]. Scans are segmented, and callers resume a scan by
//! handing back the [`ContinuationToken`] of the previous segment.

pub mod account;
pub mod filter;
pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use models::{EntityKey, PropertyValue, TableRow};

use crate::errors::TableError;
pub use account::{StorageAccount, StorageMode};
pub use filter::{Comparison, Condition, Filter, FilterField, PartitionBounds};
pub use local::LocalTableStore;

/// Largest number of operations accepted in one atomic batch.
pub const MAX_BATCH_SIZE: usize = 100;

/// Largest number of rows a single scan segment returns.
pub const MAX_SEGMENT_SIZE: usize = 1000;

/// Cursor for resuming a scan. Only the backend that issued it interprets the fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    pub next_partition_key: String,
    pub next_row_key: String,
}

impl ContinuationToken {
    pub fn new(next_partition_key: impl Into<String>, next_row_key: impl Into<String>) -> Self {
        Self { next_partition_key: next_partition_key.into(), next_row_key: next_row_key.into() }
    }
}

impl From<&EntityKey> for ContinuationToken {
    fn from(key: &EntityKey) -> Self {
        Self::new(key.partition_key.clone(), key.row_key.clone())
    }
}

impl From<ContinuationToken> for EntityKey {
    fn from(token: ContinuationToken) -> Self {
        EntityKey::new(token.next_partition_key, token.next_row_key)
    }
}

/// One bounded page of scan results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    pub rows: Vec<TableRow>,
    /// `None` once the scan is exhausted.
    pub continuation: Option<ContinuationToken>,
}

impl Segment {
    pub fn last(rows: Vec<TableRow>) -> Self {
        Self { rows, continuation: None }
    }
}

/// Key/range-scan table store.
///
/// Implementations must be safe to call concurrently. Single-row writes are
/// atomic; `batch_upsert` is atomic for rows sharing one partition key.
#[async_trait]
pub trait TableStoreBackend: Send + Sync {
    /// Creates the table if missing; returns whether it was created.
    async fn ensure_table_exists(&self, table: &str) -> Result<bool, TableError>;

    async fn point_lookup(&self, table: &str, key: &EntityKey) -> Result<Option<TableRow>, TableError>;

    /// Returns the next segment of rows matching `filter`, in key order,
    /// starting at `continuation` (or the beginning of the table).
    async fn scan(
        &self,
        table: &str,
        filter: &Filter,
        continuation: Option<ContinuationToken>,
    ) -> Result<Segment, TableError>;

    /// Insert or replace.
    async fn upsert(&self, table: &str, row: TableRow) -> Result<(), TableError>;

    /// Overwrite an existing row; `EntityNotFound` if absent.
    async fn replace(&self, table: &str, row: TableRow) -> Result<(), TableError>;

    /// `EntityNotFound` if absent.
    async fn delete(&self, table: &str, key: &EntityKey) -> Result<(), TableError>;

    /// Insert-or-replace every row, all or nothing. Rows must share a partition.
    async fn batch_upsert(&self, table: &str, rows: Vec<TableRow>) -> Result<(), TableError>;
}
