use std::collections::{HashMap, HashSet};
use std::ops::Bound;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::{ServiceError, TableError};
use crate::storage::snapshot::{TableRows, TableSnapshots};
use crate::table::{
    ContinuationToken, EntityKey, Filter, Segment, StorageAccount, StorageMode, TableRow, TableStoreBackend,
    MAX_BATCH_SIZE, MAX_SEGMENT_SIZE,
};

/// In-process ordered table store.
///
/// Rows are kept in key order per table, so partition-key range filters only
/// walk the keys inside the range. When opened on a data directory every
/// write is followed by a snapshot of the touched table.
pub struct LocalTableStore {
    tables: RwLock<HashMap<String, TableRows>>,
    snapshots: Option<TableSnapshots>,
    max_segment_size: usize,
}

impl LocalTableStore {
    pub fn in_memory() -> Self {
        Self { tables: RwLock::new(HashMap::new()), snapshots: None, max_segment_size: MAX_SEGMENT_SIZE }
    }

    /// Opens a store persisted under `dir`, loading any existing tables.
    pub async fn persistent<P: Into<PathBuf>>(dir: P) -> Result<Self, ServiceError> {
        let snapshots = TableSnapshots::open(dir).await?;
        let tables = snapshots.load_all().await?;
        info!(dir = %snapshots.dir().display(), tables = tables.len(), "opened persistent table store");
        Ok(Self { tables: RwLock::new(tables), snapshots: Some(snapshots), max_segment_size: MAX_SEGMENT_SIZE })
    }

    pub async fn open(account: &StorageAccount) -> Result<Self, ServiceError> {
        let store = match &account.mode {
            StorageMode::Development => Self::in_memory(),
            StorageMode::DataDirectory(dir) => Self::persistent(dir.clone()).await?,
        };
        Ok(store.with_max_segment_size(account.max_segment_size))
    }

    pub fn with_max_segment_size(mut self, max_segment_size: usize) -> Self {
        self.max_segment_size = max_segment_size.clamp(1, MAX_SEGMENT_SIZE);
        self
    }

    async fn persist(&self, table: &str, rows: &TableRows) -> Result<(), TableError> {
        match &self.snapshots {
            Some(s) => s.save(table, rows).await,
            None => Ok(()),
        }
    }

    /// Persists an applied write, undoing it in memory when the snapshot fails.
    async fn commit(
        &self,
        table: &str,
        rows: &mut TableRows,
        displaced: Vec<(EntityKey, Option<TableRow>)>,
    ) -> Result<(), TableError> {
        let persisted = self.persist(table, rows).await;
        if let Err(e) = persisted {
            warn!(%table, error = %e, rows = displaced.len(), "snapshot failed; write rolled back");
            restore(rows, displaced);
            return Err(e);
        }
        Ok(())
    }
}

/// Puts back the rows a failed write displaced. `None` means the key was absent.
fn restore(rows: &mut TableRows, displaced: Vec<(EntityKey, Option<TableRow>)>) {
    for (key, previous) in displaced.into_iter().rev() {
        match previous {
            Some(row) => rows.insert(key, row),
            None => rows.remove(&key),
        };
    }
}

fn table_mut<'a>(tables: &'a mut HashMap<String, TableRows>, table: &str) -> Result<&'a mut TableRows, TableError> {
    tables.get_mut(table).ok_or_else(|| TableError::TableNotFound(table.to_string()))
}

fn validate_batch(rows: &[TableRow]) -> Result<(), TableError> {
    let first = rows.first().ok_or(TableError::BatchEmpty)?;
    if rows.len() > MAX_BATCH_SIZE {
        return Err(TableError::BatchTooLarge(rows.len()));
    }
    let mut seen = HashSet::new();
    for row in rows {
        if row.partition_key != first.partition_key {
            return Err(TableError::BatchMixedPartitions {
                expected: first.partition_key.clone(),
                found: row.partition_key.clone(),
            });
        }
        if !seen.insert(row.row_key.as_str()) {
            return Err(TableError::BatchDuplicateRowKey(row.row_key.clone()));
        }
    }
    Ok(())
}

#[async_trait]
impl TableStoreBackend for LocalTableStore {
    async fn ensure_table_exists(&self, table: &str) -> Result<bool, TableError> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(table) {
            return Ok(false);
        }
        let rows = tables.entry(table.to_string()).or_default();
        let persisted = self.persist(table, rows).await;
        if let Err(e) = persisted {
            tables.remove(table);
            return Err(e);
        }
        info!(%table, "created table");
        Ok(true)
    }

    async fn point_lookup(&self, table: &str, key: &EntityKey) -> Result<Option<TableRow>, TableError> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| TableError::TableNotFound(table.to_string()))?;
        Ok(rows.get(key).cloned())
    }

    async fn scan(
        &self,
        table: &str,
        filter: &Filter,
        continuation: Option<ContinuationToken>,
    ) -> Result<Segment, TableError> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| TableError::TableNotFound(table.to_string()))?;

        let bounds = filter.partition_bounds();
        if bounds.is_empty() {
            return Ok(Segment::last(Vec::new()));
        }

        // Resume at the token or the lowest key of the lower partition bound, whichever is later.
        let range_start = bounds.lower.as_deref().map(|lo| EntityKey::new(lo, ""));
        let resume = continuation.map(EntityKey::from);
        let start = match (range_start, resume) {
            (Some(a), Some(b)) => Bound::Included(a.max(b)),
            (Some(k), None) | (None, Some(k)) => Bound::Included(k),
            (None, None) => Bound::Unbounded,
        };

        let mut matched = Vec::new();
        let mut continuation = None;
        let mut examined = 0usize;
        for (key, row) in rows
            .range((start, Bound::Unbounded))
            .take_while(|(k, _)| bounds.upper.as_deref().map_or(true, |hi| k.partition_key.as_str() <= hi))
        {
            if matched.len() == self.max_segment_size {
                continuation = Some(ContinuationToken::from(key));
                break;
            }
            examined += 1;
            if filter.matches(row) {
                matched.push(row.clone());
            }
        }
        debug!(%table, %filter, examined, matched = matched.len(), more = continuation.is_some(), "scan segment");
        Ok(Segment { rows: matched, continuation })
    }

    async fn upsert(&self, table: &str, row: TableRow) -> Result<(), TableError> {
        let mut tables = self.tables.write().await;
        let rows = table_mut(&mut tables, table)?;
        let key = row.key();
        let previous = rows.insert(key.clone(), row);
        self.commit(table, rows, vec![(key, previous)]).await
    }

    async fn replace(&self, table: &str, row: TableRow) -> Result<(), TableError> {
        let mut tables = self.tables.write().await;
        let rows = table_mut(&mut tables, table)?;
        let key = row.key();
        let Some(existing) = rows.get_mut(&key) else {
            return Err(TableError::EntityNotFound(key));
        };
        let previous = std::mem::replace(existing, row);
        self.commit(table, rows, vec![(key, Some(previous))]).await
    }

    async fn delete(&self, table: &str, key: &EntityKey) -> Result<(), TableError> {
        let mut tables = self.tables.write().await;
        let rows = table_mut(&mut tables, table)?;
        let Some(previous) = rows.remove(key) else {
            return Err(TableError::EntityNotFound(key.clone()));
        };
        self.commit(table, rows, vec![(key.clone(), Some(previous))]).await
    }

    async fn batch_upsert(&self, table: &str, batch: Vec<TableRow>) -> Result<(), TableError> {
        validate_batch(&batch)?;
        let mut tables = self.tables.write().await;
        let rows = table_mut(&mut tables, table)?;
        let count = batch.len();
        let displaced = batch
            .into_iter()
            .map(|row| {
                let key = row.key();
                let previous = rows.insert(key.clone(), row);
                (key, previous)
            })
            .collect();
        self.commit(table, rows, displaced).await?;
        debug!(%table, count, "applied batch");
        Ok(())
    }
}
