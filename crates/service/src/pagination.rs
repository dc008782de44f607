//! Continuation-token draining for segmented scans.
//!
//! Backends return scans in bounded segments. A logical query is only
//! complete once every segment has been fetched.

use tracing::debug;

use crate::errors::TableError;
use crate::table::{Filter, TableRow, TableStoreBackend};

/// Runs `filter` against `table` and follows continuation tokens until the
/// backend reports no more segments.
///
/// Rows are returned in the order the backend produced them. Segments are
/// fetched one after another; the first failing segment aborts the scan.
pub async fn drain_scan<B>(backend: &B, table: &str, filter: &Filter) -> Result<Vec<TableRow>, TableError>
where
    B: TableStoreBackend + ?Sized,
{
    let mut rows = Vec::new();
    let mut token = None;
    let mut segments = 0usize;
    loop {
        let segment = backend.scan(table, filter, token.take()).await?;
        segments += 1;
        debug!(%table, segment = segments, rows = segment.rows.len(), more = segment.continuation.is_some(), "received scan segment");
        rows.extend(segment.rows);
        match segment.continuation {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    debug!(%table, %filter, segments, total = rows.len(), "scan drained");
    Ok(rows)
}
