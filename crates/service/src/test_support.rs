#![cfg(test)]
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::errors::TableError;
use crate::restaurant::RestaurantLookupService;
use crate::table::{ContinuationToken, EntityKey, Filter, LocalTableStore, Segment, TableRow, TableStoreBackend};

/// Backend that replays a fixed list of scan segments.
///
/// Tokens carry the index of the next segment in `next_row_key`. Every write
/// fails, so only scans are meaningful.
pub struct ScriptedBackend {
    segments: Vec<Vec<TableRow>>,
    fail_at: Option<usize>,
    tokens: Mutex<Vec<Option<ContinuationToken>>>,
}

impl ScriptedBackend {
    pub fn new(segments: Vec<Vec<TableRow>>) -> Self {
        Self { segments, fail_at: None, tokens: Mutex::new(Vec::new()) }
    }

    pub fn failing_at(mut self, segment: usize) -> Self {
        self.fail_at = Some(segment);
        self
    }

    pub fn tokens_seen(&self) -> Vec<Option<ContinuationToken>> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableStoreBackend for ScriptedBackend {
    async fn ensure_table_exists(&self, _table: &str) -> Result<bool, TableError> {
        Ok(false)
    }

    async fn point_lookup(&self, _table: &str, _key: &EntityKey) -> Result<Option<TableRow>, TableError> {
        Ok(None)
    }

    async fn scan(
        &self,
        _table: &str,
        filter: &Filter,
        continuation: Option<ContinuationToken>,
    ) -> Result<Segment, TableError> {
        self.tokens.lock().unwrap().push(continuation.clone());
        let index = match continuation {
            Some(t) => t.next_row_key.parse::<usize>().map_err(|e| TableError::Storage(e.to_string()))?,
            None => 0,
        };
        if self.fail_at == Some(index) {
            return Err(TableError::Storage(format!("segment {index} unavailable")));
        }
        let rows: Vec<TableRow> = self
            .segments
            .get(index)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        let continuation = (index + 1 < self.segments.len()).then(|| ContinuationToken::new("", (index + 1).to_string()));
        Ok(Segment { rows, continuation })
    }

    async fn upsert(&self, _table: &str, _row: TableRow) -> Result<(), TableError> {
        Err(TableError::Storage("scripted backend is read-only".into()))
    }

    async fn replace(&self, _table: &str, _row: TableRow) -> Result<(), TableError> {
        Err(TableError::Storage("scripted backend is read-only".into()))
    }

    async fn delete(&self, _table: &str, _key: &EntityKey) -> Result<(), TableError> {
        Err(TableError::Storage("scripted backend is read-only".into()))
    }

    async fn batch_upsert(&self, _table: &str, _rows: Vec<TableRow>) -> Result<(), TableError> {
        Err(TableError::Storage("scripted backend is read-only".into()))
    }
}

/// Service over a fresh in-memory store with the fixture data loaded.
pub async fn seeded_service(max_segment_size: usize) -> RestaurantLookupService<LocalTableStore> {
    let store = Arc::new(LocalTableStore::in_memory().with_max_segment_size(max_segment_size));
    let svc = RestaurantLookupService::new(store, "Restaurants");
    svc.initialize().await.expect("initialize table");
    svc.seed_fixture_data().await.expect("seed fixtures");
    svc
}
