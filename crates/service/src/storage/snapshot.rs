use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::errors::{ServiceError, TableError};
use models::{EntityKey, TableRow};

pub type TableRows = BTreeMap<EntityKey, TableRow>;

/// JSON file persistence for table contents.
///
/// Each table is one file, `<dir>/<table>.json`, holding an array of rows in
/// key order. Files are rewritten whole after every write.
#[derive(Clone, Debug)]
pub struct TableSnapshots {
    dir: PathBuf,
}

impl TableSnapshots {
    /// Opens the snapshot directory, creating it if missing.
    pub async fn open<P: Into<PathBuf>>(dir: P) -> Result<Self, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ServiceError::unavailable(format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }

    /// Loads every `*.json` table file in the directory.
    pub async fn load_all(&self) -> Result<HashMap<String, TableRows>, ServiceError> {
        let mut tables = HashMap::new();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| ServiceError::unavailable(format!("cannot read {}: {e}", self.dir.display())))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ServiceError::unavailable(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(table) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                warn!(path = %path.display(), "skipping snapshot with non-utf8 name");
                continue;
            };
            let bytes = fs::read(&path)
                .await
                .map_err(|e| ServiceError::unavailable(format!("cannot read {}: {e}", path.display())))?;
            let rows: Vec<TableRow> = serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::unavailable(format!("corrupt snapshot {}: {e}", path.display())))?;
            debug!(%table, rows = rows.len(), "loaded table snapshot");
            tables.insert(table, rows.into_iter().map(|r| (r.key(), r)).collect());
        }
        Ok(tables)
    }

    /// Writes the table through a temporary file and renames it into place.
    pub async fn save(&self, table: &str, rows: &TableRows) -> Result<(), TableError> {
        let data = serde_json::to_vec(&rows.values().collect::<Vec<_>>()).map_err(|e| TableError::Storage(e.to_string()))?;
        let path = self.path_for(table);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(|e| TableError::Storage(e.to_string()))?;
        fs::rename(&tmp, &path).await.map_err(|e| TableError::Storage(e.to_string()))?;
        Ok(())
    }
}
