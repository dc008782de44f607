use models::errors::ModelError;
use models::EntityKey;
use thiserror::Error;

/// Failures reported by a table-store backend for a single call.
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("table {0} does not exist")]
    TableNotFound(String),
    #[error("entity {0} does not exist")]
    EntityNotFound(EntityKey),
    #[error("batch contains no operations")]
    BatchEmpty,
    #[error("batch of {0} operations exceeds the limit of {max}", max = crate::table::MAX_BATCH_SIZE)]
    BatchTooLarge(usize),
    #[error("batch mixes partitions {expected} and {found}")]
    BatchMixedPartitions { expected: String, found: String },
    #[error("batch contains row key {0:?} more than once")]
    BatchDuplicateRowKey(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection or credential problem; fatal at startup, never retried.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("backend operation failed: {0}")]
    BackendOperation(#[from] TableError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl ServiceError {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable(format!(
            "Could not connect to the cloud storage account. Please check the storage connection string. ({reason})"
        ))
    }

    /// True when the failure means the addressed entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BackendOperation(TableError::EntityNotFound(_)))
    }
}
