use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::ServiceError;
use crate::table::MAX_SEGMENT_SIZE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageMode {
    /// Tables live in process memory and vanish on exit.
    Development,
    /// Tables are snapshotted as JSON files under this directory.
    DataDirectory(PathBuf),
}

/// Storage account described by a connection string.
///
/// ```text
/// UseDevelopmentStorage=true
/// DataDirectory=data/tables;MaxSegmentSize=500
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageAccount {
    pub mode: StorageMode,
    pub max_segment_size: usize,
}

impl StorageAccount {
    /// Parses a connection string. Every failure is `BackendUnavailable`.
    pub fn parse(connection_string: &str) -> Result<Self, ServiceError> {
        let mut development = None;
        let mut data_dir = None;
        let mut max_segment_size = MAX_SEGMENT_SIZE;

        if connection_string.trim().is_empty() {
            return Err(ServiceError::unavailable("connection string is empty"));
        }

        for part in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| ServiceError::unavailable(format!("segment {part:?} is not key=value")))?;
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "usedevelopmentstorage" => {
                    let flag = value
                        .parse::<bool>()
                        .map_err(|_| ServiceError::unavailable(format!("UseDevelopmentStorage={value} is not a boolean")))?;
                    development = Some(flag);
                }
                "datadirectory" => {
                    if value.is_empty() {
                        return Err(ServiceError::unavailable("DataDirectory is empty"));
                    }
                    data_dir = Some(PathBuf::from(value));
                }
                "maxsegmentsize" => {
                    max_segment_size = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| (1..=MAX_SEGMENT_SIZE).contains(n))
                        .ok_or_else(|| {
                            ServiceError::unavailable(format!("MaxSegmentSize must be within 1..={MAX_SEGMENT_SIZE}"))
                        })?;
                }
                other => return Err(ServiceError::unavailable(format!("unknown setting {other:?}"))),
            }
        }

        let mode = match (development, data_dir) {
            (Some(true), None) => StorageMode::Development,
            (None | Some(false), Some(dir)) => StorageMode::DataDirectory(dir),
            (Some(true), Some(_)) => {
                return Err(ServiceError::unavailable("UseDevelopmentStorage and DataDirectory are exclusive"))
            }
            (_, None) => return Err(ServiceError::unavailable("no storage endpoint configured")),
        };
        Ok(Self { mode, max_segment_size })
    }

    pub fn data_directory(&self) -> Option<&Path> {
        match &self.mode {
            StorageMode::DataDirectory(dir) => Some(dir),
            StorageMode::Development => None,
        }
    }
}

impl FromStr for StorageAccount {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
