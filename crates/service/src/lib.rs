//! Service layer translating restaurant queries into table-store operations.
//! - `table` defines the backend capability and the local store behind it.
//! - `restaurant` composes keys and filters and drains paginated scans.
//! - Errors are typed per layer: `TableError` from backends, `ServiceError` to callers.

pub mod errors;
pub mod pagination;
pub mod restaurant;
pub mod storage;
pub mod table;
#[cfg(test)]
pub mod test_support;
