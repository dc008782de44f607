//! Storage helpers for the service layer
//!
//! File persistence used by the local table store.

pub mod snapshot;
