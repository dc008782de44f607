//! Shared helpers for the restaurant lookup workspace: logging setup and
//! wire types used by more than one crate.

pub mod types;
pub mod utils;
