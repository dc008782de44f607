//! Restaurant lookups: key composition, filter building and fixture seeding.

pub mod fixtures;
pub mod service;

pub use service::{RestaurantLookupService, DEFAULT_TABLE_NAME};
