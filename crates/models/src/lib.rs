//! Entity definitions for the restaurant table.
//! - `table` holds the generic row shape every table-store backend speaks.
//! - `restaurant` maps the restaurant entity onto that row shape.

pub mod errors;
pub mod table;
pub mod restaurant;
pub mod search_results;

pub use restaurant::{partition_key_for, RestaurantRecord};
pub use search_results::SearchResults;
pub use table::{EntityKey, PropertyValue, TableRow};
