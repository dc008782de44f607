use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("row {partition_key}/{row_key} is missing property {property}")]
    MissingProperty { partition_key: String, row_key: String, property: &'static str },
    #[error("property {property} has type {found}, expected {expected}")]
    PropertyType { property: &'static str, expected: &'static str, found: &'static str },
}
