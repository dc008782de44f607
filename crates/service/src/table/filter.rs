//! Filter expressions accepted by [`TableStoreBackend::scan`](super::TableStoreBackend::scan).
//!
//! A filter is a conjunction of `(field, comparison, value)` conditions. There
//! is no `or`, no negation and no nesting.

use std::cmp::Ordering;
use std::fmt;

use models::{PropertyValue, TableRow};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl Comparison {
    pub fn operator(self) -> &'static str {
        match self {
            Comparison::Equal => "eq",
            Comparison::GreaterThanOrEqual => "ge",
            Comparison::LessThanOrEqual => "le",
        }
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            Comparison::Equal => ord == Ordering::Equal,
            Comparison::GreaterThanOrEqual => ord != Ordering::Less,
            Comparison::LessThanOrEqual => ord != Ordering::Greater,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterField {
    PartitionKey,
    RowKey,
    Property(String),
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterField::PartitionKey => f.write_str("PartitionKey"),
            FilterField::RowKey => f.write_str("RowKey"),
            FilterField::Property(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub field: FilterField,
    pub comparison: Comparison,
    pub value: PropertyValue,
}

impl Condition {
    pub fn partition_key(comparison: Comparison, value: &str) -> Self {
        Self { field: FilterField::PartitionKey, comparison, value: PropertyValue::from(value) }
    }

    pub fn property(name: &str, comparison: Comparison, value: impl Into<PropertyValue>) -> Self {
        Self { field: FilterField::Property(name.to_string()), comparison, value: value.into() }
    }

    /// Missing properties and type mismatches never match.
    pub fn matches(&self, row: &TableRow) -> bool {
        self.ordering(row).is_some_and(|ord| self.comparison.accepts(ord))
    }

    fn ordering(&self, row: &TableRow) -> Option<Ordering> {
        match &self.field {
            FilterField::PartitionKey => self.value.as_str().map(|v| row.partition_key.as_str().cmp(v)),
            FilterField::RowKey => self.value.as_str().map(|v| row.row_key.as_str().cmp(v)),
            FilterField::Property(name) => row.get(name).and_then(|actual| compare_values(actual, &self.value)),
        }
    }
}

fn compare_values(actual: &PropertyValue, expected: &PropertyValue) -> Option<Ordering> {
    match (actual, expected) {
        (PropertyValue::String(a), PropertyValue::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (PropertyValue::Int(a), PropertyValue::Int(b)) => Some(a.cmp(b)),
        (PropertyValue::Bool(a), PropertyValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.comparison.operator(), self.value)
    }
}

/// Inclusive partition-key range implied by a filter. `None` means unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionBounds {
    pub lower: Option<String>,
    pub upper: Option<String>,
}

impl PartitionBounds {
    /// True when no partition key can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        matches!((&self.lower, &self.upper), (Some(lo), Some(hi)) if lo > hi)
    }

    pub fn contains(&self, partition_key: &str) -> bool {
        self.lower.as_deref().map_or(true, |lo| partition_key >= lo)
            && self.upper.as_deref().map_or(true, |hi| partition_key <= hi)
    }

    fn raise_lower(&mut self, v: &str) {
        if self.lower.as_deref().map_or(true, |lo| v > lo) {
            self.lower = Some(v.to_string());
        }
    }

    fn lower_upper(&mut self, v: &str) {
        if self.upper.as_deref().map_or(true, |hi| v < hi) {
            self.upper = Some(v.to_string());
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Matches every row; a full table scan.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn matches(&self, row: &TableRow) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    pub fn partition_bounds(&self) -> PartitionBounds {
        let mut bounds = PartitionBounds::default();
        for c in self.conditions.iter().filter(|c| c.field == FilterField::PartitionKey) {
            // A non-string partition condition matches nothing; `matches` handles it.
            let Some(v) = c.value.as_str() else { continue };
            match c.comparison {
                Comparison::Equal => {
                    bounds.raise_lower(v);
                    bounds.lower_upper(v);
                }
                Comparison::GreaterThanOrEqual => bounds.raise_lower(v),
                Comparison::LessThanOrEqual => bounds.lower_upper(v),
            }
        }
        bounds
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
