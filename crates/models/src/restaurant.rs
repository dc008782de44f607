use serde::Serialize;

use crate::errors::ModelError;
use crate::table::{EntityKey, PropertyValue, TableRow};

pub const ADDRESS: &str = "Address";
pub const ZIPCODE: &str = "Zipcode";
pub const HEALTH_RATING: &str = "HealthRating";
pub const HAS_GORDITAS: &str = "HasGorditas";
pub const CITY: &str = "City";
pub const STATE: &str = "State";
pub const RESTAURANT_ID: &str = "RestaurantId";

/// Partition key for a city/state pair: `lowercase(state) + "_" + lowercase(city)`.
///
/// Every restaurant in one city shares a partition, and all partitions of a
/// state sort next to each other. State range scans depend on this exact shape,
/// so keys must never be assembled any other way.
pub fn partition_key_for(city: &str, state: &str) -> String {
    format!("{state}_{city}").to_lowercase()
}

/// A single restaurant as stored in the restaurants table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RestaurantRecord {
    partition_key: String,
    pub row_key: String,
    pub restaurant_id: String,
    pub address: String,
    pub zip_code: String,
    pub health_rating: i32,
    pub has_gorditas: bool,
    pub city: String,
    pub state: String,
}

impl RestaurantRecord {
    /// Builds a record keyed by city/state and restaurant id; other fields start empty.
    pub fn new(city: &str, state: &str, restaurant_id: &str) -> Self {
        Self {
            partition_key: partition_key_for(city, state),
            row_key: restaurant_id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            address: String::new(),
            zip_code: String::new(),
            health_rating: 0,
            has_gorditas: false,
            city: city.to_string(),
            state: state.to_string(),
        }
    }

    pub fn with_details(
        city: &str,
        state: &str,
        restaurant_id: &str,
        address: &str,
        zip_code: &str,
        health_rating: i32,
        has_gorditas: bool,
    ) -> Self {
        Self {
            address: address.to_string(),
            zip_code: zip_code.to_string(),
            health_rating,
            has_gorditas,
            ..Self::new(city, state, restaurant_id)
        }
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.partition_key.clone(), self.row_key.clone())
    }
}

impl From<RestaurantRecord> for TableRow {
    fn from(r: RestaurantRecord) -> Self {
        TableRow::new(r.partition_key, r.row_key)
            .with(ADDRESS, r.address)
            .with(ZIPCODE, r.zip_code)
            .with(HEALTH_RATING, r.health_rating)
            .with(HAS_GORDITAS, r.has_gorditas)
            .with(CITY, r.city)
            .with(STATE, r.state)
            .with(RESTAURANT_ID, r.restaurant_id)
    }
}

impl TryFrom<TableRow> for RestaurantRecord {
    type Error = ModelError;

    fn try_from(mut row: TableRow) -> Result<Self, Self::Error> {
        let mut take = |name: &'static str| {
            row.properties.remove(name).ok_or_else(|| ModelError::MissingProperty {
                partition_key: row.partition_key.clone(),
                row_key: row.row_key.clone(),
                property: name,
            })
        };
        let address = expect_string(ADDRESS, take(ADDRESS)?)?;
        let zip_code = expect_string(ZIPCODE, take(ZIPCODE)?)?;
        let health_rating = expect_int(HEALTH_RATING, take(HEALTH_RATING)?)?;
        let has_gorditas = expect_bool(HAS_GORDITAS, take(HAS_GORDITAS)?)?;
        let city = expect_string(CITY, take(CITY)?)?;
        let state = expect_string(STATE, take(STATE)?)?;
        // Rows written before RestaurantId was stored fall back to the row key.
        let restaurant_id = match row.properties.remove(RESTAURANT_ID) {
            Some(v) => expect_string(RESTAURANT_ID, v)?,
            None => row.row_key.clone(),
        };
        Ok(Self {
            partition_key: row.partition_key,
            row_key: row.row_key,
            restaurant_id,
            address,
            zip_code,
            health_rating,
            has_gorditas,
            city,
            state,
        })
    }
}

fn mismatch(property: &'static str, expected: &'static str, found: &PropertyValue) -> ModelError {
    ModelError::PropertyType { property, expected, found: found.type_name() }
}

fn expect_string(property: &'static str, v: PropertyValue) -> Result<String, ModelError> {
    match v {
        PropertyValue::String(s) => Ok(s),
        other => Err(mismatch(property, "string", &other)),
    }
}

fn expect_int(property: &'static str, v: PropertyValue) -> Result<i32, ModelError> {
    v.as_i32().ok_or_else(|| mismatch(property, "int", &v))
}

fn expect_bool(property: &'static str, v: PropertyValue) -> Result<bool, ModelError> {
    v.as_bool().ok_or_else(|| mismatch(property, "bool", &v))
}
