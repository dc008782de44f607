use serde::Serialize;

use crate::restaurant::RestaurantRecord;

/// All restaurants that match a search.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub restaurants: Vec<RestaurantRecord>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }
}

impl From<Vec<RestaurantRecord>> for SearchResults {
    fn from(restaurants: Vec<RestaurantRecord>) -> Self {
        Self { restaurants }
    }
}

impl From<Option<RestaurantRecord>> for SearchResults {
    fn from(found: Option<RestaurantRecord>) -> Self {
        Self { restaurants: found.into_iter().collect() }
    }
}
