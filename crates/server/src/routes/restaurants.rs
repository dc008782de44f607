use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use models::{EntityKey, RestaurantRecord, SearchResults};
use serde::{Deserialize, Serialize};
use service::errors::ServiceError;
use tracing::{debug, info};

use crate::{errors::JsonApiError, metrics, state::ServerState};

/// Table keys may be empty but never absent; missing key fields become "".
pub fn key_or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Records the outcome of a search in metrics and wraps it for the response.
fn finish(operation: &str, result: Result<Vec<RestaurantRecord>, ServiceError>) -> Result<Json<SearchResults>, JsonApiError> {
    match result {
        Ok(found) => {
            metrics::record_results(found.len());
            info!(operation, count = found.len(), "search completed");
            Ok(Json(SearchResults::from(found)))
        }
        Err(e) => {
            metrics::record_failure(operation);
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ByIdQuery {
    pub city_state: Option<String>,
    pub restaurant_id: Option<String>,
}

#[utoipa::path(
    get, path = "/api/restaurants/search/by-id", tag = "restaurants",
    params(ByIdQuery),
    responses((status = 200, description = "Zero or one restaurant", body = crate::openapi::SearchResultsDoc))
)]
pub async fn search_by_id(
    State(state): State<ServerState>,
    Query(q): Query<ByIdQuery>,
) -> Result<Json<SearchResults>, JsonApiError> {
    let _timer = metrics::start("search_by_id");
    let city_state = key_or_empty(q.city_state);
    let restaurant_id = key_or_empty(q.restaurant_id);
    let result = state
        .restaurants
        .get_by_key(&city_state, &restaurant_id)
        .await
        .map(|found| found.into_iter().collect());
    finish("search_by_id", result)
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ByZipQuery {
    pub city_state: Option<String>,
    /// Accepted for form compatibility; the search does not use it.
    pub address: Option<String>,
    pub zip_code: Option<String>,
}

#[utoipa::path(
    get, path = "/api/restaurants/search/by-zip", tag = "restaurants",
    params(ByZipQuery),
    responses((status = 200, description = "Restaurants in the city with the zip code", body = crate::openapi::SearchResultsDoc))
)]
pub async fn search_by_zip(
    State(state): State<ServerState>,
    Query(q): Query<ByZipQuery>,
) -> Result<Json<SearchResults>, JsonApiError> {
    let _timer = metrics::start("search_by_zip");
    let ByZipQuery { city_state, address: _address, zip_code } = q;
    let city_state = key_or_empty(city_state);
    let zip_code = zip_code.unwrap_or_default();
    finish("search_by_zip", state.restaurants.search_by_city_state_and_zip(&city_state, &zip_code).await)
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ByHealthQuery {
    pub state: Option<String>,
    /// Minimum rating; anything that is not an integer yields no results.
    pub health_rating: Option<String>,
}

#[utoipa::path(
    get, path = "/api/restaurants/search/by-health", tag = "restaurants",
    params(ByHealthQuery),
    responses((status = 200, description = "Restaurants in the state at or above the rating", body = crate::openapi::SearchResultsDoc))
)]
pub async fn search_by_health(
    State(state): State<ServerState>,
    Query(q): Query<ByHealthQuery>,
) -> Result<Json<SearchResults>, JsonApiError> {
    let _timer = metrics::start("search_by_health");
    let Some(min_rating) = q.health_rating.as_deref().and_then(|r| r.trim().parse::<i32>().ok()) else {
        debug!(health_rating = ?q.health_rating, "non-numeric health rating; returning no results");
        return Ok(Json(SearchResults::empty()));
    };
    let us_state = q.state.unwrap_or_default();
    finish(
        "search_by_health",
        state.restaurants.list_by_partition_range_and_minimum(&us_state, min_rating).await,
    )
}

#[utoipa::path(
    get, path = "/api/restaurants/search/gorditas", tag = "restaurants",
    responses((status = 200, description = "Restaurants serving gorditas", body = crate::openapi::SearchResultsDoc))
)]
pub async fn search_gorditas(State(state): State<ServerState>) -> Result<Json<SearchResults>, JsonApiError> {
    let _timer = metrics::start("search_gorditas");
    finish("search_gorditas", state.restaurants.has_gorditas().await)
}

#[utoipa::path(
    get, path = "/api/restaurant/{city_state}/{restaurant_id}", tag = "restaurants",
    params(("city_state" = String, Path, description = "Partition key, e.g. tn_knoxville"),
           ("restaurant_id" = String, Path, description = "Row key")),
    responses(
        (status = 200, description = "Restaurant", body = crate::openapi::RestaurantDoc),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_restaurant(
    State(state): State<ServerState>,
    Path((city_state, restaurant_id)): Path<(String, String)>,
) -> Result<Json<RestaurantRecord>, JsonApiError> {
    let _timer = metrics::start("get_restaurant");
    match state.restaurants.get_by_key(&city_state, &restaurant_id).await {
        Ok(Some(found)) => Ok(Json(found)),
        Ok(None) => Err(JsonApiError::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            Some(format!("restaurant {city_state}/{restaurant_id} not found")),
        )),
        Err(e) => {
            metrics::record_failure("get_restaurant");
            Err(e.into())
        }
    }
}

/// Restaurant edit form. Absent fields take their empty/zero value.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantForm {
    pub city: Option<String>,
    pub state: Option<String>,
    pub restaurant_id: Option<String>,
    pub address: Option<String>,
    pub zip_code: Option<String>,
    pub health_rating: Option<i32>,
    pub has_gorditas: Option<bool>,
}

impl RestaurantForm {
    pub fn into_record(self) -> RestaurantRecord {
        RestaurantRecord::with_details(
            &key_or_empty(self.city),
            &key_or_empty(self.state),
            &key_or_empty(self.restaurant_id),
            &self.address.unwrap_or_default(),
            &self.zip_code.unwrap_or_default(),
            self.health_rating.unwrap_or_default(),
            self.has_gorditas.unwrap_or_default(),
        )
    }
}

#[utoipa::path(
    post, path = "/api/restaurants/update", tag = "restaurants",
    request_body = crate::openapi::RestaurantFormDoc,
    responses(
        (status = 200, description = "Replaced"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Update Failed")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Json(form): Json<RestaurantForm>,
) -> Result<Json<RestaurantRecord>, JsonApiError> {
    let _timer = metrics::start("update");
    let record = form.into_record();
    match state.restaurants.replace(record.clone()).await {
        Ok(()) => Ok(Json(record)),
        Err(e) => {
            metrics::record_failure("update");
            Err(e.into())
        }
    }
}

/// Identifies a restaurant to delete; only the keys are read.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyForm {
    pub partition_key: Option<String>,
    pub row_key: Option<String>,
}

#[utoipa::path(
    post, path = "/api/restaurants/delete", tag = "restaurants",
    request_body = crate::openapi::KeyFormDoc,
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Json(form): Json<KeyForm>,
) -> Result<StatusCode, JsonApiError> {
    let _timer = metrics::start("delete");
    let key = EntityKey::new(key_or_empty(form.partition_key), key_or_empty(form.row_key));
    match state.restaurants.delete_by_key(&key).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            metrics::record_failure("delete");
            Err(e.into())
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeOutput {
    pub written: usize,
}

#[utoipa::path(
    post, path = "/api/restaurantdata/initialize", tag = "restaurants",
    responses((status = 200, description = "Fixture data written"), (status = 500, description = "Seeding Failed"))
)]
pub async fn initialize(State(state): State<ServerState>) -> Result<Json<InitializeOutput>, JsonApiError> {
    let _timer = metrics::start("initialize");
    match state.restaurants.seed_fixture_data().await {
        Ok(written) => Ok(Json(InitializeOutput { written })),
        Err(e) => {
            metrics::record_failure("initialize");
            Err(e.into())
        }
    }
}
