use serde::Deserialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RestaurantDoc {
    pub partition_key: String,
    pub row_key: String,
    pub restaurant_id: String,
    pub address: String,
    pub zip_code: String,
    pub health_rating: i32,
    pub has_gorditas: bool,
    pub city: String,
    pub state: String,
}

#[derive(ToSchema)]
pub struct SearchResultsDoc { pub restaurants: Vec<RestaurantDoc> }

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantFormDoc {
    pub city: Option<String>,
    pub state: Option<String>,
    pub restaurant_id: Option<String>,
    pub address: Option<String>,
    pub zip_code: Option<String>,
    pub health_rating: Option<i32>,
    pub has_gorditas: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyFormDoc {
    pub partition_key: Option<String>,
    pub row_key: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::restaurants::search_by_id,
        crate::routes::restaurants::search_by_zip,
        crate::routes::restaurants::search_by_health,
        crate::routes::restaurants::search_gorditas,
        crate::routes::restaurants::get_restaurant,
        crate::routes::restaurants::update,
        crate::routes::restaurants::delete,
        crate::routes::restaurants::initialize,
    ),
    components(
        schemas(
            HealthResponse,
            RestaurantDoc,
            SearchResultsDoc,
            RestaurantFormDoc,
            KeyFormDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "restaurants")
    )
)]
pub struct ApiDoc;
