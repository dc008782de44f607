use std::net::SocketAddr;

use configs::StorageConfig;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use server::startup::{build_app, build_state};

struct TestApp {
    base_url: String,
    client: reqwest::Client,
}

impl TestApp {
    async fn get(&self, path: &str) -> (HttpStatusCode, Value) {
        let res = self.client.get(format!("{}{}", self.base_url, path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> (HttpStatusCode, Value) {
        let res = self.client.post(format!("{}{}", self.base_url, path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn count(&self, path: &str) -> usize {
        let (status, body) = self.get(path).await;
        assert_eq!(status, HttpStatusCode::OK, "GET {path}");
        body["restaurants"].as_array().map(Vec::len).unwrap_or_default()
    }
}

async fn start_server(connection_string: &str, seed: bool) -> anyhow::Result<TestApp> {
    let storage = StorageConfig {
        connection_string: connection_string.to_string(),
        seed_on_startup: seed,
        ..Default::default()
    };
    let app = build_app(build_state(&storage).await?);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url, client: reqwest::Client::new() })
}

async fn seeded() -> TestApp {
    start_server("UseDevelopmentStorage=true", true).await.unwrap()
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = seeded().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, HttpStatusCode::OK);
    assert!(body["paths"].get("/api/restaurants/search/by-health").is_some());
}

#[tokio::test]
async fn search_by_id_finds_one_or_nothing() {
    let app = seeded().await;
    let (_, body) = app.get("/api/restaurants/search/by-id?cityState=tn_knoxville&restaurantId=00119").await;
    let found = body["restaurants"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["address"], "27 Cumberland Blvd");
    assert_eq!(found[0]["health_rating"], 88);

    assert_eq!(app.count("/api/restaurants/search/by-id?cityState=tn_knoxville").await, 0);
    assert_eq!(app.count("/api/restaurants/search/by-id").await, 0);
}

#[tokio::test]
async fn search_by_zip_stays_in_the_city() {
    let app = seeded().await;
    assert_eq!(app.count("/api/restaurants/search/by-zip?cityState=tn_knoxville&zipCode=37996").await, 1);
    assert_eq!(app.count("/api/restaurants/search/by-zip?cityState=tn_charleston&zipCode=37996").await, 1);
    assert_eq!(app.count("/api/restaurants/search/by-zip?cityState=tn_memphis&zipCode=37996").await, 0);
}

#[tokio::test]
async fn search_by_health_covers_the_state() {
    let app = seeded().await;
    assert_eq!(app.count("/api/restaurants/search/by-health?state=TN&healthRating=90").await, 5);
    assert_eq!(app.count("/api/restaurants/search/by-health?state=tn&healthRating=0").await, 7);
    assert_eq!(app.count("/api/restaurants/search/by-health?state=AL&healthRating=90").await, 0);
    assert_eq!(app.count("/api/restaurants/search/by-health?state=TN&healthRating=ninety").await, 0);
}

#[tokio::test]
async fn gorditas_scan_spans_every_partition() {
    let app = seeded().await;
    assert_eq!(app.count("/api/restaurants/search/gorditas").await, 5);
}

#[tokio::test]
async fn update_replaces_existing_and_rejects_missing() {
    let app = seeded().await;
    let (status, body) = app
        .post(
            "/api/restaurants/update",
            json!({ "city": "Knoxville", "state": "TN", "restaurantId": "00128", "address": "1 New Road",
                    "zipCode": "37994", "healthRating": 99, "hasGorditas": true }),
        )
        .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["health_rating"], 99);

    let (status, body) = app.get("/api/restaurant/tn_knoxville/00128").await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["address"], "1 New Road");
    assert_eq!(body["has_gorditas"], true);
    assert_eq!(app.count("/api/restaurants/search/gorditas").await, 6);

    let (status, body) = app
        .post("/api/restaurants/update", json!({ "city": "Memphis", "state": "TN", "restaurantId": "1" }))
        .await;
    assert_eq!(status, HttpStatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn delete_removes_then_reports_missing() {
    let app = seeded().await;
    let key = json!({ "partitionKey": "tn_chattanooga", "rowKey": "00019" });
    let (status, _) = app.post("/api/restaurants/delete", key.clone()).await;
    assert_eq!(status, HttpStatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/restaurant/tn_chattanooga/00019").await;
    assert_eq!(status, HttpStatusCode::NOT_FOUND);

    let (status, _) = app.post("/api/restaurants/delete", key).await;
    assert_eq!(status, HttpStatusCode::NOT_FOUND);
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let app = start_server("UseDevelopmentStorage=true", false).await.unwrap();
    assert_eq!(app.count("/api/restaurants/search/gorditas").await, 0);

    for _ in 0..2 {
        let (status, body) = app.post("/api/restaurantdata/initialize", json!({})).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["written"], 8);
    }
    assert_eq!(app.count("/api/restaurants/search/gorditas").await, 5);
}

#[tokio::test]
async fn data_directory_survives_restart() {
    let dir = format!("target/test-data/{}", Uuid::new_v4());
    let conn = format!("DataDirectory={dir};MaxSegmentSize=2");

    let first = start_server(&conn, true).await.unwrap();
    let (status, _) = first
        .post("/api/restaurants/delete", json!({ "partitionKey": "al_birmingham", "rowKey": "92763" }))
        .await;
    assert_eq!(status, HttpStatusCode::NO_CONTENT);

    let second = start_server(&conn, false).await.unwrap();
    assert_eq!(second.count("/api/restaurants/search/gorditas").await, 4);
    assert_eq!(second.count("/api/restaurants/search/by-health?state=TN&healthRating=0").await, 7);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn metrics_count_lookups() {
    let app = seeded().await;
    app.count("/api/restaurants/search/gorditas").await;
    let text = app.client.get(format!("{}/metrics", app.base_url)).send().await.unwrap().text().await.unwrap();
    assert!(text.contains("restaurant_lookup_requests_total"));
}

#[tokio::test]
async fn unusable_connection_string_fails_startup() {
    assert!(start_server("garbage", false).await.is_err());
    assert!(start_server("UseDevelopmentStorage=true;DataDirectory=x", false).await.is_err());
}
