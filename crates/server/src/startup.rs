use std::net::SocketAddr;

use axum::Router;
use configs::{AppConfig, ServerConfig, StorageConfig};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;
use service::restaurant::RestaurantLookupService;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address {}:{}: {e}", server.host, server.port)))
}

/// Connects to table storage and optionally loads the fixture restaurants.
///
/// A connection string that cannot be parsed or opened is fatal.
pub async fn build_state(storage: &StorageConfig) -> Result<ServerState, StartupError> {
    let restaurants = match RestaurantLookupService::connect(storage).await {
        Ok(svc) => svc,
        Err(e) => {
            error!(error = %e, table = %storage.table_name, "storage connection failed");
            return Err(StartupError::Backend(e));
        }
    };
    if storage.seed_on_startup {
        let written = restaurants.seed_fixture_data().await?;
        info!(written, "seeded fixture restaurants on startup");
    }
    Ok(ServerState::new(restaurants))
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

/// Public entry: build the app and run the HTTP server
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&config.storage).await?;
    let app = build_app(state);

    let addr = bind_addr(&config.server)?;
    info!(%addr, table = %config.storage.table_name, "starting restaurant lookup server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_bad_host() {
        let server = ServerConfig { host: "not a host".into(), port: 8080, worker_threads: None };
        assert!(matches!(bind_addr(&server), Err(StartupError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn malformed_connection_string_is_fatal() {
        let storage = StorageConfig { connection_string: "garbage".into(), ..Default::default() };
        let err = build_state(&storage).await.err().unwrap();
        assert!(err.to_string().contains("Could not connect to the cloud storage account"));
    }

    #[tokio::test]
    async fn development_storage_can_seed_on_startup() {
        let storage = StorageConfig {
            connection_string: "UseDevelopmentStorage=true".into(),
            seed_on_startup: true,
            ..Default::default()
        };
        let state = build_state(&storage).await.unwrap();
        assert_eq!(state.restaurants.has_gorditas().await.unwrap().len(), 5);
    }
}
