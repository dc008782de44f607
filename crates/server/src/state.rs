use std::sync::Arc;

use service::restaurant::RestaurantLookupService;

/// Shared handler state. Cloning only bumps the service's reference count.
#[derive(Clone)]
pub struct ServerState {
    pub restaurants: Arc<RestaurantLookupService>,
}

impl ServerState {
    pub fn new(restaurants: RestaurantLookupService) -> Self {
        Self { restaurants: Arc::new(restaurants) }
    }
}
