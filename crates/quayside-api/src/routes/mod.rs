//! API routes

mod berths;
mod health;
pub mod metrics;
mod stats;

use axum::Router;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Berth occupancy + operational reporting
        .merge(berths::routes())
        .merge(stats::routes())
        .with_state(state);

    // Add metrics endpoint if a handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
