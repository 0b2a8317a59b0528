//! Quayside REST API
//!
//! This crate provides the Axum-based HTTP API for the port monitor:
//! health checks, the berth occupancy endpoint consumed by the crane view,
//! operational statistics and Prometheus metrics.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
