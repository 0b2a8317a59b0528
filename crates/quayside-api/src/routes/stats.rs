//! Operational reporting routes

use axum::{Json, Router, extract::State, routing::get};

use quayside_db::{CustomsRow, PortStats, ScheduleRow};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/stats - queue length, berth occupancy and efficiency
async fn port_stats(State(state): State<AppState>) -> Result<Json<PortStats>, ApiError> {
    let stats = state.db.port_stats().await?;
    Ok(Json(stats))
}

/// GET /api/v1/alfandega - recent customs clearance states
async fn customs_report(State(state): State<AppState>) -> Result<Json<Vec<CustomsRow>>, ApiError> {
    let rows = state.db.customs_report(50).await?;
    Ok(Json(rows))
}

/// GET /api/v1/cronograma - today's berth schedule
async fn berth_schedule(State(state): State<AppState>) -> Result<Json<Vec<ScheduleRow>>, ApiError> {
    let rows = state.db.berth_schedule().await?;
    Ok(Json(rows))
}

/// Create reporting routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/stats", get(port_stats))
        .route("/api/v1/alfandega", get(customs_report))
        .route("/api/v1/cronograma", get(berth_schedule))
}
