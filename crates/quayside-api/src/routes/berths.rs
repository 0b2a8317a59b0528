//! Berth occupancy endpoint
//!
//! `GET /api/v1/estado-cais` is the endpoint the crane view polls every few
//! seconds. The rows come back ordered by berth id so clients can map them
//! onto crane indices without guessing.

use axum::{Json, Router, extract::State, routing::get};

use quayside_db::BerthState;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/estado-cais
async fn estado_cais(State(state): State<AppState>) -> Result<Json<Vec<BerthState>>, ApiError> {
    let states = state.db.berth_states().await?;
    Ok(Json(states))
}

/// Create berth routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/estado-cais", get(estado_cais))
}
