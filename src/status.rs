use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::service::ScoreboardService;
use crate::shared::{AppError, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub storage_connected: bool,
    pub team_count: usize,
    pub version: String,
}

impl StatusResponse {
    pub fn connected(team_count: usize) -> Self {
        Self {
            status: "ok".to_string(),
            storage_connected: true,
            team_count,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// HTTP handler for the health check
///
/// GET /status
/// Returns 503 when the storage backend cannot be reached
#[instrument(name = "status", skip(state))]
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let service = ScoreboardService::new(
        Arc::clone(&state.repository),
        Arc::clone(&state.weights),
    );
    let status = service.status().await?;

    info!(team_count = status.team_count, "Status checked");
    Ok(Json(status))
}
