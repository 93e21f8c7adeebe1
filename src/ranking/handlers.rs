use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::types::{Scoreboard, ScoreboardQuery};
use crate::service::ScoreboardService;
use crate::shared::{AppError, AppState};

/// HTTP handler for the ranked scoreboard
///
/// GET /api/scoreboard?start=&end=&team_id=
/// Without dates teams are ranked by their running totals
#[instrument(name = "get_scoreboard", skip(state))]
pub async fn get_scoreboard(
    State(state): State<AppState>,
    Query(query): Query<ScoreboardQuery>,
) -> Result<Json<Scoreboard>, AppError> {
    let service = ScoreboardService::new(
        Arc::clone(&state.repository),
        Arc::clone(&state.weights),
    );
    let scoreboard = service.scoreboard(query).await?;

    info!(
        division_a = scoreboard.division_a.len(),
        division_b = scoreboard.division_b.len(),
        "Scoreboard served"
    );
    Ok(Json(scoreboard))
}
