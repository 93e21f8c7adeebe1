use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::TeamModel,
    types::{CreateTeamRequest, TeamDetails, TeamHistory, UpdateTeamRequest},
};
use crate::service::ScoreboardService;
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> ScoreboardService {
    ScoreboardService::new(Arc::clone(&state.repository), Arc::clone(&state.weights))
}

/// HTTP handler for registering a team
///
/// POST /api/teams
/// Returns the stored team with its assigned id
#[instrument(name = "create_team", skip(state))]
pub async fn create_team(
    State(state): State<AppState>,
    Json(request): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamModel>), AppError> {
    let team = service(&state).register_team(request).await?;

    info!(team_id = team.id, "Team created");
    Ok((StatusCode::CREATED, Json(team)))
}

/// GET /api/teams/:id
#[instrument(name = "get_team", skip(state))]
pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> Result<Json<TeamDetails>, AppError> {
    let details = service(&state).get_team(team_id).await?;
    Ok(Json(details))
}

/// PUT /api/teams/:id
#[instrument(name = "update_team", skip(state))]
pub async fn update_team(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
    Json(request): Json<UpdateTeamRequest>,
) -> Result<Json<TeamModel>, AppError> {
    let team = service(&state).update_team(team_id, request).await?;
    Ok(Json(team))
}

/// HTTP handler for deleting a team and every record it owns
///
/// DELETE /api/teams/:id
#[instrument(name = "delete_team", skip(state))]
pub async fn delete_team(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service(&state).delete_team(team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/teams/:id/history
#[instrument(name = "team_history", skip(state))]
pub async fn team_history(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> Result<Json<TeamHistory>, AppError> {
    let history = service(&state).team_history(team_id).await?;

    info!(team_id, record_count = history.records.len(), "Team history served");
    Ok(Json(history))
}
