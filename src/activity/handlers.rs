use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::ActivityRecordModel,
    types::{ActivityOutcome, EditActivityRequest, LogActivityRequest},
};
use crate::service::ScoreboardService;
use crate::shared::{AppError, AppState};
use crate::team::models::TeamModel;

fn service(state: &AppState) -> ScoreboardService {
    ScoreboardService::new(Arc::clone(&state.repository), Arc::clone(&state.weights))
}

/// HTTP handler for logging an activity report
///
/// POST /api/records
/// Scores the report, stores it and raises the team total
#[instrument(name = "log_activity", skip(state))]
pub async fn log_activity(
    State(state): State<AppState>,
    Json(request): Json<LogActivityRequest>,
) -> Result<(StatusCode, Json<ActivityOutcome>), AppError> {
    info!(team_id = request.team_id, "Logging activity");

    let outcome = service(&state).log_activity(request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/records/:id
#[instrument(name = "get_activity", skip(state))]
pub async fn get_activity(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> Result<Json<ActivityRecordModel>, AppError> {
    let record = service(&state).get_activity(record_id).await?;
    Ok(Json(record))
}

/// PUT /api/records/:id
#[instrument(name = "edit_activity", skip(state))]
pub async fn edit_activity(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    Json(request): Json<EditActivityRequest>,
) -> Result<Json<ActivityOutcome>, AppError> {
    let outcome = service(&state).edit_activity(record_id, request).await?;
    Ok(Json(outcome))
}

/// HTTP handler for deleting a record
///
/// DELETE /api/records/:id
/// Returns the owning team with its reduced total
#[instrument(name = "delete_activity", skip(state))]
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> Result<Json<TeamModel>, AppError> {
    let team = service(&state).delete_activity(record_id).await?;
    Ok(Json(team))
}
