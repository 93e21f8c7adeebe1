use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::types::{AnalysisRequest, AnalysisResponse, PeriodReport, PeriodReportQuery};
use crate::service::ScoreboardService;
use crate::shared::{AppError, AppState};

/// HTTP handler for the period report listing
///
/// GET /api/reports/period?start=&end=&team_id=
#[instrument(name = "period_report", skip(state))]
pub async fn period_report(
    State(state): State<AppState>,
    Query(query): Query<PeriodReportQuery>,
) -> Result<Json<PeriodReport>, AppError> {
    let service = ScoreboardService::new(
        Arc::clone(&state.repository),
        Arc::clone(&state.weights),
    );
    let report = service
        .period_report(query.start, query.end, query.team_id)
        .await?;

    info!(record_count = report.record_count, "Period report served");
    Ok(Json(report))
}

/// HTTP handler for the rule-based analysis
///
/// POST /api/reports/analysis
#[instrument(name = "generate_analysis", skip(state))]
pub async fn generate_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let service = ScoreboardService::new(
        Arc::clone(&state.repository),
        Arc::clone(&state.weights),
    );
    let report = service.analysis(request).await?;

    Ok(Json(report.into()))
}
