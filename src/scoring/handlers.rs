use axum::{extract::State, Json};
use tracing::instrument;

use super::WeightTable;
use crate::shared::AppState;

/// GET /api/scoring/weights
#[instrument(name = "get_weights", skip(state))]
pub async fn get_weights(State(state): State<AppState>) -> Json<WeightTable> {
    Json(state.weights.as_ref().clone())
}
