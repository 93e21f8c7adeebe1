use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::repository::ScoreboardRepository;
use crate::scoring::WeightTable;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ScoreboardRepository + Send + Sync>,
    pub weights: Arc<WeightTable>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn ScoreboardRepository + Send + Sync>,
        weights: Arc<WeightTable>,
    ) -> Self {
        Self {
            repository,
            weights,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Rejects a date range whose start comes after its end
    pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }
        Ok(())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidRange { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::StorageUnavailable(msg) => {
                tracing::error!(error = %msg, "Storage unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage is currently unavailable".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
