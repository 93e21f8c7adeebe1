// Library crate for the team scoreboard service
// This file exposes the public API for the binary and integration tests

pub mod activity;
pub mod config;
pub mod ranking;
pub mod report;
pub mod repository;
pub mod scoring;
pub mod service;
pub mod shared;
pub mod status;
pub mod team;

use axum::{
    routing::{get, post},
    Router,
};

// Re-export commonly used types for easier access in tests
pub use config::{Config, StorageBackend};
pub use ranking::{rank, Division, PeriodFilter, RankedTeam};
pub use repository::{InMemoryScoreboardRepository, ScoreboardRepository};
pub use scoring::{compute_score, Counter, CounterSet, ScoringPolicy, WeightTable};
pub use service::ScoreboardService;
pub use shared::{AppError, AppState};

/// Builds the HTTP router over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status::status))
        .route("/api/scoreboard", get(ranking::get_scoreboard))
        .route("/api/scoring/weights", get(scoring::get_weights))
        .route("/api/teams", post(team::create_team))
        .route(
            "/api/teams/:id",
            get(team::get_team)
                .put(team::update_team)
                .delete(team::delete_team),
        )
        .route("/api/teams/:id/history", get(team::team_history))
        .route("/api/records", post(activity::log_activity))
        .route(
            "/api/records/:id",
            get(activity::get_activity)
                .put(activity::edit_activity)
                .delete(activity::delete_activity),
        )
        .route("/api/reports/period", get(report::period_report))
        .route("/api/reports/analysis", post(report::generate_analysis))
        .with_state(state)
}
