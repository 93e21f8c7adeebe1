// Public API - what other modules can use
pub use analysis::{
    AnalysisKind, AnalysisReport, CategoryLeader, ComparativeSection, GeneralRecommendation,
    Medal, RankingRow, TeamAnalysis,
};
pub use handlers::{generate_analysis, period_report};
pub use metrics::{aggregate, TeamMetrics};

// Internal modules
pub mod analysis;
mod handlers;
pub mod metrics;
pub mod types;
