pub mod calculator;
pub mod counters;
mod handlers;
pub mod weights;

pub use calculator::{
    compute_score, ScoreBreakdown, ScoreLine, WeightedScoreCalculator, MAX_RECORD_SCORE,
};
pub use counters::{Counter, CounterSet, MAX_COUNTER_VALUE};
pub use handlers::get_weights;
pub use weights::{ScoringPolicy, WeightTable, WeightsError};
