use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::IntoEnumIterator;

use super::counters::{Counter, CounterSet};
use super::weights::WeightTable;

/// Largest score a single record may carry
pub const MAX_RECORD_SCORE: i64 = 1_000_000_000_000_000;

/// Weighted linear sum of every counter, truncated toward zero.
///
/// Inputs are not validated here; negative counters contribute negatively.
/// Sums beyond the `i64` range saturate at its bounds.
pub fn compute_score(counters: &CounterSet, weights: &WeightTable) -> i64 {
    let total: f64 = Counter::iter()
        .map(|counter| counters.value(counter) * weights.weight(counter))
        .sum();
    total.trunc() as i64
}

/// One counter's share of a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub counter: Counter,
    pub value: f64,
    pub weight: f64,
    pub points: f64,
}

/// Itemized view of how a score was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub lines: Vec<ScoreLine>,
    pub total: i64,
}

impl ScoreBreakdown {
    pub fn new(counters: &CounterSet, weights: &WeightTable) -> Self {
        let lines = Counter::iter()
            .filter_map(|counter| {
                let value = counters.value(counter);
                let weight = weights.weight(counter);
                if value == 0.0 || weight == 0.0 {
                    return None;
                }
                Some(ScoreLine {
                    counter,
                    value,
                    weight,
                    points: value * weight,
                })
            })
            .collect();

        Self {
            lines,
            total: compute_score(counters, weights),
        }
    }
}

/// Scores activity reports against a shared weight table.
#[derive(Debug, Clone)]
pub struct WeightedScoreCalculator {
    weights: Arc<WeightTable>,
}

impl WeightedScoreCalculator {
    pub fn new(weights: Arc<WeightTable>) -> Self {
        Self { weights }
    }

    pub fn calculate(&self, counters: &CounterSet) -> i64 {
        compute_score(counters, &self.weights)
    }

    pub fn breakdown(&self, counters: &CounterSet) -> ScoreBreakdown {
        ScoreBreakdown::new(counters, &self.weights)
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }
}
