use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::CounterSet;

/// Database model for activity_records table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecordModel {
    pub id: i64,
    pub team_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(flatten)]
    pub counters: CounterSet,
    pub score: i64, // Computed once on create/edit, never recomputed implicitly
    pub created_at: DateTime<Utc>,
}

impl ActivityRecordModel {
    /// Whether the record's start date falls inside `[start, end]`.
    /// The record's own end date is not considered.
    pub fn starts_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.period_start >= start && self.period_start <= end
    }

    /// Whether the whole reporting period lies inside `[start, end]`
    pub fn spans_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.period_start >= start && self.period_end <= end
    }
}

/// Fields of a record about to be stored; the repository assigns id and created_at
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityRecord {
    pub team_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub counters: CounterSet,
    pub score: i64,
}

impl NewActivityRecord {
    pub fn into_model(self, id: i64) -> ActivityRecordModel {
        ActivityRecordModel {
            id,
            team_id: self.team_id,
            period_start: self.period_start,
            period_end: self.period_end,
            counters: self.counters,
            score: self.score,
            created_at: Utc::now(),
        }
    }
}
