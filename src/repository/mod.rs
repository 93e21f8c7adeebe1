use async_trait::async_trait;
use chrono::NaiveDate;

use crate::activity::models::{ActivityRecordModel, NewActivityRecord};
use crate::shared::AppError;
use crate::team::models::{NewTeam, TeamModel};

mod hosted;
mod in_memory;
mod postgres;

pub use hosted::{HostedTableConfig, HostedTableRepository};
pub use in_memory::InMemoryScoreboardRepository;
pub use postgres::PostgresScoreboardRepository;

/// How a record's reporting period is matched against a date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodMatch {
    /// Record start date lies in the range; the end date is ignored
    StartWithin,
    /// Record starts on or after the range start and ends on or before the range end
    SpanWithin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub matching: PeriodMatch,
}

/// Filter for listing activity records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub team_id: Option<i64>,
    pub period: Option<PeriodQuery>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_team(team_id: i64) -> Self {
        Self {
            team_id: Some(team_id),
            period: None,
        }
    }

    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate, matching: PeriodMatch) -> Self {
        self.period = Some(PeriodQuery {
            start,
            end,
            matching,
        });
        self
    }

    pub fn matches(&self, record: &ActivityRecordModel) -> bool {
        if let Some(team_id) = self.team_id {
            if record.team_id != team_id {
                return false;
            }
        }
        match self.period {
            Some(PeriodQuery {
                start,
                end,
                matching: PeriodMatch::StartWithin,
            }) => record.starts_within(start, end),
            Some(PeriodQuery {
                start,
                end,
                matching: PeriodMatch::SpanWithin,
            }) => record.spans_within(start, end),
            None => true,
        }
    }
}

/// Storage contract for teams and their activity records.
///
/// Every backend must round-trip all fields, including the stored `score`.
#[async_trait]
pub trait ScoreboardRepository {
    async fn create_team(&self, team: NewTeam) -> Result<TeamModel, AppError>;
    async fn get_team(&self, team_id: i64) -> Result<Option<TeamModel>, AppError>;
    async fn list_teams(&self) -> Result<Vec<TeamModel>, AppError>;

    /// Writes the team's name, logo and update time. The running total is left
    /// to `adjust_team_score`; the stored team is returned.
    async fn update_team(&self, team: &TeamModel) -> Result<TeamModel, AppError>;

    /// Removes the team together with all of its records
    async fn delete_team(&self, team_id: i64) -> Result<(), AppError>;

    /// Adds `delta` to the team's running total, flooring the result at zero
    async fn adjust_team_score(&self, team_id: i64, delta: i64) -> Result<TeamModel, AppError>;

    async fn create_record(&self, record: NewActivityRecord)
        -> Result<ActivityRecordModel, AppError>;
    async fn get_record(&self, record_id: i64) -> Result<Option<ActivityRecordModel>, AppError>;
    async fn update_record(&self, record: &ActivityRecordModel) -> Result<(), AppError>;
    async fn delete_record(&self, record_id: i64) -> Result<(), AppError>;

    /// Records matching the filter, newest first
    async fn list_records(&self, filter: &RecordFilter)
        -> Result<Vec<ActivityRecordModel>, AppError>;

    /// Checks that the backing store is reachable
    async fn ping(&self) -> Result<(), AppError>;
}

/// Orders records newest first, falling back to id for identical timestamps
pub(crate) fn sort_newest_first(records: &mut [ActivityRecordModel]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::CounterSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(id: i64, team_id: i64, start: NaiveDate, end: NaiveDate) -> ActivityRecordModel {
        NewActivityRecord {
            team_id,
            period_start: start,
            period_end: end,
            counters: CounterSet::default(),
            score: 0,
        }
        .into_model(id)
    }

    #[test]
    fn filter_by_team() {
        let filter = RecordFilter::for_team(2);

        assert!(filter.matches(&record(1, 2, date(2024, 1, 1), date(2024, 1, 7))));
        assert!(!filter.matches(&record(2, 3, date(2024, 1, 1), date(2024, 1, 7))));
    }

    #[test]
    fn filter_by_start_and_span() {
        let overlapping = record(1, 1, date(2024, 1, 28), date(2024, 2, 3));
        let from = date(2024, 1, 1);
        let to = date(2024, 1, 31);

        assert!(RecordFilter::all()
            .with_period(from, to, PeriodMatch::StartWithin)
            .matches(&overlapping));
        assert!(!RecordFilter::all()
            .with_period(from, to, PeriodMatch::SpanWithin)
            .matches(&overlapping));
    }

    #[test]
    fn sorts_newest_first_with_id_tiebreak() {
        let a = record(1, 1, date(2024, 1, 1), date(2024, 1, 2));
        let mut b = record(2, 1, date(2024, 1, 1), date(2024, 1, 2));
        b.created_at = a.created_at;
        let mut c = record(3, 1, date(2024, 1, 1), date(2024, 1, 2));
        c.created_at = a.created_at - chrono::Duration::days(1);

        let mut records = vec![c, a, b];
        sort_newest_first(&mut records);

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
