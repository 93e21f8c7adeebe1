use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

use crate::activity::models::ActivityRecordModel;
use crate::shared::AppError;
use crate::team::models::TeamModel;

pub use handlers::get_scoreboard;

mod handlers;
pub mod types;

/// Number of top positions that make up Division A
pub const DIVISION_A_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Division {
    A,
    B,
}

impl Division {
    pub fn for_position(position: usize) -> Self {
        if position <= DIVISION_A_SIZE {
            Division::A
        } else {
            Division::B
        }
    }
}

/// Restricts a ranking to records whose start date falls in `[start, end]`,
/// optionally reporting only one team's entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub team_id: Option<i64>,
}

impl PeriodFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            team_id: None,
        }
    }

    pub fn for_team(mut self, team_id: i64) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        AppError::check_range(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTeam {
    pub team: TeamModel,
    pub position: usize,
    pub division: Division,
    /// Persisted total, or the period score when ranking over a period
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_records: Option<usize>,
}

/// Orders teams by score and assigns 1-indexed positions and divisions.
///
/// With a period, each team's score is the sum of stored record scores whose
/// start date lies in the range; team totals are left untouched. Ties are
/// broken by ascending team id. A team restriction in the filter ranks the
/// whole field and keeps only that team's entry.
pub fn rank(
    teams: &[TeamModel],
    records: &[ActivityRecordModel],
    period: Option<&PeriodFilter>,
) -> Vec<RankedTeam> {
    let mut scored: Vec<(&TeamModel, i64, Option<usize>)> = match period {
        None => teams
            .iter()
            .map(|team| (team, team.total_score, None))
            .collect(),
        Some(filter) => {
            let mut per_team: HashMap<i64, (i64, usize)> = HashMap::new();
            for record in records
                .iter()
                .filter(|r| r.starts_within(filter.start, filter.end))
            {
                let entry = per_team.entry(record.team_id).or_default();
                entry.0 = entry.0.saturating_add(record.score);
                entry.1 += 1;
            }

            teams
                .iter()
                .map(|team| {
                    let (score, count) = per_team.get(&team.id).copied().unwrap_or_default();
                    (team, score, Some(count))
                })
                .collect()
        }
    };

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

    let team_filter = period.and_then(|p| p.team_id);

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (team, score, period_records))| {
            let position = index + 1;
            RankedTeam {
                team: team.clone(),
                position,
                division: Division::for_position(position),
                score,
                period_records,
            }
        })
        .filter(|entry| team_filter.map_or(true, |id| entry.team.id == id))
        .collect()
}

/// Splits a ranking into its Division A and Division B entries
pub fn split_divisions(ranked: Vec<RankedTeam>) -> (Vec<RankedTeam>, Vec<RankedTeam>) {
    ranked
        .into_iter()
        .partition(|entry| entry.division == Division::A)
}
