use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{PeriodFilter, RankedTeam};
use crate::shared::AppError;

/// Query string for the scoreboard; `start` and `end` come together or not at all
#[derive(Debug, Default, Deserialize)]
pub struct ScoreboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub team_id: Option<i64>,
}

impl ScoreboardQuery {
    pub fn period(&self) -> Result<Option<PeriodFilter>, AppError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                let filter = PeriodFilter {
                    start,
                    end,
                    team_id: self.team_id,
                };
                filter.validate()?;
                Ok(Some(filter))
            }
            (None, None) => Ok(None),
            _ => Err(AppError::Validation(
                "Both start and end are required for a period scoreboard".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Scoreboard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodFilter>,
    pub division_a: Vec<RankedTeam>,
    pub division_b: Vec<RankedTeam>,
}
