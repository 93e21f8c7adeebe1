use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::models::ActivityRecordModel;
use crate::scoring::{CounterSet, ScoreBreakdown, MAX_COUNTER_VALUE, MAX_RECORD_SCORE};
use crate::shared::AppError;

/// Request payload for logging one activity report
#[derive(Debug, Deserialize)]
pub struct LogActivityRequest {
    #[serde(alias = "equipe_id")]
    pub team_id: i64,
    #[serde(alias = "data_inicio")]
    pub period_start: NaiveDate,
    #[serde(alias = "data_fim")]
    pub period_end: NaiveDate,
    #[serde(flatten)]
    pub counters: CounterSet,
}

/// Replacement dates and counters for an existing record; the team cannot change
#[derive(Debug, Deserialize)]
pub struct EditActivityRequest {
    #[serde(alias = "data_inicio")]
    pub period_start: NaiveDate,
    #[serde(alias = "data_fim")]
    pub period_end: NaiveDate,
    #[serde(flatten)]
    pub counters: CounterSet,
}

/// Checks the reporting period and counters before scoring
pub(crate) fn validate_report(
    period_start: NaiveDate,
    period_end: NaiveDate,
    counters: &CounterSet,
) -> Result<(), AppError> {
    AppError::check_range(period_start, period_end)?;
    if let Some(counter) = counters.first_invalid() {
        return Err(AppError::Validation(format!(
            "{counter} must be a number between 0 and {MAX_COUNTER_VALUE}"
        )));
    }
    Ok(())
}

/// Rejects scores too large to accumulate into a team total
pub(crate) fn validate_score(score: i64) -> Result<(), AppError> {
    if score > MAX_RECORD_SCORE {
        return Err(AppError::Validation(format!(
            "Record score {score} exceeds the maximum of {MAX_RECORD_SCORE}"
        )));
    }
    Ok(())
}

/// Stored record together with how its score was reached
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityOutcome {
    pub record: ActivityRecordModel,
    pub breakdown: ScoreBreakdown,
    pub team_total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_flat_counter_fields() {
        let request: LogActivityRequest = serde_json::from_str(
            r#"{
                "team_id": 3,
                "period_start": "2024-01-01",
                "period_end": "2024-01-07",
                "new_attendees": 3,
                "elite_cells": 2,
                "partner_donation": 50.0
            }"#,
        )
        .unwrap();

        assert_eq!(request.team_id, 3);
        assert_eq!(request.counters.new_attendees, 3);
        assert_eq!(request.counters.elite_cells, 2);
        assert_eq!(request.counters.sunday_attendance, 0);
    }

    #[test]
    fn parses_legacy_form_fields() {
        let request: LogActivityRequest = serde_json::from_str(
            r#"{
                "equipe_id": 1,
                "data_inicio": "2024-01-01",
                "data_fim": "2024-01-07",
                "qtd_pessoas_novas": 4
            }"#,
        )
        .unwrap();

        assert_eq!(request.team_id, 1);
        assert_eq!(request.counters.new_attendees, 4);
    }

    #[test]
    fn rejects_reversed_period_and_negative_counters() {
        let counters = CounterSet::default();
        assert!(matches!(
            validate_report(date(2024, 1, 8), date(2024, 1, 1), &counters),
            Err(AppError::InvalidRange { .. })
        ));

        let negative = CounterSet {
            arena_attendance: -2,
            ..CounterSet::default()
        };
        match validate_report(date(2024, 1, 1), date(2024, 1, 7), &negative) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("arena_attendance")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_oversized_counters() {
        let huge = CounterSet {
            new_attendees: 1_000_000_000_000_000_000,
            ..CounterSet::default()
        };
        assert!(matches!(
            validate_report(date(2024, 1, 1), date(2024, 1, 7), &huge),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_scores_above_limit() {
        assert!(validate_score(MAX_RECORD_SCORE).is_ok());
        assert!(matches!(
            validate_score(i64::MAX),
            Err(AppError::Validation(_))
        ));
    }
}
