use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::activity::models::{ActivityRecordModel, NewActivityRecord};
use crate::activity::types::{
    validate_report, validate_score, ActivityOutcome, EditActivityRequest, LogActivityRequest,
};
use crate::ranking::types::{Scoreboard, ScoreboardQuery};
use crate::ranking::{rank, split_divisions};
use crate::report::types::{AnalysisRequest, PeriodReport};
use crate::report::{aggregate, AnalysisReport};
use crate::repository::{PeriodMatch, RecordFilter, ScoreboardRepository};
use crate::scoring::{WeightTable, WeightedScoreCalculator};
use crate::shared::AppError;
use crate::status::StatusResponse;
use crate::team::models::{NewTeam, TeamModel};
use crate::team::types::{
    normalized_logo, validated_name, CreateTeamRequest, TeamDetails, TeamHistory,
    UpdateTeamRequest,
};

/// Service for team, activity and report business logic
pub struct ScoreboardService {
    repository: Arc<dyn ScoreboardRepository + Send + Sync>,
    calculator: WeightedScoreCalculator,
}

impl ScoreboardService {
    pub fn new(
        repository: Arc<dyn ScoreboardRepository + Send + Sync>,
        weights: Arc<WeightTable>,
    ) -> Self {
        Self {
            repository,
            calculator: WeightedScoreCalculator::new(weights),
        }
    }

    async fn require_team(&self, team_id: i64) -> Result<TeamModel, AppError> {
        self.repository.get_team(team_id).await?.ok_or_else(|| {
            warn!(team_id, "Team not found");
            AppError::NotFound("Team not found".to_string())
        })
    }

    async fn require_record(&self, record_id: i64) -> Result<ActivityRecordModel, AppError> {
        self.repository.get_record(record_id).await?.ok_or_else(|| {
            warn!(record_id, "Record not found");
            AppError::NotFound("Record not found".to_string())
        })
    }

    #[instrument(skip(self))]
    pub async fn register_team(&self, request: CreateTeamRequest) -> Result<TeamModel, AppError> {
        let name = validated_name(&request.name)?;
        let team = self
            .repository
            .create_team(NewTeam::new(name, normalized_logo(request.logo_url)))
            .await?;

        info!(team_id = team.id, name = %team.name, "Team registered");
        Ok(team)
    }

    #[instrument(skip(self))]
    pub async fn update_team(
        &self,
        team_id: i64,
        request: UpdateTeamRequest,
    ) -> Result<TeamModel, AppError> {
        let name = validated_name(&request.name)?;
        let mut team = self.require_team(team_id).await?;

        team.apply_update(name, request.logo_url.map(|url| normalized_logo(Some(url))));
        let team = self.repository.update_team(&team).await?;

        info!(team_id, name = %team.name, "Team updated");
        Ok(team)
    }

    #[instrument(skip(self))]
    pub async fn delete_team(&self, team_id: i64) -> Result<(), AppError> {
        self.repository.delete_team(team_id).await?;
        info!(team_id, "Team deleted along with its records");
        Ok(())
    }

    /// Team with its position on the overall scoreboard
    #[instrument(skip(self))]
    pub async fn get_team(&self, team_id: i64) -> Result<TeamDetails, AppError> {
        let teams = self.repository.list_teams().await?;
        let entry = rank(&teams, &[], None)
            .into_iter()
            .find(|entry| entry.team.id == team_id)
            .ok_or_else(|| {
                warn!(team_id, "Team not found");
                AppError::NotFound("Team not found".to_string())
            })?;

        Ok(TeamDetails {
            team: entry.team,
            position: entry.position,
            division: entry.division,
        })
    }

    #[instrument(skip(self))]
    pub async fn scoreboard(&self, query: ScoreboardQuery) -> Result<Scoreboard, AppError> {
        let period = query.period()?;
        let teams = self.repository.list_teams().await?;

        let ranked = match &period {
            Some(filter) => {
                let records = self
                    .repository
                    .list_records(&RecordFilter::all().with_period(
                        filter.start,
                        filter.end,
                        PeriodMatch::StartWithin,
                    ))
                    .await?;
                rank(&teams, &records, Some(filter))
            }
            None => {
                let ranked = rank(&teams, &[], None);
                match query.team_id {
                    Some(team_id) => ranked
                        .into_iter()
                        .filter(|entry| entry.team.id == team_id)
                        .collect(),
                    None => ranked,
                }
            }
        };

        debug!(team_count = ranked.len(), "Scoreboard ranked");
        let (division_a, division_b) = split_divisions(ranked);
        Ok(Scoreboard {
            period,
            division_a,
            division_b,
        })
    }

    #[instrument(skip(self))]
    pub async fn log_activity(
        &self,
        request: LogActivityRequest,
    ) -> Result<ActivityOutcome, AppError> {
        validate_report(request.period_start, request.period_end, &request.counters)?;
        self.require_team(request.team_id).await?;

        let breakdown = self.calculator.breakdown(&request.counters);
        validate_score(breakdown.total)?;
        let record = self
            .repository
            .create_record(NewActivityRecord {
                team_id: request.team_id,
                period_start: request.period_start,
                period_end: request.period_end,
                counters: request.counters,
                score: breakdown.total,
            })
            .await?;

        let team = self
            .repository
            .adjust_team_score(record.team_id, record.score)
            .await?;

        info!(
            record_id = record.id,
            team_id = team.id,
            score = record.score,
            team_total = team.total_score,
            "Activity logged"
        );

        Ok(ActivityOutcome {
            record,
            breakdown,
            team_total: team.total_score,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_activity(&self, record_id: i64) -> Result<ActivityRecordModel, AppError> {
        self.require_record(record_id).await
    }

    /// Rescores a record and moves the team total by the score difference
    #[instrument(skip(self))]
    pub async fn edit_activity(
        &self,
        record_id: i64,
        request: EditActivityRequest,
    ) -> Result<ActivityOutcome, AppError> {
        validate_report(request.period_start, request.period_end, &request.counters)?;
        let mut record = self.require_record(record_id).await?;

        let breakdown = self.calculator.breakdown(&request.counters);
        validate_score(breakdown.total)?;
        let delta = breakdown.total - record.score;

        record.period_start = request.period_start;
        record.period_end = request.period_end;
        record.counters = request.counters;
        record.score = breakdown.total;
        self.repository.update_record(&record).await?;

        let team = self
            .repository
            .adjust_team_score(record.team_id, delta)
            .await?;

        info!(
            record_id,
            team_id = team.id,
            delta,
            team_total = team.total_score,
            "Activity edited"
        );

        Ok(ActivityOutcome {
            record,
            breakdown,
            team_total: team.total_score,
        })
    }

    /// Removes a record and takes its score off the team total, never below zero
    #[instrument(skip(self))]
    pub async fn delete_activity(&self, record_id: i64) -> Result<TeamModel, AppError> {
        let record = self.require_record(record_id).await?;

        self.repository.delete_record(record_id).await?;
        let team = self
            .repository
            .adjust_team_score(record.team_id, -record.score)
            .await?;

        info!(
            record_id,
            team_id = team.id,
            team_total = team.total_score,
            "Activity deleted"
        );
        Ok(team)
    }

    #[instrument(skip(self))]
    pub async fn team_history(&self, team_id: i64) -> Result<TeamHistory, AppError> {
        let team = self.require_team(team_id).await?;
        let records = self
            .repository
            .list_records(&RecordFilter::for_team(team_id))
            .await?;

        debug!(team_id, record_count = records.len(), "Team history loaded");
        Ok(TeamHistory { team, records })
    }

    #[instrument(skip(self))]
    pub async fn period_report(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        team_id: Option<i64>,
    ) -> Result<PeriodReport, AppError> {
        AppError::check_range(start, end)?;

        let filter = RecordFilter {
            team_id,
            ..RecordFilter::all()
        }
        .with_period(start, end, PeriodMatch::SpanWithin);
        let records = self.repository.list_records(&filter).await?;

        Ok(PeriodReport::new(start, end, team_id, records))
    }

    #[instrument(skip(self))]
    pub async fn analysis(&self, request: AnalysisRequest) -> Result<AnalysisReport, AppError> {
        let report = self
            .period_report(request.start, request.end, request.team_id)
            .await?;
        if report.records.is_empty() {
            warn!(start = %request.start, end = %request.end, "No records for analysis");
        }

        let teams = self.repository.list_teams().await?;
        let metrics = aggregate(&report.records, &teams);

        let analysis = AnalysisReport::build(
            request.kind,
            request.start,
            request.end,
            metrics,
            self.calculator.weights(),
        )?;

        info!(kind = %request.kind, teams = analysis.individual.len(), "Analysis generated");
        Ok(analysis)
    }

    pub fn weights(&self) -> &WeightTable {
        self.calculator.weights()
    }

    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<StatusResponse, AppError> {
        self.repository.ping().await?;
        let teams = self.repository.list_teams().await?;

        Ok(StatusResponse::connected(teams.len()))
    }
}
