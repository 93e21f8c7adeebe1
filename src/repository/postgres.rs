use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, info, instrument, warn};

use super::{PeriodMatch, RecordFilter, ScoreboardRepository};
use crate::activity::models::{ActivityRecordModel, NewActivityRecord};
use crate::scoring::CounterSet;
use crate::shared::AppError;
use crate::team::models::{NewTeam, TeamModel};

const TEAM_COLUMNS: &str = "id, name, total_score, logo_url, created_at, updated_at";

const RECORD_COLUMNS: &str = "id, team_id, period_start, period_end, \
     attendance, new_attendees, cells_held, elite_cells, \
     tuesday_attendance, tuesday_new_attendees, arena_attendance, arena_new_attendees, \
     sunday_attendance, sunday_new_attendees, partner_donation, score, created_at";

/// PostgreSQL implementation of ScoreboardRepository
pub struct PostgresScoreboardRepository {
    pool: PgPool,
}

impl PostgresScoreboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to run database migrations");
                AppError::StorageUnavailable(e.to_string())
            })?;

        info!("Database migrations applied");
        Ok(())
    }
}

fn record_from_row(row: &PgRow) -> ActivityRecordModel {
    ActivityRecordModel {
        id: row.get("id"),
        team_id: row.get("team_id"),
        period_start: row.get("period_start"),
        period_end: row.get("period_end"),
        counters: CounterSet {
            attendance: row.get("attendance"),
            new_attendees: row.get("new_attendees"),
            cells_held: row.get("cells_held"),
            elite_cells: row.get("elite_cells"),
            tuesday_attendance: row.get("tuesday_attendance"),
            tuesday_new_attendees: row.get("tuesday_new_attendees"),
            arena_attendance: row.get("arena_attendance"),
            arena_new_attendees: row.get("arena_new_attendees"),
            sunday_attendance: row.get("sunday_attendance"),
            sunday_new_attendees: row.get("sunday_new_attendees"),
            partner_donation: row.get("partner_donation"),
        },
        score: row.get("score"),
        created_at: row.get("created_at"),
    }
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503")
    )
}

#[async_trait]
impl ScoreboardRepository for PostgresScoreboardRepository {
    #[instrument(skip(self, team))]
    async fn create_team(&self, team: NewTeam) -> Result<TeamModel, AppError> {
        debug!(name = %team.name, "Creating team in database");

        let team = sqlx::query_as::<_, TeamModel>(&format!(
            "INSERT INTO teams (name, logo_url) VALUES ($1, $2) RETURNING {TEAM_COLUMNS}"
        ))
        .bind(&team.name)
        .bind(&team.logo_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create team in database");
            AppError::StorageUnavailable(e.to_string())
        })?;

        debug!(team_id = team.id, "Team created successfully in database");
        Ok(team)
    }

    #[instrument(skip(self))]
    async fn get_team(&self, team_id: i64) -> Result<Option<TeamModel>, AppError> {
        debug!(team_id, "Fetching team from database");

        sqlx::query_as::<_, TeamModel>(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"))
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, team_id, "Failed to fetch team from database");
                AppError::StorageUnavailable(e.to_string())
            })
    }

    #[instrument(skip(self))]
    async fn list_teams(&self) -> Result<Vec<TeamModel>, AppError> {
        let teams =
            sqlx::query_as::<_, TeamModel>(&format!("SELECT {TEAM_COLUMNS} FROM teams ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Failed to list teams from database");
                    AppError::StorageUnavailable(e.to_string())
                })?;

        debug!(team_count = teams.len(), "Teams listed from database");
        Ok(teams)
    }

    #[instrument(skip(self, team))]
    async fn update_team(&self, team: &TeamModel) -> Result<TeamModel, AppError> {
        debug!(team_id = team.id, "Updating team in database");

        // total_score is owned by adjust_team_score
        sqlx::query_as::<_, TeamModel>(&format!(
            "UPDATE teams SET name = $2, logo_url = $3, updated_at = $4 WHERE id = $1 RETURNING {TEAM_COLUMNS}"
        ))
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.logo_url)
        .bind(team.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, team_id = team.id, "Failed to update team in database");
            AppError::StorageUnavailable(e.to_string())
        })?
        .ok_or_else(|| {
            warn!(team_id = team.id, "Team not found for update");
            AppError::NotFound("Team not found".to_string())
        })
    }

    #[instrument(skip(self))]
    async fn delete_team(&self, team_id: i64) -> Result<(), AppError> {
        debug!(team_id, "Deleting team from database");

        // activity_records rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, team_id, "Failed to delete team from database");
                AppError::StorageUnavailable(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(team_id, "Team not found for deletion");
            return Err(AppError::NotFound("Team not found".to_string()));
        }

        debug!(team_id, "Team deleted successfully from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn adjust_team_score(&self, team_id: i64, delta: i64) -> Result<TeamModel, AppError> {
        let team = sqlx::query_as::<_, TeamModel>(&format!(
            "UPDATE teams SET total_score = GREATEST(0, total_score + $2) WHERE id = $1 RETURNING {TEAM_COLUMNS}"
        ))
        .bind(team_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, team_id, "Failed to adjust team score in database");
            AppError::StorageUnavailable(e.to_string())
        })?;

        match team {
            Some(team) => {
                debug!(team_id, delta, total_score = team.total_score, "Team score adjusted in database");
                Ok(team)
            }
            None => {
                warn!(team_id, "Team not found for score adjustment");
                Err(AppError::NotFound("Team not found".to_string()))
            }
        }
    }

    #[instrument(skip(self, record))]
    async fn create_record(
        &self,
        record: NewActivityRecord,
    ) -> Result<ActivityRecordModel, AppError> {
        debug!(team_id = record.team_id, score = record.score, "Creating record in database");

        let c = &record.counters;
        let row = sqlx::query(&format!(
            "INSERT INTO activity_records (team_id, period_start, period_end, \
             attendance, new_attendees, cells_held, elite_cells, \
             tuesday_attendance, tuesday_new_attendees, arena_attendance, arena_new_attendees, \
             sunday_attendance, sunday_new_attendees, partner_donation, score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(record.team_id)
        .bind(record.period_start)
        .bind(record.period_end)
        .bind(c.attendance)
        .bind(c.new_attendees)
        .bind(c.cells_held)
        .bind(c.elite_cells)
        .bind(c.tuesday_attendance)
        .bind(c.tuesday_new_attendees)
        .bind(c.arena_attendance)
        .bind(c.arena_new_attendees)
        .bind(c.sunday_attendance)
        .bind(c.sunday_new_attendees)
        .bind(c.partner_donation)
        .bind(record.score)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                warn!(team_id = record.team_id, "Record references unknown team");
                return AppError::NotFound("Team not found".to_string());
            }
            warn!(error = %e, "Failed to create record in database");
            AppError::StorageUnavailable(e.to_string())
        })?;

        let created = record_from_row(&row);
        debug!(record_id = created.id, "Record created successfully in database");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_record(&self, record_id: i64) -> Result<Option<ActivityRecordModel>, AppError> {
        debug!(record_id, "Fetching record from database");

        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM activity_records WHERE id = $1"
        ))
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, record_id, "Failed to fetch record from database");
            AppError::StorageUnavailable(e.to_string())
        })?;

        Ok(row.as_ref().map(record_from_row))
    }

    #[instrument(skip(self, record))]
    async fn update_record(&self, record: &ActivityRecordModel) -> Result<(), AppError> {
        debug!(record_id = record.id, "Updating record in database");

        let c = &record.counters;
        let result = sqlx::query(
            "UPDATE activity_records SET period_start = $2, period_end = $3, \
             attendance = $4, new_attendees = $5, cells_held = $6, elite_cells = $7, \
             tuesday_attendance = $8, tuesday_new_attendees = $9, \
             arena_attendance = $10, arena_new_attendees = $11, \
             sunday_attendance = $12, sunday_new_attendees = $13, \
             partner_donation = $14, score = $15 WHERE id = $1",
        )
        .bind(record.id)
        .bind(record.period_start)
        .bind(record.period_end)
        .bind(c.attendance)
        .bind(c.new_attendees)
        .bind(c.cells_held)
        .bind(c.elite_cells)
        .bind(c.tuesday_attendance)
        .bind(c.tuesday_new_attendees)
        .bind(c.arena_attendance)
        .bind(c.arena_new_attendees)
        .bind(c.sunday_attendance)
        .bind(c.sunday_new_attendees)
        .bind(c.partner_donation)
        .bind(record.score)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, record_id = record.id, "Failed to update record in database");
            AppError::StorageUnavailable(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(record_id = record.id, "Record not found for update");
            return Err(AppError::NotFound("Record not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, record_id: i64) -> Result<(), AppError> {
        debug!(record_id, "Deleting record from database");

        let result = sqlx::query("DELETE FROM activity_records WHERE id = $1")
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, record_id, "Failed to delete record from database");
                AppError::StorageUnavailable(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(record_id, "Record not found for deletion");
            return Err(AppError::NotFound("Record not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<ActivityRecordModel>, AppError> {
        let (start, end, span) = match filter.period {
            Some(period) => (
                Some(period.start),
                Some(period.end),
                period.matching == PeriodMatch::SpanWithin,
            ),
            None => (None, None, false),
        };

        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM activity_records \
             WHERE ($1::BIGINT IS NULL OR team_id = $1) \
             AND ($2::DATE IS NULL OR period_start >= $2) \
             AND ($3::DATE IS NULL OR (CASE WHEN $4 THEN period_end ELSE period_start END) <= $3) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(filter.team_id)
        .bind(start)
        .bind(end)
        .bind(span)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list records from database");
            AppError::StorageUnavailable(e.to_string())
        })?;

        debug!(record_count = rows.len(), "Records listed from database");
        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!(error = %e, "Database ping failed");
                AppError::StorageUnavailable(e.to_string())
            })
    }
}
