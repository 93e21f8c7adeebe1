use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::{sort_newest_first, RecordFilter, ScoreboardRepository};
use crate::activity::models::{ActivityRecordModel, NewActivityRecord};
use crate::shared::AppError;
use crate::team::models::{NewTeam, TeamModel};

#[derive(Debug, Default)]
struct StoreState {
    teams: BTreeMap<i64, TeamModel>,
    records: BTreeMap<i64, ActivityRecordModel>,
    last_team_id: i64,
    last_record_id: i64,
}

/// In-memory implementation of ScoreboardRepository for development and testing
///
/// All state lives in this store object, so every instance is isolated.
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryScoreboardRepository {
    state: Mutex<StoreState>,
}

impl InMemoryScoreboardRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory repository with pre-populated teams
    pub fn with_teams(teams: Vec<TeamModel>) -> Self {
        let mut state = StoreState::default();
        for team in teams {
            state.last_team_id = state.last_team_id.max(team.id);
            state.teams.insert(team.id, team);
        }

        Self {
            state: Mutex::new(state),
        }
    }

    /// Returns the current number of records in the repository
    pub fn record_count(&self) -> usize {
        self.state.lock().map(|s| s.records.len()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, AppError> {
        self.state.lock().map_err(|_| {
            warn!("In-memory store lock poisoned");
            AppError::Internal
        })
    }
}

#[async_trait]
impl ScoreboardRepository for InMemoryScoreboardRepository {
    #[instrument(skip(self, team))]
    async fn create_team(&self, team: NewTeam) -> Result<TeamModel, AppError> {
        debug!(name = %team.name, "Creating team in memory");

        let mut state = self.lock()?;
        state.last_team_id += 1;
        let model = team.into_model(state.last_team_id);
        state.teams.insert(model.id, model.clone());

        debug!(team_id = model.id, "Team created successfully in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn get_team(&self, team_id: i64) -> Result<Option<TeamModel>, AppError> {
        debug!(team_id, "Fetching team from memory");

        let state = self.lock()?;
        let team = state.teams.get(&team_id).cloned();

        match &team {
            Some(t) => debug!(team_id, name = %t.name, "Team found in memory"),
            None => debug!(team_id, "Team not found in memory"),
        }

        Ok(team)
    }

    #[instrument(skip(self))]
    async fn list_teams(&self) -> Result<Vec<TeamModel>, AppError> {
        debug!("Listing all teams in memory");

        let state = self.lock()?;
        Ok(state.teams.values().cloned().collect())
    }

    #[instrument(skip(self, team))]
    async fn update_team(&self, team: &TeamModel) -> Result<TeamModel, AppError> {
        debug!(team_id = team.id, "Updating team in memory");

        let mut state = self.lock()?;
        match state.teams.get_mut(&team.id) {
            Some(existing) => {
                existing.name = team.name.clone();
                existing.logo_url = team.logo_url.clone();
                existing.updated_at = team.updated_at;
                Ok(existing.clone())
            }
            None => {
                warn!(team_id = team.id, "Team not found for update in memory");
                Err(AppError::NotFound("Team not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_team(&self, team_id: i64) -> Result<(), AppError> {
        debug!(team_id, "Deleting team from memory");

        let mut state = self.lock()?;
        if state.teams.remove(&team_id).is_none() {
            warn!(team_id, "Team not found for deletion in memory");
            return Err(AppError::NotFound("Team not found".to_string()));
        }

        let before = state.records.len();
        state.records.retain(|_, record| record.team_id != team_id);

        debug!(
            team_id,
            records_removed = before - state.records.len(),
            "Team and its records deleted from memory"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn adjust_team_score(&self, team_id: i64, delta: i64) -> Result<TeamModel, AppError> {
        let mut state = self.lock()?;
        let team = state.teams.get_mut(&team_id).ok_or_else(|| {
            warn!(team_id, "Team not found for score adjustment in memory");
            AppError::NotFound("Team not found".to_string())
        })?;

        team.total_score = team.adjusted_total(delta);

        debug!(team_id, delta, total_score = team.total_score, "Team score adjusted in memory");
        Ok(team.clone())
    }

    #[instrument(skip(self, record))]
    async fn create_record(
        &self,
        record: NewActivityRecord,
    ) -> Result<ActivityRecordModel, AppError> {
        debug!(team_id = record.team_id, score = record.score, "Creating record in memory");

        let mut state = self.lock()?;
        if !state.teams.contains_key(&record.team_id) {
            warn!(team_id = record.team_id, "Record references unknown team");
            return Err(AppError::NotFound("Team not found".to_string()));
        }

        state.last_record_id += 1;
        let model = record.into_model(state.last_record_id);
        state.records.insert(model.id, model.clone());

        debug!(record_id = model.id, "Record created successfully in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn get_record(&self, record_id: i64) -> Result<Option<ActivityRecordModel>, AppError> {
        debug!(record_id, "Fetching record from memory");

        let state = self.lock()?;
        Ok(state.records.get(&record_id).cloned())
    }

    #[instrument(skip(self, record))]
    async fn update_record(&self, record: &ActivityRecordModel) -> Result<(), AppError> {
        debug!(record_id = record.id, "Updating record in memory");

        let mut state = self.lock()?;
        match state.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => {
                warn!(record_id = record.id, "Record not found for update in memory");
                Err(AppError::NotFound("Record not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, record_id: i64) -> Result<(), AppError> {
        debug!(record_id, "Deleting record from memory");

        let mut state = self.lock()?;
        if state.records.remove(&record_id).is_none() {
            warn!(record_id, "Record not found for deletion in memory");
            return Err(AppError::NotFound("Record not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<ActivityRecordModel>, AppError> {
        let state = self.lock()?;
        let mut records: Vec<ActivityRecordModel> = state
            .records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        drop(state);

        sort_newest_first(&mut records);

        debug!(record_count = records.len(), "Records listed from memory");
        Ok(records)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::PeriodMatch;
    use crate::scoring::CounterSet;
    use chrono::NaiveDate;

    /// Test helper functions for creating test data
    mod helpers {
        use super::*;

        pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        }

        pub fn new_record(team_id: i64, start: NaiveDate, score: i64) -> NewActivityRecord {
            NewActivityRecord {
                team_id,
                period_start: start,
                period_end: start + chrono::Duration::days(6),
                counters: CounterSet {
                    new_attendees: 2,
                    ..CounterSet::default()
                },
                score,
            }
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_create_and_get_team() {
        let repo = InMemoryScoreboardRepository::new();

        let created = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();
        let retrieved = repo.get_team(created.id).await.unwrap().unwrap();

        assert_eq!(retrieved, created);
        assert_eq!(retrieved.total_score, 0);
    }

    #[tokio::test]
    async fn test_team_ids_are_sequential() {
        let repo = InMemoryScoreboardRepository::new();

        let first = repo.create_team(NewTeam::new("A", None)).await.unwrap();
        let second = repo.create_team(NewTeam::new("B", None)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_preloaded_teams_continue_id_sequence() {
        let existing = NewTeam::new("Existing", None).into_model(10);
        let repo = InMemoryScoreboardRepository::with_teams(vec![existing]);

        let created = repo.create_team(NewTeam::new("Next", None)).await.unwrap();
        assert_eq!(created.id, 11);
        assert_eq!(repo.list_teams().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_nonexistent_team() {
        let repo = InMemoryScoreboardRepository::new();
        assert!(repo.get_team(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_team() {
        let repo = InMemoryScoreboardRepository::new();
        let mut team = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();

        team.apply_update("Tigers".to_string(), Some(Some("https://logo".to_string())));
        repo.update_team(&team).await.unwrap();

        let retrieved = repo.get_team(team.id).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "Tigers");
        assert_eq!(retrieved.logo_url.as_deref(), Some("https://logo"));
    }

    #[tokio::test]
    async fn test_update_team_from_stale_copy_keeps_total() {
        let repo = InMemoryScoreboardRepository::new();
        let mut stale = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();

        repo.create_record(new_record(stale.id, date(2024, 1, 1), 30))
            .await
            .unwrap();
        repo.adjust_team_score(stale.id, 30).await.unwrap();

        stale.apply_update("Tigers".to_string(), None);
        let updated = repo.update_team(&stale).await.unwrap();

        assert_eq!(updated.name, "Tigers");
        assert_eq!(updated.total_score, 30);
        let retrieved = repo.get_team(stale.id).await.unwrap().unwrap();
        assert_eq!(retrieved.total_score, 30);
    }

    #[tokio::test]
    async fn test_update_nonexistent_team() {
        let repo = InMemoryScoreboardRepository::new();
        let team = NewTeam::new("Ghost", None).into_model(5);

        let result = repo.update_team(&team).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_team_cascades_records() {
        let repo = InMemoryScoreboardRepository::new();
        let lions = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();
        let tigers = repo.create_team(NewTeam::new("Tigers", None)).await.unwrap();
        repo.create_record(new_record(lions.id, date(2024, 1, 1), 10))
            .await
            .unwrap();
        repo.create_record(new_record(lions.id, date(2024, 1, 8), 20))
            .await
            .unwrap();
        repo.create_record(new_record(tigers.id, date(2024, 1, 1), 5))
            .await
            .unwrap();

        repo.delete_team(lions.id).await.unwrap();

        assert!(repo.get_team(lions.id).await.unwrap().is_none());
        assert_eq!(repo.record_count(), 1);
        let remaining = repo.list_records(&RecordFilter::all()).await.unwrap();
        assert_eq!(remaining[0].team_id, tigers.id);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_team() {
        let repo = InMemoryScoreboardRepository::new();
        let result = repo.delete_team(3).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_adjust_team_score_floors_at_zero() {
        let repo = InMemoryScoreboardRepository::new();
        let team = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();

        let raised = repo.adjust_team_score(team.id, 25).await.unwrap();
        assert_eq!(raised.total_score, 25);

        let lowered = repo.adjust_team_score(team.id, -40).await.unwrap();
        assert_eq!(lowered.total_score, 0);
    }

    #[tokio::test]
    async fn test_adjust_unknown_team() {
        let repo = InMemoryScoreboardRepository::new();
        let result = repo.adjust_team_score(1, 10).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_round_trip() {
        let repo = InMemoryScoreboardRepository::new();
        let team = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();

        let created = repo
            .create_record(new_record(team.id, date(2024, 2, 5), 20))
            .await
            .unwrap();
        let retrieved = repo.get_record(created.id).await.unwrap().unwrap();

        assert_eq!(retrieved, created);
        assert_eq!(retrieved.score, 20);
        assert_eq!(retrieved.counters.new_attendees, 2);
    }

    #[tokio::test]
    async fn test_create_record_for_unknown_team() {
        let repo = InMemoryScoreboardRepository::new();
        let result = repo.create_record(new_record(8, date(2024, 2, 5), 20)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_record() {
        let repo = InMemoryScoreboardRepository::new();
        let team = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();
        let mut record = repo
            .create_record(new_record(team.id, date(2024, 2, 5), 20))
            .await
            .unwrap();

        record.score = 35;
        repo.update_record(&record).await.unwrap();
        assert_eq!(repo.get_record(record.id).await.unwrap().unwrap().score, 35);

        repo.delete_record(record.id).await.unwrap();
        assert!(repo.get_record(record.id).await.unwrap().is_none());

        let result = repo.delete_record(record.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_records_filters_by_team_and_period() {
        let repo = InMemoryScoreboardRepository::new();
        let lions = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();
        let tigers = repo.create_team(NewTeam::new("Tigers", None)).await.unwrap();
        repo.create_record(new_record(lions.id, date(2024, 1, 1), 10))
            .await
            .unwrap();
        repo.create_record(new_record(lions.id, date(2024, 3, 1), 20))
            .await
            .unwrap();
        repo.create_record(new_record(tigers.id, date(2024, 1, 3), 5))
            .await
            .unwrap();

        let filter = RecordFilter::for_team(lions.id).with_period(
            date(2024, 1, 1),
            date(2024, 1, 31),
            PeriodMatch::StartWithin,
        );
        let records = repo.list_records(&filter).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 10);

        let january = RecordFilter::all().with_period(
            date(2024, 1, 1),
            date(2024, 1, 31),
            PeriodMatch::StartWithin,
        );
        assert_eq!(repo.list_records(&january).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_records_newest_first() {
        let repo = InMemoryScoreboardRepository::new();
        let team = repo.create_team(NewTeam::new("Lions", None)).await.unwrap();
        let first = repo
            .create_record(new_record(team.id, date(2024, 1, 1), 10))
            .await
            .unwrap();
        let second = repo
            .create_record(new_record(team.id, date(2024, 1, 8), 20))
            .await
            .unwrap();

        let records = repo
            .list_records(&RecordFilter::for_team(team.id))
            .await
            .unwrap();

        assert_eq!(records[0].id, second.id);
        assert_eq!(records[1].id, first.id);
    }

    #[tokio::test]
    async fn test_repositories_are_isolated() {
        let first = InMemoryScoreboardRepository::new();
        let second = InMemoryScoreboardRepository::new();

        first.create_team(NewTeam::new("Lions", None)).await.unwrap();

        assert_eq!(first.list_teams().await.unwrap().len(), 1);
        assert!(second.list_teams().await.unwrap().is_empty());
    }
}
